use crate::analysis::WallTally;
use crate::error::ExportError;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct WallReport<'a> {
    source: &'a str,
    total: usize,
    total_load_bearing: usize,
    #[serde(flatten)]
    tally: &'a WallTally,
}

/// Writes the tally as pretty JSON, tagged with the model it came from.
pub fn export_json<P: AsRef<Path>>(
    tally: &WallTally,
    source: &str,
    path: P,
) -> Result<(), ExportError> {
    let path_ref = path.as_ref();
    let report = WallReport {
        source,
        total: tally.total(),
        total_load_bearing: tally.total_load_bearing(),
        tally,
    };
    let json = serde_json::to_string_pretty(&report)?;

    let mut file = File::create(path_ref).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;

    file.write_all(json.as_bytes())
        .map_err(|e| ExportError::WriteError {
            message: e.to_string(),
        })?;

    Ok(())
}
