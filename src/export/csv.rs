use crate::analysis::WallTally;
use crate::error::ExportError;
use std::fs::File;
use std::path::Path;

/// Label of the row holding walls outside any storey.
pub const UNASSIGNED_ROW: &str = "<unassigned>";

pub fn export_csv<P: AsRef<Path>>(tally: &WallTally, path: P) -> Result<(), ExportError> {
    let path_ref = path.as_ref();
    let file = File::create(path_ref).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;

    let mut writer = csv::Writer::from_writer(file);

    writer.write_record(["Storey", "Global ID", "Elevation (m)", "Walls", "Load-bearing"])?;

    for row in &tally.rows {
        writer.write_record([
            &row.storey,
            &row.global_id,
            &format!("{:.3}", row.elevation),
            &row.walls.to_string(),
            &row.load_bearing.to_string(),
        ])?;
    }

    writer.write_record([
        UNASSIGNED_ROW,
        "",
        "",
        &tally.unassigned.to_string(),
        &tally.unassigned_load_bearing.to_string(),
    ])?;

    writer.flush().map_err(|e| ExportError::WriteError {
        message: e.to_string(),
    })?;

    Ok(())
}
