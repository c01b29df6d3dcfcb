//! Groups the IFC files of a directory into discipline sets.
//!
//! `25-08-D-STR.ifc` and `25-08-D-ARCH.ifc` share the prefix `25-08-D`; a
//! file without a discipline suffix forms a group of its own.

use crate::error::DiscoveryError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const IFC_EXTENSION: &str = "ifc";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
    Structural,
    Architectural,
    Mep,
}

impl Discipline {
    const SUFFIXES: [(&'static str, Discipline); 3] = [
        ("-STR", Discipline::Structural),
        ("-ARCH", Discipline::Architectural),
        ("-MEP", Discipline::Mep),
    ];

    /// Splits a file stem into prefix and discipline.
    #[must_use]
    pub fn split(stem: &str) -> (&str, Option<Discipline>) {
        Self::SUFFIXES
            .iter()
            .find_map(|(suffix, discipline)| {
                stem.strip_suffix(suffix).map(|prefix| (prefix, Some(*discipline)))
            })
            .unwrap_or((stem, None))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelGroup {
    pub prefix: String,
    pub structural: Option<PathBuf>,
    pub architectural: Option<PathBuf>,
    pub mep: Option<PathBuf>,
}

impl ModelGroup {
    #[must_use]
    pub fn is_checkable(&self) -> bool {
        self.structural.is_some()
    }
}

fn is_ifc(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(IFC_EXTENSION))
}

/// Scans `dir` (not recursively) and returns its groups sorted by prefix.
///
/// # Errors
///
/// Returns [`DiscoveryError::MissingDirectory`] if `dir` is not a directory
/// and [`DiscoveryError::NoFiles`] if it holds no `.ifc` file.
pub fn discover_groups<P: AsRef<Path>>(dir: P) -> Result<Vec<ModelGroup>, DiscoveryError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(DiscoveryError::MissingDirectory(dir.to_path_buf()));
    }

    let entries = fs::read_dir(dir).map_err(|source| DiscoveryError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut groups: BTreeMap<String, ModelGroup> = BTreeMap::new();
    for entry in entries {
        let path = entry
            .map_err(|source| DiscoveryError::ReadDir {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if !path.is_file() || !is_ifc(&path) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            log::debug!(path = path.display().to_string(); "Skipping file with non UTF-8 name");
            continue;
        };

        let (prefix, discipline) = Discipline::split(stem);
        let group = groups
            .entry(prefix.to_string())
            .or_insert_with(|| ModelGroup {
                prefix: prefix.to_string(),
                ..ModelGroup::default()
            });
        match discipline {
            Some(Discipline::Structural) => group.structural = Some(path),
            Some(Discipline::Architectural) => group.architectural = Some(path),
            Some(Discipline::Mep) => group.mep = Some(path),
            None => {}
        }
    }

    if groups.is_empty() {
        return Err(DiscoveryError::NoFiles(dir.to_path_buf()));
    }

    log::info!(directory = dir.display().to_string(), groups = groups.len(); "Discovered IFC models");
    Ok(groups.into_values().collect())
}

/// Finds a group by its 1-based index or case-insensitive prefix.
#[must_use]
pub fn select_group<'a>(groups: &'a [ModelGroup], choice: &str) -> Option<&'a ModelGroup> {
    let choice = choice.trim();
    if let Ok(index) = choice.parse::<usize>() {
        return index.checked_sub(1).and_then(|i| groups.get(i));
    }
    groups
        .iter()
        .find(|g| g.prefix.eq_ignore_ascii_case(choice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, "ISO-10303-21;").unwrap();
        path
    }

    #[test]
    fn groups_disciplines_by_prefix() {
        let dir = TempDir::new().unwrap();
        let str_path = touch(&dir, "25-08-D-STR.ifc");
        let arch_path = touch(&dir, "25-08-D-ARCH.ifc");
        let mep_path = touch(&dir, "25-08-D-MEP.IFC");
        let lone = touch(&dir, "Sample.ifc");
        touch(&dir, "notes.txt");

        let groups = discover_groups(dir.path()).unwrap();
        assert_eq!(
            groups,
            vec![
                ModelGroup {
                    prefix: "25-08-D".to_string(),
                    structural: Some(str_path),
                    architectural: Some(arch_path),
                    mep: Some(mep_path),
                },
                ModelGroup {
                    prefix: "Sample".to_string(),
                    ..ModelGroup::default()
                },
            ]
        );
        assert!(groups[0].is_checkable());
        assert!(!groups[1].is_checkable());
        assert!(lone.exists());
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "readme.md");
        assert!(matches!(
            discover_groups(dir.path()),
            Err(DiscoveryError::NoFiles(_))
        ));
    }

    #[test]
    fn missing_directory_is_an_error() {
        assert!(matches!(
            discover_groups("no/such/dir"),
            Err(DiscoveryError::MissingDirectory(_))
        ));
    }

    #[test]
    fn selection_by_index_or_prefix() {
        let groups = vec![
            ModelGroup {
                prefix: "A".to_string(),
                ..ModelGroup::default()
            },
            ModelGroup {
                prefix: "Tower".to_string(),
                ..ModelGroup::default()
            },
        ];
        assert_eq!(select_group(&groups, "2").unwrap().prefix, "Tower");
        assert_eq!(select_group(&groups, " tower ").unwrap().prefix, "Tower");
        assert_eq!(select_group(&groups, "0"), None);
        assert_eq!(select_group(&groups, "3"), None);
        assert_eq!(select_group(&groups, "B"), None);
    }
}
