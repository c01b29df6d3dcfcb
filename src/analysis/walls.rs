//! Structural wall tally per storey.

use super::storeys::assigned_storey;
use crate::config::WallConfig;
use crate::model::{Element, ElementKind, IfcModel, PropertyValue};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Label used for walls without an `IfcRelDefinesByType`.
pub const UNTYPED: &str = "<untyped>";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreyWallCount {
    pub storey: String,
    pub global_id: String,
    pub elevation: f64,
    pub walls: usize,
    pub load_bearing: usize,
}

/// Result of [`count_walls`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WallTally {
    /// One row per storey, by ascending elevation, including empty storeys.
    pub rows: Vec<StoreyWallCount>,
    /// Counted walls not contained in any storey.
    pub unassigned: usize,
    pub unassigned_load_bearing: usize,
    /// Every wall in the model per type name, before filtering.
    pub type_counts: BTreeMap<String, usize>,
    /// Walls skipped because they are marked as footings.
    pub footings_excluded: usize,
    /// Walls skipped by the type or load-bearing filter.
    pub filtered_out: usize,
}

impl WallTally {
    #[must_use]
    pub fn total(&self) -> usize {
        self.rows.iter().map(|r| r.walls).sum::<usize>() + self.unassigned
    }

    #[must_use]
    pub fn total_load_bearing(&self) -> usize {
        self.rows.iter().map(|r| r.load_bearing).sum::<usize>() + self.unassigned_load_bearing
    }
}

/// Whether `element` is a footing: an `IfcFooting`, or an element whose
/// type name, name, object type or `Reference` property contains one of
/// `markers` (case-insensitive).
#[must_use]
pub fn is_footing(element: &Element, markers: &[String]) -> bool {
    if element.kind == ElementKind::Footing {
        return true;
    }

    let reference = match element.find_property("Reference") {
        Some(PropertyValue::Text(text)) => Some(text.as_str()),
        _ => None,
    };
    let labels = [
        element.type_name.as_deref(),
        element.name.as_deref(),
        element.object_type.as_deref(),
        reference,
    ];

    markers
        .iter()
        .map(|m| m.trim().to_lowercase())
        .filter(|m| !m.is_empty())
        .any(|marker| {
            labels
                .iter()
                .flatten()
                .any(|label| label.to_lowercase().contains(&marker))
        })
}

/// Counts structural walls per storey.
///
/// The result depends only on the model content: storeys come in
/// elevation order and type counts in name order.
#[must_use]
pub fn count_walls(model: &IfcModel, config: &WallConfig) -> WallTally {
    let mut per_storey: HashMap<u64, (usize, usize)> = HashMap::new();
    let mut tally = WallTally {
        rows: Vec::new(),
        unassigned: 0,
        unassigned_load_bearing: 0,
        type_counts: BTreeMap::new(),
        footings_excluded: 0,
        filtered_out: 0,
    };

    for wall in model.elements_of(ElementKind::Wall) {
        let type_name = wall.type_name.as_deref().unwrap_or(UNTYPED);
        *tally.type_counts.entry(type_name.to_string()).or_default() += 1;

        if is_footing(wall, &config.footing_markers) {
            log::debug!(wall = wall.global_id.as_str(), type_name = type_name; "Excluding footing");
            tally.footings_excluded += 1;
            continue;
        }

        if let Some(wanted) = config.wall_type.as_deref() {
            if wall.type_name.as_deref() != Some(wanted) {
                tally.filtered_out += 1;
                continue;
            }
        }

        let load_bearing = wall.load_bearing() == Some(true);
        if config.require_load_bearing && !load_bearing {
            tally.filtered_out += 1;
            continue;
        }

        let bearing = usize::from(load_bearing);
        match assigned_storey(model, wall) {
            Some(storey) => {
                let entry = per_storey.entry(storey.id).or_default();
                entry.0 += 1;
                entry.1 += bearing;
            }
            None => {
                log::warn!(wall = wall.global_id.as_str(); "Wall is not contained in any storey");
                tally.unassigned += 1;
                tally.unassigned_load_bearing += bearing;
            }
        }
    }

    tally.rows = model
        .storeys
        .iter()
        .map(|storey| {
            let (walls, load_bearing) = per_storey.get(&storey.id).copied().unwrap_or_default();
            StoreyWallCount {
                storey: storey.name.clone(),
                global_id: storey.global_id.clone(),
                elevation: storey.elevation,
                walls,
                load_bearing,
            }
        })
        .collect();

    log::info!(
        counted = tally.total(),
        footings = tally.footings_excluded,
        filtered = tally.filtered_out;
        "Wall tally complete"
    );

    tally
}
