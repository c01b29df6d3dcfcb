//! Analyses over a parsed model: the wall tally and the structural check.

pub mod classify;
pub mod placement;
pub mod report;
pub mod storeys;
pub mod walls;

pub use classify::{classify_dimensions, classify_model, Classification, Mismatch};
pub use placement::{check_placement, floor_reference, PlacementFinding, PlacementKind, StoreyTag};
pub use report::{build_issues, summarize, Issue, IssueKind, Summary};
pub use storeys::{assigned_storey, detect_storey, list_storeys, storey_ranges, StoreyRange};
pub use walls::{count_walls, is_footing, WallTally};

use crate::config::AuditConfig;
use crate::geometry::{BoundingBox, BoxEvaluator};
use crate::model::{ElementKind, IfcModel};
use std::collections::BTreeMap;

/// World bounding boxes of the model's elements, keyed by STEP id.
///
/// Elements whose geometry cannot be evaluated are left out with a warning.
#[must_use]
pub fn element_boxes(model: &IfcModel) -> BTreeMap<u64, BoundingBox> {
    let mut evaluator = BoxEvaluator::new(model);
    let mut boxes = BTreeMap::new();
    for element in &model.elements {
        match evaluator.element_bbox(element) {
            Ok(bbox) => {
                boxes.insert(element.id, bbox);
            }
            Err(err) => log::warn!(
                element = element.global_id.as_str(),
                class = element.ifc_class.as_str(),
                error = err.to_string();
                "Skipping element without usable geometry"
            ),
        }
    }
    boxes
}

/// Everything the `check` command reports.
#[derive(Debug, Clone)]
pub struct CheckReport {
    /// Beams, slabs, columns and walls in the structural model.
    pub elements_checked: usize,
    pub classification: Classification,
    pub issues: Vec<Issue>,
    pub summary: Summary,
    pub ranges: Vec<StoreyRange>,
    /// Whether an architectural floor reference was used.
    pub used_floor_reference: bool,
}

/// Runs classification and placement checks on a structural model,
/// optionally against the floors of an architectural model.
#[must_use]
pub fn run_check(structural: &IfcModel, architectural: Option<&IfcModel>, config: &AuditConfig) -> CheckReport {
    let boxes = element_boxes(structural);
    let ranges = storey_ranges(&structural.storeys, config.placement.top_storey_height);

    let reference = architectural.map_or_else(BTreeMap::new, |arch| {
        floor_reference(arch, &element_boxes(arch), &config.placement)
    });

    let classification = classify_model(structural, &boxes, &config.classify);
    let placement = check_placement(structural, &boxes, &ranges, &reference, &config.placement);

    let storeys: BTreeMap<u64, StoreyTag> = structural
        .elements
        .iter()
        .filter_map(|e| {
            assigned_storey(structural, e).map(|s| {
                (
                    e.id,
                    StoreyTag {
                        global_id: s.global_id.clone(),
                        name: s.name.clone(),
                    },
                )
            })
        })
        .collect();

    let issues = build_issues(&classification, &placement, &storeys, &boxes);
    let summary = summarize(&issues, &ranges);

    log::info!(
        issues = issues.len(),
        class_mismatch = summary.totals.class_mismatch,
        wrong_floor = summary.totals.wrong_floor;
        "Structural check complete"
    );

    CheckReport {
        elements_checked: structural
            .elements
            .iter()
            .filter(|e| e.kind != ElementKind::Footing)
            .count(),
        classification,
        issues,
        summary,
        ranges,
        used_floor_reference: architectural.is_some(),
    }
}
