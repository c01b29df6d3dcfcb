//! Floor placement checks: elements assigned to the wrong storey, to no
//! storey, or floating outside their storey's vertical range.

use super::storeys::{assigned_storey, detect_storey, storey_ranges, StoreyRange};
use crate::config::PlacementConfig;
use crate::geometry::BoundingBox;
use crate::model::{ElementKind, IfcModel};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Variants are declared in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PlacementKind {
    Floating,
    Unassigned,
    WrongFloor,
}

impl PlacementKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PlacementKind::Floating => "Floating element",
            PlacementKind::Unassigned => "Unassigned element",
            PlacementKind::WrongFloor => "Wrong floor assignment",
        }
    }
}

impl fmt::Display for PlacementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreyTag {
    pub global_id: String,
    pub name: String,
}

impl From<&StoreyRange> for StoreyTag {
    fn from(range: &StoreyRange) -> Self {
        Self {
            global_id: range.global_id.clone(),
            name: range.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementFinding {
    pub element_id: u64,
    pub global_id: String,
    pub ifc_class: String,
    pub kind: PlacementKind,
    /// Storey from the spatial structure.
    pub assigned: Option<StoreyTag>,
    /// Storey suggested by the element's geometry.
    pub detected: Option<StoreyTag>,
}

/// Lowest slab bottom per storey GlobalId of an architectural model.
///
/// Slabs without a storey are matched geometrically against the model's
/// own storey ranges.
#[must_use]
pub fn floor_reference(
    arch: &IfcModel,
    boxes: &BTreeMap<u64, BoundingBox>,
    config: &PlacementConfig,
) -> BTreeMap<String, f64> {
    let ranges = storey_ranges(&arch.storeys, config.top_storey_height);
    let mut lowest: BTreeMap<String, f64> = BTreeMap::new();

    for slab in arch.elements_of(ElementKind::Slab) {
        let Some(bbox) = boxes.get(&slab.id) else {
            continue;
        };
        let storey = assigned_storey(arch, slab)
            .map(|s| s.global_id.clone())
            .or_else(|| detect_storey(bbox, &ranges).map(|r| r.global_id.clone()));
        let Some(storey) = storey else {
            continue;
        };

        lowest
            .entry(storey)
            .and_modify(|z| *z = z.min(bbox.min.z))
            .or_insert(bbox.min.z);
    }

    log::info!(storeys = lowest.len(); "Architectural floor reference computed");
    lowest
}

/// Tolerance on the bottom of a slab or beam: the larger of a fraction of
/// the storey height and a fraction of the element height.
#[must_use]
pub fn floor_tolerance(storey_height: f64, element_height: f64, config: &PlacementConfig) -> f64 {
    (config.storey_height_fraction * storey_height).max(config.element_height_fraction * element_height)
}

/// Checks every beam, slab, column and wall with a bounding box.
///
/// Slabs and beams must sit with their bottom on the storey floor: the
/// lowest architectural slab of the storey when `floor_reference` has it,
/// the storey elevation otherwise. Columns and walls must have their
/// mid-height inside the storey range.
#[must_use]
pub fn check_placement(
    model: &IfcModel,
    boxes: &BTreeMap<u64, BoundingBox>,
    ranges: &[StoreyRange],
    floor_reference: &BTreeMap<String, f64>,
    config: &PlacementConfig,
) -> Vec<PlacementFinding> {
    let mut findings = Vec::new();

    for element in &model.elements {
        if element.kind == ElementKind::Footing {
            continue;
        }
        let Some(bbox) = boxes.get(&element.id) else {
            continue;
        };

        let detected = detect_storey(bbox, ranges).map(StoreyTag::from);
        let finding = |kind, assigned| PlacementFinding {
            element_id: element.id,
            global_id: element.global_id.clone(),
            ifc_class: element.ifc_class.clone(),
            kind,
            assigned,
            detected: detected.clone(),
        };

        let Some(storey) = assigned_storey(model, element) else {
            findings.push(finding(PlacementKind::Unassigned, None));
            continue;
        };
        let Some(range) = ranges.iter().find(|r| r.global_id == storey.global_id) else {
            let assigned = StoreyTag {
                global_id: storey.global_id.clone(),
                name: storey.name.clone(),
            };
            findings.push(finding(PlacementKind::WrongFloor, Some(assigned)));
            continue;
        };

        let kind = match element.kind {
            ElementKind::Slab | ElementKind::Beam => {
                let expected = floor_reference
                    .get(&range.global_id)
                    .copied()
                    .unwrap_or(range.z_start);
                let tolerance = floor_tolerance(
                    range.height(config.fallback_storey_height),
                    bbox.height(),
                    config,
                );
                let bottom = bbox.min.z;
                ((bottom - expected).abs() > tolerance).then_some(PlacementKind::WrongFloor)
            }
            _ => {
                let mid = bbox.mid_z();
                let margin = config.floating_margin;
                (mid < range.z_start - margin || mid > range.z_end + margin)
                    .then_some(PlacementKind::Floating)
            }
        };

        if let Some(kind) = kind {
            log::debug!(
                element = element.global_id.as_str(),
                storey = range.name.as_str(),
                kind = kind.label();
                "Placement issue"
            );
            findings.push(finding(kind, Some(StoreyTag::from(range))));
        }
    }

    findings.sort_by_key(|f| (f.kind, f.element_id));
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_ifc_str;
    use nalgebra::Point3;
    use pretty_assertions::assert_eq;

    const MODEL: &str = "ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('0YvctVUKr0kugbFTf53O9L',$,'Placement',$,$,$,$,$,$);
#10=IFCBUILDINGSTOREY('1xS3BCk291UvhgP2dvNsg0',$,'Ground',$,$,$,$,$,.ELEMENT.,0.);
#11=IFCBUILDINGSTOREY('1xS3BCk291UvhgP2dvNsg1',$,'Level 1',$,$,$,$,$,.ELEMENT.,3.);
#20=IFCSLAB('2xS3BCk291UvhgP2dvNsg0',$,'on floor',$,$,$,$,$,.FLOOR.);
#21=IFCSLAB('2xS3BCk291UvhgP2dvNsg1',$,'too high',$,$,$,$,$,.FLOOR.);
#22=IFCCOLUMN('2xS3BCk291UvhgP2dvNsg2',$,'inside',$,$,$,$,$,$);
#23=IFCCOLUMN('2xS3BCk291UvhgP2dvNsg3',$,'floating',$,$,$,$,$,$);
#24=IFCBEAM('2xS3BCk291UvhgP2dvNsg4',$,'loose',$,$,$,$,$,$);
#25=IFCFOOTING('2xS3BCk291UvhgP2dvNsg5',$,'pad',$,$,$,$,$,.PAD_FOOTING.);
#30=IFCRELCONTAINEDINSPATIALSTRUCTURE('3xS3BCk291UvhgP2dvNsg0',$,$,$,(#20,#21,#22,#23,#25),#11);
ENDSEC;
END-ISO-10303-21;
";

    fn bbox(z_min: f64, z_max: f64) -> BoundingBox {
        BoundingBox::new(Point3::new(0.0, 0.0, z_min), Point3::new(4.0, 4.0, z_max))
    }

    fn run(
        boxes: &[(u64, BoundingBox)],
        reference: &BTreeMap<String, f64>,
    ) -> Vec<(u64, PlacementKind)> {
        let model = parse_ifc_str(MODEL, "placement.ifc".to_string()).unwrap();
        let config = PlacementConfig::default();
        let ranges = storey_ranges(&model.storeys, config.top_storey_height);
        let boxes: BTreeMap<u64, BoundingBox> = boxes.iter().copied().collect();
        check_placement(&model, &boxes, &ranges, reference, &config)
            .into_iter()
            .map(|f| (f.element_id, f.kind))
            .collect()
    }

    #[test]
    fn slab_within_tolerance_passes() {
        // Level 1 spans 3..13 m: tolerance max(0.2, 0.2 * 0.25) = 0.2 m
        let found = run(&[(20, bbox(3.15, 3.4))], &BTreeMap::new());
        assert_eq!(found, vec![]);
    }

    #[test]
    fn slab_beyond_tolerance_is_wrong_floor() {
        let found = run(&[(21, bbox(3.25, 3.5))], &BTreeMap::new());
        assert_eq!(found, vec![(21, PlacementKind::WrongFloor)]);
    }

    #[test]
    fn element_height_widens_tolerance() {
        // A 2 m deep slab allows 0.4 m
        let found = run(&[(21, bbox(3.35, 5.35))], &BTreeMap::new());
        assert_eq!(found, vec![]);
    }

    #[test]
    fn architectural_floor_replaces_storey_elevation() {
        let reference: BTreeMap<String, f64> =
            [("1xS3BCk291UvhgP2dvNsg1".to_string(), 2.7)].into_iter().collect();
        let boxes = [(20, bbox(3.15, 3.4)), (21, bbox(2.75, 3.0))];
        assert_eq!(
            run(&boxes, &reference),
            vec![(20, PlacementKind::WrongFloor)]
        );
    }

    #[test]
    fn columns_must_stay_in_their_storey() {
        let boxes = [(22, bbox(3.0, 6.0)), (23, bbox(-3.0, 0.0))];
        assert_eq!(
            run(&boxes, &BTreeMap::new()),
            vec![(23, PlacementKind::Floating)]
        );
    }

    #[test]
    fn unassigned_elements_get_a_suggestion() {
        let model = parse_ifc_str(MODEL, "placement.ifc".to_string()).unwrap();
        let config = PlacementConfig::default();
        let ranges = storey_ranges(&model.storeys, config.top_storey_height);
        let boxes: BTreeMap<u64, BoundingBox> = [(24, bbox(0.5, 1.0))].into_iter().collect();

        let findings = check_placement(&model, &boxes, &ranges, &BTreeMap::new(), &config);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, PlacementKind::Unassigned);
        assert_eq!(findings[0].assigned, None);
        assert_eq!(findings[0].detected.as_ref().unwrap().name, "Ground");
    }

    #[test]
    fn footings_and_missing_geometry_are_skipped() {
        assert_eq!(run(&[(25, bbox(-9.0, -8.0))], &BTreeMap::new()), vec![]);
        assert_eq!(run(&[], &BTreeMap::new()), vec![]);
    }

    #[test]
    fn tolerance_takes_the_larger_fraction() {
        let config = PlacementConfig::default();
        assert!((floor_tolerance(3.0, 0.2, &config) - 0.06).abs() < 1e-12);
        assert!((floor_tolerance(3.0, 1.0, &config) - 0.2).abs() < 1e-12);
    }
}
