//! Aspect-ratio heuristics flagging elements modelled with the wrong class.

use crate::config::ClassifyConfig;
use crate::geometry::BoundingBox;
use crate::model::{ElementKind, IfcModel};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Variants are declared in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Mismatch {
    SlabLikeBeam,
    BeamLikeSlab,
    WallLikeBeam,
    SlabLikeColumn,
    BeamLikeWall,
    /// Counted on the console only, never turned into an issue.
    ColumnLikeSlab,
}

impl Mismatch {
    pub const ALL: [Mismatch; 6] = [
        Mismatch::SlabLikeBeam,
        Mismatch::BeamLikeSlab,
        Mismatch::WallLikeBeam,
        Mismatch::SlabLikeColumn,
        Mismatch::BeamLikeWall,
        Mismatch::ColumnLikeSlab,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Mismatch::SlabLikeBeam => "Slab-like Beam",
            Mismatch::BeamLikeSlab => "Beam-like Slab",
            Mismatch::WallLikeBeam => "Wall-like Beam",
            Mismatch::SlabLikeColumn => "Slab-like Column",
            Mismatch::BeamLikeWall => "Beam-like Wall",
            Mismatch::ColumnLikeSlab => "Column-like Slab",
        }
    }

    #[must_use]
    pub fn is_issue(self) -> bool {
        self != Mismatch::ColumnLikeSlab
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Mismatches suggested by the sorted extents `[t, b, l]` of an element.
///
/// Returns nothing for degenerate boxes (`t == 0` or `b == 0`) and for
/// kinds without heuristics.
#[must_use]
pub fn classify_dimensions(kind: ElementKind, dims: [f64; 3], rules: &ClassifyConfig) -> Vec<Mismatch> {
    let [t, b, l] = dims;
    let mut found = Vec::new();
    if t == 0.0 || b == 0.0 {
        return found;
    }

    match kind {
        ElementKind::Beam => {
            let r = &rules.beam;
            let very_thin = t < r.slab_thickness_to_breadth * b && t < r.slab_thickness_to_length * l;
            if very_thin && b * l > r.min_plan_area {
                found.push(Mismatch::SlabLikeBeam);
            }
            let wall_ratio = (b > r.wall_breadth_to_thickness * t && l > r.wall_length_to_breadth * b)
                || (l > r.wall_length_to_thickness * t && b > t);
            if wall_ratio && !very_thin {
                found.push(Mismatch::WallLikeBeam);
            }
        }
        ElementKind::Slab => {
            let r = &rules.slab;
            if b > r.beam_breadth_to_thickness * t
                && l > r.beam_length_to_thickness * t
                && l / b > r.beam_length_to_breadth
            {
                found.push(Mismatch::BeamLikeSlab);
            }
            if b / t < r.column_breadth_to_thickness && l / b < r.column_length_to_breadth {
                found.push(Mismatch::ColumnLikeSlab);
            }
        }
        ElementKind::Column => {
            let r = &rules.column;
            if t < r.slab_thickness_to_breadth * b && t < r.slab_thickness_to_length * l {
                found.push(Mismatch::SlabLikeColumn);
            }
        }
        ElementKind::Wall => {
            let r = &rules.wall;
            if (b < r.beam_breadth_to_thickness * t && l > r.beam_length_to_thickness * t)
                || l / b > r.beam_length_to_breadth
            {
                found.push(Mismatch::BeamLikeWall);
            }
        }
        ElementKind::Footing => {}
    }

    found
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassFinding {
    pub element_id: u64,
    pub global_id: String,
    pub ifc_class: String,
    pub mismatch: Mismatch,
    /// Thickness, breadth, length in metres.
    pub dimensions: [f64; 3],
}

/// Classification findings of a model, grouped by mismatch in reporting
/// order and by element id within a group.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Classification {
    pub findings: Vec<ClassFinding>,
}

impl Classification {
    #[must_use]
    pub fn count(&self, mismatch: Mismatch) -> usize {
        self.findings.iter().filter(|f| f.mismatch == mismatch).count()
    }

    /// Findings that become issues.
    pub fn issues(&self) -> impl Iterator<Item = &ClassFinding> {
        self.findings.iter().filter(|f| f.mismatch.is_issue())
    }
}

/// Runs the heuristics over every element with a bounding box.
#[must_use]
pub fn classify_model(
    model: &IfcModel,
    boxes: &BTreeMap<u64, BoundingBox>,
    rules: &ClassifyConfig,
) -> Classification {
    let mut findings = Vec::new();

    for element in &model.elements {
        let Some(bbox) = boxes.get(&element.id) else {
            continue;
        };
        let dimensions = bbox.sorted_dimensions();
        for mismatch in classify_dimensions(element.kind, dimensions, rules) {
            log::debug!(
                element = element.global_id.as_str(),
                mismatch = mismatch.label();
                "Class mismatch candidate"
            );
            findings.push(ClassFinding {
                element_id: element.id,
                global_id: element.global_id.clone(),
                ifc_class: element.ifc_class.clone(),
                mismatch,
                dimensions,
            });
        }
    }

    findings.sort_by_key(|f| (f.mismatch, f.element_id));
    Classification { findings }
}
