//! Issues and the summary of a structural check.

use super::classify::{ClassFinding, Classification, Mismatch};
use super::placement::{PlacementFinding, PlacementKind, StoreyTag};
use super::storeys::StoreyRange;
use crate::geometry::BoundingBox;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum IssueKind {
    Class(Mismatch),
    Placement(PlacementKind),
}

/// One element-level finding, ready to become a BCF topic.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub kind: IssueKind,
    pub element_id: u64,
    pub global_id: String,
    pub ifc_class: String,
    pub title: String,
    pub description: String,
    /// Storey the element is assigned to, `None` when unassigned.
    pub storey: Option<StoreyTag>,
    pub bbox: Option<BoundingBox>,
}

fn class_description(finding: &ClassFinding) -> String {
    let gid = &finding.global_id;
    match finding.mismatch {
        Mismatch::SlabLikeBeam => format!(
            "Beam {gid} has slab-like geometry (thin thickness vs large plan). Consider IfcSlab."
        ),
        Mismatch::BeamLikeSlab => format!(
            "Slab {gid} has beam-like geometry (long/deep vs thickness). Consider IfcBeam."
        ),
        Mismatch::WallLikeBeam => format!(
            "Beam {gid} has wall-like geometry (tall/plate-like). Consider IfcWall."
        ),
        Mismatch::SlabLikeColumn => {
            format!("Column {gid} appears slab-like. Consider IfcSlab or review geometry.")
        }
        Mismatch::BeamLikeWall => format!("Wall {gid} appears beam-like (bar-like). Consider IfcBeam."),
        Mismatch::ColumnLikeSlab => format!("Slab {gid} appears column-like."),
    }
}

fn storey_label(tag: Option<&StoreyTag>) -> String {
    tag.map_or_else(
        || "<none>".to_string(),
        |t| format!("{} ({})", t.name, t.global_id),
    )
}

fn placement_description(finding: &PlacementFinding) -> String {
    let element = format!("Element {} ({})", finding.ifc_class, finding.global_id);
    let assigned = storey_label(finding.assigned.as_ref());
    let detected = storey_label(finding.detected.as_ref());
    match finding.kind {
        PlacementKind::Floating => format!(
            "{element} is assigned to storey {assigned} but its geometry does not overlap the storey's vertical range."
        ),
        PlacementKind::Unassigned => format!(
            "{element} is not assigned to any IfcBuildingStorey. Geometry suggests storey {detected}."
        ),
        PlacementKind::WrongFloor => {
            format!("{element} is assigned to {assigned} but geometry overlaps {detected}.")
        }
    }
}

/// Turns findings into issues: class mismatches first, then placement
/// findings, each group in the order its analysis reported it.
///
/// `storeys` maps element ids to their assigned storey and `boxes` supplies
/// the geometry used for viewpoints.
#[must_use]
pub fn build_issues(
    classification: &Classification,
    placement: &[PlacementFinding],
    storeys: &BTreeMap<u64, StoreyTag>,
    boxes: &BTreeMap<u64, BoundingBox>,
) -> Vec<Issue> {
    let class_issues = classification.issues().map(|finding| Issue {
        kind: IssueKind::Class(finding.mismatch),
        element_id: finding.element_id,
        global_id: finding.global_id.clone(),
        ifc_class: finding.ifc_class.clone(),
        title: format!(
            "{}: {} ({})",
            finding.mismatch.label(),
            finding.ifc_class,
            finding.global_id
        ),
        description: class_description(finding),
        storey: storeys.get(&finding.element_id).cloned(),
        bbox: boxes.get(&finding.element_id).copied(),
    });

    let placement_issues = placement.iter().map(|finding| Issue {
        kind: IssueKind::Placement(finding.kind),
        element_id: finding.element_id,
        global_id: finding.global_id.clone(),
        ifc_class: finding.ifc_class.clone(),
        title: format!(
            "{} \u{2013} {} ({})",
            finding.kind.label(),
            finding.ifc_class,
            finding.global_id
        ),
        description: placement_description(finding),
        storey: finding.assigned.clone(),
        bbox: boxes.get(&finding.element_id).copied(),
    });

    class_issues.chain(placement_issues).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreyCount {
    pub storey: StoreyTag,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub wrong_floor: usize,
    pub unassigned: usize,
    pub floating: usize,
    pub class_mismatch: usize,
}

/// Per-storey and per-kind counts of a set of issues.
///
/// `per_storey` plus `without_storey` always adds up to `issue_count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Every storey in elevation order, then storeys unknown to the ranges.
    pub per_storey: Vec<StoreyCount>,
    /// Issues on elements without an assigned storey.
    pub without_storey: usize,
    pub wrong_floor_per_storey: Vec<StoreyCount>,
    pub totals: Totals,
    pub issue_count: usize,
}

fn count_by_storey<'a>(
    ranges: &[StoreyRange],
    tags: impl Iterator<Item = Option<&'a StoreyTag>>,
) -> (Vec<StoreyCount>, usize) {
    let mut rows: Vec<StoreyCount> = ranges
        .iter()
        .map(|range| StoreyCount {
            storey: StoreyTag::from(range),
            count: 0,
        })
        .collect();
    let mut without = 0;

    for tag in tags {
        let Some(tag) = tag else {
            without += 1;
            continue;
        };
        match rows.iter_mut().find(|row| row.storey.global_id == tag.global_id) {
            Some(row) => row.count += 1,
            None => rows.push(StoreyCount {
                storey: tag.clone(),
                count: 1,
            }),
        }
    }

    (rows, without)
}

#[must_use]
pub fn summarize(issues: &[Issue], ranges: &[StoreyRange]) -> Summary {
    let (per_storey, without_storey) =
        count_by_storey(ranges, issues.iter().map(|issue| issue.storey.as_ref()));

    let wrong_floor = issues
        .iter()
        .filter(|issue| issue.kind == IssueKind::Placement(PlacementKind::WrongFloor));
    let (mut wrong_floor_per_storey, _) =
        count_by_storey(ranges, wrong_floor.map(|issue| issue.storey.as_ref()));
    wrong_floor_per_storey.retain(|row| row.count > 0);

    let mut totals = Totals::default();
    for issue in issues {
        match issue.kind {
            IssueKind::Class(_) => totals.class_mismatch += 1,
            IssueKind::Placement(PlacementKind::WrongFloor) => totals.wrong_floor += 1,
            IssueKind::Placement(PlacementKind::Unassigned) => totals.unassigned += 1,
            IssueKind::Placement(PlacementKind::Floating) => totals.floating += 1,
        }
    }

    Summary {
        per_storey,
        without_storey,
        wrong_floor_per_storey,
        totals,
        issue_count: issues.len(),
    }
}

impl Summary {
    /// Body of the summary topic.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::from("Structural check summary:\n\n");

        out.push_str("Issues per assigned storey:\n");
        for row in &self.per_storey {
            let _ = writeln!(out, "- {} ({}): {}", row.storey.name, row.storey.global_id, row.count);
        }
        let _ = writeln!(out, "- <no storey>: {}", self.without_storey);

        out.push('\n');
        if self.wrong_floor_per_storey.is_empty() {
            out.push_str("No wrong-floor elements found.\n");
        } else {
            out.push_str("Wrong-floor elements per assigned storey:\n");
            for row in &self.wrong_floor_per_storey {
                let _ = writeln!(out, "- {} ({}): {}", row.storey.name, row.storey.global_id, row.count);
            }
        }

        let t = &self.totals;
        out.push_str("\nTotals:\n");
        let _ = writeln!(out, "- Wrong-floor: {}", t.wrong_floor);
        let _ = writeln!(out, "- Unassigned: {}", t.unassigned);
        let _ = writeln!(out, "- Floating: {}", t.floating);
        let _ = writeln!(out, "- Class-mismatch candidates: {}", t.class_mismatch);
        let _ = write!(out, "- All issues: {}", self.issue_count);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tag(gid: &str, name: &str) -> StoreyTag {
        StoreyTag {
            global_id: gid.to_string(),
            name: name.to_string(),
        }
    }

    fn range(gid: &str, name: &str, z: f64) -> StoreyRange {
        StoreyRange {
            storey_id: 0,
            global_id: gid.to_string(),
            name: name.to_string(),
            z_start: z,
            z_end: z + 3.0,
        }
    }

    fn issue(kind: IssueKind, storey: Option<StoreyTag>) -> Issue {
        Issue {
            kind,
            element_id: 1,
            global_id: "0YvctVUKr0kugbFTf53O9L".to_string(),
            ifc_class: "IfcBeam".to_string(),
            title: String::new(),
            description: String::new(),
            storey,
            bbox: None,
        }
    }

    #[test]
    fn storey_counts_add_up_to_issue_count() {
        let ranges = vec![range("A", "Ground", 0.0), range("B", "Level 1", 3.0)];
        let issues = vec![
            issue(IssueKind::Class(Mismatch::SlabLikeBeam), Some(tag("A", "Ground"))),
            issue(IssueKind::Placement(PlacementKind::WrongFloor), Some(tag("B", "Level 1"))),
            issue(IssueKind::Placement(PlacementKind::WrongFloor), Some(tag("B", "Level 1"))),
            issue(IssueKind::Placement(PlacementKind::Unassigned), None),
            issue(IssueKind::Placement(PlacementKind::Floating), Some(tag("X", "Ghost"))),
        ];

        let summary = summarize(&issues, &ranges);
        let counted: usize =
            summary.per_storey.iter().map(|r| r.count).sum::<usize>() + summary.without_storey;
        assert_eq!(counted, summary.issue_count);
        assert_eq!(summary.issue_count, 5);

        let rows: Vec<(&str, usize)> = summary
            .per_storey
            .iter()
            .map(|r| (r.storey.name.as_str(), r.count))
            .collect();
        assert_eq!(rows, vec![("Ground", 1), ("Level 1", 2), ("Ghost", 1)]);
        assert_eq!(
            summary.totals,
            Totals {
                wrong_floor: 2,
                unassigned: 1,
                floating: 1,
                class_mismatch: 1,
            }
        );
        assert_eq!(summary.wrong_floor_per_storey.len(), 1);
    }

    #[test]
    fn summary_text_lists_storeys_and_totals() {
        let ranges = vec![range("A", "Ground", 0.0)];
        let summary = summarize(&[], &ranges);
        assert_eq!(
            summary.text(),
            "Structural check summary:

Issues per assigned storey:
- Ground (A): 0
- <no storey>: 0

No wrong-floor elements found.

Totals:
- Wrong-floor: 0
- Unassigned: 0
- Floating: 0
- Class-mismatch candidates: 0
- All issues: 0"
        );
    }

    #[test]
    fn issues_keep_reporting_order() {
        let classification = Classification {
            findings: vec![
                ClassFinding {
                    element_id: 7,
                    global_id: "1BeamGuid0000000000000".to_string(),
                    ifc_class: "IfcBeam".to_string(),
                    mismatch: Mismatch::SlabLikeBeam,
                    dimensions: [0.2, 2.0, 4.0],
                },
                ClassFinding {
                    element_id: 8,
                    global_id: "1SlabGuid0000000000000".to_string(),
                    ifc_class: "IfcSlab".to_string(),
                    mismatch: Mismatch::ColumnLikeSlab,
                    dimensions: [0.5, 0.6, 1.2],
                },
            ],
        };
        let placement = vec![PlacementFinding {
            element_id: 9,
            global_id: "1ColGuid00000000000000".to_string(),
            ifc_class: "IfcColumn".to_string(),
            kind: PlacementKind::Unassigned,
            assigned: None,
            detected: Some(tag("A", "Ground")),
        }];

        let issues = build_issues(&classification, &placement, &BTreeMap::new(), &BTreeMap::new());
        let titles: Vec<&str> = issues.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Slab-like Beam: IfcBeam (1BeamGuid0000000000000)",
                "Unassigned element \u{2013} IfcColumn (1ColGuid00000000000000)",
            ]
        );
        assert_eq!(
            issues[1].description,
            "Element IfcColumn (1ColGuid00000000000000) is not assigned to any IfcBuildingStorey. Geometry suggests storey Ground (A)."
        );
    }
}
