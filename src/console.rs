//! Plain-text reports printed by the command-line tool.

use crate::analysis::{CheckReport, Mismatch, WallTally};
use crate::analysis::storeys::StoreyListing;
use std::fmt::Write as _;

#[must_use]
pub fn wall_tally(tally: &WallTally) -> String {
    let mut out = String::new();
    let all_walls: usize = tally.type_counts.values().sum();

    let _ = writeln!(out, "Walls in model: {all_walls}");
    out.push_str("Wall types and counts:\n");
    for (type_name, count) in &tally.type_counts {
        let _ = writeln!(out, "  {type_name}: {count}");
    }
    let _ = writeln!(out, "Excluded footings: {}", tally.footings_excluded);
    if tally.filtered_out > 0 {
        let _ = writeln!(out, "Filtered out: {}", tally.filtered_out);
    }

    out.push('\n');
    for row in &tally.rows {
        let _ = writeln!(
            out,
            "Floor: {}, wall count: {} (load-bearing: {})",
            row.storey, row.walls, row.load_bearing
        );
    }
    if tally.unassigned > 0 {
        let _ = writeln!(
            out,
            "No storey, wall count: {} (load-bearing: {})",
            tally.unassigned, tally.unassigned_load_bearing
        );
    }
    let _ = write!(
        out,
        "Total: {} walls, {} load-bearing",
        tally.total(),
        tally.total_load_bearing()
    );
    out
}

#[must_use]
pub fn storey_table(file_name: &str, storeys: &[StoreyListing]) -> String {
    if storeys.is_empty() {
        return "No IfcBuildingStorey entities found in the file.".to_string();
    }

    let mut out = format!("Found {} storeys in '{file_name}':\n\n", storeys.len());
    let _ = writeln!(out, "{:>5}  {:36}  {:30}  Elevation", "Index", "GlobalId", "Name");
    for storey in storeys {
        let _ = writeln!(
            out,
            "{:5}  {:36}  {:30}  {:.3}",
            storey.index, storey.global_id, storey.name, storey.elevation
        );
    }
    out.pop();
    out
}

#[must_use]
pub fn check_summary(report: &CheckReport) -> String {
    let mut out = String::new();
    let c = &report.classification;

    let _ = writeln!(out, "Found {} structural elements to check", report.elements_checked);
    let counts: Vec<String> = Mismatch::ALL
        .iter()
        .map(|m| format!("{}={}", m.label().to_lowercase(), c.count(*m)))
        .collect();
    let _ = writeln!(out, "Class-checks: {}", counts.join(", "));
    if !report.used_floor_reference {
        out.push_str("No architectural model: storey elevations used as floor reference\n");
    }

    let wrong = &report.summary.wrong_floor_per_storey;
    if wrong.is_empty() {
        out.push_str("No wrong-floor elements found.\n");
    } else {
        out.push_str("Wrong-floor counts per assigned storey:\n");
        for row in wrong {
            let _ = writeln!(out, "- {} ({}): {} elements", row.storey.name, row.storey.global_id, row.count);
        }
    }

    let t = &report.summary.totals;
    let _ = write!(
        out,
        "Issues: {} (wrong-floor {}, unassigned {}, floating {}, class-mismatch {})",
        report.summary.issue_count, t.wrong_floor, t.unassigned, t.floating, t.class_mismatch
    );
    out
}
