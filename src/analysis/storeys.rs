//! Storey vertical ranges and storey lookups.

use crate::geometry::BoundingBox;
use crate::model::{Element, IfcModel, SpatialKind, Storey};
use serde::Serialize;

/// Spatial parents followed when resolving an element's storey.
const MAX_SPATIAL_DEPTH: usize = 16;

/// Vertical extent of one storey, in metres.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreyRange {
    pub storey_id: u64,
    pub global_id: String,
    pub name: String,
    pub z_start: f64,
    pub z_end: f64,
}

impl StoreyRange {
    /// Height used to scale tolerances; degenerate ranges (two storeys at
    /// the same elevation) fall back to `max(minimum, 10% of |z_end|)`.
    #[must_use]
    pub fn height(&self, minimum: f64) -> f64 {
        if self.z_end > self.z_start {
            self.z_end - self.z_start
        } else {
            minimum.max(self.z_end.abs() * 0.1)
        }
    }

    #[must_use]
    pub fn overlaps(&self, z_min: f64, z_max: f64) -> bool {
        !(z_max < self.z_start || z_min > self.z_end)
    }
}

/// Ranges for storeys sorted by elevation: each range ends where the next
/// storey starts, the topmost one `top_storey_height` above its elevation.
#[must_use]
pub fn storey_ranges(storeys: &[Storey], top_storey_height: f64) -> Vec<StoreyRange> {
    let mut sorted: Vec<&Storey> = storeys.iter().collect();
    sorted.sort_by(|a, b| a.elevation.total_cmp(&b.elevation));

    sorted
        .iter()
        .enumerate()
        .map(|(i, storey)| {
            let z_end = sorted
                .get(i + 1)
                .map_or(storey.elevation + top_storey_height, |next| next.elevation);
            StoreyRange {
                storey_id: storey.id,
                global_id: storey.global_id.clone(),
                name: storey.name.clone(),
                z_start: storey.elevation,
                z_end,
            }
        })
        .collect()
}

/// First storey range, bottom up, that the box's Z-extent touches.
#[must_use]
pub fn detect_storey<'a>(bbox: &BoundingBox, ranges: &'a [StoreyRange]) -> Option<&'a StoreyRange> {
    ranges
        .iter()
        .find(|range| range.overlaps(bbox.min.z, bbox.max.z))
}

/// Storey an element is assigned to in the spatial structure.
///
/// Elements contained directly in a storey resolve to it; elements in a
/// space resolve to the storey the space belongs to. Containment in a site
/// or building yields `None`.
#[must_use]
pub fn assigned_storey<'a>(model: &'a IfcModel, element: &Element) -> Option<&'a Storey> {
    let mut current = element.container_id?;

    for _ in 0..MAX_SPATIAL_DEPTH {
        let node = model.spatial.get(&current)?;
        match node.kind {
            SpatialKind::Storey => return model.storey(node.id),
            SpatialKind::Space => current = node.parent_id?,
            SpatialKind::Site | SpatialKind::Building => return None,
        }
    }

    log::warn!(element = element.global_id.as_str(); "Spatial structure too deep, treating element as unassigned");
    None
}

/// One line of the storey listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreyListing {
    pub index: usize,
    pub global_id: String,
    pub name: String,
    pub elevation: f64,
}

/// Storeys by ascending elevation, numbered from 1.
#[must_use]
pub fn list_storeys(model: &IfcModel) -> Vec<StoreyListing> {
    let mut storeys: Vec<&Storey> = model.storeys.iter().collect();
    storeys.sort_by(|a, b| a.elevation.total_cmp(&b.elevation));

    storeys
        .into_iter()
        .enumerate()
        .map(|(i, storey)| StoreyListing {
            index: i + 1,
            global_id: storey.global_id.clone(),
            name: if storey.name.is_empty() {
                "<unnamed>".to_string()
            } else {
                storey.name.clone()
            },
            elevation: storey.elevation,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_ifc_str;
    use nalgebra::Point3;
    use pretty_assertions::assert_eq;

    fn storey(id: u64, name: &str, elevation: f64) -> Storey {
        Storey {
            id,
            global_id: format!("{id}"),
            name: name.to_string(),
            elevation,
        }
    }

    fn bbox(z_min: f64, z_max: f64) -> BoundingBox {
        BoundingBox::new(Point3::new(0.0, 0.0, z_min), Point3::new(1.0, 1.0, z_max))
    }

    #[test]
    fn ranges_follow_elevation_order() {
        let storeys = vec![storey(2, "Level 1", 3.0), storey(1, "Ground", 0.0)];
        let ranges = storey_ranges(&storeys, 10.0);

        let spans: Vec<(&str, f64, f64)> = ranges
            .iter()
            .map(|r| (r.name.as_str(), r.z_start, r.z_end))
            .collect();
        assert_eq!(spans, vec![("Ground", 0.0, 3.0), ("Level 1", 3.0, 13.0)]);
    }

    #[test]
    fn degenerate_range_height_falls_back() {
        let storeys = vec![storey(1, "A", 6.0), storey(2, "B", 6.0)];
        let ranges = storey_ranges(&storeys, 10.0);
        assert_eq!(ranges[0].height(3.0), 3.0);
        assert_eq!(ranges[1].height(3.0), 10.0);

        let high = StoreyRange {
            z_start: 50.0,
            z_end: 50.0,
            ..ranges[0].clone()
        };
        assert_eq!(high.height(3.0), 5.0);
    }

    #[test]
    fn detection_picks_lowest_overlapping_storey() {
        let storeys = vec![storey(1, "Ground", 0.0), storey(2, "Level 1", 3.0)];
        let ranges = storey_ranges(&storeys, 10.0);

        assert_eq!(detect_storey(&bbox(0.5, 2.5), &ranges).unwrap().name, "Ground");
        // Touching the boundary counts as overlap with the lower storey
        assert_eq!(detect_storey(&bbox(3.0, 3.2), &ranges).unwrap().name, "Ground");
        assert_eq!(detect_storey(&bbox(4.0, 5.0), &ranges).unwrap().name, "Level 1");
        assert_eq!(detect_storey(&bbox(-5.0, -1.0), &ranges), None);
    }

    const SPATIAL: &str = "ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('0YvctVUKr0kugbFTf53O9L',$,'P',$,$,$,$,$,$);
#2=IFCBUILDING('0YvctVUKr0kugbFTf53O9M',$,'B',$,$,$,$,$,.ELEMENT.,$,$,$);
#3=IFCBUILDINGSTOREY('0YvctVUKr0kugbFTf53O9N',$,'',$,$,$,$,$,.ELEMENT.,0.);
#4=IFCSPACE('0YvctVUKr0kugbFTf53O9O',$,'Room',$,$,$,$,$,.ELEMENT.,.INTERNAL.,$);
#5=IFCRELAGGREGATES('0YvctVUKr0kugbFTf53O9P',$,$,$,#3,(#4));
#10=IFCCOLUMN('1YvctVUKr0kugbFTf53O9A',$,'in storey',$,$,$,$,$,$);
#11=IFCCOLUMN('1YvctVUKr0kugbFTf53O9B',$,'in space',$,$,$,$,$,$);
#12=IFCCOLUMN('1YvctVUKr0kugbFTf53O9C',$,'in building',$,$,$,$,$,$);
#13=IFCCOLUMN('1YvctVUKr0kugbFTf53O9D',$,'nowhere',$,$,$,$,$,$);
#20=IFCRELCONTAINEDINSPATIALSTRUCTURE('2YvctVUKr0kugbFTf53O9A',$,$,$,(#10),#3);
#21=IFCRELCONTAINEDINSPATIALSTRUCTURE('2YvctVUKr0kugbFTf53O9B',$,$,$,(#11),#4);
#22=IFCRELCONTAINEDINSPATIALSTRUCTURE('2YvctVUKr0kugbFTf53O9C',$,$,$,(#12),#2);
ENDSEC;
END-ISO-10303-21;
";

    #[test]
    fn assigned_storey_follows_spaces() {
        let model = parse_ifc_str(SPATIAL, "spatial.ifc".to_string()).unwrap();
        let assigned: Vec<Option<u64>> = model
            .elements
            .iter()
            .map(|e| assigned_storey(&model, e).map(|s| s.id))
            .collect();
        assert_eq!(assigned, vec![Some(3), Some(3), None, None]);
    }

    #[test]
    fn listing_numbers_storeys_and_names_blanks() {
        let model = parse_ifc_str(SPATIAL, "spatial.ifc".to_string()).unwrap();
        let listing = list_storeys(&model);
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].index, 1);
        assert_eq!(listing[0].name, "<unnamed>");
    }
}
