//! World-space bounding boxes of IFC elements.
//!
//! Meshing is done by `ifc-lite-geometry`; this module only turns the mesh
//! of an element into an axis-aligned box in metres.

use crate::error::GeometryError;
use crate::model::{Element, IfcModel};
use ifc_lite_core::EntityDecoder;
use ifc_lite_geometry::GeometryRouter;
use nalgebra::{Point3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    #[must_use]
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn size(&self) -> Vector3<f64> {
        (self.max - self.min).abs()
    }

    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        (self.max.z - self.min.z).abs()
    }

    #[must_use]
    pub fn mid_z(&self) -> f64 {
        0.5 * (self.min.z + self.max.z)
    }

    /// Extents sorted ascending: thickness, breadth, length.
    #[must_use]
    pub fn sorted_dimensions(&self) -> [f64; 3] {
        let size = self.size();
        let mut dims = [size.x, size.y, size.z];
        dims.sort_by(f64::total_cmp);
        dims
    }
}

fn widen(p: Point3<f32>) -> Point3<f64> {
    Point3::new(f64::from(p.x), f64::from(p.y), f64::from(p.z))
}

/// Meshes elements of one model and reports their bounding boxes.
///
/// The decoder caches entities across calls, so one evaluator should be
/// reused for every element of a model.
pub struct BoxEvaluator<'a> {
    decoder: EntityDecoder<'a>,
    router: GeometryRouter,
}

impl<'a> BoxEvaluator<'a> {
    /// Scales geometry by the model's length unit, the same factor applied
    /// to storey elevations.
    #[must_use]
    pub fn new(model: &'a IfcModel) -> Self {
        Self {
            decoder: EntityDecoder::new(&model.source),
            router: GeometryRouter::with_scale(model.length_scale),
        }
    }

    /// Evaluates the world-space bounding box of `element`, in metres.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryError`] when the element has no representation,
    /// the geometry library rejects it, or no body item produced a mesh.
    pub fn element_bbox(&mut self, element: &Element) -> Result<BoundingBox, GeometryError> {
        if element.representation_id.is_none() {
            return Err(GeometryError::NoRepresentation { id: element.id });
        }

        let evaluation = |message: String| GeometryError::Evaluation {
            id: element.id,
            message,
        };

        let id = u32::try_from(element.id).map_err(|e| evaluation(e.to_string()))?;
        let entity = self
            .decoder
            .decode_by_id(id)
            .map_err(|e| evaluation(e.to_string()))?;
        let mesh = self
            .router
            .process_element(&entity, &mut self.decoder)
            .map_err(|e| evaluation(e.to_string()))?;

        if mesh.is_empty() {
            return Err(GeometryError::Empty { id: element.id });
        }

        let (min, max) = mesh.bounds();
        log::trace!(element = element.id, triangles = mesh.triangle_count(); "Element meshed");
        Ok(BoundingBox::new(widen(min), widen(max)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_ifc_str;
    use pretty_assertions::assert_eq;

    const BEAM: &str = "ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('0YvctVUKr0kugbFTf53O9L',$,'P',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
#3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#10=IFCCARTESIANPOINT((0.,0.,3000.));
#11=IFCAXIS2PLACEMENT3D(#10,$,$);
#12=IFCLOCALPLACEMENT($,#11);
#20=IFCCARTESIANPOINT((0.,0.));
#21=IFCAXIS2PLACEMENT2D(#20,$);
#22=IFCRECTANGLEPROFILEDEF(.AREA.,$,#21,200.,400.);
#23=IFCDIRECTION((1.,0.,0.));
#24=IFCCARTESIANPOINT((0.,0.,0.));
#25=IFCDIRECTION((0.,1.,0.));
#26=IFCAXIS2PLACEMENT3D(#24,#23,#25);
#27=IFCEXTRUDEDAREASOLID(#22,#26,#28,5000.);
#28=IFCDIRECTION((0.,0.,1.));
#29=IFCSHAPEREPRESENTATION($,'Body','SweptSolid',(#27));
#30=IFCSHAPEREPRESENTATION($,'Axis','Curve2D',());
#31=IFCPRODUCTDEFINITIONSHAPE($,$,(#30,#29));
#40=IFCBEAM('1BeamGuid0000000000000',$,'B1',$,$,#12,#31,$,$);
#41=IFCBEAM('1BeamGuid0000000000001',$,'B2',$,$,#12,$,$,$);
ENDSEC;
END-ISO-10303-21;
";

    // 8 m extrusion cut back to the 3 m storey height by a half-space at z = 3
    const CLIPPED_WALL: &str = "ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('0YvctVUKr0kugbFTf53O9L',$,'P',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
#3=IFCSIUNIT(*,.LENGTHUNIT.,$,.METRE.);
#5=IFCCARTESIANPOINT((0.,0.));
#6=IFCAXIS2PLACEMENT2D(#5,$);
#7=IFCCARTESIANPOINT((0.,0.,0.));
#8=IFCAXIS2PLACEMENT3D(#7,$,$);
#9=IFCDIRECTION((0.,0.,1.));
#10=IFCBUILDINGSTOREY('1xS3BCk291UvhgP2dvNsgq',$,'Ground',$,$,$,$,$,.ELEMENT.,0.);
#11=IFCBUILDINGSTOREY('1xS3BCk291UvhgP2dvNsgp',$,'Level 1',$,$,$,$,$,.ELEMENT.,3.);
#21=IFCLOCALPLACEMENT($,#8);
#40=IFCRECTANGLEPROFILEDEF(.AREA.,$,#6,4.,0.2);
#41=IFCEXTRUDEDAREASOLID(#40,#8,#9,8.);
#42=IFCCARTESIANPOINT((0.,0.,3.));
#43=IFCAXIS2PLACEMENT3D(#42,#9,$);
#44=IFCPLANE(#43);
#45=IFCHALFSPACESOLID(#44,.T.);
#46=IFCBOOLEANCLIPPINGRESULT(.DIFFERENCE.,#41,#45);
#47=IFCSHAPEREPRESENTATION($,'Body','Clipping',(#46));
#48=IFCPRODUCTDEFINITIONSHAPE($,$,(#47));
#100=IFCWALL('2Wall00000000000000001',$,'W1',$,$,#21,#48,$,.STANDARD.);
#110=IFCRELCONTAINEDINSPATIALSTRUCTURE('3xS3BCk291UvhgP2dvNsg0',$,$,$,(#100),#10);
ENDSEC;
END-ISO-10303-21;
";

    const FACE_SET: &str = "ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('0YvctVUKr0kugbFTf53O9L',$,'P',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
#3=IFCSIUNIT(*,.LENGTHUNIT.,$,.METRE.);
#7=IFCCARTESIANPOINT((0.,0.,0.));
#8=IFCAXIS2PLACEMENT3D(#7,$,$);
#9=IFCLOCALPLACEMENT($,#8);
#20=IFCCARTESIANPOINTLIST3D(((0.,0.,0.),(2.,0.,0.),(2.,1.,0.),(0.,1.,0.5)));
#21=IFCTRIANGULATEDFACESET(#20,$,$,((1,2,3),(1,3,4)),$);
#22=IFCSHAPEREPRESENTATION($,'Body','Tessellation',(#21));
#23=IFCPRODUCTDEFINITIONSHAPE($,$,(#22));
#30=IFCSLAB('2Slab00000000000000001',$,'S1',$,$,#9,#23,$,.FLOOR.);
ENDSEC;
END-ISO-10303-21;
";

    fn close(a: Point3<f64>, b: Point3<f64>) -> bool {
        (a - b).norm() < 1e-4
    }

    fn first_bbox(source: &str) -> BoundingBox {
        let model = parse_ifc_str(source, "test.ifc".to_string()).unwrap();
        let mut evaluator = BoxEvaluator::new(&model);
        evaluator.element_bbox(&model.elements[0]).unwrap()
    }

    #[test]
    fn extruded_beam_along_x() {
        let bbox = first_bbox(BEAM);

        // Profile X maps to world Y, profile Y to world Z, extrusion to world X
        assert!(close(bbox.min, Point3::new(0.0, -0.1, 2.8)), "{bbox:?}");
        assert!(close(bbox.max, Point3::new(5.0, 0.1, 3.2)), "{bbox:?}");

        let [t, b, l] = bbox.sorted_dimensions();
        assert!((t - 0.2).abs() < 1e-4);
        assert!((b - 0.4).abs() < 1e-4);
        assert!((l - 5.0).abs() < 1e-4);
    }

    #[test]
    fn half_space_clipping_cuts_the_box() {
        let bbox = first_bbox(CLIPPED_WALL);
        assert!(close(bbox.min, Point3::new(-2.0, -0.1, 0.0)), "{bbox:?}");
        assert!(close(bbox.max, Point3::new(2.0, 0.1, 3.0)), "{bbox:?}");
    }

    #[test]
    fn clipped_wall_is_not_floating() {
        let model = parse_ifc_str(CLIPPED_WALL, "clipped.ifc".to_string()).unwrap();
        let report = crate::analysis::run_check(&model, None, &crate::config::AuditConfig::default());
        assert_eq!(report.elements_checked, 1);
        assert_eq!(report.issues.len(), 0, "{:?}", report.issues);
    }

    #[test]
    fn triangulated_face_set() {
        let bbox = first_bbox(FACE_SET);
        assert!(close(bbox.min, Point3::new(0.0, 0.0, 0.0)), "{bbox:?}");
        assert!(close(bbox.max, Point3::new(2.0, 1.0, 0.5)), "{bbox:?}");
    }

    #[test]
    fn evaluator_is_reused_across_elements() {
        let model = parse_ifc_str(BEAM, "beam.ifc".to_string()).unwrap();
        let mut evaluator = BoxEvaluator::new(&model);
        let first = evaluator.element_bbox(&model.elements[0]).unwrap();
        let second = evaluator.element_bbox(&model.elements[0]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_representation_is_reported() {
        let model = parse_ifc_str(BEAM, "beam.ifc".to_string()).unwrap();
        let mut evaluator = BoxEvaluator::new(&model);
        let result = evaluator.element_bbox(&model.elements[1]);
        assert!(matches!(result, Err(GeometryError::NoRepresentation { id: 41 })));
    }

    #[test]
    fn box_measures() {
        let bbox = BoundingBox::new(Point3::new(-2.0, 3.0, -1.0), Point3::new(1.0, 5.0, 4.0));
        assert_eq!(bbox.center(), Point3::new(-0.5, 4.0, 1.5));
        assert_eq!(bbox.height(), 5.0);
        assert_eq!(bbox.mid_z(), 1.5);
        assert_eq!(bbox.sorted_dimensions(), [2.0, 3.0, 5.0]);
    }
}
