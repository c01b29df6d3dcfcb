use super::{Element, ElementKind};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct Storey {
    pub id: u64,
    pub global_id: String,
    pub name: String,
    /// Elevation in metres.
    pub elevation: f64,
}

/// Kind of spatial structure element an element can be contained in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpatialKind {
    Site,
    Building,
    Storey,
    Space,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpatialNode {
    pub id: u64,
    pub kind: SpatialKind,
    /// Parent via aggregation or containment.
    pub parent_id: Option<u64>,
}

#[derive(Debug)]
pub struct IfcModel {
    pub name: String,
    pub schema: String,
    pub file_path: String,
    pub project_global_id: Option<String>,
    /// Multiplier converting file length units to metres.
    pub length_scale: f64,
    /// Structural elements, in STEP id order.
    pub elements: Vec<Element>,
    /// Storeys sorted by ascending elevation.
    pub storeys: Vec<Storey>,
    pub spatial: BTreeMap<u64, SpatialNode>,
    /// STEP text the model was read from, handed to the geometry library.
    pub source: String,
}

impl IfcModel {
    #[must_use]
    pub fn new(name: String, schema: String, source: String, file_path: String) -> Self {
        Self {
            name,
            schema,
            file_path,
            project_global_id: None,
            length_scale: 1.0,
            elements: Vec::new(),
            storeys: Vec::new(),
            spatial: BTreeMap::new(),
            source,
        }
    }

    pub fn elements_of(&self, kind: ElementKind) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(move |e| e.kind == kind)
    }

    #[must_use]
    pub fn storey(&self, id: u64) -> Option<&Storey> {
        self.storeys.iter().find(|s| s.id == id)
    }
}
