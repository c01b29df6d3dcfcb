use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Structural role of an element, derived from its IFC entity class.
///
/// Subclasses fold into their parent the way an IFC toolkit's `by_type`
/// query does: `IfcBeamStandardCase` is a beam, `IfcWallStandardCase` is a
/// wall, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ElementKind {
    Beam,
    Slab,
    Column,
    Wall,
    Footing,
}

impl ElementKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Beam => "Beam",
            ElementKind::Slab => "Slab",
            ElementKind::Column => "Column",
            ElementKind::Wall => "Wall",
            ElementKind::Footing => "Footing",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of an `IfcPropertySingleValue`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Real(f64),
    Integer(i64),
    Boolean(bool),
    Empty,
}

impl PropertyValue {
    /// Interprets the value as a flag. Text values such as `"TRUE"` or `"Yes"`
    /// are accepted because some exporters write booleans as labels.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            PropertyValue::Integer(i) => Some(*i != 0),
            PropertyValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "t" | "1" => Some(true),
                "false" | "no" | "f" | "0" => Some(false),
                _ => None,
            },
            PropertyValue::Real(_) | PropertyValue::Empty => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Text(s) => f.write_str(s),
            PropertyValue::Real(v) => write!(f, "{v:.2}"),
            PropertyValue::Integer(i) => write!(f, "{i}"),
            PropertyValue::Boolean(b) => f.write_str(if *b { "Yes" } else { "No" }),
            PropertyValue::Empty => f.write_str("-"),
        }
    }
}

pub type PropertySets = BTreeMap<String, BTreeMap<String, PropertyValue>>;

#[derive(Debug, Clone, Serialize)]
pub struct Element {
    pub id: u64,
    pub global_id: String,
    /// IFC class as written in the schema, e.g. `IfcWallStandardCase`.
    pub ifc_class: String,
    pub kind: ElementKind,
    pub name: Option<String>,
    pub object_type: Option<String>,
    pub tag: Option<String>,
    pub type_name: Option<String>,
    /// Spatial structure element (storey, space, ...) the element is contained in.
    pub container_id: Option<u64>,
    #[serde(skip)]
    pub representation_id: Option<u64>,
    pub property_sets: PropertySets,
}

impl Element {
    #[must_use]
    pub fn property(&self, pset: &str, name: &str) -> Option<&PropertyValue> {
        self.property_sets.get(pset).and_then(|props| props.get(name))
    }

    /// First property called `name` in any property set, in pset name order.
    #[must_use]
    pub fn find_property(&self, name: &str) -> Option<&PropertyValue> {
        self.property_sets.values().find_map(|props| props.get(name))
    }

    /// `LoadBearing` from the common wall/beam/column/slab property set,
    /// falling back to any property set carrying that name.
    #[must_use]
    pub fn load_bearing(&self) -> Option<bool> {
        let common = format!("Pset_{}Common", self.kind.as_str());
        self.property(&common, "LoadBearing")
            .or_else(|| self.find_property("LoadBearing"))
            .and_then(PropertyValue::as_bool)
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}
