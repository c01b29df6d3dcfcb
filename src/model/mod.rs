pub mod element;
pub mod project;

pub use element::{Element, ElementKind, PropertySets, PropertyValue};
pub use project::{IfcModel, SpatialKind, SpatialNode, Storey};
