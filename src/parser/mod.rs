pub mod ifc;
pub mod step;

pub use crate::error::ParseError;
pub use ifc::{parse_ifc_file, parse_ifc_str};
pub use step::{StepEntity, StepFile, StepValue};
