//! # IFC Audit
//!
//! Structural audits of IFC building models.
//!
//! ## Features
//!
//! - Parse IFC files (IFC2x3 and IFC4 schemas)
//! - Count structural walls per storey, excluding footings
//! - Flag beams, slabs, columns and walls whose proportions suggest a
//!   different class
//! - Check that elements sit on the storey they are assigned to
//! - Export findings as a BCF 3.0 archive
//!
//! ## Example
//!
//! ```no_run
//! use ifc_audit::analysis::count_walls;
//! use ifc_audit::config::WallConfig;
//! use ifc_audit::parser::parse_ifc_file;
//!
//! let model = parse_ifc_file("25-08-D-STR.ifc").expect("Failed to parse");
//! let tally = count_walls(&model, &WallConfig::default());
//! for row in &tally.rows {
//!     println!("{}: {} walls", row.storey, row.walls);
//! }
//! ```

pub mod analysis;
pub mod bcf;
pub mod config;
pub mod console;
pub mod discovery;
pub mod error;
pub mod export;
pub mod geometry;
pub mod guid;
pub mod model;
pub mod parser;
pub mod ui;
