//! Terminal picker for choosing a model group to check.

pub mod app;
pub mod dashboard;

pub use app::App;
