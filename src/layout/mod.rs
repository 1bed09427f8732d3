//! Layout: taffy integration and view style resolution.

pub mod engine;
pub mod resolve;

pub use engine::{emit_changes, GeometryChange, LayoutEngine};
