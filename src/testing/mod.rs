//! Headless testing framework: Pilot, snapshot helpers.
//!
//! Use the [`Pilot`] to drive a [`ScriptEngine`](crate::script::ScriptEngine)
//! without a real terminal. Use [`render_tree`] to capture a view tree as
//! plain text for snapshot-style assertions.

pub mod pilot;
pub mod snapshot;

pub use pilot::Pilot;
pub use snapshot::{render_surface, render_tree};
