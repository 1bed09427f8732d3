//! Widget behaviour trait.

pub mod traits;

pub use traits::{text_extent, Emission, LayoutKind, Widget};
