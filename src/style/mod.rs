//! Native style primitives and the cascade over the view tree.
//!
//! Scripts build [`Property`] values through the rule namespace and resolve
//! declaration tables into [`Rule`]s; this module owns their types and decides
//! which declarations win for a given view.

pub mod cascade;
pub mod color;
pub mod computed;
pub mod metric;
pub mod model;
pub mod property;
pub mod specificity;

pub use cascade::{compute_style, matches_selector, StyleNode};
pub use color::Color;
pub use computed::ComputedStyle;
pub use metric::{EdgeBox, Metric, Unset};
pub use model::{PseudoState, Rule, Selector, SelectorStep, Stylesheet};
pub use property::{Property, PropertyKind, Visibility};
pub use specificity::Specificity;
