//! Cascade precedence of a matched declaration.
//!
//! ```text
//! (is_custom, name_count, state_count, sheet_depth, rule_order)
//! ```
//!
//! Fields are ordered so that the derived `Ord` gives the cascade order:
//! - A view's own flat declaration list beats every stylesheet rule
//! - More style names in the selector beat fewer
//! - More pseudo-states beat fewer
//! - A stylesheet attached closer to the view (deeper) beats an outer one
//! - Later rules in the same stylesheet win as the final tie-breaker

use super::model::Selector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Specificity {
    /// 1 for the view's custom style, 0 for stylesheet rules.
    pub is_custom: u8,
    pub name_count: u16,
    pub state_count: u16,
    /// Depth in the view tree of the view that owns the stylesheet.
    pub sheet_depth: u16,
    pub rule_order: u32,
}

impl Specificity {
    pub fn from_selector(selector: &Selector, sheet_depth: u16, rule_order: u32) -> Self {
        let name_count = selector.steps.len() as u16;
        let state_count = selector.steps.iter().filter(|s| s.state.is_some()).count() as u16;
        Self { is_custom: 0, name_count, state_count, sheet_depth, rule_order }
    }

    /// Precedence of a view's custom style.
    pub fn custom() -> Self {
        Self { is_custom: 1, ..Self::default() }
    }
}
