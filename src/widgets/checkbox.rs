use std::any::Any;

use crate::event::input::Key;
use crate::geometry::Size;
use crate::view::signal::{Payload, SignalKind};
use crate::widget::traits::{Emission, Widget};

/// A two-state toggle. Its checked state is the `selected` pseudo-state.
#[derive(Debug, Clone)]
pub struct Checkbox {
    checked: bool,
    check_on_click: bool,
}

impl Default for Checkbox {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Checkbox {
    pub fn new(checked: bool) -> Self {
        Self { checked, check_on_click: true }
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// Change the state; emits `Checked` only when it actually changes.
    pub fn set_checked(&mut self, checked: bool) -> Vec<Emission> {
        if self.checked == checked {
            return Vec::new();
        }
        self.checked = checked;
        vec![(SignalKind::Checked, Payload::Bool(checked))]
    }

    /// Stop clicks from toggling; the state then changes only via `set_checked`.
    pub fn disable_checking_on_click(&mut self) {
        self.check_on_click = false;
    }
}

impl Widget for Checkbox {
    fn widget_type(&self) -> &'static str {
        "Checkbox"
    }

    fn can_focus(&self) -> bool {
        true
    }

    fn content_size(&self) -> Size {
        Size::new(16, 16)
    }

    fn is_selected(&self) -> bool {
        self.checked
    }

    fn on_click(&mut self) -> Vec<Emission> {
        if self.check_on_click {
            self.set_checked(!self.checked)
        } else {
            Vec::new()
        }
    }

    fn on_key(&mut self, key: Key) -> Vec<Emission> {
        match key {
            Key::Char(' ') => self.on_click(),
            _ => Vec::new(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_toggles_and_reports() {
        let mut cb = Checkbox::default();
        let out = cb.on_click();
        assert!(cb.is_checked());
        assert!(matches!(out.as_slice(), [(SignalKind::Checked, Payload::Bool(true))]));
        assert!(cb.is_selected());
    }

    #[test]
    fn unchanged_state_emits_nothing() {
        let mut cb = Checkbox::new(true);
        assert!(cb.set_checked(true).is_empty());
    }

    #[test]
    fn disabled_checking_ignores_clicks() {
        let mut cb = Checkbox::new(false);
        cb.disable_checking_on_click();
        assert!(cb.on_click().is_empty());
        assert!(!cb.is_checked());
        assert_eq!(cb.set_checked(true).len(), 1);
    }
}
