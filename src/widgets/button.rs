//! Button widget: a focusable, clickable text label.

use std::any::Any;

use crate::event::input::Key;
use crate::geometry::Size;
use crate::view::signal::{Payload, SignalKind};
use crate::widget::traits::{text_extent, Emission, Widget};

/// An interactive button.
///
/// Clicks arrive through the window; `Enter` or space while focused emit
/// `Clicked` as well.
#[derive(Debug, Clone, Default)]
pub struct Button {
    text: String,
}

impl Button {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn label(&self) -> &str {
        &self.text
    }

    pub fn set_label(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl Widget for Button {
    fn widget_type(&self) -> &'static str {
        "Button"
    }

    fn can_focus(&self) -> bool {
        true
    }

    fn content_size(&self) -> Size {
        text_extent(&self.text)
    }

    fn text(&self) -> Option<String> {
        Some(self.text.clone())
    }

    fn on_key(&mut self, key: Key) -> Vec<Emission> {
        match key {
            Key::Enter | Key::Char(' ') => vec![(SignalKind::Clicked, Payload::None)],
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
