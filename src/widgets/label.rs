use std::any::Any;

use crate::geometry::Size;
use crate::widget::traits::{text_extent, Widget};

/// Static text.
#[derive(Debug, Clone, Default)]
pub struct Label {
    text: String,
}

impl Label {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl Widget for Label {
    fn widget_type(&self) -> &'static str {
        "Label"
    }

    fn content_size(&self) -> Size {
        text_extent(&self.text)
    }

    fn text(&self) -> Option<String> {
        Some(self.text.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
