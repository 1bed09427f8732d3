//! A leaf view with no behaviour of its own.

use std::any::Any;

use crate::widget::traits::Widget;

#[derive(Debug, Default, Clone, Copy)]
pub struct PlainView;

impl Widget for PlainView {
    fn widget_type(&self) -> &'static str {
        "View"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
