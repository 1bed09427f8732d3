use std::any::Any;

use crate::geometry::Size;
use crate::style::metric::Metric;
use crate::widget::traits::Widget;

/// Empty space. A flexible spacer expands; a fixed one occupies `extent` in
/// both directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spacer {
    extent: Option<Metric>,
}

impl Spacer {
    pub fn flexible() -> Self {
        Self { extent: None }
    }

    pub fn fixed(extent: Metric) -> Self {
        Self { extent: Some(extent) }
    }

    pub fn is_flexible(&self) -> bool {
        self.extent.is_none()
    }
}

impl Widget for Spacer {
    fn widget_type(&self) -> &'static str {
        "Spacer"
    }

    fn consumes_click(&self) -> bool {
        false
    }

    fn content_size(&self) -> Size {
        match self.extent {
            Some(m) => {
                let px = m.0.round() as i32;
                Size::new(px, px)
            }
            None => Size::ZERO,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
