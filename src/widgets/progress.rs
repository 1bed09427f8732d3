use std::any::Any;

use crate::geometry::Size;
use crate::widget::traits::Widget;

/// A progress bar showing a value in `0.0..=1.0`, drawn as a line or a
/// circle.
#[derive(Debug, Clone, Default)]
pub struct Progressbar {
    value: f32,
    circle: bool,
}

impl Progressbar {
    pub fn new(value: f32) -> Self {
        Self { value: value.clamp(0.0, 1.0), circle: false }
    }

    pub fn circle(value: f32) -> Self {
        Self { circle: true, ..Self::new(value) }
    }

    pub fn is_circle(&self) -> bool {
        self.circle
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn set_value(&mut self, value: f32) {
        self.value = value.clamp(0.0, 1.0);
    }
}

impl Widget for Progressbar {
    fn widget_type(&self) -> &'static str {
        if self.circle {
            "CircleProgressbar"
        } else {
            "Progressbar"
        }
    }

    fn content_size(&self) -> Size {
        if self.circle {
            Size::new(32, 32)
        } else {
            Size::new(100, 8)
        }
    }

    fn describe(&self) -> String {
        format!("{} {:.2}", self.widget_type(), self.value)
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
    fn value_is_clamped() {
        let mut p = Progressbar::new(1.5);
        assert_eq!(p.value(), 1.0);
        p.set_value(-2.0);
        assert_eq!(p.value(), 0.0);
        p.set_value(0.25);
        assert_eq!(p.describe(), "Progressbar 0.25");
    }

    #[test]
    fn circle_variant_reports_its_own_type() {
        let p = Progressbar::circle(0.5);
        assert!(p.is_circle());
        assert_eq!(p.describe(), "CircleProgressbar 0.50");
        assert_eq!(p.content_size(), Size::new(32, 32));
    }
}
