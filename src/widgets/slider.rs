use std::any::Any;

use crate::event::input::Key;
use crate::geometry::Size;
use crate::view::signal::{Payload, SignalKind};
use crate::widget::traits::{Emission, Widget};

const KEY_STEP: f32 = 0.1;

/// A horizontal slider over `0.0..=1.0`. Arrow keys move it by a tenth.
#[derive(Debug, Clone, Default)]
pub struct Slider {
    value: f32,
}

impl Slider {
    pub fn new(value: f32) -> Self {
        Self { value: value.clamp(0.0, 1.0) }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Move the slider; emits `ValueChanging` then `ValueChanged` when the
    /// clamped value differs.
    pub fn set_value(&mut self, value: f32) -> Vec<Emission> {
        let value = value.clamp(0.0, 1.0);
        if (value - self.value).abs() < f32::EPSILON {
            return Vec::new();
        }
        self.value = value;
        vec![
            (SignalKind::ValueChanging, Payload::Number(f64::from(value))),
            (SignalKind::ValueChanged, Payload::Number(f64::from(value))),
        ]
    }
}

impl Widget for Slider {
    fn widget_type(&self) -> &'static str {
        "Slider"
    }

    fn can_focus(&self) -> bool {
        true
    }

    fn content_size(&self) -> Size {
        Size::new(100, 16)
    }

    fn on_key(&mut self, key: Key) -> Vec<Emission> {
        match key {
            Key::Left => self.set_value(self.value - KEY_STEP),
            Key::Right => self.set_value(self.value + KEY_STEP),
            Key::Home => self.set_value(0.0),
            Key::End => self.set_value(1.0),
            _ => Vec::new(),
        }
    }

    fn describe(&self) -> String {
        format!("Slider {:.2}", self.value)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
