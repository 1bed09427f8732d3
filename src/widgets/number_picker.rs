//! Integer field with a range.
//!
//! Typing edits the text; every edit that parses reports `ValueChanging`.
//! The value is committed with `ValueChanged` when focus leaves or `Enter` is
//! pressed. `Up`/`Down` step by one and commit at once.

use std::any::Any;

use crate::event::input::Key;
use crate::geometry::Size;
use crate::view::signal::{Payload, SignalKind};
use crate::widget::traits::{text_extent, Emission, Widget};

pub const DEFAULT_MIN: i64 = 0;
pub const DEFAULT_MAX: i64 = 100;

#[derive(Debug, Clone)]
pub struct NumberPicker {
    value: i64,
    min: i64,
    max: i64,
    text: String,
    committed: i64,
}

impl Default for NumberPicker {
    fn default() -> Self {
        Self::new(DEFAULT_MIN)
    }
}

impl NumberPicker {
    pub fn new(value: i64) -> Self {
        let value = value.clamp(DEFAULT_MIN, DEFAULT_MAX);
        Self { value, min: DEFAULT_MIN, max: DEFAULT_MAX, text: value.to_string(), committed: value }
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    /// Current text, which may hold an edit not yet committed.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    /// Replace the value, clamped to the range. Emits nothing.
    pub fn set_value(&mut self, value: i64) {
        self.value = value.clamp(self.min, self.max);
        self.text = self.value.to_string();
        self.committed = self.value;
    }

    pub fn set_min(&mut self, min: i64) {
        self.min = min;
        self.max = self.max.max(min);
        self.set_value(self.value);
    }

    pub fn set_max(&mut self, max: i64) {
        self.max = max;
        self.min = self.min.min(max);
        self.set_value(self.value);
    }

    fn edited(&mut self, text: String) -> Vec<Emission> {
        self.text = text;
        match self.text.parse::<i64>() {
            Ok(parsed) if parsed.clamp(self.min, self.max) != self.value => {
                self.value = parsed.clamp(self.min, self.max);
                vec![(SignalKind::ValueChanging, Payload::Number(self.value as f64))]
            }
            _ => Vec::new(),
        }
    }

    /// Normalize the text and report the value if it moved since the last
    /// commit.
    fn commit(&mut self) -> Vec<Emission> {
        self.text = self.value.to_string();
        if self.value == self.committed {
            return Vec::new();
        }
        self.committed = self.value;
        vec![(SignalKind::ValueChanged, Payload::Number(self.value as f64))]
    }

    fn step(&mut self, delta: i64) -> Vec<Emission> {
        let next = self.value.saturating_add(delta).clamp(self.min, self.max);
        if next == self.value {
            return Vec::new();
        }
        self.value = next;
        let mut out = vec![(SignalKind::ValueChanging, Payload::Number(next as f64))];
        out.extend(self.commit());
        out
    }
}

impl Widget for NumberPicker {
    fn widget_type(&self) -> &'static str {
        "NumberPicker"
    }

    fn can_focus(&self) -> bool {
        true
    }

    fn content_size(&self) -> Size {
        let text = text_extent(&self.text);
        Size::new(text.width.max(40) + 16, text.height)
    }

    fn text(&self) -> Option<String> {
        Some(self.text.clone())
    }

    fn on_key(&mut self, key: Key) -> Vec<Emission> {
        match key {
            Key::Up => self.step(1),
            Key::Down => self.step(-1),
            Key::Enter => self.commit(),
            Key::Backspace if !self.text.is_empty() => {
                let mut text = self.text.clone();
                text.pop();
                self.edited(text)
            }
            _ => Vec::new(),
        }
    }

    fn on_char(&mut self, c: char) -> Vec<Emission> {
        match self.proposed_text(c) {
            Some(text) => self.edited(text),
            None => Vec::new(),
        }
    }

    fn proposed_text(&self, c: char) -> Option<String> {
        let sign = c == '-' && self.text.is_empty() && self.min < 0;
        (c.is_ascii_digit() || sign).then(|| format!("{}{c}", self.text))
    }

    fn on_blur(&mut self) -> Vec<Emission> {
        self.commit()
    }

    fn describe(&self) -> String {
        format!("NumberPicker {} [{}..{}]", self.value, self.min, self.max)
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

    fn kinds(out: &[Emission]) -> Vec<SignalKind> {
        out.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn typing_reports_changing_then_blur_commits() {
        let mut p = NumberPicker::new(0);
        p.on_key(Key::Backspace);
        assert_eq!(kinds(&p.on_char('4')), vec![SignalKind::ValueChanging]);
        assert_eq!(kinds(&p.on_char('2')), vec![SignalKind::ValueChanging]);
        assert_eq!(p.value(), 42);
        assert!(p.on_char('x').is_empty());
        assert_eq!(kinds(&p.on_blur()), vec![SignalKind::ValueChanged]);
        assert!(p.on_blur().is_empty());
    }

    #[test]
    fn typed_value_is_clamped() {
        let mut p = NumberPicker::new(5);
        p.set_max(10);
        p.on_char('9');
        assert_eq!(p.value(), 10);
        p.on_blur();
        assert_eq!(p.text(), "10");
    }

    #[test]
    fn arrows_step_and_commit() {
        let mut p = NumberPicker::new(99);
        assert_eq!(kinds(&p.on_key(Key::Up)), vec![SignalKind::ValueChanging, SignalKind::ValueChanged]);
        assert!(p.on_key(Key::Up).is_empty());
        assert_eq!(p.value(), 100);
    }

    #[test]
    fn range_changes_keep_value_inside() {
        let mut p = NumberPicker::new(50);
        p.set_min(60);
        assert_eq!(p.value(), 60);
        p.set_max(20);
        assert_eq!((p.min(), p.max(), p.value()), (20, 20, 20));
        assert_eq!(p.describe(), "NumberPicker 20 [20..20]");
    }
}
