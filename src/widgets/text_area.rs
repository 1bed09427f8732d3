//! Multi-line text input.
//!
//! Editing works like [`Input`]; a line break is inserted on `Enter` or a
//! typed newline, and both also report `EnterPressed` and
//! `ActionButtonPressed` after the text change.

use std::any::Any;

use crate::event::input::Key;
use crate::geometry::Size;
use crate::view::signal::{Payload, SignalKind};
use crate::widget::traits::{text_extent, Emission, Widget};
use crate::widgets::input::{Input, TextInputAction};

#[derive(Debug, Clone, Default)]
pub struct TextArea {
    editor: Input,
}

impl TextArea {
    pub fn new(value: impl Into<String>) -> Self {
        Self { editor: Input::new(value) }
    }

    pub fn value(&self) -> &str {
        self.editor.value()
    }

    /// Replace the value. Emits nothing.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.editor.set_value(value);
    }

    pub fn select_all(&mut self) {
        self.editor.select_all();
    }

    pub fn input_action(&self) -> TextInputAction {
        self.editor.input_action()
    }

    pub fn set_input_action(&mut self, action: TextInputAction) {
        self.editor.set_input_action(action);
    }

    pub fn line_count(&self) -> usize {
        self.editor.value().split('\n').count()
    }

    fn line_break(&mut self) -> Vec<Emission> {
        let mut out = self.editor.insert("\n");
        let value = self.editor.value().to_string();
        out.push((SignalKind::EnterPressed, Payload::Text(value.clone())));
        out.push((SignalKind::ActionButtonPressed, Payload::Text(value)));
        out
    }
}

impl Widget for TextArea {
    fn widget_type(&self) -> &'static str {
        "TextArea"
    }

    fn can_focus(&self) -> bool {
        true
    }

    fn content_size(&self) -> Size {
        let widest = self.editor.value().split('\n').map(|line| text_extent(line).width).max().unwrap_or(0);
        Size::new(widest.max(80), 16 * self.line_count() as i32)
    }

    fn text(&self) -> Option<String> {
        Some(self.editor.value().to_string())
    }

    fn on_key(&mut self, key: Key) -> Vec<Emission> {
        match key {
            Key::Enter => self.line_break(),
            other => self.editor.on_key(other),
        }
    }

    fn on_char(&mut self, c: char) -> Vec<Emission> {
        match c {
            '\n' | '\r' => self.line_break(),
            other => self.editor.on_char(other),
        }
    }

    fn proposed_text(&self, c: char) -> Option<String> {
        match c {
            '\n' | '\r' => Some(self.editor.insertion("\n").0),
            other => self.editor.proposed_text(other),
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

    fn kinds(out: &[Emission]) -> Vec<SignalKind> {
        out.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn enter_breaks_the_line_then_reports() {
        let mut area = TextArea::new("one");
        let out = area.on_key(Key::Enter);
        assert_eq!(
            kinds(&out),
            vec![
                SignalKind::TextChanging,
                SignalKind::TextChanged,
                SignalKind::EnterPressed,
                SignalKind::ActionButtonPressed
            ]
        );
        area.on_char('t');
        assert_eq!(area.value(), "one\nt");
        assert_eq!(area.line_count(), 2);
        assert_eq!(area.content_size(), Size::new(80, 32));
    }

    #[test]
    fn typed_newline_counts_as_enter() {
        let mut area = TextArea::default();
        assert!(kinds(&area.on_char('\r')).contains(&SignalKind::EnterPressed));
        assert_eq!(area.value(), "\n");
        assert_eq!(area.proposed_text('x').as_deref(), Some("\nx"));
    }
}
