//! Input widget: a focusable single-line text field.
//!
//! Editing keys and typed characters change the value and report it through
//! `TextChanging` (every edit) followed by `TextChanged`. `Enter` reports
//! `EnterPressed` and then `ActionButtonPressed` with the current value.
//! Typing over a selection replaces it.

use std::any::Any;
use std::ops::Range;

use crate::event::input::Key;
use crate::geometry::Size;
use crate::view::signal::{Payload, SignalKind};
use crate::widget::traits::{text_extent, Emission, Widget};

/// Kind of content the field expects; used to pick a touchscreen keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextInputType {
    #[default]
    Text,
    Number,
    Email,
    Password,
    Url,
    Phone,
}

/// Action offered by the touchscreen keyboard's confirm key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextInputAction {
    #[default]
    Done,
    Go,
    Next,
    Search,
    Send,
}

/// Shown in place of each character in password mode.
pub const PASSWORD_MASK: char = '•';

/// A text input with a byte-offset cursor and an optional selection running
/// from `anchor` to the cursor.
///
/// All cursor operations are char-boundary safe.
#[derive(Debug, Clone, Default)]
pub struct Input {
    value: String,
    cursor: usize,
    anchor: Option<usize>,
    password: bool,
    input_type: TextInputType,
    input_action: TextInputAction,
}

impl Input {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.len();
        Self { value, cursor, ..Default::default() }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the value, moving the cursor to the end. Emits nothing.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.len();
        self.anchor = None;
    }

    pub fn is_password_mode(&self) -> bool {
        self.password
    }

    /// Mask the shown text. The value itself is unchanged.
    pub fn set_password_mode(&mut self, password: bool) {
        self.password = password;
    }

    pub fn select_all(&mut self) {
        self.anchor = Some(0);
        self.cursor = self.value.len();
    }

    /// Selected byte range, `None` when nothing is selected.
    pub fn selection(&self) -> Option<Range<usize>> {
        let anchor = self.anchor?;
        let range = anchor.min(self.cursor)..anchor.max(self.cursor);
        (!range.is_empty()).then_some(range)
    }

    pub fn selected_text(&self) -> &str {
        self.selection().map_or("", |r| &self.value[r])
    }

    /// Value and cursor after inserting `text` at the cursor, replacing the
    /// selection.
    pub(crate) fn insertion(&self, text: &str) -> (String, usize) {
        let range = self.selection().unwrap_or(self.cursor..self.cursor);
        let mut value = self.value.clone();
        value.replace_range(range.clone(), text);
        (value, range.start + text.len())
    }

    /// Insert `text` at the cursor, replacing the selection.
    pub(crate) fn insert(&mut self, text: &str) -> Vec<Emission> {
        let (value, cursor) = self.insertion(text);
        self.value = value;
        self.cursor = cursor;
        self.anchor = None;
        self.changed()
    }

    fn delete_selection(&mut self) -> Option<Vec<Emission>> {
        let range = self.selection()?;
        self.value.drain(range.clone());
        self.cursor = range.start;
        self.anchor = None;
        Some(self.changed())
    }

    /// Move the cursor, dropping the selection.
    fn move_to(&mut self, cursor: usize) -> Vec<Emission> {
        self.cursor = cursor;
        self.anchor = None;
        Vec::new()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn input_type(&self) -> TextInputType {
        self.input_type
    }

    pub fn set_input_type(&mut self, input_type: TextInputType) {
        self.input_type = input_type;
    }

    pub fn input_action(&self) -> TextInputAction {
        self.input_action
    }

    pub fn set_input_action(&mut self, action: TextInputAction) {
        self.input_action = action;
    }

    fn prev_boundary(&self) -> usize {
        let mut pos = self.cursor.saturating_sub(1);
        while pos > 0 && !self.value.is_char_boundary(pos) {
            pos -= 1;
        }
        pos
    }

    fn next_boundary(&self) -> usize {
        let mut pos = self.cursor + 1;
        while pos < self.value.len() && !self.value.is_char_boundary(pos) {
            pos += 1;
        }
        pos.min(self.value.len())
    }

    fn changed(&self) -> Vec<Emission> {
        vec![
            (SignalKind::TextChanging, Payload::Text(self.value.clone())),
            (SignalKind::TextChanged, Payload::Text(self.value.clone())),
        ]
    }
}

impl Widget for Input {
    fn widget_type(&self) -> &'static str {
        "Input"
    }

    fn can_focus(&self) -> bool {
        true
    }

    fn content_size(&self) -> Size {
        let text = text_extent(&self.value);
        Size::new(text.width.max(80), text.height)
    }

    fn text(&self) -> Option<String> {
        if self.password {
            return Some(std::iter::repeat_n(PASSWORD_MASK, self.value.chars().count()).collect());
        }
        Some(self.value.clone())
    }

    fn on_key(&mut self, key: Key) -> Vec<Emission> {
        if matches!(key, Key::Backspace | Key::Delete) {
            if let Some(out) = self.delete_selection() {
                return out;
            }
        }
        match key {
            Key::Enter => vec![
                (SignalKind::EnterPressed, Payload::Text(self.value.clone())),
                (SignalKind::ActionButtonPressed, Payload::Text(self.value.clone())),
            ],
            Key::Backspace if self.cursor > 0 => {
                let prev = self.prev_boundary();
                self.value.drain(prev..self.cursor);
                self.cursor = prev;
                self.anchor = None;
                self.changed()
            }
            Key::Delete if self.cursor < self.value.len() => {
                let next = self.next_boundary();
                self.value.drain(self.cursor..next);
                self.anchor = None;
                self.changed()
            }
            Key::Left if self.cursor > 0 => self.move_to(self.prev_boundary()),
            Key::Right if self.cursor < self.value.len() => self.move_to(self.next_boundary()),
            Key::Home => self.move_to(0),
            Key::End => self.move_to(self.value.len()),
            _ => Vec::new(),
        }
    }

    fn on_char(&mut self, c: char) -> Vec<Emission> {
        if c.is_control() {
            return Vec::new();
        }
        self.insert(c.encode_utf8(&mut [0; 4]))
    }

    fn proposed_text(&self, c: char) -> Option<String> {
        (!c.is_control()).then(|| self.insertion(c.encode_utf8(&mut [0; 4])).0)
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

    fn text_of(emissions: &[Emission]) -> Vec<(SignalKind, String)> {
        emissions
            .iter()
            .map(|(k, p)| match p {
                Payload::Text(t) => (*k, t.clone()),
                _ => (*k, String::new()),
            })
            .collect()
    }

    #[test]
    fn typing_inserts_at_cursor() {
        let mut input = Input::new("ac");
        input.on_key(Key::Left);
        let out = input.on_char('b');
        assert_eq!(input.value(), "abc");
        assert_eq!(
            text_of(&out),
            vec![
                (SignalKind::TextChanging, "abc".to_string()),
                (SignalKind::TextChanged, "abc".to_string())
            ]
        );
    }

    #[test]
    fn backspace_is_char_boundary_safe() {
        let mut input = Input::new("héllo");
        input.on_key(Key::Home);
        input.on_key(Key::Right);
        input.on_key(Key::Right);
        input.on_key(Key::Backspace);
        assert_eq!(input.value(), "hllo");
        assert_eq!(input.cursor(), 1);
    }

    #[test]
    fn delete_at_end_is_noop() {
        let mut input = Input::new("x");
        assert!(input.on_key(Key::Delete).is_empty());
        assert_eq!(input.value(), "x");
    }

    #[test]
    fn enter_reports_value() {
        let mut input = Input::new("go");
        assert_eq!(
            text_of(&input.on_key(Key::Enter)),
            vec![(SignalKind::EnterPressed, "go".to_string()), (SignalKind::ActionButtonPressed, "go".to_string())]
        );
    }

    #[test]
    fn typing_replaces_selection() {
        let mut input = Input::new("old text");
        input.select_all();
        assert_eq!(input.selected_text(), "old text");
        assert_eq!(input.proposed_text('n').as_deref(), Some("n"));
        input.on_char('n');
        assert_eq!(input.value(), "n");
        assert!(input.selection().is_none());

        input.set_value("abc");
        input.select_all();
        input.on_key(Key::Backspace);
        assert_eq!(input.value(), "");
    }

    #[test]
    fn password_mode_masks_shown_text() {
        let mut input = Input::new("pé1");
        input.set_password_mode(true);
        assert_eq!(input.text().as_deref(), Some("•••"));
        assert_eq!(input.value(), "pé1");
    }

    #[test]
    fn set_value_moves_cursor_to_end() {
        let mut input = Input::default();
        input.set_value("four");
        assert_eq!(input.cursor(), 4);
        input.set_input_type(TextInputType::Password);
        assert_eq!(input.input_type(), TextInputType::Password);
    }
}
