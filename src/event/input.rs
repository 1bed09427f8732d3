//! Input event types.
//!
//! Defines [`Key`], [`PointerButton`], [`PointerEvent`] and [`ScrollEvent`].
//! Crossterm key events convert via `From` so hosts reading a terminal can
//! feed the window without touching crossterm types further in.

use crate::geometry::Offset;

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// Keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Tab,
    BackTab,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
}

impl Key {
    /// Name handed to scripts: the character itself for printable keys,
    /// a lowercase word otherwise.
    pub fn name(&self) -> String {
        match self {
            Key::Char(c) => c.to_string(),
            Key::Enter => "enter".into(),
            Key::Escape => "escape".into(),
            Key::Tab => "tab".into(),
            Key::BackTab => "backtab".into(),
            Key::Backspace => "backspace".into(),
            Key::Delete => "delete".into(),
            Key::Left => "left".into(),
            Key::Right => "right".into(),
            Key::Up => "up".into(),
            Key::Down => "down".into(),
            Key::Home => "home".into(),
            Key::End => "end".into(),
            Key::PageUp => "pageup".into(),
            Key::PageDown => "pagedown".into(),
            Key::F(n) => format!("f{n}"),
        }
    }

    /// Inverse of [`Key::name`].
    pub fn from_name(name: &str) -> Option<Key> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Some(Key::Char(c));
        }
        let key = match name {
            "enter" => Key::Enter,
            "escape" => Key::Escape,
            "tab" => Key::Tab,
            "backtab" => Key::BackTab,
            "backspace" => Key::Backspace,
            "delete" => Key::Delete,
            "left" => Key::Left,
            "right" => Key::Right,
            "up" => Key::Up,
            "down" => Key::Down,
            "home" => Key::Home,
            "end" => Key::End,
            "pageup" => Key::PageUp,
            "pagedown" => Key::PageDown,
            other => {
                let n = other.strip_prefix('f')?.parse::<u8>().ok()?;
                Key::F(n)
            }
        };
        Some(key)
    }
}

// ---------------------------------------------------------------------------
// Pointer
// ---------------------------------------------------------------------------

/// Pointer (mouse or touch) button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// A pointer press, release or move. `position` is local to the receiving view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub position: Offset,
    pub button: PointerButton,
    /// On release: whether the release completes a click.
    pub trigger_click: bool,
}

impl PointerEvent {
    pub fn new(position: Offset, button: PointerButton) -> Self {
        Self { position, button, trigger_click: false }
    }
}

/// A wheel or touchpad scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollEvent {
    pub origin: Offset,
    pub delta: Offset,
    pub kinetic: bool,
}

// ---------------------------------------------------------------------------
// From<crossterm> conversions
// ---------------------------------------------------------------------------

impl From<crossterm::event::KeyCode> for Key {
    fn from(code: crossterm::event::KeyCode) -> Self {
        use crossterm::event::KeyCode;
        match code {
            KeyCode::Char(c) => Key::Char(c),
            KeyCode::Enter => Key::Enter,
            KeyCode::Esc => Key::Escape,
            KeyCode::Tab => Key::Tab,
            KeyCode::BackTab => Key::BackTab,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Delete => Key::Delete,
            KeyCode::Left => Key::Left,
            KeyCode::Right => Key::Right,
            KeyCode::Up => Key::Up,
            KeyCode::Down => Key::Down,
            KeyCode::Home => Key::Home,
            KeyCode::End => Key::End,
            KeyCode::PageUp => Key::PageUp,
            KeyCode::PageDown => Key::PageDown,
            KeyCode::F(n) => Key::F(n),
            // Unsupported codes map to Escape.
            _ => Key::Escape,
        }
    }
}

impl From<crossterm::event::KeyEvent> for Key {
    fn from(ct: crossterm::event::KeyEvent) -> Self {
        Key::from(ct.code)
    }
}

impl From<crossterm::event::MouseButton> for PointerButton {
    fn from(b: crossterm::event::MouseButton) -> Self {
        match b {
            crossterm::event::MouseButton::Left => PointerButton::Left,
            crossterm::event::MouseButton::Right => PointerButton::Right,
            crossterm::event::MouseButton::Middle => PointerButton::Middle,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent as CtKeyEvent, KeyModifiers, MouseButton};

    #[test]
    fn key_names_round_trip_for_named_keys() {
        for key in [Key::Enter, Key::Escape, Key::Backspace, Key::PageDown, Key::F(5)] {
            assert_eq!(Key::from_name(&key.name()), Some(key));
        }
    }

    #[test]
    fn single_char_name_is_char_key() {
        assert_eq!(Key::Char('a').name(), "a");
        assert_eq!(Key::from_name("a"), Some(Key::Char('a')));
        assert_eq!(Key::from_name("nope"), None);
    }

    #[test]
    fn crossterm_char_key() {
        let ct = CtKeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(Key::from(ct), Key::Char('q'));
    }

    #[test]
    fn crossterm_special_keys() {
        assert_eq!(Key::from(KeyCode::Enter), Key::Enter);
        assert_eq!(Key::from(KeyCode::Esc), Key::Escape);
        assert_eq!(Key::from(KeyCode::F(12)), Key::F(12));
        assert_eq!(Key::from(KeyCode::Insert), Key::Escape);
    }

    #[test]
    fn crossterm_mouse_buttons() {
        assert_eq!(PointerButton::from(MouseButton::Right), PointerButton::Right);
        assert_eq!(PointerButton::default(), PointerButton::Left);
    }
}
