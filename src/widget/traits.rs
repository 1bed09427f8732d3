//! Widget trait: the per-kind behaviour behind a [`View`](crate::view::View).
//!
//! A view owns exactly one `Box<dyn Widget>`. The widget decides whether the
//! view is a container, whether it takes focus or consumes clicks, how large
//! its content is, and how it reacts to activation and text input. Reactions
//! are returned as signal emissions so that no widget borrow is held while
//! subscribers run.

use std::any::Any;

use crate::event::input::Key;
use crate::geometry::{Offset, Size};
use crate::view::signal::{Payload, SignalKind};

/// A signal to emit on the owning view once the widget borrow is released.
pub type Emission = (SignalKind, Payload);

/// How a container places its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    /// Children keep the positions they were given.
    Free,
    Vertical,
    Horizontal,
    /// All children fill the same cell, later ones on top.
    Stacked,
    /// Like `Stacked`, children centered.
    Centered,
    Grid { columns: u16 },
    /// Children are placed at explicit positions.
    Absolute,
    /// Children keep their natural size and are shifted by the scroll offset.
    Scroll { x: i32, y: i32 },
}

/// Core trait implemented by all widget kinds.
///
/// Object-safe: every method takes `&self`/`&mut self` and returns owned values.
pub trait Widget {
    /// Type name, also the default style name of script-created instances.
    fn widget_type(&self) -> &'static str;

    /// Layout of children, `None` for leaf widgets.
    fn layout_kind(&self) -> Option<LayoutKind> {
        None
    }

    fn is_container(&self) -> bool {
        self.layout_kind().is_some()
    }

    /// Whether this widget can receive keyboard focus.
    fn can_focus(&self) -> bool {
        false
    }

    /// Whether a press at this widget is taken by it rather than falling
    /// through to whatever lies below. Leaves consume, containers don't.
    fn consumes_click(&self) -> bool {
        !self.is_container()
    }

    /// Minimum size of the content, excluding padding.
    fn content_size(&self) -> Size {
        Size::ZERO
    }

    /// Text shown by the widget, if any.
    fn text(&self) -> Option<String> {
        None
    }

    /// Whether the widget is in its selected/checked state.
    fn is_selected(&self) -> bool {
        false
    }

    /// Default reaction to a completed click.
    fn on_click(&mut self) -> Vec<Emission> {
        Vec::new()
    }

    /// Default reaction to a key press while focused.
    fn on_key(&mut self, _key: Key) -> Vec<Emission> {
        Vec::new()
    }

    /// Default reaction to a typed character while focused.
    fn on_char(&mut self, _c: char) -> Vec<Emission> {
        Vec::new()
    }

    /// Text the widget would hold after typing `c`, for widgets whose edits
    /// can be vetoed. `None` when `c` would not change the text.
    fn proposed_text(&self, _c: char) -> Option<String> {
        None
    }

    /// Reaction to a wheel or touchpad scroll. `None` passes the event on to
    /// the parent.
    fn on_scroll(&mut self, _delta: Offset) -> Option<Vec<Emission>> {
        None
    }

    /// Reaction to losing keyboard focus.
    fn on_blur(&mut self) -> Vec<Emission> {
        Vec::new()
    }

    /// One-line summary used by tree snapshots, e.g. `Button "OK"`.
    fn describe(&self) -> String {
        match self.text() {
            Some(text) => format!("{} {text:?}", self.widget_type()),
            None => self.widget_type().to_string(),
        }
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Approximate size of a single line of text: 8dp per character, 16dp tall.
pub fn text_extent(text: &str) -> Size {
    Size::new(text.chars().count() as i32 * 8, 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy;

    impl Widget for Dummy {
        fn widget_type(&self) -> &'static str {
            "Dummy"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    struct Box2;

    impl Widget for Box2 {
        fn widget_type(&self) -> &'static str {
            "Box2"
        }
        fn layout_kind(&self) -> Option<LayoutKind> {
            Some(LayoutKind::Vertical)
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn leaf_defaults() {
        let w = Dummy;
        assert!(!w.is_container());
        assert!(w.consumes_click());
        assert!(!w.can_focus());
        assert_eq!(w.content_size(), Size::ZERO);
        assert_eq!(w.describe(), "Dummy");
        let mut w = w;
        assert!(w.on_scroll(Offset::new(0, 10)).is_none());
        assert!(w.proposed_text('x').is_none());
    }

    #[test]
    fn container_defaults() {
        let w = Box2;
        assert!(w.is_container());
        assert!(!w.consumes_click());
    }

    #[test]
    fn downcast_via_any() {
        let w: Box<dyn Widget> = Box::new(Dummy);
        assert!(w.as_any().downcast_ref::<Dummy>().is_some());
        assert!(w.as_any().downcast_ref::<Box2>().is_none());
    }

    #[test]
    fn text_extent_scales_with_chars() {
        assert_eq!(text_extent("abcd"), Size::new(32, 16));
        assert_eq!(text_extent(""), Size::new(0, 16));
    }
}
