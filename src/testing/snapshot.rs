//! Snapshot rendering helpers.
//!
//! Turn a view tree into indented plain text for snapshot assertions. One
//! line per view:
//!
//! ```text
//! Vertical .Vertical.ViewContainer (0, 0) 80x24
//!   Button "OK" .Button (0, 0) 80x16 bg=#ff0000 [hover]
//! ```

use std::fmt::Write;

use crate::event::window::Window;
use crate::style::property::Visibility;
use crate::view::View;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Render `view` and its descendants, two spaces of indent per level.
pub fn render_tree(view: &View) -> String {
    let mut out = String::new();
    write_view(&mut out, view, 0);
    if out.ends_with('\n') {
        out.pop();
    }
    out
}

/// Render the window's surface, or `<no surface>`.
pub fn render_surface(window: &Window) -> String {
    window.surface().map_or_else(|| "<no surface>".to_string(), |s| render_tree(&s))
}

/// The state flags shown in brackets after a view's geometry.
pub fn state_flags(view: &View) -> Vec<&'static str> {
    let mut flags = Vec::new();
    if view.is_hovered() {
        flags.push("hover");
    }
    if view.is_pressed() {
        flags.push("active");
    }
    if view.is_focused() {
        flags.push("focus");
    }
    if !view.is_enabled() {
        flags.push("disabled");
    }
    if view.is_selected() {
        flags.push("selected");
    }
    match view.visibility() {
        Visibility::Visible => {}
        Visibility::Invisible => flags.push("invisible"),
        Visibility::Gone => flags.push("gone"),
    }
    if view.is_custom_layout() {
        flags.push("custom-layout");
    }
    flags
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

fn write_view(out: &mut String, view: &View, depth: usize) {
    let _ = write!(out, "{:indent$}{}", "", view.widget_type(), indent = depth * 2);
    if let Some(text) = view.text() {
        let _ = write!(out, " {text:?}");
    }
    let names = view.style_names();
    if !names.is_empty() {
        let _ = write!(out, " .{}", names.join("."));
    }
    let _ = write!(out, " {} {}", view.position(), view.size());
    if let Some(bg) = view.computed_style().background() {
        let _ = write!(out, " bg={bg}");
    }
    let flags = state_flags(view);
    if !flags.is_empty() {
        let _ = write!(out, " [{}]", flags.join(" "));
    }
    out.push('\n');
    for child in view.children() {
        write_view(out, &child, depth + 1);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::widgets::{Button, Container, Label};

    #[test]
    fn renders_nested_tree() {
        let root = Container::vertical();
        root.add_style_name("Main");
        let row = Container::horizontal();
        row.add_view(&View::new(Button::new("OK"))).unwrap();
        root.add_view(&row).unwrap();
        root.add_view(&View::new(Label::new("hi"))).unwrap();
        insta::assert_snapshot!(render_tree(&root), @r#"
        Vertical .Main (0, 0) 0x0
          Horizontal (0, 0) 0x0
            Button "OK" (0, 0) 0x0
          Label "hi" (0, 0) 0x0
        "#);
    }

    #[test]
    fn flags_follow_state() {
        let view = View::plain();
        view.set_enabled(false);
        view.set_visibility(Visibility::Gone);
        assert_eq!(state_flags(&view), ["disabled", "gone"]);
    }

    #[test]
    fn empty_window() {
        assert_eq!(render_surface(&Window::new(Size::new(10, 10))), "<no surface>");
    }
}
