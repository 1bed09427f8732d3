//! Container widget: holds child views and names their layout.
//!
//! The container itself shows nothing. The layout engine reads its
//! [`LayoutKind`] to place the children.

use std::any::Any;

use crate::view::node::View;
use crate::widget::traits::{LayoutKind, Widget};

#[derive(Debug, Clone, Copy)]
pub struct Container {
    kind: LayoutKind,
}

impl Container {
    pub fn new(kind: LayoutKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    /// A view backed by a new container of `kind`.
    pub fn view(kind: LayoutKind) -> View {
        View::new(Container::new(kind))
    }

    pub fn vertical() -> View {
        Container::view(LayoutKind::Vertical)
    }

    pub fn horizontal() -> View {
        Container::view(LayoutKind::Horizontal)
    }
}

impl Widget for Container {
    fn widget_type(&self) -> &'static str {
        match self.kind {
            LayoutKind::Free => "ViewContainer",
            LayoutKind::Vertical => "Vertical",
            LayoutKind::Horizontal => "Horizontal",
            LayoutKind::Stacked => "Stacked",
            LayoutKind::Centered => "Centered",
            LayoutKind::Grid { .. } => "Grid",
            LayoutKind::Absolute => "AbsoluteLayout",
            LayoutKind::Scroll { .. } => "ScrollArea",
        }
    }

    fn layout_kind(&self) -> Option<LayoutKind> {
        Some(self.kind)
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
    fn type_name_follows_kind() {
        assert_eq!(Container::vertical().widget_type(), "Vertical");
        assert_eq!(Container::view(LayoutKind::Grid { columns: 3 }).widget_type(), "Grid");
        assert_eq!(Container::view(LayoutKind::Free).widget_type(), "ViewContainer");
    }

    #[test]
    fn containers_let_clicks_through() {
        let c = Container::new(LayoutKind::Stacked);
        assert!(c.is_container());
        assert!(!c.consumes_click());
    }
}
