//! Drag and drop inside an area.
//!
//! A [`DragArea`] places its children freely. A [`Draggable`] child of the
//! area follows the pointer while pressed. If the draggable holds any
//! [`DragHandle`], only presses that start on a handle move it.

use std::any::Any;

use crate::error::Result;
use crate::geometry::{Offset, Size};
use crate::view::node::View;
use crate::view::signal::{Payload, SignalKind};
use crate::widget::traits::{LayoutKind, Widget};

#[derive(Debug, Clone, Copy, Default)]
pub struct DragArea;

impl DragArea {
    pub fn view() -> View {
        View::new(DragArea)
    }
}

impl Widget for DragArea {
    fn widget_type(&self) -> &'static str {
        "DragArea"
    }

    fn layout_kind(&self) -> Option<LayoutKind> {
        Some(LayoutKind::Free)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Grip of a [`Draggable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DragHandle;

impl Widget for DragHandle {
    fn widget_type(&self) -> &'static str {
        "DragHandle"
    }

    fn content_size(&self) -> Size {
        Size::new(16, 16)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Wrapper that makes its content movable inside a [`DragArea`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Draggable;

impl Draggable {
    pub fn view(content: &View) -> Result<View> {
        let view = View::new(Draggable);
        view.add_view(content)?;
        Ok(view)
    }
}

impl Widget for Draggable {
    fn widget_type(&self) -> &'static str {
        "Draggable"
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

/// The draggable moved by a press on `pressed`: the nearest [`Draggable`]
/// at or above it whose parent is a [`DragArea`].
pub fn drag_target(pressed: &View) -> Option<View> {
    let chain = std::iter::once(pressed.clone()).chain(pressed.ancestors());
    let mut on_handle = false;
    for view in chain {
        on_handle |= view.is::<DragHandle>();
        if !view.is::<Draggable>() {
            continue;
        }
        let in_area = view.parent().is_some_and(|p| p.is::<DragArea>());
        let has_handles = view.descendants().iter().any(|d| d.is::<DragHandle>());
        return (in_area && (on_handle || !has_handles)).then_some(view);
    }
    None
}

/// Move the draggable pressed through `pressed` by `delta`, kept inside its
/// area. Emits `PositionChanged` when it moved. Returns whether a drag
/// happened.
pub fn drag(pressed: &View, delta: Offset) -> Result<bool> {
    let Some(target) = drag_target(pressed) else {
        return Ok(false);
    };
    let Some(area) = target.parent() else {
        return Ok(false);
    };
    let room = Offset::new(
        (area.size().width - target.size().width).max(0),
        (area.size().height - target.size().height).max(0),
    );
    let from = target.position();
    let to = Offset::new((from.x + delta.x).clamp(0, room.x), (from.y + delta.y).clamp(0, room.y));
    if to == from {
        return Ok(true);
    }
    target.set_position(to);
    tracing::trace!(view = %target, x = to.x, y = to.y, "drag");
    target.emit(SignalKind::PositionChanged, Payload::Position(to))?;
    Ok(true)
}
