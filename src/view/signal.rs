//! Native signals of a view.
//!
//! Each view owns a [`SignalTable`]: per [`SignalKind`], an ordered list of
//! native slots. Emission snapshots the list before invoking anything, so
//! slots connected or disconnected during an emission take effect on the
//! next one.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::node::View;
use crate::error::Error;
use crate::event::input::{Key, PointerButton, PointerEvent, ScrollEvent};
use crate::geometry::{Offset, Region, Size};

/// A native event source on a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignalKind {
    GeometryChanged,
    PositionChanged,
    SizeChanged,
    Clicked,
    ClickedRight,
    ClickedRightOrLongPressed,
    ClickedButton,
    Pressed,
    Released,
    Focused,
    Unfocused,
    KeyDown,
    KeyUp,
    ChildFocused,
    Scrolled,
    TextChanged,
    TextChanging,
    EnterPressed,
    ValueChanged,
    /// A value is being edited; `ValueChanged` follows once it is committed.
    ValueChanging,
    Checked,
    /// Scroll position of a scroll area or scrollbar moved.
    ScrollChanged,
    /// A scrollbar's scroll range changed.
    UpdatedMaxScroll,
    /// A scrollbar was moved by the user rather than by code.
    TriggeredManually,
    /// The confirm action of a text field or text area.
    ActionButtonPressed,
    /// Any key pressed while the window has focus, emitted on the surface.
    WindowKeyDown,
}

impl SignalKind {
    /// Every kind, in declaration order.
    pub const ALL: [SignalKind; 26] = [
        SignalKind::GeometryChanged,
        SignalKind::PositionChanged,
        SignalKind::SizeChanged,
        SignalKind::Clicked,
        SignalKind::ClickedRight,
        SignalKind::ClickedRightOrLongPressed,
        SignalKind::ClickedButton,
        SignalKind::Pressed,
        SignalKind::Released,
        SignalKind::Focused,
        SignalKind::Unfocused,
        SignalKind::KeyDown,
        SignalKind::KeyUp,
        SignalKind::ChildFocused,
        SignalKind::Scrolled,
        SignalKind::TextChanged,
        SignalKind::TextChanging,
        SignalKind::EnterPressed,
        SignalKind::ValueChanged,
        SignalKind::ValueChanging,
        SignalKind::Checked,
        SignalKind::ScrollChanged,
        SignalKind::UpdatedMaxScroll,
        SignalKind::TriggeredManually,
        SignalKind::ActionButtonPressed,
        SignalKind::WindowKeyDown,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SignalKind::GeometryChanged => "geometryChanged",
            SignalKind::PositionChanged => "positionChanged",
            SignalKind::SizeChanged => "sizeChanged",
            SignalKind::Clicked => "clicked",
            SignalKind::ClickedRight => "clickedRight",
            SignalKind::ClickedRightOrLongPressed => "clickedRightOrLongPressed",
            SignalKind::ClickedButton => "clickedButton",
            SignalKind::Pressed => "pressed",
            SignalKind::Released => "released",
            SignalKind::Focused => "focused",
            SignalKind::Unfocused => "unfocused",
            SignalKind::KeyDown => "keyDown",
            SignalKind::KeyUp => "keyUp",
            SignalKind::ChildFocused => "childFocused",
            SignalKind::Scrolled => "scrolled",
            SignalKind::TextChanged => "textChanged",
            SignalKind::TextChanging => "textChanging",
            SignalKind::EnterPressed => "enterPressed",
            SignalKind::ValueChanged => "valueChanged",
            SignalKind::ValueChanging => "valueChanging",
            SignalKind::Checked => "checked",
            SignalKind::ScrollChanged => "scrollChanged",
            SignalKind::UpdatedMaxScroll => "updatedMaxScroll",
            SignalKind::TriggeredManually => "triggeredManually",
            SignalKind::ActionButtonPressed => "actionButtonPressed",
            SignalKind::WindowKeyDown => "windowKeyDown",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Arguments carried by an emission.
#[derive(Debug, Clone)]
pub enum Payload {
    None,
    Position(Offset),
    Size(Size),
    Geometry(Region),
    Pointer(PointerEvent),
    Button(PointerButton),
    Key(Key),
    Scroll(ScrollEvent),
    Child(View),
    Bool(bool),
    Number(f64),
    Text(String),
}

/// A native subscriber. Receives the emitting view and the payload.
pub type Slot = Rc<dyn Fn(&View, &Payload) -> Result<(), Error>>;

/// Handle returned by [`View::connect`], used to disconnect one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(u64);

#[derive(Default)]
pub struct SignalTable {
    slots: HashMap<SignalKind, Vec<(SlotId, Slot)>>,
    next_id: u64,
}

impl SignalTable {
    pub(crate) fn connect(&mut self, kind: SignalKind, slot: Slot) -> SlotId {
        self.next_id += 1;
        let id = SlotId(self.next_id);
        self.slots.entry(kind).or_default().push((id, slot));
        id
    }

    pub(crate) fn disconnect(&mut self, kind: SignalKind, id: SlotId) -> bool {
        let Some(list) = self.slots.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(slot_id, _)| *slot_id != id);
        list.len() != before
    }

    pub(crate) fn clear(&mut self, kind: SignalKind) {
        self.slots.remove(&kind);
    }

    pub(crate) fn count(&self, kind: SignalKind) -> usize {
        self.slots.get(&kind).map_or(0, Vec::len)
    }

    pub(crate) fn snapshot(&self, kind: SignalKind) -> Vec<Slot> {
        self.slots
            .get(&kind)
            .map(|list| list.iter().map(|(_, slot)| slot.clone()).collect())
            .unwrap_or_default()
    }
}

impl View {
    /// Subscribe `slot` to `kind`. Slots run in connection order.
    pub fn connect(
        &self,
        kind: SignalKind,
        slot: impl Fn(&View, &Payload) -> Result<(), Error> + 'static,
    ) -> SlotId {
        self.node().signals.borrow_mut().connect(kind, Rc::new(slot))
    }

    pub fn disconnect(&self, kind: SignalKind, id: SlotId) -> bool {
        self.node().signals.borrow_mut().disconnect(kind, id)
    }

    /// Remove every native subscription to `kind`.
    pub fn disconnect_all(&self, kind: SignalKind) {
        self.node().signals.borrow_mut().clear(kind);
    }

    pub fn connection_count(&self, kind: SignalKind) -> usize {
        self.node().signals.borrow().count(kind)
    }

    /// Invoke every slot connected to `kind`.
    ///
    /// A failing slot does not stop the others; the first failure is returned
    /// after all slots ran.
    pub fn emit(&self, kind: SignalKind, payload: Payload) -> Result<(), Error> {
        let slots = self.node().signals.borrow().snapshot(kind);
        if slots.is_empty() {
            return Ok(());
        }
        tracing::trace!(signal = %kind, view = %self, slots = slots.len(), "emit");
        let mut first_error = None;
        for slot in slots {
            if let Err(err) = slot(self, &payload) {
                tracing::warn!(signal = %kind, view = %self, error = %err, "signal slot failed");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// The value a live-property signal currently carries, if `kind` is one.
    pub fn current_value(&self, kind: SignalKind) -> Option<Payload> {
        match kind {
            SignalKind::PositionChanged => Some(Payload::Position(self.position())),
            SignalKind::SizeChanged => Some(Payload::Size(self.size())),
            SignalKind::GeometryChanged => Some(Payload::Geometry(self.region())),
            _ => None,
        }
    }
}
