//! The window: owns the surface view and routes input into the tree.
//!
//! Pointer input is hit-tested against the surface; the window tracks the
//! hovered chain, the pressed view and the focused view weakly, so a view
//! removed from the tree while pressed or focused simply stops receiving
//! input. Script overrides ([`Hook`]) replace the default reaction of a view;
//! otherwise the matching native signal is emitted.
//!
//! Wheel input the deepest view does not use bubbles up to the nearest
//! ancestor that can scroll. Moving the pointer while pressed drags the
//! enclosing [`Draggable`](crate::widgets::Draggable), if any.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::input::{Key, PointerButton, PointerEvent, ScrollEvent};
use crate::error::Result;
use crate::geometry::{Offset, Region, Size};
use crate::layout::engine::emit_changes;
use crate::layout::LayoutEngine;
use crate::view::hook::Hook;
use crate::view::node::{View, WeakView};
use crate::view::signal::{Payload, SignalKind};

/// When the touchscreen keyboard appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TouchscreenKeyboardPolicy {
    /// Shown when a text field gains focus, hidden when it loses it.
    #[default]
    ShownIfNeeded,
    /// Only through `show_touchscreen_keyboard` / `hide_touchscreen_keyboard`.
    Manual,
}

struct WindowInner {
    surface: RefCell<Option<View>>,
    /// Carries window-level signals such as `WindowKeyDown`.
    anchor: View,
    size: Cell<Size>,
    dpi_ratio: Cell<f32>,
    focused: RefCell<WeakView>,
    pressed: RefCell<WeakView>,
    /// Last pointer position while pressed, for dragging.
    press_point: Cell<Option<Offset>>,
    hovered: RefCell<Vec<WeakView>>,
    layout: RefCell<LayoutEngine>,
    keyboard_policy: Cell<TouchscreenKeyboardPolicy>,
    keyboard_visible: Cell<bool>,
    clipboard: RefCell<Option<String>>,
}

impl Drop for WindowInner {
    fn drop(&mut self) {
        if let Some(surface) = self.surface.get_mut().take() {
            surface.release_root();
        }
    }
}

/// Shared handle to the window.
#[derive(Clone)]
pub struct Window(Rc<WindowInner>);

impl Window {
    pub fn new(size: Size) -> Self {
        Window(Rc::new(WindowInner {
            surface: RefCell::new(None),
            anchor: View::plain(),
            size: Cell::new(size),
            dpi_ratio: Cell::new(1.0),
            focused: RefCell::new(WeakView::default()),
            pressed: RefCell::new(WeakView::default()),
            press_point: Cell::new(None),
            hovered: RefCell::new(Vec::new()),
            layout: RefCell::new(LayoutEngine::new()),
            keyboard_policy: Cell::new(TouchscreenKeyboardPolicy::default()),
            keyboard_visible: Cell::new(false),
            clipboard: RefCell::new(None),
        }))
    }

    // ── Surface ──────────────────────────────────────────────────────

    pub fn surface(&self) -> Option<View> {
        self.0.surface.borrow().clone()
    }

    /// Replace the surface, returning the previous one. Input state is reset.
    pub fn set_surface(&self, view: View) -> Option<View> {
        tracing::debug!(surface = %view, "set surface");
        self.reset_input_state();
        view.retain_root();
        let old = self.0.surface.borrow_mut().replace(view);
        if let Some(old) = &old {
            old.release_root();
        }
        old
    }

    /// Detach and return the surface.
    pub fn steal_surface(&self) -> Option<View> {
        self.reset_input_state();
        self.0.layout.borrow_mut().clear();
        let old = self.0.surface.borrow_mut().take();
        if let Some(old) = &old {
            old.release_root();
        }
        old
    }

    fn reset_input_state(&self) {
        *self.0.focused.borrow_mut() = WeakView::default();
        *self.0.pressed.borrow_mut() = WeakView::default();
        self.0.press_point.set(None);
        self.0.hovered.borrow_mut().clear();
    }

    /// The view carrying window-level signals.
    pub fn anchor(&self) -> View {
        self.0.anchor.clone()
    }

    pub fn size(&self) -> Size {
        self.0.size.get()
    }

    pub fn resize(&self, size: Size) {
        self.0.size.set(size);
    }

    pub fn dpi_ratio(&self) -> f32 {
        self.0.dpi_ratio.get()
    }

    pub fn set_dpi_ratio(&self, ratio: f32) {
        self.0.dpi_ratio.set(ratio.max(0.1));
    }

    /// Lay the surface out over the whole window.
    pub fn update_layout(&self) -> Result<()> {
        let Some(surface) = self.surface() else {
            return Ok(());
        };
        let size = self.size();
        // The engine borrow ends before geometry signals run; a subscriber
        // may request another layout pass.
        let changes = {
            let mut engine = self.0.layout.borrow_mut();
            engine.sync_tree(&surface, size);
            engine.compute(size);
            engine.store(&surface)
        };
        emit_changes(changes)
    }

    // ── Hit testing ──────────────────────────────────────────────────

    /// The topmost view at `point` (window coordinates) that consumes clicks.
    pub fn view_at(&self, point: Offset) -> Option<View> {
        let surface = self.surface()?;
        hit(&surface, point - surface.position())
    }

    /// The chain of visible views containing `point`, root first, descending
    /// into the topmost child at each level.
    pub fn views_under(&self, point: Offset) -> Vec<View> {
        let mut chain = Vec::new();
        let Some(mut current) = self.surface() else {
            return chain;
        };
        let mut local = point - current.position();
        loop {
            if !current.is_visible() || !Region::new(Offset::ZERO, current.size()).contains(local) {
                break;
            }
            chain.push(current.clone());
            let next = current.children().into_iter().rev().find(|c| {
                c.is_visible() && Region::new(Offset::ZERO, c.size()).contains(local - c.position())
            });
            match next {
                Some(child) => {
                    local = local - child.position();
                    current = child;
                }
                None => break,
            }
        }
        chain
    }

    // ── Pointer ──────────────────────────────────────────────────────

    /// Move the pointer: updates the hovered chain, then notifies the
    /// deepest view under the pointer. While pressed, drags first.
    pub fn pointer_move(&self, point: Offset) -> Result<()> {
        self.drag_to(point)?;
        let chain = self.views_under(point);
        let previous: Vec<View> =
            self.0.hovered.borrow().iter().filter_map(WeakView::upgrade).collect();
        *self.0.hovered.borrow_mut() = chain.iter().map(View::downgrade).collect();

        for old in previous.iter().rev() {
            if !chain.iter().any(|v| v.ptr_eq(old)) {
                old.set_hovered(false);
                old.call_hook(Hook::MouseLeave, &Payload::None)?;
            }
        }
        for new in &chain {
            if !previous.iter().any(|v| v.ptr_eq(new)) {
                new.set_hovered(true);
                new.call_hook(Hook::MouseEnter, &Payload::None)?;
            }
        }
        if let Some(deepest) = chain.last() {
            let event = PointerEvent::new(deepest.map_global_to_local(point), PointerButton::Left);
            deepest.call_hook(Hook::PointerMove, &Payload::Pointer(event))?;
        }
        tracing::trace!(x = point.x, y = point.y, hovered = chain.len(), "pointer move");
        Ok(())
    }

    fn drag_to(&self, point: Offset) -> Result<()> {
        let (Some(last), Some(pressed)) = (self.0.press_point.get(), self.0.pressed.borrow().upgrade()) else {
            return Ok(());
        };
        if crate::widgets::drag::drag(&pressed, point - last)? {
            self.0.press_point.set(Some(point));
            self.update_layout()?;
        }
        Ok(())
    }

    /// Clear hover state, as if the pointer left the window.
    pub fn pointer_leave(&self) -> Result<()> {
        let previous: Vec<View> =
            self.0.hovered.borrow_mut().drain(..).filter_map(|w| w.upgrade()).collect();
        for old in previous.iter().rev() {
            old.set_hovered(false);
            old.call_hook(Hook::MouseLeave, &Payload::None)?;
        }
        Ok(())
    }

    pub fn pointer_press(&self, point: Offset, button: PointerButton) -> Result<()> {
        let Some(target) = self.view_at(point) else {
            return Ok(());
        };
        if !target.is_enabled() {
            return Ok(());
        }
        tracing::trace!(target = %target, ?button, "pointer press");
        if target.captures_focus() {
            self.focus(&target)?;
        }
        *self.0.pressed.borrow_mut() = target.downgrade();
        self.0.press_point.set(Some(point));
        target.set_pressed(true);
        let event = PointerEvent::new(target.map_global_to_local(point), button);
        if target.call_hook(Hook::PointerPressed, &Payload::Pointer(event))?.is_none() {
            target.emit(SignalKind::Pressed, Payload::Pointer(event))?;
        }
        Ok(())
    }

    /// Release the pointer. Completes a click when released over the view
    /// that received the press.
    pub fn pointer_release(&self, point: Offset, button: PointerButton) -> Result<()> {
        let pressed = std::mem::take(&mut *self.0.pressed.borrow_mut());
        self.0.press_point.set(None);
        let Some(target) = pressed.upgrade() else {
            return Ok(());
        };
        target.set_pressed(false);
        let local = target.map_global_to_local(point);
        let mut event = PointerEvent::new(local, button);
        event.trigger_click =
            target.is_enabled() && Region::new(Offset::ZERO, target.size()).contains(local);
        if target.call_hook(Hook::PointerReleased, &Payload::Pointer(event))?.is_none() {
            target.emit(SignalKind::Released, Payload::Pointer(event))?;
        }
        if event.trigger_click {
            self.click_view(&target, button)?;
        }
        Ok(())
    }

    /// Deliver a completed click to `view`.
    pub fn click_view(&self, view: &View, button: PointerButton) -> Result<()> {
        if !view.is_enabled() {
            return Ok(());
        }
        match button {
            PointerButton::Left => {
                let emissions = view.with_widget_mut(|w| w.on_click());
                view.emit_all(emissions)?;
                view.emit(SignalKind::Clicked, Payload::None)?;
            }
            PointerButton::Right => {
                view.emit(SignalKind::ClickedRight, Payload::None)?;
                view.emit(SignalKind::ClickedRightOrLongPressed, Payload::None)?;
            }
            PointerButton::Middle => {}
        }
        view.emit(SignalKind::ClickedButton, Payload::Button(button))
    }

    /// Press and release at the center of `view`.
    pub fn click(&self, view: &View, button: PointerButton) -> Result<()> {
        let center = Region::new(view.global_position(), view.size()).center();
        self.pointer_press(center, button)?;
        self.pointer_release(center, button)
    }

    /// Wheel input at `point`. The deepest view gets a `Scroll` override or
    /// `Scrolled`; without an override the delta goes to the nearest view in
    /// the chain that consumes it, and layout is refreshed.
    pub fn scroll(&self, point: Offset, delta: Offset, kinetic: bool) -> Result<()> {
        let chain = self.views_under(point);
        let Some(target) = chain.last() else {
            return Ok(());
        };
        let event = ScrollEvent { origin: target.map_global_to_local(point), delta, kinetic };
        if target.call_hook(Hook::Scroll, &Payload::Scroll(event))?.is_some() {
            return Ok(());
        }
        target.emit(SignalKind::Scrolled, Payload::Scroll(event))?;
        for view in chain.iter().rev() {
            if let Some(emissions) = view.with_widget_mut(|w| w.on_scroll(delta)) {
                tracing::trace!(view = %view, dx = delta.x, dy = delta.y, "scroll consumed");
                view.emit_all(emissions)?;
                return self.update_layout();
            }
        }
        Ok(())
    }

    // ── Focus ────────────────────────────────────────────────────────

    pub fn focused(&self) -> Option<View> {
        self.0.focused.borrow().upgrade()
    }

    /// Move focus to `view`. Ancestors of the new focus emit `ChildFocused`.
    pub fn focus(&self, view: &View) -> Result<()> {
        if let Some(old) = self.focused() {
            if old.ptr_eq(view) {
                return Ok(());
            }
            self.blur(&old)?;
        }
        *self.0.focused.borrow_mut() = view.downgrade();
        view.set_focused(true);
        tracing::trace!(view = %view, "focus");
        if view.call_hook(Hook::FocusAcquired, &Payload::None)?.is_none() {
            view.emit(SignalKind::Focused, Payload::None)?;
        }
        if self.0.keyboard_policy.get() == TouchscreenKeyboardPolicy::ShownIfNeeded {
            self.0.keyboard_visible.set(view.is::<crate::widgets::Input>());
        }
        for ancestor in view.ancestors() {
            ancestor.emit(SignalKind::ChildFocused, Payload::Child(view.clone()))?;
        }
        Ok(())
    }

    /// Drop focus without focusing anything else.
    pub fn clear_focus(&self) -> Result<()> {
        match self.focused() {
            Some(old) => self.blur(&old),
            None => Ok(()),
        }
    }

    fn blur(&self, view: &View) -> Result<()> {
        *self.0.focused.borrow_mut() = WeakView::default();
        view.set_focused(false);
        if self.0.keyboard_policy.get() == TouchscreenKeyboardPolicy::ShownIfNeeded {
            self.0.keyboard_visible.set(false);
        }
        let emissions = view.with_widget_mut(|w| w.on_blur());
        view.emit_all(emissions)?;
        if view.call_hook(Hook::FocusLost, &Payload::None)?.is_none() {
            view.emit(SignalKind::Unfocused, Payload::None)?;
        }
        Ok(())
    }

    /// Focus the next focusable view after the current one, in tree order,
    /// wrapping around. Returns the newly focused view.
    pub fn focus_next(&self) -> Result<Option<View>> {
        let Some(surface) = self.surface() else {
            return Ok(None);
        };
        let candidates: Vec<View> = surface
            .descendants()
            .into_iter()
            .filter(|v| v.is_enabled() && v.is_visible() && v.captures_focus())
            .collect();
        if candidates.is_empty() {
            return Ok(None);
        }
        let next = match self.focused().and_then(|f| candidates.iter().position(|c| c.ptr_eq(&f))) {
            Some(i) => candidates[(i + 1) % candidates.len()].clone(),
            None => candidates[0].clone(),
        };
        self.focus(&next)?;
        Ok(Some(next))
    }

    // ── Keyboard ─────────────────────────────────────────────────────

    /// Deliver a key press to the focused view (or the surface), then to
    /// window-level listeners. An unhandled `Tab` moves focus.
    pub fn key_down(&self, key: Key) -> Result<()> {
        let target = self.focused().or_else(|| self.surface());
        if let Some(target) = &target {
            tracing::trace!(target = %target, key = %key.name(), "key down");
            if target.call_hook(Hook::KeyDown, &Payload::Key(key))?.is_none() {
                target.emit(SignalKind::KeyDown, Payload::Key(key))?;
                let emissions = target.with_widget_mut(|w| w.on_key(key));
                target.emit_all(emissions)?;
            }
        }
        self.0.anchor.emit(SignalKind::WindowKeyDown, Payload::Key(key))?;
        if key == Key::Tab && !target.as_ref().is_some_and(|t| t.has_hook(Hook::KeyDown)) {
            self.focus_next()?;
        }
        Ok(())
    }

    pub fn key_up(&self, key: Key) -> Result<()> {
        let Some(target) = self.focused().or_else(|| self.surface()) else {
            return Ok(());
        };
        if target.call_hook(Hook::KeyUp, &Payload::Key(key))?.is_none() {
            target.emit(SignalKind::KeyUp, Payload::Key(key))?;
        }
        Ok(())
    }

    /// Type `text` into the focused view, one character at a time. A
    /// character whose resulting text the view rejects is dropped.
    pub fn type_text(&self, text: &str) -> Result<()> {
        let Some(target) = self.focused() else {
            return Ok(());
        };
        for c in text.chars() {
            let payload = Payload::Text(c.to_string());
            if target.call_hook(Hook::CharEntered, &payload)?.is_none() {
                let proposed = target.with_widget(|w| w.proposed_text(c));
                if proposed.is_some_and(|text| !target.accepts_text(&text)) {
                    tracing::trace!(target = %target, "text rejected");
                    continue;
                }
                let emissions = target.with_widget_mut(|w| w.on_char(c));
                target.emit_all(emissions)?;
            }
        }
        Ok(())
    }

    // ── Touchscreen keyboard and clipboard ───────────────────────────

    pub fn keyboard_policy(&self) -> TouchscreenKeyboardPolicy {
        self.0.keyboard_policy.get()
    }

    pub fn set_keyboard_policy(&self, policy: TouchscreenKeyboardPolicy) {
        self.0.keyboard_policy.set(policy);
    }

    pub fn is_keyboard_visible(&self) -> bool {
        self.0.keyboard_visible.get()
    }

    pub fn show_touchscreen_keyboard(&self) {
        self.0.keyboard_visible.set(true);
    }

    pub fn hide_touchscreen_keyboard(&self) {
        self.0.keyboard_visible.set(false);
    }

    pub fn clipboard_is_empty(&self) -> bool {
        self.0.clipboard.borrow().as_deref().is_none_or(str::is_empty)
    }

    pub fn copy_to_clipboard(&self, text: impl Into<String>) {
        *self.0.clipboard.borrow_mut() = Some(text.into());
    }

    pub fn paste_from_clipboard(&self) -> String {
        self.0.clipboard.borrow().clone().unwrap_or_default()
    }
}

fn hit(view: &View, local: Offset) -> Option<View> {
    if !view.is_visible() || !Region::new(Offset::ZERO, view.size()).contains(local) {
        return None;
    }
    for child in view.children().into_iter().rev() {
        if let Some(found) = hit(&child, local - child.position()) {
            return Some(found);
        }
    }
    view.consumes_click().then(|| view.clone())
}
