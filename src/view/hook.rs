//! Overridable behaviour points.
//!
//! A script may replace a fixed set of behaviours per view instance by
//! assigning a function under the hook's name. The window and layout ask the
//! view first and fall back to the widget's own behaviour when no override is
//! set.

use std::fmt;

use super::node::View;
use super::signal::Payload;
use crate::error::Result;
use crate::geometry::Size;

/// A behaviour a script can override on one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    PointerPressed,
    PointerReleased,
    PointerMove,
    MouseEnter,
    MouseLeave,
    FocusAcquired,
    FocusLost,
    KeyDown,
    KeyUp,
    Scroll,
    CharEntered,
    ConsumesClick,
    CapturesFocus,
    ContentMinimumWidth,
    ContentMinimumHeight,
    /// Asked with the text an edit would produce; a falsy reply rejects it.
    IsValidText,
}

impl Hook {
    pub const ALL: [Hook; 16] = [
        Hook::PointerPressed,
        Hook::PointerReleased,
        Hook::PointerMove,
        Hook::MouseEnter,
        Hook::MouseLeave,
        Hook::FocusAcquired,
        Hook::FocusLost,
        Hook::KeyDown,
        Hook::KeyUp,
        Hook::Scroll,
        Hook::CharEntered,
        Hook::ConsumesClick,
        Hook::CapturesFocus,
        Hook::ContentMinimumWidth,
        Hook::ContentMinimumHeight,
        Hook::IsValidText,
    ];

    /// The field name a script assigns to override this hook.
    pub fn name(self) -> &'static str {
        match self {
            Hook::PointerPressed => "onPointerPressed",
            Hook::PointerReleased => "onPointerReleased",
            Hook::PointerMove => "onPointerMove",
            Hook::MouseEnter => "onMouseEnter",
            Hook::MouseLeave => "onMouseLeave",
            Hook::FocusAcquired => "onFocusAcquired",
            Hook::FocusLost => "onFocusLost",
            Hook::KeyDown => "onKeyDown",
            Hook::KeyUp => "onKeyUp",
            Hook::Scroll => "onScroll",
            Hook::CharEntered => "onCharEntered",
            Hook::ConsumesClick => "consumesClick",
            Hook::CapturesFocus => "capturesFocus",
            Hook::ContentMinimumWidth => "getContentMinimumWidth",
            Hook::ContentMinimumHeight => "getContentMinimumHeight",
            Hook::IsValidText => "isValidText",
        }
    }

    pub fn from_name(name: &str) -> Option<Hook> {
        Hook::ALL.into_iter().find(|h| h.name() == name)
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What an override returned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HookReply {
    Unit,
    Bool(bool),
    Number(f64),
}

impl HookReply {
    /// Truthiness: `Unit` and `false` are false, numbers are true.
    pub fn truthy(self) -> bool {
        match self {
            HookReply::Unit => false,
            HookReply::Bool(b) => b,
            HookReply::Number(_) => true,
        }
    }

    pub fn number(self) -> Option<f64> {
        match self {
            HookReply::Number(n) => Some(n),
            _ => None,
        }
    }
}

impl View {
    /// Run the script override for `hook`. `Ok(None)` when there is none.
    pub fn call_hook(&self, hook: Hook, payload: &Payload) -> Result<Option<HookReply>> {
        match self.companion() {
            Some(companion) => companion.call_hook(self, hook, payload),
            None => Ok(None),
        }
    }

    pub fn has_hook(&self, hook: Hook) -> bool {
        self.companion().is_some_and(|c| c.has_hook(hook))
    }

    /// Like [`View::call_hook`], but a failing override is logged and treated
    /// as absent.
    fn hook_or_default(&self, hook: Hook) -> Option<HookReply> {
        match self.call_hook(hook, &Payload::None) {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(view = %self, hook = %hook, error = %err, "hook failed");
                None
            }
        }
    }

    /// Whether a press on this view stops here instead of reaching views below.
    pub fn consumes_click(&self) -> bool {
        match self.hook_or_default(Hook::ConsumesClick) {
            Some(reply) => reply.truthy(),
            None => self.with_widget(|w| w.consumes_click()),
        }
    }

    /// Whether this view takes keyboard focus.
    pub fn captures_focus(&self) -> bool {
        match self.hook_or_default(Hook::CapturesFocus) {
            Some(reply) => reply.truthy(),
            None => self.with_widget(|w| w.can_focus()),
        }
    }

    /// Content size, with `getContentMinimumWidth`/`Height` overrides applied.
    pub fn content_size(&self) -> Size {
        let mut size = self.widget_content_size();
        if let Some(w) = self.hook_or_default(Hook::ContentMinimumWidth).and_then(HookReply::number) {
            size.width = w.round() as i32;
        }
        if let Some(h) = self.hook_or_default(Hook::ContentMinimumHeight).and_then(HookReply::number) {
            size.height = h.round() as i32;
        }
        size
    }

    /// Whether an edit producing `text` is allowed. A failing `isValidText`
    /// override rejects the edit.
    pub fn accepts_text(&self, text: &str) -> bool {
        match self.call_hook(Hook::IsValidText, &Payload::Text(text.to_string())) {
            Ok(reply) => reply.is_none_or(HookReply::truthy),
            Err(err) => {
                tracing::warn!(view = %self, error = %err, "text validation failed");
                false
            }
        }
    }
}
