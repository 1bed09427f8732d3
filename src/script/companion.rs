//! Per-view script data.
//!
//! Fields assigned from script, hook overrides, forwarded subscriber lists and
//! the set of pinned children live in a Lua table stored as the user value of
//! the view's canonical handle. The collector traces that table like any
//! other script value, so a callback capturing its own view is an ordinary
//! Lua cycle and is reclaimed once script code lets go of it.
//!
//! The native side keeps a [`Companion`]: the pairing between a view and its
//! handle. It reaches the data table weakly, and holds the handle strongly
//! (the anchor) only while native code owns the view through a parent or the
//! window. The pairing ends when the handle it was made for is finalized.

use std::cell::RefCell;
use std::ffi::c_void;
use std::fmt;
use std::rc::Rc;

use mlua::prelude::*;

use super::handle::{existing_handle, handle, handle_key, SignalArgs, ViewHandle};
use crate::error::{Error, Result};
use crate::view::{Hook, HookReply, Payload, SignalKind, SlotId, View};

/// Key of a companion entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompanionKey {
    /// A named field (script assigned, extra method or hook override).
    Tag(String),
    /// Subscribers forwarded from one native signal.
    Signal(SignalKind),
    /// Children kept alive on behalf of script code.
    Children,
}

// Non-string keys are light userdata pointing into this array, so scripts
// cannot name them. Slot 0 is the children set, then one slot per signal.
static TAGS: [u8; 1 + SignalKind::ALL.len()] = [0; 1 + SignalKind::ALL.len()];

fn tag(index: usize) -> LuaValue {
    LuaValue::LightUserData(LuaLightUserData(&TAGS[index] as *const u8 as *mut c_void))
}

impl CompanionKey {
    pub fn tag(name: impl Into<String>) -> Self {
        CompanionKey::Tag(name.into())
    }

    fn to_lua(&self, lua: &Lua) -> LuaResult<LuaValue> {
        Ok(match self {
            CompanionKey::Tag(name) => LuaValue::String(lua.create_string(name)?),
            CompanionKey::Signal(kind) => tag(1 + *kind as usize),
            CompanionKey::Children => tag(0),
        })
    }

    fn from_lua(value: &LuaValue) -> Option<Self> {
        match value {
            LuaValue::String(s) => Some(CompanionKey::Tag(s.to_string_lossy())),
            LuaValue::LightUserData(ptr) => {
                let offset = (ptr.0 as usize).checked_sub(TAGS.as_ptr() as usize)?;
                match offset {
                    0 => Some(CompanionKey::Children),
                    n => SignalKind::ALL.get(n - 1).copied().map(CompanionKey::Signal),
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for CompanionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompanionKey::Tag(name) => f.write_str(name),
            CompanionKey::Signal(kind) => write!(f, "signal:{kind}"),
            CompanionKey::Children => f.write_str("children"),
        }
    }
}

struct Pairing {
    lua: WeakLua,
    /// Registry key of the canonical handle.
    key: i64,
    /// Serial of the handle this pairing was made for.
    serial: u64,
    anchor: RefCell<Option<LuaAnyUserData>>,
    forwarded: RefCell<Vec<(SignalKind, SlotId)>>,
}

/// Native side of a view's script data.
#[derive(Clone)]
pub struct Companion(Rc<Pairing>);

fn data_gone() -> LuaError {
    LuaError::runtime("script data of this view is no longer available")
}

impl Companion {
    /// The companion of `view`, pairing it with a fresh data table on first use.
    pub fn ensure(lua: &Lua, view: &View) -> LuaResult<Companion> {
        let ud = handle(lua, view)?;
        if let Some(existing) = view.companion() {
            return Ok(existing);
        }
        let serial = ud.borrow::<ViewHandle>()?.serial();
        ud.set_user_value(lua.create_table()?)?;
        let companion = Companion(Rc::new(Pairing {
            lua: lua.weak(),
            key: handle_key(view),
            serial,
            anchor: RefCell::new(None),
            forwarded: RefCell::new(Vec::new()),
        }));
        view.set_companion(companion.clone());
        view.sync_anchor();
        tracing::trace!(view = %view, "companion paired");
        Ok(companion)
    }

    pub fn ptr_eq(&self, other: &Companion) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn serial(&self) -> u64 {
        self.0.serial
    }

    fn handle(&self) -> Option<(Lua, LuaAnyUserData)> {
        let lua = self.0.lua.try_upgrade()?;
        if let Some(ud) = self.0.anchor.borrow().clone() {
            return Some((lua, ud));
        }
        let ud = existing_handle(&lua, self.0.key).ok()??;
        let current = ud.borrow::<ViewHandle>().is_ok_and(|h| h.serial() == self.0.serial);
        current.then_some((lua, ud))
    }

    fn data(&self) -> Option<(Lua, LuaTable)> {
        let (lua, ud) = self.handle()?;
        let table = ud.user_value::<Option<LuaTable>>().ok()??;
        Some((lua, table))
    }

    /// The entry under `key`, `Nil` when absent.
    pub fn get(&self, key: &CompanionKey) -> LuaResult<LuaValue> {
        match self.data() {
            Some((lua, data)) => data.raw_get(key.to_lua(&lua)?),
            None => Ok(LuaValue::Nil),
        }
    }

    /// Store `value` under `key`. Storing nil erases the entry.
    pub fn set(&self, key: &CompanionKey, value: LuaValue) -> LuaResult<()> {
        let (lua, data) = self.data().ok_or_else(data_gone)?;
        data.raw_set(key.to_lua(&lua)?, value)
    }

    pub fn erase(&self, key: &CompanionKey) -> LuaResult<LuaValue> {
        let old = self.get(key)?;
        if !old.is_nil() {
            self.set(key, LuaValue::Nil)?;
        }
        Ok(old)
    }

    pub fn contains(&self, key: &CompanionKey) -> bool {
        self.get(key).is_ok_and(|v| !v.is_nil())
    }

    /// The entry under `key`, creating it with `factory` when absent.
    ///
    /// `factory` runs at most once per call and may itself read or write
    /// other keys.
    pub fn get_or_create<F>(&self, key: &CompanionKey, factory: F) -> LuaResult<LuaValue>
    where
        F: FnOnce() -> LuaResult<LuaValue>,
    {
        let existing = self.get(key)?;
        if !existing.is_nil() {
            return Ok(existing);
        }
        let created = factory()?;
        // The factory may have stored the key itself; that entry wins.
        let existing = self.get(key)?;
        if !existing.is_nil() {
            return Ok(existing);
        }
        self.set(key, created.clone())?;
        Ok(created)
    }

    /// Script-visible field `name`, `Nil` when absent.
    pub fn value(&self, name: &str) -> LuaValue {
        self.get(&CompanionKey::tag(name)).unwrap_or(LuaValue::Nil)
    }

    /// Store a script field. Assigning nil erases it.
    pub fn set_value(&self, name: &str, value: LuaValue) -> LuaResult<()> {
        self.set(&CompanionKey::tag(name), value)
    }

    /// Every entry, ordered by key.
    pub fn entries(&self) -> Vec<(CompanionKey, LuaValue)> {
        let Some((_, data)) = self.data() else {
            return Vec::new();
        };
        let mut out: Vec<_> = data
            .pairs::<LuaValue, LuaValue>()
            .filter_map(|pair| pair.ok())
            .filter_map(|(k, v)| Some((CompanionKey::from_lua(&k)?, v)))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    pub fn keys(&self) -> Vec<CompanionKey> {
        self.entries().into_iter().map(|(k, _)| k).collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Pins ─────────────────────────────────────────────────────────

    fn pin_table(&self) -> Option<LuaTable> {
        match self.get(&CompanionKey::Children) {
            Ok(LuaValue::Table(t)) => Some(t),
            _ => None,
        }
    }

    /// Keep `child` alive for as long as this view's script data is.
    pub fn pin(&self, lua: &Lua, child: &View) -> LuaResult<()> {
        let ud = handle(lua, child)?;
        let pins = self.get_or_create(&CompanionKey::Children, || lua.create_table().map(LuaValue::Table))?;
        if let LuaValue::Table(pins) = pins {
            pins.raw_set(ud, true)?;
        }
        Ok(())
    }

    /// Drop the pin on `child`. Returns whether there was one.
    pub fn unpin(&self, child: &View) -> LuaResult<bool> {
        let Some(pins) = self.pin_table() else {
            return Ok(false);
        };
        let Some(lua) = self.0.lua.try_upgrade() else {
            return Ok(false);
        };
        let Some(ud) = existing_handle(&lua, handle_key(child))? else {
            return Ok(false);
        };
        let pinned = !pins.raw_get::<LuaValue>(&ud)?.is_nil();
        if pinned {
            pins.raw_set(ud, LuaValue::Nil)?;
        }
        Ok(pinned)
    }

    pub fn is_pinned(&self, child: &View) -> bool {
        let (Some(pins), Some(lua)) = (self.pin_table(), self.0.lua.try_upgrade()) else {
            return false;
        };
        match existing_handle(&lua, handle_key(child)) {
            Ok(Some(ud)) => pins.raw_get::<LuaValue>(ud).is_ok_and(|v| !v.is_nil()),
            _ => false,
        }
    }

    pub fn clear_pins(&self) -> LuaResult<()> {
        if self.pin_table().is_some() {
            self.set(&CompanionKey::Children, LuaValue::Nil)?;
        }
        Ok(())
    }

    pub fn pin_count(&self) -> usize {
        self.pin_table().map_or(0, |t| t.pairs::<LuaValue, LuaValue>().count())
    }

    // ── Native ownership ─────────────────────────────────────────────

    pub fn is_anchored(&self) -> bool {
        self.0.anchor.borrow().is_some()
    }

    /// Hold or release the handle strongly.
    pub(crate) fn set_anchored(&self, anchored: bool) {
        if !anchored {
            let released = self.0.anchor.borrow_mut().take();
            drop(released);
            return;
        }
        if self.is_anchored() {
            return;
        }
        let Some(lua) = self.0.lua.try_upgrade() else {
            return;
        };
        let Ok(Some(ud)) = existing_handle(&lua, self.0.key) else {
            return;
        };
        if ud.borrow::<ViewHandle>().is_ok_and(|h| h.serial() == self.0.serial) {
            *self.0.anchor.borrow_mut() = Some(ud);
        }
    }

    pub(crate) fn is_forwarded(&self, kind: SignalKind) -> bool {
        self.0.forwarded.borrow().iter().any(|(k, _)| *k == kind)
    }

    pub(crate) fn record_forward(&self, kind: SignalKind, slot: SlotId) {
        self.0.forwarded.borrow_mut().push((kind, slot));
    }

    /// Disconnect the native slots this pairing installed and drop the anchor.
    pub(crate) fn release(&self, view: &View) {
        let forwarded = std::mem::take(&mut *self.0.forwarded.borrow_mut());
        for (kind, slot) in forwarded {
            view.disconnect(kind, slot);
        }
        self.set_anchored(false);
    }

    // ── Hooks ────────────────────────────────────────────────────────

    pub fn has_hook(&self, hook: Hook) -> bool {
        matches!(self.value(hook.name()), LuaValue::Function(_))
    }

    /// Call the override stored for `hook` with `(view, payload)`.
    pub fn call_hook(&self, view: &View, hook: Hook, payload: &Payload) -> Result<Option<HookReply>> {
        let LuaValue::Function(f) = self.value(hook.name()) else {
            return Ok(None);
        };
        tracing::trace!(view = %view, hook = %hook, "hook");
        let reply: LuaValue = f
            .call(SignalArgs(view.clone(), payload))
            .map_err(|e| Error::Callback { signal: hook.name().to_string(), message: e.to_string() })?;
        Ok(Some(match reply {
            LuaValue::Boolean(b) => HookReply::Bool(b),
            LuaValue::Integer(i) => HookReply::Number(i as f64),
            LuaValue::Number(n) => HookReply::Number(n),
            _ => HookReply::Unit,
        }))
    }
}

impl fmt::Debug for Companion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Companion")
            .field("anchored", &self.is_anchored())
            .field("keys", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::Container;
    use std::cell::Cell;

    /// A view exposed as the global `v`, with its companion.
    fn exposed(lua: &Lua, view: &View) -> Companion {
        lua.globals().set("v", view.clone()).unwrap();
        Companion::ensure(lua, view).unwrap()
    }

    #[test]
    fn get_or_create_runs_factory_once() {
        let lua = Lua::new();
        let view = View::plain();
        let companion = exposed(&lua, &view);
        let calls = Cell::new(0);
        let key = CompanionKey::tag("cb");
        let a = companion
            .get_or_create(&key, || {
                calls.set(calls.get() + 1);
                lua.create_table().map(LuaValue::Table)
            })
            .unwrap();
        let b = companion
            .get_or_create(&key, || {
                calls.set(calls.get() + 1);
                Ok(LuaValue::Boolean(true))
            })
            .unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(a.to_pointer(), b.to_pointer());
    }

    #[test]
    fn ensure_returns_same_pairing() {
        let lua = Lua::new();
        let view = View::plain();
        let a = exposed(&lua, &view);
        let b = Companion::ensure(&lua, &view).unwrap();
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn nil_erases_field() {
        let lua = Lua::new();
        let view = View::plain();
        let companion = exposed(&lua, &view);
        companion.set_value("x", LuaValue::Integer(5)).unwrap();
        assert!(matches!(companion.value("x"), LuaValue::Integer(5)));
        companion.set_value("x", LuaValue::Nil).unwrap();
        assert!(companion.value("x").is_nil());
        assert!(companion.is_empty());
    }

    #[test]
    fn tag_keys_are_unreachable_from_script() {
        let lua = Lua::new();
        let view = View::plain();
        let companion = exposed(&lua, &view);
        companion.set(&CompanionKey::Signal(SignalKind::Clicked), LuaValue::Boolean(true)).unwrap();
        let seen: LuaValue = lua.load("return v['signal:clicked']").eval().unwrap();
        assert!(seen.is_nil());
        assert_eq!(companion.keys(), vec![CompanionKey::Signal(SignalKind::Clicked)]);
    }

    #[test]
    fn pins_keep_children_alive() {
        let lua = Lua::new();
        let view = View::plain();
        let companion = exposed(&lua, &view);
        let child = View::plain();
        let weak = child.downgrade();
        companion.pin(&lua, &child).unwrap();
        companion.pin(&lua, &child).unwrap();
        drop(child);
        lua.gc_collect().unwrap();
        assert!(weak.is_alive());
        assert_eq!(companion.pin_count(), 1);
        companion.clear_pins().unwrap();
        lua.gc_collect().unwrap();
        lua.gc_collect().unwrap();
        assert!(!weak.is_alive());
    }

    #[test]
    fn owned_views_anchor_their_handle() {
        let lua = Lua::new();
        let parent = Container::vertical();
        let child = View::plain();
        lua.globals().set("c", child.clone()).unwrap();
        let companion = Companion::ensure(&lua, &child).unwrap();
        companion.set_value("x", LuaValue::Integer(1)).unwrap();
        assert!(!companion.is_anchored());

        parent.add_view(&child).unwrap();
        assert!(companion.is_anchored());
        lua.globals().set("c", LuaValue::Nil).unwrap();
        lua.gc_collect().unwrap();
        lua.gc_collect().unwrap();
        assert!(matches!(companion.value("x"), LuaValue::Integer(1)));

        child.detach();
        assert!(!companion.is_anchored());
    }

    #[test]
    fn collected_handle_ends_pairing() {
        let lua = Lua::new();
        let view = View::plain();
        let companion = exposed(&lua, &view);
        companion.set_value("x", LuaValue::Integer(1)).unwrap();
        lua.globals().set("v", LuaValue::Nil).unwrap();
        lua.gc_collect().unwrap();
        lua.gc_collect().unwrap();
        assert!(view.companion().is_none());
        assert!(companion.value("x").is_nil());
    }

    #[test]
    fn hook_reply_is_mapped() {
        let lua = Lua::new();
        let view = View::plain();
        let companion = exposed(&lua, &view);
        assert!(!companion.has_hook(Hook::ConsumesClick));
        let f: LuaFunction = lua.load("function(self) return true end").eval().unwrap();
        companion.set_value("consumesClick", LuaValue::Function(f)).unwrap();
        assert!(companion.has_hook(Hook::ConsumesClick));
        let reply = companion.call_hook(&view, Hook::ConsumesClick, &Payload::None).unwrap();
        assert_eq!(reply, Some(HookReply::Bool(true)));
    }

    #[test]
    fn failing_hook_reports_callback_error() {
        let lua = Lua::new();
        let view = View::plain();
        let companion = exposed(&lua, &view);
        let f: LuaFunction = lua.load("function() error('nope') end").eval().unwrap();
        companion.set_value("getContentMinimumWidth", LuaValue::Function(f)).unwrap();
        let err = companion.call_hook(&view, Hook::ContentMinimumWidth, &Payload::None).unwrap_err();
        assert!(matches!(err, Error::Callback { ref signal, .. } if signal == "getContentMinimumWidth"));
    }
}
