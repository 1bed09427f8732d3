//! Forwarding native signals into script callbacks.
//!
//! For every (view, signal) pair at most one native slot is connected; it
//! dispatches to an ordered [`SubscriberList`] kept in the view's script
//! data. The slot itself holds nothing but a weak reference to the Lua state,
//! so callbacks stay visible to the collector. A simple forward is a list
//! holding a single callback that is replaced on every attach. Once a list
//! holds callbacks of one mode, attaching in the other mode is rejected.
//!
//! Dispatch walks a snapshot of subscriber ids. Callbacks appended during a
//! dispatch run from the next dispatch on; callbacks removed during a
//! dispatch (by another callback or by dropping the list) are skipped. A
//! callback returning `SIGNAL_REMOVE` is removed after it returns.

use std::fmt;

use mlua::prelude::*;

use super::companion::{Companion, CompanionKey};
use super::handle::SignalArgs;
use crate::error::{Error, Result};
use crate::view::{Payload, SignalKind, View};

/// Registry key of the removal sentinel.
pub const SIGNAL_REMOVE: &str = "SIGNAL_REMOVE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardMode {
    /// One callback; attaching replaces it.
    Simple,
    /// Any number of callbacks; attaching appends.
    List,
}

impl ForwardMode {
    fn name(self) -> &'static str {
        match self {
            ForwardMode::Simple => "simple",
            ForwardMode::List => "list",
        }
    }
}

impl fmt::Display for ForwardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered script callbacks of one forwarded signal.
///
/// Backed by a Lua table `{ mode, next, items = { { id, callback }, ... } }`.
#[derive(Clone)]
pub struct SubscriberList(LuaTable);

impl SubscriberList {
    pub fn new(lua: &Lua) -> LuaResult<Self> {
        let table = lua.create_table()?;
        table.raw_set("items", lua.create_table()?)?;
        table.raw_set("next", 0)?;
        Ok(Self(table))
    }

    fn items(&self) -> LuaResult<LuaTable> {
        self.0.raw_get("items")
    }

    pub fn len(&self) -> usize {
        self.items().map_or(0, |t| t.raw_len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mode of the current callbacks; `None` while empty.
    pub fn mode(&self) -> Option<ForwardMode> {
        if self.is_empty() {
            return None;
        }
        match self.0.raw_get::<Option<String>>("mode").ok()??.as_str() {
            "simple" => Some(ForwardMode::Simple),
            "list" => Some(ForwardMode::List),
            _ => None,
        }
    }

    /// Add `callback` in `mode`. Returns its id.
    pub fn attach(&self, lua: &Lua, mode: ForwardMode, callback: LuaFunction) -> Result<u64> {
        if let Some(current) = self.mode().filter(|m| *m != mode) {
            return Err(Error::invalid(
                "connect",
                format!("signal already has {current} subscribers, cannot attach a {mode} forward"),
            ));
        }
        let id = self.0.raw_get::<u64>("next")? + 1;
        self.0.raw_set("next", id)?;
        self.0.raw_set("mode", mode.name())?;
        let entry = lua.create_table()?;
        entry.raw_set("id", id)?;
        entry.raw_set("callback", callback)?;
        match mode {
            ForwardMode::Simple => {
                let items = lua.create_table()?;
                items.raw_push(entry)?;
                self.0.raw_set("items", items)?;
            }
            ForwardMode::List => self.items()?.raw_push(entry)?,
        }
        Ok(id)
    }

    fn position(items: &LuaTable, id: u64) -> LuaResult<Option<i64>> {
        for (i, entry) in items.sequence_values::<LuaTable>().enumerate() {
            if entry?.raw_get::<u64>("id")? == id {
                return Ok(Some(i as i64 + 1));
            }
        }
        Ok(None)
    }

    pub fn remove(&self, id: u64) -> Result<bool> {
        let items = self.items()?;
        match Self::position(&items, id)? {
            Some(index) => {
                items.raw_remove(index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drop every callback. The native slot stays connected and does nothing.
    pub fn clear(&self) -> Result<()> {
        Ok(self.items()?.clear()?)
    }

    fn callback(&self, id: u64) -> LuaResult<Option<LuaFunction>> {
        let items = self.items()?;
        match Self::position(&items, id)? {
            Some(index) => items.raw_get::<LuaTable>(index)?.raw_get("callback").map(Some),
            None => Ok(None),
        }
    }

    fn ids(&self) -> LuaResult<Vec<u64>> {
        self.items()?
            .sequence_values::<LuaTable>()
            .map(|entry| entry?.raw_get("id"))
            .collect()
    }

    /// Call every subscriber with `(view, payload...)`. Stops at the first
    /// failing callback.
    pub fn dispatch(&self, view: &View, kind: SignalKind, payload: &Payload, sentinel: &LuaValue) -> Result<()> {
        let ids = self.ids()?;
        tracing::trace!(signal = %kind, view = %view, subscribers = ids.len(), "dispatch");
        for id in ids {
            let Some(callback) = self.callback(id)? else {
                continue;
            };
            let ret: LuaValue = callback
                .call(SignalArgs(view.clone(), payload))
                .map_err(|e| Error::Callback { signal: kind.name().to_string(), message: e.to_string() })?;
            if is_sentinel(&ret, sentinel) {
                self.remove(id)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SubscriberList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberList").field("mode", &self.mode()).field("len", &self.len()).finish()
    }
}

fn is_sentinel(value: &LuaValue, sentinel: &LuaValue) -> bool {
    match (value, sentinel) {
        (LuaValue::Table(_), LuaValue::Table(_)) => value.to_pointer() == sentinel.to_pointer(),
        _ => false,
    }
}

/// The removal sentinel stored in the Lua registry, `Nil` if never installed.
pub fn sentinel(lua: &Lua) -> LuaValue {
    lua.named_registry_value(SIGNAL_REMOVE).unwrap_or(LuaValue::Nil)
}

/// The subscriber list of `kind` on `view`, if one was created.
pub fn subscribers(view: &View, kind: SignalKind) -> Option<SubscriberList> {
    match view.companion()?.get(&CompanionKey::Signal(kind)).ok()? {
        LuaValue::Table(t) => Some(SubscriberList(t)),
        _ => None,
    }
}

/// The subscriber list of `kind` on `view`, connecting its native slot on
/// first use.
pub fn subscriber_list(lua: &Lua, view: &View, kind: SignalKind) -> Result<SubscriberList> {
    let companion = Companion::ensure(lua, view)?;
    let entry = companion.get_or_create(&CompanionKey::Signal(kind), || {
        SubscriberList::new(lua).map(|list| LuaValue::Table(list.0))
    })?;
    let LuaValue::Table(table) = entry else {
        return Err(Error::invalid(
            "connect",
            format!("companion key for {kind} holds a {}", entry.type_name()),
        ));
    };
    if !companion.is_forwarded(kind) {
        let weak = lua.weak();
        let slot = view.connect(kind, move |view, payload| {
            let Some(lua) = weak.try_upgrade() else {
                return Ok(());
            };
            match subscribers(view, kind) {
                Some(list) => list.dispatch(view, kind, payload, &sentinel(&lua)),
                None => Ok(()),
            }
        });
        companion.record_forward(kind, slot);
        tracing::debug!(signal = %kind, view = %view, "forward connected");
    }
    Ok(SubscriberList(table))
}

/// Append `callback` to the callbacks of `kind`.
pub fn forward_list(lua: &Lua, view: &View, kind: SignalKind, callback: LuaFunction) -> Result<()> {
    let list = subscriber_list(lua, view, kind)?;
    list.attach(lua, ForwardMode::List, callback.clone())?;
    before_connected(view, kind, &callback)
}

/// Make `callback` the only callback of `kind`.
pub fn forward_simple(lua: &Lua, view: &View, kind: SignalKind, callback: LuaFunction) -> Result<()> {
    let list = subscriber_list(lua, view, kind)?;
    list.attach(lua, ForwardMode::Simple, callback.clone())?;
    before_connected(view, kind, &callback)
}

/// Forget every script callback of `kind`.
pub fn drop_forward(view: &View, kind: SignalKind) -> Result<()> {
    match subscribers(view, kind) {
        Some(list) => list.clear(),
        None => Ok(()),
    }
}

pub fn forward_count(view: &View, kind: SignalKind) -> usize {
    subscribers(view, kind).map_or(0, |l| l.len())
}

/// Live-property signals deliver their present value to a new callback.
fn before_connected(view: &View, kind: SignalKind, callback: &LuaFunction) -> Result<()> {
    if !matches!(kind, SignalKind::PositionChanged | SignalKind::SizeChanged) {
        return Ok(());
    }
    let Some(current) = view.current_value(kind) else {
        return Ok(());
    };
    callback
        .call::<()>(SignalArgs(view.clone(), &current))
        .map_err(|e| Error::Callback { signal: kind.name().to_string(), message: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Offset;

    fn lua_with_sentinel() -> Lua {
        let lua = Lua::new();
        let sentinel = lua.create_table().unwrap();
        lua.set_named_registry_value(SIGNAL_REMOVE, &sentinel).unwrap();
        lua.globals().set(SIGNAL_REMOVE, sentinel).unwrap();
        lua.globals().set("log", lua.create_table().unwrap()).unwrap();
        lua
    }

    fn recorder(lua: &Lua, tag: &str, remove: bool) -> LuaFunction {
        let src = format!(
            "function() table.insert(log, '{tag}') {} end",
            if remove { "return SIGNAL_REMOVE" } else { "" }
        );
        lua.load(src).eval().unwrap()
    }

    /// A plain view reachable from script as `v`.
    fn exposed(lua: &Lua) -> View {
        let view = View::plain();
        lua.globals().set("v", view.clone()).unwrap();
        view
    }

    fn log(lua: &Lua) -> Vec<String> {
        let t: LuaTable = lua.globals().get("log").unwrap();
        let out = t.sequence_values::<String>().map(|v| v.unwrap()).collect();
        lua.globals().set("log", lua.create_table().unwrap()).unwrap();
        out
    }

    #[test]
    fn self_removal_keeps_order() {
        let lua = lua_with_sentinel();
        let view = exposed(&lua);
        forward_list(&lua, &view, SignalKind::Clicked, recorder(&lua, "A", false)).unwrap();
        forward_list(&lua, &view, SignalKind::Clicked, recorder(&lua, "B", true)).unwrap();
        forward_list(&lua, &view, SignalKind::Clicked, recorder(&lua, "C", false)).unwrap();

        view.emit(SignalKind::Clicked, Payload::None).unwrap();
        assert_eq!(log(&lua), ["A", "B", "C"]);
        view.emit(SignalKind::Clicked, Payload::None).unwrap();
        assert_eq!(log(&lua), ["A", "C"]);
        assert_eq!(view.connection_count(SignalKind::Clicked), 1);
    }

    #[test]
    fn simple_forward_replaces() {
        let lua = lua_with_sentinel();
        let view = exposed(&lua);
        forward_simple(&lua, &view, SignalKind::Clicked, recorder(&lua, "old", false)).unwrap();
        forward_simple(&lua, &view, SignalKind::Clicked, recorder(&lua, "new", false)).unwrap();
        view.emit(SignalKind::Clicked, Payload::None).unwrap();
        assert_eq!(log(&lua), ["new"]);
    }

    #[test]
    fn mixing_modes_is_rejected() {
        let lua = lua_with_sentinel();
        let view = exposed(&lua);
        forward_list(&lua, &view, SignalKind::Clicked, recorder(&lua, "a", false)).unwrap();
        let err = forward_simple(&lua, &view, SignalKind::Clicked, recorder(&lua, "b", false)).unwrap_err();
        assert!(matches!(err, Error::InvalidOperation { .. }));
        assert_eq!(forward_count(&view, SignalKind::Clicked), 1);

        drop_forward(&view, SignalKind::Clicked).unwrap();
        forward_simple(&lua, &view, SignalKind::Clicked, recorder(&lua, "b", false)).unwrap();
        view.emit(SignalKind::Clicked, Payload::None).unwrap();
        assert_eq!(log(&lua), ["b"]);
    }

    #[test]
    fn append_during_dispatch_runs_next_time() {
        let lua = lua_with_sentinel();
        let view = exposed(&lua);
        let late = recorder(&lua, "late", false);
        let adder = {
            let v = view.downgrade();
            lua.create_function(move |lua, ()| {
                if let Some(view) = v.upgrade() {
                    forward_list(lua, &view, SignalKind::Clicked, late.clone())?;
                }
                Ok(())
            })
            .unwrap()
        };
        forward_list(&lua, &view, SignalKind::Clicked, adder).unwrap();
        view.emit(SignalKind::Clicked, Payload::None).unwrap();
        assert!(log(&lua).is_empty());
        view.emit(SignalKind::Clicked, Payload::None).unwrap();
        assert_eq!(log(&lua), ["late"]);
    }

    #[test]
    fn drop_empties_list() {
        let lua = lua_with_sentinel();
        let view = exposed(&lua);
        forward_list(&lua, &view, SignalKind::Pressed, recorder(&lua, "x", false)).unwrap();
        drop_forward(&view, SignalKind::Pressed).unwrap();
        view.emit(SignalKind::Pressed, Payload::None).unwrap();
        assert!(log(&lua).is_empty());
        assert_eq!(view.connection_count(SignalKind::Pressed), 1);
    }

    #[test]
    fn error_stops_dispatch() {
        let lua = lua_with_sentinel();
        let view = exposed(&lua);
        let bad: LuaFunction = lua.load("function() error('bad') end").eval().unwrap();
        forward_list(&lua, &view, SignalKind::Clicked, bad).unwrap();
        forward_list(&lua, &view, SignalKind::Clicked, recorder(&lua, "after", false)).unwrap();
        let err = view.emit(SignalKind::Clicked, Payload::None).unwrap_err();
        assert!(matches!(err, Error::Callback { ref signal, .. } if signal == "clicked"));
        assert!(log(&lua).is_empty());
    }

    #[test]
    fn position_callbacks_see_current_value() {
        let lua = lua_with_sentinel();
        let view = exposed(&lua);
        view.set_position(Offset::new(7, 9));
        let f: LuaFunction = lua.load("function(v, pos) table.insert(log, pos[1] .. ',' .. pos[2]) end").eval().unwrap();
        forward_list(&lua, &view, SignalKind::PositionChanged, f).unwrap();
        assert_eq!(log(&lua), ["7,9"]);
    }

    #[test]
    fn callback_may_reemit_its_own_signal() {
        let lua = lua_with_sentinel();
        let view = exposed(&lua);
        let depth = std::rc::Rc::new(std::cell::Cell::new(0));
        let reemit = {
            let v = view.downgrade();
            let depth = depth.clone();
            lua.create_function(move |lua, ()| {
                depth.set(depth.get() + 1);
                let log: LuaTable = lua.globals().get("log")?;
                log.raw_push(format!("A{}", depth.get()))?;
                if depth.get() == 1 {
                    if let Some(view) = v.upgrade() {
                        view.emit(SignalKind::Clicked, Payload::None)?;
                    }
                }
                Ok(())
            })
            .unwrap()
        };
        forward_list(&lua, &view, SignalKind::Clicked, reemit).unwrap();
        forward_list(&lua, &view, SignalKind::Clicked, recorder(&lua, "B", false)).unwrap();
        view.emit(SignalKind::Clicked, Payload::None).unwrap();
        assert_eq!(log(&lua), ["A1", "A2", "B", "B"]);
    }

    #[test]
    fn drop_during_dispatch_skips_later_subscribers() {
        let lua = lua_with_sentinel();
        let view = exposed(&lua);
        let dropper = {
            let v = view.downgrade();
            lua.create_function(move |lua, ()| {
                let log: LuaTable = lua.globals().get("log")?;
                log.raw_push("B")?;
                if let Some(view) = v.upgrade() {
                    drop_forward(&view, SignalKind::Clicked)?;
                }
                Ok(())
            })
            .unwrap()
        };
        forward_list(&lua, &view, SignalKind::Clicked, recorder(&lua, "A", false)).unwrap();
        forward_list(&lua, &view, SignalKind::Clicked, dropper).unwrap();
        forward_list(&lua, &view, SignalKind::Clicked, recorder(&lua, "C", false)).unwrap();
        view.emit(SignalKind::Clicked, Payload::None).unwrap();
        assert_eq!(log(&lua), ["A", "B"]);
        view.emit(SignalKind::Clicked, Payload::None).unwrap();
        assert!(log(&lua).is_empty());
    }

    #[test]
    fn released_pairing_disconnects_forward() {
        let lua = lua_with_sentinel();
        let view = exposed(&lua);
        forward_list(&lua, &view, SignalKind::Clicked, recorder(&lua, "A", false)).unwrap();
        assert_eq!(view.connection_count(SignalKind::Clicked), 1);
        lua.globals().set("v", LuaValue::Nil).unwrap();
        lua.gc_collect().unwrap();
        lua.gc_collect().unwrap();
        assert_eq!(view.connection_count(SignalKind::Clicked), 0);
        assert_eq!(forward_count(&view, SignalKind::Clicked), 0);
    }
}
