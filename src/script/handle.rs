//! Script handle of a native view.
//!
//! Each view has at most one canonical [`ViewHandle`] userdata at a time,
//! found through a weak-valued registry table keyed by view id. The handle
//! owns one strong reference to the view and carries the view's script data
//! table as its user value, so everything script code hangs off a view is
//! traced by the Lua collector. Unknown fields read and write that table,
//! which is also where per-instance hook overrides land.

use std::sync::atomic::{AtomicU64, Ordering};

use mlua::prelude::*;
use mlua::{MetaMethod, UserData, UserDataMethods};
use slotmap::Key;

use super::companion::Companion;
use super::convert::{FromScript, ToScript};
use super::expose;
use crate::error::ConversionError;
use crate::view::{Hook, Payload, View};

const HANDLES: &str = "gilt.handles";

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

/// Userdata wrapper around a [`View`].
pub struct ViewHandle {
    view: View,
    serial: u64,
}

impl ViewHandle {
    pub fn view(&self) -> &View {
        &self.view
    }

    /// Distinguishes successive handles of the same view.
    pub(crate) fn serial(&self) -> u64 {
        self.serial
    }
}

impl Drop for ViewHandle {
    fn drop(&mut self) {
        // Script data lived in this handle; the pairing made for it ends here.
        self.view.release_companion(self.serial);
    }
}

impl UserData for ViewHandle {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        expose::add_view_methods(methods);

        methods.add_meta_method(MetaMethod::Index, |_, this, key: LuaValue| {
            let LuaValue::String(key) = key else {
                return Ok(LuaValue::Nil);
            };
            let key = key.to_str()?;
            Ok(this.view.companion().map_or(LuaValue::Nil, |c| c.value(&key)))
        });

        methods.add_meta_method(MetaMethod::NewIndex, |lua, this, (key, value): (String, LuaValue)| {
            if let Some(hook) = Hook::from_name(&key) {
                tracing::trace!(view = %this.view, hook = %hook, set = !value.is_nil(), "hook override");
            }
            Companion::ensure(lua, &this.view)?.set_value(&key, value)
        });

        methods.add_meta_method(MetaMethod::Eq, |_, this, other: LuaAnyUserData| {
            Ok(other.borrow::<ViewHandle>().is_ok_and(|o| o.view.ptr_eq(&this.view)))
        });

        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| Ok(this.view.to_string()));
    }
}

/// Registry table of canonical handles: view id to userdata, weak values.
fn handles(lua: &Lua) -> LuaResult<LuaTable> {
    if let Some(table) = lua.named_registry_value::<Option<LuaTable>>(HANDLES)? {
        return Ok(table);
    }
    let table = lua.create_table()?;
    let meta = lua.create_table()?;
    meta.raw_set("__mode", "v")?;
    table.set_metatable(Some(meta))?;
    lua.set_named_registry_value(HANDLES, &table)?;
    Ok(table)
}

pub(crate) fn handle_key(view: &View) -> i64 {
    view.id().data().as_ffi() as i64
}

/// The live canonical handle registered under `key`, if any.
pub(crate) fn existing_handle(lua: &Lua, key: i64) -> LuaResult<Option<LuaAnyUserData>> {
    handles(lua)?.raw_get(key)
}

/// The canonical handle of `view`, created on first use.
pub fn handle(lua: &Lua, view: &View) -> LuaResult<LuaAnyUserData> {
    let handles = handles(lua)?;
    let key = handle_key(view);
    if let Some(ud) = handles.raw_get::<Option<LuaAnyUserData>>(key)? {
        return Ok(ud);
    }
    // Any pairing still on the view belongs to a collected handle whose
    // script data is gone.
    view.release_companion_any();
    let serial = NEXT_SERIAL.fetch_add(1, Ordering::Relaxed);
    let ud = lua.create_userdata(ViewHandle { view: view.clone(), serial })?;
    handles.raw_set(key, &ud)?;
    Ok(ud)
}

impl IntoLua for View {
    fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
        handle(lua, &self).map(LuaValue::UserData)
    }
}

impl FromLua for View {
    fn from_lua(value: LuaValue, _lua: &Lua) -> LuaResult<Self> {
        Ok(View::from_script(&value)?)
    }
}

impl FromScript for View {
    const TYPE_NAME: &'static str = "View";

    fn from_script(value: &LuaValue) -> Result<Self, ConversionError> {
        view_of(value).ok_or_else(|| ConversionError::new("View", value.type_name(), "view expected"))
    }
}

/// The view behind `value`, if it is a view handle.
pub fn view_of(value: &LuaValue) -> Option<View> {
    match value {
        LuaValue::UserData(ud) => ud.borrow::<ViewHandle>().ok().map(|h| h.view.clone()),
        _ => None,
    }
}

/// The view behind a userdata receiver.
pub fn receiver(ud: &LuaAnyUserData) -> LuaResult<View> {
    Ok(ud.borrow::<ViewHandle>()?.view.clone())
}

/// Callback arguments for a signal or hook: the view first, then the
/// payload's values.
pub struct SignalArgs<'a>(pub View, pub &'a Payload);

impl IntoLuaMulti for SignalArgs<'_> {
    fn into_lua_multi(self, lua: &Lua) -> LuaResult<LuaMultiValue> {
        let SignalArgs(view, payload) = self;
        let mut values = vec![view.into_lua(lua)?];
        match payload {
            Payload::None => {}
            Payload::Position(p) => values.push(p.to_script(lua)?),
            Payload::Size(s) => values.push(s.to_script(lua)?),
            Payload::Geometry(r) => {
                values.push(r.origin.to_script(lua)?);
                values.push(r.size.to_script(lua)?);
            }
            Payload::Pointer(e) => {
                let t = lua.create_table()?;
                t.set("position", e.position.to_script(lua)?)?;
                t.set("button", e.button)?;
                t.set("triggerClick", e.trigger_click)?;
                values.push(LuaValue::Table(t));
            }
            Payload::Button(b) => values.push(b.into_lua(lua)?),
            Payload::Key(k) => values.push(k.name().into_lua(lua)?),
            Payload::Scroll(e) => {
                let t = lua.create_table()?;
                t.set("origin", e.origin.to_script(lua)?)?;
                t.set("delta", e.delta.to_script(lua)?)?;
                t.set("kinetic", e.kinetic)?;
                values.push(LuaValue::Table(t));
            }
            Payload::Child(v) => values.push(v.clone().into_lua(lua)?),
            Payload::Bool(b) => values.push(LuaValue::Boolean(*b)),
            Payload::Number(n) => values.push(LuaValue::Number(*n)),
            Payload::Text(s) => values.push(s.as_str().into_lua(lua)?),
        }
        Ok(LuaMultiValue::from_iter(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::input::{Key, PointerButton, PointerEvent};
    use crate::geometry::Offset;

    #[test]
    fn handles_compare_by_identity() {
        let lua = Lua::new();
        let view = View::plain();
        lua.globals().set("a", view.clone()).unwrap();
        lua.globals().set("b", view.clone()).unwrap();
        lua.globals().set("c", View::plain()).unwrap();
        let (same, different): (bool, bool) = lua.load("return a == b, a == c").eval().unwrap();
        assert!(same);
        assert!(!different);
    }

    #[test]
    fn one_canonical_handle_per_view() {
        let lua = Lua::new();
        let view = View::plain();
        lua.globals().set("a", view.clone()).unwrap();
        lua.globals().set("b", view.clone()).unwrap();
        let same: bool = lua.load("return rawequal(a, b)").eval().unwrap();
        assert!(same);
    }

    #[test]
    fn collected_handle_is_replaced() {
        let lua = Lua::new();
        let view = View::plain();
        lua.globals().set("v", view.clone()).unwrap();
        lua.load("v.answer = 42").exec().unwrap();
        lua.globals().set("v", LuaValue::Nil).unwrap();
        lua.gc_collect().unwrap();
        lua.gc_collect().unwrap();
        assert!(view.companion().is_none());

        lua.globals().set("v", view.clone()).unwrap();
        let answer: LuaValue = lua.load("return v.answer").eval().unwrap();
        assert!(answer.is_nil());
    }

    #[test]
    fn unknown_fields_live_in_companion() {
        let lua = Lua::new();
        let view = View::plain();
        lua.globals().set("v", view.clone()).unwrap();
        lua.load("v.answer = 42").exec().unwrap();
        let answer: i64 = lua.load("return v.answer").eval().unwrap();
        assert_eq!(answer, 42);
        assert!(view.companion().is_some());
        let missing: LuaValue = lua.load("return v.nothing").eval().unwrap();
        assert!(missing.is_nil());
    }

    #[test]
    fn script_handle_keeps_view_alive() {
        let lua = Lua::new();
        let view = View::plain();
        let weak = view.downgrade();
        lua.globals().set("v", view).unwrap();
        assert!(weak.is_alive());
        lua.globals().set("v", LuaValue::Nil).unwrap();
        lua.gc_collect().unwrap();
        lua.gc_collect().unwrap();
        assert!(!weak.is_alive());
    }

    #[test]
    fn signal_args_flatten_payload() {
        let lua = Lua::new();
        let view = View::plain();
        let f: LuaFunction = lua
            .load("function(v, e) return e.position[1], e.position[2], tostring(e.button), e.triggerClick end")
            .eval()
            .unwrap();
        let mut event = PointerEvent::new(Offset::new(3, 4), PointerButton::Right);
        event.trigger_click = true;
        let (x, y, button, click): (i32, i32, String, bool) =
            f.call(SignalArgs(view.clone(), &Payload::Pointer(event))).unwrap();
        assert_eq!((x, y, button.as_str(), click), (3, 4, "PointerButton.RIGHT", true));

        let g: LuaFunction = lua.load("function(v, k) return k end").eval().unwrap();
        let key: String = g.call(SignalArgs(view, &Payload::Key(Key::Enter))).unwrap();
        assert_eq!(key, Key::Enter.name());
    }
}
