//! Global tables: `UI`, `Window`, `Clipboard`, platform flags, `SIGNAL_REMOVE`
//! and `clgDump`.

use mlua::prelude::*;

use super::companion::Companion;
use super::convert::{Args, ToScript};
use super::dump;
use super::expose::{self, window, CONTAINER_STYLE_NAME};
use super::forward::SIGNAL_REMOVE;
use crate::error::Error;
use crate::event::window::TouchscreenKeyboardPolicy;
use crate::geometry::Size;
use crate::view::{Payload, SignalKind, View};
use crate::widget::traits::LayoutKind;
use crate::widgets::Container;

/// Build a table of functions from `(name, fn)` pairs.
fn table_of<F>(lua: &Lua, entries: Vec<(&'static str, F)>) -> LuaResult<LuaTable>
where
    F: Fn(&Lua, LuaMultiValue) -> LuaResult<LuaMultiValue> + 'static,
{
    let table = lua.create_table()?;
    for (name, f) in entries {
        table.set(name, lua.create_function(f)?)?;
    }
    Ok(table)
}

type Binding = Box<dyn Fn(&Lua, LuaMultiValue) -> LuaResult<LuaMultiValue>>;

fn binding<R: IntoLuaMulti>(
    name: &'static str,
    body: impl Fn(&Lua, &Args) -> LuaResult<R> + 'static,
) -> (&'static str, Binding) {
    let f: Binding = Box::new(move |lua, values| body(lua, &Args::new(name, values))?.into_lua_multi(lua));
    (name, f)
}

/// The removal sentinel: an empty table kept both as a global and in the
/// registry, compared by identity.
pub fn install_sentinel(lua: &Lua) -> LuaResult<()> {
    let sentinel = lua.create_table()?;
    lua.set_named_registry_value(SIGNAL_REMOVE, &sentinel)?;
    lua.globals().set(SIGNAL_REMOVE, sentinel)
}

pub fn install_platform_flags(lua: &Lua) -> LuaResult<()> {
    let g = lua.globals();
    g.set("IS_32BIT", cfg!(target_pointer_width = "32"))?;
    g.set("IS_64BIT", cfg!(target_pointer_width = "64"))?;
    g.set("PLATFORM_WIN", cfg!(windows))?;
    g.set("PLATFORM_ANDROID", cfg!(target_os = "android"))?;
    g.set("PLATFORM_LINUX", cfg!(target_os = "linux"))?;
    g.set("PLATFORM_UNIX", cfg!(unix))?;
    g.set("PLATFORM_MACOS", cfg!(target_os = "macos"))?;
    g.set("PLATFORM_IOS", cfg!(target_os = "ios"))?;
    Ok(())
}

fn ui(lua: &Lua) -> LuaResult<LuaTable> {
    table_of(
        lua,
        vec![
            binding("setSurface", |lua, args| {
                args.arity(1, 1)?;
                let view: View = args.get(0)?;
                window(lua)?.set_surface(view);
                Ok(())
            }),
            // The previous surface comes back wrapped in a fresh container
            // that owns it, ready to be placed elsewhere.
            binding("stealSurface", |lua, _| {
                let Some(old) = window(lua)?.steal_surface() else {
                    return Ok(None);
                };
                let holder = Container::view(LayoutKind::Free);
                expose::adopt(lua, &holder, CONTAINER_STYLE_NAME, &[])?;
                holder.set_contents(&old)?;
                Companion::ensure(lua, &holder)?.pin(lua, &old)?;
                Ok(Some(holder))
            }),
        ],
    )
}

fn window_table(lua: &Lua) -> LuaResult<LuaTable> {
    table_of(
        lua,
        vec![
            binding("focusNextView", |lua, _| Ok(window(lua)?.focus_next()?)),
            binding("onKeyDown", |lua, args| {
                let callback: LuaFunction = args.get(0)?;
                window(lua)?.anchor().connect(SignalKind::WindowKeyDown, move |_, payload| {
                    let Payload::Key(key) = payload else {
                        return Ok(());
                    };
                    callback.call::<()>(key.name()).map_err(|e| Error::Callback {
                        signal: SignalKind::WindowKeyDown.name().to_string(),
                        message: e.to_string(),
                    })
                });
                Ok(())
            }),
            binding("getSize", |lua, _| window(lua)?.size().to_script(lua)),
            binding("getDpiRatio", |lua, _| Ok(window(lua)?.dpi_ratio())),
            binding("setScalingParams", |lua, args| {
                args.arity(1, 2)?;
                let factor: f32 = args.get(0)?;
                let window = window(lua)?;
                window.set_dpi_ratio(factor);
                if let Some(min) = args.opt::<Size>(1)? {
                    let size = window.size();
                    window.resize(Size::new(size.width.max(min.width), size.height.max(min.height)));
                }
                Ok(())
            }),
            binding("showTouchscreenKeyboard", |lua, _| {
                window(lua)?.show_touchscreen_keyboard();
                Ok(())
            }),
            binding("hideTouchscreenKeyboard", |lua, _| {
                window(lua)?.hide_touchscreen_keyboard();
                Ok(())
            }),
            binding("setTouchscreenKeyboardPolicy", |lua, args| {
                window(lua)?.set_keyboard_policy(args.get::<TouchscreenKeyboardPolicy>(0)?);
                Ok(())
            }),
        ],
    )
}

fn clipboard(lua: &Lua) -> LuaResult<LuaTable> {
    table_of(
        lua,
        vec![
            binding("isEmpty", |lua, _| Ok(window(lua)?.clipboard_is_empty())),
            binding("copyToClipboard", |lua, args| {
                window(lua)?.copy_to_clipboard(args.get::<String>(0)?);
                Ok(())
            }),
            binding("pasteFromClipboard", |lua, _| Ok(window(lua)?.paste_from_clipboard())),
        ],
    )
}

/// Install `UI`, `Window`, `Clipboard`, `SIGNAL_REMOVE` and `clgDump`.
pub fn register(lua: &Lua) -> LuaResult<()> {
    install_sentinel(lua)?;
    let g = lua.globals();
    g.set("UI", ui(lua)?)?;
    g.set("Window", window_table(lua)?)?;
    g.set("Clipboard", clipboard(lua)?)?;
    g.set("clgDump", lua.create_function(|_, value: LuaValue| Ok(dump::render(&value)))?)?;
    tracing::debug!("globals registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::input::Key;
    use crate::event::window::Window;
    use crate::script::enums;

    fn lua() -> (Lua, Window) {
        let lua = Lua::new();
        let window = Window::new(Size::new(80, 24));
        lua.set_app_data(window.clone());
        enums::register_all(&lua).unwrap();
        expose::register(&lua).unwrap();
        register(&lua).unwrap();
        (lua, window)
    }

    #[test]
    fn platform_flags_match_target() {
        let lua = Lua::new();
        install_platform_flags(&lua).unwrap();
        let (b64, unix): (bool, bool) = lua.load("return IS_64BIT, PLATFORM_UNIX").eval().unwrap();
        assert_eq!(b64, cfg!(target_pointer_width = "64"));
        assert_eq!(unix, cfg!(unix));
    }

    #[test]
    fn set_and_steal_surface() {
        let (lua, window) = lua();
        lua.load("root = Vertical(Label('a')); UI.setSurface(root)").exec().unwrap();
        assert!(window.surface().is_some());
        let holder: View = lua.load("return UI.stealSurface()").eval().unwrap();
        assert!(window.surface().is_none());
        assert!(holder.has_style_name(CONTAINER_STYLE_NAME));
        assert_eq!(holder.child_count(), Some(1));
        let same: bool = lua.load("return UI.stealSurface() == nil").eval().unwrap();
        assert!(same);
    }

    #[test]
    fn window_key_listener_gets_key_names() {
        let (lua, window) = lua();
        lua.load("keys = {}; Window.onKeyDown(function(k) table.insert(keys, k) end)").exec().unwrap();
        window.key_down(Key::Char('q')).unwrap();
        window.key_down(Key::Enter).unwrap();
        let joined: String = lua.load("return table.concat(keys, ',')").eval().unwrap();
        assert_eq!(joined, "q,enter");
        window.anchor().disconnect_all(SignalKind::WindowKeyDown);
    }

    #[test]
    fn scaling_params_enforce_minimum_size() {
        let (lua, window) = lua();
        lua.load("Window.setScalingParams(2, { 100, 10 })").exec().unwrap();
        assert_eq!(window.dpi_ratio(), 2.0);
        assert_eq!(window.size(), Size::new(100, 24));
        let (w, h): (i32, i32) = lua.load("local s = Window.getSize() return s[1], s[2]").eval().unwrap();
        assert_eq!((w, h), (100, 24));
    }

    #[test]
    fn clipboard_round_trip() {
        let (lua, _) = lua();
        let (empty, text): (bool, String) = lua
            .load("local e = Clipboard.isEmpty(); Clipboard.copyToClipboard('hi'); return e, Clipboard.pasteFromClipboard()")
            .eval()
            .unwrap();
        assert!(empty);
        assert_eq!(text, "hi");
    }

    #[test]
    fn keyboard_policy_and_visibility() {
        let (lua, window) = lua();
        lua.load("Window.setTouchscreenKeyboardPolicy(TouchscreenKeyboardPolicy.MANUAL); Window.showTouchscreenKeyboard()")
            .exec()
            .unwrap();
        assert_eq!(window.keyboard_policy(), TouchscreenKeyboardPolicy::Manual);
        assert!(window.is_keyboard_visible());
    }

    #[test]
    fn dump_is_global() {
        let (lua, _) = lua();
        let s: String = lua.load("return clgDump({ 1, 2 })").eval().unwrap();
        assert_eq!(s, "[1, 2]");
    }
}
