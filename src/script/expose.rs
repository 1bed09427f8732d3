//! Exposure layer: the methods every script view has, and the global widget
//! factories.
//!
//! Common methods live on the [`ViewHandle`] userdata. Widget-specific
//! methods (`Button:setText`, `Slider:onValueChanged`, ...) are plain Lua
//! functions copied into each instance's script data by its factory, so a
//! script can replace them per instance by assigning the same key.
//!
//! Every child added through this surface is also pinned in the parent's
//! script data and unpinned when removed through it.

use mlua::prelude::*;
use mlua::UserDataMethods;

use super::companion::Companion;
use super::composite;
use super::convert::{Args, FromScript, ToScript};
use super::dump;
use super::forward::{drop_forward, forward_list, forward_simple};
use super::handle::{handle, receiver, view_of, ViewHandle};
use super::resolver::apply_style;
use crate::animation::Animator;
use crate::error::{Error, Result};
use crate::event::window::Window;
use crate::geometry::{Offset, Size};
use crate::style::metric::Metric;
use crate::style::property::{CursorStyle, Visibility};
use crate::view::hook::Hook;
use crate::view::{SignalKind, View};
use crate::widget::traits::LayoutKind;
use crate::widgets::{
    Button, Checkbox, Container, Input, Label, NumberPicker, Progressbar, Slider, Spacer, TextArea, TextInputAction,
    TextInputType,
};

/// Style name every script-created container carries.
pub const CONTAINER_STYLE_NAME: &str = "ViewContainer";

/// Attach/drop method names per forwarded signal.
const SIGNALS: &[(&str, &str, SignalKind)] = &[
    ("geometryChanged", "dropGeometryChanged", SignalKind::GeometryChanged),
    ("positionChanged", "dropPositionChanged", SignalKind::PositionChanged),
    ("sizeChanged", "dropSizeChanged", SignalKind::SizeChanged),
    ("clicked", "dropClicked", SignalKind::Clicked),
    ("clickedRight", "dropClickedRight", SignalKind::ClickedRight),
    ("clickedRightOrLongPressed", "dropClickedRightOrLongPressed", SignalKind::ClickedRightOrLongPressed),
    ("clickedButton", "dropClickedButton", SignalKind::ClickedButton),
    ("focused", "dropFocused", SignalKind::Focused),
    ("unfocused", "dropUnfocused", SignalKind::Unfocused),
    ("addOnKeyDown", "dropAddOnKeyDown", SignalKind::KeyDown),
    ("addOnKeyUp", "dropAddOnKeyUp", SignalKind::KeyUp),
    ("onChildFocused", "dropOnChildFocused", SignalKind::ChildFocused),
    ("addOnScroll", "dropOnScroll", SignalKind::Scrolled),
    ("pressed", "dropPressed", SignalKind::Pressed),
    ("released", "dropReleased", SignalKind::Released),
];

/// The window the Lua state drives.
pub fn window(lua: &Lua) -> Result<Window> {
    lua.app_data_ref::<Window>()
        .map(|w| (*w).clone())
        .ok_or_else(|| Error::invalid("window", "no window attached to this Lua state"))
}

/// Subscribe `callback` to `kind`. Attach methods always append.
pub fn connect(lua: &Lua, view: &View, kind: SignalKind, callback: LuaFunction) -> Result<()> {
    forward_list(lua, view, kind, callback)
}

/// Make `callback` the only script subscriber of `kind`, for the
/// `on...Callback` setters. Fails if `kind` already has attached callbacks.
pub fn replace(lua: &Lua, view: &View, kind: SignalKind, callback: LuaFunction) -> Result<()> {
    forward_simple(lua, view, kind, callback)
}

pub(crate) fn pin(lua: &Lua, parent: &View, child: &View) -> LuaResult<()> {
    Companion::ensure(lua, parent)?.pin(lua, child)
}

pub(crate) fn unpin(parent: &View, child: &View) -> LuaResult<()> {
    if let Some(companion) = parent.companion() {
        companion.unpin(child)?;
    }
    Ok(())
}

pub(crate) fn add_child(lua: &Lua, parent: &View, child: &View) -> LuaResult<()> {
    parent.add_view(child)?;
    pin(lua, parent, child)
}

/// Split the receiver off a method call.
fn split(name: &'static str, mut values: LuaMultiValue) -> LuaResult<(LuaAnyUserData, Args)> {
    match values.pop_front() {
        Some(LuaValue::UserData(ud)) if ud.is::<ViewHandle>() => Ok((ud, Args::new(name, values))),
        other => {
            let actual = other.as_ref().map_or("no value", LuaValue::type_name);
            Err(Error::type_mismatch(format!("View (receiver of {name})"), actual).into())
        }
    }
}

/// A method that returns its receiver.
fn builder<M>(methods: &mut M, name: &'static str, body: impl Fn(&Lua, &View, &Args) -> LuaResult<()> + 'static)
where
    M: UserDataMethods<ViewHandle>,
{
    methods.add_function(name, move |lua, values: LuaMultiValue| {
        let (ud, args) = split(name, values)?;
        body(lua, &receiver(&ud)?, &args)?;
        Ok(ud)
    });
}

fn getter<M, R>(methods: &mut M, name: &'static str, body: impl Fn(&Lua, &View, &Args) -> LuaResult<R> + 'static)
where
    M: UserDataMethods<ViewHandle>,
    R: IntoLuaMulti,
{
    methods.add_function(name, move |lua, values: LuaMultiValue| {
        let (ud, args) = split(name, values)?;
        body(lua, &receiver(&ud)?, &args)
    });
}

fn set_cursor(view: &View, args: &Args) -> Result<()> {
    match args.opt::<String>(0)? {
        Some(name) => view.set_cursor(Some(CursorStyle { name, size: Some(args.opt::<i64>(1)?.unwrap_or(16) as i32) })),
        // Inherit.
        None => view.set_cursor(view.parent().and_then(|p| p.cursor())),
    }
    Ok(())
}

/// Methods shared by every view handle.
pub fn add_view_methods<M: UserDataMethods<ViewHandle>>(methods: &mut M) {
    for &(attach, detach, kind) in SIGNALS {
        builder(methods, attach, move |lua, view, args| Ok(connect(lua, view, kind, args.get(0)?)?));
        builder(methods, detach, move |_, view, _| {
            drop_forward(view, kind)?;
            Ok(())
        });
    }

    builder(methods, "focus", |lua, view, _| Ok(window(lua)?.focus(view)?));
    builder(methods, "setStyle", |_, view, args| Ok(apply_style(view, &args.get::<LuaTable>(0)?)?));
    builder(methods, "setEnabled", |_, view, args| {
        view.set_enabled(args.opt(0)?.unwrap_or(true));
        Ok(())
    });
    builder(methods, "setVisibility", |_, view, args| {
        view.set_visibility(args.get::<Visibility>(0)?);
        Ok(())
    });
    builder(methods, "setBlockClicksWhenPressed", |_, view, args| {
        view.set_block_clicks_when_pressed(args.get(0)?);
        Ok(())
    });

    // ── Structure ────────────────────────────────────────────────────

    builder(methods, "inflateView", |lua, view, args| {
        let child: View = args.get(0)?;
        if view.is_container() {
            view.set_contents(&child)?;
            let companion = Companion::ensure(lua, view)?;
            companion.clear_pins()?;
            companion.pin(lua, &child)?;
        }
        Ok(())
    });
    builder(methods, "removeAllViews", |_, view, _| {
        if view.is_container() {
            view.remove_all_views()?;
            if let Some(companion) = view.companion() {
                companion.clear_pins()?;
            }
        }
        Ok(())
    });
    builder(methods, "addView", |lua, view, args| {
        let Some(child) = args.opt::<View>(0)? else {
            return Err(Error::invalid("addView", "view expected, got nil").into());
        };
        add_child(lua, view, &child)
    });
    builder(methods, "addViewAtIndex", |lua, view, args| {
        let child: View = args.get(0)?;
        let index: u32 = args.get(1)?;
        view.add_view_at(index as usize, &child)?;
        pin(lua, view, &child)
    });
    builder(methods, "addViewCustomLayout", |lua, view, args| {
        let child: View = args.get(0)?;
        view.add_view_custom_layout(&child)?;
        pin(lua, view, &child)
    });
    builder(methods, "removeView", |_, view, args| {
        let Some(child) = args.opt::<View>(0)? else {
            return Ok(());
        };
        view.remove_view(&child)?;
        unpin(view, &child)
    });
    builder(methods, "removeViewAtIndex", |_, view, args| {
        let index: u32 = args.get(0)?;
        let size = view
            .child_count()
            .ok_or_else(|| Error::invalid("removeViewAtIndex", "called on non-container type"))?;
        if index == 0 || index as usize > size {
            return Err(Error::invalid("removeViewAtIndex", format!("index {index} out of range 1..={size}")).into());
        }
        let child = view.remove_view_at(index as usize - 1)?;
        unpin(view, &child)
    });
    getter(methods, "getViewAtIndex", |_, view, args| {
        let index: i64 = args.get(0)?;
        Ok(usize::try_from(index).ok().and_then(|i| i.checked_sub(1)).and_then(|i| view.view_at_index(i)))
    });
    getter(methods, "size", |_, view, _| Ok(view.child_count()));
    getter(methods, "getParent", |_, view, _| Ok(view.parent()));
    getter(methods, "getViews", |_, view, _| Ok(view.children()));
    builder(methods, "visitViewsRecursive", |_, view, args| {
        let callback: LuaFunction = args.get(0)?;
        let descendants = view.descendants();
        for v in descendants.into_iter().skip(1) {
            callback.call::<()>(v)?;
        }
        Ok(())
    });
    getter(methods, "visitViewsUnderPos", |lua, _, args| {
        let pos: Offset = args.get(0)?;
        let callback: LuaFunction = args.get(1)?;
        for v in window(lua)?.views_under(pos) {
            if callback.call::<bool>(v)? {
                return Ok(true);
            }
        }
        Ok(false)
    });
    getter(methods, "getViewAt", |lua, _, args| Ok(window(lua)?.view_at(args.get(0)?)));
    builder(methods, "updateLayout", |lua, _, _| Ok(window(lua)?.update_layout()?));
    getter(methods, "mapLocalCoordsToGlobal", |lua, view, args| {
        view.map_local_to_global(args.get(0)?).to_script(lua)
    });
    methods.add_function("iter", |lua, this: LuaAnyUserData| {
        receiver(&this)?;
        let next = lua.create_function(|_, (view, index): (View, usize)| {
            Ok(match view.view_at_index(index) {
                Some(child) => (Some(index + 1), Some(child)),
                None => (None, None),
            })
        })?;
        Ok((next, this, 0))
    });

    // ── Geometry ─────────────────────────────────────────────────────

    builder(methods, "setPos", |_, view, args| {
        view.set_position(args.get(0)?);
        Ok(())
    });
    getter(methods, "getPos", |lua, view, _| view.position().to_script(lua));
    builder(methods, "setSize", |_, view, args| {
        view.set_size(args.get::<Size>(0)?);
        Ok(())
    });
    getter(methods, "getSize", |lua, view, _| view.size().to_script(lua));
    getter(methods, "getMinimumSize", |lua, view, _| view.minimum_size().to_script(lua));
    builder(methods, "expanding", |_, view, _| {
        view.set_expanding(true);
        Ok(())
    });

    // ── Style and state ──────────────────────────────────────────────

    builder(methods, "addStylesheetName", |_, view, args| {
        for i in 0..args.len() {
            view.add_style_name(&args.get::<String>(i)?);
        }
        Ok(())
    });
    builder(methods, "removeStylesheetName", |_, view, args| {
        for i in 0..args.len() {
            view.remove_style_name(&args.get::<String>(i)?);
        }
        Ok(())
    });
    getter(methods, "isPressed", |_, view, _| Ok(view.is_pressed()));
    builder(methods, "setCursor", |_, view, args| Ok(set_cursor(view, args)?));
    builder(methods, "setCursorWithSize", |_, view, args| Ok(set_cursor(view, args)?));
    builder(methods, "setAnimator", |_, view, args| {
        view.set_animator(args.opt::<Animator>(0)?);
        Ok(())
    });
    builder(methods, "dump", |_, view, _| {
        match view.companion() {
            Some(companion) => tracing::info!(view = %view, "dump(): {}", describe(&companion)),
            None => tracing::info!(view = %view, "dump(): no companion"),
        }
        Ok(())
    });
}

/// Every script data entry, values rendered like `dump` renders tables.
fn describe(companion: &Companion) -> String {
    let entries: Vec<String> = companion
        .entries()
        .iter()
        .map(|(key, value)| format!("{key} = {}", dump::render(value)))
        .collect();
    format!("{{ {} }}", entries.join(", "))
}

// ---------------------------------------------------------------------------
// Factories
// ---------------------------------------------------------------------------

/// The `isValidText` override for `predicate`, which takes the text alone.
/// The wrapper is a Lua closure so the collector can see what it holds.
fn text_predicate(lua: &Lua, predicate: Option<LuaFunction>) -> LuaResult<LuaValue> {
    let Some(predicate) = predicate else {
        return Ok(LuaValue::Nil);
    };
    lua.load("local predicate = ...; return function(_, text) return predicate(text) end")
        .set_name("=isValidTextPredicate")
        .call(predicate)
}

type Extra = (&'static str, LuaFunction);

/// Give a freshly built view its script data, its type's style name and the
/// type's extra methods. Returns the handle, which the caller holds until the
/// view reaches script code.
pub fn adopt(lua: &Lua, view: &View, name: &str, extra: &[Extra]) -> LuaResult<LuaAnyUserData> {
    let ud = handle(lua, view)?;
    let companion = Companion::ensure(lua, view)?;
    view.add_style_name(name);
    for (key, f) in extra {
        companion.set_value(key, LuaValue::Function(f.clone()))?;
    }
    Ok(ud)
}

/// Collects the extra methods of one widget type, then registers its factory.
pub struct WidgetExposer<'lua> {
    lua: &'lua Lua,
    name: &'static str,
    extra: Vec<Extra>,
}

impl<'lua> WidgetExposer<'lua> {
    pub fn new(lua: &'lua Lua, name: &'static str) -> Self {
        Self { lua, name, extra: Vec::new() }
    }

    /// An extra method returning its receiver.
    pub fn builder(
        mut self,
        name: &'static str,
        body: impl Fn(&Lua, &View, &Args) -> LuaResult<()> + 'static,
    ) -> LuaResult<Self> {
        let f = self.lua.create_function(move |lua, values: LuaMultiValue| {
            let (ud, args) = split(name, values)?;
            body(lua, &receiver(&ud)?, &args)?;
            Ok(ud)
        })?;
        self.extra.push((name, f));
        Ok(self)
    }

    /// An extra method returning a value.
    pub fn method<R: IntoLuaMulti>(
        mut self,
        name: &'static str,
        body: impl Fn(&Lua, &View, &Args) -> LuaResult<R> + 'static,
    ) -> LuaResult<Self> {
        let f = self.lua.create_function(move |lua, values: LuaMultiValue| {
            let (ud, args) = split(name, values)?;
            body(lua, &receiver(&ud)?, &args)
        })?;
        self.extra.push((name, f));
        Ok(self)
    }

    /// Register the global factory. `make` builds the native view from the
    /// checked arguments.
    pub fn ctor(self, make: impl Fn(&Args) -> Result<View> + 'static) -> LuaResult<()> {
        self.ctor_holding(move |args| Ok((make(args)?, Vec::new())))
    }

    /// Like [`ctor`](Self::ctor), for views built around views the script
    /// passed in: `make` returns those next to the new view, and they are
    /// pinned to it.
    pub fn ctor_holding(self, make: impl Fn(&Args) -> Result<(View, Vec<View>)> + 'static) -> LuaResult<()> {
        let WidgetExposer { lua, name, extra } = self;
        tracing::debug!(widget = name, extra_methods = extra.len(), "expose");
        let factory = lua.create_function(move |lua, values: LuaMultiValue| {
            let args = Args::new(name, values);
            let (view, held) = make(&args)?;
            let ud = adopt(lua, &view, name, &extra)?;
            for child in &held {
                pin(lua, &view, child)?;
            }
            Ok(ud)
        })?;
        lua.globals().set(name, factory)
    }
}

/// Children of a container factory call: a single list of views, or the
/// arguments themselves. `nil` and `false` entries are skipped in both, so a
/// hole in the list does not end it.
fn fill_container(lua: &Lua, name: &str, container: &View, args: &Args) -> LuaResult<()> {
    if let [LuaValue::Table(list)] = args.values() {
        let len = list.raw_len();
        if len == 0 {
            return Ok(());
        }
        let mut added = false;
        for i in 1..=len {
            let item: LuaValue = list.raw_get(i)?;
            if let Some(child) = view_of(&item) {
                add_child(lua, container, &child)?;
                added = true;
            }
        }
        if added {
            return Ok(());
        }
    }
    for value in args.values() {
        match value {
            LuaValue::Nil | LuaValue::Boolean(false) => {}
            other => match view_of(other) {
                Some(child) => add_child(lua, container, &child)?,
                None => return Err(Error::invalid(name, "only view or nil expected in argument list").into()),
            },
        }
    }
    Ok(())
}

fn new_container(lua: &Lua, name: &'static str, view: View) -> LuaResult<(View, LuaAnyUserData)> {
    let ud = adopt(lua, &view, name, &[])?;
    view.add_style_name(CONTAINER_STYLE_NAME);
    Ok((view, ud))
}

/// Register a factory taking children like `Vertical` does. `make` builds the
/// empty container.
pub(crate) fn register_container(lua: &Lua, name: &'static str, make: fn() -> View) -> LuaResult<()> {
    let factory = lua.create_function(move |lua, values: LuaMultiValue| {
        let args = Args::new(name, values);
        let (view, ud) = new_container(lua, name, make())?;
        fill_container(lua, name, &view, &args)?;
        Ok(ud)
    })?;
    lua.globals().set(name, factory)
}

/// `Grid { {a, b}, {c, d} }`: every row must have the same column count.
fn grid(lua: &Lua, args: &Args) -> LuaResult<LuaAnyUserData> {
    args.arity(1, 1)?;
    let rows: LuaTable = args.get(0)?;
    let mut columns: Option<usize> = None;
    let mut cells = Vec::new();
    for (r, row) in rows.sequence_values::<LuaValue>().enumerate() {
        let row = row.map_err(|e| Error::invalid("Grid", e.to_string()))?;
        let row = LuaTable::from_script(&row)
            .map_err(|_| Error::type_mismatch(format!("table (row {} of Grid)", r + 1), row.type_name()))?;
        let count = row.raw_len();
        let expected = *columns.get_or_insert(count);
        if count != expected {
            return Err(Error::invalid(
                "Grid",
                format!("row {} has different column count: expected {expected}, got {count}", r + 1),
            ).into());
        }
        for c in 1..=count {
            let cell: LuaValue = row.raw_get(c).map_err(|e| Error::invalid("Grid", e.to_string()))?;
            cells.push(View::from_script(&cell)?);
        }
    }
    let columns = u16::try_from(columns.unwrap_or(1).max(1)).unwrap_or(u16::MAX);
    let (view, ud) = new_container(lua, "Grid", Container::view(LayoutKind::Grid { columns }))?;
    for cell in &cells {
        add_child(lua, &view, cell)?;
    }
    Ok(ud)
}

/// `AbsoluteLayout { { view = v, pos = {x, y} }, ... }`. Holes are skipped.
fn absolute_layout(lua: &Lua, args: &Args) -> LuaResult<LuaAnyUserData> {
    args.arity(1, 1)?;
    let items: LuaTable = args.get(0)?;
    let (view, ud) = new_container(lua, "AbsoluteLayout", Container::view(LayoutKind::Absolute))?;
    for i in 1..=items.raw_len() {
        let item: LuaValue = items.raw_get(i)?;
        if item.is_nil() {
            continue;
        }
        let item = LuaTable::from_script(&item)?;
        let get = |key: &str| item.get::<LuaValue>(key).map_err(|e| Error::invalid("AbsoluteLayout", e.to_string()));
        let child = View::from_script(&get("view")?)?;
        child.set_position(Offset::from_script(&get("pos")?)?);
        add_child(lua, &view, &child)?;
    }
    Ok(ud)
}

pub(crate) fn plain_factory(
    lua: &Lua,
    name: &'static str,
    make: fn(&Lua, &Args) -> LuaResult<LuaAnyUserData>,
) -> LuaResult<()> {
    let factory = lua.create_function(move |lua, values: LuaMultiValue| make(lua, &Args::new(name, values)))?;
    lua.globals().set(name, factory)
}

/// Install every widget and container factory.
pub fn register(lua: &Lua) -> LuaResult<()> {
    WidgetExposer::new(lua, "View").ctor(|args| {
        args.arity(0, 0)?;
        Ok(View::plain())
    })?;

    WidgetExposer::new(lua, "Button")
        .builder("setText", |_, view, args| {
            let text: String = args.get(0)?;
            Ok(view.downcast::<Button, _>("Button", |b| b.set_label(text))?)
        })?
        .method("getText", |_, view, _| Ok(view.downcast::<Button, _>("Button", |b| b.label().to_string())?))?
        .ctor(|args| {
            args.arity(1, 1)?;
            Ok(View::new(Button::new(args.get::<String>(0)?)))
        })?;

    WidgetExposer::new(lua, "Label")
        .builder("setText", |_, view, args| {
            let text: String = args.get(0)?;
            Ok(view.downcast::<Label, _>("Label", |l| l.set_text(text))?)
        })?
        .method("getText", |_, view, _| {
            view.downcast::<Label, _>("Label", |_| ())?;
            Ok(view.text())
        })?
        .ctor(|args| {
            args.arity(1, 1)?;
            Ok(View::new(Label::new(args.get::<String>(0)?)))
        })?;

    let input_text = |_: &Lua, view: &View, _: &Args| -> LuaResult<String> {
        Ok(view.downcast::<Input, _>("Input", |i| i.value().to_string())?)
    };
    let input_signal = |kind: SignalKind| {
        move |lua: &Lua, view: &View, args: &Args| -> LuaResult<()> {
            view.downcast::<Input, _>("Input", |_| ())?;
            Ok(connect(lua, view, kind, args.get(0)?)?)
        }
    };
    let input_type = |_: &Lua, view: &View, args: &Args| -> LuaResult<()> {
        let t: TextInputType = args.get(0)?;
        Ok(view.downcast::<Input, _>("Input", |i| i.set_input_type(t))?)
    };
    let input_action = |_: &Lua, view: &View, args: &Args| -> LuaResult<()> {
        let a: TextInputAction = args.get(0)?;
        Ok(view.downcast::<Input, _>("Input", |i| i.set_input_action(a))?)
    };
    let input_callback = |kind: SignalKind| {
        move |lua: &Lua, view: &View, args: &Args| -> LuaResult<()> {
            view.downcast::<Input, _>("Input", |_| ())?;
            Ok(replace(lua, view, kind, args.get(0)?)?)
        }
    };
    WidgetExposer::new(lua, "Input")
        .builder("setText", |_, view, args| {
            let text: String = args.get(0)?;
            Ok(view.downcast::<Input, _>("Input", |i| i.set_value(text))?)
        })?
        .method("getText", input_text)?
        .method("text", input_text)?
        .builder("onTextChanged", input_signal(SignalKind::TextChanged))?
        .builder("onTextChanging", input_signal(SignalKind::TextChanging))?
        .builder("onTextChangedCallback", input_callback(SignalKind::TextChanged))?
        .builder("onTextChangingCallback", input_callback(SignalKind::TextChanging))?
        .builder("onEnterPressed", input_signal(SignalKind::EnterPressed))?
        .builder("actionButtonPressed", input_signal(SignalKind::ActionButtonPressed))?
        .builder("dropActionButtonPressed", |_, view, _| {
            view.downcast::<Input, _>("Input", |_| ())?;
            Ok(drop_forward(view, SignalKind::ActionButtonPressed)?)
        })?
        .builder("isValidTextPredicate", |lua, view, args| {
            view.downcast::<Input, _>("Input", |_| ())?;
            let predicate = text_predicate(lua, args.opt(0)?)?;
            Companion::ensure(lua, view)?.set_value(Hook::IsValidText.name(), predicate)
        })?
        .builder("setPasswordMode", |_, view, args| {
            let password: bool = args.opt(0)?.unwrap_or(true);
            Ok(view.downcast::<Input, _>("Input", |i| i.set_password_mode(password))?)
        })?
        .builder("selectAll", |_, view, _| Ok(view.downcast::<Input, _>("Input", Input::select_all)?))?
        .builder("setInputType", input_type)?
        .builder("setTextInputType", input_type)?
        .builder("setInputAction", input_action)?
        .builder("setTextInputAction", input_action)?
        .ctor(|args| {
            args.arity(0, 1)?;
            Ok(View::new(Input::new(args.opt::<String>(0)?.unwrap_or_default())))
        })?;

    let area_text = |_: &Lua, view: &View, _: &Args| -> LuaResult<String> {
        Ok(view.downcast::<TextArea, _>("TextArea", |t| t.value().to_string())?)
    };
    let area_signal = |kind: SignalKind, replacing: bool| {
        move |lua: &Lua, view: &View, args: &Args| -> LuaResult<()> {
            view.downcast::<TextArea, _>("TextArea", |_| ())?;
            let callback: LuaFunction = args.get(0)?;
            Ok(if replacing { replace(lua, view, kind, callback) } else { connect(lua, view, kind, callback) }?)
        }
    };
    WidgetExposer::new(lua, "TextArea")
        .builder("setText", |_, view, args| {
            let text: String = args.get(0)?;
            Ok(view.downcast::<TextArea, _>("TextArea", |t| t.set_value(text))?)
        })?
        .method("text", area_text)?
        .method("getText", area_text)?
        .builder("onTextChangedCallback", area_signal(SignalKind::TextChanged, true))?
        .builder("onTextChangingCallback", area_signal(SignalKind::TextChanging, true))?
        .builder("onEnterPressed", area_signal(SignalKind::EnterPressed, false))?
        .builder("actionButtonPressed", area_signal(SignalKind::ActionButtonPressed, false))?
        .builder("dropActionButtonPressed", |_, view, _| {
            view.downcast::<TextArea, _>("TextArea", |_| ())?;
            Ok(drop_forward(view, SignalKind::ActionButtonPressed)?)
        })?
        .builder("selectAll", |_, view, _| Ok(view.downcast::<TextArea, _>("TextArea", TextArea::select_all)?))?
        .builder("setTextInputAction", |_, view, args| {
            let a: TextInputAction = args.get(0)?;
            Ok(view.downcast::<TextArea, _>("TextArea", |t| t.set_input_action(a))?)
        })?
        .ctor(|args| {
            args.arity(0, 1)?;
            Ok(View::new(TextArea::new(args.opt::<String>(0)?.unwrap_or_default())))
        })?;

    let picker_callback = |kind: SignalKind| {
        move |lua: &Lua, view: &View, args: &Args| -> LuaResult<()> {
            view.downcast::<NumberPicker, _>("NumberPicker", |_| ())?;
            Ok(replace(lua, view, kind, args.get(0)?)?)
        }
    };
    WidgetExposer::new(lua, "NumberPicker")
        .builder("setValue", |_, view, args| {
            let value: i64 = args.get(0)?;
            Ok(view.downcast::<NumberPicker, _>("NumberPicker", |p| p.set_value(value))?)
        })?
        .builder("setMin", |_, view, args| {
            let min: i64 = args.get(0)?;
            Ok(view.downcast::<NumberPicker, _>("NumberPicker", |p| p.set_min(min))?)
        })?
        .builder("setMax", |_, view, args| {
            let max: i64 = args.get(0)?;
            Ok(view.downcast::<NumberPicker, _>("NumberPicker", |p| p.set_max(max))?)
        })?
        .builder("onValueChangedCallback", picker_callback(SignalKind::ValueChanged))?
        .builder("onValueChangingCallback", picker_callback(SignalKind::ValueChanging))?
        .method("value", |_, view, _| Ok(view.downcast::<NumberPicker, _>("NumberPicker", |p| p.value())?))?
        .method("text", |_, view, _| {
            Ok(view.downcast::<NumberPicker, _>("NumberPicker", |p| p.text().to_string())?)
        })?
        .ctor(|args| {
            args.arity(0, 1)?;
            Ok(View::new(NumberPicker::new(args.opt(0)?.unwrap_or(0))))
        })?;

    WidgetExposer::new(lua, "Checkbox")
        .builder("setChecked", |_, view, args| {
            let checked: bool = args.opt(0)?.unwrap_or(true);
            Ok(view.perform::<Checkbox>("Checkbox", |c| c.set_checked(checked))?)
        })?
        .method("isChecked", |_, view, _| Ok(view.downcast::<Checkbox, _>("Checkbox", |c| c.is_checked())?))?
        .builder("checked", |lua, view, args| {
            view.downcast::<Checkbox, _>("Checkbox", |_| ())?;
            Ok(connect(lua, view, SignalKind::Checked, args.get(0)?)?)
        })?
        .builder("disableCheckingOnClick", |_, view, _| {
            view.downcast::<Checkbox, _>("Checkbox", Checkbox::disable_checking_on_click)?;
            drop_forward(view, SignalKind::Checked)?;
            Ok(())
        })?
        .ctor(|args| {
            args.arity(0, 1)?;
            Ok(View::new(Checkbox::new(args.opt(0)?.unwrap_or(false))))
        })?;

    let progress_value =
        |_: &Lua, view: &View, _: &Args| -> LuaResult<f32> { Ok(view.downcast::<Progressbar, _>("Progressbar", |p| p.value())?) };
    WidgetExposer::new(lua, "Progressbar")
        .method("value", progress_value)?
        .method("getValue", progress_value)?
        .builder("setValue", |_, view, args| {
            let value: f32 = args.get(0)?;
            Ok(view.downcast::<Progressbar, _>("Progressbar", |p| p.set_value(value))?)
        })?
        .ctor(|args| {
            args.arity(0, 1)?;
            Ok(View::new(Progressbar::new(args.opt(0)?.unwrap_or(0.0))))
        })?;
    WidgetExposer::new(lua, "CircleProgressbar")
        .method("value", progress_value)?
        .method("getValue", progress_value)?
        .builder("setValue", |_, view, args| {
            let value: f32 = args.get(0)?;
            Ok(view.downcast::<Progressbar, _>("Progressbar", |p| p.set_value(value))?)
        })?
        .ctor(|args| {
            args.arity(0, 1)?;
            Ok(View::new(Progressbar::circle(args.opt(0)?.unwrap_or(0.0))))
        })?;

    let slider_callback = |kind: SignalKind| {
        move |lua: &Lua, view: &View, args: &Args| -> LuaResult<()> {
            view.downcast::<Slider, _>("Slider", |_| ())?;
            Ok(replace(lua, view, kind, args.get(0)?)?)
        }
    };
    let slider_value = |_: &Lua, view: &View, _: &Args| -> LuaResult<f32> { Ok(view.downcast::<Slider, _>("Slider", |s| s.value())?) };
    WidgetExposer::new(lua, "Slider")
        .method("value", slider_value)?
        .method("getValue", slider_value)?
        .builder("setValue", |_, view, args| {
            let value: f32 = args.get(0)?;
            Ok(view.perform::<Slider>("Slider", |s| s.set_value(value))?)
        })?
        .builder("onValueChanged", |lua, view, args| {
            view.downcast::<Slider, _>("Slider", |_| ())?;
            Ok(connect(lua, view, SignalKind::ValueChanged, args.get(0)?)?)
        })?
        .builder("onValueChangedCallback", slider_callback(SignalKind::ValueChanged))?
        .builder("onValueChangingCallback", slider_callback(SignalKind::ValueChanging))?
        .ctor(|args| {
            args.arity(0, 1)?;
            Ok(View::new(Slider::new(args.opt(0)?.unwrap_or(0.0))))
        })?;

    WidgetExposer::new(lua, "Spacer").ctor(|args| {
        args.arity(0, 0)?;
        Ok(View::new(Spacer::flexible()))
    })?;
    WidgetExposer::new(lua, "SpacerFixed").ctor(|args| {
        args.arity(1, 1)?;
        Ok(View::new(Spacer::fixed(args.get::<Metric>(0)?)))
    })?;

    register_container(lua, "Vertical", Container::vertical)?;
    register_container(lua, "Horizontal", Container::horizontal)?;
    register_container(lua, "Stacked", || Container::view(LayoutKind::Stacked))?;
    register_container(lua, "Centered", || Container::view(LayoutKind::Centered))?;
    register_container(lua, CONTAINER_STYLE_NAME, || Container::view(LayoutKind::Free))?;
    plain_factory(lua, "Grid", grid)?;
    plain_factory(lua, "AbsoluteLayout", absolute_layout)?;
    composite::register(lua)?;
    tracing::debug!("widget factories registered");
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::script::{enums, forward, rules};
    use pretty_assertions::assert_eq;

    pub(crate) fn lua() -> Lua {
        let lua = Lua::new();
        let sentinel = lua.create_table().unwrap();
        lua.set_named_registry_value(forward::SIGNAL_REMOVE, &sentinel).unwrap();
        lua.globals().set(forward::SIGNAL_REMOVE, sentinel).unwrap();
        lua.set_app_data(Window::new(Size::new(200, 100)));
        enums::register_all(&lua).unwrap();
        rules::register(&lua).unwrap();
        register(&lua).unwrap();
        lua
    }

    /// Evaluate `src` and keep the resulting view reachable from script.
    pub(crate) fn view(lua: &Lua, src: &str) -> View {
        let value: LuaValue = lua.load(src).eval().unwrap();
        let kept: LuaTable = match lua.globals().get::<Option<LuaTable>>("kept").unwrap() {
            Some(t) => t,
            None => {
                let t = lua.create_table().unwrap();
                lua.globals().set("kept", &t).unwrap();
                t
            }
        };
        kept.raw_push(value.clone()).unwrap();
        View::from_lua(value, lua).unwrap()
    }

    #[test]
    fn factory_sets_companion_and_style_name() {
        let lua = lua();
        let b = view(&lua, "return Button('OK')");
        assert!(b.companion().is_some());
        assert_eq!(b.style_names(), vec!["Button"]);
        assert_eq!(b.text().as_deref(), Some("OK"));
    }

    #[test]
    fn extra_methods_chain_and_override_per_instance() {
        let lua = lua();
        let text: String = lua
            .load(
                r#"
                local a = Button('a'):setText('b')
                local c = Button('c')
                c.getText = function() return 'overridden' end
                c.getText = function() return 'again' end
                return a:getText() .. ' ' .. c:getText()
                "#,
            )
            .eval()
            .unwrap();
        assert_eq!(text, "b again");
    }

    #[test]
    fn wrong_constructor_arguments_are_type_mismatches() {
        let lua = lua();
        let err = lua.load("Button({})").exec().unwrap_err();
        assert!(err.to_string().contains("type mismatch: expected string (argument 1 of Button), got table"), "{err}");
        let err = lua.load("Button()").exec().unwrap_err();
        assert!(err.to_string().contains("type mismatch"), "{err}");
    }

    #[test]
    fn widget_method_on_other_widget_is_rejected() {
        let lua = lua();
        let err = lua.load("local b = Button('x'); Label('y').setText(b, 'z')").exec().unwrap_err();
        assert!(err.to_string().contains("type mismatch: expected Label, got Button"), "{err}");
    }

    #[test]
    fn container_accepts_list_or_varargs() {
        let lua = lua();
        let a = view(&lua, "return Vertical { Label('1'), Label('2') }");
        let b = view(&lua, "return Horizontal(Label('1'), nil, false, Label('2'))");
        assert_eq!(a.child_count(), Some(2));
        assert_eq!(b.child_count(), Some(2));
        assert!(a.has_style_name(CONTAINER_STYLE_NAME));
        assert_eq!(a.companion().unwrap().pin_count(), 2);
        let empty = view(&lua, "return Stacked {}");
        assert_eq!(empty.child_count(), Some(0));
    }

    #[test]
    fn holes_in_child_list_are_skipped() {
        let lua = lua();
        let size: usize = lua.load("return Vertical { Label('a'), nil, Label('b') }:size()").eval().unwrap();
        assert_eq!(size, 2);
        let first: String = lua.load("return Vertical { nil, Label('b') }:getViewAtIndex(1):getText()").eval().unwrap();
        assert_eq!(first, "b");
        let c = view(&lua, "return AbsoluteLayout { { view = Label('a'), pos = { 1, 1 } }, nil, { view = Label('b'), pos = { 2, 2 } } }");
        assert_eq!(c.child_count(), Some(2));
    }

    #[test]
    fn attach_methods_always_append() {
        let lua = lua();
        let v = view(&lua, "out = {}; return View()");
        lua.globals().set("v", v.clone()).unwrap();
        lua.load("v:clicked(function() table.insert(out, 'a') end):clicked(function() table.insert(out, 'b') end)")
            .exec()
            .unwrap();
        v.emit(SignalKind::Clicked, crate::view::Payload::None).unwrap();
        let out: String = lua.load("return table.concat(out)").eval().unwrap();
        assert_eq!(out, "ab");
        assert_eq!(forward::forward_count(&v, SignalKind::Clicked), 2);
    }

    #[test]
    fn dump_renders_script_data() {
        let lua = lua();
        let b = view(&lua, "local b = Button('x'); b.answer = 42; b.tags = { 'a', 'b' }; return b:dump()");
        let text = describe(&b.companion().unwrap());
        assert!(text.contains(r#"answer = 42"#), "{text}");
        assert!(text.contains(r#"tags = ["a", "b"]"#), "{text}");
        assert!(text.contains(r#"getText = "<function>""#), "{text}");
    }

    #[test]
    fn non_view_list_falls_through_to_argument_check() {
        let lua = lua();
        let err = lua.load("Vertical { 1, 2 }").exec().unwrap_err();
        assert!(err.to_string().contains("only view or nil expected in argument list"), "{err}");
    }

    #[test]
    fn structural_methods_use_script_indices() {
        let lua = lua();
        let (size, second, missing): (usize, String, bool) = lua
            .load(
                r#"
                local c = Vertical(Label('a'), Label('b'))
                c:addViewAtIndex(Label('first'), 0)
                c:removeViewAtIndex(2)
                return c:size(), c:getViewAtIndex(2):getText(), c:getViewAtIndex(5) == nil
                "#,
            )
            .eval()
            .unwrap();
        assert_eq!((size, second.as_str(), missing), (2, "b", true));
        let err = lua.load("Vertical():removeViewAtIndex(1)").exec().unwrap_err();
        assert!(err.to_string().contains("removeViewAtIndex"), "{err}");
    }

    #[test]
    fn leaf_structure_errors_name_the_operation() {
        let lua = lua();
        let err = lua.load("Button('x'):addView(Label('y'))").exec().unwrap_err();
        assert!(err.to_string().contains("addView: called on non-container type"), "{err}");
        let size: Option<usize> = lua.load("return Button('x'):size()").eval().unwrap();
        assert_eq!(size, None);
        lua.load("Button('x'):removeAllViews():inflateView(View())").exec().unwrap();
        lua.load("Vertical():removeView(nil)").exec().unwrap();
    }

    #[test]
    fn removing_unpins() {
        let lua = lua();
        let c = view(&lua, "c = Vertical(); l = Label('x'); c:addView(l); return c");
        let companion = c.companion().unwrap();
        assert_eq!(companion.pin_count(), 1);
        lua.load("c:removeView(l)").exec().unwrap();
        assert_eq!(companion.pin_count(), 0);
    }

    #[test]
    fn grid_requires_equal_rows() {
        let lua = lua();
        let g = view(&lua, "return Grid { { View(), View() }, { View(), View() } }");
        assert_eq!(g.child_count(), Some(4));
        assert!(g.is_container());
        let err = lua.load("Grid { { View(), View() }, { View() } }").exec().unwrap_err();
        assert!(err.to_string().contains("row 2 has different column count: expected 2, got 1"), "{err}");
        let empty = view(&lua, "return Grid {}");
        assert_eq!(empty.child_count(), Some(0));
    }

    #[test]
    fn absolute_layout_positions_children() {
        let lua = lua();
        let c = view(&lua, "return AbsoluteLayout { { view = Label('a'), pos = { 5, 7 } } }");
        assert_eq!(c.children()[0].position(), Offset::new(5, 7));
    }

    #[test]
    fn iter_walks_children_in_order() {
        let lua = lua();
        let joined: String = lua
            .load(
                r#"
                local out = {}
                for i, v in Vertical(Label('a'), Label('b')):iter() do
                    table.insert(out, i .. v:getText())
                end
                return table.concat(out, ',')
                "#,
            )
            .eval()
            .unwrap();
        assert_eq!(joined, "1a,2b");
    }

    #[test]
    fn checkbox_checked_forward_and_disable() {
        let lua = lua();
        let hits: i64 = lua
            .load(
                r#"
                local n = 0
                local c = Checkbox()
                c:checked(function(v, state) if state then n = n + 1 end end)
                c:setChecked(true):setChecked(false):setChecked(true)
                c:disableCheckingOnClick()
                c:setChecked(false):setChecked(true)
                return n
                "#,
            )
            .eval()
            .unwrap();
        assert_eq!(hits, 2);
    }

    #[test]
    fn position_changed_reports_current_value_immediately() {
        let lua = lua();
        let x: i64 = lua
            .load(
                r#"
                local seen = -1
                View():setPos({ 4, 2 }):positionChanged(function(v, p) seen = p[1] end)
                return seen
                "#,
            )
            .eval()
            .unwrap();
        assert_eq!(x, 4);
    }

    #[test]
    fn text_predicate_filters_typed_characters() {
        let lua = lua();
        let input = view(&lua, "return Input(''):isValidTextPredicate(function(text) return tonumber(text) ~= nil end)");
        let window = window(&lua).unwrap();
        window.focus(&input).unwrap();
        window.type_text("1a2").unwrap();
        assert_eq!(input.text().as_deref(), Some("12"));
        lua.globals().set("input", input.clone()).unwrap();
        lua.load("input:isValidTextPredicate(nil)").exec().unwrap();
        window.type_text("b").unwrap();
        assert_eq!(input.text().as_deref(), Some("12b"));
    }

    #[test]
    fn callback_setters_replace_the_previous_callback() {
        let lua = lua();
        let input = view(
            &lua,
            r#"
            out = {}
            return Input('')
                :onTextChangedCallback(function() table.insert(out, 'old') end)
                :onTextChangedCallback(function(_, text) table.insert(out, text) end)
            "#,
        );
        let window = window(&lua).unwrap();
        window.focus(&input).unwrap();
        window.type_text("a").unwrap();
        let out: String = lua.load("return table.concat(out, ',')").eval().unwrap();
        assert_eq!(out, "a");
        lua.globals().set("input", input).unwrap();
        let err = lua.load("input:onTextChanged(function() end)").exec().unwrap_err();
        assert!(err.to_string().contains("cannot attach a list forward"), "{err}");
    }

    #[test]
    fn password_mode_and_action_button() {
        let lua = lua();
        let input = view(
            &lua,
            "actions = 0; return Input('pw'):setPasswordMode():actionButtonPressed(function() actions = actions + 1 end)",
        );
        assert_eq!(input.with_widget(|w| w.text()).as_deref(), Some("••"));
        let window = window(&lua).unwrap();
        window.focus(&input).unwrap();
        window.key_down(crate::event::input::Key::Enter).unwrap();
        lua.globals().set("input", input.clone()).unwrap();
        lua.load("input:dropActionButtonPressed()").exec().unwrap();
        window.key_down(crate::event::input::Key::Enter).unwrap();
        let actions: i64 = lua.globals().get("actions").unwrap();
        assert_eq!(actions, 1);
        let text: String = lua.load("return input:selectAll():text()").eval().unwrap();
        assert_eq!(text, "pw");
    }

    #[test]
    fn text_area_reports_line_breaks() {
        let lua = lua();
        let area = view(&lua, "breaks = 0; return TextArea('a'):onEnterPressed(function() breaks = breaks + 1 end)");
        let window = window(&lua).unwrap();
        window.focus(&area).unwrap();
        window.type_text("\nb").unwrap();
        let breaks: i64 = lua.globals().get("breaks").unwrap();
        assert_eq!(breaks, 1);
        lua.globals().set("area", area).unwrap();
        let text: String = lua.load("return area:text()").eval().unwrap();
        assert_eq!(text, "a\nb");
    }

    #[test]
    fn number_picker_commits_on_focus_loss() {
        let lua = lua();
        let picker = view(
            &lua,
            r#"
            changing, changed = {}, {}
            return NumberPicker(5):setMax(50)
                :onValueChangingCallback(function(_, v) table.insert(changing, v) end)
                :onValueChangedCallback(function(_, v) table.insert(changed, v) end)
            "#,
        );
        let window = window(&lua).unwrap();
        window.focus(&picker).unwrap();
        window.type_text("9").unwrap();
        let (changing, changed): (usize, usize) = lua.load("return #changing, #changed").eval().unwrap();
        assert_eq!((changing, changed), (1, 0));
        window.clear_focus().unwrap();
        let value: i64 = lua.load("return changed[1]").eval().unwrap();
        assert_eq!(value, 50);
        lua.globals().set("picker", picker).unwrap();
        let (value, text): (i64, String) = lua.load("return picker:value(), picker:text()").eval().unwrap();
        assert_eq!((value, text.as_str()), (50, "50"));
    }

    #[test]
    fn slider_reports_changing_before_changed() {
        let lua = lua();
        let slider = view(
            &lua,
            r#"
            order = {}
            return Slider()
                :onValueChangingCallback(function() table.insert(order, 'changing') end)
                :onValueChangedCallback(function() table.insert(order, 'changed') end)
            "#,
        );
        lua.globals().set("slider", slider).unwrap();
        let order: String = lua.load("slider:setValue(0.5); return table.concat(order, ',')").eval().unwrap();
        assert_eq!(order, "changing,changed");
    }

    #[test]
    fn circle_progressbar_shares_progress_methods() {
        let lua = lua();
        let value: f32 = lua.load("return CircleProgressbar():setValue(0.5):value()").eval().unwrap();
        assert_eq!(value, 0.5);
        let bar = view(&lua, "return CircleProgressbar()");
        assert_eq!(bar.widget_type(), "CircleProgressbar");
        assert!(bar.has_style_name("CircleProgressbar"));
    }

    #[test]
    fn set_cursor_nil_inherits_parent() {
        let lua = lua();
        let child = view(
            &lua,
            "local c = Vertical():setCursor('hand.png', 24); local l = Label('x'); c:addView(l); l:setCursor(nil); return l",
        );
        assert_eq!(child.cursor(), Some(CursorStyle { name: "hand.png".into(), size: Some(24) }));
    }
}
