//! Factories of widgets built around views the script passes in: scroll
//! areas and scrollbars, page and tab views, rich text, model-driven lists
//! and drag and drop.
//!
//! Views handed to these factories are pinned to the new view, like
//! children added with `addView`.

use mlua::prelude::*;

use super::companion::Companion;
use super::convert::{Args, FromScript, ToScript};
use super::dump;
use super::expose::{adopt, connect, pin, plain_factory, register_container, unpin, WidgetExposer};
use super::handle::view_of;
use crate::error::{Error, Result};
use crate::geometry::Offset;
use crate::style::property::LayoutDirection;
use crate::view::{SignalKind, View};
use crate::widgets::{DragArea, DragHandle, Draggable, ForEach, PageView, ScrollArea, Scrollbar, TabView, Text, TextItem};

/// Style name of vertical scrollbars.
pub const VERTICAL_SCROLLBAR_STYLE_NAME: &str = "ScrollbarVertical";
/// Style name of horizontal scrollbars.
pub const HORIZONTAL_SCROLLBAR_STYLE_NAME: &str = "ScrollbarHorizontal";

// Script data of a `ForEachUI`.
const FOR_EACH_MODEL: &str = "forEachModel";
const FOR_EACH_FACTORY: &str = "forEachFactory";
const FOR_EACH_VIEWS: &str = "forEachViews";

// ---------------------------------------------------------------------------
// Scrolling
// ---------------------------------------------------------------------------

fn scrollbar(direction: LayoutDirection) -> Result<View> {
    let style = match direction {
        LayoutDirection::Vertical => VERTICAL_SCROLLBAR_STYLE_NAME,
        LayoutDirection::Horizontal => HORIZONTAL_SCROLLBAR_STYLE_NAME,
        LayoutDirection::None => {
            return Err(Error::invalid("Scrollbar", "direction must be HORIZONTAL or VERTICAL"));
        }
    };
    let view = View::new(Scrollbar::new(direction));
    view.add_style_name(style);
    Ok(view)
}

fn scrollbar_methods(exposer: WidgetExposer<'_>) -> LuaResult<WidgetExposer<'_>> {
    let forward = |kind: SignalKind| {
        move |lua: &Lua, view: &View, args: &Args| -> LuaResult<()> {
            view.downcast::<Scrollbar, _>("Scrollbar", |_| ())?;
            Ok(connect(lua, view, kind, args.get(0)?)?)
        }
    };
    exposer
        .builder("scrolled", forward(SignalKind::ScrollChanged))?
        .builder("updatedMaxScroll", forward(SignalKind::UpdatedMaxScroll))?
        .builder("triggeredManually", forward(SignalKind::TriggeredManually))?
        .builder("setScrollRatio", |_, view, args| {
            let ratio: f32 = args.get(0)?;
            Ok(view.perform::<Scrollbar>("Scrollbar", |b| b.set_scroll_ratio(ratio))?)
        })?
        .method("scroll", |_, view, _| Ok(view.downcast::<Scrollbar, _>("Scrollbar", |b| b.scroll())?))
}

/// A bar passed to `CustomScrollArea`, checked against its slot.
fn custom_bar(args: &Args, index: usize, direction: LayoutDirection) -> Result<Option<View>> {
    let Some(bar) = args.opt::<View>(index)? else {
        return Ok(None);
    };
    let actual = bar.downcast::<Scrollbar, _>("Scrollbar", |b| b.direction())?;
    if actual != direction {
        return Err(Error::invalid(
            "CustomScrollArea",
            format!("argument {} must be a {direction:?} scrollbar, got {actual:?}", index + 1),
        ));
    }
    Ok(Some(bar))
}

fn scroll_area_methods(exposer: WidgetExposer<'_>) -> LuaResult<WidgetExposer<'_>> {
    let ratio = |direction: LayoutDirection| {
        move |_: &Lua, view: &View, args: &Args| -> LuaResult<()> {
            let ratio: f32 = args.get(0)?;
            Ok(view.perform::<ScrollArea>("ScrollArea", |a| a.set_scroll_ratio(direction, ratio))?)
        }
    };
    exposer
        .method("scroll", |_, view, args| {
            let delta: Offset = args.get(0)?;
            Ok(view.perform::<ScrollArea>("ScrollArea", |a| a.set_scroll(a.scroll() + delta))?)
        })?
        .method("setScroll", |_, view, args| {
            let target: Offset = args.get(0)?;
            Ok(view.perform::<ScrollArea>("ScrollArea", |a| a.set_scroll(target))?)
        })?
        .builder("scrollTo", |_, view, args| {
            let target: View = args.get(0)?;
            Ok(ScrollArea::scroll_to(view, &target, args.opt(1)?.unwrap_or(true))?)
        })?
        .builder("setStickToEnd", |_, view, args| {
            let stick: bool = args.opt(0)?.unwrap_or(true);
            Ok(view.perform::<ScrollArea>("ScrollArea", |a| a.set_stick_to_end(stick))?)
        })?
        .builder("setScrollRatioX", ratio(LayoutDirection::Horizontal))?
        .builder("setScrollRatioY", ratio(LayoutDirection::Vertical))?
        .builder("setContent", |lua, view, args| {
            let content: View = args.get(0)?;
            view.downcast::<ScrollArea, _>("ScrollArea", |_| ())?;
            if let Some(old) = view.view_at_index(0) {
                unpin(view, &old)?;
            }
            ScrollArea::set_content(view, &content)?;
            pin(lua, view, &content)
        })?
        .builder("setWheelScrollable", |_, view, args| {
            let scrollable: bool = args.opt(0)?.unwrap_or(true);
            Ok(view.downcast::<ScrollArea, _>("ScrollArea", |a| a.set_wheel_scrollable(scrollable))?)
        })?
        .builder("setAllowUserScroll", |_, view, args| {
            let allow: bool = args.opt(0)?.unwrap_or(true);
            Ok(view.downcast::<ScrollArea, _>("ScrollArea", |a| a.set_allow_user_scroll(allow))?)
        })?
        .method("getScroll", |lua, view, _| {
            view.downcast::<ScrollArea, _>("ScrollArea", |a| a.scroll())?.to_script(lua)
        })
}

fn register_scrolling(lua: &Lua) -> LuaResult<()> {
    scrollbar_methods(WidgetExposer::new(lua, "Scrollbar"))?.ctor(|args| {
        args.arity(1, 1)?;
        scrollbar(args.get(0)?)
    })?;
    scrollbar_methods(WidgetExposer::new(lua, "VerticalScrollbar"))?.ctor(|args| {
        args.arity(0, 0)?;
        scrollbar(LayoutDirection::Vertical)
    })?;
    scroll_area_methods(WidgetExposer::new(lua, "ScrollArea"))?.ctor_holding(|args| {
        args.arity(1, 1)?;
        let content: View = args.get(0)?;
        let area = ScrollArea::view(&content, Some(scrollbar(LayoutDirection::Vertical)?), Some(scrollbar(LayoutDirection::Horizontal)?))?;
        Ok((area, vec![content]))
    })?;
    scroll_area_methods(WidgetExposer::new(lua, "CustomScrollArea"))?.ctor_holding(|args| {
        args.arity(1, 3)?;
        let content: View = args.get(0)?;
        let vertical = custom_bar(args, 1, LayoutDirection::Vertical)?;
        let horizontal = custom_bar(args, 2, LayoutDirection::Horizontal)?;
        let area = ScrollArea::view(&content, vertical.clone(), horizontal.clone())?;
        let held = std::iter::once(content).chain(vertical).chain(horizontal).collect();
        Ok((area, held))
    })
}

// ---------------------------------------------------------------------------
// Pages, tabs and rich text
// ---------------------------------------------------------------------------

/// Views of a `{ v1, v2, ... }` list, every element required.
fn view_list(name: &str, list: &LuaTable) -> Result<Vec<View>> {
    (1..=list.raw_len())
        .map(|i| {
            let item: LuaValue = list.raw_get(i).map_err(|e| Error::invalid(name, e.to_string()))?;
            View::from_script(&item)
                .map_err(|_| Error::type_mismatch(format!("View (element {i} of {name})"), item.type_name()))
        })
        .collect()
}

/// `{ { name = "Tab", view = v }, ... }`.
fn tab_list(list: &LuaTable) -> Result<Vec<(String, View)>> {
    (1..=list.raw_len())
        .map(|i| {
            let item: LuaValue = list.raw_get(i).map_err(|e| Error::invalid("TabView", e.to_string()))?;
            let tab = LuaTable::from_script(&item)
                .map_err(|_| Error::type_mismatch(format!("table (element {i} of TabView)"), item.type_name()))?;
            let field = |key: &str| tab.get::<LuaValue>(key).map_err(|e| Error::invalid("TabView", e.to_string()));
            let name = field("name")?;
            let name = String::from_script(&name)
                .map_err(|_| Error::type_mismatch(format!("string (name of tab {i})"), name.type_name()))?;
            let view = field("view")?;
            let view = View::from_script(&view)
                .map_err(|_| Error::type_mismatch(format!("View (view of tab {i})"), view.type_name()))?;
            Ok((name, view))
        })
        .collect()
}

fn text_items(list: &LuaTable) -> Result<Vec<TextItem>> {
    (1..=list.raw_len())
        .map(|i| {
            let item: LuaValue = list.raw_get(i).map_err(|e| Error::invalid("Text", e.to_string()))?;
            match &item {
                LuaValue::Nil => Err(Error::invalid("Text", "null Text entry")),
                LuaValue::String(s) => Ok(TextItem::Run(s.to_string_lossy())),
                other => match view_of(other) {
                    Some(view) => Ok(TextItem::View(view)),
                    None => Err(Error::invalid("Text", format!("invalid text entry: {}", dump::render(other)))),
                },
            }
        })
        .collect()
}

/// Inline views of `items`, to pin.
fn inline_views(items: &[TextItem]) -> Vec<View> {
    items
        .iter()
        .filter_map(|item| match item {
            TextItem::View(view) => Some(view.clone()),
            TextItem::Run(_) => None,
        })
        .collect()
}

/// 1-based page id from the script, as a 0-based index.
fn page_index(operation: &str, view: &View, id: u32) -> Result<usize> {
    (id as usize).checked_sub(1).ok_or_else(|| {
        let len = view.children().len();
        Error::invalid(operation, format!("page 0 out of range 1..={len}"))
    })
}

fn register_pages(lua: &Lua) -> LuaResult<()> {
    WidgetExposer::new(lua, "PageView")
        .builder("setPageId", |_, view, args| {
            view.downcast::<PageView, _>("PageView", |_| ())?;
            let index = page_index("setPageId", view, args.get(0)?)?;
            Ok(PageView::select(view, index, "setPageId")?)
        })?
        .method("getPageId", |_, view, _| Ok(view.downcast::<PageView, _>("PageView", |p| p.current() + 1)?))?
        .ctor_holding(|args| {
            args.arity(0, 1)?;
            let pages = match args.opt::<LuaTable>(0)? {
                Some(list) => view_list("PageView", &list)?,
                None => Vec::new(),
            };
            Ok((PageView::view(&pages)?, pages))
        })?;

    WidgetExposer::new(lua, "TabView")
        .builder("setTabId", |_, view, args| {
            let tabs = view.downcast::<TabView, _>("TabView", |t| t.titles().len())?;
            let id: u32 = args.get(0)?;
            let Some(index) = (id as usize).checked_sub(1) else {
                return Err(Error::invalid("setTabId", format!("page 0 out of range 1..={tabs}")).into());
            };
            Ok(TabView::select(view, index, "setTabId")?)
        })?
        .method("getTabId", |_, view, _| Ok(view.downcast::<TabView, _>("TabView", |t| t.current() + 1)?))?
        .ctor_holding(|args| {
            args.arity(1, 1)?;
            let tabs = tab_list(&args.get(0)?)?;
            let pages = tabs.iter().map(|(_, view)| view.clone()).collect();
            Ok((TabView::view(tabs)?, pages))
        })?;

    WidgetExposer::new(lua, "Text")
        .builder("setText", |lua, view, args| {
            view.downcast::<Text, _>("Text", |_| ())?;
            let items = text_items(&args.get(0)?)?;
            let held = inline_views(&items);
            Text::set_items(view, items)?;
            let companion = Companion::ensure(lua, view)?;
            companion.clear_pins()?;
            for inline in &held {
                companion.pin(lua, inline)?;
            }
            Ok(())
        })?
        .ctor_holding(|args| {
            args.arity(1, 1)?;
            let items = text_items(&args.get(0)?)?;
            let held = inline_views(&items);
            Ok((Text::view(items)?, held))
        })
}

// ---------------------------------------------------------------------------
// ForEachUI
// ---------------------------------------------------------------------------

/// Rebuild the rows of a `ForEachUI` once it has both a model and a
/// factory. Rows are cached by model item, so an item still in the model
/// keeps its view; the factory only runs for new items.
fn rebuild(lua: &Lua, view: &View) -> LuaResult<()> {
    let companion = Companion::ensure(lua, view)?;
    let (LuaValue::Table(model), LuaValue::Function(factory)) =
        (companion.value(FOR_EACH_MODEL), companion.value(FOR_EACH_FACTORY))
    else {
        return Ok(());
    };
    let previous = match companion.value(FOR_EACH_VIEWS) {
        LuaValue::Table(cache) => Some(cache),
        _ => None,
    };
    let cache = lua.create_table()?;
    let mut rows: Vec<View> = Vec::new();
    for i in 1..=model.raw_len() {
        let item: LuaValue = model.raw_get(i)?;
        let cached = match &previous {
            Some(previous) if !item.is_nil() => previous.raw_get::<LuaValue>(&item)?,
            _ => LuaValue::Nil,
        };
        let reusable = view_of(&cached).filter(|row| !rows.iter().any(|r| r.ptr_eq(row)));
        let (row, value) = match reusable {
            Some(row) => (row, cached),
            None => {
                let value: LuaValue = factory.call(item.clone())?;
                let row = View::from_script(&value)
                    .map_err(|_| Error::type_mismatch(format!("View (factory result for item {i})"), value.type_name()))?;
                (row, value)
            }
        };
        if !item.is_nil() {
            cache.raw_set(item, value)?;
        }
        rows.push(row);
    }
    ForEach::set_rows(view, &rows)?;
    companion.clear_pins()?;
    for row in &rows {
        companion.pin(lua, row)?;
    }
    companion.set_value(FOR_EACH_VIEWS, LuaValue::Table(cache))
}

fn register_for_each(lua: &Lua) -> LuaResult<()> {
    WidgetExposer::new(lua, "ForEachUI")
        .builder("setModel", |lua, view, args| {
            view.downcast::<ForEach, _>("ForEachUI", |_| ())?;
            let model = args.opt::<LuaTable>(0)?.map_or(LuaValue::Nil, LuaValue::Table);
            Companion::ensure(lua, view)?.set_value(FOR_EACH_MODEL, model)?;
            rebuild(lua, view)
        })?
        .builder("setFactory", |lua, view, args| {
            view.downcast::<ForEach, _>("ForEachUI", |_| ())?;
            let factory: LuaFunction = args.get(0)?;
            Companion::ensure(lua, view)?.set_value(FOR_EACH_FACTORY, LuaValue::Function(factory))?;
            rebuild(lua, view)
        })?
        .builder("notify", |lua, view, _| {
            view.downcast::<ForEach, _>("ForEachUI", |_| ())?;
            rebuild(lua, view)
        })?
        .ctor(|args| {
            args.arity(0, 0)?;
            Ok(ForEach::view())
        })
}

// ---------------------------------------------------------------------------
// Drag and drop
// ---------------------------------------------------------------------------

fn draggable(lua: &Lua, args: &Args) -> LuaResult<LuaAnyUserData> {
    args.arity(1, 1)?;
    let content: View = args.get(0)?;
    let view = Draggable::view(&content)?;
    let ud = adopt(lua, &view, "Draggable", &[])?;
    pin(lua, &view, &content)?;
    Ok(ud)
}

fn register_drag(lua: &Lua) -> LuaResult<()> {
    register_container(lua, "DragArea", DragArea::view)?;
    WidgetExposer::new(lua, "DragHandle").ctor(|args| {
        args.arity(0, 0)?;
        Ok(View::new(DragHandle))
    })?;
    plain_factory(lua, "Draggable", draggable)
}

/// Install the factories of this module.
pub fn register(lua: &Lua) -> LuaResult<()> {
    register_scrolling(lua)?;
    register_pages(lua)?;
    register_for_each(lua)?;
    register_drag(lua)?;
    tracing::debug!("composite factories registered");
    Ok(())
}
