//! Scroll area and scrollbar.
//!
//! A [`ScrollArea`] shows one content view shifted by its scroll offset and
//! keeps up to two [`Scrollbar`]s in step with it. The scroll range follows
//! the sizes of the area and its content after each layout pass. Area and
//! bars sync through native slots on `ScrollChanged`; each side ignores a
//! value it already holds, so one round of syncing ends it.

use std::any::Any;
use std::fmt;

use crate::error::{Error, Result};
use crate::geometry::{Offset, Region, Size};
use crate::style::property::LayoutDirection;
use crate::view::node::{View, WeakView};
use crate::view::signal::{Payload, SignalKind, SlotId};
use crate::widget::traits::{Emission, LayoutKind, Widget};

// ---------------------------------------------------------------------------
// Scrollbar
// ---------------------------------------------------------------------------

/// One scroll axis: a position in `0..=max_scroll`.
#[derive(Debug, Clone)]
pub struct Scrollbar {
    direction: LayoutDirection,
    scroll: i32,
    max_scroll: i32,
}

impl Scrollbar {
    pub fn new(direction: LayoutDirection) -> Self {
        Self { direction, scroll: 0, max_scroll: 0 }
    }

    pub fn vertical() -> View {
        View::new(Scrollbar::new(LayoutDirection::Vertical))
    }

    pub fn horizontal() -> View {
        View::new(Scrollbar::new(LayoutDirection::Horizontal))
    }

    pub fn direction(&self) -> LayoutDirection {
        self.direction
    }

    pub fn is_horizontal(&self) -> bool {
        self.direction == LayoutDirection::Horizontal
    }

    pub fn scroll(&self) -> i32 {
        self.scroll
    }

    pub fn max_scroll(&self) -> i32 {
        self.max_scroll
    }

    /// Move to `scroll`, clamped to the range. Emits `ScrollChanged` when the
    /// position moved.
    pub fn set_scroll(&mut self, scroll: i32) -> Vec<Emission> {
        let scroll = scroll.clamp(0, self.max_scroll);
        if scroll == self.scroll {
            return Vec::new();
        }
        self.scroll = scroll;
        vec![(SignalKind::ScrollChanged, Payload::Number(f64::from(scroll)))]
    }

    /// Change the range. Emits `UpdatedMaxScroll`, then `ScrollChanged` if
    /// the position had to be pulled back into the new range.
    pub fn set_max_scroll(&mut self, max_scroll: i32) -> Vec<Emission> {
        let max_scroll = max_scroll.max(0);
        if max_scroll == self.max_scroll {
            return Vec::new();
        }
        self.max_scroll = max_scroll;
        let mut out = vec![(SignalKind::UpdatedMaxScroll, Payload::Number(f64::from(max_scroll)))];
        out.extend(self.set_scroll(self.scroll));
        out
    }

    /// Move to `ratio` percent of the range, rounding up.
    pub fn set_scroll_ratio(&mut self, ratio: f32) -> Vec<Emission> {
        let ratio = ratio.clamp(0.0, 100.0);
        let scroll = (ratio * self.max_scroll as f32 / 100.0).ceil() as i32;
        self.set_scroll(scroll)
    }
}

impl Widget for Scrollbar {
    fn widget_type(&self) -> &'static str {
        "Scrollbar"
    }

    fn content_size(&self) -> Size {
        if self.is_horizontal() {
            Size::new(32, 8)
        } else {
            Size::new(8, 32)
        }
    }

    fn on_scroll(&mut self, delta: Offset) -> Option<Vec<Emission>> {
        let step = if self.is_horizontal() { delta.x } else { delta.y };
        let mut out = self.set_scroll(self.scroll + step);
        if !out.is_empty() {
            out.push((SignalKind::TriggeredManually, Payload::Number(f64::from(self.scroll))));
        }
        Some(out)
    }

    fn describe(&self) -> String {
        let axis = if self.is_horizontal() { "horizontal" } else { "vertical" };
        format!("Scrollbar {axis} {}/{}", self.scroll, self.max_scroll)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// ScrollArea
// ---------------------------------------------------------------------------

/// A viewport over a single content view.
pub struct ScrollArea {
    scroll: Offset,
    max_scroll: Offset,
    stick_to_end: bool,
    wheel_scrollable: bool,
    allow_user_scroll: bool,
    vertical: Option<View>,
    horizontal: Option<View>,
    content_slot: Option<(WeakView, SlotId)>,
}

impl ScrollArea {
    fn new(vertical: Option<View>, horizontal: Option<View>) -> Self {
        Self {
            scroll: Offset::ZERO,
            max_scroll: Offset::ZERO,
            stick_to_end: false,
            wheel_scrollable: true,
            allow_user_scroll: true,
            vertical,
            horizontal,
            content_slot: None,
        }
    }

    pub fn scroll(&self) -> Offset {
        self.scroll
    }

    pub fn max_scroll(&self) -> Offset {
        self.max_scroll
    }

    pub fn vertical_scrollbar(&self) -> Option<View> {
        self.vertical.clone()
    }

    pub fn horizontal_scrollbar(&self) -> Option<View> {
        self.horizontal.clone()
    }

    pub fn is_stick_to_end(&self) -> bool {
        self.stick_to_end
    }

    pub fn set_wheel_scrollable(&mut self, scrollable: bool) {
        self.wheel_scrollable = scrollable;
    }

    /// When off, wheel input is swallowed without scrolling.
    pub fn set_allow_user_scroll(&mut self, allow: bool) {
        self.allow_user_scroll = allow;
    }

    /// Move to `target`, clamped to the range on both axes.
    pub fn set_scroll(&mut self, target: Offset) -> Vec<Emission> {
        let clamped = Offset::new(target.x.clamp(0, self.max_scroll.x), target.y.clamp(0, self.max_scroll.y));
        if clamped == self.scroll {
            return Vec::new();
        }
        self.scroll = clamped;
        vec![(SignalKind::ScrollChanged, Payload::Position(clamped))]
    }

    /// Keep the view pinned to the bottom while content grows. Turning it on
    /// jumps to the end.
    pub fn set_stick_to_end(&mut self, stick: bool) -> Vec<Emission> {
        self.stick_to_end = stick;
        if !stick {
            return Vec::new();
        }
        self.set_scroll(Offset::new(self.scroll.x, self.max_scroll.y))
    }

    /// Percent of the range on one axis, rounded up.
    pub fn set_scroll_ratio(&mut self, direction: LayoutDirection, ratio: f32) -> Vec<Emission> {
        let ratio = ratio.clamp(0.0, 100.0);
        let along = |max: i32| (ratio * max as f32 / 100.0).ceil() as i32;
        let mut target = self.scroll;
        match direction {
            LayoutDirection::Horizontal => target.x = along(self.max_scroll.x),
            _ => target.y = along(self.max_scroll.y),
        }
        self.set_scroll(target)
    }

    fn set_max_scroll(&mut self, max_scroll: Offset) -> Vec<Emission> {
        let max_scroll = Offset::new(max_scroll.x.max(0), max_scroll.y.max(0));
        let was_at_end = self.scroll.y >= self.max_scroll.y;
        self.max_scroll = max_scroll;
        let mut target = self.scroll;
        if self.stick_to_end && was_at_end {
            target.y = max_scroll.y;
        }
        self.set_scroll(target)
    }

    // ── View level ───────────────────────────────────────────────────

    /// A scroll area over `content`. Bars that are not given are not shown;
    /// the area still scrolls.
    pub fn view(content: &View, vertical: Option<View>, horizontal: Option<View>) -> Result<View> {
        let area = View::new(ScrollArea::new(vertical.clone(), horizontal.clone()));
        area.connect(SignalKind::ScrollChanged, |area, _| push_to_bars(area));
        area.connect(SignalKind::SizeChanged, |area, _| refresh(area));
        for bar in [vertical, horizontal].into_iter().flatten() {
            let weak = area.downgrade();
            bar.connect(SignalKind::ScrollChanged, move |bar, payload| {
                let (Some(area), Payload::Number(n)) = (weak.upgrade(), payload) else {
                    return Ok(());
                };
                let horizontal = bar.downcast::<Scrollbar, _>("Scrollbar", |b| b.is_horizontal())?;
                let n = *n as i32;
                area.perform::<ScrollArea>("ScrollArea", |a| {
                    let mut target = a.scroll;
                    if horizontal {
                        target.x = n;
                    } else {
                        target.y = n;
                    }
                    a.set_scroll(target)
                })
            });
        }
        ScrollArea::set_content(&area, content)?;
        Ok(area)
    }

    /// Replace the content view. The range follows its size from now on.
    pub fn set_content(area: &View, content: &View) -> Result<()> {
        let previous = area.downcast::<ScrollArea, _>("ScrollArea", |a| a.content_slot.take())?;
        if let Some((old, id)) = previous {
            if let Some(old) = old.upgrade() {
                old.disconnect(SignalKind::SizeChanged, id);
            }
        }
        area.remove_all_views()?;
        area.add_view(content)?;
        let weak = area.downgrade();
        let id = content.connect(SignalKind::SizeChanged, move |_, _| match weak.upgrade() {
            Some(area) => refresh(&area),
            None => Ok(()),
        });
        area.downcast::<ScrollArea, _>("ScrollArea", |a| a.content_slot = Some((content.downgrade(), id)))?;
        refresh(area)
    }

    /// Scroll until `target`, a view inside the content, is in sight. With
    /// `nearest_border` the area moves as little as possible; otherwise the
    /// view's top-left corner is brought to the viewport's.
    pub fn scroll_to(area: &View, target: &View, nearest_border: bool) -> Result<()> {
        let Some(content) = area.view_at_index(0) else {
            return Ok(());
        };
        if !target.is_within(&content) {
            return Err(Error::invalid("scrollTo", "view is not inside this scroll area"));
        }
        let at = Region::new(target.global_position() - content.global_position(), target.size());
        let viewport = area.size();
        area.perform::<ScrollArea>("ScrollArea", |a| {
            let target = Offset::new(
                fit(at.origin.x, at.size.width, a.scroll.x, viewport.width, nearest_border),
                fit(at.origin.y, at.size.height, a.scroll.y, viewport.height, nearest_border),
            );
            a.set_scroll(target)
        })
    }
}

/// New scroll position on one axis so that `[start, start + len)` is visible.
fn fit(start: i32, len: i32, scroll: i32, viewport: i32, nearest_border: bool) -> i32 {
    if !nearest_border {
        return start;
    }
    if start < scroll {
        start
    } else if start + len > scroll + viewport {
        start + len - viewport
    } else {
        scroll
    }
}

/// Recompute the range from the current sizes and hand it to the bars.
fn refresh(area: &View) -> Result<()> {
    let viewport = area.size();
    let content = area.view_at_index(0).map_or(Size::ZERO, |c| c.size());
    let max = Offset::new((content.width - viewport.width).max(0), (content.height - viewport.height).max(0));
    // Bars first, so the area's own update is not clamped by a stale bar.
    let (vertical, horizontal) = area.downcast::<ScrollArea, _>("ScrollArea", |a| (a.vertical.clone(), a.horizontal.clone()))?;
    for (bar, range) in [(vertical, max.y), (horizontal, max.x)] {
        if let Some(bar) = bar {
            bar.perform::<Scrollbar>("Scrollbar", |b| b.set_max_scroll(range))?;
        }
    }
    area.perform::<ScrollArea>("ScrollArea", |a| a.set_max_scroll(max))?;
    push_to_bars(area)
}

fn push_to_bars(area: &View) -> Result<()> {
    let (vertical, horizontal, scroll) =
        area.downcast::<ScrollArea, _>("ScrollArea", |a| (a.vertical.clone(), a.horizontal.clone(), a.scroll))?;
    for (bar, at) in [(vertical, scroll.y), (horizontal, scroll.x)] {
        if let Some(bar) = bar {
            bar.perform::<Scrollbar>("Scrollbar", |b| b.set_scroll(at))?;
        }
    }
    Ok(())
}

impl Widget for ScrollArea {
    fn widget_type(&self) -> &'static str {
        "ScrollArea"
    }

    fn layout_kind(&self) -> Option<LayoutKind> {
        Some(LayoutKind::Scroll { x: self.scroll.x, y: self.scroll.y })
    }

    fn on_scroll(&mut self, delta: Offset) -> Option<Vec<Emission>> {
        if !self.allow_user_scroll {
            return Some(Vec::new());
        }
        if !self.wheel_scrollable {
            return None;
        }
        // At the edge the wheel goes on to an enclosing area.
        let out = self.set_scroll(self.scroll + delta);
        (!out.is_empty()).then_some(out)
    }

    fn describe(&self) -> String {
        format!("ScrollArea {} of {}", self.scroll, self.max_scroll)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl fmt::Debug for ScrollArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollArea")
            .field("scroll", &self.scroll)
            .field("max_scroll", &self.max_scroll)
            .field("stick_to_end", &self.stick_to_end)
            .finish_non_exhaustive()
    }
}
