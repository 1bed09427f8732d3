//! Computed style -> taffy Style conversion.
//!
//! Maps a view's container kind, its computed style and its flags to taffy's
//! layout types. Metrics are density-independent pixels and map 1:1 onto
//! taffy lengths.

use taffy::prelude::*;

use crate::geometry::Size as ViewSize;
use crate::style::computed::ComputedStyle;
use crate::style::metric::{EdgeBox, Metric, Unset};
use crate::style::property::{Dimensions, Visibility};
use crate::view::node::View;
use crate::widget::traits::LayoutKind;

fn length(m: Unset<Metric>) -> LengthPercentage {
    match m.get() {
        Some(v) => LengthPercentage::from_length(v.0),
        None => LengthPercentage::ZERO,
    }
}

fn length_auto(m: Unset<Metric>) -> LengthPercentageAuto {
    match m.get() {
        Some(v) => LengthPercentageAuto::from_length(v.0),
        None => LengthPercentageAuto::from_length(0.0),
    }
}

fn dimension(m: Unset<Metric>) -> Dimension {
    match m.get() {
        Some(v) => Dimension::from_length(v.0),
        None => Dimension::AUTO,
    }
}

/// Convert an [`EdgeBox`] to a taffy [`Rect<LengthPercentage>`]. Unset sides are zero.
pub fn resolve_edges(edges: &EdgeBox) -> Rect<LengthPercentage> {
    Rect {
        top: length(edges.top),
        right: length(edges.right),
        bottom: length(edges.bottom),
        left: length(edges.left),
    }
}

fn resolve_margin(edges: &EdgeBox) -> Rect<LengthPercentageAuto> {
    Rect {
        top: length_auto(edges.top),
        right: length_auto(edges.right),
        bottom: length_auto(edges.bottom),
        left: length_auto(edges.left),
    }
}

fn resolve_dimensions(dims: &Dimensions) -> taffy::geometry::Size<Dimension> {
    taffy::geometry::Size { width: dimension(dims.width), height: dimension(dims.height) }
}

/// Style for the children arrangement of a container of `kind`.
pub fn container_style(style: &mut taffy::Style, kind: LayoutKind, spacing: Metric) {
    let gap = LengthPercentage::from_length(spacing.0);
    match kind {
        LayoutKind::Vertical => {
            style.flex_direction = FlexDirection::Column;
            style.gap = taffy::geometry::Size { width: gap, height: gap };
        }
        LayoutKind::Horizontal => {
            style.flex_direction = FlexDirection::Row;
            style.gap = taffy::geometry::Size { width: gap, height: gap };
        }
        LayoutKind::Grid { .. } => {
            style.flex_direction = FlexDirection::Row;
            style.flex_wrap = FlexWrap::Wrap;
            style.gap = taffy::geometry::Size { width: gap, height: gap };
        }
        LayoutKind::Centered => {
            style.align_items = Some(AlignItems::Center);
            style.justify_content = Some(JustifyContent::Center);
        }
        LayoutKind::Stacked | LayoutKind::Free | LayoutKind::Absolute | LayoutKind::Scroll { .. } => {}
    }
}

/// How the parent places this view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The root of a layout pass; fills the viewport.
    Root(ViewSize),
    /// A flow child of a container of this kind.
    Child(LayoutKind),
}

fn absolute_at(style: &mut taffy::Style, view: &View) {
    let pos = view.position();
    style.position = Position::Absolute;
    style.inset = Rect {
        left: LengthPercentageAuto::from_length(pos.x as f32),
        top: LengthPercentageAuto::from_length(pos.y as f32),
        right: LengthPercentageAuto::AUTO,
        bottom: LengthPercentageAuto::AUTO,
    };
}

/// Convert a view into a [`taffy::Style`].
///
/// Mapping summary:
/// - `Visibility::Gone` -> `Display::None`
/// - `FixedSize` / requested size -> `size`, `MinSize` -> `min_size`, `MaxSize` -> `max_size`
/// - leaf content plus padding -> `min_size`
/// - `Margin`/`Padding` -> `margin`/`padding`, `LayoutSpacing` -> `gap`
/// - expanding views -> `flex_grow: 1`
/// - custom-layout views and children of free/absolute containers -> absolute at their position
/// - children of stacked containers -> absolute, inset 0
/// - children of scroll areas -> absolute at minus the scroll offset, natural size
pub fn resolve_view(view: &View, computed: &ComputedStyle, placement: Placement) -> taffy::Style {
    let mut style = taffy::Style { display: Display::Flex, ..Default::default() };

    let visibility = computed.visibility().unwrap_or_else(|| view.state().visibility);
    if visibility == Visibility::Gone {
        style.display = Display::None;
        return style;
    }

    let kind = view.with_widget(|w| w.layout_kind());
    if let Some(kind) = kind {
        container_style(&mut style, kind, computed.layout_spacing());
    } else {
        let min = view.minimum_size();
        style.min_size = taffy::geometry::Size {
            width: Dimension::from_length(min.width as f32),
            height: Dimension::from_length(min.height as f32),
        };
    }

    style.padding = resolve_edges(&computed.padding());
    style.margin = resolve_margin(&computed.margin());

    let min = computed.min_size();
    if min.width.is_set() {
        style.min_size.width = dimension(min.width);
    }
    if min.height.is_set() {
        style.min_size.height = dimension(min.height);
    }
    style.max_size = resolve_dimensions(&computed.max_size());
    style.size = resolve_dimensions(&computed.fixed_size());
    if let Some(requested) = view.requested_size() {
        style.size = taffy::geometry::Size {
            width: Dimension::from_length(requested.width as f32),
            height: Dimension::from_length(requested.height as f32),
        };
    }

    let expanding = computed.expanding();
    let grows = view.is_expanding()
        || expanding.horizontal.get().is_some_and(|n| *n > 0)
        || expanding.vertical.get().is_some_and(|n| *n > 0);

    match placement {
        Placement::Root(viewport) => {
            style.size = taffy::geometry::Size {
                width: Dimension::from_length(viewport.width as f32),
                height: Dimension::from_length(viewport.height as f32),
            };
        }
        Placement::Child(_) if view.is_custom_layout() => absolute_at(&mut style, view),
        Placement::Child(LayoutKind::Free | LayoutKind::Absolute) => absolute_at(&mut style, view),
        Placement::Child(LayoutKind::Scroll { x, y }) => {
            style.position = Position::Absolute;
            style.inset = Rect {
                left: LengthPercentageAuto::from_length(-x as f32),
                top: LengthPercentageAuto::from_length(-y as f32),
                right: LengthPercentageAuto::AUTO,
                bottom: LengthPercentageAuto::AUTO,
            };
        }
        Placement::Child(LayoutKind::Stacked) => {
            style.position = Position::Absolute;
            style.inset = Rect {
                left: LengthPercentageAuto::from_length(0.0),
                top: LengthPercentageAuto::from_length(0.0),
                right: LengthPercentageAuto::from_length(0.0),
                bottom: LengthPercentageAuto::from_length(0.0),
            };
        }
        Placement::Child(LayoutKind::Grid { columns }) => {
            let share = 1.0 / f32::from(columns.max(1));
            style.flex_basis = Dimension::from_percent(share);
            style.flex_grow = 0.0;
            style.flex_shrink = 0.0;
        }
        Placement::Child(_) => {
            if grows {
                style.flex_grow = 1.0;
            }
        }
    }

    style
}
