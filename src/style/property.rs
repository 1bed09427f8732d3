//! Style property instances.
//!
//! A [`Property`] is one declaration (`Padding(10, 20)`, `TextColor("#fff")`).
//! Declarations of the same [`PropertyKind`] override each other during the
//! cascade; fields wrapped in [`Unset`] fall through to lower-precedence
//! declarations instead.

use std::fmt;

use super::color::Color;
use super::metric::{EdgeBox, Metric, Unset};

// ---------------------------------------------------------------------------
// Keyword enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextAlign {
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextOverflow {
    None,
    Ellipsis,
    Clip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextTransform {
    None,
    Uppercase,
    Lowercase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerticalAlign {
    Default,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Overflow {
    Visible,
    Hidden,
    HiddenFromOutside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repeat {
    None,
    X,
    Y,
    XY,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sizing {
    None,
    Fit,
    FitPadding,
    Cover,
    Stretch,
    Center,
    Tile,
    Cropped,
    SplitScale,
    Contain,
    ContainPadding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutDirection {
    None,
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollbarAxis {
    Gone,
    Visible,
    OnDemand,
}

/// Visibility of a view. `Gone` also removes it from layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Invisible,
    Gone,
}

impl Visibility {
    pub fn is_visible(self) -> bool {
        self == Visibility::Visible
    }
}

// ---------------------------------------------------------------------------
// Compound values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    pub from: Color,
    pub to: Color,
    pub direction: LayoutDirection,
}

/// Background image settings. Every field may be left unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackgroundImage {
    pub url: Unset<String>,
    pub overlay: Unset<Color>,
    pub repeat: Unset<Repeat>,
    pub sizing: Unset<Sizing>,
    pub scale: Unset<[f32; 2]>,
    pub dpi_margin: Unset<f32>,
}

impl BackgroundImage {
    /// Field-wise merge: fields set in `self` win over `lower`.
    pub fn over(self, lower: BackgroundImage) -> BackgroundImage {
        BackgroundImage {
            url: self.url.or(lower.url),
            overlay: self.overlay.or(lower.overlay),
            repeat: self.repeat.or(lower.repeat),
            sizing: self.sizing.or(lower.sizing),
            scale: self.scale.or(lower.scale),
            dpi_margin: self.dpi_margin.or(lower.dpi_margin),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderLine {
    pub width: Metric,
    pub color: Color,
}

impl BorderLine {
    /// The result of `Border(nil)`.
    pub const NONE: BorderLine = BorderLine { width: Metric::ZERO, color: Color::BLACK };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub offset_x: Metric,
    pub offset_y: Metric,
    pub blur: Metric,
    pub spread: Metric,
    pub color: Color,
}

/// A pair of optionally specified dimensions (`FixedSize`, `MinSize`, `MaxSize`).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Dimensions {
    pub width: Unset<Metric>,
    pub height: Unset<Metric>,
}

impl Dimensions {
    pub fn over(self, lower: Dimensions) -> Dimensions {
        Dimensions { width: self.width.or(lower.width), height: self.height.or(lower.height) }
    }
}

/// Flex-grow weights per axis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Expanding {
    pub horizontal: Unset<u32>,
    pub vertical: Unset<u32>,
}

impl Expanding {
    pub fn over(self, lower: Expanding) -> Expanding {
        Expanding {
            horizontal: self.horizontal.or(lower.horizontal),
            vertical: self.vertical.or(lower.vertical),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CursorStyle {
    pub name: String,
    pub size: Option<i32>,
}

// ---------------------------------------------------------------------------
// Property
// ---------------------------------------------------------------------------

/// One style declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    BackgroundSolid(Color),
    BackgroundGradient(Option<Gradient>),
    BackgroundImage(BackgroundImage),
    BackgroundCropping { offset: [f32; 2], size: Unset<[f32; 2]> },
    BackdropBlur(Metric),
    Border(BorderLine),
    BorderTop(BorderLine),
    BorderRight(BorderLine),
    BorderBottom(BorderLine),
    BorderLeft(BorderLine),
    BorderRadius(Metric),
    BoxShadow(Option<Shadow>),
    BoxShadowInner(Option<Shadow>),
    Cursor(CursorStyle),
    Expanding(Expanding),
    FixedSize(Dimensions),
    MinSize(Dimensions),
    MaxSize(Dimensions),
    Font(String),
    FontFamily(String),
    FontSize(Metric),
    LayoutSpacing(Metric),
    LineHeight(f32),
    Margin(EdgeBox),
    Padding(EdgeBox),
    Opacity(f32),
    Overflow(Overflow),
    TextAlign(TextAlign),
    TextOverflow(TextOverflow),
    TextTransform(TextTransform),
    VerticalAlign(VerticalAlign),
    ScrollbarAppearance { vertical: ScrollbarAxis, horizontal: ScrollbarAxis },
    TextBorder(Color),
    TextColor(Color),
    TextShadow(Color),
    TransformOffset { x: Metric, y: Metric },
    /// Rotation in radians.
    TransformRotate(f32),
    TransformScale { x: f32, y: f32 },
    Visibility(Visibility),
}

/// Discriminant of a [`Property`], used as the merge key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKind {
    BackgroundSolid,
    BackgroundGradient,
    BackgroundImage,
    BackgroundCropping,
    BackdropBlur,
    Border,
    BorderTop,
    BorderRight,
    BorderBottom,
    BorderLeft,
    BorderRadius,
    BoxShadow,
    BoxShadowInner,
    Cursor,
    Expanding,
    FixedSize,
    MinSize,
    MaxSize,
    Font,
    FontFamily,
    FontSize,
    LayoutSpacing,
    LineHeight,
    Margin,
    Padding,
    Opacity,
    Overflow,
    TextAlign,
    TextOverflow,
    TextTransform,
    VerticalAlign,
    ScrollbarAppearance,
    TextBorder,
    TextColor,
    TextShadow,
    TransformOffset,
    TransformRotate,
    TransformScale,
    Visibility,
}

impl Property {
    pub fn kind(&self) -> PropertyKind {
        use Property as P;
        use PropertyKind as K;
        match self {
            P::BackgroundSolid(_) => K::BackgroundSolid,
            P::BackgroundGradient(_) => K::BackgroundGradient,
            P::BackgroundImage(_) => K::BackgroundImage,
            P::BackgroundCropping { .. } => K::BackgroundCropping,
            P::BackdropBlur(_) => K::BackdropBlur,
            P::Border(_) => K::Border,
            P::BorderTop(_) => K::BorderTop,
            P::BorderRight(_) => K::BorderRight,
            P::BorderBottom(_) => K::BorderBottom,
            P::BorderLeft(_) => K::BorderLeft,
            P::BorderRadius(_) => K::BorderRadius,
            P::BoxShadow(_) => K::BoxShadow,
            P::BoxShadowInner(_) => K::BoxShadowInner,
            P::Cursor(_) => K::Cursor,
            P::Expanding(_) => K::Expanding,
            P::FixedSize(_) => K::FixedSize,
            P::MinSize(_) => K::MinSize,
            P::MaxSize(_) => K::MaxSize,
            P::Font(_) => K::Font,
            P::FontFamily(_) => K::FontFamily,
            P::FontSize(_) => K::FontSize,
            P::LayoutSpacing(_) => K::LayoutSpacing,
            P::LineHeight(_) => K::LineHeight,
            P::Margin(_) => K::Margin,
            P::Padding(_) => K::Padding,
            P::Opacity(_) => K::Opacity,
            P::Overflow(_) => K::Overflow,
            P::TextAlign(_) => K::TextAlign,
            P::TextOverflow(_) => K::TextOverflow,
            P::TextTransform(_) => K::TextTransform,
            P::VerticalAlign(_) => K::VerticalAlign,
            P::ScrollbarAppearance { .. } => K::ScrollbarAppearance,
            P::TextBorder(_) => K::TextBorder,
            P::TextColor(_) => K::TextColor,
            P::TextShadow(_) => K::TextShadow,
            P::TransformOffset { .. } => K::TransformOffset,
            P::TransformRotate(_) => K::TransformRotate,
            P::TransformScale { .. } => K::TransformScale,
            P::Visibility(_) => K::Visibility,
        }
    }

    /// Combine `self` (higher precedence) with an existing declaration of the
    /// same kind. Kinds with unset-able fields merge field-wise; every other
    /// kind is replaced outright.
    pub fn over(self, lower: &Property) -> Property {
        match (self, lower) {
            (Property::BackgroundImage(hi), Property::BackgroundImage(lo)) => {
                Property::BackgroundImage(hi.over(lo.clone()))
            }
            (Property::Margin(hi), Property::Margin(lo)) => Property::Margin(hi.over(*lo)),
            (Property::Padding(hi), Property::Padding(lo)) => Property::Padding(hi.over(*lo)),
            (Property::FixedSize(hi), Property::FixedSize(lo)) => Property::FixedSize(hi.over(*lo)),
            (Property::MinSize(hi), Property::MinSize(lo)) => Property::MinSize(hi.over(*lo)),
            (Property::MaxSize(hi), Property::MaxSize(lo)) => Property::MaxSize(hi.over(*lo)),
            (Property::Expanding(hi), Property::Expanding(lo)) => Property::Expanding(hi.over(*lo)),
            (hi, _) => hi,
        }
    }

    /// Script-facing constructor name of this property.
    pub fn name(&self) -> &'static str {
        match self.kind() {
            PropertyKind::Visibility => "VisibilityStyle",
            kind => kind.name(),
        }
    }
}

impl PropertyKind {
    fn name(self) -> &'static str {
        use PropertyKind as K;
        match self {
            K::BackgroundSolid => "BackgroundSolid",
            K::BackgroundGradient => "BackgroundGradient",
            K::BackgroundImage => "BackgroundImage",
            K::BackgroundCropping => "BackgroundCropping",
            K::BackdropBlur => "BackdropBlur",
            K::Border => "Border",
            K::BorderTop => "BorderTop",
            K::BorderRight => "BorderRight",
            K::BorderBottom => "BorderBottom",
            K::BorderLeft => "BorderLeft",
            K::BorderRadius => "BorderRadius",
            K::BoxShadow => "BoxShadow",
            K::BoxShadowInner => "BoxShadowInner",
            K::Cursor => "Cursor",
            K::Expanding => "Expanding",
            K::FixedSize => "FixedSize",
            K::MinSize => "MinSize",
            K::MaxSize => "MaxSize",
            K::Font => "Font",
            K::FontFamily => "FontFamily",
            K::FontSize => "FontSize",
            K::LayoutSpacing => "LayoutSpacing",
            K::LineHeight => "LineHeight",
            K::Margin => "Margin",
            K::Padding => "Padding",
            K::Opacity => "Opacity",
            K::Overflow => "Overflow",
            K::TextAlign => "TextAlign",
            K::TextOverflow => "TextOverflow",
            K::TextTransform => "TextTransform",
            K::VerticalAlign => "VerticalAlign",
            K::ScrollbarAppearance => "ScrollbarAppearance",
            K::TextBorder => "TextBorder",
            K::TextColor => "TextColor",
            K::TextShadow => "TextShadow",
            K::TransformOffset => "TransformOffset",
            K::TransformRotate => "TransformRotate",
            K::TransformScale => "TransformScale",
            K::Visibility => "Visibility",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::BackgroundSolid(c)
            | Property::TextBorder(c)
            | Property::TextColor(c)
            | Property::TextShadow(c) => write!(f, "{}({c})", self.name()),
            Property::BackdropBlur(m)
            | Property::BorderRadius(m)
            | Property::FontSize(m)
            | Property::LayoutSpacing(m) => write!(f, "{}({m})", self.name()),
            Property::Border(b)
            | Property::BorderTop(b)
            | Property::BorderRight(b)
            | Property::BorderBottom(b)
            | Property::BorderLeft(b) => write!(f, "{}({}, {})", self.name(), b.width, b.color),
            Property::Margin(e) | Property::Padding(e) => write!(
                f,
                "{}({}, {}, {}, {})",
                self.name(),
                e.top,
                e.right,
                e.bottom,
                e.left
            ),
            Property::Opacity(v) | Property::LineHeight(v) => write!(f, "{}({v})", self.name()),
            Property::Font(s) | Property::FontFamily(s) => write!(f, "{}({s:?})", self.name()),
            other => write!(f, "{other:?}"),
        }
    }
}
