//! Style rule namespace.
//!
//! One global constructor per property kind (`BackgroundSolid`, `Padding`,
//! ...). Each returns an opaque [`PropertyValue`] that only the style
//! resolver consumes. Keyword properties are the enum tables themselves:
//! `TextAlign.CENTER` is a declaration.

use mlua::prelude::*;
use mlua::{MetaMethod, UserData, UserDataMethods};

use super::convert::{Angle, Args, FromScript, Vector};
use super::enums::{EnumValue, ScriptEnum};
use crate::error::Error;
use crate::style::color::Color;
use crate::style::metric::{EdgeBox, Metric, Unset};
use crate::style::property::{
    BackgroundImage, BorderLine, CursorStyle, Dimensions, Expanding, Gradient, LayoutDirection, Overflow,
    Property, Repeat, ScrollbarAxis, Shadow, Sizing, TextAlign, TextOverflow, TextTransform, VerticalAlign,
    Visibility,
};

/// Script value of one declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyValue(pub Property);

impl UserData for PropertyValue {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| Ok(this.0.to_string()));
        methods.add_meta_method(MetaMethod::Eq, |_, this, other: LuaAnyUserData| {
            Ok(other.borrow::<PropertyValue>().is_ok_and(|o| *o == *this))
        });
    }
}

/// The declaration `value` stands for, if any.
pub fn property_of(value: &LuaValue) -> Option<Property> {
    let LuaValue::UserData(ud) = value else {
        return None;
    };
    if let Ok(p) = ud.borrow::<PropertyValue>() {
        return Some(p.0.clone());
    }
    ud.borrow::<EnumValue>().ok().and_then(|ev| enum_property(&ev))
}

/// Keyword enum values usable directly as declarations.
pub fn enum_property(ev: &EnumValue) -> Option<Property> {
    fn lookup<T: ScriptEnum>(ev: &EnumValue, wrap: fn(T) -> Property) -> Option<Property> {
        (ev.kind == T::NAME).then(|| T::from_variant_name(ev.variant)).flatten().map(wrap)
    }
    lookup::<TextAlign>(ev, Property::TextAlign)
        .or_else(|| lookup::<TextOverflow>(ev, Property::TextOverflow))
        .or_else(|| lookup::<TextTransform>(ev, Property::TextTransform))
        .or_else(|| lookup::<VerticalAlign>(ev, Property::VerticalAlign))
        .or_else(|| lookup::<Overflow>(ev, Property::Overflow))
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

type Constructor = fn(&Args) -> Result<Property, Error>;

/// A trailing argument that may be omitted, nil or `{}`.
fn unset_arg<T: FromScript>(args: &Args, index: usize) -> Result<Unset<T>, Error> {
    match args.raw(index) {
        LuaValue::Nil => Ok(Unset::unset()),
        _ => args.get::<Unset<T>>(index),
    }
}

fn is_nil_only(args: &Args) -> bool {
    args.len() == 1 && args.raw(0).is_nil()
}

fn color_or_transparent(args: &Args) -> Result<Color, Error> {
    args.arity(1, 1)?;
    Ok(args.opt::<Color>(0)?.unwrap_or(Color::TRANSPARENT))
}

fn border_line(args: &Args) -> Result<BorderLine, Error> {
    if is_nil_only(args) {
        return Ok(BorderLine::NONE);
    }
    args.arity(2, 2)?;
    Ok(BorderLine { width: args.get(0)?, color: args.get(1)? })
}

fn shadow(args: &Args) -> Result<Option<Shadow>, Error> {
    if is_nil_only(args) {
        return Ok(None);
    }
    args.arity(4, 5)?;
    let (spread, color) = if args.len() == 5 { (args.get(3)?, args.get(4)?) } else { (Metric::ZERO, args.get(3)?) };
    Ok(Some(Shadow { offset_x: args.get(0)?, offset_y: args.get(1)?, blur: args.get(2)?, spread, color }))
}

fn dimensions(args: &Args) -> Result<Dimensions, Error> {
    args.arity(1, 2)?;
    if args.len() == 1 {
        let both: Unset<Metric> = unset_arg(args, 0)?;
        return Ok(Dimensions { width: both, height: both });
    }
    Ok(Dimensions { width: unset_arg(args, 0)?, height: unset_arg(args, 1)? })
}

fn edges(args: &Args) -> Result<EdgeBox, Error> {
    args.arity(1, 4)?;
    let values = (0..args.len()).map(|i| unset_arg::<Metric>(args, i)).collect::<Result<Vec<_>, _>>()?;
    EdgeBox::from_shorthand(&values).ok_or_else(|| Error::invalid("edges", "1 to 4 values expected"))
}

fn single<T: FromScript>(args: &Args) -> Result<T, Error> {
    args.arity(1, 1)?;
    args.get(0)
}

fn background_gradient(args: &Args) -> Result<Property, Error> {
    if is_nil_only(args) {
        return Ok(Property::BackgroundGradient(None));
    }
    args.arity(3, 3)?;
    Ok(Property::BackgroundGradient(Some(Gradient {
        from: args.get(0)?,
        to: args.get(1)?,
        direction: args.get::<LayoutDirection>(2)?,
    })))
}

fn background_image(args: &Args) -> Result<Property, Error> {
    args.arity(0, 6)?;
    if is_nil_only(args) {
        return Ok(Property::BackgroundImage(BackgroundImage {
            url: Unset::set(String::new()),
            ..Default::default()
        }));
    }
    let scale = unset_arg::<Vector<2>>(args, 4)?.into_option().map(|v| [v.x() as f32, v.y() as f32]);
    Ok(Property::BackgroundImage(BackgroundImage {
        url: unset_arg(args, 0)?,
        overlay: unset_arg(args, 1)?,
        repeat: unset_arg::<Repeat>(args, 2)?,
        sizing: unset_arg::<Sizing>(args, 3)?,
        scale: scale.map_or(Unset::unset(), Unset::set),
        dpi_margin: unset_arg(args, 5)?,
    }))
}

fn background_cropping(args: &Args) -> Result<Property, Error> {
    args.arity(1, 2)?;
    let offset = args.get::<Vector<2>>(0)?;
    let size = unset_arg::<Vector<2>>(args, 1)?.into_option().map(|v| [v.x() as f32, v.y() as f32]);
    Ok(Property::BackgroundCropping {
        offset: [offset.x() as f32, offset.y() as f32],
        size: size.map_or(Unset::unset(), Unset::set),
    })
}

fn cursor(args: &Args) -> Result<Property, Error> {
    args.arity(1, 2)?;
    let size = args.opt::<i64>(1)?.map(|s| s as i32);
    Ok(Property::Cursor(CursorStyle { name: args.get(0)?, size }))
}

fn expanding(args: &Args) -> Result<Property, Error> {
    args.arity(0, 2)?;
    let expanding = match args.len() {
        0 => Expanding { horizontal: Unset::set(1), vertical: Unset::set(1) },
        1 => {
            let both = unset_arg::<u32>(args, 0)?;
            Expanding { horizontal: both, vertical: both }
        }
        _ => Expanding { horizontal: unset_arg(args, 0)?, vertical: unset_arg(args, 1)? },
    };
    Ok(Property::Expanding(expanding))
}

fn scrollbar_appearance(args: &Args) -> Result<Property, Error> {
    args.arity(1, 2)?;
    let vertical = args.get::<ScrollbarAxis>(0)?;
    let horizontal = if args.len() == 2 { args.get::<ScrollbarAxis>(1)? } else { vertical };
    Ok(Property::ScrollbarAppearance { vertical, horizontal })
}

fn transform_scale(args: &Args) -> Result<Property, Error> {
    args.arity(1, 2)?;
    let x: f32 = args.get(0)?;
    let y = if args.len() == 2 { args.get(1)? } else { x };
    Ok(Property::TransformScale { x, y })
}

const CONSTRUCTORS: &[(&str, Constructor)] = &[
    ("BackgroundSolid", |a| color_or_transparent(a).map(Property::BackgroundSolid)),
    ("BackgroundGradient", background_gradient),
    ("BackgroundImage", background_image),
    ("BackgroundCropping", background_cropping),
    ("BackdropBlur", |a| single(a).map(Property::BackdropBlur)),
    ("Border", |a| border_line(a).map(Property::Border)),
    ("BorderTop", |a| border_line(a).map(Property::BorderTop)),
    ("BorderRight", |a| border_line(a).map(Property::BorderRight)),
    ("BorderBottom", |a| border_line(a).map(Property::BorderBottom)),
    ("BorderLeft", |a| border_line(a).map(Property::BorderLeft)),
    ("BorderRadius", |a| single(a).map(Property::BorderRadius)),
    ("BoxShadow", |a| shadow(a).map(Property::BoxShadow)),
    ("BoxShadowInner", |a| shadow(a).map(Property::BoxShadowInner)),
    ("Cursor", cursor),
    ("Expanding", expanding),
    ("FixedSize", |a| dimensions(a).map(Property::FixedSize)),
    ("MinSize", |a| dimensions(a).map(Property::MinSize)),
    ("MaxSize", |a| dimensions(a).map(Property::MaxSize)),
    ("Font", |a| single(a).map(Property::Font)),
    ("FontFamily", |a| single(a).map(Property::FontFamily)),
    ("FontSize", |a| single(a).map(Property::FontSize)),
    ("LayoutSpacing", |a| single(a).map(Property::LayoutSpacing)),
    ("LineHeight", |a| single(a).map(Property::LineHeight)),
    ("Margin", |a| edges(a).map(Property::Margin)),
    ("Padding", |a| edges(a).map(Property::Padding)),
    ("Opacity", |a| single(a).map(Property::Opacity)),
    ("ScrollbarAppearance", scrollbar_appearance),
    ("TextBorder", |a| single(a).map(Property::TextBorder)),
    ("TextColor", |a| single(a).map(Property::TextColor)),
    ("TextShadow", |a| single(a).map(Property::TextShadow)),
    ("TransformOffset", |a| {
        a.arity(2, 2)?;
        Ok(Property::TransformOffset { x: a.get(0)?, y: a.get(1)? })
    }),
    ("TransformRotate", |a| single::<Angle>(a).map(|angle| Property::TransformRotate(angle.0))),
    ("TransformScale", transform_scale),
    ("VisibilityStyle", |a| single::<Visibility>(a).map(Property::Visibility)),
];

/// Install every property constructor as a global function.
pub fn register(lua: &Lua) -> LuaResult<()> {
    let globals = lua.globals();
    for &(name, constructor) in CONSTRUCTORS {
        let f = lua.create_function(move |_, values: LuaMultiValue| {
            let args = Args::new(name, values);
            Ok(PropertyValue(constructor(&args)?))
        })?;
        globals.set(name, f)?;
    }
    tracing::debug!(count = CONSTRUCTORS.len(), "style constructors registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::enums;

    fn lua() -> Lua {
        let lua = Lua::new();
        enums::register_all(&lua).unwrap();
        register(&lua).unwrap();
        lua
    }

    fn eval_property(lua: &Lua, src: &str) -> Property {
        let v: LuaValue = lua.load(src).eval().unwrap();
        property_of(&v).unwrap()
    }

    fn m(v: f32) -> Unset<Metric> {
        Unset::set(Metric(v))
    }

    #[test]
    fn nil_overloads() {
        let lua = lua();
        assert_eq!(eval_property(&lua, "BackgroundSolid(nil)"), Property::BackgroundSolid(Color::TRANSPARENT));
        assert_eq!(eval_property(&lua, "Border(nil)"), Property::Border(BorderLine::NONE));
        assert_eq!(eval_property(&lua, "BoxShadow(nil)"), Property::BoxShadow(None));
    }

    #[test]
    fn padding_follows_css_shorthand() {
        let lua = lua();
        assert_eq!(eval_property(&lua, "Padding(4)"), Property::Padding(EdgeBox::all(m(4.0))));
        assert_eq!(
            eval_property(&lua, "Padding(1, 2, 3)"),
            Property::Padding(EdgeBox::new(m(1.0), m(2.0), m(3.0), m(2.0)))
        );
        assert_eq!(
            eval_property(&lua, "Margin({}, 8)"),
            Property::Margin(EdgeBox::new(Unset::unset(), m(8.0), Unset::unset(), m(8.0)))
        );
    }

    #[test]
    fn colors_from_strings_and_vectors() {
        let lua = lua();
        assert_eq!(eval_property(&lua, "TextColor({255, 0, 0})"), Property::TextColor(Color::RED));
        assert_eq!(eval_property(&lua, "BackgroundSolid('#00ff00')"), Property::BackgroundSolid(Color::GREEN));
    }

    #[test]
    fn keyword_enums_are_declarations() {
        let lua = lua();
        assert_eq!(eval_property(&lua, "TextAlign.CENTER"), Property::TextAlign(TextAlign::Center));
        assert_eq!(eval_property(&lua, "Overflow.HIDDEN"), Property::Overflow(Overflow::Hidden));
        let v: LuaValue = lua.load("Visibility.GONE").eval().unwrap();
        assert!(property_of(&v).is_none());
        assert_eq!(
            eval_property(&lua, "VisibilityStyle(Visibility.GONE)"),
            Property::Visibility(Visibility::Gone)
        );
    }

    #[test]
    fn wrong_arguments_are_catchable() {
        let lua = lua();
        let msg: String = lua
            .load("local ok, err = pcall(FontSize, {}) return tostring(err)")
            .eval()
            .unwrap();
        assert!(msg.contains("type mismatch"), "{msg}");
        let msg: String = lua
            .load("local ok, err = pcall(Opacity) return tostring(err)")
            .eval()
            .unwrap();
        assert!(msg.contains("arguments to Opacity"), "{msg}");
    }

    #[test]
    fn scale_and_expanding_defaults() {
        let lua = lua();
        assert_eq!(eval_property(&lua, "TransformScale(2)"), Property::TransformScale { x: 2.0, y: 2.0 });
        assert_eq!(
            eval_property(&lua, "Expanding()"),
            Property::Expanding(Expanding { horizontal: Unset::set(1), vertical: Unset::set(1) })
        );
    }
}
