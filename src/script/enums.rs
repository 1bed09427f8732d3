//! Native enums exposed as read-only script tables.
//!
//! Each exposed enum becomes a global table (`Visibility.GONE`) whose values
//! are small [`EnumValue`] userdata. Bindings accept either such a value or
//! the variant name as a string (case-insensitive).
//!
//! Keyword style properties (`TextAlign`, `Overflow`, ...) reuse the same
//! tables: `TextAlign.CENTER` is accepted as a declaration by the style
//! resolver, see [`super::rules::enum_property`].

use std::fmt;

use mlua::prelude::*;
use mlua::{MetaMethod, UserData, UserDataMethods};

use super::convert::FromScript;
use crate::animation::Curve;
use crate::error::ConversionError;
use crate::event::input::PointerButton;
use crate::event::window::TouchscreenKeyboardPolicy;
use crate::style::property::{
    LayoutDirection, Overflow, Repeat, ScrollbarAxis, Sizing, TextAlign, TextOverflow, TextTransform,
    VerticalAlign, Visibility,
};
use crate::widgets::input::{TextInputAction, TextInputType};

/// A native enum with script-visible variant names.
pub trait ScriptEnum: Copy + PartialEq + 'static {
    /// Global table name.
    const NAME: &'static str;
    const VARIANTS: &'static [(&'static str, Self)];

    fn variant_name(self) -> &'static str {
        Self::VARIANTS.iter().find(|(_, v)| *v == self).map_or("?", |(n, _)| n)
    }

    fn from_variant_name(name: &str) -> Option<Self> {
        Self::VARIANTS.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| *v)
    }
}

/// Script-side enum value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumValue {
    pub kind: &'static str,
    pub variant: &'static str,
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind, self.variant)
    }
}

impl UserData for EnumValue {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_meta_method(MetaMethod::Eq, |_, this, other: LuaAnyUserData| {
            Ok(other.borrow::<EnumValue>().is_ok_and(|o| *o == *this))
        });
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| Ok(this.to_string()));
    }
}

/// Convert a script value to `T`.
pub fn enum_from_script<T: ScriptEnum>(value: &LuaValue) -> Result<T, ConversionError> {
    let fail = |message: String| ConversionError::new(T::NAME, value.type_name(), message);
    match value {
        LuaValue::UserData(ud) => {
            let ev = ud.borrow::<EnumValue>().map_err(|_| fail(format!("{} expected", T::NAME)))?;
            if ev.kind != T::NAME {
                return Err(fail(format!("{} expected, got {}", T::NAME, *ev)));
            }
            T::from_variant_name(ev.variant).ok_or_else(|| fail(format!("unknown variant {}", ev.variant)))
        }
        LuaValue::String(s) => {
            let name = s.to_string_lossy();
            T::from_variant_name(&name).ok_or_else(|| fail(format!("unknown {} variant {name:?}", T::NAME)))
        }
        _ => Err(fail(format!("{} expected", T::NAME))),
    }
}

pub fn enum_to_script<T: ScriptEnum>(lua: &Lua, value: T) -> LuaResult<LuaValue> {
    lua.create_userdata(EnumValue { kind: T::NAME, variant: value.variant_name() }).map(LuaValue::UserData)
}

/// Install `T`'s global table.
pub fn register_enum<T: ScriptEnum>(lua: &Lua) -> LuaResult<()> {
    register_enum_as::<T>(lua, T::NAME)
}

/// Install `T`'s table under another global name as well.
pub fn register_enum_as<T: ScriptEnum>(lua: &Lua, global: &str) -> LuaResult<()> {
    let table = lua.create_table()?;
    for (name, value) in T::VARIANTS {
        table.set(*name, enum_to_script(lua, *value)?)?;
    }
    lua.globals().set(global, table)
}

macro_rules! script_enum {
    ($ty:ty, $name:literal, [$($variant:literal => $value:expr),+ $(,)?]) => {
        impl ScriptEnum for $ty {
            const NAME: &'static str = $name;
            const VARIANTS: &'static [(&'static str, Self)] = &[$(($variant, $value)),+];
        }

        impl FromScript for $ty {
            const TYPE_NAME: &'static str = $name;

            fn from_script(value: &LuaValue) -> Result<Self, ConversionError> {
                enum_from_script::<$ty>(value)
            }
        }

        impl FromLua for $ty {
            fn from_lua(value: LuaValue, _lua: &Lua) -> LuaResult<Self> {
                Ok(enum_from_script::<$ty>(&value)?)
            }
        }

        impl IntoLua for $ty {
            fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
                enum_to_script(lua, self)
            }
        }
    };
}

script_enum!(LayoutDirection, "LayoutDirection", [
    "NONE" => LayoutDirection::None,
    "HORIZONTAL" => LayoutDirection::Horizontal,
    "VERTICAL" => LayoutDirection::Vertical,
]);

script_enum!(TextInputType, "TextInputType", [
    "DEFAULT" => TextInputType::Text,
    "NUMBER" => TextInputType::Number,
    "EMAIL" => TextInputType::Email,
    "PASSWORD" => TextInputType::Password,
    "URL" => TextInputType::Url,
    "PHONE" => TextInputType::Phone,
]);

script_enum!(TextInputAction, "TextInputAction", [
    "DONE" => TextInputAction::Done,
    "GO" => TextInputAction::Go,
    "NEXT" => TextInputAction::Next,
    "SEARCH" => TextInputAction::Search,
    "SEND" => TextInputAction::Send,
]);

script_enum!(TouchscreenKeyboardPolicy, "TouchscreenKeyboardPolicy", [
    "SHOWN_IF_NEEDED" => TouchscreenKeyboardPolicy::ShownIfNeeded,
    "MANUAL" => TouchscreenKeyboardPolicy::Manual,
]);

script_enum!(ScrollbarAxis, "ScrollbarAppearanceAxis", [
    "GONE" => ScrollbarAxis::Gone,
    "VISIBLE" => ScrollbarAxis::Visible,
    "ON_DEMAND" => ScrollbarAxis::OnDemand,
]);

script_enum!(Visibility, "Visibility", [
    "VISIBLE" => Visibility::Visible,
    "INVISIBLE" => Visibility::Invisible,
    "GONE" => Visibility::Gone,
]);

script_enum!(TextAlign, "TextAlign", [
    "LEFT" => TextAlign::Left,
    "CENTER" => TextAlign::Center,
    "RIGHT" => TextAlign::Right,
    "JUSTIFY" => TextAlign::Justify,
]);

script_enum!(TextOverflow, "TextOverflow", [
    "NONE" => TextOverflow::None,
    "ELLIPSIS" => TextOverflow::Ellipsis,
    "CLIP" => TextOverflow::Clip,
]);

script_enum!(TextTransform, "TextTransform", [
    "NONE" => TextTransform::None,
    "UPPERCASE" => TextTransform::Uppercase,
    "LOWERCASE" => TextTransform::Lowercase,
]);

script_enum!(VerticalAlign, "VerticalAlign", [
    "DEFAULT" => VerticalAlign::Default,
    "MIDDLE" => VerticalAlign::Middle,
]);

script_enum!(Overflow, "Overflow", [
    "VISIBLE" => Overflow::Visible,
    "HIDDEN" => Overflow::Hidden,
    "HIDDEN_FROM_OUTSIDE" => Overflow::HiddenFromOutside,
]);

script_enum!(Repeat, "Repeat", [
    "NONE" => Repeat::None,
    "X" => Repeat::X,
    "Y" => Repeat::Y,
    "X_Y" => Repeat::XY,
]);

script_enum!(Sizing, "Sizing", [
    "NONE" => Sizing::None,
    "FIT" => Sizing::Fit,
    "FIT_PADDING" => Sizing::FitPadding,
    "COVER" => Sizing::Cover,
    "STRETCH" => Sizing::Stretch,
    "CENTER" => Sizing::Center,
    "TILE" => Sizing::Tile,
    "CROPPED" => Sizing::Cropped,
    "SPLIT_SCALE" => Sizing::SplitScale,
    "CONTAIN" => Sizing::Contain,
    "CONTAIN_PADDING" => Sizing::ContainPadding,
]);

script_enum!(Curve, "Curve", [
    "LINEAR" => Curve::Linear,
    "EASE_IN" => Curve::EaseIn,
    "EASE_OUT" => Curve::EaseOut,
    "EASE_IN_OUT" => Curve::EaseInOut,
    "BOUNCE" => Curve::Bounce,
]);

script_enum!(PointerButton, "PointerButton", [
    "LEFT" => PointerButton::Left,
    "RIGHT" => PointerButton::Right,
    "MIDDLE" => PointerButton::Middle,
]);

/// Install every enum table.
pub fn register_all(lua: &Lua) -> LuaResult<()> {
    register_enum::<LayoutDirection>(lua)?;
    register_enum_as::<LayoutDirection>(lua, "ALayoutDirection")?;
    register_enum::<TextInputType>(lua)?;
    register_enum::<TextInputAction>(lua)?;
    register_enum::<TouchscreenKeyboardPolicy>(lua)?;
    register_enum::<ScrollbarAxis>(lua)?;
    register_enum_as::<ScrollbarAxis>(lua, "AxisValue")?;
    register_enum::<Visibility>(lua)?;
    register_enum::<TextAlign>(lua)?;
    register_enum::<TextOverflow>(lua)?;
    register_enum::<TextTransform>(lua)?;
    register_enum::<VerticalAlign>(lua)?;
    register_enum::<Overflow>(lua)?;
    register_enum::<Repeat>(lua)?;
    register_enum::<Sizing>(lua)?;
    register_enum::<Curve>(lua)?;
    register_enum::<PointerButton>(lua)?;
    tracing::debug!("enums registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_values_convert_back() {
        let lua = Lua::new();
        register_all(&lua).unwrap();
        let v: Visibility = lua.load("Visibility.GONE").eval().unwrap();
        assert_eq!(v, Visibility::Gone);
        let d: LayoutDirection = lua.load("ALayoutDirection.VERTICAL").eval().unwrap();
        assert_eq!(d, LayoutDirection::Vertical);
    }

    #[test]
    fn strings_are_accepted() {
        let lua = Lua::new();
        let c: Curve = lua.load("'ease_in'").eval().unwrap();
        assert_eq!(c, Curve::EaseIn);
    }

    #[test]
    fn wrong_enum_kind_is_rejected() {
        let lua = Lua::new();
        register_all(&lua).unwrap();
        let r: LuaResult<Visibility> = lua.load("TextAlign.LEFT").eval();
        assert!(r.is_err());
    }

    #[test]
    fn values_compare_and_print() {
        let lua = Lua::new();
        register_all(&lua).unwrap();
        let (eq, name): (bool, String) =
            lua.load("return Visibility.GONE == Visibility.GONE, tostring(Visibility.GONE)").eval().unwrap();
        assert!(eq);
        assert_eq!(name, "Visibility.GONE");
    }
}
