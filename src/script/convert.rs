//! Value bridge: native values <-> Lua values.
//!
//! [`FromScript`] never raises a Lua error itself; it returns a
//! [`ConversionError`] and the calling binding turns it into one through
//! `?`. [`ToScript`] builds the Lua value for a native one.

use mlua::prelude::*;

use crate::error::{ConversionError, Error};
use crate::geometry::{Offset, Size};
use crate::style::color::Color;
use crate::style::metric::{Metric, Unset};

/// Conversion from a Lua value.
pub trait FromScript: Sized {
    /// Name used in error messages.
    const TYPE_NAME: &'static str;

    fn from_script(value: &LuaValue) -> Result<Self, ConversionError>;
}

/// Conversion into a Lua value.
pub trait ToScript {
    fn to_script(&self, lua: &Lua) -> LuaResult<LuaValue>;
}

fn mismatch<T: FromScript>(value: &LuaValue, message: impl Into<String>) -> ConversionError {
    ConversionError::new(T::TYPE_NAME, value.type_name(), message)
}

/// Lua numbers and integers as `f64`.
pub fn number(value: &LuaValue) -> Option<f64> {
    match value {
        LuaValue::Integer(i) => Some(*i as f64),
        LuaValue::Number(n) => Some(*n),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Vectors
// ---------------------------------------------------------------------------

/// An N-component numeric vector. Converts from any table with at least N
/// array elements; extra elements are ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector<const N: usize>(pub [f64; N]);

impl<const N: usize> Vector<N> {
    pub fn x(&self) -> f64 {
        self.0[0]
    }

    pub fn y(&self) -> f64 {
        self.0[1]
    }
}

impl<const N: usize> FromScript for Vector<N> {
    const TYPE_NAME: &'static str = "vector";

    fn from_script(value: &LuaValue) -> Result<Self, ConversionError> {
        let message = format!("expected table of size {N} (vec{N})");
        let LuaValue::Table(table) = value else {
            return Err(ConversionError::new(format!("vec{N}"), value.type_name(), message));
        };
        if table.raw_len() < N {
            return Err(ConversionError::new(format!("vec{N}"), "table", message));
        }
        let mut out = [0.0; N];
        for (i, slot) in out.iter_mut().enumerate() {
            let item: LuaValue = table
                .raw_get(i + 1)
                .map_err(|e| ConversionError::new(format!("vec{N}"), "table", e.to_string()))?;
            *slot = number(&item).ok_or_else(|| {
                ConversionError::new(format!("vec{N}"), item.type_name(), message.clone())
            })?;
        }
        Ok(Vector(out))
    }
}

impl<const N: usize> ToScript for Vector<N> {
    fn to_script(&self, lua: &Lua) -> LuaResult<LuaValue> {
        Ok(LuaValue::Table(lua.create_sequence_from(self.0)?))
    }
}

impl ToScript for Offset {
    fn to_script(&self, lua: &Lua) -> LuaResult<LuaValue> {
        Ok(LuaValue::Table(lua.create_sequence_from([self.x, self.y])?))
    }
}

impl FromScript for Offset {
    const TYPE_NAME: &'static str = "vec2";

    fn from_script(value: &LuaValue) -> Result<Self, ConversionError> {
        let v = Vector::<2>::from_script(value)?;
        Ok(Offset::from_f32(v.0[0] as f32, v.0[1] as f32))
    }
}

impl ToScript for Size {
    fn to_script(&self, lua: &Lua) -> LuaResult<LuaValue> {
        Ok(LuaValue::Table(lua.create_sequence_from([self.width, self.height])?))
    }
}

impl FromScript for Size {
    const TYPE_NAME: &'static str = "vec2";

    fn from_script(value: &LuaValue) -> Result<Self, ConversionError> {
        let v = Vector::<2>::from_script(value)?;
        Ok(Size::from_f32(v.0[0] as f32, v.0[1] as f32))
    }
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

impl FromScript for f64 {
    const TYPE_NAME: &'static str = "number";

    fn from_script(value: &LuaValue) -> Result<Self, ConversionError> {
        number(value).ok_or_else(|| mismatch::<Self>(value, "number expected"))
    }
}

impl FromScript for f32 {
    const TYPE_NAME: &'static str = "number";

    fn from_script(value: &LuaValue) -> Result<Self, ConversionError> {
        f64::from_script(value).map(|n| n as f32)
    }
}

impl FromScript for i64 {
    const TYPE_NAME: &'static str = "integer";

    fn from_script(value: &LuaValue) -> Result<Self, ConversionError> {
        match value {
            LuaValue::Integer(i) => Ok(*i),
            LuaValue::Number(n) if n.fract() == 0.0 => Ok(*n as i64),
            _ => Err(mismatch::<Self>(value, "integer expected")),
        }
    }
}

impl FromScript for u32 {
    const TYPE_NAME: &'static str = "unsigned integer";

    fn from_script(value: &LuaValue) -> Result<Self, ConversionError> {
        let n = i64::from_script(value).map_err(|_| mismatch::<Self>(value, "integer expected"))?;
        u32::try_from(n).map_err(|_| mismatch::<Self>(value, format!("{n} is out of range")))
    }
}

impl FromScript for bool {
    const TYPE_NAME: &'static str = "boolean";

    fn from_script(value: &LuaValue) -> Result<Self, ConversionError> {
        match value {
            LuaValue::Boolean(b) => Ok(*b),
            _ => Err(mismatch::<Self>(value, "boolean expected")),
        }
    }
}

impl FromScript for String {
    const TYPE_NAME: &'static str = "string";

    fn from_script(value: &LuaValue) -> Result<Self, ConversionError> {
        match value {
            LuaValue::String(s) => Ok(s.to_string_lossy()),
            LuaValue::Integer(i) => Ok(i.to_string()),
            LuaValue::Number(n) => Ok(n.to_string()),
            _ => Err(mismatch::<Self>(value, "string expected")),
        }
    }
}

impl FromScript for LuaFunction {
    const TYPE_NAME: &'static str = "function";

    fn from_script(value: &LuaValue) -> Result<Self, ConversionError> {
        value.as_function().cloned().ok_or_else(|| mismatch::<Self>(value, "function expected"))
    }
}

impl FromScript for LuaTable {
    const TYPE_NAME: &'static str = "table";

    fn from_script(value: &LuaValue) -> Result<Self, ConversionError> {
        value.as_table().cloned().ok_or_else(|| mismatch::<Self>(value, "table expected"))
    }
}

impl FromScript for std::path::PathBuf {
    const TYPE_NAME: &'static str = "path";

    fn from_script(value: &LuaValue) -> Result<Self, ConversionError> {
        String::from_script(value).map(std::path::PathBuf::from)
    }
}

/// Lengths in density-independent pixels.
impl FromScript for Metric {
    const TYPE_NAME: &'static str = "metric";

    fn from_script(value: &LuaValue) -> Result<Self, ConversionError> {
        if let Some(n) = number(value) {
            return Ok(Metric(n as f32));
        }
        if let LuaValue::String(s) = value {
            let text = s.to_string_lossy();
            let trimmed = text.trim();
            let digits = trimmed.strip_suffix("dp").or_else(|| trimmed.strip_suffix("px")).unwrap_or(trimmed);
            if let Ok(n) = digits.trim().parse::<f32>() {
                return Ok(Metric(n));
            }
        }
        Err(mismatch::<Self>(value, "number or \"<n>dp\" expected"))
    }
}

/// An angle given in degrees on the script side, radians natively.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Angle(pub f32);

impl FromScript for Angle {
    const TYPE_NAME: &'static str = "angle";

    fn from_script(value: &LuaValue) -> Result<Self, ConversionError> {
        let degrees = f64::from_script(value).map_err(|_| mismatch::<Self>(value, "degrees expected"))?;
        Ok(Angle((degrees as f32).to_radians()))
    }
}

impl ToScript for Angle {
    fn to_script(&self, _lua: &Lua) -> LuaResult<LuaValue> {
        Ok(LuaValue::Number(f64::from(self.0.to_degrees())))
    }
}

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// A string spec (`"#f00"`, `"red"`), or a 3 or 4 component table of bytes
/// clamped to `0..=255`.
impl FromScript for Color {
    const TYPE_NAME: &'static str = "color";

    fn from_script(value: &LuaValue) -> Result<Self, ConversionError> {
        if let LuaValue::String(s) = value {
            return s
                .to_string_lossy()
                .parse::<Color>()
                .map_err(|e| mismatch::<Self>(value, e.to_string()));
        }
        if let Ok(Vector([r, g, b, a])) = Vector::<4>::from_script(value) {
            return Ok(Color::from_bytes(r as f32, g as f32, b as f32, a as f32));
        }
        if let Ok(Vector([r, g, b])) = Vector::<3>::from_script(value) {
            return Ok(Color::from_bytes(r as f32, g as f32, b as f32, 255.0));
        }
        Err(mismatch::<Self>(value, "bad color"))
    }
}

impl ToScript for Color {
    fn to_script(&self, lua: &Lua) -> LuaResult<LuaValue> {
        lua.create_string(self.to_string()).map(LuaValue::String)
    }
}

// ---------------------------------------------------------------------------
// Unset
// ---------------------------------------------------------------------------

fn is_empty_table(value: &LuaValue) -> bool {
    match value {
        LuaValue::Table(t) => t.raw_len() == 0 && t.clone().pairs::<LuaValue, LuaValue>().next().is_none(),
        _ => false,
    }
}

/// `{}` is unset; anything convertible to `T` is set.
impl<T: FromScript> FromScript for Unset<T> {
    const TYPE_NAME: &'static str = T::TYPE_NAME;

    fn from_script(value: &LuaValue) -> Result<Self, ConversionError> {
        if is_empty_table(value) {
            return Ok(Unset::unset());
        }
        T::from_script(value).map(Unset::set)
    }
}

impl<T: ToScript> ToScript for Unset<T> {
    fn to_script(&self, lua: &Lua) -> LuaResult<LuaValue> {
        match self.get() {
            Some(v) => v.to_script(lua),
            None => Ok(LuaValue::Table(lua.create_table()?)),
        }
    }
}

/// `nil` is `None`.
impl<T: FromScript> FromScript for Option<T> {
    const TYPE_NAME: &'static str = T::TYPE_NAME;

    fn from_script(value: &LuaValue) -> Result<Self, ConversionError> {
        match value {
            LuaValue::Nil => Ok(None),
            other => T::from_script(other).map(Some),
        }
    }
}

// ---------------------------------------------------------------------------
// Args
// ---------------------------------------------------------------------------

/// Positional arguments of a binding, checked one by one.
pub struct Args {
    name: &'static str,
    values: Vec<LuaValue>,
}

impl Args {
    pub fn new(name: &'static str, values: LuaMultiValue) -> Self {
        Self { name, values: values.into_iter().collect() }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn raw(&self, index: usize) -> &LuaValue {
        self.values.get(index).unwrap_or(&LuaValue::Nil)
    }

    pub fn values(&self) -> &[LuaValue] {
        &self.values
    }

    /// Argument `index` (0-based) as `T`, or a type mismatch naming both types.
    pub fn get<T: FromScript>(&self, index: usize) -> Result<T, Error> {
        let value = self.raw(index);
        T::from_script(value).map_err(|_| {
            Error::type_mismatch(
                format!("{} (argument {} of {})", T::TYPE_NAME, index + 1, self.name),
                value.type_name(),
            )
        })
    }

    pub fn opt<T: FromScript>(&self, index: usize) -> Result<Option<T>, Error> {
        match self.raw(index) {
            LuaValue::Nil => Ok(None),
            _ => self.get(index).map(Some),
        }
    }

    /// Fail unless the argument count is within `min..=max`.
    pub fn arity(&self, min: usize, max: usize) -> Result<(), Error> {
        let n = self.values.len();
        if n < min || n > max {
            let expected = if min == max { format!("{min}") } else { format!("{min}..{max}") };
            return Err(Error::type_mismatch(
                format!("{expected} arguments to {}", self.name),
                format!("{n} arguments"),
            ));
        }
        Ok(())
    }
}
