//! RGBA colors with normalized components.

use std::fmt;
use std::str::FromStr;

/// An RGBA color, each component in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgba(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Color = Color::rgba(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Color = Color::rgba(0.0, 0.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build from 0–255 channel values. Out of range values are clamped.
    pub fn from_bytes(r: f32, g: f32, b: f32, a: f32) -> Self {
        let n = |v: f32| v.clamp(0.0, 255.0) / 255.0;
        Self { r: n(r), g: n(g), b: n(b), a: n(a) }
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }

    fn to_bytes(self) -> [u8; 4] {
        let b = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [b(self.r), b(self.g), b(self.b), b(self.a)]
    }
}

/// Failure to parse a color string.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("bad color: {0:?}")]
pub struct ParseColorError(pub String);

fn named(name: &str) -> Option<Color> {
    let c = match name {
        "black" => Color::BLACK,
        "white" => Color::WHITE,
        "red" => Color::RED,
        "green" => Color::GREEN,
        "blue" => Color::BLUE,
        "transparent" => Color::TRANSPARENT,
        "gray" | "grey" => Color::from_bytes(128.0, 128.0, 128.0, 255.0),
        "yellow" => Color::from_bytes(255.0, 255.0, 0.0, 255.0),
        "cyan" => Color::from_bytes(0.0, 255.0, 255.0, 255.0),
        "magenta" => Color::from_bytes(255.0, 0.0, 255.0, 255.0),
        "orange" => Color::from_bytes(255.0, 165.0, 0.0, 255.0),
        _ => return None,
    };
    Some(c)
}

impl FromStr for Color {
    type Err = ParseColorError;

    /// Accepts `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa` and a few color names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(c) = named(&trimmed.to_ascii_lowercase()) {
            return Ok(c);
        }
        let err = || ParseColorError(s.to_string());
        let hex = trimmed.strip_prefix('#').ok_or_else(err)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        let digit = |i: usize| u8::from_str_radix(&hex[i..=i], 16).map(|v| (v * 17) as f32);
        let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map(|v| v as f32);
        let channels = match hex.len() {
            3 => [digit(0), digit(1), digit(2), Ok(255.0)],
            4 => [digit(0), digit(1), digit(2), digit(3)],
            6 => [pair(0), pair(2), pair(4), Ok(255.0)],
            8 => [pair(0), pair(2), pair(4), pair(6)],
            _ => return Err(err()),
        };
        let [r, g, b, a] = channels;
        let (r, g, b, a) = (
            r.map_err(|_| err())?,
            g.map_err(|_| err())?,
            b.map_err(|_| err())?,
            a.map_err(|_| err())?,
        );
        Ok(Color::from_bytes(r, g, b, a))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.to_bytes();
        if a == 255 {
            write!(f, "#{r:02x}{g:02x}{b:02x}")
        } else {
            write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}
