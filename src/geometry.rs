//! Geometry primitives: Offset, Size, Region.
//!
//! All values are logical pixels (density-independent). Positions are relative
//! to the parent view unless a function says otherwise.

use std::fmt;
use std::ops::{Add, Neg, Sub};

// ---------------------------------------------------------------------------
// Offset
// ---------------------------------------------------------------------------

/// A 2D position or displacement.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Offset {
    pub x: i32,
    pub y: i32,
}

impl Offset {
    /// The origin.
    pub const ZERO: Offset = Offset { x: 0, y: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Build an offset from floating point components, rounding to the nearest pixel.
    #[inline]
    pub fn from_f32(x: f32, y: f32) -> Self {
        Self { x: x.round() as i32, y: y.round() as i32 }
    }
}

impl Add for Offset {
    type Output = Offset;
    #[inline]
    fn add(self, rhs: Offset) -> Offset {
        Offset { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl Sub for Offset {
    type Output = Offset;
    #[inline]
    fn sub(self, rhs: Offset) -> Offset {
        Offset { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl Neg for Offset {
    type Output = Offset;
    #[inline]
    fn neg(self) -> Offset {
        Offset { x: -self.x, y: -self.y }
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Size
// ---------------------------------------------------------------------------

/// A 2D extent (width x height).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const ZERO: Size = Size { width: 0, height: 0 };

    #[inline]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn from_f32(width: f32, height: f32) -> Self {
        Self { width: width.round() as i32, height: height.round() as i32 }
    }

    /// Whether the local point lies inside `0..width` x `0..height`.
    #[inline]
    pub const fn contains(self, point: Offset) -> bool {
        point.x >= 0 && point.x < self.width && point.y >= 0 && point.y < self.height
    }

    /// Component-wise maximum.
    #[inline]
    pub fn max(self, other: Size) -> Size {
        Size { width: self.width.max(other.width), height: self.height.max(other.height) }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

/// A rectangle defined by its top-left corner and size.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Region {
    pub origin: Offset,
    pub size: Size,
}

impl Region {
    #[inline]
    pub const fn new(origin: Offset, size: Size) -> Self {
        Self { origin, size }
    }

    /// Whether `point` (in the same coordinate space as `origin`) is inside.
    #[inline]
    pub const fn contains(self, point: Offset) -> bool {
        self.size.contains(Offset::new(point.x - self.origin.x, point.y - self.origin.y))
    }

    /// The center point, rounded towards the origin.
    #[inline]
    pub const fn center(self) -> Offset {
        Offset::new(
            self.origin.x + self.size.width / 2,
            self.origin.y + self.size.height / 2,
        )
    }

    /// Move the region by `delta`.
    #[inline]
    pub fn translate(self, delta: Offset) -> Region {
        Region { origin: self.origin + delta, size: self.size }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_arithmetic() {
        let a = Offset::new(3, 4);
        let b = Offset::new(1, 2);
        assert_eq!(a + b, Offset::new(4, 6));
        assert_eq!(a - b, Offset::new(2, 2));
        assert_eq!(-a, Offset::new(-3, -4));
    }

    #[test]
    fn offset_from_f32_rounds() {
        assert_eq!(Offset::from_f32(1.4, 1.6), Offset::new(1, 2));
    }

    #[test]
    fn size_contains_is_half_open() {
        let s = Size::new(10, 5);
        assert!(s.contains(Offset::new(0, 0)));
        assert!(s.contains(Offset::new(9, 4)));
        assert!(!s.contains(Offset::new(10, 0)));
        assert!(!s.contains(Offset::new(0, -1)));
    }

    #[test]
    fn size_max() {
        assert_eq!(Size::new(3, 9).max(Size::new(5, 2)), Size::new(5, 9));
    }

    #[test]
    fn region_contains_uses_origin() {
        let r = Region::new(Offset::new(10, 10), Size::new(5, 5));
        assert!(r.contains(Offset::new(10, 10)));
        assert!(r.contains(Offset::new(14, 14)));
        assert!(!r.contains(Offset::new(9, 12)));
        assert!(!r.contains(Offset::new(15, 12)));
    }

    #[test]
    fn region_center_and_translate() {
        let r = Region::new(Offset::new(0, 0), Size::new(10, 4));
        assert_eq!(r.center(), Offset::new(5, 2));
        assert_eq!(r.translate(Offset::new(2, 3)).origin, Offset::new(2, 3));
    }

    #[test]
    fn display_formats() {
        assert_eq!(Offset::new(1, -2).to_string(), "(1, -2)");
        assert_eq!(Size::new(30, 40).to_string(), "30x40");
    }
}
