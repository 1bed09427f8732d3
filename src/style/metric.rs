//! Scalar style values: Metric (dp), Unset wrapper, four-sided boxes.

use std::fmt;

/// A length in density-independent pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Metric(pub f32);

impl Metric {
    pub const ZERO: Metric = Metric(0.0);

    /// Convert to physical pixels for the given DPI ratio.
    pub fn to_px(self, dpi_ratio: f32) -> f32 {
        self.0 * dpi_ratio
    }
}

impl From<f32> for Metric {
    fn from(v: f32) -> Self {
        Metric(v)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{}dp", self.0 as i64)
        } else {
            write!(f, "{}dp", self.0)
        }
    }
}

/// A value that is either explicitly provided or left at its default.
///
/// Unset fields do not override lower-precedence declarations when styles
/// are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Unset<T>(Option<T>);

impl<T> Unset<T> {
    pub const fn unset() -> Self {
        Unset(None)
    }

    pub const fn set(value: T) -> Self {
        Unset(Some(value))
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }

    pub fn into_option(self) -> Option<T> {
        self.0
    }

    /// Keep `self` when set, otherwise take `fallback`.
    pub fn or(self, fallback: Unset<T>) -> Unset<T> {
        if self.is_set() {
            self
        } else {
            fallback
        }
    }
}

impl<T: Copy> Unset<T> {
    pub fn or_value(&self, default: T) -> T {
        self.0.unwrap_or(default)
    }
}

impl<T> Default for Unset<T> {
    fn default() -> Self {
        Unset(None)
    }
}

impl<T> From<T> for Unset<T> {
    fn from(v: T) -> Self {
        Unset(Some(v))
    }
}

impl<T: fmt::Display> fmt::Display for Unset<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(v) => v.fmt(f),
            None => f.write_str("unset"),
        }
    }
}

/// Four-sided metrics (top, right, bottom, left) as used by margin and padding.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EdgeBox {
    pub top: Unset<Metric>,
    pub right: Unset<Metric>,
    pub bottom: Unset<Metric>,
    pub left: Unset<Metric>,
}

impl EdgeBox {
    pub fn all(v: Unset<Metric>) -> Self {
        Self { top: v, right: v, bottom: v, left: v }
    }

    pub fn symmetric(vertical: Unset<Metric>, horizontal: Unset<Metric>) -> Self {
        Self { top: vertical, right: horizontal, bottom: vertical, left: horizontal }
    }

    pub fn new(
        top: Unset<Metric>,
        right: Unset<Metric>,
        bottom: Unset<Metric>,
        left: Unset<Metric>,
    ) -> Self {
        Self { top, right, bottom, left }
    }

    /// Build from the CSS shorthand convention.
    ///
    /// - 1 value: all sides
    /// - 2 values: vertical, horizontal
    /// - 3 values: top, horizontal, bottom
    /// - 4 values: top, right, bottom, left
    ///
    /// Returns `None` for any other count.
    pub fn from_shorthand(values: &[Unset<Metric>]) -> Option<Self> {
        match *values {
            [a] => Some(Self::all(a)),
            [v, h] => Some(Self::symmetric(v, h)),
            [t, h, b] => Some(Self::new(t, h, b, h)),
            [t, r, b, l] => Some(Self::new(t, r, b, l)),
            _ => None,
        }
    }

    /// Per-side merge: sides set in `self` win over `lower`.
    pub fn over(self, lower: EdgeBox) -> EdgeBox {
        EdgeBox {
            top: self.top.or(lower.top),
            right: self.right.or(lower.right),
            bottom: self.bottom.or(lower.bottom),
            left: self.left.or(lower.left),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(v: f32) -> Unset<Metric> {
        Unset::set(Metric(v))
    }

    #[test]
    fn metric_display() {
        assert_eq!(Metric(10.0).to_string(), "10dp");
        assert_eq!(Metric(2.5).to_string(), "2.5dp");
        assert_eq!(Metric(2.0).to_px(1.5), 3.0);
    }

    #[test]
    fn unset_or_prefers_set_value() {
        let a: Unset<i32> = Unset::set(1);
        let b: Unset<i32> = Unset::unset();
        assert_eq!(a.or(Unset::set(2)), Unset::set(1));
        assert_eq!(b.or(Unset::set(2)), Unset::set(2));
        assert_eq!(b.or_value(7), 7);
        assert_eq!(b.to_string(), "unset");
    }

    #[test]
    fn shorthand_two_values() {
        let b = EdgeBox::from_shorthand(&[m(10.0), m(20.0)]).unwrap();
        assert_eq!(b.top, m(10.0));
        assert_eq!(b.bottom, m(10.0));
        assert_eq!(b.left, m(20.0));
        assert_eq!(b.right, m(20.0));
    }

    #[test]
    fn shorthand_three_values() {
        let b = EdgeBox::from_shorthand(&[m(1.0), m(2.0), m(3.0)]).unwrap();
        assert_eq!((b.top, b.right, b.bottom, b.left), (m(1.0), m(2.0), m(3.0), m(2.0)));
    }

    #[test]
    fn shorthand_four_values() {
        let b = EdgeBox::from_shorthand(&[m(10.0), m(20.0), m(30.0), m(40.0)]).unwrap();
        assert_eq!(b.top, m(10.0));
        assert_eq!(b.right, m(20.0));
        assert_eq!(b.bottom, m(30.0));
        assert_eq!(b.left, m(40.0));
    }

    #[test]
    fn shorthand_rejects_bad_arity() {
        assert!(EdgeBox::from_shorthand(&[]).is_none());
        assert!(EdgeBox::from_shorthand(&[m(1.0); 5]).is_none());
    }

    #[test]
    fn over_merges_per_side() {
        let upper = EdgeBox::from_shorthand(&[Unset::unset(), m(20.0)]).unwrap();
        let lower = EdgeBox::all(m(5.0));
        let merged = upper.over(lower);
        assert_eq!(merged.top, m(5.0));
        assert_eq!(merged.left, m(20.0));
    }
}
