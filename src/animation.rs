//! Animator descriptions attached to views.
//!
//! An [`Animator`] only describes an animation; playing it back is the
//! renderer's job. Views hold at most one.

use std::fmt;
use std::time::Duration;

use crate::geometry::Size;

/// Easing curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Curve {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    Bounce,
}

impl Curve {
    /// Eased progress for linear progress `t` in `0.0..=1.0`.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Curve::Linear => t,
            Curve::EaseIn => t * t,
            Curve::EaseOut => t * (2.0 - t),
            Curve::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Curve::Bounce => {
                let n = 7.5625;
                let d = 2.75;
                if t < 1.0 / d {
                    n * t * t
                } else if t < 2.0 / d {
                    let t = t - 1.5 / d;
                    n * t * t + 0.75
                } else if t < 2.5 / d {
                    let t = t - 2.25 / d;
                    n * t * t + 0.9375
                } else {
                    let t = t - 2.625 / d;
                    n * t * t + 0.984375
                }
            }
        }
    }
}

/// What an animator changes, from a start value to an end value.
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationKind {
    /// Offset from the laid-out position.
    Translation { from: [f32; 2], to: [f32; 2] },
    Size { from: Size, to: Size },
    /// Radians.
    Rotation { from: f32, to: f32 },
    /// Pulses the view to draw attention after it gains focus.
    Focus,
    /// Does nothing; keeps a slot in a combination.
    Placeholder,
    Combination(Vec<Animator>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Animator {
    pub kind: AnimationKind,
    pub duration: Duration,
    pub curve: Curve,
    pub repeating: bool,
    pub paused: bool,
}

impl Animator {
    pub const DEFAULT_DURATION: Duration = Duration::from_millis(250);

    pub fn new(kind: AnimationKind) -> Self {
        Self {
            kind,
            duration: Self::DEFAULT_DURATION,
            curve: Curve::default(),
            repeating: false,
            paused: false,
        }
    }

    pub fn translation(from: [f32; 2], to: [f32; 2]) -> Self {
        Self::new(AnimationKind::Translation { from, to })
    }

    pub fn size(from: Size, to: Size) -> Self {
        Self::new(AnimationKind::Size { from, to })
    }

    pub fn rotation(from: f32, to: f32) -> Self {
        Self::new(AnimationKind::Rotation { from, to })
    }

    pub fn focus() -> Self {
        Self::new(AnimationKind::Focus)
    }

    pub fn placeholder() -> Self {
        Self::new(AnimationKind::Placeholder)
    }

    /// Run `parts` together. The combination lasts as long as its longest part.
    pub fn combination(parts: Vec<Animator>) -> Self {
        let duration = parts.iter().map(|p| p.duration).max().unwrap_or(Self::DEFAULT_DURATION);
        Self { duration, ..Self::new(AnimationKind::Combination(parts)) }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curve = curve;
        self
    }

    pub fn with_repeating(mut self, repeating: bool) -> Self {
        self.repeating = repeating;
        self
    }

    pub fn paused(mut self) -> Self {
        self.paused = true;
        self
    }
}

impl fmt::Display for Animator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            AnimationKind::Translation { from, to } => {
                write!(f, "translation({}, {} -> {}, {})", from[0], from[1], to[0], to[1])?
            }
            AnimationKind::Size { from, to } => {
                write!(f, "size({}x{} -> {}x{})", from.width, from.height, to.width, to.height)?
            }
            AnimationKind::Rotation { from, to } => write!(
                f,
                "rotation({}deg -> {}deg)",
                from.to_degrees().round(),
                to.to_degrees().round()
            )?,
            AnimationKind::Focus => f.write_str("focus")?,
            AnimationKind::Placeholder => f.write_str("placeholder")?,
            AnimationKind::Combination(parts) => {
                f.write_str("combination[")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{part}")?;
                }
                f.write_str("]")?;
            }
        }
        write!(f, " {}ms {:?}", self.duration.as_millis(), self.curve)?;
        if self.repeating {
            f.write_str(" repeating")?;
        }
        if self.paused {
            f.write_str(" paused")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curves_hit_endpoints() {
        for curve in [Curve::Linear, Curve::EaseIn, Curve::EaseOut, Curve::EaseInOut] {
            assert_eq!(curve.apply(0.0), 0.0);
            assert!((curve.apply(1.0) - 1.0).abs() < 1e-6);
        }
        assert!((Curve::Bounce.apply(1.0) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn combination_takes_longest_duration() {
        let a = Animator::translation([0.0, 0.0], [1.0, 2.0]).with_duration(Duration::from_millis(100));
        let b = Animator::rotation(0.0, 1.0).with_duration(Duration::from_millis(400));
        let c = Animator::combination(vec![a, b]);
        assert_eq!(c.duration, Duration::from_millis(400));
    }

    #[test]
    fn display_summarizes() {
        let a = Animator::size(Size::new(10, 20), Size::new(30, 40))
            .with_curve(Curve::EaseIn)
            .with_repeating(true)
            .paused();
        assert_eq!(a.to_string(), "size(10x20 -> 30x40) 250ms EaseIn repeating paused");
        let r = Animator::rotation(0.0, std::f32::consts::PI);
        assert_eq!(r.to_string(), "rotation(0deg -> 180deg) 250ms Linear");
    }
}
