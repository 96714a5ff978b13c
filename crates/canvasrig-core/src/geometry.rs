#![forbid(unsafe_code)]

//! Geometric primitives for a rendering surface.
//!
//! All coordinates are viewport CSS pixels (origin at top-left, fractional
//! values allowed). A [`SurfaceRect`] is a snapshot: it is only valid for the
//! call that produced it, since the target may reflow the surface at any
//! scene transition.

use serde::{Deserialize, Serialize};

/// An absolute viewport coordinate, as consumed by input dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation between `from` and `to`.
    ///
    /// Evaluated as `from * (1 - t) + to * t` so that `t == 0.0` yields `from`
    /// and `t == 1.0` yields `to` bit-for-bit.
    #[inline]
    #[must_use]
    pub fn lerp(from: Point, to: Point, t: f64) -> Point {
        let s = 1.0 - t;
        Point {
            x: from.x * s + to.x * t,
            y: from.y * s + to.y * t,
        }
    }
}

/// Bounding box of the rendering surface in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfaceRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width in CSS pixels.
    pub width: f64,
    /// Height in CSS pixels.
    pub height: f64,
}

impl SurfaceRect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle anchored at the viewport origin.
    #[inline]
    pub const fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Right edge.
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// A surface that has not been laid out (or reports garbage) has no area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }

    /// Width over height. `NaN` for empty rectangles.
    #[inline]
    pub fn aspect_ratio(&self) -> f64 {
        if self.is_empty() {
            return f64::NAN;
        }
        self.width / self.height
    }

    /// Check if a point lies inside the rectangle, edges included.
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.right()
            && point.y >= self.y
            && point.y <= self.bottom()
    }

    /// Project a normalized position onto this rectangle.
    ///
    /// Purely linear: fractions outside `[0, 1]` land outside the rectangle.
    #[inline]
    #[must_use]
    pub fn project(&self, position: NormalizedPosition) -> Point {
        Point {
            x: self.x + self.width * position.x,
            y: self.y + self.height * position.y,
        }
    }

    /// Center of the rectangle.
    #[inline]
    pub fn center(&self) -> Point {
        self.project(NormalizedPosition::CENTER)
    }
}

/// A location expressed as fractions of the surface width and height.
///
/// Values are not validated. Out-of-range fractions are representable and
/// simply project outside the surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedPosition {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPosition {
    /// Top-left corner of the surface.
    pub const ORIGIN: Self = Self::new(0.0, 0.0);
    /// Center of the surface.
    pub const CENTER: Self = Self::new(0.5, 0.5);

    /// Create a new normalized position.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whether both fractions lie in `[0, 1]`.
    #[inline]
    pub fn is_within_unit(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

impl From<(f64, f64)> for NormalizedPosition {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// The surface size a layout table was calibrated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceFrame {
    pub width: u32,
    pub height: u32,
}

impl ReferenceFrame {
    /// Create a reference frame.
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height.
    #[inline]
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height.max(1))
    }

    /// Relative deviation of `rect`'s aspect ratio from this frame's.
    ///
    /// `0.0` means identical proportions. Empty rectangles report infinity.
    pub fn aspect_deviation(&self, rect: &SurfaceRect) -> f64 {
        if rect.is_empty() {
            return f64::INFINITY;
        }
        let reference = self.aspect_ratio();
        ((rect.aspect_ratio() - reference) / reference).abs()
    }
}

impl Default for ReferenceFrame {
    fn default() -> Self {
        crate::layout::CALIBRATION
    }
}
