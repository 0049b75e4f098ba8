//! Plain value types shared by the engines.

use std::fmt;
use std::ops::{Add, Sub};

use glam::{DVec2, dvec2};

/// A point in world or device space. Value type, no identity.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const ORIGIN: Point2D = Point2D { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Point2D { x, y }
    }

    /// Euclidean distance to `other`
    #[inline]
    pub fn distance(self, other: Point2D) -> f64 {
        DVec2::from(self).distance(other.into())
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<DVec2> for Point2D {
    fn from(v: DVec2) -> Self {
        Point2D { x: v.x, y: v.y }
    }
}

impl From<Point2D> for DVec2 {
    fn from(p: Point2D) -> Self {
        dvec2(p.x, p.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Point2D { x, y }
    }
}

impl Add for Point2D {
    type Output = Point2D;
    fn add(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2D {
    type Output = Point2D;
    fn sub(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for Point2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned bounding box in device space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min: Point2D,
    pub max: Point2D,
}

impl Default for BBox {
    fn default() -> Self {
        Self::new()
    }
}

impl BBox {
    /// Create an empty bounding box (will expand on first point)
    pub fn new() -> Self {
        BBox {
            min: Point2D::new(f64::MAX, f64::MAX),
            max: Point2D::new(f64::MIN, f64::MIN),
        }
    }

    /// Check if the bbox is empty (never expanded)
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn expand_point(&mut self, p: Point2D) {
        if !p.is_finite() {
            return;
        }
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    /// Expand to include a rectangle given by its top-left corner and size
    pub fn expand_rect(&mut self, corner: Point2D, width: f64, height: f64) {
        self.expand_point(corner);
        self.expand_point(Point2D::new(corner.x + width, corner.y + height));
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// `[x, y, width, height]`, the layout of an SVG `viewBox`
    pub fn to_view_box(&self) -> [f64; 4] {
        [self.min.x, self.min.y, self.width(), self.height()]
    }
}
