//! World ↔ device coordinate mapping and world-extrema tracking.

use crate::errors::NumericError;
use crate::log::trace;
use crate::types::Point2D;

/// World bounds of a viewport: `(xmin, ymin)` to `(xmax, ymax)`
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Bounds {
    pub const fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Bounds {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }
}

/// Independent per-axis scale followed by an offset.
///
/// Scale factors are never zero; a negative `y_scale` flips the y axis so
/// increasing world y goes up on a y-down device.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    x_offset: f64,
    y_offset: f64,
    x_scale: f64,
    y_scale: f64,
}

/// A projection sized for a viewport, plus the device surface it produces
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportLayout {
    pub projection: Projection,
    /// Device width including both margins
    pub width: f64,
    /// Device height including both margins
    pub height: f64,
}

impl ViewportLayout {
    /// SVG `viewBox` covering the whole device surface
    pub fn view_box(&self) -> [f64; 4] {
        [0.0, 0.0, self.width, self.height]
    }
}

fn check_factor(value: f64) -> Result<f64, NumericError> {
    if value.is_nan() {
        Err(NumericError::NaN)
    } else if value.is_infinite() {
        Err(NumericError::Infinite)
    } else if value == 0.0 {
        Err(NumericError::Zero)
    } else {
        Ok(value)
    }
}

/// Reject NaN and infinities.
pub(crate) fn check_finite(value: f64) -> Result<f64, NumericError> {
    if value.is_nan() {
        Err(NumericError::NaN)
    } else if value.is_infinite() {
        Err(NumericError::Infinite)
    } else {
        Ok(value)
    }
}

impl Default for Projection {
    fn default() -> Self {
        Projection::IDENTITY
    }
}

impl Projection {
    pub const IDENTITY: Projection = Projection {
        x_offset: 0.0,
        y_offset: 0.0,
        x_scale: 1.0,
        y_scale: 1.0,
    };

    /// Create a projection, rejecting zero or non-finite factors.
    pub fn try_new(
        x_scale: f64,
        y_scale: f64,
        x_offset: f64,
        y_offset: f64,
    ) -> Result<Self, NumericError> {
        Ok(Projection {
            x_scale: check_factor(x_scale)?,
            y_scale: check_factor(y_scale)?,
            x_offset: check_finite(x_offset)?,
            y_offset: check_finite(y_offset)?,
        })
    }

    /// Fit `bounds` into a `width`-pixel surface with `margin` on every side.
    ///
    /// Without an explicit `height` the y axis uses the x scale, flipped, so
    /// the aspect ratio is preserved.
    pub fn for_viewport(
        bounds: Bounds,
        width: f64,
        height: Option<f64>,
        margin: f64,
    ) -> Result<ViewportLayout, NumericError> {
        let inner_width = width - 2.0 * margin;
        let x_scale = check_factor(inner_width / (bounds.xmax - bounds.xmin))?;
        let x_offset = margin - x_scale * bounds.xmin;
        let y_scale = match height {
            None => -x_scale,
            Some(h) => check_factor((h - 2.0 * margin) / (bounds.ymin - bounds.ymax))?,
        };
        let y_offset = margin - y_scale * bounds.ymax;
        let projection = Projection::try_new(x_scale, y_scale, x_offset, y_offset)?;
        Ok(ViewportLayout {
            projection,
            width: 2.0 * margin + ((bounds.xmax - bounds.xmin) * x_scale).abs(),
            height: 2.0 * margin + ((bounds.ymax - bounds.ymin) * y_scale).abs(),
        })
    }

    pub fn x_scale(&self) -> f64 {
        self.x_scale
    }

    pub fn y_scale(&self) -> f64 {
        self.y_scale
    }

    pub fn x_offset(&self) -> f64 {
        self.x_offset
    }

    pub fn y_offset(&self) -> f64 {
        self.y_offset
    }

    /// World point to device point
    #[inline]
    pub fn project(&self, x: f64, y: f64) -> (f64, f64) {
        let (sx, sy) = self.scale_length(x, y);
        (sx + self.x_offset, sy + self.y_offset)
    }

    pub fn project_point(&self, p: Point2D) -> Point2D {
        self.project(p.x, p.y).into()
    }

    /// Device point back to world point
    #[inline]
    pub fn unproject(&self, dx: f64, dy: f64) -> (f64, f64) {
        self.unscale(dx - self.x_offset, dy - self.y_offset)
    }

    /// World lengths to device lengths. May be negative; take `abs` for sizes.
    #[inline]
    pub fn scale_length(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.x_scale, y * self.y_scale)
    }

    /// Device lengths to world lengths, ignoring the offset.
    #[inline]
    pub fn unscale(&self, sx: f64, sy: f64) -> (f64, f64) {
        (sx / self.x_scale, sy / self.y_scale)
    }
}

/// Running bounding box of every world point drawn with `update` on.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Extrema {
    pub min_x: Option<f64>,
    pub min_y: Option<f64>,
    pub max_x: Option<f64>,
    pub max_y: Option<f64>,
}

fn fold(current: Option<f64>, value: f64, combine: fn(f64, f64) -> f64) -> Option<f64> {
    Some(match current {
        Some(c) => combine(c, value),
        None => value,
    })
}

impl Extrema {
    pub const EMPTY: Extrema = Extrema {
        min_x: None,
        min_y: None,
        max_x: None,
        max_y: None,
    };

    /// Extrema seeded with viewport bounds
    pub fn from_bounds(bounds: Bounds) -> Self {
        Extrema {
            min_x: Some(bounds.xmin),
            min_y: Some(bounds.ymin),
            max_x: Some(bounds.xmax),
            max_y: Some(bounds.ymax),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x.is_none() && self.min_y.is_none()
    }

    /// Widen to include `(x, y)`. NaN coordinates are ignored.
    pub fn update(&mut self, x: f64, y: f64) {
        if !x.is_nan() {
            self.min_x = fold(self.min_x, x, f64::min);
            self.max_x = fold(self.max_x, x, f64::max);
        }
        if !y.is_nan() {
            self.min_y = fold(self.min_y, y, f64::min);
            self.max_y = fold(self.max_y, y, f64::max);
        }
        trace!(extrema = ?self, x, y, "extrema updated");
    }

    pub fn reset(&mut self) {
        *self = Extrema::EMPTY;
    }

    /// `(min, max)` over x when both are known
    pub fn x_range(&self) -> Option<(f64, f64)> {
        Some((self.min_x?, self.max_x?))
    }

    /// `(min, max)` over y when both are known
    pub fn y_range(&self) -> Option<(f64, f64)> {
        Some((self.min_y?, self.max_y?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn project_scales_then_offsets() {
        let p = Projection::try_new(2.0, -3.0, 10.0, 20.0).unwrap();
        assert_eq!(p.project(1.0, 1.0), (12.0, 17.0));
        assert_eq!(p.scale_length(1.0, 1.0), (2.0, -3.0));
    }

    #[test]
    fn unproject_and_unscale_invert_projection() {
        let projections = [
            Projection::try_new(2.0, -3.0, 10.0, 20.0).unwrap(),
            Projection::try_new(-0.001, 1e4, -5.0, 0.0).unwrap(),
            Projection::IDENTITY,
        ];
        for p in projections {
            for (x, y) in [(0.0, 0.0), (1.5, -2.25), (-1e3, 7e2)] {
                let (dx, dy) = p.project(x, y);
                let (wx, wy) = p.unproject(dx, dy);
                assert!(close(wx, x) && close(wy, y));

                let (sx, sy) = p.scale_length(x, y);
                let (ux, uy) = p.unscale(sx, sy);
                assert!(close(ux, x) && close(uy, y));
            }
        }
    }

    #[test]
    fn zero_and_non_finite_factors_are_rejected() {
        assert_eq!(Projection::try_new(0.0, 1.0, 0.0, 0.0), Err(NumericError::Zero));
        assert_eq!(Projection::try_new(1.0, f64::NAN, 0.0, 0.0), Err(NumericError::NaN));
        assert_eq!(
            Projection::try_new(1.0, 1.0, f64::INFINITY, 0.0),
            Err(NumericError::Infinite)
        );
    }

    #[test]
    fn viewport_without_height_flips_y_and_keeps_aspect() {
        let layout =
            Projection::for_viewport(Bounds::new(-3.0, -6.0, 6.0, 2.0), 700.0, None, 50.0)
                .unwrap();
        let p = layout.projection;
        assert!(close(p.x_scale(), 600.0 / 9.0));
        assert!(close(p.y_scale(), -600.0 / 9.0));
        // world corners land on the margins
        let (x, y) = p.project(-3.0, 2.0);
        assert!(close(x, 50.0) && close(y, 50.0));
        let (x, y) = p.project(6.0, -6.0);
        assert!(close(x, 650.0));
        assert!(close(y, 50.0 + 8.0 * 600.0 / 9.0));
        assert!(close(layout.width, 700.0));
        assert!(close(layout.height, 100.0 + 8.0 * 600.0 / 9.0));
    }

    #[test]
    fn viewport_with_height_scales_independently() {
        let layout =
            Projection::for_viewport(Bounds::new(0.0, 0.0, 10.0, 5.0), 120.0, Some(70.0), 10.0)
                .unwrap();
        let p = layout.projection;
        assert!(close(p.x_scale(), 10.0));
        assert!(close(p.y_scale(), -10.0));
        assert_eq!(layout.view_box(), [0.0, 0.0, 120.0, 70.0]);
    }

    #[test]
    fn degenerate_viewport_is_rejected() {
        let err = Projection::for_viewport(Bounds::new(1.0, 0.0, 1.0, 5.0), 100.0, None, 10.0)
            .unwrap_err();
        assert_eq!(err, NumericError::Infinite);
    }

    #[test]
    fn extrema_widen_monotonically() {
        let mut e = Extrema::default();
        assert!(e.is_empty());
        assert_eq!(e.x_range(), None);

        e.update(1.0, 2.0);
        assert_eq!(e.x_range(), Some((1.0, 1.0)));
        e.update(-1.0, 5.0);
        e.update(0.0, 3.0);
        assert_eq!(e.x_range(), Some((-1.0, 1.0)));
        assert_eq!(e.y_range(), Some((2.0, 5.0)));
    }

    #[test]
    fn extrema_ignore_nan() {
        let mut e = Extrema::default();
        e.update(f64::NAN, 2.0);
        assert_eq!(e.x_range(), None);
        assert_eq!(e.y_range(), Some((2.0, 2.0)));
        e.update(3.0, f64::NAN);
        assert_eq!(e.x_range(), Some((3.0, 3.0)));
        assert_eq!(e.y_range(), Some((2.0, 2.0)));
    }

    #[test]
    fn extrema_reset_and_seed() {
        let mut e = Extrema::from_bounds(Bounds::new(-1.0, -2.0, 3.0, 4.0));
        assert_eq!(e.y_range(), Some((-2.0, 4.0)));
        e.reset();
        assert_eq!(e, Extrema::EMPTY);
    }
}
