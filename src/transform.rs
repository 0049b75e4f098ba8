//! 2D affine transforms as 3×3 homogeneous matrices.
//!
//! Matrices follow the SVG `matrix(a b c d e f)` layout:
//!
//! ```text
//! | a c e |
//! | b d f |
//! | 0 0 1 |
//! ```
//!
//! Composition reads left to right: `t1.then(t2)` applies `t1` first.

use glam::{DMat3, DVec3, dvec3};

use crate::errors::TransformError;
use crate::types::Point2D;

/// Tolerance on the homogeneous coordinate returned by [`Affine::apply`]
pub const HOMOGENEOUS_EPSILON: f64 = 1e-10;

/// An affine transform. The bottom row is always `[0, 0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine(DMat3);

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine(DMat3::IDENTITY);

    /// Build from the six free coefficients (SVG order).
    pub fn from_coefficients(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Affine(DMat3::from_cols(
            dvec3(a, b, 0.0),
            dvec3(c, d, 0.0),
            dvec3(e, f, 1.0),
        ))
    }

    pub fn translate(dx: f64, dy: f64) -> Self {
        Self::from_coefficients(1.0, 0.0, 0.0, 1.0, dx, dy)
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::from_coefficients(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub fn scale_uniform(s: f64) -> Self {
        Self::scale(s, s)
    }

    /// Rotation taking the unit x-axis onto the direction of `(dx, dy)`.
    pub fn rotate_by_direction(dx: f64, dy: f64) -> Result<Self, TransformError> {
        let n = dx.hypot(dy);
        if n == 0.0 || !n.is_finite() {
            return Err(TransformError::DegenerateDirection);
        }
        let (cos, sin) = (dx / n, dy / n);
        Ok(Self::from_coefficients(cos, sin, -sin, cos, 0.0, 0.0))
    }

    pub fn rotate(radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self::from_coefficients(cos, sin, -sin, cos, 0.0, 0.0)
    }

    pub fn rotate_degrees(degrees: f64) -> Self {
        Self::rotate(degrees.to_radians())
    }

    pub fn skew_x(radians: f64) -> Self {
        Self::from_coefficients(1.0, 0.0, radians.tan(), 1.0, 0.0, 0.0)
    }

    pub fn skew_y(radians: f64) -> Self {
        Self::from_coefficients(1.0, radians.tan(), 0.0, 1.0, 0.0, 0.0)
    }

    /// The transform that applies `t1` and then `t2`.
    pub fn compose(t1: Affine, t2: Affine) -> Affine {
        Affine(t2.0 * t1.0)
    }

    /// `self` followed by `next`.
    pub fn then(self, next: Affine) -> Affine {
        Self::compose(self, next)
    }

    /// Transform the point `(x, y)`.
    pub fn apply(&self, x: f64, y: f64) -> Result<Point2D, TransformError> {
        let v: DVec3 = self.0 * dvec3(x, y, 1.0);
        if (1.0 - v.z).abs() > HOMOGENEOUS_EPSILON {
            return Err(TransformError::NonAffineResult { w: v.z });
        }
        Ok(Point2D::new(v.x, v.y))
    }

    #[inline]
    pub fn apply_point(&self, p: Point2D) -> Result<Point2D, TransformError> {
        self.apply(p.x, p.y)
    }

    pub fn invert(&self) -> Result<Affine, TransformError> {
        let determinant = self.0.determinant();
        if determinant == 0.0 || !determinant.is_finite() {
            return Err(TransformError::SingularTransform { determinant });
        }
        Ok(Affine(self.0.inverse()))
    }

    pub fn matrix(&self) -> DMat3 {
        self.0
    }

    /// The six free coefficients `[a, b, c, d, e, f]`.
    pub fn coefficients(&self) -> [f64; 6] {
        let m = self.0;
        [
            m.x_axis.x, m.x_axis.y, m.y_axis.x, m.y_axis.y, m.z_axis.x, m.z_axis.y,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn assert_close(actual: Point2D, expected: Point2D) {
        const EPSILON: f64 = 1e-9;
        assert!(
            actual.distance(expected) < EPSILON,
            "{} not close to {}",
            actual,
            expected
        );
    }

    #[test]
    fn scale_by_minus_one_negates() {
        let p = Affine::scale(-1.0, -1.0).apply(1.3, 5.5).unwrap();
        assert_close(p, Point2D::new(-1.3, -5.5));
    }

    #[test]
    fn translate_adds_offset() {
        let p = Affine::translate(10.1, 3.3).apply(1.3, 5.5).unwrap();
        assert_close(p, Point2D::new(11.4, 8.8));
        let q = Affine::translate(10.1, 3.3)
            .apply_point(Point2D::new(1.3, 5.5))
            .unwrap();
        assert_eq!(p, q);
    }

    #[test]
    fn rotation_about_a_point_equals_rotation_then_translation() {
        // Rotating 90° about (3, 2) is the same as rotating about the origin
        // and then translating by (5, -1).
        let about = Affine::translate(-3.0, -2.0)
            .then(Affine::rotate_degrees(90.0))
            .then(Affine::translate(3.0, 2.0));
        let direct = Affine::rotate_degrees(90.0).then(Affine::translate(5.0, -1.0));
        let p = (10.1, 3.3);
        assert_close(about.apply(p.0, p.1).unwrap(), direct.apply(p.0, p.1).unwrap());
    }

    #[test]
    fn compose_applies_first_argument_first() {
        let t = Affine::compose(Affine::translate(1.0, 0.0), Affine::scale(2.0, 2.0));
        // (0,0) -> (1,0) -> (2,0)
        assert_close(t.apply(0.0, 0.0).unwrap(), Point2D::new(2.0, 0.0));

        let reversed = Affine::compose(Affine::scale(2.0, 2.0), Affine::translate(1.0, 0.0));
        assert_close(reversed.apply(0.0, 0.0).unwrap(), Point2D::new(1.0, 0.0));
    }

    #[test]
    fn rotate_by_direction_maps_x_axis_onto_direction() {
        let t = Affine::rotate_by_direction(3.0, 4.0).unwrap();
        assert_close(t.apply(1.0, 0.0).unwrap(), Point2D::new(0.6, 0.8));
        assert_close(t.apply(5.0, 0.0).unwrap(), Point2D::new(3.0, 4.0));
    }

    #[test]
    fn rotate_by_zero_direction_fails() {
        assert_eq!(
            Affine::rotate_by_direction(0.0, 0.0),
            Err(TransformError::DegenerateDirection)
        );
    }

    #[test]
    fn rotate_quarter_turn() {
        let t = Affine::rotate(FRAC_PI_2);
        assert_close(t.apply(1.0, 0.0).unwrap(), Point2D::new(0.0, 1.0));
    }

    #[test]
    fn skews_shift_one_axis() {
        let t = Affine::skew_x(std::f64::consts::FRAC_PI_4);
        assert_close(t.apply(0.0, 2.0).unwrap(), Point2D::new(2.0, 2.0));
        let t = Affine::skew_y(std::f64::consts::FRAC_PI_4);
        assert_close(t.apply(2.0, 0.0).unwrap(), Point2D::new(2.0, 2.0));
    }

    #[test]
    fn compose_with_inverse_is_identity() {
        let transforms = [
            Affine::translate(3.0, -7.5),
            Affine::scale(2.0, -0.5),
            Affine::rotate(1.234),
            Affine::skew_x(0.3).then(Affine::skew_y(-0.2)),
            Affine::rotate_by_direction(-2.0, 1.0)
                .unwrap()
                .then(Affine::scale_uniform(4.0))
                .then(Affine::translate(-1.0, 9.0)),
        ];
        let points = [(0.0, 0.0), (1.0, 2.0), (-13.5, 0.25), (1e3, -1e3)];
        for t in transforms {
            let round = t.then(t.invert().unwrap());
            for (x, y) in points {
                assert_close(round.apply(x, y).unwrap(), Point2D::new(x, y));
            }
        }
    }

    #[test]
    fn singular_transform_cannot_be_inverted() {
        let err = Affine::scale(0.0, 1.0).invert().unwrap_err();
        assert!(matches!(err, TransformError::SingularTransform { .. }));
    }

    #[test]
    fn projective_matrix_is_rejected_on_apply() {
        let mut m = Affine::IDENTITY.matrix();
        m.x_axis.z = 0.5;
        let t = Affine(m);
        let err = t.apply(1.0, 0.0).unwrap_err();
        assert_eq!(err, TransformError::NonAffineResult { w: 1.5 });
    }

    #[test]
    fn coefficients_follow_svg_order() {
        let t = Affine::from_coefficients(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        assert_eq!(t.coefficients(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}
