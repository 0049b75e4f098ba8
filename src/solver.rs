//! Distance-ratio loci and their intersections.
//!
//! The locus of points `P` with `|P - p1| = ratio * |P - p2|` is a circle of
//! Apollonius whenever `ratio != 1`. Two such circles meet in zero or two
//! points; the intersection is solved in a frame where one circle is the unit
//! circle, then mapped back to world space.

use crate::errors::SolverError;
use crate::log::debug;
use crate::transform::Affine;
use crate::types::Point2D;

/// Two anchors and the ratio of distances from them
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorPair {
    pub p1: Point2D,
    pub p2: Point2D,
    pub ratio: f64,
}

impl AnchorPair {
    pub fn new(p1: impl Into<Point2D>, p2: impl Into<Point2D>, ratio: f64) -> Self {
        AnchorPair {
            p1: p1.into(),
            p2: p2.into(),
            ratio,
        }
    }

    pub fn circle(&self) -> Result<ApolloniusCircle, SolverError> {
        apollonius_circle(self.p1, self.p2, self.ratio)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ApolloniusCircle {
    pub center: Point2D,
    pub radius: f64,
}

impl ApolloniusCircle {
    /// Point on the circle at `angle` radians from the positive x axis
    pub fn point_at(&self, angle: f64) -> Point2D {
        let (sin, cos) = angle.sin_cos();
        Point2D::new(
            self.center.x + self.radius * cos,
            self.center.y + self.radius * sin,
        )
    }
}

/// Circle of points whose distance to `p1` is `ratio` times their distance to `p2`.
pub fn apollonius_circle(
    p1: Point2D,
    p2: Point2D,
    ratio: f64,
) -> Result<ApolloniusCircle, SolverError> {
    if !(ratio > 0.0) || !ratio.is_finite() {
        return Err(SolverError::InvalidRatio { ratio });
    }
    if ratio == 1.0 {
        return Err(SolverError::DegenerateRatio);
    }

    // x²·A + x·B + y²·A + y·C + D = 0, normalized by A
    let r2 = ratio * ratio;
    let a = 1.0 - r2;
    let b = (2.0 * r2 * p2.x - 2.0 * p1.x) / a;
    let c = (2.0 * r2 * p2.y - 2.0 * p1.y) / a;
    let d = (p1.x * p1.x + p1.y * p1.y - r2 * (p2.x * p2.x + p2.y * p2.y)) / a;

    let radicand = b * b + c * c - 4.0 * d;
    if !(radicand >= 0.0) {
        return Err(SolverError::NoRealLocus { radicand });
    }
    Ok(ApolloniusCircle {
        center: Point2D::new(-b / 2.0, -c / 2.0),
        radius: radicand.sqrt() / 2.0,
    })
}

/// Points lying on both loci. Empty when the circles do not meet.
pub fn intersect_two_apollonius_circles(
    pair_a: &AnchorPair,
    pair_b: &AnchorPair,
) -> Result<Vec<Point2D>, SolverError> {
    let ApolloniusCircle {
        center: c1,
        radius: r1,
    } = pair_a.circle()?;
    let ApolloniusCircle {
        center: c2,
        radius: r2,
    } = pair_b.circle()?;

    let separation = c1.distance(c2);
    if separation == 0.0 {
        return Err(SolverError::CoincidentCenters);
    }

    // Unit circle at the origin against radius r centered at (xp, 0)
    let r = r1 / r2;
    let xp = separation / r2;
    let cos = (-r * r + xp * xp + 1.0) / (2.0 * xp);
    if !(cos.abs() <= 1.0) {
        debug!(cos, "apollonius circles do not intersect");
        return Ok(Vec::new());
    }
    let sin = (1.0 - cos * cos).sqrt();

    let direction = c1 - c2;
    let to_world = Affine::scale_uniform(r2)
        .then(Affine::rotate_by_direction(direction.x, direction.y)?)
        .then(Affine::translate(c2.x, c2.y));
    Ok(vec![to_world.apply(cos, sin)?, to_world.apply(cos, -sin)?])
}
