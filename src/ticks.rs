//! Axis tick placement.

use crate::errors::LayoutError;

/// Default upper bound on the number of ticks per axis
pub const DEFAULT_MAX_TICKS: usize = 5;

/// Upper bound on tick candidates. The step is never below a twentieth of
/// the span, so only rounding at the edges of f64 comes near it.
const MAX_CANDIDATES: usize = 64;

/// Place "nice" ticks inside `[min, max]`.
///
/// The step is a power of ten one decade below the span, refined to a fifth
/// or a quarter of that when it would give fewer than five intervals. Ticks
/// start at `trunc(min / step) * step`. When more than `max_count` remain they
/// are thinned to every `stride`-th tick, centered by starting at `stride / 2`.
pub fn compute_ticks(min: f64, max: f64, max_count: usize) -> Result<Vec<f64>, LayoutError> {
    let invalid = || LayoutError::InvalidTickRange {
        min,
        max,
        max_count,
    };
    if !(min < max) || !min.is_finite() || !max.is_finite() || max_count < 2 {
        return Err(invalid());
    }

    // The span overflows for ranges wider than f64::MAX and the step
    // underflows to zero for subnormal spans.
    let span = max - min;
    if !span.is_finite() {
        return Err(invalid());
    }
    let mut step = 10f64.powf((span.log10() - 1.0).ceil());
    if step * 4.0 > span {
        step /= 5.0;
    } else if step * 5.0 > span {
        step /= 4.0;
    }
    let intervals = span / step;
    let first = (min / step).trunc() * step;
    if !(step > 0.0) || !step.is_finite() || !intervals.is_finite() || !first.is_finite() {
        return Err(invalid());
    }

    let count = (intervals as usize).saturating_add(2).min(MAX_CANDIDATES);
    let mut ticks: Vec<f64> = (0..count).map(|i| first + i as f64 * step).collect();

    // Truncating toward zero can leave a candidate on either side of the range.
    while ticks.first().is_some_and(|&t| t < min) {
        ticks.remove(0);
    }
    while ticks.last().is_some_and(|&t| t > max) {
        ticks.pop();
    }

    if ticks.len() > max_count {
        let stride = ticks.len() / max_count + 1;
        ticks = ticks.into_iter().skip(stride / 2).step_by(stride).collect();
    }
    Ok(ticks)
}
