//! Sampled function plots.
//!
//! A plot walks its parameter in fixed steps and collects points into runs.
//! A sample that is missing, non-finite or outside the open value range ends
//! the current run, and each run is drawn as a [`Surface::sequence`].

use super::primitive::Naming;
use super::sink::RenderSink;
use super::surface::Surface;
use crate::errors::{LayoutError, Result};

pub const DEFAULT_SAMPLES: usize = 200;

/// Sampling window and density. Unset bounds come from the surface extrema.
#[derive(Clone, Debug, PartialEq)]
pub struct Sampling {
    pub min_x: Option<f64>,
    pub max_x: Option<f64>,
    pub min_y: Option<f64>,
    pub max_y: Option<f64>,
    /// Parameter step; `span / samples` when unset
    pub step: Option<f64>,
    pub samples: usize,
}

impl Default for Sampling {
    fn default() -> Self {
        Sampling {
            min_x: None,
            max_x: None,
            min_y: None,
            max_y: None,
            step: None,
            samples: DEFAULT_SAMPLES,
        }
    }
}

impl Sampling {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn x_range(mut self, min: f64, max: f64) -> Self {
        self.min_x = Some(min);
        self.max_x = Some(max);
        self
    }

    pub fn y_range(mut self, min: f64, max: f64) -> Self {
        self.min_y = Some(min);
        self.max_y = Some(max);
        self
    }

    pub fn step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }
}

#[derive(Default)]
struct Run {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl Run {
    fn push(&mut self, x: f64, y: f64) {
        self.xs.push(x);
        self.ys.push(y);
    }
}

fn sample_step(explicit: Option<f64>, min: f64, max: f64, samples: usize) -> Result<f64> {
    let step = explicit.unwrap_or((max - min) / samples as f64);
    if step > 0.0 && step.is_finite() {
        Ok(step)
    } else {
        Err(LayoutError::InvalidSampleStep { step }.into())
    }
}

fn within(value: f64, min: f64, max: f64) -> bool {
    value > min && value < max
}

impl<S: RenderSink> Surface<S> {
    fn sampling_window(&self, sampling: &Sampling) -> Result<(f64, f64, f64, f64)> {
        let extrema = self.extrema();
        let missing = |axis| LayoutError::MissingExtent { axis };
        let min_x = sampling.min_x.or(extrema.min_x).ok_or(missing("x"))?;
        let max_x = sampling.max_x.or(extrema.max_x).ok_or(missing("x"))?;
        let min_y = sampling.min_y.or(extrema.min_y).ok_or(missing("y"))?;
        let max_y = sampling.max_y.or(extrema.max_y).ok_or(missing("y"))?;
        Ok((min_x, max_x, min_y, max_y))
    }

    fn emit_run(&mut self, run: &mut Run, names: &mut Vec<String>) -> Result<()> {
        if !run.xs.is_empty() {
            names.extend(self.sequence(Naming::Auto, &run.xs, &run.ys)?);
        }
        run.xs.clear();
        run.ys.clear();
        Ok(())
    }

    /// Plot `y = f(x)` across the x window. Returns the segment names.
    pub fn plot_y(
        &mut self,
        mut f: impl FnMut(f64) -> Option<f64>,
        sampling: &Sampling,
    ) -> Result<Vec<String>> {
        let (min_x, max_x, min_y, max_y) = self.sampling_window(sampling)?;
        let step = sample_step(sampling.step, min_x, max_x, sampling.samples)?;
        let mut run = Run::default();
        let mut names = Vec::new();
        let mut i = 0u64;
        loop {
            let x = min_x + i as f64 * step;
            if x >= max_x {
                break;
            }
            match f(x) {
                Some(y) if within(y, min_y, max_y) => run.push(x, y),
                _ => self.emit_run(&mut run, &mut names)?,
            }
            i += 1;
        }
        self.emit_run(&mut run, &mut names)?;
        Ok(names)
    }

    /// Plot `x = f(y)` across the y window. Returns the segment names.
    pub fn plot_x(
        &mut self,
        mut f: impl FnMut(f64) -> Option<f64>,
        sampling: &Sampling,
    ) -> Result<Vec<String>> {
        let (min_x, max_x, min_y, max_y) = self.sampling_window(sampling)?;
        let step = sample_step(sampling.step, min_y, max_y, sampling.samples)?;
        let mut run = Run::default();
        let mut names = Vec::new();
        let mut i = 0u64;
        loop {
            let y = min_y + i as f64 * step;
            if y >= max_y {
                break;
            }
            match f(y) {
                Some(x) if within(x, min_x, max_x) => run.push(x, y),
                _ => self.emit_run(&mut run, &mut names)?,
            }
            i += 1;
        }
        self.emit_run(&mut run, &mut names)?;
        Ok(names)
    }

    /// Parametric plot of `(x, y) = f(t)` for `count` steps of `dt` from `t0`.
    pub fn plot_t(
        &mut self,
        mut f: impl FnMut(f64) -> Option<(f64, f64)>,
        t0: f64,
        dt: f64,
        count: usize,
    ) -> Result<Vec<String>> {
        let mut run = Run::default();
        let mut names = Vec::new();
        for i in 0..count {
            let t = t0 + i as f64 * dt;
            match f(t) {
                Some((x, y)) if x.is_finite() && y.is_finite() => run.push(x, y),
                _ => self.emit_run(&mut run, &mut names)?,
            }
        }
        self.emit_run(&mut run, &mut names)?;
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DoodleError;
    use crate::projection::{Bounds, Projection};
    use crate::protocol::scene::Frame;
    use crate::protocol::sink::RecordingSink;

    fn surface() -> Surface<RecordingSink> {
        Surface::new(RecordingSink::new(), Projection::IDENTITY, Frame::new(100.0, 100.0)).unwrap()
    }

    #[test]
    fn plot_y_draws_one_segment_per_step() {
        let mut s = surface();
        let sampling = Sampling::new().x_range(0.0, 1.0).y_range(-1.0, 2.0).samples(4);
        let names = s.plot_y(Some, &sampling).unwrap();
        assert_eq!(names, ["line*1", "line*2", "line*3"]);
        let last = s.sink().scene.get("line*3").unwrap();
        assert_eq!(last.attrs["x2"], serde_json::json!(0.75));
    }

    #[test]
    fn gaps_split_the_curve() {
        let mut s = surface();
        let sampling = Sampling::new().x_range(0.0, 1.0).y_range(-1.0, 2.0).step(0.25);
        let names = s
            .plot_y(|x| if x == 0.5 { None } else { Some(x) }, &sampling)
            .unwrap();
        // [0, 0.25] becomes one segment; [0.75] alone draws nothing
        assert_eq!(names.len(), 1);

        let names = s
            .plot_y(|x| Some(if x < 0.4 { x } else { 10.0 }), &sampling)
            .unwrap();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn plot_x_uses_the_y_window() {
        let mut s = surface();
        let sampling = Sampling::new().x_range(-5.0, 5.0).y_range(0.0, 2.0).step(0.5);
        let names = s.plot_x(|y| Some(y * y), &sampling).unwrap();
        // y = 0, 0.5, 1, 1.5 -> x = 0, 0.25, 1, 2.25
        assert_eq!(names.len(), 3);
        let first = s.sink().scene.get(&names[0]).unwrap();
        assert_eq!(first.attrs["y2"], serde_json::json!(0.5));
    }

    #[test]
    fn windows_default_to_extrema() {
        let mut s = Surface::doodle(RecordingSink::new(), Bounds::new(0.0, 0.0, 4.0, 4.0), 500.0).unwrap();
        let names = s.plot_y(|x| Some(x / 2.0), &Sampling::new().samples(4)).unwrap();
        assert_eq!(names.len(), 2);

        let mut empty = surface();
        let err = empty.plot_y(Some, &Sampling::new()).unwrap_err();
        assert!(matches!(err, DoodleError::Layout(LayoutError::MissingExtent { axis: "x" })));
        let err = s
            .plot_y(Some, &Sampling::new().x_range(1.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, DoodleError::Layout(LayoutError::InvalidSampleStep { .. })));
    }

    #[test]
    fn parametric_plot() {
        let mut s = surface();
        let quarter = std::f64::consts::FRAC_PI_2;
        let names = s
            .plot_t(|t| Some((t.cos(), t.sin())), 0.0, quarter, 4)
            .unwrap();
        assert_eq!(names.len(), 3);
        let names = s
            .plot_t(|t| (t != 1.0).then_some((t, t)), 0.0, 1.0, 4)
            .unwrap();
        assert_eq!(names.len(), 1);
    }
}
