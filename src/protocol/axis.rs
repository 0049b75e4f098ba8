//! Tick-marked axes drawn through the surface.

use serde::{Deserialize, Serialize};

use super::command::AttrMap;
use super::primitive::{Line, Text};
use super::sink::RenderSink;
use super::surface::Surface;
use crate::errors::Result;
use crate::ticks::{DEFAULT_MAX_TICKS, compute_ticks};

/// Appearance of an axis. Sizes are device pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisStyle {
    pub tick_size: f64,
    pub label_offset: f64,
    /// Decimals in tick labels; `None` draws no labels
    pub label_precision: Option<usize>,
    pub max_ticks: usize,
    /// Falls back to the surface default color
    pub color: Option<String>,
    pub text_attrs: AttrMap,
    pub line_attrs: AttrMap,
}

impl Default for AxisStyle {
    fn default() -> Self {
        AxisStyle {
            tick_size: 5.0,
            label_offset: 10.0,
            label_precision: Some(2),
            max_ticks: DEFAULT_MAX_TICKS,
            color: None,
            text_attrs: AttrMap::new(),
            line_attrs: AttrMap::new(),
        }
    }
}

fn anchor(align: f64) -> &'static str {
    if align < 0.0 { "end" } else { "start" }
}

impl<S: RenderSink> Surface<S> {
    /// Vertical axis at `x`, ticks and labels to the left. Returns the ticks.
    pub fn left_axis(&mut self, x: f64, min: f64, max: f64, style: &AxisStyle) -> Result<Vec<f64>> {
        self.vertical_axis(x, min, max, style, -1.0)
    }

    /// Vertical axis at `x`, ticks and labels to the right. Returns the ticks.
    pub fn right_axis(&mut self, x: f64, min: f64, max: f64, style: &AxisStyle) -> Result<Vec<f64>> {
        self.vertical_axis(x, min, max, style, 1.0)
    }

    /// Horizontal axis at `y` with labels rotated to read downward. Returns the ticks.
    pub fn bottom_axis(&mut self, y: f64, min: f64, max: f64, style: &AxisStyle) -> Result<Vec<f64>> {
        self.horizontal_axis(y, min, max, style, 1.0)
    }

    /// Horizontal axis at `y`, labels on the opposite side. Returns the ticks.
    pub fn top_axis(&mut self, y: f64, min: f64, max: f64, style: &AxisStyle) -> Result<Vec<f64>> {
        self.horizontal_axis(y, min, max, style, -1.0)
    }

    /// Bottom axis through `y0` over the x extrema and left axis through
    /// `x0` over the y extrema, each only when that range is known.
    pub fn axes(&mut self, x0: f64, y0: f64) -> Result<()> {
        let style = self.axis_style().clone();
        if let Some((min, max)) = self.extrema().x_range() {
            self.bottom_axis(y0, min, max, &style)?;
        }
        if let Some((min, max)) = self.extrema().y_range() {
            self.left_axis(x0, min, max, &style)?;
        }
        Ok(())
    }

    fn axis_color(&self, style: &AxisStyle) -> String {
        style
            .color
            .clone()
            .unwrap_or_else(|| self.defaults().color.clone())
    }

    fn label_attrs(style: &AxisStyle, align: f64) -> AttrMap {
        let mut attrs = style.text_attrs.clone();
        attrs.insert("text-anchor".into(), anchor(align).into());
        attrs
    }

    fn vertical_axis(
        &mut self,
        x: f64,
        min: f64,
        max: f64,
        style: &AxisStyle,
        align: f64,
    ) -> Result<Vec<f64>> {
        let ticks = compute_ticks(min, max, style.max_ticks)?;
        let color = self.axis_color(style);
        let (tick_shift, _) = self.projection().unscale(style.tick_size, 0.0);
        self.draw(
            Line::new(x, ticks.clone(), x + align * tick_shift, ticks.clone())
                .color(color.clone())
                .attrs(style.line_attrs.clone()),
        )?;
        self.draw(
            Line::new(x, min, x, max)
                .color(color.clone())
                .attrs(style.line_attrs.clone()),
        )?;
        if let Some(precision) = style.label_precision {
            let (label_shift, _) = self.projection().unscale(style.label_offset, 0.0);
            let labels: Vec<String> = ticks.iter().map(|t| format!("{t:.precision$}")).collect();
            self.draw(
                Text::new(x + align * label_shift, ticks.clone(), labels)
                    .color(color)
                    .attrs(Self::label_attrs(style, align)),
            )?;
        }
        Ok(ticks)
    }

    fn horizontal_axis(
        &mut self,
        y: f64,
        min: f64,
        max: f64,
        style: &AxisStyle,
        align: f64,
    ) -> Result<Vec<f64>> {
        let ticks = compute_ticks(min, max, style.max_ticks)?;
        let color = self.axis_color(style);
        let (_, tick_shift) = self.projection().unscale(0.0, style.tick_size);
        self.draw(
            Line::new(ticks.clone(), y, ticks.clone(), y + align * tick_shift)
                .color(color.clone())
                .attrs(style.line_attrs.clone()),
        )?;
        self.draw(
            Line::new(min, y, max, y)
                .color(color.clone())
                .attrs(style.line_attrs.clone()),
        )?;
        if let Some(precision) = style.label_precision {
            let (_, label_shift) = self.projection().unscale(0.0, style.label_offset);
            let labels: Vec<String> = ticks.iter().map(|t| format!("{t:.precision$}")).collect();
            self.draw(
                Text::new(ticks.clone(), y + align * label_shift, labels)
                    .color(color)
                    .rotate(90.0)
                    .attrs(Self::label_attrs(style, align)),
            )?;
        }
        Ok(ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{DoodleError, LayoutError};
    use crate::projection::Projection;
    use crate::protocol::scene::Frame;
    use crate::protocol::sink::RecordingSink;
    use serde_json::json;

    fn surface() -> Surface<RecordingSink> {
        let projection = Projection::try_new(10.0, -10.0, 100.0, 100.0).unwrap();
        Surface::new(RecordingSink::new(), projection, Frame::new(200.0, 200.0)).unwrap()
    }

    #[test]
    fn left_axis_ticks_line_and_labels() {
        let mut s = surface();
        let ticks = s.left_axis(0.0, 0.0, 10.0, &AxisStyle::default()).unwrap();
        assert_eq!(ticks, [1.0, 4.0, 7.0, 10.0]);

        let scene = &s.sink().scene;
        // four ticks, the axis line, four labels
        assert_eq!(scene.len(), 9);
        let tick = scene.get("line*1").unwrap();
        assert_eq!(tick.attrs["x1"], json!(100.0));
        assert_eq!(tick.attrs["x2"], json!(95.0));
        assert_eq!(tick.attrs["y1"], json!(90.0));
        let axis = scene.get("line*5").unwrap();
        assert_eq!((&axis.attrs["y1"], &axis.attrs["y2"]), (&json!(100.0), &json!(0.0)));
        let label = scene.get("text*1").unwrap();
        assert_eq!(label.text.as_deref(), Some("1.00"));
        assert_eq!(label.attrs["x"], json!(90.0));
        assert_eq!(label.attrs["text-anchor"], json!("end"));
    }

    #[test]
    fn bottom_axis_labels_are_rotated() {
        let mut s = surface();
        s.bottom_axis(0.0, 0.0, 10.0, &AxisStyle::default()).unwrap();
        let label = s.sink().scene.get("text*1").unwrap();
        assert_eq!(label.attrs["transform"], json!("rotate(90 110 110)"));
        assert_eq!(label.attrs["text-anchor"], json!("start"));
        let tick = s.sink().scene.get("line*1").unwrap();
        assert_eq!(tick.attrs["y2"], json!(105.0));
    }

    #[test]
    fn unlabelled_axis_in_its_own_color() {
        let mut s = surface();
        let style = AxisStyle {
            label_precision: None,
            color: Some("gray".into()),
            ..AxisStyle::default()
        };
        s.right_axis(0.0, 0.0, 10.0, &style).unwrap();
        let scene = &s.sink().scene;
        assert_eq!(scene.len(), 5);
        assert!(scene.elements().iter().all(|e| e.attrs["stroke"] == json!("gray")));
    }

    #[test]
    fn invalid_range_draws_nothing() {
        let mut s = surface();
        let err = s.top_axis(0.0, 3.0, 3.0, &AxisStyle::default()).unwrap_err();
        assert!(matches!(err, DoodleError::Layout(LayoutError::InvalidTickRange { .. })));
        assert!(s.sink().batches.is_empty());
    }

    #[test]
    fn axes_follow_known_extrema() {
        let mut s = surface();
        s.axes(0.0, 0.0).unwrap();
        assert!(s.sink().batches.is_empty());
        s.draw(crate::protocol::primitive::Circle::new([0.0, 10.0], [0.0, 5.0], 0.1))
            .unwrap();
        s.axes(0.0, 0.0).unwrap();
        let texts = s
            .sink()
            .scene
            .elements()
            .iter()
            .filter(|e| e.name.starts_with("text*"))
            .count();
        assert!(texts >= 6);
    }
}
