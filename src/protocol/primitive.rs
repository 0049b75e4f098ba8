//! Drawing primitives and their per-kind attribute rules.
//!
//! A primitive is a builder over broadcast arguments. Laying one out is pure:
//! it resolves defaults, aligns every argument to one length and projects the
//! geometry, producing one [`Placement`] per emitted element. The surface
//! then commits placements to the registry and the command buffer.

use enum_dispatch::enum_dispatch;
use serde_json::Value;

use super::command::{AttrMap, ElementKind};
use super::registry::{NAME_SEPARATOR, validate_prefix};
use super::scene::fmt_num;
use crate::broadcast::{Arg, common_len};
use crate::errors::{BroadcastError, NumericError, ProtocolError, Result};
use crate::projection::{Projection, check_finite};
use crate::types::Point2D;

/// How a drawn element gets its name
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Naming {
    /// Generate under the element's tag, e.g. `circle*3`
    #[default]
    Auto,
    /// Generate `prefix*n`
    Prefix(String),
    /// Use as given, replacing any element with the same name
    Exact(String),
}

impl Naming {
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            Naming::Prefix(prefix) => validate_prefix(prefix),
            Naming::Auto | Naming::Exact(_) => Ok(()),
        }
    }
}

impl From<&str> for Naming {
    fn from(s: &str) -> Self {
        Naming::from(s.to_string())
    }
}

impl From<String> for Naming {
    fn from(s: String) -> Self {
        if s.contains(NAME_SEPARATOR) {
            Naming::Exact(s)
        } else {
            Naming::Prefix(s)
        }
    }
}

impl From<Naming> for Arg<Naming> {
    fn from(n: Naming) -> Self {
        Arg::Scalar(n)
    }
}

impl From<Vec<Naming>> for Arg<Naming> {
    fn from(v: Vec<Naming>) -> Self {
        Arg::Seq(v)
    }
}

impl<const N: usize> From<[&str; N]> for Arg<Naming> {
    fn from(v: [&str; N]) -> Self {
        Arg::<String>::from(v).map(Naming::from)
    }
}

/// Surface-level fallbacks for per-call options
#[derive(Clone, Debug, PartialEq)]
pub struct Defaults {
    pub color: String,
    pub style: AttrMap,
    pub attrs: AttrMap,
    /// Text rotation in device-space degrees
    pub rotate: Option<f64>,
}

impl Default for Defaults {
    fn default() -> Self {
        Defaults {
            color: crate::config::DEFAULT_COLOR.to_string(),
            style: AttrMap::new(),
            attrs: AttrMap::new(),
            rotate: None,
        }
    }
}

pub struct LayoutContext<'a> {
    pub projection: &'a Projection,
    pub defaults: &'a Defaults,
}

/// One element ready to be named and buffered
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    pub naming: Naming,
    pub attrs: AttrMap,
    pub style: AttrMap,
    pub text: Option<String>,
    /// World points that widen the extrema when `update` is on
    pub world: Vec<Point2D>,
}

#[enum_dispatch]
pub trait Primitive {
    fn kind(&self) -> ElementKind;

    /// Whether drawing this widens the surface extrema
    fn updates_extrema(&self) -> bool;

    fn namings(&self) -> &Arg<Naming>;

    fn layout(&self, ctx: &LayoutContext<'_>) -> Result<Vec<Placement>>;
}

#[enum_dispatch(Primitive)]
#[derive(Clone, Debug)]
pub enum Shape {
    Text(Text),
    Line(Line),
    Circle(Circle),
    Rect(Rect),
    Polygon(Polygon),
}

/// Options shared by every primitive
#[derive(Clone, Debug, Default)]
struct Common {
    names: Arg<Naming>,
    color: Option<Arg<String>>,
    style: Option<AttrMap>,
    attrs: Option<AttrMap>,
    update: Option<bool>,
}

impl Common {
    fn colors(&self, ctx: &LayoutContext<'_>) -> Arg<String> {
        self.color
            .clone()
            .unwrap_or_else(|| Arg::Scalar(ctx.defaults.color.clone()))
    }

    fn style(&self, ctx: &LayoutContext<'_>) -> AttrMap {
        self.style
            .clone()
            .unwrap_or_else(|| ctx.defaults.style.clone())
    }

    fn attrs(&self, ctx: &LayoutContext<'_>) -> AttrMap {
        self.attrs
            .clone()
            .unwrap_or_else(|| ctx.defaults.attrs.clone())
    }
}

macro_rules! common_builders {
    ($($shape:ident),* $(,)?) => {
        $(
            impl $shape {
                /// Name, prefix, or `*`-containing exact name for every element
                pub fn named(mut self, naming: impl Into<Naming>) -> Self {
                    self.common.names = Arg::Scalar(naming.into());
                    self
                }

                /// One naming per element
                pub fn names(mut self, names: impl Into<Arg<Naming>>) -> Self {
                    self.common.names = names.into();
                    self
                }

                pub fn color(mut self, color: impl Into<Arg<String>>) -> Self {
                    self.common.color = Some(color.into());
                    self
                }

                /// Replace the surface default style for this call
                pub fn style(mut self, style: AttrMap) -> Self {
                    self.common.style = Some(style);
                    self
                }

                /// Replace the surface default attributes for this call
                pub fn attrs(mut self, attrs: AttrMap) -> Self {
                    self.common.attrs = Some(attrs);
                    self
                }

                /// Add one extra attribute to this call's attributes
                pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
                    self.common
                        .attrs
                        .get_or_insert_with(AttrMap::new)
                        .insert(key.into(), value.into());
                    self
                }

                pub fn update(mut self, update: bool) -> Self {
                    self.common.update = Some(update);
                    self
                }
            }
        )*
    };
}

common_builders!(Text, Line, Circle, Rect, Polygon);

/// Device coordinate as JSON. JSON has no NaN or infinity.
fn num(v: f64) -> Result<Value, NumericError> {
    check_finite(v).map(Value::from)
}

// ============================================================================
// Text
// ============================================================================

#[derive(Clone, Debug)]
pub struct Text {
    common: Common,
    x: Arg<f64>,
    y: Arg<f64>,
    text: Arg<String>,
    rotate: Option<f64>,
}

impl Text {
    pub fn new(x: impl Into<Arg<f64>>, y: impl Into<Arg<f64>>, text: impl Into<Arg<String>>) -> Self {
        Text {
            common: Common::default(),
            x: x.into(),
            y: y.into(),
            text: text.into(),
            rotate: None,
        }
    }

    /// Rotate about the anchor point, in device-space degrees
    pub fn rotate(mut self, degrees: f64) -> Self {
        self.rotate = Some(degrees);
        self
    }
}

impl Primitive for Text {
    fn kind(&self) -> ElementKind {
        ElementKind::Text
    }

    fn updates_extrema(&self) -> bool {
        self.common.update.unwrap_or(false)
    }

    fn namings(&self) -> &Arg<Naming> {
        &self.common.names
    }

    fn layout(&self, ctx: &LayoutContext<'_>) -> Result<Vec<Placement>> {
        let colors = self.common.colors(ctx);
        let len = common_len(&[
            self.common.names.shape_len(),
            colors.shape_len(),
            self.x.shape_len(),
            self.y.shape_len(),
            self.text.shape_len(),
        ])?;
        let names = self.common.names.clone().expand_at(0, len)?;
        let colors = colors.expand_at(1, len)?;
        let xs = self.x.clone().expand_at(2, len)?;
        let ys = self.y.clone().expand_at(3, len)?;
        let texts = self.text.clone().expand_at(4, len)?;
        let style = self.common.style(ctx);
        let base = self.common.attrs(ctx);
        let rotate = self.rotate.or(ctx.defaults.rotate);

        let mut out = Vec::with_capacity(len);
        for i in 0..len {
            let (dx, dy) = ctx.projection.project(xs[i], ys[i]);
            let mut attrs = base.clone();
            attrs.insert("fill".into(), colors[i].clone().into());
            attrs.insert("x".into(), num(dx)?);
            attrs.insert("y".into(), num(dy)?);
            if let Some(theta) = rotate {
                let transform = format!("rotate({} {} {})", fmt_num(theta), fmt_num(dx), fmt_num(dy));
                attrs.insert("transform".into(), transform.into());
            }
            out.push(Placement {
                naming: names[i].clone(),
                attrs,
                style: style.clone(),
                text: Some(texts[i].clone()),
                world: vec![Point2D::new(xs[i], ys[i])],
            });
        }
        Ok(out)
    }
}

// ============================================================================
// Line
// ============================================================================

#[derive(Clone, Debug)]
pub struct Line {
    common: Common,
    x1: Arg<f64>,
    y1: Arg<f64>,
    x2: Arg<f64>,
    y2: Arg<f64>,
    width: Option<Arg<f64>>,
}

impl Line {
    pub fn new(
        x1: impl Into<Arg<f64>>,
        y1: impl Into<Arg<f64>>,
        x2: impl Into<Arg<f64>>,
        y2: impl Into<Arg<f64>>,
    ) -> Self {
        Line {
            common: Common::default(),
            x1: x1.into(),
            y1: y1.into(),
            x2: x2.into(),
            y2: y2.into(),
            width: None,
        }
    }

    /// Stroke width in device units
    pub fn width(mut self, width: impl Into<Arg<f64>>) -> Self {
        self.width = Some(width.into());
        self
    }
}

impl Primitive for Line {
    fn kind(&self) -> ElementKind {
        ElementKind::Line
    }

    fn updates_extrema(&self) -> bool {
        self.common.update.unwrap_or(true)
    }

    fn namings(&self) -> &Arg<Naming> {
        &self.common.names
    }

    fn layout(&self, ctx: &LayoutContext<'_>) -> Result<Vec<Placement>> {
        let colors = self.common.colors(ctx);
        let len = common_len(&[
            self.common.names.shape_len(),
            colors.shape_len(),
            self.x1.shape_len(),
            self.y1.shape_len(),
            self.x2.shape_len(),
            self.y2.shape_len(),
            self.width.as_ref().and_then(Arg::shape_len),
        ])?;
        let names = self.common.names.clone().expand_at(0, len)?;
        let colors = colors.expand_at(1, len)?;
        let x1s = self.x1.clone().expand_at(2, len)?;
        let y1s = self.y1.clone().expand_at(3, len)?;
        let x2s = self.x2.clone().expand_at(4, len)?;
        let y2s = self.y2.clone().expand_at(5, len)?;
        let widths = match &self.width {
            Some(w) => Some(w.clone().expand_at(6, len)?),
            None => None,
        };
        let style = self.common.style(ctx);
        let base = self.common.attrs(ctx);

        let mut out = Vec::with_capacity(len);
        for i in 0..len {
            let (dx1, dy1) = ctx.projection.project(x1s[i], y1s[i]);
            let (dx2, dy2) = ctx.projection.project(x2s[i], y2s[i]);
            let mut attrs = base.clone();
            attrs.insert("x1".into(), num(dx1)?);
            attrs.insert("y1".into(), num(dy1)?);
            attrs.insert("x2".into(), num(dx2)?);
            attrs.insert("y2".into(), num(dy2)?);
            if let Some(w) = widths.as_ref().map(|w| w[i]).filter(|w| *w != 0.0) {
                attrs.insert("stroke-width".into(), num(w)?);
            }
            attrs.insert("stroke".into(), colors[i].clone().into());
            out.push(Placement {
                naming: names[i].clone(),
                attrs,
                style: style.clone(),
                text: None,
                world: vec![Point2D::new(x1s[i], y1s[i]), Point2D::new(x2s[i], y2s[i])],
            });
        }
        Ok(out)
    }
}

// ============================================================================
// Circle
// ============================================================================

#[derive(Clone, Debug)]
pub struct Circle {
    common: Common,
    cx: Arg<f64>,
    cy: Arg<f64>,
    r: Arg<f64>,
}

impl Circle {
    /// Circle of world radius `r`, scaled by the x axis
    pub fn new(cx: impl Into<Arg<f64>>, cy: impl Into<Arg<f64>>, r: impl Into<Arg<f64>>) -> Self {
        Circle {
            common: Common::default(),
            cx: cx.into(),
            cy: cy.into(),
            r: r.into(),
        }
    }
}

impl Primitive for Circle {
    fn kind(&self) -> ElementKind {
        ElementKind::Circle
    }

    fn updates_extrema(&self) -> bool {
        self.common.update.unwrap_or(true)
    }

    fn namings(&self) -> &Arg<Naming> {
        &self.common.names
    }

    fn layout(&self, ctx: &LayoutContext<'_>) -> Result<Vec<Placement>> {
        let colors = self.common.colors(ctx);
        let len = common_len(&[
            self.common.names.shape_len(),
            colors.shape_len(),
            self.cx.shape_len(),
            self.cy.shape_len(),
            self.r.shape_len(),
        ])?;
        let names = self.common.names.clone().expand_at(0, len)?;
        let colors = colors.expand_at(1, len)?;
        let cxs = self.cx.clone().expand_at(2, len)?;
        let cys = self.cy.clone().expand_at(3, len)?;
        let rs = self.r.clone().expand_at(4, len)?;
        let style = self.common.style(ctx);
        let base = self.common.attrs(ctx);

        let mut out = Vec::with_capacity(len);
        for i in 0..len {
            let (dx, dy) = ctx.projection.project(cxs[i], cys[i]);
            let (dr, _) = ctx.projection.scale_length(rs[i], 0.0);
            let mut attrs = base.clone();
            attrs.insert("cx".into(), num(dx)?);
            attrs.insert("cy".into(), num(dy)?);
            attrs.insert("r".into(), num(dr.abs())?);
            attrs.insert("fill".into(), colors[i].clone().into());
            out.push(Placement {
                naming: names[i].clone(),
                attrs,
                style: style.clone(),
                text: None,
                world: vec![Point2D::new(cxs[i], cys[i])],
            });
        }
        Ok(out)
    }
}

// ============================================================================
// Rect
// ============================================================================

#[derive(Clone, Debug)]
pub struct Rect {
    common: Common,
    x: Arg<f64>,
    y: Arg<f64>,
    width: Arg<f64>,
    height: Arg<f64>,
}

impl Rect {
    /// Rectangle with world corner `(x, y)` extending by `width` and `height`
    pub fn new(
        x: impl Into<Arg<f64>>,
        y: impl Into<Arg<f64>>,
        width: impl Into<Arg<f64>>,
        height: impl Into<Arg<f64>>,
    ) -> Self {
        Rect {
            common: Common::default(),
            x: x.into(),
            y: y.into(),
            width: width.into(),
            height: height.into(),
        }
    }
}

impl Primitive for Rect {
    fn kind(&self) -> ElementKind {
        ElementKind::Rect
    }

    fn updates_extrema(&self) -> bool {
        self.common.update.unwrap_or(true)
    }

    fn namings(&self) -> &Arg<Naming> {
        &self.common.names
    }

    fn layout(&self, ctx: &LayoutContext<'_>) -> Result<Vec<Placement>> {
        let colors = self.common.colors(ctx);
        let len = common_len(&[
            self.common.names.shape_len(),
            colors.shape_len(),
            self.x.shape_len(),
            self.y.shape_len(),
            self.width.shape_len(),
            self.height.shape_len(),
        ])?;
        let names = self.common.names.clone().expand_at(0, len)?;
        let colors = colors.expand_at(1, len)?;
        let xs = self.x.clone().expand_at(2, len)?;
        let ys = self.y.clone().expand_at(3, len)?;
        let ws = self.width.clone().expand_at(4, len)?;
        let hs = self.height.clone().expand_at(5, len)?;
        let style = self.common.style(ctx);
        let base = self.common.attrs(ctx);
        let flipped = ctx.projection.y_scale() < 0.0;

        let mut out = Vec::with_capacity(len);
        for i in 0..len {
            let (dx, mut dy) = ctx.projection.project(xs[i], ys[i]);
            let (dw, dh) = ctx.projection.scale_length(ws[i], hs[i]);
            let (dw, dh) = (dw.abs(), dh.abs());
            if flipped {
                // the world corner is the bottom edge on a y-down device
                dy -= dh;
            }
            let mut attrs = base.clone();
            attrs.insert("x".into(), num(dx)?);
            attrs.insert("y".into(), num(dy)?);
            attrs.insert("width".into(), num(dw)?);
            attrs.insert("height".into(), num(dh)?);
            attrs.insert("fill".into(), colors[i].clone().into());
            out.push(Placement {
                naming: names[i].clone(),
                attrs,
                style: style.clone(),
                text: None,
                world: vec![
                    Point2D::new(xs[i] + ws[i], ys[i] + hs[i]),
                    Point2D::new(xs[i], ys[i]),
                ],
            });
        }
        Ok(out)
    }
}

// ============================================================================
// Polygon
// ============================================================================

/// A single closed polygon through world points
#[derive(Clone, Debug)]
pub struct Polygon {
    common: Common,
    points: Vec<Point2D>,
}

impl Polygon {
    pub fn new(points: impl IntoIterator<Item = impl Into<Point2D>>) -> Self {
        Polygon {
            common: Common::default(),
            points: points.into_iter().map(Into::into).collect(),
        }
    }
}

impl Primitive for Polygon {
    fn kind(&self) -> ElementKind {
        ElementKind::Polygon
    }

    fn updates_extrema(&self) -> bool {
        self.common.update.unwrap_or(true)
    }

    fn namings(&self) -> &Arg<Naming> {
        &self.common.names
    }

    fn layout(&self, ctx: &LayoutContext<'_>) -> Result<Vec<Placement>> {
        let colors = self.common.colors(ctx);
        let len = common_len(&[self.common.names.shape_len(), colors.shape_len()])?;
        if len != 1 {
            return Err(BroadcastError::ShapeMismatch {
                index: 0,
                found: len,
                expected: 1,
            }
            .into());
        }
        let naming = self.common.names.clone().expand_at(0, 1)?.remove(0);
        let color = colors.expand_at(1, 1)?.remove(0);

        let points = self
            .points
            .iter()
            .map(|p| {
                let d = ctx.projection.project_point(*p);
                Ok(format!("{},{}", fmt_num(check_finite(d.x)?), fmt_num(check_finite(d.y)?)))
            })
            .collect::<Result<Vec<_>, NumericError>>()?
            .join(" ");
        let mut attrs = self.common.attrs(ctx);
        attrs.insert("points".into(), points.into());
        attrs.insert("fill".into(), color.into());
        Ok(vec![Placement {
            naming,
            attrs,
            style: self.common.style(ctx),
            text: None,
            world: self.points.clone(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DoodleError;
    use serde_json::json;

    fn ctx_parts() -> (Projection, Defaults) {
        (
            Projection::try_new(10.0, -10.0, 100.0, 100.0).unwrap(),
            Defaults::default(),
        )
    }

    #[test]
    fn strings_with_a_star_are_exact_names() {
        assert_eq!(Naming::from("KB"), Naming::Prefix("KB".into()));
        assert_eq!(Naming::from("KB*2"), Naming::Exact("KB*2".into()));
        assert!(Naming::Prefix("a*b".into()).validate().is_err());
        assert!(Naming::Exact("a*b".into()).validate().is_ok());
        assert_eq!(
            Arg::<Naming>::from(["dot", "label*1"]),
            Arg::Seq(vec![Naming::Prefix("dot".into()), Naming::Exact("label*1".into())])
        );
    }

    #[test]
    fn circle_radius_uses_x_scale_magnitude() {
        let (projection, defaults) = ctx_parts();
        let ctx = LayoutContext {
            projection: &projection,
            defaults: &defaults,
        };
        let placed = Shape::from(Circle::new(1.0, 2.0, 0.5).color("red"))
            .layout(&ctx)
            .unwrap();
        assert_eq!(placed.len(), 1);
        assert_eq!(
            Value::Object(placed[0].attrs.clone()),
            json!({"cx": 110.0, "cy": 80.0, "r": 5.0, "fill": "red"})
        );
    }

    #[test]
    fn rect_shifts_up_on_flipped_axis() {
        let (projection, defaults) = ctx_parts();
        let ctx = LayoutContext {
            projection: &projection,
            defaults: &defaults,
        };
        let placed = Rect::new(0.0, 0.0, 2.0, 3.0).layout(&ctx).unwrap();
        let attrs = &placed[0].attrs;
        assert_eq!(attrs["x"], json!(100.0));
        assert_eq!(attrs["y"], json!(70.0));
        assert_eq!(attrs["width"], json!(20.0));
        assert_eq!(attrs["height"], json!(30.0));
        assert_eq!(
            placed[0].world,
            vec![Point2D::new(2.0, 3.0), Point2D::new(0.0, 0.0)]
        );
    }

    #[test]
    fn text_rotation_is_not_negated() {
        let (projection, defaults) = ctx_parts();
        let ctx = LayoutContext {
            projection: &projection,
            defaults: &defaults,
        };
        let placed = Text::new(0.0, 0.0, "hi").rotate(-55.0).layout(&ctx).unwrap();
        assert_eq!(placed[0].attrs["transform"], json!("rotate(-55 100 100)"));
        assert_eq!(placed[0].text.as_deref(), Some("hi"));
        assert!(!Text::new(0.0, 0.0, "hi").updates_extrema());
    }

    #[test]
    fn line_broadcasts_and_skips_zero_width() {
        let (projection, defaults) = ctx_parts();
        let ctx = LayoutContext {
            projection: &projection,
            defaults: &defaults,
        };
        let placed = Line::new(0.0, [0.0, 1.0, 2.0], 1.0, 0.0)
            .width([0.0, 2.0, 2.0])
            .named("grid")
            .layout(&ctx)
            .unwrap();
        assert_eq!(placed.len(), 3);
        assert!(!placed[0].attrs.contains_key("stroke-width"));
        assert_eq!(placed[1].attrs["stroke-width"], json!(2.0));
        assert_eq!(placed[2].attrs["stroke"], json!("black"));
        assert!(placed.iter().all(|p| p.naming == Naming::Prefix("grid".into())));
    }

    #[test]
    fn mismatched_arguments_fail_layout() {
        let (projection, defaults) = ctx_parts();
        let ctx = LayoutContext {
            projection: &projection,
            defaults: &defaults,
        };
        let err = Circle::new([0.0, 1.0], [0.0, 1.0, 2.0], 1.0)
            .layout(&ctx)
            .unwrap_err();
        assert!(matches!(
            err,
            DoodleError::Broadcast(BroadcastError::ShapeMismatch {
                index: 2,
                found: 2,
                expected: 3
            })
        ));
    }

    #[test]
    fn polygon_points_are_projected() {
        let (projection, defaults) = ctx_parts();
        let ctx = LayoutContext {
            projection: &projection,
            defaults: &defaults,
        };
        let placed = Polygon::new([(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)])
            .layout(&ctx)
            .unwrap();
        assert_eq!(placed[0].attrs["points"], json!("100,100 110,100 100,90"));
        assert_eq!(placed[0].world.len(), 3);
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let (projection, defaults) = ctx_parts();
        let ctx = LayoutContext {
            projection: &projection,
            defaults: &defaults,
        };
        let err = Circle::new(f64::NAN, 0.0, 1.0).layout(&ctx).unwrap_err();
        assert!(matches!(err, DoodleError::Numeric(NumericError::NaN)));
        // finite in world space, overflows once scaled
        let err = Line::new(0.0, 0.0, f64::MAX, 0.0).layout(&ctx).unwrap_err();
        assert!(matches!(err, DoodleError::Numeric(NumericError::Infinite)));
        let err = Polygon::new([(0.0, 0.0), (0.0, f64::INFINITY)])
            .layout(&ctx)
            .unwrap_err();
        assert!(matches!(err, DoodleError::Numeric(NumericError::Infinite)));
    }
}
