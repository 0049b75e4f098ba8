//! Renderer-side element store.
//!
//! Applies batches the way a browser view does: elements keyed by name in
//! insertion order, `change_element` on an unknown name ignored, `empty`
//! clearing everything. Can serialize its state as a standalone SVG document.

use std::fmt::Write as _;

use serde_json::Value;

use super::command::{AttrMap, Batch, ElementKind, PendingCommand};
use crate::log::{debug, warn};
use crate::types::{BBox, Point2D};

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Device size, view box and root style of a drawing surface
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
    /// `[min_x, min_y, width, height]`
    pub view_box: [f64; 4],
    pub style: AttrMap,
}

impl Frame {
    /// A frame whose view box covers `width × height` from the origin
    pub fn new(width: f64, height: f64) -> Self {
        Frame {
            width,
            height,
            view_box: [0.0, 0.0, width, height],
            style: AttrMap::new(),
        }
    }

    pub fn view_box_attr(&self) -> String {
        self.view_box
            .iter()
            .map(|v| fmt_num(*v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub name: String,
    pub kind: ElementKind,
    pub attrs: AttrMap,
    pub style: AttrMap,
    pub text: Option<String>,
}

impl Element {
    fn number(&self, key: &str) -> Option<f64> {
        match self.attrs.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn point(&self, x: &str, y: &str) -> Option<Point2D> {
        Some(Point2D::new(self.number(x)?, self.number(y)?))
    }

    /// Expand `bounds` by this element's geometry, ignoring transforms and text extents.
    pub fn expand_bounds(&self, bounds: &mut BBox) {
        match self.kind {
            ElementKind::Line => {
                if let Some(p) = self.point("x1", "y1") {
                    bounds.expand_point(p);
                }
                if let Some(p) = self.point("x2", "y2") {
                    bounds.expand_point(p);
                }
            }
            ElementKind::Circle => {
                if let (Some(c), Some(r)) = (self.point("cx", "cy"), self.number("r")) {
                    bounds.expand_rect(Point2D::new(c.x - r, c.y - r), 2.0 * r, 2.0 * r);
                }
            }
            ElementKind::Rect => {
                if let (Some(corner), Some(w), Some(h)) = (
                    self.point("x", "y"),
                    self.number("width"),
                    self.number("height"),
                ) {
                    bounds.expand_rect(corner, w, h);
                }
            }
            ElementKind::Text => {
                if let Some(p) = self.point("x", "y") {
                    bounds.expand_point(p);
                }
            }
            ElementKind::Polygon => {
                let Some(Value::String(points)) = self.attrs.get("points") else {
                    return;
                };
                for pair in points.split_whitespace() {
                    let Some((x, y)) = pair.split_once(',') else {
                        continue;
                    };
                    if let (Ok(x), Ok(y)) = (x.parse(), y.parse()) {
                        bounds.expand_point(Point2D::new(x, y));
                    }
                }
            }
        }
    }

    fn merge(&mut self, attrs: &AttrMap, style: &AttrMap, text: &Option<String>) {
        for (k, v) in attrs {
            self.attrs.insert(k.clone(), v.clone());
        }
        for (k, v) in style {
            self.style.insert(k.clone(), v.clone());
        }
        if let Some(text) = text.as_ref().filter(|t| !t.is_empty()) {
            self.text = Some(text.clone());
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    frame: Frame,
    elements: Vec<Element>,
    bounding_box: Option<[f64; 4]>,
    applied: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Scene::new(Frame::new(500.0, 500.0))
    }
}

impl Scene {
    pub fn new(frame: Frame) -> Self {
        Scene {
            frame,
            elements: Vec::new(),
            bounding_box: None,
            applied: 0,
        }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn set_frame(&mut self, frame: Frame) {
        self.frame = frame;
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn get(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Last box computed by a `fit` with positive area
    pub fn bounding_box(&self) -> Option<[f64; 4]> {
        self.bounding_box
    }

    /// Sequence number of the last batch applied
    pub fn last_sequence(&self) -> u64 {
        self.applied
    }

    pub fn apply_batch(&mut self, batch: &Batch) {
        for command in &batch.commands {
            self.apply(command);
        }
        self.applied = batch.sequence;
    }

    pub fn apply(&mut self, command: &PendingCommand) {
        match command {
            PendingCommand::AddElement {
                name,
                kind,
                attrs,
                style,
                text,
            } => {
                // A reused name replaces the old element
                self.elements.retain(|e| &e.name != name);
                let mut element = Element {
                    name: name.clone(),
                    kind: *kind,
                    attrs: AttrMap::new(),
                    style: AttrMap::new(),
                    text: None,
                };
                element.merge(attrs, style, text);
                self.elements.push(element);
            }
            PendingCommand::ChangeElement {
                name,
                attrs,
                style,
                text,
            } => match self.elements.iter_mut().find(|e| &e.name == name) {
                Some(element) => element.merge(attrs, style, text),
                None => {
                    warn!(name = name.as_str(), "change_element for unknown element");
                }
            },
            PendingCommand::Empty => self.elements.clear(),
            PendingCommand::DeleteNames { names } => {
                self.elements.retain(|e| !names.contains(&e.name));
            }
            PendingCommand::Fit { change_view } => self.fit(*change_view),
        }
    }

    fn fit(&mut self, change_view: bool) {
        let mut bounds = BBox::new();
        for element in &self.elements {
            element.expand_bounds(&mut bounds);
        }
        if bounds.is_empty() || bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            debug!("fit skipped: bounding box has no area");
            return;
        }
        let view_box = bounds.to_view_box();
        self.bounding_box = Some(view_box);
        if change_view {
            self.frame.view_box = view_box;
        }
    }

    /// Standalone SVG document of the current state
    pub fn to_svg_document(&self) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            r#"<svg xmlns="{SVG_NAMESPACE}" preserveAspectRatio="none" viewBox="{}" width="{}" height="{}""#,
            self.frame.view_box_attr(),
            fmt_num(self.frame.width),
            fmt_num(self.frame.height),
        );
        if !self.frame.style.is_empty() {
            let _ = write!(out, r#" style="{}""#, escape(&style_attr(&self.frame.style)));
        }
        out.push_str(">\n");
        for element in &self.elements {
            write_element(&mut out, element);
        }
        out.push_str("</svg>\n");
        out
    }
}

fn write_element(out: &mut String, element: &Element) {
    let _ = write!(out, "<{}", element.kind.tag());
    for (key, value) in &element.attrs {
        if let Some(value) = attr_value(value) {
            let _ = write!(out, r#" {key}="{}""#, escape(&value));
        }
    }
    if !element.style.is_empty() {
        let _ = write!(out, r#" style="{}""#, escape(&style_attr(&element.style)));
    }
    match &element.text {
        Some(text) => {
            let _ = writeln!(out, ">{}</{}>", escape(text), element.kind.tag());
        }
        None => out.push_str("/>\n"),
    }
}

fn attr_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Number(n) => n.as_f64().map(fmt_num),
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn style_attr(style: &AttrMap) -> String {
    style
        .iter()
        .filter_map(|(k, v)| attr_value(v).map(|v| format!("{k}: {v}")))
        .collect::<Vec<_>>()
        .join("; ")
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// Format a number for SVG output: 6 significant figures, trailing zeros trimmed.
pub(crate) fn fmt_num(value: f64) -> String {
    fmt_num_precision(value, 6)
}

fn fmt_num_precision(value: f64, sig_figs: i32) -> String {
    if value == 0.0 || value.is_nan() {
        return "0".to_string();
    }
    if value.is_infinite() {
        return value.to_string();
    }

    let magnitude = value.abs().log10().floor() as i32;
    let scale = 10_f64.powi(sig_figs - 1 - magnitude);
    let rounded = (value * scale).round() / scale;

    let decimals = (sig_figs - 1 - magnitude).max(0) as usize;
    let s = format!("{:.prec$}", rounded, prec = decimals);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}
