//! Interaction events reported by a renderer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::command::AttrMap;
use super::registry::prefix_of;

/// A pointer or keyboard event on a named element.
///
/// `payload` holds whatever the renderer reported; browser renderers add the
/// device-space pointer position as `svgX` / `svgY`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub payload: AttrMap,
}

impl InteractionEvent {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        InteractionEvent {
            name: name.into(),
            kind: kind.into(),
            payload: AttrMap::new(),
        }
    }

    /// Attach a device-space pointer position
    pub fn at(mut self, svg_x: f64, svg_y: f64) -> Self {
        self.payload.insert("svgX".into(), svg_x.into());
        self.payload.insert("svgY".into(), svg_y.into());
        self
    }

    /// Build from a flat browser payload carrying `name` and `type`.
    ///
    /// A missing name means the event hit the canvas itself.
    pub fn from_payload(payload: AttrMap) -> Self {
        let text = |key: &str| {
            payload
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        InteractionEvent {
            name: text("name"),
            kind: text("type"),
            payload,
        }
    }

    /// Device-space pointer position, when reported
    pub fn device_point(&self) -> Option<(f64, f64)> {
        let x = self.payload.get("svgX")?.as_f64()?;
        let y = self.payload.get("svgY")?.as_f64()?;
        Some((x, y))
    }

    /// Prefix of the element the event hit
    pub fn prefix(&self) -> &str {
        prefix_of(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn browser_payload() {
        let Value::Object(payload) = json!({
            "type": "click",
            "name": "K*4",
            "svgX": 120.5,
            "svgY": 33,
            "shiftKey": false
        }) else {
            unreachable!()
        };
        let event = InteractionEvent::from_payload(payload);
        assert_eq!(event.kind, "click");
        assert_eq!(event.name, "K*4");
        assert_eq!(event.prefix(), "K");
        assert_eq!(event.device_point(), Some((120.5, 33.0)));
    }

    #[test]
    fn canvas_event_without_name() {
        let event = InteractionEvent::from_payload(AttrMap::new());
        assert_eq!(event.name, "");
        assert_eq!(event.device_point(), None);
        assert_eq!(InteractionEvent::new("a", "mousemove").at(1.0, 2.0).device_point(), Some((1.0, 2.0)));
    }
}
