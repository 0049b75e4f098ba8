//! Host configuration for a drawing surface.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::projection::Bounds;
use crate::protocol::command::AttrMap;

pub const DEFAULT_COLOR: &str = "black";
pub const DEFAULT_WIDTH: f64 = 500.0;
pub const DEFAULT_MARGIN: f64 = 50.0;
pub const DEFAULT_WAIT_ITERATIONS: u32 = 100;
pub const DEFAULT_WAIT_SLEEP: Duration = Duration::from_millis(100);

/// When buffered commands reach the sink
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushMode {
    /// Every drawing call flushes
    #[default]
    Immediate,
    /// Commands accumulate until `flush`
    Explicit,
}

/// Bounded polling for renderer acknowledgements
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitPolicy {
    pub iterations: u32,
    pub sleep: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        WaitPolicy {
            iterations: DEFAULT_WAIT_ITERATIONS,
            sleep: DEFAULT_WAIT_SLEEP,
        }
    }
}

/// Everything a host chooses about a surface, loadable from JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub flush_mode: FlushMode,
    pub color: String,
    /// Default style of drawn elements
    pub element_style: AttrMap,
    /// Style of the root `<svg>` element
    pub svg_style: AttrMap,
    /// Device width in pixels, margins included
    pub width: f64,
    /// Device height; derived from the width and bounds when absent
    pub height: Option<f64>,
    pub bounds: Bounds,
    pub margin: f64,
    pub wait_iterations: u32,
    pub wait_sleep_ms: u64,
    /// Route events to per-element callbacks before the default one
    pub local_events: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        SurfaceConfig {
            flush_mode: FlushMode::default(),
            color: DEFAULT_COLOR.to_string(),
            element_style: AttrMap::new(),
            svg_style: AttrMap::new(),
            width: DEFAULT_WIDTH,
            height: None,
            bounds: Bounds::new(0.0, 0.0, 1.0, 1.0),
            margin: DEFAULT_MARGIN,
            wait_iterations: DEFAULT_WAIT_ITERATIONS,
            wait_sleep_ms: DEFAULT_WAIT_SLEEP.as_millis() as u64,
            local_events: true,
        }
    }
}

impl SurfaceConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy {
            iterations: self.wait_iterations,
            sleep: Duration::from_millis(self.wait_sleep_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let config = SurfaceConfig::from_json("{}").unwrap();
        assert_eq!(config, SurfaceConfig::default());
        assert_eq!(config.wait_policy(), WaitPolicy::default());
    }

    #[test]
    fn partial_json_overrides() {
        let config = SurfaceConfig::from_json(
            r#"{
                "flush_mode": "explicit",
                "width": 700,
                "bounds": {"xmin": -3, "ymin": -6, "xmax": 6, "ymax": 2},
                "svg_style": {"background": "white"},
                "wait_sleep_ms": 5
            }"#,
        )
        .unwrap();
        assert_eq!(config.flush_mode, FlushMode::Explicit);
        assert_eq!(config.width, 700.0);
        assert_eq!(config.bounds, Bounds::new(-3.0, -6.0, 6.0, 2.0));
        assert_eq!(config.margin, DEFAULT_MARGIN);
        assert_eq!(config.wait_policy().sleep, Duration::from_millis(5));
        assert!(config.local_events);
    }

    #[test]
    fn unknown_flush_mode_is_an_error() {
        assert!(SurfaceConfig::from_json(r#"{"flush_mode": "sometimes"}"#).is_err());
    }
}
