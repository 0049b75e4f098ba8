//! The command batch protocol and the drawing surface built on it.
//!
//! This module is organized into submodules:
//! - `command`: wire commands, the command buffer and numbered batches
//! - `registry`: `prefix*n` element names
//! - `primitive`: text, line, circle, rect and polygon builders
//! - `scene`: a retained element list that applies batches and exports SVG
//! - `sink`: the renderer boundary and the bundled sinks
//! - `event`: interaction events reported back by renderers
//! - `surface`: world-space drawing, flushing, acknowledgements and dispatch
//! - `axis`, `plot`: axes and sampled plots drawn through the surface

pub mod axis;
pub mod command;
pub mod event;
pub mod plot;
pub mod primitive;
pub mod registry;
pub mod scene;
pub mod sink;
pub mod surface;

pub use axis::AxisStyle;
pub use command::{AttrMap, Batch, CommandBuffer, ElementKind, PendingCommand};
pub use event::InteractionEvent;
pub use plot::Sampling;
pub use primitive::{Circle, Defaults, Line, Naming, Polygon, Primitive, Rect, Shape, Text};
pub use registry::{NAME_SEPARATOR, PrefixRegistry, prefix_of};
pub use scene::{Element, Frame, Scene};
pub use sink::{AckHandle, Delivery, JsonSink, RecordingSink, RenderSink, StaticSvgSink};
pub use surface::{EventCallback, Surface};
