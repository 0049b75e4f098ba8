//! World-space 2D diagrams as batched scene-mutation commands.
//!
//! A [`Surface`] projects world coordinates onto a device, names every element
//! it draws, and buffers `add`/`change`/`delete` commands that a
//! [`RenderSink`] applies in numbered batches. Interaction events flow back
//! through [`Surface::dispatch_event`]. The [`solver`] module places points
//! from ratio-of-distance constraints via Apollonius circles.

pub mod broadcast;
pub mod config;
pub mod errors;
mod log;
pub mod projection;
pub mod protocol;
pub mod solver;
pub mod ticks;
pub mod transform;
pub mod types;

pub use broadcast::Arg;
pub use config::{FlushMode, SurfaceConfig, WaitPolicy};
pub use errors::{
    BroadcastError, DoodleError, LayoutError, NumericError, ProtocolError, Result, SolverError,
    TransformError,
};
pub use projection::{Bounds, Extrema, Projection};
pub use protocol::{
    AttrMap, AxisStyle, Circle, InteractionEvent, Line, Naming, Polygon, Rect, RenderSink,
    Sampling, Surface, Text,
};
pub use solver::{AnchorPair, ApolloniusCircle, apollonius_circle, intersect_two_apollonius_circles};
pub use transform::Affine;
pub use types::Point2D;
