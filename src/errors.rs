//! Error types with diagnostic codes using miette
//!
//! Every failure is local and recoverable: the operation that raised it leaves
//! the drawing surface untouched. Each area of the crate has its own enum and
//! [`DoodleError`] gathers them for callers that mix areas.

use miette::Diagnostic;
use thiserror::Error;

// ============================================================================
// Transform Errors
// ============================================================================

/// Misuse of the affine transform algebra
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("cannot rotate toward a zero-length direction")]
    #[diagnostic(
        code(doodlekit::transform::degenerate_direction),
        help("rotate_by_direction needs a non-zero vector (dx, dy)")
    )]
    DegenerateDirection,

    #[error("transform is not invertible (determinant {determinant})")]
    #[diagnostic(code(doodlekit::transform::singular))]
    SingularTransform { determinant: f64 },

    #[error("homogeneous coordinate {w} is not 1; transform is not affine")]
    #[diagnostic(
        code(doodlekit::transform::non_affine),
        help("the bottom row of an affine transform must stay [0, 0, 1]")
    )]
    NonAffineResult { w: f64 },
}

// ============================================================================
// Broadcast Errors
// ============================================================================

/// Arguments of a vectorized call that cannot be aligned
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum BroadcastError {
    #[error("argument {index} has {found} elements, expected 1 or {expected}")]
    #[diagnostic(
        code(doodlekit::broadcast::shape_mismatch),
        help("pass a single value or a sequence as long as the longest argument")
    )]
    ShapeMismatch {
        index: usize,
        found: usize,
        expected: usize,
    },
}

// ============================================================================
// Layout Errors
// ============================================================================

/// Axis layout misuse
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("invalid tick range [{min}, {max}] with at most {max_count} ticks")]
    #[diagnostic(
        code(doodlekit::layout::invalid_tick_range),
        help("ticks need min < max and room for at least 2 ticks")
    )]
    InvalidTickRange { min: f64, max: f64, max_count: usize },

    #[error("no {axis} range to sample")]
    #[diagnostic(
        code(doodlekit::layout::missing_extent),
        help("draw something with update enabled first, or pass explicit bounds")
    )]
    MissingExtent { axis: &'static str },

    #[error("sample step {step} must be positive and finite")]
    #[diagnostic(code(doodlekit::layout::invalid_sample_step))]
    InvalidSampleStep { step: f64 },
}

// ============================================================================
// Solver Errors
// ============================================================================

/// Contradictory input to the geometric constraint solver
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("distance ratio 1 describes a line, not a circle")]
    #[diagnostic(
        code(doodlekit::solver::degenerate_ratio),
        help("the locus is the perpendicular bisector of the two anchors")
    )]
    DegenerateRatio,

    #[error("distance ratio {ratio} must be positive and finite")]
    #[diagnostic(code(doodlekit::solver::invalid_ratio))]
    InvalidRatio { ratio: f64 },

    #[error("no real locus: radius² term is {radicand}")]
    #[diagnostic(code(doodlekit::solver::no_real_locus))]
    NoRealLocus { radicand: f64 },

    #[error("circle centers coincide; intersection is undefined")]
    #[diagnostic(code(doodlekit::solver::coincident_centers))]
    CoincidentCenters,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Transform(#[from] TransformError),
}

// ============================================================================
// Protocol Errors
// ============================================================================

/// Misuse of the command batch protocol or its renderer sink
#[derive(Error, Diagnostic, Debug)]
pub enum ProtocolError {
    #[error("unknown prefix: {prefix}")]
    #[diagnostic(
        code(doodlekit::protocol::unknown_prefix),
        help("nothing has been drawn under this prefix since the last delete or empty")
    )]
    UnknownPrefix { prefix: String },

    #[error("invalid prefix {prefix:?}: prefixes may not contain '*'")]
    #[diagnostic(code(doodlekit::protocol::invalid_prefix))]
    InvalidPrefix { prefix: String },

    #[error("renderer did not acknowledge batch {sequence} after {iterations} polls")]
    #[diagnostic(
        code(doodlekit::protocol::acknowledgement_timeout),
        help("raise wait_iterations or wait_sleep, or make sure the host hook pumps events")
    )]
    AcknowledgementTimeout { sequence: u64, iterations: u32 },

    #[error("{operation} is not supported by this renderer")]
    #[diagnostic(code(doodlekit::protocol::unsupported_operation))]
    UnsupportedOperation { operation: &'static str },

    #[error("renderer transport failed")]
    #[diagnostic(code(doodlekit::protocol::transport))]
    Transport(#[source] std::io::Error),
}

// ============================================================================
// Numeric Errors
// ============================================================================

/// Invalid numeric value for a projection factor or device coordinate
#[derive(Error, Diagnostic, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericError {
    #[error("value is NaN")]
    #[diagnostic(code(doodlekit::numeric::nan))]
    NaN,
    #[error("value is infinite")]
    #[diagnostic(code(doodlekit::numeric::infinite))]
    Infinite,
    #[error("value is zero")]
    #[diagnostic(
        code(doodlekit::numeric::zero),
        help("scale factors are divided by when unprojecting")
    )]
    Zero,
}

// ============================================================================
// Umbrella
// ============================================================================

/// Any error a drawing surface can surface to its caller
#[derive(Error, Diagnostic, Debug)]
pub enum DoodleError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Broadcast(#[from] BroadcastError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Numeric(#[from] NumericError),
}

pub type Result<T, E = DoodleError> = std::result::Result<T, E>;
