//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// Geometry conversion error.
    #[error("invalid input geometry: {0}")]
    Conversion(String),
    /// A line or a ring does not have enough vertices to be a valid member of its geometry type.
    #[error("{kind} requires at least {required} points, got {actual}")]
    TooFewPoints {
        /// Name of the offending geometry element.
        kind: &'static str,
        /// Minimum number of points.
        required: usize,
        /// Number of points the element has.
        actual: usize,
    },
}
