//! Error types used by the crate.

use cartedit_types::error::GeometryError;
use thiserror::Error;

/// Engine error type.
///
/// Split and reshape callers can branch on the numeric [`EngineError::code`] of the error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Geometry cannot be converted to or from the kernel representation.
    #[error("geometry conversion failed: {0}")]
    Conversion(String),
    /// Operation arguments are degenerate or of a wrong kind.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The geometries do not intersect, there is nothing to operate on.
    #[error("geometries do not intersect")]
    NoIntersection,
    /// The operation succeeded but did not change the geometry.
    #[error("operation did not change the geometry")]
    NoChange,
    /// The cutting or reshaping geometry overlaps the target instead of crossing it, or touches more rings than
    /// allowed.
    #[error("ambiguous topology: {0}")]
    AmbiguousTopology(String),
    /// The kernel failed while computing the result.
    #[error("geometry kernel error: {0}")]
    Kernel(String),
    /// Polygonization of the noded linework produced no polygons.
    #[error("polygonization produced no polygons")]
    EmptyPolygonization,
    /// The engine has no geometry to operate on.
    #[error("engine geometry is missing")]
    MissingGeometry,
    /// The engine geometry is not topologically valid.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// The operation produced a geometry that is not valid.
    #[error("invalid result: {0}")]
    InvalidResult(String),
}

impl EngineError {
    /// Stable numeric code of the error.
    ///
    /// * `1` - invalid input, no intersection or no change
    /// * `2` - conversion or kernel failure
    /// * `3` - ambiguous topology or invalid result
    /// * `4` - polygonization produced nothing
    /// * `5` - missing geometry
    /// * `7` - invalid target geometry
    pub fn code(&self) -> u32 {
        match self {
            EngineError::InvalidInput(_) | EngineError::NoIntersection | EngineError::NoChange => 1,
            EngineError::Conversion(_) | EngineError::Kernel(_) => 2,
            EngineError::AmbiguousTopology(_) | EngineError::InvalidResult(_) => 3,
            EngineError::EmptyPolygonization => 4,
            EngineError::MissingGeometry => 5,
            EngineError::InvalidGeometry(_) => 7,
        }
    }
}

impl From<GeometryError> for EngineError {
    fn from(value: GeometryError) -> Self {
        Self::Conversion(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes() {
        assert_eq!(EngineError::NoIntersection.code(), 1);
        assert_eq!(EngineError::NoChange.code(), 1);
        assert_eq!(EngineError::Kernel("boom".into()).code(), 2);
        assert_eq!(EngineError::AmbiguousTopology("overlap".into()).code(), 3);
        assert_eq!(EngineError::EmptyPolygonization.code(), 4);
        assert_eq!(EngineError::MissingGeometry.code(), 5);
        assert_eq!(EngineError::InvalidGeometry("bow tie".into()).code(), 7);
    }

    #[test]
    fn geometry_errors_are_conversion_errors() {
        let error: EngineError = GeometryError::TooFewPoints {
            kind: "line string",
            required: 2,
            actual: 1,
        }
        .into();
        assert_eq!(error.code(), 2);
        assert_eq!(
            error.to_string(),
            "geometry conversion failed: line string requires at least 2 points, got 1"
        );
    }
}
