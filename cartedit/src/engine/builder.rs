use cartedit_types::Geometry;

use super::GeometryEngine;
use crate::options::{EngineOptions, DEFAULT_QUADRANT_SEGMENTS};

/// Convenience type to initialize a [GeometryEngine].
///
/// ```
/// use cartedit::GeometryEngineBuilder;
/// use cartedit::cartedit_types::Point;
///
/// let engine = GeometryEngineBuilder::default()
///     .with_geometry(Point::new(1.0, 2.0).into())
///     .with_precision(0.001)
///     .build();
/// ```
#[derive(Default)]
pub struct GeometryEngineBuilder {
    geometry: Option<Geometry>,
    options: Option<EngineOptions>,
    precision: Option<f64>,
    split_area_tolerance: Option<f64>,
    quadrant_segments: Option<u32>,
    line_containment_tolerance: Option<f64>,
}

impl GeometryEngineBuilder {
    /// Sets the geometry of the engine.
    ///
    /// Defaults to an empty geometry collection. Most operations of an engine without a geometry fail with
    /// [`EngineError::MissingGeometry`](crate::EngineError::MissingGeometry).
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Sets all the options at once. Options set by other methods of the builder take precedence over the values
    /// in `options`, regardless of the order of the calls.
    ///
    /// ```
    /// use cartedit::{EngineOptions, GeometryEngineBuilder};
    ///
    /// let options: EngineOptions = serde_json::from_str(r#"{"precision": 0.01}"#).unwrap();
    /// let engine = GeometryEngineBuilder::default()
    ///     .with_options(options)
    ///     .with_split_area_tolerance(0.05)
    ///     .build();
    ///
    /// assert_eq!(engine.options().precision, 0.01);
    /// assert_eq!(engine.options().split_area_tolerance, 0.05);
    /// ```
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Sets the size of the grid the coordinates are snapped to.
    ///
    /// Defaults to `0`, which disables snapping.
    pub fn with_precision(mut self, precision: f64) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Sets the half-width of the area ratio band used to accept polygon split fragments.
    ///
    /// Defaults to `0.01`.
    pub fn with_split_area_tolerance(mut self, tolerance: f64) -> Self {
        self.split_area_tolerance = Some(tolerance);
        self
    }

    /// Sets the number of segments used to approximate a quarter of a circle in buffers.
    ///
    /// Defaults to [`DEFAULT_QUADRANT_SEGMENTS`].
    pub fn with_quadrant_segments(mut self, segments: u32) -> Self {
        self.quadrant_segments = Some(segments);
        self
    }

    /// Sets the half-width of the length ratio band used by reshape to decide if one line lies along another.
    ///
    /// Defaults to `0.1`.
    pub fn with_line_containment_tolerance(mut self, tolerance: f64) -> Self {
        self.line_containment_tolerance = Some(tolerance);
        self
    }

    /// Consumes the builder and creates the engine.
    pub fn build(self) -> GeometryEngine {
        let Self {
            geometry,
            options,
            precision,
            split_area_tolerance,
            quadrant_segments,
            line_containment_tolerance,
        } = self;

        let base = options.unwrap_or_default();
        let quadrant_segments = quadrant_segments.unwrap_or(base.quadrant_segments);
        let options = EngineOptions {
            precision: precision.unwrap_or(base.precision).max(0.0),
            split_area_tolerance: split_area_tolerance.unwrap_or(base.split_area_tolerance),
            quadrant_segments: if quadrant_segments == 0 {
                log::warn!("Quadrant segments must be positive, using {DEFAULT_QUADRANT_SEGMENTS}");
                DEFAULT_QUADRANT_SEGMENTS
            } else {
                quadrant_segments
            },
            line_containment_tolerance: line_containment_tolerance
                .unwrap_or(base.line_containment_tolerance),
        };

        GeometryEngine::with_options(geometry.unwrap_or_else(Geometry::empty), options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::square;

    #[test]
    fn defaults() {
        let engine = GeometryEngineBuilder::default().build();
        assert_eq!(*engine.options(), EngineOptions::default());
        assert!(engine.geometry().is_empty());
    }

    #[test]
    fn explicit_values_override_options() {
        let engine = GeometryEngineBuilder::default()
            .with_precision(0.5)
            .with_options(EngineOptions {
                precision: 2.0,
                quadrant_segments: 4,
                ..Default::default()
            })
            .with_geometry(square(0.0, 0.0, 1.0).into())
            .build();

        assert_eq!(engine.options().precision, 0.5);
        assert_eq!(engine.options().quadrant_segments, 4);
        assert_eq!(engine.geometry().num_parts(), 1);
    }

    #[test]
    fn invalid_values_are_corrected() {
        let engine = GeometryEngineBuilder::default()
            .with_precision(-1.0)
            .with_quadrant_segments(0)
            .build();
        assert_eq!(engine.options().precision, 0.0);
        assert_eq!(engine.options().quadrant_segments, DEFAULT_QUADRANT_SEGMENTS);
    }
}
