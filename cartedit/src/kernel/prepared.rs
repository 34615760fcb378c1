//! Prepared geometry for repeated relation queries against the same geometry.

use geo::BoundingRect;
use geo_types::{Geometry as GeoGeometry, Rect};

use super::relate::{boundary_dimension, relate, RelateMatrix};
use super::Components;

/// Geometry with its envelope and dimensions precomputed.
///
/// Queries against geometries whose envelope does not meet the prepared one are answered without running the full
/// relate computation. Results are the same as from [`relate`].
#[derive(Debug, Clone)]
pub struct PreparedGeometry {
    geometry: GeoGeometry<f64>,
    bounds: Option<Rect<f64>>,
    dimension: Option<usize>,
    boundary: Option<usize>,
}

impl PreparedGeometry {
    pub(crate) fn new(geometry: &GeoGeometry<f64>) -> Self {
        Self {
            geometry: geometry.clone(),
            bounds: geometry.bounding_rect(),
            dimension: Components::of(geometry).dimension(),
            boundary: boundary_dimension(geometry),
        }
    }

    pub(crate) fn relate(&self, other: &GeoGeometry<f64>) -> RelateMatrix {
        let envelopes_meet = match (self.bounds, other.bounding_rect()) {
            (Some(a), Some(b)) => {
                a.min().x <= b.max().x
                    && b.min().x <= a.max().x
                    && a.min().y <= b.max().y
                    && b.min().y <= a.max().y
            }
            _ => false,
        };

        if envelopes_meet {
            relate(&self.geometry, other)
        } else {
            log::trace!("Prepared relate answered from envelopes");
            RelateMatrix::disjoint(
                self.dimension,
                self.boundary,
                Components::of(other).dimension(),
                boundary_dimension(other),
            )
        }
    }
}
