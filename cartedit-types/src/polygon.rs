use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::{CoordDims, LineString};

/// Polygon: an exterior ring with an ordered list of interior rings (holes).
///
/// Rings are always stored closed.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Polygon {
    exterior: LineString,
    interiors: Vec<LineString>,
}

impl Polygon {
    /// Creates a new polygon, closing any ring that is not closed.
    pub fn new(mut exterior: LineString, mut interiors: Vec<LineString>) -> Self {
        exterior.close();
        for ring in &mut interiors {
            ring.close();
        }

        Self {
            exterior,
            interiors,
        }
    }

    /// Creates a polygon from a list of rings where the first one is the exterior ring.
    pub fn from_rings(rings: Vec<LineString>) -> Result<Self, GeometryError> {
        let mut iter = rings.into_iter();
        let exterior = iter
            .next()
            .ok_or_else(|| GeometryError::Conversion("polygon without exterior ring".into()))?;
        Ok(Self::new(exterior, iter.collect()))
    }

    /// Exterior ring.
    pub fn exterior(&self) -> &LineString {
        &self.exterior
    }

    /// Interior rings.
    pub fn interiors(&self) -> &[LineString] {
        &self.interiors
    }

    /// Iterates over all rings, exterior first.
    pub fn rings(&self) -> impl Iterator<Item = &LineString> {
        std::iter::once(&self.exterior).chain(self.interiors.iter())
    }

    /// Consumes the polygon and returns its rings, exterior first.
    pub fn into_rings(self) -> Vec<LineString> {
        let mut rings = Vec::with_capacity(self.interiors.len() + 1);
        rings.push(self.exterior);
        rings.extend(self.interiors);
        rings
    }

    /// Ordinates carried by the vertices.
    pub fn dims(&self) -> CoordDims {
        self.rings()
            .fold(self.exterior.dims(), |dims, ring| dims.union(ring.dims()))
    }

    /// Returns true if the polygon has no vertices.
    pub fn is_empty(&self) -> bool {
        self.exterior.is_empty()
    }

    /// Checks that every non-empty ring has at least 4 vertices.
    pub fn check_size(&self) -> Result<(), GeometryError> {
        for ring in self.rings() {
            ring.check_size("polygon ring", 4)?;
        }

        if self.exterior.is_empty() && !self.interiors.is_empty() {
            return Err(GeometryError::Conversion(
                "polygon with holes has empty exterior ring".into(),
            ));
        }

        Ok(())
    }
}

impl From<LineString> for Polygon {
    fn from(value: LineString) -> Self {
        Self::new(value, vec![])
    }
}

impl From<Vec<(f64, f64)>> for Polygon {
    fn from(value: Vec<(f64, f64)>) -> Self {
        Self::new(value.into(), vec![])
    }
}
