//! Geometry type tags.

use serde::{Deserialize, Serialize};

/// Kind of a [`Geometry`](crate::Geometry).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum GeometryKind {
    /// Single point.
    Point,
    /// Single line.
    LineString,
    /// Single polygon.
    Polygon,
    /// Set of points.
    MultiPoint,
    /// Set of lines.
    MultiLineString,
    /// Set of polygons.
    MultiPolygon,
    /// Heterogeneous collection.
    GeometryCollection,
}

impl GeometryKind {
    /// Returns true for multi-part kinds (including collections).
    pub fn is_multi(&self) -> bool {
        matches!(
            self,
            Self::MultiPoint | Self::MultiLineString | Self::MultiPolygon | Self::GeometryCollection
        )
    }

    /// Kind of the members of a multi-part kind, or `self` for single kinds. Collections return `None`.
    pub fn single(&self) -> Option<Self> {
        match self {
            Self::Point | Self::MultiPoint => Some(Self::Point),
            Self::LineString | Self::MultiLineString => Some(Self::LineString),
            Self::Polygon | Self::MultiPolygon => Some(Self::Polygon),
            Self::GeometryCollection => None,
        }
    }
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Point => "Point",
            Self::LineString => "LineString",
            Self::Polygon => "Polygon",
            Self::MultiPoint => "MultiPoint",
            Self::MultiLineString => "MultiLineString",
            Self::MultiPolygon => "MultiPolygon",
            Self::GeometryCollection => "GeometryCollection",
        };
        f.write_str(name)
    }
}
