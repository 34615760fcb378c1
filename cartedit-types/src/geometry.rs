use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::geometry_type::GeometryKind;
use crate::rect::Rect;
use crate::{
    CoordDims, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon, Point,
    Polygon,
};

/// Any geometry of the model.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum Geometry {
    /// Point.
    Point(Point),
    /// Line string.
    LineString(LineString),
    /// Polygon.
    Polygon(Polygon),
    /// Multi point.
    MultiPoint(MultiPoint),
    /// Multi line string.
    MultiLineString(MultiLineString),
    /// Multi polygon.
    MultiPolygon(MultiPolygon),
    /// Geometry collection.
    GeometryCollection(GeometryCollection),
}

impl Geometry {
    /// An empty geometry collection.
    pub fn empty() -> Self {
        Self::GeometryCollection(GeometryCollection::default())
    }

    /// Kind of the geometry.
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::Polygon(_) => GeometryKind::Polygon,
            Geometry::MultiPoint(_) => GeometryKind::MultiPoint,
            Geometry::MultiLineString(_) => GeometryKind::MultiLineString,
            Geometry::MultiPolygon(_) => GeometryKind::MultiPolygon,
            Geometry::GeometryCollection(_) => GeometryKind::GeometryCollection,
        }
    }

    /// Topological dimension: 0 for points, 1 for lines, 2 for areas. For collections it is the highest dimension
    /// of the members, and 0 for an empty collection.
    pub fn dimension(&self) -> usize {
        match self {
            Geometry::Point(_) | Geometry::MultiPoint(_) => 0,
            Geometry::LineString(_) | Geometry::MultiLineString(_) => 1,
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) => 2,
            Geometry::GeometryCollection(c) => c.iter().map(|g| g.dimension()).max().unwrap_or(0),
        }
    }

    /// Ordinates carried by the vertices of the geometry.
    pub fn dims(&self) -> CoordDims {
        match self {
            Geometry::Point(p) => p.dims(),
            Geometry::LineString(l) => l.dims(),
            Geometry::Polygon(p) => p.dims(),
            Geometry::MultiPoint(mp) => mp
                .iter()
                .fold(CoordDims::XY, |dims, p| dims.union(p.dims())),
            Geometry::MultiLineString(ml) => ml
                .iter()
                .fold(CoordDims::XY, |dims, l| dims.union(l.dims())),
            Geometry::MultiPolygon(mp) => mp
                .iter()
                .fold(CoordDims::XY, |dims, p| dims.union(p.dims())),
            Geometry::GeometryCollection(c) => c
                .iter()
                .fold(CoordDims::XY, |dims, g| dims.union(g.dims())),
        }
    }

    /// Returns true for multi-part geometries and collections.
    pub fn is_multi(&self) -> bool {
        self.kind().is_multi()
    }

    /// Returns true if the geometry has no vertices.
    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Point(_) => false,
            Geometry::LineString(l) => l.is_empty(),
            Geometry::Polygon(p) => p.is_empty(),
            Geometry::MultiPoint(mp) => mp.is_empty(),
            Geometry::MultiLineString(ml) => ml.iter().all(|l| l.is_empty()),
            Geometry::MultiPolygon(mp) => mp.iter().all(|p| p.is_empty()),
            Geometry::GeometryCollection(c) => c.iter().all(|g| g.is_empty()),
        }
    }

    /// Number of parts. Single geometries have one part.
    pub fn num_parts(&self) -> usize {
        match self {
            Geometry::MultiPoint(mp) => mp.len(),
            Geometry::MultiLineString(ml) => ml.len(),
            Geometry::MultiPolygon(mp) => mp.len(),
            Geometry::GeometryCollection(c) => c.len(),
            _ => 1,
        }
    }

    /// Returns the parts of the geometry as separate geometries. A single geometry returns a copy of itself.
    pub fn parts(&self) -> Vec<Geometry> {
        self.clone().into_parts()
    }

    /// Consumes the geometry and returns its parts.
    pub fn into_parts(self) -> Vec<Geometry> {
        match self {
            Geometry::MultiPoint(mp) => mp.into_inner().into_iter().map(Geometry::from).collect(),
            Geometry::MultiLineString(ml) => {
                ml.into_inner().into_iter().map(Geometry::from).collect()
            }
            Geometry::MultiPolygon(mp) => mp.into_inner().into_iter().map(Geometry::from).collect(),
            Geometry::GeometryCollection(c) => c.into_inner(),
            single => vec![single],
        }
    }

    /// Builds a geometry out of a list of parts.
    ///
    /// Parts of the same single kind produce a multi geometry of that kind, multi-part inputs are flattened into
    /// it. Parts of different kinds produce a geometry collection.
    pub fn from_parts(parts: Vec<Geometry>) -> Geometry {
        let kinds: Vec<_> = parts.iter().map(|p| p.kind().single()).collect();
        let common = match kinds.first() {
            Some(first) if kinds.iter().all(|k| k == first) => *first,
            _ => None,
        };

        let flat = || parts.clone().into_iter().flat_map(Geometry::into_parts);
        match common {
            Some(GeometryKind::Point) => Geometry::MultiPoint(
                flat()
                    .filter_map(|g| match g {
                        Geometry::Point(p) => Some(p),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .into(),
            ),
            Some(GeometryKind::LineString) => Geometry::MultiLineString(
                flat()
                    .filter_map(|g| match g {
                        Geometry::LineString(l) => Some(l),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .into(),
            ),
            Some(GeometryKind::Polygon) => Geometry::MultiPolygon(
                flat()
                    .filter_map(|g| match g {
                        Geometry::Polygon(p) => Some(p),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .into(),
            ),
            _ => Geometry::GeometryCollection(parts.into()),
        }
    }

    /// Converts a single geometry into a multi geometry with one member. Multi geometries are returned as is.
    pub fn into_multi(self) -> Geometry {
        match self {
            Geometry::Point(p) => Geometry::MultiPoint(vec![p].into()),
            Geometry::LineString(l) => Geometry::MultiLineString(vec![l].into()),
            Geometry::Polygon(p) => Geometry::MultiPolygon(vec![p].into()),
            multi => multi,
        }
    }

    /// Iterates over all vertices of the geometry.
    pub fn points(&self) -> Box<dyn Iterator<Item = &Point> + '_> {
        match self {
            Geometry::Point(p) => Box::new(std::iter::once(p)),
            Geometry::LineString(l) => Box::new(l.iter()),
            Geometry::Polygon(p) => Box::new(p.rings().flat_map(|r| r.iter())),
            Geometry::MultiPoint(mp) => Box::new(mp.iter()),
            Geometry::MultiLineString(ml) => Box::new(ml.iter().flat_map(|l| l.iter())),
            Geometry::MultiPolygon(mp) => Box::new(
                mp.iter()
                    .flat_map(|p| p.rings().flat_map(|r| r.iter())),
            ),
            Geometry::GeometryCollection(c) => Box::new(c.iter().flat_map(|g| g.points())),
        }
    }

    /// Bounding rectangle of the geometry, or `None` if it is empty.
    pub fn bounding_rect(&self) -> Option<Rect> {
        Rect::from_points(self.points())
    }

    /// Checks that every line of the geometry has at least 2 vertices and every ring at least 4.
    pub fn check_structure(&self) -> Result<(), GeometryError> {
        match self {
            Geometry::Point(_) | Geometry::MultiPoint(_) => Ok(()),
            Geometry::LineString(l) => l.check_size("line string", 2),
            Geometry::Polygon(p) => p.check_size(),
            Geometry::MultiLineString(ml) => ml
                .iter()
                .try_for_each(|l| l.check_size("line string", 2)),
            Geometry::MultiPolygon(mp) => mp.iter().try_for_each(|p| p.check_size()),
            Geometry::GeometryCollection(c) => c.iter().try_for_each(|g| g.check_structure()),
        }
    }
}

impl From<Point> for Geometry {
    fn from(value: Point) -> Self {
        Self::Point(value)
    }
}

impl From<LineString> for Geometry {
    fn from(value: LineString) -> Self {
        Self::LineString(value)
    }
}

impl From<Polygon> for Geometry {
    fn from(value: Polygon) -> Self {
        Self::Polygon(value)
    }
}

impl From<MultiPoint> for Geometry {
    fn from(value: MultiPoint) -> Self {
        Self::MultiPoint(value)
    }
}

impl From<MultiLineString> for Geometry {
    fn from(value: MultiLineString) -> Self {
        Self::MultiLineString(value)
    }
}

impl From<MultiPolygon> for Geometry {
    fn from(value: MultiPolygon) -> Self {
        Self::MultiPolygon(value)
    }
}

impl From<GeometryCollection> for Geometry {
    fn from(value: GeometryCollection) -> Self {
        Self::GeometryCollection(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64) -> Polygon {
        Polygon::from(vec![(x, 0.0), (x + 1.0, 0.0), (x + 1.0, 1.0), (x, 1.0)])
    }

    #[test]
    fn from_parts_builds_homogeneous_multi() {
        let multi = Geometry::from_parts(vec![square(0.0).into(), square(2.0).into()]);
        assert_eq!(multi.kind(), GeometryKind::MultiPolygon);
        assert_eq!(multi.num_parts(), 2);

        let flattened = Geometry::from_parts(vec![
            Geometry::MultiPolygon(vec![square(0.0), square(2.0)].into()),
            square(4.0).into(),
        ]);
        assert_eq!(flattened.num_parts(), 3);
    }

    #[test]
    fn from_parts_builds_collection_for_mixed_kinds() {
        let mixed = Geometry::from_parts(vec![square(0.0).into(), Point::new(1.0, 1.0).into()]);
        assert_eq!(mixed.kind(), GeometryKind::GeometryCollection);
        assert_eq!(mixed.dimension(), 2);
        assert_eq!(Geometry::from_parts(vec![]), Geometry::empty());
    }

    #[test]
    fn parts_round_trip() {
        let multi = Geometry::MultiLineString(
            vec![
                LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]),
                LineString::from(vec![(2.0, 2.0), (3.0, 3.0)]),
            ]
            .into(),
        );
        assert_eq!(Geometry::from_parts(multi.parts()), multi);
        assert_eq!(
            Geometry::from(square(0.0)).into_multi().kind(),
            GeometryKind::MultiPolygon
        );
    }

    #[test]
    fn bounding_rect_of_collection() {
        let collection = Geometry::from_parts(vec![
            square(0.0).into(),
            Point::new(-3.0, 7.0).into(),
        ]);
        assert_eq!(
            collection.bounding_rect(),
            Some(Rect::new(-3.0, 0.0, 1.0, 7.0))
        );
        assert_eq!(Geometry::empty().bounding_rect(), None);
        assert!(Geometry::empty().is_empty());
    }

    #[test]
    fn check_structure_reports_short_lines() {
        let line = Geometry::LineString(LineString::from(vec![(0.0, 0.0)]));
        assert!(line.check_structure().is_err());
        assert!(Geometry::from(square(0.0)).check_structure().is_ok());
    }

    #[test]
    fn serde_keeps_ordinates() {
        let geometry = Geometry::from_parts(vec![
            Polygon::new(
                LineString::new(vec![
                    Point::new_z(0.0, 0.0, 1.0),
                    Point::new_z(4.0, 0.0, 2.0),
                    Point::new_z(4.0, 4.0, 3.0),
                    Point::new_z(0.0, 0.0, 1.0),
                ]),
                vec![],
            )
            .into(),
            Point::new_m(7.0, 7.0, 0.25).into(),
        ]);

        let json = serde_json::to_string(&geometry).unwrap();
        let restored: Geometry = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, geometry);
        assert_eq!(restored.kind(), GeometryKind::GeometryCollection);
    }
}
