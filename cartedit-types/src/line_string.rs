use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::rect::Rect;
use crate::{CoordDims, Point};

/// Sequence of vertices connected with straight segments. Also used for polygon rings.
///
/// All vertices of a line have the same set of ordinates, described by [`LineString::dims`].
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct LineString {
    points: Vec<Point>,
    dims: CoordDims,
}

impl std::ops::Deref for LineString {
    type Target = [Point];

    fn deref(&self) -> &Self::Target {
        &self.points
    }
}

impl LineString {
    /// Creates a new line. Dimensionality of the line is the union of the dimensionality of all vertices, and the
    /// vertices that lack an ordinate get it with the value of `0.0`.
    pub fn new(points: Vec<Point>) -> Self {
        let dims = points
            .iter()
            .fold(CoordDims::XY, |dims, p| dims.union(p.dims()));
        Self::with_dims(points, dims)
    }

    /// Creates a new line with the given dimensionality, adjusting every vertex to it.
    pub fn with_dims(points: Vec<Point>, dims: CoordDims) -> Self {
        let points = points.into_iter().map(|p| p.with_dims(dims)).collect();
        Self { points, dims }
    }

    /// Creates an empty line.
    pub fn empty(dims: CoordDims) -> Self {
        Self {
            points: vec![],
            dims,
        }
    }

    /// Ordinates carried by the vertices.
    pub fn dims(&self) -> CoordDims {
        self.dims
    }

    /// Vertices of the line.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Consumes the line and returns its vertices.
    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    /// Appends a vertex to the end of the line.
    pub fn push(&mut self, point: Point) {
        self.points.push(point.with_dims(self.dims));
    }

    /// Mutable access to a vertex.
    pub fn point_mut(&mut self, index: usize) -> Option<&mut Point> {
        self.points.get_mut(index)
    }

    /// Returns true if the line has at least two vertices and the first vertex has the same planar coordinates as
    /// the last one.
    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => self.points.len() > 1 && first.equals_2d(last),
            _ => false,
        }
    }

    /// Appends the first vertex to the end of the line if the line is not closed.
    pub fn close(&mut self) {
        if !self.is_closed() {
            if let Some(first) = self.points.first().copied() {
                self.points.push(first);
            }
        }
    }

    /// Returns a copy of the line with the order of vertices reversed.
    pub fn reversed(&self) -> Self {
        Self {
            points: self.points.iter().rev().copied().collect(),
            dims: self.dims,
        }
    }

    /// Iterates over the segments of the line.
    pub fn segments(&self) -> impl Iterator<Item = (&Point, &Point)> {
        self.points.windows(2).map(|w| (&w[0], &w[1]))
    }

    /// Planar length of the line.
    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| a.distance_sq(b).sqrt()).sum()
    }

    /// Bounding rectangle of the line.
    pub fn bounding_rect(&self) -> Option<Rect> {
        Rect::from_points(self.points.iter())
    }

    /// Checks that the line has either no vertices or at least `required` of them.
    pub fn check_size(&self, kind: &'static str, required: usize) -> Result<(), GeometryError> {
        if !self.points.is_empty() && self.points.len() < required {
            return Err(GeometryError::TooFewPoints {
                kind,
                required,
                actual: self.points.len(),
            });
        }

        Ok(())
    }
}

impl From<Vec<Point>> for LineString {
    fn from(value: Vec<Point>) -> Self {
        Self::new(value)
    }
}

impl From<Vec<(f64, f64)>> for LineString {
    fn from(value: Vec<(f64, f64)>) -> Self {
        Self::new(value.into_iter().map(Point::from).collect())
    }
}

impl FromIterator<Point> for LineString {
    fn from_iter<T: IntoIterator<Item = Point>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
