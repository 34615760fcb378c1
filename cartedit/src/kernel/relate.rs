//! DE-9IM relation matrices and the named predicates derived from them.

use std::fmt::{Display, Formatter};

use geo::coordinate_position::CoordPos;
use geo::dimensions::Dimensions;
use geo::relate::IntersectionMatrix;
use geo::Relate;
use geo_types::Geometry as GeoGeometry;

use super::{coord_key, Components};
use crate::error::EngineError;

const POSITIONS: [CoordPos; 3] = [CoordPos::Inside, CoordPos::OnBoundary, CoordPos::Outside];

/// DE-9IM matrix. Every cell is one of `F`, `0`, `1` or `2`, cells are stored row by row in the order interior,
/// boundary, exterior.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RelateMatrix {
    cells: [u8; 9],
}

impl RelateMatrix {
    /// Matrix of two geometries that do not meet, given the dimension of each geometry and of its boundary.
    pub(crate) fn disjoint(
        a: Option<usize>,
        a_boundary: Option<usize>,
        b: Option<usize>,
        b_boundary: Option<usize>,
    ) -> Self {
        let mut cells = [b'F'; 9];
        cells[2] = dim_char(a);
        cells[5] = dim_char(a_boundary);
        cells[6] = dim_char(b);
        cells[7] = dim_char(b_boundary);
        cells[8] = b'2';
        Self { cells }
    }

    /// Parses a matrix from its 9 character form.
    pub fn parse(value: &str) -> Result<Self, EngineError> {
        let bytes = value.as_bytes();
        if bytes.len() != 9 || !bytes.iter().all(|b| matches!(b, b'F' | b'0' | b'1' | b'2')) {
            return Err(EngineError::InvalidInput(format!(
                "invalid intersection matrix: {value}"
            )));
        }

        let mut cells = [b'F'; 9];
        cells.copy_from_slice(bytes);
        Ok(Self { cells })
    }

    fn from_geo(matrix: &IntersectionMatrix) -> Self {
        let mut cells = [b'F'; 9];
        for (row, lhs) in POSITIONS.iter().enumerate() {
            for (col, rhs) in POSITIONS.iter().enumerate() {
                cells[row * 3 + col] = match matrix.get(*lhs, *rhs) {
                    Dimensions::Empty => b'F',
                    Dimensions::ZeroDimensional => b'0',
                    Dimensions::OneDimensional => b'1',
                    Dimensions::TwoDimensional => b'2',
                };
            }
        }
        Self { cells }
    }

    /// Checks the matrix against a pattern of `T`, `F`, `*`, `0`, `1` and `2` characters.
    pub fn matches(&self, pattern: &str) -> Result<bool, EngineError> {
        let pattern = pattern.as_bytes();
        if pattern.len() != 9 {
            return Err(EngineError::InvalidInput(format!(
                "relate pattern must have 9 characters, got {}",
                pattern.len()
            )));
        }

        let mut result = true;
        for (cell, expected) in self.cells.iter().zip(pattern) {
            let matches = match expected.to_ascii_uppercase() {
                b'*' => true,
                b'T' => *cell != b'F',
                b'F' => *cell == b'F',
                b @ (b'0' | b'1' | b'2') => *cell == b,
                other => {
                    return Err(EngineError::InvalidInput(format!(
                        "invalid character in relate pattern: {}",
                        other as char
                    )))
                }
            };
            result &= matches;
        }

        Ok(result)
    }

    fn is(&self, pattern: &str) -> bool {
        self.matches(pattern).unwrap_or(false)
    }

    /// The geometries have no point in common.
    pub fn is_disjoint(&self) -> bool {
        self.is("FF*FF****")
    }

    /// The geometries have at least one point in common.
    pub fn is_intersects(&self) -> bool {
        !self.is_disjoint()
    }

    /// The geometries meet only at their boundaries. `dims` are the dimensions of the two geometries.
    pub fn is_touches(&self, dims: (usize, usize)) -> bool {
        if dims == (0, 0) {
            return false;
        }
        self.is("FT*******") || self.is("F**T*****") || self.is("F***T****")
    }

    /// The interiors meet in a geometry of lower dimension than the inputs have.
    pub fn is_crosses(&self, dims: (usize, usize)) -> bool {
        match dims {
            (1, 1) => self.is("0********"),
            (a, b) if a < b => self.is("T*T******"),
            (a, b) if a > b => self.is("T*****T**"),
            _ => false,
        }
    }

    /// The first geometry lies in the second one.
    pub fn is_within(&self) -> bool {
        self.is("T*F**F***")
    }

    /// The first geometry contains the second one.
    pub fn is_contains(&self) -> bool {
        self.is("T*****FF*")
    }

    /// The geometries have the same dimension, share some but not all of their points, and their intersection has
    /// the same dimension too.
    pub fn is_overlaps(&self, dims: (usize, usize)) -> bool {
        match dims {
            (1, 1) => self.is("1*T***T**"),
            (a, b) if a == b => self.is("T*T***T**"),
            _ => false,
        }
    }

    /// The geometries are topologically equal.
    pub fn is_equal_topo(&self) -> bool {
        self.is("T*F**FFF*")
    }
}

impl Display for RelateMatrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.cells))
    }
}

fn dim_char(dim: Option<usize>) -> u8 {
    match dim {
        None => b'F',
        Some(0) => b'0',
        Some(1) => b'1',
        Some(_) => b'2',
    }
}

/// Computes the DE-9IM matrix of the two geometries.
pub(crate) fn relate(a: &GeoGeometry<f64>, b: &GeoGeometry<f64>) -> RelateMatrix {
    RelateMatrix::from_geo(&a.relate(b))
}

/// Dimension of the boundary of the geometry, `None` if the boundary is empty.
///
/// Points and closed lines have no boundary. Endpoints of lines are boundary points only if an odd number of lines
/// end there.
pub(crate) fn boundary_dimension(geometry: &GeoGeometry<f64>) -> Option<usize> {
    let components = Components::of(geometry);
    if !components.polygons.is_empty() {
        return Some(1);
    }

    let mut endpoints = ahash::AHashMap::new();
    for line in &components.lines {
        if let (Some(first), Some(last)) = (line.0.first(), line.0.last()) {
            *endpoints.entry(coord_key(*first)).or_insert(0usize) += 1;
            *endpoints.entry(coord_key(*last)).or_insert(0usize) += 1;
        }
    }

    endpoints.values().any(|count| count % 2 == 1).then_some(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use geo_types::{line_string, point, polygon};

    fn square(x0: f64, y0: f64, size: f64) -> GeoGeometry<f64> {
        polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
        ]
        .into()
    }

    #[test]
    fn overlapping_squares() {
        let matrix = relate(&square(0.0, 0.0, 2.0), &square(1.0, 1.0, 2.0));
        assert_eq!(matrix.to_string(), "212101212");
        assert!(matrix.is_overlaps((2, 2)));
        assert!(matrix.is_intersects());
        assert!(!matrix.is_touches((2, 2)));
    }

    #[test]
    fn touching_squares() {
        let matrix = relate(&square(0.0, 0.0, 1.0), &square(1.0, 0.0, 1.0));
        assert!(matrix.is_touches((2, 2)));
        assert!(!matrix.is_overlaps((2, 2)));
        assert!(!matrix.is_disjoint());
    }

    #[test]
    fn line_crosses_polygon() {
        let line: GeoGeometry<f64> = line_string![(x: -1.0, y: 0.5), (x: 2.0, y: 0.5)].into();
        let matrix = relate(&line, &square(0.0, 0.0, 1.0));
        assert!(matrix.is_crosses((1, 2)));
        assert!(!matrix.is_within());
    }

    #[test]
    fn point_within_polygon() {
        let p: GeoGeometry<f64> = point!(x: 0.5, y: 0.5).into();
        let matrix = relate(&p, &square(0.0, 0.0, 1.0));
        assert!(matrix.is_within());
        assert!(relate(&square(0.0, 0.0, 1.0), &p).is_contains());
    }

    #[test]
    fn pattern_matching() {
        let matrix = RelateMatrix::parse("212101212").unwrap();
        assert!(matrix.matches("T*T***T**").unwrap());
        assert!(matrix.matches("2********").unwrap());
        assert!(!matrix.matches("F********").unwrap());
        assert_matches!(matrix.matches("T*T"), Err(EngineError::InvalidInput(_)));
        assert_matches!(matrix.matches("X********"), Err(EngineError::InvalidInput(_)));
        assert_matches!(RelateMatrix::parse("21210121"), Err(EngineError::InvalidInput(_)));
    }

    #[test]
    fn disjoint_matrix() {
        let matrix = RelateMatrix::disjoint(Some(2), Some(1), Some(1), Some(0));
        assert_eq!(matrix.to_string(), "FF2FF1102");
        assert_eq!(
            relate(&square(0.0, 0.0, 1.0), &line_string![(x: 5.0, y: 5.0), (x: 6.0, y: 6.0)].into()),
            matrix
        );
    }

    #[test]
    fn boundary_of_lines() {
        let open: GeoGeometry<f64> = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)].into();
        assert_eq!(boundary_dimension(&open), Some(0));
        let closed: GeoGeometry<f64> =
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 0.0)].into();
        assert_eq!(boundary_dimension(&closed), None);
        assert_eq!(boundary_dimension(&point!(x: 0.0, y: 0.0).into()), None);
        assert_eq!(boundary_dimension(&square(0.0, 0.0, 1.0)), Some(1));
    }
}
