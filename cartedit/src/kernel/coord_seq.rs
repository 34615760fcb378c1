//! Construction of kernel coordinate sequences from application vertices.

use cartedit_types::Point;
use geo_types::{Coord, LineString as GeoLineString};

use super::Zm;

/// Rounds the value to the nearest multiple of `precision`. Non-positive precision leaves the value unchanged.
pub(crate) fn snap(value: f64, precision: f64) -> f64 {
    if precision > 0.0 {
        (value / precision).round() * precision
    } else {
        value
    }
}

/// Flat list of planar coordinates with the non-planar ordinates stored alongside.
#[derive(Debug, Default, Clone)]
pub(crate) struct CoordinateSequence {
    pub coords: Vec<Coord>,
    pub zm: Vec<Zm>,
}

impl CoordinateSequence {
    /// Builds the sequence from the vertices, snapping `x`, `y` and `z` to the precision grid. Measures are never
    /// snapped. With `force_close` the first vertex is appended to an open sequence.
    pub fn build(points: &[Point], precision: f64, force_close: bool) -> Self {
        let close = force_close
            && match (points.first(), points.last()) {
                (Some(first), Some(last)) => !first.equals_2d(last),
                _ => false,
            };

        let mut sequence = Self {
            coords: Vec::with_capacity(points.len() + close as usize),
            zm: Vec::with_capacity(points.len() + close as usize),
        };

        let closing = if close { points.first() } else { None };
        for point in points.iter().chain(closing) {
            sequence.push(point, precision);
        }

        sequence
    }

    fn push(&mut self, point: &Point, precision: f64) {
        self.coords.push(Coord {
            x: snap(point.x, precision),
            y: snap(point.y, precision),
        });
        self.zm.push(Zm {
            z: point.z.map(|z| snap(z, precision)).unwrap_or(0.0),
            m: point.m.unwrap_or(0.0),
        });
    }

    pub fn into_line_string(self) -> (GeoLineString<f64>, Vec<Zm>) {
        (GeoLineString::new(self.coords), self.zm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_to_grid() {
        assert_eq!(snap(1.26, 0.5), 1.5);
        assert_eq!(snap(-1.26, 0.5), -1.5);
        assert_eq!(snap(1.26, 0.0), 1.26);
        assert_eq!(snap(1.26, -1.0), 1.26);
    }

    #[test]
    fn build_closes_ring() {
        let points = [Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)];
        let sequence = CoordinateSequence::build(&points, 0.0, true);
        assert_eq!(sequence.coords.len(), 4);
        assert_eq!(sequence.coords[0], sequence.coords[3]);

        let open = CoordinateSequence::build(&points, 0.0, false);
        assert_eq!(open.coords.len(), 3);
    }

    #[test]
    fn measure_is_not_snapped() {
        let points = [Point::new_zm(0.24, 0.26, 1.3, 1.3)];
        let sequence = CoordinateSequence::build(&points, 0.5, false);
        assert_eq!(sequence.coords[0], Coord { x: 0.0, y: 0.5 });
        assert_eq!(sequence.zm[0], Zm { z: 1.5, m: 1.3 });
    }
}
