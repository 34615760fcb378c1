//! Topological validity and simplicity checks.

use ahash::AHashSet;
use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::line_intersection::{line_intersection, LineIntersection};
use geo_types::{Coord, Geometry as GeoGeometry, Line, LineString as GeoLineString, Polygon as GeoPolygon};

use super::relate::relate;
use super::{coord_key, Components};

/// Returns the reason why the geometry is not valid, or `None` for a valid geometry.
pub(crate) fn validity_error(geometry: &GeoGeometry<f64>) -> Option<String> {
    let mut error = None;
    super::visit_coords(geometry, &mut |c| {
        if error.is_none() && !(c.x.is_finite() && c.y.is_finite()) {
            error = Some(format!("non-finite coordinate ({}, {})", c.x, c.y));
        }
    });
    if error.is_some() {
        return error;
    }

    let components = Components::of(geometry);
    for line in &components.lines {
        let mut distinct = AHashSet::new();
        if line.0.iter().filter(|c| distinct.insert(coord_key(**c))).count() < 2 {
            return Some("line string must have at least two distinct points".into());
        }
    }

    for polygon in &components.polygons {
        if let Some(error) = polygon_error(polygon) {
            return Some(error);
        }
    }

    if let GeoGeometry::MultiPolygon(mp) = geometry {
        for (i, a) in mp.0.iter().enumerate() {
            for b in &mp.0[i + 1..] {
                let matrix = relate(&a.clone().into(), &b.clone().into());
                if matrix.is_intersects()
                    && (matrix.matches("T********").unwrap_or(true)
                        || matrix.matches("****1****").unwrap_or(true))
                {
                    return Some("multipolygon members overlap".into());
                }
            }
        }
    }

    None
}

pub(crate) fn is_valid(geometry: &GeoGeometry<f64>) -> bool {
    validity_error(geometry).is_none()
}

fn segments(coords: &[Coord]) -> Vec<Line<f64>> {
    coords
        .windows(2)
        .filter(|w| w[0] != w[1])
        .map(|w| Line::new(w[0], w[1]))
        .collect()
}

fn boxes_meet(a: &Line<f64>, b: &Line<f64>) -> bool {
    a.start.x.min(a.end.x) <= b.start.x.max(b.end.x)
        && b.start.x.min(b.end.x) <= a.start.x.max(a.end.x)
        && a.start.y.min(a.end.y) <= b.start.y.max(b.end.y)
        && b.start.y.min(b.end.y) <= a.start.y.max(a.end.y)
}

/// Checks that the segments of the sequence only meet their neighbours, and only at the shared vertex. For closed
/// sequences the first and the last segment are neighbours.
fn is_sequence_simple(coords: &[Coord], closed: bool) -> bool {
    let segments = segments(coords);
    let n = segments.len();
    for i in 0..n {
        for j in i + 1..n {
            let (a, b) = (&segments[i], &segments[j]);
            if !boxes_meet(a, b) {
                continue;
            }

            let adjacent = j == i + 1;
            let closing = closed && i == 0 && j == n - 1 && n > 2;
            match line_intersection(*a, *b) {
                None => {}
                Some(LineIntersection::Collinear { .. }) => return false,
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    let shared = if adjacent {
                        Some(a.end)
                    } else if closing {
                        Some(a.start)
                    } else {
                        None
                    };
                    if shared != Some(intersection) {
                        return false;
                    }
                }
            }
        }
    }

    true
}

fn ring_error(ring: &GeoLineString<f64>) -> Option<String> {
    if ring.0.first() != ring.0.last() {
        return Some("ring is not closed".into());
    }
    if ring.0.len() < 4 {
        return Some(format!("ring has {} points, at least 4 are required", ring.0.len()));
    }
    if !is_sequence_simple(&ring.0, true) {
        return Some("ring self-intersection".into());
    }

    None
}

/// Checks that two rings meet at most at one point and do not cross.
fn rings_interact_error(a: &GeoLineString<f64>, b: &GeoLineString<f64>) -> Option<String> {
    let mut touches = AHashSet::new();
    for sa in segments(&a.0) {
        for sb in segments(&b.0) {
            if !boxes_meet(&sa, &sb) {
                continue;
            }

            match line_intersection(sa, sb) {
                None => {}
                Some(LineIntersection::Collinear { .. }) => {
                    return Some("rings overlap".into());
                }
                Some(LineIntersection::SinglePoint {
                    intersection,
                    is_proper,
                }) => {
                    if is_proper {
                        return Some("rings cross".into());
                    }
                    touches.insert(coord_key(intersection));
                }
            }
        }
    }

    if touches.len() > 1 {
        return Some("rings touch at more than one point".into());
    }

    None
}

/// Vertex of the ring that is not a vertex of `other`, or the midpoint of the first segment if there is none.
fn test_point(ring: &GeoLineString<f64>, other: &GeoLineString<f64>) -> Option<Coord> {
    let other_vertices: AHashSet<_> = other.0.iter().map(|c| coord_key(*c)).collect();
    ring.0
        .iter()
        .find(|c| !other_vertices.contains(&coord_key(**c)))
        .copied()
        .or_else(|| {
            let s = segments(&ring.0).into_iter().next()?;
            Some(Coord {
                x: (s.start.x + s.end.x) / 2.0,
                y: (s.start.y + s.end.y) / 2.0,
            })
        })
}

fn polygon_error(polygon: &GeoPolygon<f64>) -> Option<String> {
    let shell = polygon.exterior();
    if let Some(error) = ring_error(shell) {
        return Some(error);
    }

    let shell_polygon = GeoPolygon::new(shell.clone(), vec![]);
    for (i, hole) in polygon.interiors().iter().enumerate() {
        if let Some(error) = ring_error(hole) {
            return Some(format!("interior ring {i}: {error}"));
        }
        if let Some(error) = rings_interact_error(shell, hole) {
            return Some(format!("interior ring {i}: {error}"));
        }

        let inside = test_point(hole, shell)
            .is_some_and(|p| shell_polygon.coordinate_position(&p) == CoordPos::Inside);
        if !inside {
            return Some(format!("interior ring {i} is outside of the exterior ring"));
        }

        for (j, other) in polygon.interiors().iter().enumerate().skip(i + 1) {
            if let Some(error) = rings_interact_error(hole, other) {
                return Some(format!("interior rings {i} and {j}: {error}"));
            }

            let a = GeoPolygon::new(hole.clone(), vec![]);
            let b = GeoPolygon::new(other.clone(), vec![]);
            let nested = test_point(other, hole)
                .is_some_and(|p| a.coordinate_position(&p) == CoordPos::Inside)
                || test_point(hole, other)
                    .is_some_and(|p| b.coordinate_position(&p) == CoordPos::Inside);
            if nested {
                return Some(format!("interior rings {i} and {j} are nested"));
            }
        }
    }

    None
}

/// Returns true if the geometry has no anomalous self-intersections or self-tangency.
pub(crate) fn is_simple(geometry: &GeoGeometry<f64>) -> bool {
    match geometry {
        GeoGeometry::Point(_) => true,
        GeoGeometry::MultiPoint(mp) => {
            let mut seen = AHashSet::new();
            mp.0.iter().all(|p| seen.insert(coord_key(p.0)))
        }
        GeoGeometry::Line(_) => true,
        GeoGeometry::LineString(l) => is_line_simple(l),
        GeoGeometry::MultiLineString(ml) => {
            ml.0.iter().all(is_line_simple) && lines_meet_at_endpoints(&ml.0)
        }
        GeoGeometry::Polygon(p) => std::iter::once(p.exterior())
            .chain(p.interiors())
            .all(|r| is_sequence_simple(&r.0, true)),
        GeoGeometry::MultiPolygon(mp) => mp
            .0
            .iter()
            .all(|p| is_simple(&GeoGeometry::Polygon(p.clone()))),
        GeoGeometry::GeometryCollection(gc) => gc.0.iter().all(is_simple),
        GeoGeometry::Rect(_) | GeoGeometry::Triangle(_) => true,
    }
}

fn is_line_simple(line: &GeoLineString<f64>) -> bool {
    is_sequence_simple(&line.0, line.is_closed())
}

fn lines_meet_at_endpoints(lines: &[GeoLineString<f64>]) -> bool {
    let is_endpoint = |line: &GeoLineString<f64>, c: Coord| {
        line.0.first() == Some(&c) || line.0.last() == Some(&c)
    };

    for (i, a) in lines.iter().enumerate() {
        for b in &lines[i + 1..] {
            for sa in segments(&a.0) {
                for sb in segments(&b.0) {
                    if !boxes_meet(&sa, &sb) {
                        continue;
                    }

                    match line_intersection(sa, sb) {
                        None => {}
                        Some(LineIntersection::Collinear { .. }) => return false,
                        Some(LineIntersection::SinglePoint { intersection, .. }) => {
                            if !(is_endpoint(a, intersection) && is_endpoint(b, intersection)) {
                                return false;
                            }
                        }
                    }
                }
            }
        }
    }

    true
}
