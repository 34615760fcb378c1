//! Numeric measures and linear referencing.

use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::line_intersection::{line_intersection, LineIntersection};
use geo::Area;
use geo_types::{Coord, Geometry as GeoGeometry, Line, MultiPolygon};

use super::{visit_coords, Components};

#[derive(Debug, Copy, Clone)]
enum Element {
    Point(Coord),
    Segment(Coord, Coord),
}

fn distance_sq(a: Coord, b: Coord) -> f64 {
    (a.x - b.x).powi(2) + (a.y - b.y).powi(2)
}

fn segment_length(a: Coord, b: Coord) -> f64 {
    distance_sq(a, b).sqrt()
}

/// Position of the projection of `p` onto the segment, as a fraction of the segment length clamped to `[0, 1]`.
fn projection_factor(a: Coord, b: Coord, p: Coord) -> f64 {
    let ds = b - a;
    let len_sq = ds.x * ds.x + ds.y * ds.y;
    if len_sq == 0.0 {
        return 0.0;
    }

    let dp = p - a;
    ((dp.x * ds.x + dp.y * ds.y) / len_sq).clamp(0.0, 1.0)
}

fn closest_on_segment(a: Coord, b: Coord, p: Coord) -> Coord {
    let r = projection_factor(a, b, p);
    a + (b - a) * r
}

fn elements(components: &Components) -> Vec<Element> {
    let mut elements: Vec<Element> = components.points.iter().map(|p| Element::Point(*p)).collect();
    let rings = components
        .polygons
        .iter()
        .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()));
    for line in components.lines.iter().chain(rings) {
        match line.0.len() {
            0 => {}
            1 => elements.push(Element::Point(line.0[0])),
            _ => elements.extend(line.0.windows(2).map(|w| Element::Segment(w[0], w[1]))),
        }
    }

    elements
}

/// First vertex of `geometry` that lies in one of the areas of `areas`.
fn vertex_in_area(geometry: &GeoGeometry<f64>, areas: &Components) -> Option<Coord> {
    if areas.polygons.is_empty() {
        return None;
    }

    let area = GeoGeometry::MultiPolygon(MultiPolygon::new(areas.polygons.clone()));
    let mut found = None;
    visit_coords(geometry, &mut |c| {
        if found.is_none() && area.coordinate_position(&c) != CoordPos::Outside {
            found = Some(c);
        }
    });
    found
}

fn nearest_of_elements(a: Element, b: Element) -> (Coord, Coord) {
    match (a, b) {
        (Element::Point(p), Element::Point(q)) => (p, q),
        (Element::Point(p), Element::Segment(q0, q1)) => (p, closest_on_segment(q0, q1, p)),
        (Element::Segment(p0, p1), Element::Point(q)) => (closest_on_segment(p0, p1, q), q),
        (Element::Segment(p0, p1), Element::Segment(q0, q1)) => {
            match line_intersection(Line::new(p0, p1), Line::new(q0, q1)) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    return (intersection, intersection)
                }
                Some(LineIntersection::Collinear { intersection }) => {
                    return (intersection.start, intersection.start)
                }
                None => {}
            }

            [
                (p0, closest_on_segment(q0, q1, p0)),
                (p1, closest_on_segment(q0, q1, p1)),
                (closest_on_segment(p0, p1, q0), q0),
                (closest_on_segment(p0, p1, q1), q1),
            ]
            .into_iter()
            .min_by(|x, y| distance_sq(x.0, x.1).total_cmp(&distance_sq(y.0, y.1)))
            .unwrap_or((p0, q0))
        }
    }
}

/// Pair of the closest points of the two geometries, the first point on `a` and the second on `b`.
///
/// Returns `None` if one of the geometries is empty.
pub(crate) fn nearest_points(a: &GeoGeometry<f64>, b: &GeoGeometry<f64>) -> Option<(Coord, Coord)> {
    let (ca, cb) = (Components::of(a), Components::of(b));
    let (ea, eb) = (elements(&ca), elements(&cb));
    if ea.is_empty() || eb.is_empty() {
        return None;
    }

    if let Some(p) = vertex_in_area(b, &ca).or_else(|| vertex_in_area(a, &cb)) {
        return Some((p, p));
    }

    let mut best: Option<(f64, (Coord, Coord))> = None;
    for ea in &ea {
        for eb in &eb {
            let pair = nearest_of_elements(*ea, *eb);
            let d = distance_sq(pair.0, pair.1);
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, pair));
                if d == 0.0 {
                    return Some(pair);
                }
            }
        }
    }

    best.map(|(_, pair)| pair)
}

/// Distance from `point` to the polyline `line`. Infinite for an empty line.
pub(crate) fn distance_to_line(point: Coord, line: &[Coord]) -> f64 {
    match line {
        [] => f64::INFINITY,
        [single] => segment_length(*single, point),
        _ => line
            .windows(2)
            .map(|w| distance_sq(closest_on_segment(w[0], w[1], point), point))
            .fold(f64::INFINITY, f64::min)
            .sqrt(),
    }
}

/// Length of the polyline.
pub(crate) fn line_length(line: &[Coord]) -> f64 {
    line.windows(2).map(|w| segment_length(w[0], w[1])).sum()
}

/// Minimum distance between the geometries, `None` if one of them is empty.
pub(crate) fn distance(a: &GeoGeometry<f64>, b: &GeoGeometry<f64>) -> Option<f64> {
    nearest_points(a, b).map(|(p, q)| segment_length(p, q))
}

pub(crate) fn area(geometry: &GeoGeometry<f64>) -> f64 {
    geometry.unsigned_area()
}

/// Length of the lines of the geometry. Areas contribute the length of their rings.
pub(crate) fn length(geometry: &GeoGeometry<f64>) -> f64 {
    let components = Components::of(geometry);
    let rings = components
        .polygons
        .iter()
        .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()));
    components
        .lines
        .iter()
        .chain(rings)
        .flat_map(|l| l.0.windows(2))
        .map(|w| segment_length(w[0], w[1]))
        .sum()
}

/// Point at the given distance along the lines of the geometry. Negative distance is measured from the end, values
/// out of range are clamped. Returns `None` if the geometry has no lines.
pub(crate) fn interpolate(geometry: &GeoGeometry<f64>, distance: f64) -> Option<Coord> {
    let lines = Components::of(geometry).lines;
    let first = *lines.first()?.0.first()?;
    let total: f64 = lines
        .iter()
        .flat_map(|l| l.0.windows(2))
        .map(|w| segment_length(w[0], w[1]))
        .sum();

    let target = if distance < 0.0 {
        total + distance
    } else {
        distance
    }
    .clamp(0.0, total);

    let mut walked = 0.0;
    let mut last = first;
    for w in lines.iter().flat_map(|l| l.0.windows(2)) {
        let len = segment_length(w[0], w[1]);
        if len > 0.0 && walked + len >= target {
            let r = (target - walked) / len;
            return Some(w[0] + (w[1] - w[0]) * r);
        }
        walked += len;
        last = w[1];
    }

    Some(last)
}

/// Distance along the lines of the geometry to the point closest to `point`. Returns `None` if the geometry has no
/// lines.
pub(crate) fn project(geometry: &GeoGeometry<f64>, point: Coord) -> Option<f64> {
    let lines = Components::of(geometry).lines;
    let mut best: Option<(f64, f64)> = None;
    let mut walked = 0.0;

    for line in &lines {
        if line.0.len() == 1 {
            let d = distance_sq(line.0[0], point);
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, walked));
            }
        }

        for w in line.0.windows(2) {
            let r = projection_factor(w[0], w[1], point);
            let len = segment_length(w[0], w[1]);
            let d = distance_sq(w[0] + (w[1] - w[0]) * r, point);
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, walked + r * len));
            }
            walked += len;
        }
    }

    best.map(|(_, along)| along)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use geo_types::{line_string, point, polygon, MultiLineString};

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
    fn area_and_length() {
        let polygon: GeoGeometry<f64> = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0)],
            interiors: [[(x: 1.0, y: 1.0), (x: 2.0, y: 1.0), (x: 2.0, y: 2.0), (x: 1.0, y: 2.0)]],
        )
        .into();
        assert_abs_diff_eq!(area(&polygon), 15.0);
        assert_abs_diff_eq!(length(&polygon), 20.0);

        let line: GeoGeometry<f64> = line_string![(x: 0.0, y: 0.0), (x: 3.0, y: 4.0)].into();
        assert_abs_diff_eq!(length(&line), 5.0);
        assert_abs_diff_eq!(area(&line), 0.0);
    }

    #[test]
    fn distance_between_squares() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(3.0, 0.5, 1.0);
        assert_abs_diff_eq!(distance(&a, &b).unwrap(), 2.0);
        let (p, q) = nearest_points(&a, &b).unwrap();
        assert_abs_diff_eq!(p.x, 1.0);
        assert_abs_diff_eq!(q.x, 3.0);

        let inside: GeoGeometry<f64> = point!(x: 0.5, y: 0.5).into();
        assert_abs_diff_eq!(distance(&a, &inside).unwrap(), 0.0);
        let empty = GeoGeometry::GeometryCollection(geo_types::GeometryCollection(vec![]));
        assert_eq!(distance(&a, &empty), None);
    }

    #[test]
    fn point_to_line() {
        let line: GeoGeometry<f64> = line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)].into();
        let p: GeoGeometry<f64> = point!(x: 4.0, y: 3.0).into();
        let (on_line, _) = nearest_points(&line, &p).unwrap();
        assert_eq!(on_line, Coord { x: 4.0, y: 0.0 });
        assert_abs_diff_eq!(distance(&line, &p).unwrap(), 3.0);
    }

    #[test]
    fn interpolate_along_line() {
        let line: GeoGeometry<f64> =
            line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0)].into();
        assert_eq!(interpolate(&line, 5.0), Some(Coord { x: 5.0, y: 0.0 }));
        assert_eq!(interpolate(&line, 15.0), Some(Coord { x: 10.0, y: 5.0 }));
        assert_eq!(interpolate(&line, -5.0), Some(Coord { x: 10.0, y: 5.0 }));
        assert_eq!(interpolate(&line, 100.0), Some(Coord { x: 10.0, y: 10.0 }));
        assert_eq!(interpolate(&square(0.0, 0.0, 1.0), 1.0), None);
    }

    #[test]
    fn project_on_lines() {
        let lines: GeoGeometry<f64> = MultiLineString::new(vec![
            line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)],
            line_string![(x: 20.0, y: 0.0), (x: 30.0, y: 0.0)],
        ])
        .into();
        assert_abs_diff_eq!(project(&lines, Coord { x: 4.0, y: 2.0 }).unwrap(), 4.0);
        assert_abs_diff_eq!(project(&lines, Coord { x: 25.0, y: -1.0 }).unwrap(), 15.0);
        assert_eq!(project(&point!(x: 0.0, y: 0.0).into(), Coord { x: 1.0, y: 1.0 }), None);
    }

    #[test]
    fn polyline_helpers() {
        let line = [
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 4.0, y: 0.0 },
            Coord { x: 4.0, y: 3.0 },
        ];
        assert_abs_diff_eq!(line_length(&line), 7.0);
        assert_abs_diff_eq!(distance_to_line(Coord { x: 2.0, y: 1.0 }, &line), 1.0);
        assert_abs_diff_eq!(distance_to_line(Coord { x: 7.0, y: 7.0 }, &line), 5.0);
        assert!(distance_to_line(Coord { x: 0.0, y: 0.0 }, &[]).is_infinite());
    }
}
