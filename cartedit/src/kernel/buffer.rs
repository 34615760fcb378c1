//! Buffers and offset curves.
//!
//! Buffers are computed by [`geo::Buffer`] with the engine styles mapped onto [`BufferStyle`]. Offset curves shift
//! every segment sideways and connect the shifted segments with the requested join.

use std::f64::consts::{FRAC_PI_2, PI};

use geo::buffer::{BufferStyle, LineCap, LineJoin};
use geo::Buffer;
use geo_types::{
    Coord, Geometry as GeoGeometry, MultiLineString, MultiPoint, MultiPolygon, Point as GeoPoint,
    Polygon as GeoPolygon,
};

use super::overlay::union_polygons;
use super::Components;
use crate::options::{BufferParameters, EndCapStyle, JoinStyle};

const COLLINEAR_TOLERANCE: f64 = 1e-12;

fn left_normal(a: Coord, b: Coord) -> Coord {
    let d = b - a;
    let len = d.x.hypot(d.y);
    Coord {
        x: -d.y / len,
        y: d.x / len,
    }
}

fn unit(a: Coord, b: Coord) -> Coord {
    let d = b - a;
    let len = d.x.hypot(d.y);
    Coord {
        x: d.x / len,
        y: d.y / len,
    }
}

fn cross(a: Coord, b: Coord) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Intersection point of the infinite lines through `a0 a1` and `b0 b1`.
fn line_line_point(a0: Coord, a1: Coord, b0: Coord, b1: Coord) -> Option<Coord> {
    let da = a1 - a0;
    let db = b1 - b0;
    let denominator = cross(da, db);
    if denominator.abs() <= COLLINEAR_TOLERANCE * da.x.hypot(da.y) * db.x.hypot(db.y) {
        return None;
    }

    let t = cross(b0 - a0, db) / denominator;
    Some(a0 + da * t)
}

fn dedup(coords: &[Coord]) -> Vec<Coord> {
    let mut result: Vec<Coord> = Vec::with_capacity(coords.len());
    for c in coords {
        if result.last() != Some(c) {
            result.push(*c);
        }
    }
    result
}

/// Angle between the vertices of round caps and joins.
fn arc_step(quadrant_segments: u32) -> f64 {
    FRAC_PI_2 / quadrant_segments.max(1) as f64
}

fn style(distance: f64, params: &BufferParameters) -> BufferStyle<f64> {
    let step = arc_step(params.quadrant_segments);
    let join = match params.join {
        JoinStyle::Round => LineJoin::Round(step),
        JoinStyle::Mitre => LineJoin::Miter(params.mitre_limit),
        JoinStyle::Bevel => LineJoin::Bevel,
    };
    let cap = match params.end_cap {
        EndCapStyle::Round => LineCap::Round(step),
        EndCapStyle::Flat => LineCap::Butt,
        EndCapStyle::Square => LineCap::Square,
    };

    BufferStyle::new(distance).line_join(join).line_cap(cap)
}

/// Buffers the geometry by `distance`. Returns the buffer polygons, no polygons for an empty buffer.
///
/// Points and lines have no interior, so they only contribute to positive buffers. Overlapping areas are merged
/// before they are buffered.
pub(crate) fn buffer(
    geometry: &GeoGeometry<f64>,
    distance: f64,
    params: &BufferParameters,
) -> Vec<GeoPolygon<f64>> {
    let components = Components::of(geometry);
    let style = style(distance, params);
    let mut parts: Vec<MultiPolygon<f64>> = vec![];

    if distance > 0.0 {
        if !components.points.is_empty() {
            let points = MultiPoint::new(components.points.iter().map(|c| GeoPoint(*c)).collect());
            parts.push(points.buffer_with_style(style.clone()));
        }
        if !components.lines.is_empty() {
            let lines = MultiLineString::new(components.lines.clone());
            parts.push(lines.buffer_with_style(style.clone()));
        }
    }

    let areas = union_polygons(components.polygons);
    if !areas.is_empty() {
        let areas = MultiPolygon::new(areas);
        parts.push(if distance == 0.0 {
            areas
        } else {
            areas.buffer_with_style(style)
        });
    }

    union_polygons(parts.into_iter().flat_map(|mp| mp.0).collect())
}

/// Points of the round join from `from` to `to` around `center`, excluding both ends.
fn arc(center: Coord, from: Coord, to: Coord, quadrant_segments: u32) -> Vec<Coord> {
    let radius = (from - center).x.hypot((from - center).y);
    let start = (from.y - center.y).atan2(from.x - center.x);
    let end = (to.y - center.y).atan2(to.x - center.x);
    let mut sweep = end - start;
    if sweep > PI {
        sweep -= 2.0 * PI;
    } else if sweep <= -PI {
        sweep += 2.0 * PI;
    }

    let count = (sweep.abs() / arc_step(quadrant_segments)).ceil() as usize;
    (1..count)
        .map(|i| {
            let angle = start + sweep * i as f64 / count as f64;
            Coord {
                x: center.x + radius * angle.cos(),
                y: center.y + radius * angle.sin(),
            }
        })
        .collect()
}

/// Line parallel to `line` at `distance`, on the left side for positive distances and on the right side otherwise.
pub(crate) fn offset_curve(line: &[Coord], distance: f64, params: &BufferParameters) -> Vec<Coord> {
    let coords = dedup(line);
    if coords.len() < 2 || distance == 0.0 {
        return coords;
    }

    let offsets: Vec<(Coord, Coord)> = coords
        .windows(2)
        .map(|w| {
            let n = left_normal(w[0], w[1]) * distance;
            (w[0] + n, w[1] + n)
        })
        .collect();

    let mut result = vec![offsets[0].0];
    for (i, w) in coords.windows(3).enumerate() {
        let (prev, next) = (offsets[i], offsets[i + 1]);
        let turn = cross(unit(w[0], w[1]), unit(w[1], w[2]));
        if turn.abs() <= COLLINEAR_TOLERANCE {
            result.push(prev.1);
            continue;
        }

        let outer = turn * distance < 0.0;
        let corner = line_line_point(prev.0, prev.1, next.0, next.1);
        if !outer {
            result.push(corner.unwrap_or(prev.1));
            continue;
        }

        match params.join {
            JoinStyle::Round => {
                result.push(prev.1);
                result.extend(arc(w[1], prev.1, next.0, params.quadrant_segments));
                result.push(next.0);
            }
            JoinStyle::Mitre
                if corner.is_some_and(|c| {
                    (c - w[1]).x.hypot((c - w[1]).y) <= params.mitre_limit * distance.abs()
                }) =>
            {
                result.extend(corner);
            }
            JoinStyle::Mitre | JoinStyle::Bevel => {
                result.push(prev.1);
                result.push(next.0);
            }
        }
    }

    if let Some(last) = offsets.last() {
        result.push(last.1);
    }

    dedup(&result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use geo::Area;
    use geo_types::{line_string, point, polygon};

    fn params(end_cap: EndCapStyle, join: JoinStyle) -> BufferParameters {
        BufferParameters {
            quadrant_segments: 8,
            end_cap,
            join,
            mitre_limit: 5.0,
        }
    }

    fn area(polygons: Vec<GeoPolygon<f64>>) -> f64 {
        MultiPolygon::new(polygons).unsigned_area()
    }

    #[test]
    fn point_buffer_is_circle() {
        let point: GeoGeometry<f64> = point!(x: 1.0, y: 1.0).into();
        let result = buffer(&point, 1.0, &params(EndCapStyle::Round, JoinStyle::Round));
        assert_eq!(result.len(), 1);
        assert_abs_diff_eq!(area(result), PI, epsilon = 0.1);
        assert!(buffer(&point, -1.0, &params(EndCapStyle::Round, JoinStyle::Round)).is_empty());
    }

    #[test]
    fn overlapping_parts_are_merged() {
        let points: GeoGeometry<f64> = MultiPoint::from(vec![(0.0, 0.0), (1.0, 0.0), (10.0, 0.0)]).into();
        let result = buffer(&points, 1.0, &params(EndCapStyle::Round, JoinStyle::Round));
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|p| p.interiors().is_empty()));
    }

    #[test]
    fn line_caps() {
        let line: GeoGeometry<f64> = line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)].into();
        let flat = buffer(&line, 1.0, &params(EndCapStyle::Flat, JoinStyle::Round));
        assert_abs_diff_eq!(area(flat), 20.0, epsilon = 1e-6);
        let square = buffer(&line, 1.0, &params(EndCapStyle::Square, JoinStyle::Round));
        assert_abs_diff_eq!(area(square), 24.0, epsilon = 1e-6);
        let round = buffer(&line, 1.0, &params(EndCapStyle::Round, JoinStyle::Round));
        assert_abs_diff_eq!(area(round), 20.0 + PI, epsilon = 0.1);
        assert!(buffer(&line, -1.0, &params(EndCapStyle::Round, JoinStyle::Round)).is_empty());
    }

    #[test]
    fn polygon_grow_and_shrink() {
        let square: GeoGeometry<f64> =
            polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)].into();

        let bevel = params(EndCapStyle::Round, JoinStyle::Bevel);
        assert_abs_diff_eq!(area(buffer(&square, 1.0, &bevel)), 142.0, epsilon = 1e-6);
        let round = params(EndCapStyle::Round, JoinStyle::Round);
        assert_abs_diff_eq!(area(buffer(&square, 1.0, &round)), 140.0 + PI, epsilon = 0.1);
        let mitre = area(buffer(&square, 1.0, &params(EndCapStyle::Round, JoinStyle::Mitre)));
        assert!((142.0 - 1e-6..=144.0 + 1e-6).contains(&mitre));

        assert_abs_diff_eq!(area(buffer(&square, -1.0, &bevel)), 64.0, epsilon = 1e-6);
        assert_abs_diff_eq!(area(buffer(&square, 0.0, &bevel)), 100.0, epsilon = 1e-9);
        assert!(buffer(&square, -6.0, &bevel).is_empty());
    }

    #[test]
    fn offset_sides_and_joins() {
        let line = [
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 10.0, y: 0.0 },
            Coord { x: 10.0, y: 10.0 },
        ];
        let mitre = params(EndCapStyle::Round, JoinStyle::Mitre);
        assert_eq!(
            offset_curve(&line, 1.0, &mitre),
            vec![
                Coord { x: 0.0, y: 1.0 },
                Coord { x: 9.0, y: 1.0 },
                Coord { x: 9.0, y: 10.0 }
            ]
        );
        assert_eq!(
            offset_curve(&line, -1.0, &mitre),
            vec![
                Coord { x: 0.0, y: -1.0 },
                Coord { x: 11.0, y: -1.0 },
                Coord { x: 11.0, y: 10.0 }
            ]
        );

        let bevel = offset_curve(&line, -1.0, &params(EndCapStyle::Round, JoinStyle::Bevel));
        assert_eq!(bevel.len(), 4);
        let round = offset_curve(&line, -1.0, &params(EndCapStyle::Round, JoinStyle::Round));
        assert!(round.len() > 4);
    }
}
