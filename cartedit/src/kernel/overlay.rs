//! Boolean set operations on geometries of any dimension.
//!
//! Area-area operations are delegated to [`BooleanOps`]. Operations that involve lines are computed on the noded
//! arrangement of the inputs, points are classified against the other input directly.

use ahash::{AHashMap, AHashSet};
use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::BooleanOps;
use geo_types::{
    Coord, Geometry as GeoGeometry, LineString as GeoLineString, MultiLineString, MultiPolygon,
    Polygon as GeoPolygon,
};

use super::line_merge::merge_lines;
use super::noding::{node, vertex_degrees, NodedSegment, ORIGIN_A, ORIGIN_B};
use super::{coord_key, CoordKey, Components};
use crate::error::EngineError;

/// Boolean set operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum OverlayOp {
    Intersection,
    Difference,
    SymDifference,
    Union,
}

/// Computes the boolean operation of two geometries.
///
/// Collections that mix members of different dimensions are rejected, [`unary_union`] accepts them.
pub(crate) fn overlay(
    a: &GeoGeometry<f64>,
    b: &GeoGeometry<f64>,
    op: OverlayOp,
) -> Result<GeoGeometry<f64>, EngineError> {
    let ca = Components::of(a);
    let cb = Components::of(b);

    if ca.is_mixed() || cb.is_mixed() {
        return Err(EngineError::Kernel(format!(
            "{op:?} does not support heterogeneous geometry collections"
        )));
    }

    if op == OverlayOp::Union {
        let mut all = ca;
        all.add(b);
        return Ok(unary_union(all));
    }

    let (Some(da), Some(db)) = (ca.dimension(), cb.dimension()) else {
        return Ok(match op {
            OverlayOp::Intersection => Components::default().into_geometry(),
            OverlayOp::Difference => ca.into_geometry(),
            _ => {
                let mut all = ca;
                all.add(b);
                all.into_geometry()
            }
        });
    };

    if op == OverlayOp::SymDifference {
        let mut all = Components::of(&overlay(a, b, OverlayOp::Difference)?);
        all.add(&overlay(b, a, OverlayOp::Difference)?);
        return Ok(unary_union(all));
    }

    let result = if op == OverlayOp::Intersection {
        match (da, db) {
            (0, _) => classify_points(&ca.points, b, |pos| pos != CoordPos::Outside),
            (_, 0) => classify_points(&cb.points, a, |pos| pos != CoordPos::Outside),
            (1, 1) => line_line_intersection(&ca.lines, &cb.lines),
            (1, 2) => line_area(&ca.lines, &cb.polygons, true),
            (2, 1) => line_area(&cb.lines, &ca.polygons, true),
            _ => polygons(ca.multi_polygon().intersection(&cb.multi_polygon())),
        }
    } else {
        match (da, db) {
            (0, _) => classify_points(&ca.points, b, |pos| pos == CoordPos::Outside),
            (1, 1) => line_difference(&ca.lines, &cb.lines),
            (1, 2) => line_area(&ca.lines, &cb.polygons, false),
            (2, 2) => polygons(ca.multi_polygon().difference(&cb.multi_polygon())),
            _ => ca,
        }
    };

    Ok(result.into_geometry())
}

/// Union of all components of the collection.
///
/// Areas are merged, lines are noded and merged, lines inside areas and points covered by lines or areas are
/// removed.
pub(crate) fn unary_union(components: Components) -> GeoGeometry<f64> {
    let polygons = union_polygons(components.polygons);
    let area = GeoGeometry::MultiPolygon(MultiPolygon::new(polygons.clone()));

    let mut arrangement_lines: Vec<(&[Coord], u8)> =
        components.lines.iter().map(|l| (&l.0[..], ORIGIN_A)).collect();
    let rings: Vec<&GeoLineString<f64>> = polygons
        .iter()
        .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
        .collect();
    arrangement_lines.extend(rings.iter().map(|r| (&r.0[..], ORIGIN_B)));

    let arrangement = Arrangement::new(arrangement_lines, &components.lines);
    let lines = arrangement.chains(|s| {
        s.origin == ORIGIN_A && area.coordinate_position(&s.midpoint()) == CoordPos::Outside
    });

    let linework = GeoGeometry::MultiLineString(MultiLineString::new(lines.clone()));
    let mut seen = AHashSet::new();
    let points = components
        .points
        .into_iter()
        .filter(|p| seen.insert(coord_key(*p)))
        .filter(|p| {
            area.coordinate_position(p) == CoordPos::Outside
                && linework.coordinate_position(p) == CoordPos::Outside
        })
        .collect();

    Components {
        points,
        lines,
        polygons,
    }
    .into_geometry()
}

/// Union of the polygons, merged bottom up along an R-tree of their envelopes.
pub(crate) fn union_polygons(polygons: Vec<GeoPolygon<f64>>) -> Vec<GeoPolygon<f64>> {
    if polygons.is_empty() {
        return polygons;
    }

    geo::unary_union(&polygons)
        .0
        .into_iter()
        .filter(|p| !p.exterior().0.is_empty())
        .collect()
}

fn polygons(result: MultiPolygon<f64>) -> Components {
    Components {
        polygons: result
            .0
            .into_iter()
            .filter(|p| !p.exterior().0.is_empty())
            .collect(),
        ..Default::default()
    }
}

fn classify_points(
    points: &[Coord],
    other: &GeoGeometry<f64>,
    keep: impl Fn(CoordPos) -> bool,
) -> Components {
    let mut seen = AHashSet::new();
    Components {
        points: points
            .iter()
            .copied()
            .filter(|p| seen.insert(coord_key(*p)))
            .filter(|p| keep(other.coordinate_position(p)))
            .collect(),
        ..Default::default()
    }
}

fn line_line_intersection(a: &[GeoLineString<f64>], b: &[GeoLineString<f64>]) -> Components {
    let inputs = a
        .iter()
        .map(|l| (&l.0[..], ORIGIN_A))
        .chain(b.iter().map(|l| (&l.0[..], ORIGIN_B)));
    let all_lines: Vec<GeoLineString<f64>> = a.iter().chain(b).cloned().collect();
    let arrangement = Arrangement::new(inputs, &all_lines);

    let shared = |s: &NodedSegment| s.is_from(ORIGIN_A) && s.is_from(ORIGIN_B);
    Components {
        points: arrangement.touch_points(shared),
        lines: arrangement.chains(shared),
        ..Default::default()
    }
}

fn line_difference(a: &[GeoLineString<f64>], b: &[GeoLineString<f64>]) -> Components {
    let inputs = a
        .iter()
        .map(|l| (&l.0[..], ORIGIN_A))
        .chain(b.iter().map(|l| (&l.0[..], ORIGIN_B)));
    let all_lines: Vec<GeoLineString<f64>> = a.iter().chain(b).cloned().collect();
    let arrangement = Arrangement::new(inputs, &all_lines);

    Components {
        lines: arrangement.chains(|s| s.origin == ORIGIN_A),
        ..Default::default()
    }
}

/// Intersection (`inside == true`) or difference of lines and areas.
fn line_area(lines: &[GeoLineString<f64>], areas: &[GeoPolygon<f64>], inside: bool) -> Components {
    let area = GeoGeometry::MultiPolygon(MultiPolygon::new(areas.to_vec()));
    let inputs = lines.iter().map(|l| (&l.0[..], ORIGIN_A)).chain(
        areas
            .iter()
            .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
            .map(|r| (&r.0[..], ORIGIN_B)),
    );
    let arrangement = Arrangement::new(inputs, lines);

    let covered = |s: &NodedSegment| {
        s.is_from(ORIGIN_A)
            && (s.is_from(ORIGIN_B)
                || area.coordinate_position(&s.midpoint()) == CoordPos::Inside)
    };

    if inside {
        Components {
            points: arrangement.touch_points(covered),
            lines: arrangement.chains(covered),
            ..Default::default()
        }
    } else {
        Components {
            lines: arrangement.chains(|s| s.is_from(ORIGIN_A) && !covered(s)),
            ..Default::default()
        }
    }
}

/// Noded linework of the overlay inputs.
struct Arrangement {
    segments: Vec<NodedSegment>,
    degrees: AHashMap<CoordKey, usize>,
    endpoints: AHashSet<CoordKey>,
}

impl Arrangement {
    /// Nodes the inputs. Chains of the result are always broken at the endpoints of `lines`.
    fn new<'a>(
        inputs: impl IntoIterator<Item = (&'a [Coord], u8)>,
        lines: &[GeoLineString<f64>],
    ) -> Self {
        let segments = node(inputs);
        let degrees = vertex_degrees(&segments);
        let endpoints = lines
            .iter()
            .filter_map(|l| Some([*l.0.first()?, *l.0.last()?]))
            .flatten()
            .map(coord_key)
            .collect();

        Self {
            segments,
            degrees,
            endpoints,
        }
    }

    fn is_node(&self, c: Coord) -> bool {
        let key = coord_key(c);
        self.endpoints.contains(&key) || self.degrees.get(&key).map_or(true, |d| *d != 2)
    }

    /// Selected segments merged into maximal lines.
    fn chains(&self, select: impl Fn(&NodedSegment) -> bool) -> Vec<GeoLineString<f64>> {
        let selected: Vec<[Coord; 2]> = self
            .segments
            .iter()
            .filter(|s| select(s))
            .map(|s| [s.start, s.end])
            .collect();

        merge_lines(&selected, |c| self.is_node(c))
            .into_iter()
            .map(GeoLineString::new)
            .collect()
    }

    /// Vertices where the two inputs meet that are not part of the selected segments.
    fn touch_points(&self, select: impl Fn(&NodedSegment) -> bool) -> Vec<Coord> {
        let mut origins: AHashMap<CoordKey, (Coord, u8)> = AHashMap::new();
        let mut covered = AHashSet::new();
        for segment in &self.segments {
            for c in [segment.start, segment.end] {
                origins.entry(coord_key(c)).or_insert((c, 0)).1 |= segment.origin;
                if select(segment) {
                    covered.insert(coord_key(c));
                }
            }
        }

        let mut points: Vec<Coord> = origins
            .into_iter()
            .filter(|(key, (_, origin))| {
                *origin == ORIGIN_A | ORIGIN_B && !covered.contains(key)
            })
            .map(|(_, (c, _))| c)
            .collect();
        points.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    use geo::Area;
    use geo_types::{line_string, point, polygon, GeometryCollection, MultiPoint};

    fn square(x0: f64, y0: f64, size: f64) -> GeoGeometry<f64> {
        polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
        ]
        .into()
    }

    fn area(geometry: &GeoGeometry<f64>) -> f64 {
        geometry.unsigned_area()
    }

    #[test]
    fn polygon_operations() {
        let a = square(0.0, 0.0, 2.0);
        let b = square(1.0, 1.0, 2.0);

        let intersection = overlay(&a, &b, OverlayOp::Intersection).unwrap();
        assert_abs_diff_eq!(area(&intersection), 1.0, epsilon = 1e-9);
        let difference = overlay(&a, &b, OverlayOp::Difference).unwrap();
        assert_abs_diff_eq!(area(&difference), 3.0, epsilon = 1e-9);
        let union = overlay(&a, &b, OverlayOp::Union).unwrap();
        assert_abs_diff_eq!(area(&union), 7.0, epsilon = 1e-9);
        let sym = overlay(&a, &b, OverlayOp::SymDifference).unwrap();
        assert_abs_diff_eq!(area(&sym), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn line_difference_splits_at_crossings() {
        let line: GeoGeometry<f64> = line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)].into();
        let cut: GeoGeometry<f64> = line_string![(x: 5.0, y: -5.0), (x: 5.0, y: 5.0)].into();
        let result = overlay(&line, &cut, OverlayOp::Difference).unwrap();
        assert_matches!(result, GeoGeometry::MultiLineString(ml) if ml.0.len() == 2);
    }

    #[test]
    fn line_intersection_returns_points_and_shared_parts() {
        let a: GeoGeometry<f64> = line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)].into();
        let crossing: GeoGeometry<f64> = line_string![(x: 5.0, y: -5.0), (x: 5.0, y: 5.0)].into();
        assert_eq!(
            overlay(&a, &crossing, OverlayOp::Intersection).unwrap(),
            point!(x: 5.0, y: 0.0).into()
        );

        let overlapping: GeoGeometry<f64> =
            line_string![(x: 5.0, y: 0.0), (x: 15.0, y: 0.0)].into();
        assert_eq!(
            overlay(&a, &overlapping, OverlayOp::Intersection).unwrap(),
            line_string![(x: 5.0, y: 0.0), (x: 10.0, y: 0.0)].into()
        );
    }

    #[test]
    fn line_and_polygon() {
        let line: GeoGeometry<f64> = line_string![(x: -1.0, y: 1.0), (x: 3.0, y: 1.0)].into();
        let polygon = square(0.0, 0.0, 2.0);
        assert_eq!(
            overlay(&line, &polygon, OverlayOp::Intersection).unwrap(),
            line_string![(x: 0.0, y: 1.0), (x: 2.0, y: 1.0)].into()
        );
        assert_matches!(
            overlay(&line, &polygon, OverlayOp::Difference).unwrap(),
            GeoGeometry::MultiLineString(ml) if ml.0.len() == 2
        );
        assert_eq!(
            overlay(&polygon, &line, OverlayOp::Difference).unwrap(),
            polygon
        );
    }

    #[test]
    fn points() {
        let points: GeoGeometry<f64> =
            MultiPoint::from(vec![(1.0, 1.0), (5.0, 5.0), (1.0, 1.0)]).into();
        let polygon = square(0.0, 0.0, 2.0);
        assert_eq!(
            overlay(&points, &polygon, OverlayOp::Intersection).unwrap(),
            point!(x: 1.0, y: 1.0).into()
        );
        assert_eq!(
            overlay(&points, &polygon, OverlayOp::Difference).unwrap(),
            point!(x: 5.0, y: 5.0).into()
        );
    }

    #[test]
    fn empty_inputs() {
        let empty = GeoGeometry::GeometryCollection(GeometryCollection(vec![]));
        let polygon = square(0.0, 0.0, 2.0);
        assert!(Components::of(&overlay(&polygon, &empty, OverlayOp::Intersection).unwrap()).is_empty());
        assert_eq!(overlay(&polygon, &empty, OverlayOp::Difference).unwrap(), polygon);
        assert_eq!(overlay(&empty, &polygon, OverlayOp::SymDifference).unwrap(), polygon);
    }

    #[test]
    fn mixed_collections_are_rejected() {
        let mixed = GeoGeometry::GeometryCollection(GeometryCollection(vec![
            square(0.0, 0.0, 1.0),
            line_string![(x: 5.0, y: 5.0), (x: 6.0, y: 6.0)].into(),
        ]));
        assert_matches!(
            overlay(&mixed, &square(0.0, 0.0, 2.0), OverlayOp::Intersection),
            Err(EngineError::Kernel(_))
        );
        assert_matches!(
            overlay(&square(0.0, 0.0, 2.0), &mixed, OverlayOp::Union),
            Err(EngineError::Kernel(_))
        );

        let mut components = Components::of(&mixed);
        components.add(&square(0.0, 0.0, 2.0));
        let union = Components::of(&unary_union(components));
        assert_eq!(union.polygons.len(), 1);
        assert_eq!(union.lines.len(), 1);
    }

    #[test]
    fn polygon_union_merges_adjacent_squares() {
        let squares: Vec<GeoPolygon<f64>> = (0..6)
            .map(|i| match square(f64::from(i), 0.0, 1.0) {
                GeoGeometry::Polygon(p) => p,
                _ => unreachable!(),
            })
            .collect();
        let merged = union_polygons(squares);
        assert_eq!(merged.len(), 1);
        assert_abs_diff_eq!(merged[0].unsigned_area(), 6.0, epsilon = 1e-9);
        assert!(merged[0].interiors().is_empty());
        assert!(union_polygons(vec![]).is_empty());
    }

    #[test]
    fn unary_union_of_mixed_components() {
        let mut components = Components::of(&square(0.0, 0.0, 2.0));
        components.add(&square(1.0, 0.0, 2.0));
        components.add(&line_string![(x: 1.0, y: 1.0), (x: 5.0, y: 1.0)].into());
        components.add(&point!(x: 1.0, y: 1.5).into());
        components.add(&point!(x: 10.0, y: 10.0).into());

        let result = Components::of(&unary_union(components));
        assert_eq!(result.polygons.len(), 1);
        assert_abs_diff_eq!(result.multi_polygon().unsigned_area(), 6.0, epsilon = 1e-9);
        assert_eq!(
            result.lines,
            vec![line_string![(x: 3.0, y: 1.0), (x: 5.0, y: 1.0)]]
        );
        assert_eq!(result.points, vec![Coord { x: 10.0, y: 10.0 }]);
    }

    #[test]
    fn union_of_lines_keeps_input_endpoints() {
        let a: GeoGeometry<f64> = line_string![(x: 0.0, y: 0.0), (x: 5.0, y: 0.0)].into();
        let b: GeoGeometry<f64> = line_string![(x: 5.0, y: 0.0), (x: 10.0, y: 0.0)].into();
        assert_matches!(
            overlay(&a, &b, OverlayOp::Union).unwrap(),
            GeoGeometry::MultiLineString(ml) if ml.0.len() == 2
        );
    }
}
