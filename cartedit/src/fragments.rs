//! Regrouping of split fragments of multi-part geometries.

use geo_types::{
    Geometry as GeoGeometry, GeometryCollection, MultiLineString, MultiPoint, MultiPolygon,
};

use crate::error::EngineError;
use crate::kernel::relate::relate;
use crate::kernel::{geometries, guard};

/// Container kind the fragments of a multi-part target are wrapped into.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Wrapper {
    Multi,
    Collection,
}

fn wrapper_of(target: &GeoGeometry<f64>) -> Option<Wrapper> {
    match target {
        GeoGeometry::MultiPoint(_) | GeoGeometry::MultiLineString(_) | GeoGeometry::MultiPolygon(_) => {
            Some(Wrapper::Multi)
        }
        GeoGeometry::GeometryCollection(_) => Some(Wrapper::Collection),
        _ => None,
    }
}

/// Builds a multi geometry from members of the same kind. Members of different kinds, or members that are multi
/// geometries themselves, produce a collection.
fn wrap(members: Vec<GeoGeometry<f64>>, wrapper: Wrapper) -> GeoGeometry<f64> {
    if wrapper == Wrapper::Collection {
        return GeoGeometry::GeometryCollection(GeometryCollection(members));
    }

    if members.iter().all(|m| matches!(m, GeoGeometry::Polygon(_))) {
        GeoGeometry::MultiPolygon(MultiPolygon::new(
            members
                .into_iter()
                .filter_map(|m| match m {
                    GeoGeometry::Polygon(p) => Some(p),
                    _ => None,
                })
                .collect(),
        ))
    } else if members.iter().all(|m| matches!(m, GeoGeometry::LineString(_))) {
        GeoGeometry::MultiLineString(MultiLineString::new(
            members
                .into_iter()
                .filter_map(|m| match m {
                    GeoGeometry::LineString(l) => Some(l),
                    _ => None,
                })
                .collect(),
        ))
    } else if members.iter().all(|m| matches!(m, GeoGeometry::Point(_))) {
        GeoGeometry::MultiPoint(MultiPoint::new(
            members
                .into_iter()
                .filter_map(|m| match m {
                    GeoGeometry::Point(p) => Some(p),
                    _ => None,
                })
                .collect(),
        ))
    } else {
        GeoGeometry::GeometryCollection(GeometryCollection(members))
    }
}

/// Regroups the fragments of a split multi-part `target`.
///
/// Fragments that are topologically equal to a part of the target are parts the cut did not touch. They are
/// collected into one multi geometry placed after all other fragments. Every other fragment is a new piece and
/// becomes a multi geometry of its own, so that the pieces of the cut part are never merged with their untouched
/// siblings. Fragments of a single-part target are returned as they are.
pub(crate) fn regroup_fragments(
    target: &GeoGeometry<f64>,
    fragments: Vec<GeoGeometry<f64>>,
) -> Result<Vec<GeoGeometry<f64>>, EngineError> {
    let Some(wrapper) = wrapper_of(target) else {
        return Ok(fragments);
    };

    let parts = geometries(target);
    let mut untouched = vec![];
    let mut result = vec![];

    for fragment in fragments {
        let is_part = guard("fragment equality", || {
            parts
                .iter()
                .any(|part| relate(&fragment, part).is_equal_topo())
        })?;

        if is_part {
            untouched.push(fragment);
        } else {
            result.push(wrap(vec![fragment], wrapper));
        }
    }

    log::debug!(
        "Regrouped split fragments: {} new, {} untouched",
        result.len(),
        untouched.len()
    );
    if !untouched.is_empty() {
        result.push(wrap(untouched, wrapper));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{line_string, polygon, LineString, Polygon};

    fn square(x0: f64, size: f64) -> Polygon<f64> {
        polygon![
            (x: x0, y: 0.0),
            (x: x0 + size, y: 0.0),
            (x: x0 + size, y: size),
            (x: x0, y: size),
        ]
    }

    fn rect(x0: f64, x1: f64) -> Polygon<f64> {
        polygon![(x: x0, y: 0.0), (x: x1, y: 0.0), (x: x1, y: 4.0), (x: x0, y: 4.0)]
    }

    #[test]
    fn single_target_keeps_fragments() {
        let target: GeoGeometry<f64> = square(0.0, 4.0).into();
        let fragments = vec![rect(0.0, 2.0).into(), rect(2.0, 4.0).into()];
        let result = regroup_fragments(&target, fragments.clone()).unwrap();
        assert_eq!(result, fragments);
    }

    #[test]
    fn untouched_parts_are_pooled_last() {
        let target: GeoGeometry<f64> =
            MultiPolygon::new(vec![square(0.0, 4.0), square(10.0, 4.0), square(20.0, 4.0)]).into();
        let fragments = vec![
            rect(0.0, 2.0).into(),
            rect(2.0, 4.0).into(),
            square(10.0, 4.0).into(),
            square(20.0, 4.0).into(),
        ];

        let result = regroup_fragments(&target, fragments).unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result[0], MultiPolygon::new(vec![rect(0.0, 2.0)]).into());
        assert_eq!(result[1], MultiPolygon::new(vec![rect(2.0, 4.0)]).into());
        assert_eq!(
            result[2],
            MultiPolygon::new(vec![square(10.0, 4.0), square(20.0, 4.0)]).into()
        );
    }

    #[test]
    fn equality_is_topological() {
        let target: GeoGeometry<f64> = MultiLineString::new(vec![
            line_string![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0)],
            line_string![(x: 0.0, y: 5.0), (x: 4.0, y: 5.0)],
        ])
        .into();
        let reversed: LineString<f64> = line_string![(x: 4.0, y: 5.0), (x: 0.0, y: 5.0)];
        let fragments = vec![
            line_string![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0)].into(),
            line_string![(x: 2.0, y: 0.0), (x: 4.0, y: 0.0)].into(),
            reversed.clone().into(),
        ];

        let result = regroup_fragments(&target, fragments).unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result[2], MultiLineString::new(vec![reversed]).into());
    }

    #[test]
    fn collections_are_wrapped_in_collections() {
        let target = GeoGeometry::GeometryCollection(GeometryCollection(vec![
            square(0.0, 4.0).into(),
            square(10.0, 4.0).into(),
        ]));
        let fragments = vec![rect(0.0, 2.0).into(), rect(2.0, 4.0).into(), square(10.0, 4.0).into()];

        let result = regroup_fragments(&target, fragments).unwrap();
        assert_eq!(result.len(), 3);
        assert!(result
            .iter()
            .all(|g| matches!(g, GeoGeometry::GeometryCollection(_))));
    }
}
