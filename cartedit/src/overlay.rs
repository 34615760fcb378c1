//! Boolean operations of the engine geometry with other geometries.

use cartedit_types::Geometry;
use geo_types::Geometry as GeoGeometry;

use crate::error::EngineError;
use crate::kernel::line_merge::line_merge;
use crate::kernel::overlay::{overlay, unary_union, OverlayOp};
use crate::kernel::{guard, Components, KernelGeometry};
use crate::GeometryEngine;

impl GeometryEngine {
    fn overlay_with(&self, other: &Geometry, op: OverlayOp) -> Result<Geometry, EngineError> {
        let handle = self.handle()?;
        let other = self.kernel_of(other)?;
        let mut result = guard("overlay", || overlay(handle.geometry(), other.geometry(), op))??;

        if op == OverlayOp::Union {
            if let GeoGeometry::MultiLineString(_) = result {
                result = guard("line merge", || line_merge(&result))?;
            }
        }

        self.result(result, &[&*handle, &other])
    }

    /// Points shared by the engine geometry and `other`.
    pub fn intersection(&self, other: &Geometry) -> Result<Geometry, EngineError> {
        self.overlay_with(other, OverlayOp::Intersection)
    }

    /// Points of the engine geometry that are not in `other`.
    pub fn difference(&self, other: &Geometry) -> Result<Geometry, EngineError> {
        self.overlay_with(other, OverlayOp::Difference)
    }

    /// Points of either the engine geometry or `other`.
    ///
    /// If the result is a multi line string, touching lines of it are merged into longer line strings.
    pub fn union(&self, other: &Geometry) -> Result<Geometry, EngineError> {
        self.overlay_with(other, OverlayOp::Union)
    }

    /// Points that belong to exactly one of the engine geometry and `other`.
    pub fn sym_difference(&self, other: &Geometry) -> Result<Geometry, EngineError> {
        self.overlay_with(other, OverlayOp::SymDifference)
    }

    /// Union of all the `geometries` computed at once. The engine geometry does not take part in the union, only
    /// the engine precision is used.
    ///
    /// An empty list produces an empty geometry collection.
    pub fn union_many(&self, geometries: &[Geometry]) -> Result<Geometry, EngineError> {
        let handles = geometries
            .iter()
            .map(|g| self.kernel_of(g))
            .collect::<Result<Vec<_>, _>>()?;

        let mut components = Components::default();
        for handle in &handles {
            components.add(handle.geometry());
        }

        log::debug!("Union of {} geometries", handles.len());
        let result = guard("unary union", || unary_union(components))?;
        let sources: Vec<&KernelGeometry> = handles.iter().collect();
        self.result(result, &sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    use cartedit_types::{GeometryCollection, LineString, MultiLineString, Point};

    #[test]
    fn polygon_operations() {
        let engine = engine(square(0.0, 0.0, 4.0));
        let other: Geometry = square(2.0, 2.0, 4.0).into();

        assert_abs_diff_eq!(area_of(&engine.intersection(&other).unwrap()), 4.0);
        assert_abs_diff_eq!(area_of(&engine.difference(&other).unwrap()), 12.0);
        assert_abs_diff_eq!(area_of(&engine.union(&other).unwrap()), 28.0);
        assert_abs_diff_eq!(area_of(&engine.sym_difference(&other).unwrap()), 24.0);
    }

    #[test]
    fn boolean_algebra() {
        let a: Geometry = square(0.0, 0.0, 4.0).into();
        let b: Geometry = polygon_with_hole().into();
        let ea = GeometryEngine::new(a.clone());
        let eb = GeometryEngine::new(b.clone());

        let ab = ea.intersection(&b).unwrap();
        let ba = eb.intersection(&a).unwrap();
        assert!(GeometryEngine::new(ab.clone()).is_equal(&ba).unwrap());

        let a_minus_b = ea.difference(&b).unwrap();
        let b_minus_a = eb.difference(&a).unwrap();
        let union = ea.union(&b).unwrap();
        let pieces = ea
            .union_many(&[a_minus_b.clone(), ab.clone(), b_minus_a.clone()])
            .unwrap();
        assert_abs_diff_eq!(area_of(&pieces), area_of(&union), epsilon = 1e-9);
        assert_abs_diff_eq!(
            area_of(&a_minus_b) + area_of(&ab) + area_of(&b_minus_a),
            area_of(&union),
            epsilon = 1e-9
        );
    }

    #[test]
    fn union_merges_lines() {
        let engine = engine(line(&[(0.0, 0.0), (5.0, 0.0)]));
        let result = engine.union(&line(&[(5.0, 0.0), (5.0, 5.0)]).into()).unwrap();
        assert_eq!(
            result,
            Geometry::from(line(&[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)]))
        );
    }

    #[test]
    fn union_of_crossing_lines_keeps_pieces() {
        let engine = engine(line(&[(0.0, 0.0), (4.0, 0.0)]));
        let result = engine.union(&line(&[(2.0, -2.0), (2.0, 2.0)]).into()).unwrap();
        assert_matches!(result, Geometry::MultiLineString(ml) if ml.len() == 4);
    }

    #[test]
    fn line_intersection_is_point() {
        let engine = engine(line(&[(0.0, 0.0), (4.0, 4.0)]));
        let result = engine.intersection(&line(&[(0.0, 4.0), (4.0, 0.0)]).into()).unwrap();
        assert_eq!(result, Geometry::from(Point::new(2.0, 2.0)));
    }

    #[test]
    fn results_keep_ordinates() {
        let engine = engine(LineString::new(vec![
            Point::new_z(0.0, 0.0, 0.0),
            Point::new_z(10.0, 0.0, 10.0),
        ]));
        let result = engine.difference(&square(8.0, -1.0, 4.0).into()).unwrap();
        assert_eq!(
            result,
            Geometry::from(LineString::new(vec![
                Point::new_z(0.0, 0.0, 0.0),
                Point::new_z(8.0, 0.0, 8.0),
            ]))
        );
    }

    #[test]
    fn mixed_collections_are_rejected() {
        let engine = engine(square(0.0, 0.0, 4.0));
        let mixed: Geometry = GeometryCollection::from(vec![
            Geometry::from(square(1.0, 1.0, 1.0)),
            Geometry::from(line(&[(0.0, 0.0), (5.0, 5.0)])),
        ])
        .into();
        assert_matches!(engine.intersection(&mixed), Err(EngineError::Kernel(_)));
        assert_matches!(engine.union(&mixed), Err(EngineError::Kernel(_)));

        let merged = engine.union_many(&[square(0.0, 0.0, 4.0).into(), mixed]).unwrap();
        assert_matches!(merged, Geometry::GeometryCollection(gc) if gc.len() == 2);
    }

    #[test]
    fn union_many() {
        let engine = engine(Point::new(100.0, 100.0));
        let squares: Vec<Geometry> = three_squares().iter().cloned().map(Geometry::from).collect();
        let result = engine.union_many(&squares).unwrap();
        assert_abs_diff_eq!(area_of(&result), 48.0);
        assert!(!engine.intersects(&result).unwrap());

        let touching = [
            Geometry::from(square(0.0, 0.0, 2.0)),
            Geometry::from(square(2.0, 0.0, 2.0)),
        ];
        let result = engine.union_many(&touching).unwrap();
        assert_matches!(result, Geometry::Polygon(_));
        assert_abs_diff_eq!(area_of(&result), 8.0);

        let lines = MultiLineString::from(vec![
            line(&[(0.0, 0.0), (1.0, 0.0)]),
            line(&[(1.0, 0.0), (2.0, 0.0)]),
        ]);
        let result = engine.union_many(&[lines.into()]).unwrap();
        assert_matches!(result, Geometry::MultiLineString(_) | Geometry::LineString(_));

        assert_eq!(engine.union_many(&[]).unwrap(), Geometry::empty());
    }
}
