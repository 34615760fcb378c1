//! Geometries derived from the engine geometry: buffers, offset curves, simplification, linear referencing and
//! characteristic points.

use std::rc::Rc;

use cartedit_types::{Geometry, Point};
use geo::{BoundingRect, Centroid, ConvexHull, InteriorPoint};
use geo_types::{
    Coord, Geometry as GeoGeometry, LineString as GeoLineString, MultiLineString, Point as GeoPoint,
};

use crate::error::EngineError;
use crate::kernel::buffer::{buffer, offset_curve};
use crate::kernel::line_merge::line_merge;
use crate::kernel::simplify::simplify_preserve_topology;
use crate::kernel::{guard, measure, visit_coords, Components, KernelGeometry};
use crate::options::{BufferParameters, EndCapStyle, JoinStyle};
use crate::GeometryEngine;

impl GeometryEngine {
    fn quadrant_segments(&self, segments: u32) -> u32 {
        if segments == 0 {
            self.options().quadrant_segments
        } else {
            segments
        }
    }

    /// Area within `distance` of the engine geometry, with round caps and joins. Negative distances shrink
    /// areas. `segments` is the number of segments approximating a quarter of a circle, `0` uses the engine
    /// default.
    pub fn buffer(&self, distance: f64, segments: u32) -> Result<Geometry, EngineError> {
        self.buffer_with_params(
            distance,
            BufferParameters {
                quadrant_segments: self.quadrant_segments(segments),
                ..Default::default()
            },
        )
    }

    /// Same as [`GeometryEngine::buffer`], with explicit cap and join styles.
    pub fn buffer_with_style(
        &self,
        distance: f64,
        segments: u32,
        end_cap: EndCapStyle,
        join: JoinStyle,
        mitre_limit: f64,
    ) -> Result<Geometry, EngineError> {
        self.buffer_with_params(
            distance,
            BufferParameters {
                quadrant_segments: self.quadrant_segments(segments),
                end_cap,
                join,
                mitre_limit,
            },
        )
    }

    fn buffer_with_params(&self, distance: f64, params: BufferParameters) -> Result<Geometry, EngineError> {
        if !distance.is_finite() {
            return Err(EngineError::InvalidInput(format!("buffer distance {distance}")));
        }

        let handle = self.handle()?;
        let polygons = guard("buffer", || buffer(handle.geometry(), distance, &params))?;
        log::debug!("Buffer by {distance} produced {} polygons", polygons.len());
        let result = Components {
            polygons,
            ..Default::default()
        }
        .into_geometry();

        self.result(result, &[&*handle])
    }

    /// Line parallel to the engine line at `distance`, on the left side for positive distances. Every member of
    /// a multi line is offset on its own.
    ///
    /// Fails with [`EngineError::InvalidInput`] if the engine geometry is not linear.
    pub fn offset_curve(
        &self,
        distance: f64,
        segments: u32,
        join: JoinStyle,
        mitre_limit: f64,
    ) -> Result<Geometry, EngineError> {
        let handle = self.handle()?;
        let params = BufferParameters {
            quadrant_segments: self.quadrant_segments(segments),
            end_cap: EndCapStyle::Flat,
            join,
            mitre_limit,
        };

        let offset = |line: &GeoLineString<f64>| -> Result<GeoLineString<f64>, EngineError> {
            let coords = guard("offset curve", || offset_curve(&line.0, distance, &params))?;
            if coords.len() < 2 {
                return Err(EngineError::InvalidResult(
                    "offset curve collapsed to a point".into(),
                ));
            }

            Ok(GeoLineString::new(coords))
        };

        let result = match handle.geometry() {
            GeoGeometry::LineString(line) => GeoGeometry::LineString(offset(line)?),
            GeoGeometry::MultiLineString(lines) => GeoGeometry::MultiLineString(MultiLineString::new(
                lines.0.iter().map(offset).collect::<Result<_, _>>()?,
            )),
            _ => {
                return Err(EngineError::InvalidInput(format!(
                    "offset curve of {}",
                    self.geometry().kind()
                )))
            }
        };

        self.result(result, &[&*handle])
    }

    /// Simplified version of the engine geometry. Vertices closer than `tolerance` to the simplified lines are
    /// removed, as long as polygons stay valid.
    pub fn simplify(&self, tolerance: f64) -> Result<Geometry, EngineError> {
        if tolerance.is_nan() || tolerance < 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "simplification tolerance {tolerance}"
            )));
        }

        let handle = self.handle()?;
        let result = guard("simplify", || {
            simplify_preserve_topology(handle.geometry(), tolerance)
        })?;
        self.result(result, &[&*handle])
    }

    /// Point at `distance` along the engine line. Negative distances are measured from the end.
    pub fn interpolate(&self, distance: f64) -> Result<Geometry, EngineError> {
        let handle = self.handle()?;
        let point = guard("interpolate", || measure::interpolate(handle.geometry(), distance))?
            .ok_or_else(|| EngineError::InvalidInput("interpolation along a geometry without lines".into()))?;

        self.result(GeoGeometry::Point(GeoPoint(point)), &[&*handle])
    }

    /// Distance along the engine line to the point of the line closest to `point`.
    pub fn line_locate_point(&self, point: &Point) -> Result<f64, EngineError> {
        let handle = self.handle()?;
        let located = self.kernel_of(&(*point).into())?;
        let GeoGeometry::Point(p) = located.geometry() else {
            return Err(EngineError::Conversion("located geometry is not a point".into()));
        };

        guard("line locate point", || measure::project(handle.geometry(), p.0))?
            .ok_or_else(|| EngineError::InvalidInput("location on a geometry without lines".into()))
    }

    /// Pair of closest points, the first on the engine geometry.
    fn nearest(
        &self,
        other: &Geometry,
    ) -> Result<(Rc<KernelGeometry>, KernelGeometry, Coord, Coord), EngineError> {
        let handle = self.handle()?;
        let other = self.kernel_of(other)?;
        let (a, b) = guard("nearest points", || {
            measure::nearest_points(handle.geometry(), other.geometry())
        })?
        .ok_or_else(|| EngineError::InvalidInput("nearest point of an empty geometry".into()))?;

        Ok((handle, other, a, b))
    }

    /// Point of the engine geometry closest to `other`.
    pub fn closest_point(&self, other: &Geometry) -> Result<Geometry, EngineError> {
        let (handle, _, a, _) = self.nearest(other)?;
        self.result(GeoGeometry::Point(GeoPoint(a)), &[&*handle])
    }

    /// Shortest line from the engine geometry to `other`.
    pub fn shortest_line(&self, other: &Geometry) -> Result<Geometry, EngineError> {
        let (handle, other, a, b) = self.nearest(other)?;
        self.result(
            GeoGeometry::LineString(GeoLineString::new(vec![a, b])),
            &[&*handle, &other],
        )
    }

    /// Merges the touching members of the engine multi line into as few lines as possible. A single line is
    /// returned as is.
    pub fn merge_lines(&self) -> Result<Geometry, EngineError> {
        let handle = self.handle()?;
        match handle.geometry() {
            GeoGeometry::LineString(line) => {
                self.result(GeoGeometry::LineString(line.clone()), &[&*handle])
            }
            GeoGeometry::MultiLineString(_) => {
                let merged = guard("line merge", || line_merge(handle.geometry()))?;
                self.result(merged, &[&*handle])
            }
            _ => Err(EngineError::InvalidInput(format!(
                "merging lines of {}",
                self.geometry().kind()
            ))),
        }
    }

    /// Center of mass of the engine geometry.
    pub fn centroid(&self) -> Result<Geometry, EngineError> {
        let handle = self.handle()?;
        let centroid = guard("centroid", || handle.geometry().centroid())?
            .ok_or_else(|| EngineError::InvalidInput("centroid of an empty geometry".into()))?;
        self.result(GeoGeometry::Point(centroid), &[&*handle])
    }

    /// A point guaranteed to lie on the engine geometry.
    pub fn point_on_surface(&self) -> Result<Geometry, EngineError> {
        let handle = self.handle()?;
        let point = guard("point on surface", || handle.geometry().interior_point())?
            .ok_or_else(|| EngineError::InvalidInput("point on an empty geometry".into()))?;
        self.result(GeoGeometry::Point(point), &[&*handle])
    }

    /// Bounding box of the engine geometry. Degenerate boxes are returned as a point or a line.
    pub fn envelope(&self) -> Result<Geometry, EngineError> {
        let handle = self.handle()?;
        let rect = guard("envelope", || handle.geometry().bounding_rect())?
            .ok_or_else(|| EngineError::InvalidInput("envelope of an empty geometry".into()))?;

        let result = if rect.min() == rect.max() {
            GeoGeometry::Point(GeoPoint(rect.min()))
        } else if rect.width() == 0.0 || rect.height() == 0.0 {
            GeoGeometry::LineString(GeoLineString::new(vec![rect.min(), rect.max()]))
        } else {
            GeoGeometry::Polygon(rect.to_polygon())
        };

        self.result(result, &[])
    }

    /// Smallest convex polygon containing the engine geometry. Collinear geometries produce a line, a single
    /// distinct vertex produces a point.
    pub fn convex_hull(&self) -> Result<Geometry, EngineError> {
        let handle = self.handle()?;
        let mut extremes: Option<(Coord, Coord)> = None;
        visit_coords(handle.geometry(), &mut |c| {
            extremes = Some(match extremes {
                None => (c, c),
                Some((min, max)) => (lexicographic_min(min, c), lexicographic_max(max, c)),
            });
        });
        let Some((min, max)) = extremes else {
            return Err(EngineError::MissingGeometry);
        };

        let hull = if min == max {
            GeoGeometry::Point(GeoPoint(min))
        } else {
            let hull = guard("convex hull", || handle.geometry().convex_hull())?;
            if measure::area(&GeoGeometry::Polygon(hull.clone())) > 0.0 {
                GeoGeometry::Polygon(hull)
            } else {
                GeoGeometry::LineString(GeoLineString::new(vec![min, max]))
            }
        };

        self.result(hull, &[&*handle])
    }
}

fn lexicographic_min(a: Coord, b: Coord) -> Coord {
    if (b.x, b.y) < (a.x, a.y) {
        b
    } else {
        a
    }
}

fn lexicographic_max(a: Coord, b: Coord) -> Coord {
    if (b.x, b.y) > (a.x, a.y) {
        b
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;
    use crate::GeometryEngineBuilder;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    use cartedit_types::{LineString, MultiLineString as ModelMultiLineString, MultiPoint, Polygon};

    #[test]
    fn buffers() {
        let engine = engine(square(0.0, 0.0, 4.0));
        let grown = engine.buffer(1.0, 8).unwrap();
        let area = area_of(&grown);
        assert!(area > 32.0 && area < 32.0 + std::f64::consts::PI);
        assert!(GeometryEngine::new(grown).contains(&square(0.0, 0.0, 4.0).into()).unwrap());

        let shrunk = engine.buffer(-1.0, 0).unwrap();
        assert_abs_diff_eq!(area_of(&shrunk), 4.0, epsilon = 1e-6);

        assert!(engine.buffer(-3.0, 8).unwrap().is_empty());
        assert_matches!(engine.buffer(f64::NAN, 8), Err(EngineError::InvalidInput(_)));
    }

    #[test]
    fn buffer_styles() {
        let engine = engine(line(&[(0.0, 0.0), (10.0, 0.0)]));
        let flat = engine
            .buffer_with_style(1.0, 8, EndCapStyle::Flat, JoinStyle::Mitre, 5.0)
            .unwrap();
        assert_abs_diff_eq!(area_of(&flat), 20.0, epsilon = 1e-6);

        let square_caps = engine
            .buffer_with_style(1.0, 8, EndCapStyle::Square, JoinStyle::Mitre, 5.0)
            .unwrap();
        assert_abs_diff_eq!(area_of(&square_caps), 24.0, epsilon = 1e-6);

        let round = engine.buffer(1.0, 8).unwrap();
        assert!(area_of(&round) > 20.0 && area_of(&round) < 24.0);
    }

    #[test]
    fn offset_curves() {
        let engine = engine(line(&[(0.0, 0.0), (10.0, 0.0)]));
        assert_eq!(
            engine.offset_curve(1.0, 8, JoinStyle::Round, 5.0).unwrap(),
            Geometry::from(line(&[(0.0, 1.0), (10.0, 1.0)]))
        );
        assert_eq!(
            engine.offset_curve(-1.0, 8, JoinStyle::Round, 5.0).unwrap(),
            Geometry::from(line(&[(0.0, -1.0), (10.0, -1.0)]))
        );

        let lines = crate::tests::engine(ModelMultiLineString::from(vec![
            line(&[(0.0, 0.0), (10.0, 0.0)]),
            line(&[(0.0, 5.0), (10.0, 5.0)]),
        ]));
        assert_matches!(
            lines.offset_curve(1.0, 8, JoinStyle::Bevel, 5.0),
            Ok(Geometry::MultiLineString(ml)) if ml.len() == 2
        );

        let polygon = crate::tests::engine(square(0.0, 0.0, 4.0));
        assert_matches!(
            polygon.offset_curve(1.0, 8, JoinStyle::Round, 5.0),
            Err(EngineError::InvalidInput(_))
        );
    }

    #[test]
    fn simplification() {
        let engine = engine(line(&[(0.0, 0.0), (5.0, 0.1), (10.0, 0.0)]));
        assert_eq!(
            engine.simplify(1.0).unwrap(),
            Geometry::from(line(&[(0.0, 0.0), (10.0, 0.0)]))
        );
        assert_eq!(engine.simplify(0.0).unwrap(), *engine.geometry());
        assert_matches!(engine.simplify(-1.0), Err(EngineError::InvalidInput(_)));
    }

    #[test]
    fn linear_referencing() {
        let engine = engine(line(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]));
        assert_eq!(engine.interpolate(15.0).unwrap(), Geometry::from(Point::new(10.0, 5.0)));
        assert_eq!(engine.interpolate(-5.0).unwrap(), Geometry::from(Point::new(10.0, 5.0)));
        assert_eq!(engine.interpolate(100.0).unwrap(), Geometry::from(Point::new(10.0, 10.0)));
        assert_abs_diff_eq!(engine.line_locate_point(&Point::new(12.0, 4.0)).unwrap(), 14.0);
        assert_abs_diff_eq!(engine.line_locate_point(&Point::new(3.0, -2.0)).unwrap(), 3.0);

        let point = crate::tests::engine(Point::new(1.0, 1.0));
        assert_matches!(point.interpolate(1.0), Err(EngineError::InvalidInput(_)));
    }

    #[test]
    fn interpolated_point_keeps_elevation() {
        let engine = engine(LineString::new(vec![
            Point::new_z(0.0, 0.0, 0.0),
            Point::new_z(10.0, 0.0, 100.0),
        ]));
        assert_eq!(
            engine.interpolate(2.5).unwrap(),
            Geometry::from(Point::new_z(2.5, 0.0, 25.0))
        );
    }

    #[test]
    fn nearest_points() {
        let engine = engine(square(0.0, 0.0, 4.0));
        let far = Geometry::from(Point::new(7.0, 2.0));
        assert_eq!(engine.closest_point(&far).unwrap(), Geometry::from(Point::new(4.0, 2.0)));
        assert_eq!(
            engine.shortest_line(&far).unwrap(),
            Geometry::from(line(&[(4.0, 2.0), (7.0, 2.0)]))
        );
        assert_matches!(
            engine.closest_point(&Geometry::empty()),
            Err(EngineError::InvalidInput(_) | EngineError::Conversion(_))
        );
    }

    #[test]
    fn merging_lines() {
        let engine = engine(ModelMultiLineString::from(vec![
            line(&[(0.0, 0.0), (5.0, 0.0)]),
            line(&[(5.0, 0.0), (5.0, 5.0)]),
        ]));
        assert_eq!(
            engine.merge_lines().unwrap(),
            Geometry::from(line(&[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)]))
        );

        let single = crate::tests::engine(line(&[(0.0, 0.0), (1.0, 0.0)]));
        assert_eq!(single.merge_lines().unwrap(), *single.geometry());

        let snapped = GeometryEngineBuilder::default()
            .with_geometry(line(&[(0.26, 0.74), (1.1, 1.9)]).into())
            .with_precision(0.5)
            .build();
        assert_eq!(
            snapped.merge_lines().unwrap(),
            Geometry::from(line(&[(0.5, 0.5), (1.0, 2.0)]))
        );

        let polygon = crate::tests::engine(square(0.0, 0.0, 1.0));
        assert_matches!(polygon.merge_lines(), Err(EngineError::InvalidInput(_)));
    }

    #[test]
    fn characteristic_points() {
        let engine = engine(square(0.0, 0.0, 4.0));
        assert_eq!(engine.centroid().unwrap(), Geometry::from(Point::new(2.0, 2.0)));

        let surface_point = engine.point_on_surface().unwrap();
        assert!(engine.intersects(&surface_point).unwrap());

        let l_shape = crate::tests::engine(line(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0)]));
        let point = l_shape.point_on_surface().unwrap();
        assert!(l_shape.intersects(&point).unwrap());
    }

    #[test]
    fn envelopes() {
        let engine = engine(line(&[(0.0, 0.0), (4.0, 1.0), (2.0, 3.0)]));
        let envelope = engine.envelope().unwrap();
        let rect = Polygon::new(
            line(&[(0.0, 0.0), (4.0, 0.0), (4.0, 3.0), (0.0, 3.0), (0.0, 0.0)]),
            vec![],
        );
        assert_matches!(envelope, Geometry::Polygon(_));
        assert_abs_diff_eq!(area_of(&envelope), 12.0);
        assert!(GeometryEngine::new(envelope)
            .is_equal(&rect.into())
            .unwrap());

        let horizontal = crate::tests::engine(line(&[(0.0, 1.0), (4.0, 1.0)]));
        assert_eq!(
            horizontal.envelope().unwrap(),
            Geometry::from(line(&[(0.0, 1.0), (4.0, 1.0)]))
        );

        let point = crate::tests::engine(Point::new(3.0, 3.0));
        assert_eq!(point.envelope().unwrap(), Geometry::from(Point::new(3.0, 3.0)));
    }

    #[test]
    fn convex_hulls() {
        let engine = engine(line(&[(0.0, 0.0), (4.0, 0.0), (2.0, 1.0), (4.0, 4.0), (0.0, 4.0)]));
        let hull = engine.convex_hull().unwrap();
        assert_matches!(hull, Geometry::Polygon(_));
        assert_abs_diff_eq!(area_of(&hull), 16.0);

        let collinear = crate::tests::engine(MultiPoint::from(vec![
            Point::new(1.0, 1.0),
            Point::new(3.0, 3.0),
            Point::new(2.0, 2.0),
        ]));
        assert_eq!(
            collinear.convex_hull().unwrap(),
            Geometry::from(line(&[(1.0, 1.0), (3.0, 3.0)]))
        );

        let single = crate::tests::engine(MultiPoint::from(vec![
            Point::new(1.0, 1.0),
            Point::new(1.0, 1.0),
        ]));
        assert_eq!(single.convex_hull().unwrap(), Geometry::from(Point::new(1.0, 1.0)));
    }
}
