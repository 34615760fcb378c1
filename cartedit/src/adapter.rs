//! Conversion between the application geometry model and the kernel representation.

use ahash::AHashMap;
use cartedit_types::{
    CoordDims, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon, Point,
    Polygon,
};
use geo_types::{
    Coord, Geometry as GeoGeometry, GeometryCollection as GeoCollection, LineString as GeoLineString,
    MultiLineString as GeoMultiLineString, MultiPoint as GeoMultiPoint, MultiPolygon as GeoMultiPolygon,
    Point as GeoPoint, Polygon as GeoPolygon,
};

use crate::error::EngineError;
use crate::kernel::coord_seq::CoordinateSequence;
use crate::kernel::{coord_key, CoordKey, KernelGeometry, OrdinateSegment, Ordinates, Zm};

/// Builds the kernel representation of the geometry, snapping coordinates to the grid of size `precision` if it
/// is positive.
///
/// Fails with [`EngineError::Conversion`] if a line has a single vertex, a ring has less than 4 vertices or a
/// coordinate is not finite.
pub fn to_kernel(geometry: &Geometry, precision: f64) -> Result<KernelGeometry, EngineError> {
    geometry.check_structure()?;
    if let Some(p) = geometry
        .points()
        .find(|p| !(p.x.is_finite() && p.y.is_finite()))
    {
        return Err(EngineError::Conversion(format!(
            "non-finite coordinate ({}, {})",
            p.x, p.y
        )));
    }

    let dims = geometry.dims();
    let mut zm = vec![];
    let kernel = convert(geometry, precision, &mut zm);
    let ordinates = if dims == CoordDims::XY {
        Ordinates::None
    } else {
        Ordinates::Sequential(zm)
    };

    Ok(KernelGeometry::new(kernel, dims, ordinates))
}

fn kernel_line(points: &[Point], precision: f64, close: bool, zm: &mut Vec<Zm>) -> GeoLineString<f64> {
    let (line, ordinates) = CoordinateSequence::build(points, precision, close).into_line_string();
    zm.extend(ordinates);
    line
}

fn kernel_polygon(polygon: &Polygon, precision: f64, zm: &mut Vec<Zm>) -> GeoPolygon<f64> {
    let exterior = kernel_line(polygon.exterior(), precision, true, zm);
    let interiors = polygon
        .interiors()
        .iter()
        .map(|ring| kernel_line(ring, precision, true, zm))
        .collect();
    GeoPolygon::new(exterior, interiors)
}

fn kernel_point(point: &Point, precision: f64, zm: &mut Vec<Zm>) -> GeoPoint<f64> {
    let sequence = CoordinateSequence::build(std::slice::from_ref(point), precision, false);
    zm.extend(sequence.zm);
    GeoPoint(sequence.coords[0])
}

fn convert(geometry: &Geometry, precision: f64, zm: &mut Vec<Zm>) -> GeoGeometry<f64> {
    match geometry {
        Geometry::Point(p) => GeoGeometry::Point(kernel_point(p, precision, zm)),
        Geometry::LineString(l) => GeoGeometry::LineString(kernel_line(l, precision, false, zm)),
        Geometry::Polygon(p) => GeoGeometry::Polygon(kernel_polygon(p, precision, zm)),
        Geometry::MultiPoint(mp) => GeoGeometry::MultiPoint(GeoMultiPoint::new(
            mp.iter().map(|p| kernel_point(p, precision, zm)).collect(),
        )),
        Geometry::MultiLineString(ml) => GeoGeometry::MultiLineString(GeoMultiLineString::new(
            ml.iter().map(|l| kernel_line(l, precision, false, zm)).collect(),
        )),
        Geometry::MultiPolygon(mp) => GeoGeometry::MultiPolygon(GeoMultiPolygon::new(
            mp.iter().map(|p| kernel_polygon(p, precision, zm)).collect(),
        )),
        Geometry::GeometryCollection(c) => GeoGeometry::GeometryCollection(GeoCollection(
            c.iter().map(|g| convert(g, precision, zm)).collect(),
        )),
    }
}

/// Source of the non-planar ordinates while a kernel geometry is converted back.
enum OrdinateSource<'a> {
    Planar,
    Sequential(std::slice::Iter<'a, Zm>),
    Lookup(&'a AHashMap<CoordKey, Zm>, &'a [OrdinateSegment]),
}

impl OrdinateSource<'_> {
    fn sequence(&mut self, coords: &[Coord]) -> Vec<Zm> {
        match self {
            OrdinateSource::Planar => vec![Zm::default(); coords.len()],
            OrdinateSource::Sequential(iter) => coords
                .iter()
                .map(|_| iter.next().copied().unwrap_or_default())
                .collect(),
            OrdinateSource::Lookup(known, segments) => interpolate_missing(coords, known, segments),
        }
    }
}

/// Takes known ordinates from the map or from the source segment the vertex lies on, and interpolates the rest by
/// the distance along the sequence between the closest known vertices. Vertices with a known neighbour on one side
/// only copy its ordinates.
fn interpolate_missing(
    coords: &[Coord],
    map: &AHashMap<CoordKey, Zm>,
    segments: &[OrdinateSegment],
) -> Vec<Zm> {
    let known: Vec<Option<Zm>> = coords
        .iter()
        .map(|c| {
            map.get(&coord_key(*c))
                .copied()
                .or_else(|| segments.iter().find_map(|s| s.at(*c)))
        })
        .collect();
    let mut along = Vec::with_capacity(coords.len());
    let mut total = 0.0;
    for (i, c) in coords.iter().enumerate() {
        if i > 0 {
            total += (c.x - coords[i - 1].x).hypot(c.y - coords[i - 1].y);
        }
        along.push(total);
    }

    (0..coords.len())
        .map(|i| {
            if let Some(zm) = known[i] {
                return zm;
            }

            let before = (0..i).rev().find_map(|j| known[j].map(|zm| (j, zm)));
            let after = (i + 1..coords.len()).find_map(|j| known[j].map(|zm| (j, zm)));
            match (before, after) {
                (Some((b, zb)), Some((a, za))) => {
                    let span = along[a] - along[b];
                    let t = if span > 0.0 {
                        (along[i] - along[b]) / span
                    } else {
                        0.0
                    };
                    Zm {
                        z: zb.z + (za.z - zb.z) * t,
                        m: zb.m + (za.m - zb.m) * t,
                    }
                }
                (Some((_, zm)), None) | (None, Some((_, zm))) => zm,
                (None, None) => Zm::default(),
            }
        })
        .collect()
}

struct Builder<'a> {
    dims: CoordDims,
    source: OrdinateSource<'a>,
}

impl Builder<'_> {
    fn points(&mut self, coords: &[Coord]) -> Vec<Point> {
        let zm = self.source.sequence(coords);
        coords
            .iter()
            .zip(zm)
            .map(|(c, zm)| Point {
                x: c.x,
                y: c.y,
                z: self.dims.has_z.then_some(zm.z),
                m: self.dims.has_m.then_some(zm.m),
            })
            .collect()
    }

    fn point(&mut self, coord: Coord) -> Point {
        self.points(&[coord])
            .pop()
            .unwrap_or_else(|| Point::new(coord.x, coord.y))
    }

    fn line(&mut self, line: &GeoLineString<f64>) -> LineString {
        LineString::with_dims(self.points(&line.0), self.dims)
    }

    fn polygon(&mut self, polygon: &GeoPolygon<f64>) -> Polygon {
        let exterior = self.line(polygon.exterior());
        let interiors = polygon.interiors().iter().map(|r| self.line(r)).collect();
        Polygon::new(exterior, interiors)
    }

    fn geometry(&mut self, geometry: &GeoGeometry<f64>) -> Geometry {
        match geometry {
            GeoGeometry::Point(p) => self.point(p.0).into(),
            GeoGeometry::Line(l) => {
                LineString::with_dims(self.points(&[l.start, l.end]), self.dims).into()
            }
            GeoGeometry::LineString(l) => self.line(l).into(),
            GeoGeometry::Polygon(p) => self.polygon(p).into(),
            GeoGeometry::MultiPoint(mp) => {
                MultiPoint::from(mp.0.iter().map(|p| self.point(p.0)).collect::<Vec<_>>()).into()
            }
            GeoGeometry::MultiLineString(ml) => {
                MultiLineString::from(ml.0.iter().map(|l| self.line(l)).collect::<Vec<_>>()).into()
            }
            GeoGeometry::MultiPolygon(mp) => {
                MultiPolygon::from(mp.0.iter().map(|p| self.polygon(p)).collect::<Vec<_>>()).into()
            }
            GeoGeometry::GeometryCollection(gc) => GeometryCollection::from(
                gc.0.iter().map(|g| self.geometry(g)).collect::<Vec<_>>(),
            )
            .into(),
            GeoGeometry::Rect(r) => self.polygon(&r.to_polygon()).into(),
            GeoGeometry::Triangle(t) => self.polygon(&t.to_polygon()).into(),
        }
    }
}

/// Builds the application geometry from the kernel representation.
///
/// Vertices get the ordinates of the dimensionality of the kernel geometry. Ordinates of vertices that were not
/// present in the geometries the kernel geometry was computed from are interpolated.
pub fn from_kernel(kernel: &KernelGeometry) -> Result<Geometry, EngineError> {
    let source = match kernel.ordinates() {
        Ordinates::None => OrdinateSource::Planar,
        Ordinates::Sequential(values) => OrdinateSource::Sequential(values.iter()),
        Ordinates::Lookup { known, segments } => OrdinateSource::Lookup(known, segments),
    };

    let mut builder = Builder {
        dims: kernel.dims(),
        source,
    };
    let geometry = builder.geometry(kernel.geometry());
    if let Some(p) = geometry
        .points()
        .find(|p| !(p.x.is_finite() && p.y.is_finite()))
    {
        return Err(EngineError::Conversion(format!(
            "kernel produced non-finite coordinate ({}, {})",
            p.x, p.y
        )));
    }

    Ok(geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;
    use assert_matches::assert_matches;
    use geo_types::line_string;

    fn round_trip(geometry: Geometry) {
        let kernel = to_kernel(&geometry, 0.0).unwrap();
        assert_eq!(from_kernel(&kernel).unwrap(), geometry);
    }

    #[test]
    fn round_trip_all_kinds() {
        round_trip(Point::new(1.0, 2.0).into());
        round_trip(line(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]).into());
        round_trip(polygon_with_hole().into());
        round_trip(MultiPoint::from(vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)]).into());
        round_trip(
            MultiLineString::from(vec![
                line(&[(0.0, 0.0), (1.0, 1.0)]),
                line(&[(5.0, 5.0), (6.0, 5.0)]),
            ])
            .into(),
        );
        round_trip(three_squares().into());
        round_trip(
            GeometryCollection::from(vec![
                Geometry::from(square(0.0, 0.0, 1.0)),
                Geometry::from(line(&[(5.0, 5.0), (6.0, 5.0)])),
                Geometry::from(Point::new(9.0, 9.0)),
            ])
            .into(),
        );
        round_trip(Geometry::empty());
    }

    #[test]
    fn round_trip_keeps_ordinates() {
        round_trip(Point::new_zm(1.0, 2.0, 3.0, 4.0).into());
        round_trip(
            LineString::new(vec![Point::new_z(0.0, 0.0, 1.0), Point::new_z(1.0, 1.0, 2.0)]).into(),
        );
        round_trip(
            Polygon::new(
                LineString::new(vec![
                    Point::new_m(0.0, 0.0, 1.0),
                    Point::new_m(1.0, 0.0, 2.0),
                    Point::new_m(1.0, 1.0, 3.0),
                    Point::new_m(0.0, 0.0, 1.0),
                ]),
                vec![],
            )
            .into(),
        );
    }

    #[test]
    fn precision_snaps_coordinates() {
        let geometry: Geometry =
            LineString::new(vec![Point::new_z(0.26, 0.74, 1.26), Point::new(1.1, 1.9)]).into();
        let kernel = to_kernel(&geometry, 0.5).unwrap();
        let restored = from_kernel(&kernel).unwrap();
        let points: Vec<_> = restored.points().copied().collect();
        assert_eq!(points[0], Point::new_z(0.5, 0.5, 1.5));
        assert_eq!(points[1], Point::new_z(1.0, 2.0, 0.0));
    }

    #[test]
    fn degenerate_inputs_fail() {
        let single_vertex: Geometry = LineString::new(vec![Point::new(0.0, 0.0)]).into();
        assert_matches!(to_kernel(&single_vertex, 0.0), Err(EngineError::Conversion(_)));

        let not_finite: Geometry = Point::new(f64::NAN, 0.0).into();
        assert_matches!(to_kernel(&not_finite, 0.0), Err(EngineError::Conversion(_)));
    }

    #[test]
    fn derived_vertices_get_interpolated_ordinates() {
        let source = to_kernel(
            &LineString::new(vec![Point::new_z(0.0, 0.0, 0.0), Point::new_z(10.0, 0.0, 10.0)]).into(),
            0.0,
        )
        .unwrap();
        let derived = KernelGeometry::derived(
            geo_types::line_string![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 10.0, y: 0.0)].into(),
            &[&source],
        );

        let result = from_kernel(&derived).unwrap();
        let z: Vec<_> = result.points().map(|p| p.z).collect();
        assert_eq!(z, vec![Some(0.0), Some(4.0), Some(10.0)]);
    }
}
