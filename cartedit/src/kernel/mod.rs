//! Geometry kernel.
//!
//! The kernel works on planar [`geo_types`] geometries. Ordinates beyond `x` and `y` are kept next to the planar
//! geometry in [`KernelGeometry`] and are reattached when a result is converted back into the application model.
//!
//! Every call into the kernel algorithms goes through [`guard`], which turns a panic inside the kernel into
//! [`EngineError::Kernel`].

use std::panic::AssertUnwindSafe;

use ahash::AHashMap;
use cartedit_types::CoordDims;
use geo_types::{
    Coord, Geometry as GeoGeometry, GeometryCollection, LineString as GeoLineString, MultiLineString,
    MultiPoint, MultiPolygon, Point as GeoPoint, Polygon as GeoPolygon,
};

use crate::error::EngineError;

pub(crate) mod buffer;
pub(crate) mod coord_seq;
pub(crate) mod line_merge;
pub(crate) mod measure;
pub(crate) mod noding;
pub(crate) mod overlay;
pub(crate) mod polygonize;
pub(crate) mod prepared;
pub(crate) mod relate;
pub mod runtime;
pub(crate) mod simplify;
pub(crate) mod validity;

use runtime::KernelRuntime;

/// Non-planar ordinates of a vertex.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub(crate) struct Zm {
    pub z: f64,
    pub m: f64,
}

pub(crate) type CoordKey = (u64, u64);

/// Hashable key of the planar coordinates. Negative and positive zero produce the same key.
pub(crate) fn coord_key(coord: Coord) -> CoordKey {
    ((coord.x + 0.0).to_bits(), (coord.y + 0.0).to_bits())
}

/// Storage of the non-planar ordinates of a kernel geometry.
#[derive(Debug, Clone)]
pub(crate) enum Ordinates {
    /// Geometry is planar.
    None,
    /// One entry per vertex, in the order of [`visit_coords`].
    Sequential(Vec<Zm>),
    /// Ordinates of known vertices and the segments of the source geometries. Vertices that are not in the map get
    /// their ordinates interpolated, from the source segment they lie on if there is one.
    Lookup {
        known: AHashMap<CoordKey, Zm>,
        segments: Vec<OrdinateSegment>,
    },
}

/// Segment of a source geometry with the ordinates of its ends.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct OrdinateSegment {
    pub start: Coord,
    pub end: Coord,
    pub start_zm: Zm,
    pub end_zm: Zm,
}

impl OrdinateSegment {
    /// Ordinates at the point, if the point lies on the segment.
    pub fn at(&self, c: Coord) -> Option<Zm> {
        let d = self.end - self.start;
        let len2 = d.x * d.x + d.y * d.y;
        if len2 == 0.0 {
            return None;
        }

        let t = ((c.x - self.start.x) * d.x + (c.y - self.start.y) * d.y) / len2;
        if !(0.0..=1.0).contains(&t) {
            return None;
        }

        let p = self.start + d * t;
        let tolerance = 1e-9 * (1.0 + len2.sqrt());
        if (p.x - c.x).hypot(p.y - c.y) > tolerance {
            return None;
        }

        Some(Zm {
            z: self.start_zm.z + (self.end_zm.z - self.start_zm.z) * t,
            m: self.start_zm.m + (self.end_zm.m - self.start_zm.m) * t,
        })
    }
}

/// Kernel representation of a geometry.
///
/// Created by [`to_kernel`](crate::adapter::to_kernel) and converted back with
/// [`from_kernel`](crate::adapter::from_kernel).
#[derive(Debug, Clone)]
pub struct KernelGeometry {
    geometry: GeoGeometry<f64>,
    dims: CoordDims,
    ordinates: Ordinates,
}

impl KernelGeometry {
    pub(crate) fn new(geometry: GeoGeometry<f64>, dims: CoordDims, ordinates: Ordinates) -> Self {
        Self {
            geometry,
            dims,
            ordinates,
        }
    }

    /// Planar geometry without ordinates.
    pub(crate) fn planar(geometry: GeoGeometry<f64>) -> Self {
        Self::new(geometry, CoordDims::XY, Ordinates::None)
    }

    /// Wraps a kernel result computed from the `sources`. The result inherits the dimensionality of the sources,
    /// vertices it shares with them keep their ordinates.
    pub(crate) fn derived(geometry: GeoGeometry<f64>, sources: &[&KernelGeometry]) -> Self {
        let dims = sources
            .iter()
            .fold(CoordDims::XY, |dims, source| dims.union(source.dims));
        if dims == CoordDims::XY {
            return Self::planar(geometry);
        }

        let mut known = AHashMap::new();
        let mut segments = vec![];
        for source in sources {
            source.collect_ordinates(&mut known, &mut segments);
        }

        Self::new(geometry, dims, Ordinates::Lookup { known, segments })
    }

    /// Planar geometry.
    pub fn geometry(&self) -> &GeoGeometry<f64> {
        &self.geometry
    }

    /// Dimensionality of the source geometry.
    pub fn dims(&self) -> CoordDims {
        self.dims
    }

    pub(crate) fn ordinates(&self) -> &Ordinates {
        &self.ordinates
    }

    /// Topological dimension of the geometry.
    pub fn dimension(&self) -> usize {
        Components::of(&self.geometry).dimension().unwrap_or(0)
    }

    /// Returns true if the geometry has no vertices.
    pub fn is_empty(&self) -> bool {
        Components::of(&self.geometry).is_empty()
    }

    fn collect_ordinates(&self, known: &mut AHashMap<CoordKey, Zm>, segments: &mut Vec<OrdinateSegment>) {
        match &self.ordinates {
            Ordinates::None => {}
            Ordinates::Sequential(values) => {
                let mut offset = 0;
                visit_sequences(&self.geometry, &mut |coords| {
                    let Some(zm) = values.get(offset..offset + coords.len()) else {
                        return;
                    };
                    offset += coords.len();

                    for (c, zm) in coords.iter().zip(zm) {
                        known.entry(coord_key(*c)).or_insert(*zm);
                    }
                    for i in 1..coords.len() {
                        segments.push(OrdinateSegment {
                            start: coords[i - 1],
                            end: coords[i],
                            start_zm: zm[i - 1],
                            end_zm: zm[i],
                        });
                    }
                });
            }
            Ordinates::Lookup {
                known: source_known,
                segments: source_segments,
            } => {
                for (key, zm) in source_known {
                    known.entry(*key).or_insert(*zm);
                }
                segments.extend_from_slice(source_segments);
            }
        }
    }
}

/// Calls `f` for every vertex of the geometry: points, then line vertices, polygon exterior ring followed by the
/// interior rings, members of multi geometries and collections in order.
pub(crate) fn visit_coords(geometry: &GeoGeometry<f64>, f: &mut impl FnMut(Coord)) {
    match geometry {
        GeoGeometry::Point(p) => f(p.0),
        GeoGeometry::Line(l) => {
            f(l.start);
            f(l.end);
        }
        GeoGeometry::LineString(l) => l.0.iter().for_each(|c| f(*c)),
        GeoGeometry::Polygon(p) => visit_polygon(p, f),
        GeoGeometry::MultiPoint(mp) => mp.0.iter().for_each(|p| f(p.0)),
        GeoGeometry::MultiLineString(ml) => ml.0.iter().flat_map(|l| l.0.iter()).for_each(|c| f(*c)),
        GeoGeometry::MultiPolygon(mp) => mp.0.iter().for_each(|p| visit_polygon(p, f)),
        GeoGeometry::GeometryCollection(gc) => gc.0.iter().for_each(|g| visit_coords(g, f)),
        GeoGeometry::Rect(r) => visit_polygon(&r.to_polygon(), f),
        GeoGeometry::Triangle(t) => visit_polygon(&t.to_polygon(), f),
    }
}

/// Calls `f` for every coordinate sequence of the geometry in the same order as [`visit_coords`] visits the
/// vertices. Points are sequences of one coordinate.
pub(crate) fn visit_sequences(geometry: &GeoGeometry<f64>, f: &mut impl FnMut(&[Coord])) {
    match geometry {
        GeoGeometry::Point(p) => f(&[p.0]),
        GeoGeometry::Line(l) => f(&[l.start, l.end]),
        GeoGeometry::LineString(l) => f(&l.0),
        GeoGeometry::Polygon(p) => visit_polygon_sequences(p, f),
        GeoGeometry::MultiPoint(mp) => mp.0.iter().for_each(|p| f(&[p.0])),
        GeoGeometry::MultiLineString(ml) => ml.0.iter().for_each(|l| f(&l.0)),
        GeoGeometry::MultiPolygon(mp) => mp.0.iter().for_each(|p| visit_polygon_sequences(p, f)),
        GeoGeometry::GeometryCollection(gc) => gc.0.iter().for_each(|g| visit_sequences(g, f)),
        GeoGeometry::Rect(r) => visit_polygon_sequences(&r.to_polygon(), f),
        GeoGeometry::Triangle(t) => visit_polygon_sequences(&t.to_polygon(), f),
    }
}

fn visit_polygon_sequences(polygon: &GeoPolygon<f64>, f: &mut impl FnMut(&[Coord])) {
    f(&polygon.exterior().0);
    for ring in polygon.interiors() {
        f(&ring.0);
    }
}

fn visit_polygon(polygon: &GeoPolygon<f64>, f: &mut impl FnMut(Coord)) {
    polygon.exterior().0.iter().for_each(|c| f(*c));
    for ring in polygon.interiors() {
        ring.0.iter().for_each(|c| f(*c));
    }
}

/// Runs a kernel computation, converting a panic inside it into [`EngineError::Kernel`].
///
/// The failure is reported to the [`KernelRuntime`] error handler.
pub(crate) fn guard<T>(operation: &str, f: impl FnOnce() -> T) -> Result<T, EngineError> {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Ok(value),
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown failure".to_string());
            let message = format!("{operation}: {reason}");
            KernelRuntime::instance().error(&message);
            Err(EngineError::Kernel(message))
        }
    }
}

/// Geometry split into its primitive members.
#[derive(Debug, Default, Clone)]
pub(crate) struct Components {
    pub points: Vec<Coord>,
    pub lines: Vec<GeoLineString<f64>>,
    pub polygons: Vec<GeoPolygon<f64>>,
}

impl Components {
    pub fn of(geometry: &GeoGeometry<f64>) -> Self {
        let mut components = Self::default();
        components.add(geometry);
        components
    }

    pub fn add(&mut self, geometry: &GeoGeometry<f64>) {
        match geometry {
            GeoGeometry::Point(p) => self.points.push(p.0),
            GeoGeometry::Line(l) => self.lines.push(GeoLineString::new(vec![l.start, l.end])),
            GeoGeometry::LineString(l) => {
                if !l.0.is_empty() {
                    self.lines.push(l.clone())
                }
            }
            GeoGeometry::Polygon(p) => {
                if !p.exterior().0.is_empty() {
                    self.polygons.push(p.clone())
                }
            }
            GeoGeometry::MultiPoint(mp) => self.points.extend(mp.0.iter().map(|p| p.0)),
            GeoGeometry::MultiLineString(ml) => {
                self.lines
                    .extend(ml.0.iter().filter(|l| !l.0.is_empty()).cloned())
            }
            GeoGeometry::MultiPolygon(mp) => self.polygons.extend(
                mp.0.iter()
                    .filter(|p| !p.exterior().0.is_empty())
                    .cloned(),
            ),
            GeoGeometry::GeometryCollection(gc) => gc.0.iter().for_each(|g| self.add(g)),
            GeoGeometry::Rect(r) => self.polygons.push(r.to_polygon()),
            GeoGeometry::Triangle(t) => self.polygons.push(t.to_polygon()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.lines.is_empty() && self.polygons.is_empty()
    }

    /// Highest dimension of the members, `None` if there are no members.
    pub fn dimension(&self) -> Option<usize> {
        if !self.polygons.is_empty() {
            Some(2)
        } else if !self.lines.is_empty() {
            Some(1)
        } else if !self.points.is_empty() {
            Some(0)
        } else {
            None
        }
    }

    /// Returns true if the members have more than one dimension.
    pub fn is_mixed(&self) -> bool {
        [
            !self.points.is_empty(),
            !self.lines.is_empty(),
            !self.polygons.is_empty(),
        ]
        .iter()
        .filter(|v| **v)
        .count()
            > 1
    }

    pub fn multi_polygon(&self) -> MultiPolygon<f64> {
        MultiPolygon::new(self.polygons.clone())
    }

    /// Builds the simplest geometry holding all the members: a single geometry if there is only one member,
    /// a multi geometry for members of the same dimension, and a collection otherwise. No members produce an empty
    /// collection.
    pub fn into_geometry(self) -> GeoGeometry<f64> {
        let Components {
            points,
            mut lines,
            mut polygons,
        } = self;

        match (points.len(), lines.len(), polygons.len()) {
            (0, 0, 0) => GeoGeometry::GeometryCollection(GeometryCollection(vec![])),
            (1, 0, 0) => GeoGeometry::Point(GeoPoint(points[0])),
            (_, 0, 0) => GeoGeometry::MultiPoint(MultiPoint::new(
                points.into_iter().map(GeoPoint).collect(),
            )),
            (0, 1, 0) => GeoGeometry::LineString(lines.remove(0)),
            (0, _, 0) => GeoGeometry::MultiLineString(MultiLineString::new(lines)),
            (0, 0, 1) => GeoGeometry::Polygon(polygons.remove(0)),
            (0, 0, _) => GeoGeometry::MultiPolygon(MultiPolygon::new(polygons)),
            _ => {
                let members = polygons
                    .into_iter()
                    .map(GeoGeometry::Polygon)
                    .chain(lines.into_iter().map(GeoGeometry::LineString))
                    .chain(points.into_iter().map(|c| GeoGeometry::Point(GeoPoint(c))))
                    .collect();
                GeoGeometry::GeometryCollection(GeometryCollection(members))
            }
        }
    }
}

/// Number of top-level members of the geometry. Single geometries have one.
pub(crate) fn num_geometries(geometry: &GeoGeometry<f64>) -> usize {
    match geometry {
        GeoGeometry::MultiPoint(mp) => mp.0.len(),
        GeoGeometry::MultiLineString(ml) => ml.0.len(),
        GeoGeometry::MultiPolygon(mp) => mp.0.len(),
        GeoGeometry::GeometryCollection(gc) => gc.0.len(),
        _ => 1,
    }
}

/// Top-level members of the geometry. A single geometry returns itself.
pub(crate) fn geometries(geometry: &GeoGeometry<f64>) -> Vec<GeoGeometry<f64>> {
    match geometry {
        GeoGeometry::MultiPoint(mp) => mp.0.iter().map(|p| GeoGeometry::Point(*p)).collect(),
        GeoGeometry::MultiLineString(ml) => {
            ml.0.iter().cloned().map(GeoGeometry::LineString).collect()
        }
        GeoGeometry::MultiPolygon(mp) => mp.0.iter().cloned().map(GeoGeometry::Polygon).collect(),
        GeoGeometry::GeometryCollection(gc) => gc.0.clone(),
        single => vec![single.clone()],
    }
}
