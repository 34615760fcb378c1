//! Topology preserving simplification.

use geo::Simplify;
use geo_types::{
    Geometry as GeoGeometry, GeometryCollection, LineString as GeoLineString, MultiLineString,
    MultiPolygon, Polygon as GeoPolygon,
};

use super::validity::is_valid;

fn simplify_line(line: &GeoLineString<f64>, tolerance: f64) -> GeoLineString<f64> {
    let simplified = line.simplify(tolerance);
    let required = if line.is_closed() { 4 } else { 2 };
    if simplified.0.len() < required.min(line.0.len()) {
        line.clone()
    } else {
        simplified
    }
}

/// Simplifies the rings one by one. A ring keeps its original shape if simplifying it would make the polygon
/// invalid.
fn simplify_polygon(polygon: &GeoPolygon<f64>, tolerance: f64) -> GeoPolygon<f64> {
    let mut exterior = polygon.exterior().clone();
    let mut interiors = polygon.interiors().to_vec();

    let candidate = simplify_line(&exterior, tolerance);
    if candidate.0.len() >= 4 {
        let attempt = GeoPolygon::new(candidate.clone(), interiors.clone());
        if is_valid(&attempt.into()) {
            exterior = candidate;
        }
    }

    for i in 0..interiors.len() {
        let candidate = simplify_line(&interiors[i], tolerance);
        if candidate.0.len() < 4 {
            continue;
        }

        let original = std::mem::replace(&mut interiors[i], candidate);
        let attempt = GeoPolygon::new(exterior.clone(), interiors.clone());
        if !is_valid(&attempt.into()) {
            interiors[i] = original;
        }
    }

    GeoPolygon::new(exterior, interiors)
}

/// Simplifies the lines and rings of the geometry with Douglas-Peucker, keeping polygons valid. Points are not
/// changed.
pub(crate) fn simplify_preserve_topology(geometry: &GeoGeometry<f64>, tolerance: f64) -> GeoGeometry<f64> {
    match geometry {
        GeoGeometry::LineString(l) => GeoGeometry::LineString(simplify_line(l, tolerance)),
        GeoGeometry::MultiLineString(ml) => GeoGeometry::MultiLineString(MultiLineString::new(
            ml.0.iter().map(|l| simplify_line(l, tolerance)).collect(),
        )),
        GeoGeometry::Polygon(p) => GeoGeometry::Polygon(simplify_polygon(p, tolerance)),
        GeoGeometry::MultiPolygon(mp) => GeoGeometry::MultiPolygon(MultiPolygon::new(
            mp.0.iter().map(|p| simplify_polygon(p, tolerance)).collect(),
        )),
        GeoGeometry::GeometryCollection(gc) => GeoGeometry::GeometryCollection(GeometryCollection(
            gc.0.iter()
                .map(|g| simplify_preserve_topology(g, tolerance))
                .collect(),
        )),
        other => other.clone(),
    }
}
