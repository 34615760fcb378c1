use cartedit_types::{Geometry, LineString, MultiPolygon, Point, Polygon};

use crate::GeometryEngine;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn line(points: &[(f64, f64)]) -> LineString {
    LineString::new(points.iter().map(|(x, y)| Point::new(*x, *y)).collect())
}

/// Axis aligned square with the lower left corner at `(x0, y0)`.
pub fn square(x0: f64, y0: f64, size: f64) -> Polygon {
    Polygon::new(
        line(&[
            (x0, y0),
            (x0 + size, y0),
            (x0 + size, y0 + size),
            (x0, y0 + size),
            (x0, y0),
        ]),
        vec![],
    )
}

/// 10x10 square with a 2x2 hole in the middle.
pub fn polygon_with_hole() -> Polygon {
    Polygon::new(
        square(0.0, 0.0, 10.0).exterior().clone(),
        vec![square(4.0, 4.0, 2.0).exterior().clone()],
    )
}

/// Three 4x4 squares 10 units apart along the x axis.
pub fn three_squares() -> MultiPolygon {
    MultiPolygon::from(vec![
        square(0.0, 0.0, 4.0),
        square(10.0, 0.0, 4.0),
        square(20.0, 0.0, 4.0),
    ])
}

pub fn engine(geometry: impl Into<Geometry>) -> GeometryEngine {
    init_logger();
    GeometryEngine::new(geometry.into())
}

/// Area of the geometry, zero for empty geometries.
pub fn area_of(geometry: &Geometry) -> f64 {
    if geometry.is_empty() {
        return 0.0;
    }

    GeometryEngine::new(geometry.clone())
        .area()
        .unwrap_or(f64::NAN)
}
