use approx::{AbsDiffEq, RelativeEq};
use serde::{Deserialize, Serialize};

/// Set of ordinates carried by the vertices of a geometry besides `x` and `y`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct CoordDims {
    /// Vertices carry a `z` ordinate.
    pub has_z: bool,
    /// Vertices carry an `m` (measure) ordinate.
    pub has_m: bool,
}

impl CoordDims {
    /// Planar coordinates only.
    pub const XY: Self = Self::new(false, false);
    /// Planar coordinates with elevation.
    pub const XYZ: Self = Self::new(true, false);
    /// Planar coordinates with measure.
    pub const XYM: Self = Self::new(false, true);
    /// Planar coordinates with both elevation and measure.
    pub const XYZM: Self = Self::new(true, true);

    /// Creates a new dimensionality description.
    pub const fn new(has_z: bool, has_m: bool) -> Self {
        Self { has_z, has_m }
    }

    /// Number of ordinates per vertex (2, 3 or 4).
    pub fn count(&self) -> usize {
        2 + self.has_z as usize + self.has_m as usize
    }

    /// Dimensionality that can hold ordinates of both `self` and `other`.
    pub fn union(self, other: Self) -> Self {
        Self {
            has_z: self.has_z || other.has_z,
            has_m: self.has_m || other.has_m,
        }
    }
}

/// A single vertex.
#[derive(Debug, Default, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Elevation, if the vertex has one.
    pub z: Option<f64>,
    /// Measure, if the vertex has one.
    pub m: Option<f64>,
}

impl Point {
    /// Creates a planar point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            m: None,
        }
    }

    /// Creates a point with elevation.
    pub const fn new_z(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z: Some(z),
            m: None,
        }
    }

    /// Creates a point with measure.
    pub const fn new_m(x: f64, y: f64, m: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            m: Some(m),
        }
    }

    /// Creates a point with both elevation and measure.
    pub const fn new_zm(x: f64, y: f64, z: f64, m: f64) -> Self {
        Self {
            x,
            y,
            z: Some(z),
            m: Some(m),
        }
    }

    /// Ordinates present in the point.
    pub fn dims(&self) -> CoordDims {
        CoordDims::new(self.z.is_some(), self.m.is_some())
    }

    /// Returns a copy of the point with exactly the given ordinates. Missing ordinates are set to `0.0`, extra
    /// ordinates are dropped.
    pub fn with_dims(&self, dims: CoordDims) -> Self {
        Self {
            x: self.x,
            y: self.y,
            z: dims.has_z.then(|| self.z.unwrap_or(0.0)),
            m: dims.has_m.then(|| self.m.unwrap_or(0.0)),
        }
    }

    /// Returns true if the planar coordinates of the points are exactly the same.
    pub fn equals_2d(&self, other: &Point) -> bool {
        self.x == other.x && self.y == other.y
    }

    /// Squared planar distance to the other point.
    pub fn distance_sq(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<(f64, f64, f64)> for Point {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self::new_z(x, y, z)
    }
}

fn option_abs_diff_eq(a: Option<f64>, b: Option<f64>, epsilon: f64) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.abs_diff_eq(&b, epsilon),
        (None, None) => true,
        _ => false,
    }
}

impl AbsDiffEq for Point {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.x.abs_diff_eq(&other.x, epsilon)
            && self.y.abs_diff_eq(&other.y, epsilon)
            && option_abs_diff_eq(self.z, other.z, epsilon)
            && option_abs_diff_eq(self.m, other.m, epsilon)
    }
}

impl RelativeEq for Point {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        let opt = |a: Option<f64>, b: Option<f64>| match (a, b) {
            (Some(a), Some(b)) => a.relative_eq(&b, epsilon, max_relative),
            (None, None) => true,
            _ => false,
        };

        self.x.relative_eq(&other.x, epsilon, max_relative)
            && self.y.relative_eq(&other.y, epsilon, max_relative)
            && opt(self.z, other.z)
            && opt(self.m, other.m)
    }
}
