use serde::{Deserialize, Serialize};

use crate::Polygon;

/// A set of polygons.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct MultiPolygon(Vec<Polygon>);

impl std::ops::Deref for MultiPolygon {
    type Target = Vec<Polygon>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for MultiPolygon {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl MultiPolygon {
    /// Consumes the set and returns its polygons.
    pub fn into_inner(self) -> Vec<Polygon> {
        self.0
    }
}

impl From<Vec<Polygon>> for MultiPolygon {
    fn from(value: Vec<Polygon>) -> Self {
        Self(value)
    }
}
