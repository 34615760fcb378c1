use serde::{Deserialize, Serialize};

use crate::Geometry;

/// Heterogeneous collection of geometries.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct GeometryCollection(Vec<Geometry>);

impl std::ops::Deref for GeometryCollection {
    type Target = Vec<Geometry>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for GeometryCollection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl GeometryCollection {
    /// Consumes the collection and returns its members.
    pub fn into_inner(self) -> Vec<Geometry> {
        self.0
    }
}

impl From<Vec<Geometry>> for GeometryCollection {
    fn from(value: Vec<Geometry>) -> Self {
        Self(value)
    }
}
