use serde::{Deserialize, Serialize};

use crate::Point;

/// A set of points.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct MultiPoint(Vec<Point>);

impl std::ops::Deref for MultiPoint {
    type Target = Vec<Point>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for MultiPoint {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl MultiPoint {
    /// Consumes the set and returns its points.
    pub fn into_inner(self) -> Vec<Point> {
        self.0
    }
}

impl From<Vec<Point>> for MultiPoint {
    fn from(value: Vec<Point>) -> Self {
        Self(value)
    }
}
