use serde::{Deserialize, Serialize};

use crate::LineString;

/// A set of lines.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct MultiLineString(Vec<LineString>);

impl std::ops::Deref for MultiLineString {
    type Target = Vec<LineString>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for MultiLineString {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl MultiLineString {
    /// Consumes the set and returns its lines.
    pub fn into_inner(self) -> Vec<LineString> {
        self.0
    }
}

impl From<Vec<LineString>> for MultiLineString {
    fn from(value: Vec<LineString>) -> Self {
        Self(value)
    }
}
