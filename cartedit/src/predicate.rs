//! Relation predicates and measures of the engine geometry.

use cartedit_types::Geometry;

use crate::error::EngineError;
use crate::kernel::relate::{relate, RelateMatrix};
use crate::kernel::runtime::KernelRuntime;
use crate::kernel::{guard, measure, validity, KernelGeometry};
use crate::GeometryEngine;

impl GeometryEngine {
    /// DE-9IM matrix of the engine geometry against `other`, together with the dimensions of both geometries.
    ///
    /// Goes through the prepared geometry if there is one.
    fn relation(&self, other: &Geometry) -> Result<(RelateMatrix, (usize, usize)), EngineError> {
        let handle = self.handle()?;
        let other = self.kernel_of(other)?;
        let matrix = match self.prepared() {
            Some(prepared) => guard("prepared relate", || prepared.relate(other.geometry()))?,
            None => guard("relate", || relate(handle.geometry(), other.geometry()))?,
        };

        Ok((matrix, (handle.dimension(), other.dimension())))
    }

    /// Returns true if the geometries have at least one point in common.
    pub fn intersects(&self, other: &Geometry) -> Result<bool, EngineError> {
        Ok(self.relation(other)?.0.is_intersects())
    }

    /// Returns true if the geometries have common points, but their interiors do not meet.
    pub fn touches(&self, other: &Geometry) -> Result<bool, EngineError> {
        let (matrix, dims) = self.relation(other)?;
        Ok(matrix.is_touches(dims))
    }

    /// Returns true if the interiors of the geometries meet in a geometry of lower dimension than the maximum
    /// dimension of the two inputs.
    pub fn crosses(&self, other: &Geometry) -> Result<bool, EngineError> {
        let (matrix, dims) = self.relation(other)?;
        Ok(matrix.is_crosses(dims))
    }

    /// Returns true if the engine geometry lies inside `other`.
    pub fn within(&self, other: &Geometry) -> Result<bool, EngineError> {
        Ok(self.relation(other)?.0.is_within())
    }

    /// Returns true if the geometries have the same dimension and share some, but not all of their points.
    pub fn overlaps(&self, other: &Geometry) -> Result<bool, EngineError> {
        let (matrix, dims) = self.relation(other)?;
        Ok(matrix.is_overlaps(dims))
    }

    /// Returns true if `other` lies inside the engine geometry.
    pub fn contains(&self, other: &Geometry) -> Result<bool, EngineError> {
        Ok(self.relation(other)?.0.is_contains())
    }

    /// Returns true if the geometries have no point in common.
    pub fn disjoint(&self, other: &Geometry) -> Result<bool, EngineError> {
        Ok(self.relation(other)?.0.is_disjoint())
    }

    /// Returns true if the geometries are topologically equal, i.e. contain the same points regardless of
    /// vertex order and structure.
    pub fn is_equal(&self, other: &Geometry) -> Result<bool, EngineError> {
        Ok(self.relation(other)?.0.is_equal_topo())
    }

    /// DE-9IM matrix of the geometries as a 9 character string, e.g. `"212101212"`.
    pub fn relate(&self, other: &Geometry) -> Result<String, EngineError> {
        Ok(self.relation(other)?.0.to_string())
    }

    /// Checks the DE-9IM matrix of the geometries against a pattern of `T`, `F`, `*`, `0`, `1` and `2` characters.
    ///
    /// Fails with [`EngineError::InvalidInput`] if the pattern is malformed.
    pub fn relate_pattern(&self, other: &Geometry, pattern: &str) -> Result<bool, EngineError> {
        self.relation(other)?.0.matches(pattern)
    }

    /// Minimum planar distance between the geometries.
    pub fn distance(&self, other: &Geometry) -> Result<f64, EngineError> {
        let handle = self.handle()?;
        let other = self.kernel_of(other)?;
        guard("distance", || measure::distance(handle.geometry(), other.geometry()))?
            .ok_or_else(|| EngineError::InvalidInput("distance to an empty geometry".into()))
    }

    /// Area of the engine geometry. Points and lines have zero area.
    pub fn area(&self) -> Result<f64, EngineError> {
        let handle = self.handle()?;
        guard("area", || measure::area(handle.geometry()))
    }

    /// Length of the engine geometry. The length of an area is the length of its boundary.
    pub fn length(&self) -> Result<f64, EngineError> {
        let handle = self.handle()?;
        guard("length", || measure::length(handle.geometry()))
    }

    /// Returns true if the engine geometry is topologically valid.
    pub fn is_valid(&self) -> Result<bool, EngineError> {
        Ok(self.validity_error()?.is_none())
    }

    /// Describes why the engine geometry is not valid, `None` for valid geometries.
    pub fn validity_error(&self) -> Result<Option<String>, EngineError> {
        let handle = self.handle()?;
        check_validity(&handle)
    }

    /// Returns true if the engine geometry has no anomalous points like self-intersections.
    pub fn is_simple(&self) -> Result<bool, EngineError> {
        let handle = self.handle()?;
        guard("is_simple", || validity::is_simple(handle.geometry()))
    }

    /// Returns true if the engine geometry has no vertices.
    pub fn is_empty(&self) -> bool {
        self.geometry().is_empty()
    }
}

pub(crate) fn check_validity(geometry: &KernelGeometry) -> Result<Option<String>, EngineError> {
    let error = guard("is_valid", || validity::validity_error(geometry.geometry()))?;
    if let Some(reason) = &error {
        KernelRuntime::instance().notice(&format!("Geometry is not valid: {reason}"));
    }

    Ok(error)
}
