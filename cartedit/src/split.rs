//! Splitting of lines and polygons with a cutting line or point.

use cartedit_types::{Geometry, LineString, Point};
use geo_types::{Coord, Geometry as GeoGeometry, LineString as GeoLineString};

use crate::error::EngineError;
use crate::fragments::regroup_fragments;
use crate::kernel::noding::{node, ORIGIN_A, ORIGIN_B};
use crate::kernel::overlay::{overlay, OverlayOp};
use crate::kernel::polygonize::polygonize;
use crate::kernel::relate::relate;
use crate::kernel::{guard, measure, num_geometries, validity, Components, KernelGeometry};
use crate::predicate::check_validity;
use crate::GeometryEngine;

/// Result of a successful [`GeometryEngine::split_geometry`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOutcome {
    /// Geometries the engine geometry was split into.
    ///
    /// Pieces of a single line or polygon are returned as line strings or polygons. Pieces of a multi geometry
    /// are returned as one-member multi geometries, followed by one multi geometry holding all the parts the cut
    /// did not touch.
    pub geometries: Vec<Geometry>,
    /// Points where the cutting geometry meets the engine geometry. Only filled if topological test points were
    /// requested. Editing tools use them to add matching vertices to neighbouring features.
    pub test_points: Vec<Point>,
}

impl GeometryEngine {
    /// Splits the engine geometry with a line through the `cut` points, or at a vertex if `cut` has a single point.
    ///
    /// A single cut point splits lines only at their existing vertices. Polygons need a cutting line. With
    /// `topological` set, the points where the cut meets the geometry are returned in
    /// [`SplitOutcome::test_points`].
    ///
    /// Fails with:
    /// * [`EngineError::MissingGeometry`] (code 5) if the engine has no geometry,
    /// * [`EngineError::InvalidInput`] (code 1) if the engine geometry is a point, the cut has too few points or is
    ///   not simple,
    /// * [`EngineError::InvalidGeometry`] (code 7) if the engine geometry is not valid,
    /// * [`EngineError::NoIntersection`] (code 1) if the cut misses the geometry,
    /// * [`EngineError::NoChange`] (code 1) if the cut does not divide anything,
    /// * [`EngineError::AmbiguousTopology`] (code 3) if the cut runs along a line instead of crossing it,
    /// * [`EngineError::EmptyPolygonization`] (code 4) if no polygons could be built from the cut polygon,
    /// * [`EngineError::InvalidResult`] (code 3) if a piece of a polygon is not valid,
    /// * [`EngineError::Conversion`] or [`EngineError::Kernel`] (code 2) on kernel failures.
    pub fn split_geometry(&self, cut: &[Point], topological: bool) -> Result<SplitOutcome, EngineError> {
        let handle = self.handle()?;
        let dimension = self.geometry().dimension();
        if dimension == 0 {
            return Err(EngineError::InvalidInput("points cannot be split".into()));
        }

        if let Some(reason) = check_validity(&handle)? {
            return Err(EngineError::InvalidGeometry(reason));
        }

        let required = if dimension == 1 { 1 } else { 2 };
        if cut.len() < required {
            return Err(EngineError::InvalidInput(format!(
                "splitting a geometry of dimension {dimension} requires at least {required} cut points, got {}",
                cut.len()
            )));
        }

        let cut_geometry: Geometry = if cut.len() == 1 {
            cut[0].into()
        } else {
            LineString::new(cut.to_vec()).into()
        };
        let cut = self.kernel_of(&cut_geometry)?;
        let cut_is_usable = guard("cut validity", || {
            validity::is_valid(cut.geometry()) && validity::is_simple(cut.geometry())
        })?;
        if !cut_is_usable {
            log::warn!("Split rejected: cutting geometry is not valid or not simple");
            return Err(EngineError::InvalidInput(
                "cutting geometry is not valid or not simple".into(),
            ));
        }

        let test_points = if topological {
            self.test_points(&handle, &cut)?
        } else {
            vec![]
        };

        let fragments = if dimension == 1 {
            split_linear(handle.geometry(), cut.geometry())?
        } else {
            split_polygonal(
                handle.geometry(),
                cut.geometry(),
                self.options().split_area_tolerance,
            )?
        };

        let geometries = fragments
            .into_iter()
            .map(|fragment| self.result(fragment, &[&*handle, &cut]))
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("Split {} into {} geometries", self.geometry().kind(), geometries.len());

        Ok(SplitOutcome {
            geometries,
            test_points,
        })
    }

    /// Vertices of the intersection of the engine geometry and the cut.
    fn test_points(&self, handle: &KernelGeometry, cut: &KernelGeometry) -> Result<Vec<Point>, EngineError> {
        let intersection = guard("test points", || {
            overlay(handle.geometry(), cut.geometry(), OverlayOp::Intersection)
        })
        .and_then(|r| r)
        .map_err(|err| EngineError::InvalidInput(format!("cannot compute split test points: {err}")))?;

        let intersection = self.result(intersection, &[handle, cut])?;
        Ok(intersection.points().copied().collect())
    }
}

fn split_linear(target: &GeoGeometry<f64>, cut: &GeoGeometry<f64>) -> Result<Vec<GeoGeometry<f64>>, EngineError> {
    let matrix = guard("relate", || relate(target, cut))?;
    if !matrix.is_intersects() {
        return Err(EngineError::NoIntersection);
    }

    if matrix.matches("1********")? {
        return Err(EngineError::AmbiguousTopology(
            "cutting line overlaps the split line".into(),
        ));
    }

    let pieces = match cut {
        GeoGeometry::Point(point) => split_at_vertex(target, point.0),
        _ => {
            let difference = guard("split difference", || overlay(target, cut, OverlayOp::Difference))??;
            Components::of(&difference).lines
        }
    };

    if pieces.len() == num_geometries(target) {
        log::debug!("Split did not divide any line");
        return Err(EngineError::NoChange);
    }

    regroup_fragments(
        target,
        pieces.into_iter().map(GeoGeometry::LineString).collect(),
    )
}

/// Breaks every line of the geometry at its inner vertices that are exactly at `point`.
fn split_at_vertex(target: &GeoGeometry<f64>, point: Coord) -> Vec<GeoLineString<f64>> {
    let mut pieces = vec![];
    for line in Components::of(target).lines {
        let coords = line.0;
        let mut start = 0;
        for j in 1..coords.len().saturating_sub(1) {
            if coords[j] == point {
                pieces.push(GeoLineString::new(coords[start..=j].to_vec()));
                start = j;
            }
        }
        pieces.push(GeoLineString::new(coords[start..].to_vec()));
    }

    pieces
}

fn split_polygonal(
    target: &GeoGeometry<f64>,
    cut: &GeoGeometry<f64>,
    area_tolerance: f64,
) -> Result<Vec<GeoGeometry<f64>>, EngineError> {
    if !guard("relate", || relate(target, cut).is_intersects())? {
        return Err(EngineError::NoIntersection);
    }

    let target_components = Components::of(target);
    let cut_components = Components::of(cut);
    let candidates = guard("polygonize", || {
        let rings = target_components
            .polygons
            .iter()
            .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
            .map(|ring| (&ring.0[..], ORIGIN_A));
        let cut_lines = cut_components.lines.iter().map(|l| (&l.0[..], ORIGIN_B));
        polygonize(&node(rings.chain(cut_lines)))
    })?;

    if candidates.is_empty() {
        return Err(EngineError::EmptyPolygonization);
    }

    let mut fragments = vec![];
    for candidate in candidates {
        let candidate = GeoGeometry::Polygon(candidate);
        let fragment_area = measure::area(&candidate);
        let common = guard("split intersection", || {
            overlay(target, &candidate, OverlayOp::Intersection)
        })??;
        let ratio = measure::area(&common) / fragment_area;
        log::trace!("Split candidate with area {fragment_area} has area ratio {ratio}");

        if ratio > 1.0 - area_tolerance && ratio < 1.0 + area_tolerance {
            fragments.push(candidate);
        }
    }

    if fragments.is_empty() || fragments.len() == num_geometries(target) {
        log::debug!("Split did not divide any polygon");
        return Err(EngineError::NoChange);
    }

    let fragments = regroup_fragments(target, fragments)?;
    for fragment in &fragments {
        if let Some(reason) = guard("fragment validity", || validity::validity_error(fragment))? {
            return Err(EngineError::InvalidResult(reason));
        }
    }

    Ok(fragments)
}
