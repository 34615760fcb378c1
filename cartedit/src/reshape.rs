//! Reshaping of lines and polygon rings along a replacement path.

use cartedit_types::{Geometry, LineString, Point};
use geo_types::{
    Coord, Geometry as GeoGeometry, LineString as GeoLineString, MultiLineString, MultiPolygon,
    Polygon as GeoPolygon,
};

use crate::error::EngineError;
use crate::kernel::guard;
use crate::kernel::line_merge::merge_lines;
use crate::kernel::measure::{distance_to_line, line_length};
use crate::kernel::noding::{node, ORIGIN_A, ORIGIN_B};
use crate::kernel::overlay::{overlay, OverlayOp};
use crate::kernel::relate::relate;
use crate::GeometryEngine;

impl GeometryEngine {
    /// Replaces the part of the engine geometry between two points where `path` meets it with `path` itself.
    ///
    /// An open line whose end point is the first or last point of `path` is extended with `path`. A polygon can
    /// only be reshaped if `path` meets exactly one of its rings. Rings that end up outside the new exterior ring
    /// are dropped. Every member of a multi geometry is reshaped on its own.
    ///
    /// Fails with:
    /// * [`EngineError::MissingGeometry`] (code 5) if the engine has no geometry,
    /// * [`EngineError::InvalidInput`] (code 1) if `path` has less than two points or the engine geometry is not a
    ///   line or a polygon,
    /// * [`EngineError::NoChange`] (code 1) if no line or ring could be reshaped.
    pub fn reshape_geometry(&self, path: &[Point]) -> Result<Geometry, EngineError> {
        let handle = self.handle()?;
        if path.len() < 2 {
            return Err(EngineError::InvalidInput(format!(
                "reshape path needs at least 2 points, got {}",
                path.len()
            )));
        }

        if handle.dimension() == 0 {
            return Err(EngineError::InvalidInput("points cannot be reshaped".into()));
        }

        let path = self.kernel_of(&LineString::new(path.to_vec()).into())?;
        let GeoGeometry::LineString(path_line) = path.geometry() else {
            return Err(EngineError::Conversion("reshape path is not a line string".into()));
        };

        let reshaper = Reshaper {
            path: &path_line.0,
            containment_tolerance: self.options().line_containment_tolerance,
        };
        let Some(reshaped) = guard("reshape", || reshaper.geometry(handle.geometry()))?? else {
            log::debug!("Reshape path did not change {}", self.geometry().kind());
            return Err(EngineError::NoChange);
        };

        self.result(reshaped, &[&*handle, &path])
    }
}

struct Reshaper<'a> {
    path: &'a [Coord],
    containment_tolerance: f64,
}

impl Reshaper<'_> {
    /// Reshaped geometry, `None` if nothing changed.
    fn geometry(&self, target: &GeoGeometry<f64>) -> Result<Option<GeoGeometry<f64>>, EngineError> {
        let reshaped = match target {
            GeoGeometry::LineString(line) => self
                .line(&line.0)?
                .map(|coords| GeoGeometry::LineString(GeoLineString::new(coords))),
            GeoGeometry::Polygon(polygon) => self.polygon(polygon)?.map(GeoGeometry::Polygon),
            GeoGeometry::MultiLineString(lines) => {
                let mut changed = false;
                let mut members = Vec::with_capacity(lines.0.len());
                for line in &lines.0 {
                    match self.line(&line.0)? {
                        Some(coords) => {
                            changed = true;
                            members.push(GeoLineString::new(coords));
                        }
                        None => members.push(line.clone()),
                    }
                }

                changed.then(|| GeoGeometry::MultiLineString(MultiLineString::new(members)))
            }
            GeoGeometry::MultiPolygon(polygons) => {
                let mut changed = false;
                let mut members = Vec::with_capacity(polygons.0.len());
                for polygon in &polygons.0 {
                    match self.polygon(polygon)? {
                        Some(reshaped) => {
                            changed = true;
                            members.push(reshaped);
                        }
                        None => members.push(polygon.clone()),
                    }
                }

                changed.then(|| GeoGeometry::MultiPolygon(MultiPolygon::new(members)))
            }
            _ => {
                return Err(EngineError::InvalidInput(
                    "only lines and polygons can be reshaped".into(),
                ))
            }
        };

        Ok(reshaped)
    }

    /// Reshapes a single line or ring. Returns `None` if the path does not reshape it.
    fn line(&self, line: &[Coord]) -> Result<Option<Vec<Coord>>, EngineError> {
        let (Some(&begin), Some(&end)) = (line.first(), line.last()) else {
            return Ok(None);
        };

        let intersection = overlay(
            &as_geometry(line),
            &as_geometry(self.path),
            OverlayOp::Intersection,
        )?;
        match intersection {
            GeoGeometry::Point(at) => return Ok(self.extend(line, at.0)),
            GeoGeometry::MultiPoint(points) if points.0.len() > 1 => {}
            _ => return Ok(None),
        }

        let segments: Vec<[Coord; 2]> = node([(line, ORIGIN_A), (self.path, ORIGIN_B)])
            .into_iter()
            .map(|s| [s.start, s.end])
            .collect();
        let chains = merge_lines(&segments, |_| false);
        match chains.len() {
            0 => return Ok(None),
            1 => return Ok(Some(self.path.to_vec())),
            _ => {}
        }

        let is_ring = begin == end;
        let tolerance = point_tolerance(line);
        let mut parts = vec![];
        let mut ring_candidates = vec![];

        for chain in chains {
            let (Some(&first), Some(&last)) = (chain.first(), chain.last()) else {
                continue;
            };
            if chain.len() < 2 {
                continue;
            }

            let ends = [first, last];
            let on_line = ends
                .iter()
                .filter(|c| distance_to_line(**c, line) <= tolerance)
                .count();
            let at_line_ends = ends.iter().filter(|c| **c == begin || **c == end).count();
            let along_line = self.is_along(&chain, line);
            let along_path = self.is_along(&chain, self.path);
            log::trace!(
                "Reshape chain of {} points: {on_line} ends on line, {at_line_ends} at line ends, along line: \
                 {along_line}, along path: {along_path}",
                chain.len()
            );

            if !is_ring && at_line_ends == 1 && on_line == 2 && along_line {
                parts.push(chain);
            } else if is_ring && on_line == 2 && along_line {
                ring_candidates.push(chain);
            } else if on_line == 2 && !along_line {
                parts.push(chain);
            } else if at_line_ends == 2 && !along_line {
                parts.push(chain);
            } else if along_line && along_path {
                parts.push(chain);
            }
        }

        // Only one part of the old ring can survive, otherwise the ring would cross itself.
        if let Some(longest) = ring_candidates
            .into_iter()
            .max_by(|a, b| line_length(a).total_cmp(&line_length(b)))
        {
            parts.push(longest);
        }

        match parts.len() {
            0 => Ok(None),
            1 => Ok(parts.pop()),
            _ => {
                let mut merged = merge_lines(&parts, |_| false);
                if merged.len() == 1 {
                    Ok(merged.pop())
                } else {
                    log::debug!("Reshaped parts merge into {} lines instead of one", merged.len());
                    Ok(None)
                }
            }
        }
    }

    /// Appends the path to an open line that it touches at an end point of both.
    fn extend(&self, line: &[Coord], at: Coord) -> Option<Vec<Coord>> {
        let ends_at = |coords: &[Coord]| coords.first() == Some(&at) || coords.last() == Some(&at);
        if !ends_at(line) || !ends_at(self.path) {
            return None;
        }

        let mut merged = merge_lines(&[line, self.path], |_| false);
        if merged.len() == 1 {
            merged.pop()
        } else {
            None
        }
    }

    /// Reshapes the one ring of the polygon the path meets.
    fn polygon(&self, polygon: &GeoPolygon<f64>) -> Result<Option<GeoPolygon<f64>>, EngineError> {
        let path = as_geometry(self.path);
        let mut rings: Vec<GeoLineString<f64>> = std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .cloned()
            .collect();

        let touched: Vec<usize> = rings
            .iter()
            .enumerate()
            .filter(|(_, ring)| relate(&as_geometry(&ring.0), &path).is_intersects())
            .map(|(i, _)| i)
            .collect();
        let &[index] = touched.as_slice() else {
            log::debug!("Reshape path meets {} rings of a polygon, expected 1", touched.len());
            return Ok(None);
        };

        let Some(ring) = self.line(&rings[index].0)? else {
            return Ok(None);
        };
        if ring.len() < 4 || ring.first() != ring.last() {
            log::debug!("Reshaped ring is not closed");
            return Ok(None);
        }
        rings[index] = GeoLineString::new(ring);

        let mut rings = rings.into_iter();
        let Some(exterior) = rings.next() else {
            return Ok(None);
        };
        let shell = GeoGeometry::Polygon(GeoPolygon::new(exterior.clone(), vec![]));
        let interiors = rings
            .filter(|ring| {
                let hole = GeoGeometry::Polygon(GeoPolygon::new(ring.clone(), vec![]));
                let inside = relate(&shell, &hole).is_contains();
                if !inside {
                    log::debug!("Dropping interior ring outside of the reshaped exterior");
                }
                inside
            })
            .collect();

        Ok(Some(GeoPolygon::new(exterior, interiors)))
    }

    /// Returns true if `chain` runs along `other`, i.e. the length of its segments lying on `other` is close to
    /// its total length.
    fn is_along(&self, chain: &[Coord], other: &[Coord]) -> bool {
        let tolerance = point_tolerance(other);
        let near = |c: Coord| distance_to_line(c, other) <= tolerance;
        let along: f64 = chain
            .windows(2)
            .filter(|w| near(w[0]) && near(w[1]) && near((w[0] + w[1]) / 2.0))
            .map(line_length)
            .sum();
        if along <= 0.0 {
            return false;
        }

        let ratio = line_length(chain) / along;
        (ratio - 1.0).abs() < self.containment_tolerance
    }
}

fn as_geometry(coords: &[Coord]) -> GeoGeometry<f64> {
    GeoGeometry::LineString(GeoLineString::new(coords.to_vec()))
}

/// Number of decimal digits before the decimal point of the largest bounding box ordinate. `-1` if all of them are
/// zero.
fn significant_digits(coords: &[Coord]) -> i32 {
    let Some(first) = coords.first() else {
        return -1;
    };

    let (min, max) = coords.iter().fold((*first, *first), |(min, max), c| {
        (
            Coord {
                x: min.x.min(c.x),
                y: min.y.min(c.y),
            },
            Coord {
                x: max.x.max(c.x),
                y: max.y.max(c.y),
            },
        )
    });

    [min.x, min.y, max.x, max.y]
        .into_iter()
        .filter(|v| *v != 0.0 && v.is_finite())
        .map(|v| v.abs().log10().ceil() as i32)
        .fold(-1, i32::max)
}

/// Distance under which a point is considered to lie on `line`, scaled to the magnitude of its coordinates.
fn point_tolerance(line: &[Coord]) -> f64 {
    10f64.powi(significant_digits(line) - 11)
}
