//! Merging of lines into maximal chains.
//!
//! Lines are joined at the points where exactly two of them meet. A merged chain takes the direction of the
//! majority of the lines it was made of.

use ahash::AHashMap;
use geo_types::{Coord, Geometry as GeoGeometry, LineString as GeoLineString};

use super::{coord_key, CoordKey, Components};

struct Merger<'a, L> {
    edges: &'a [L],
    incidence: AHashMap<CoordKey, Vec<(usize, bool)>>,
    visited: Vec<bool>,
}

impl<'a, L: AsRef<[Coord]>> Merger<'a, L> {
    fn coords(&self, edge: usize) -> &'a [Coord] {
        self.edges[edge].as_ref()
    }

    fn degree(&self, c: Coord) -> usize {
        self.incidence.get(&coord_key(c)).map_or(0, |v| v.len())
    }

    fn walk(
        &mut self,
        first: usize,
        from_start: bool,
        stops: &impl Fn(&Self, Coord) -> bool,
    ) -> (usize, Vec<Coord>) {
        let mut coords: Vec<Coord> = vec![];
        let mut forward = 0;
        let mut reverse = 0;
        let mut min_index = first;
        let mut edge = first;
        let mut forward_dir = from_start;

        loop {
            self.visited[edge] = true;
            min_index = min_index.min(edge);

            let edge_coords = self.coords(edge);
            let skip = !coords.is_empty() as usize;
            if forward_dir {
                forward += 1;
                coords.extend(edge_coords.iter().skip(skip));
            } else {
                reverse += 1;
                coords.extend(edge_coords.iter().rev().skip(skip));
            }

            let Some(end) = coords.last().copied() else {
                break;
            };
            if stops(self, end) {
                break;
            }

            let next = self
                .incidence
                .get(&coord_key(end))
                .and_then(|v| v.iter().find(|(j, _)| !self.visited[*j]).copied());
            match next {
                Some((j, starts_here)) => {
                    edge = j;
                    forward_dir = starts_here;
                }
                None => break,
            }
        }

        if reverse > forward {
            coords.reverse();
        }

        (min_index, coords)
    }
}

/// Merges the lines into maximal chains. Besides the points where other than two lines meet, chains are always
/// broken at the points for which `is_node` returns true.
///
/// Chains are returned in the order of the first input line they contain.
pub(crate) fn merge_lines<L: AsRef<[Coord]>>(
    lines: &[L],
    is_node: impl Fn(Coord) -> bool,
) -> Vec<Vec<Coord>> {
    let mut merger = Merger {
        edges: lines,
        incidence: AHashMap::new(),
        visited: vec![false; lines.len()],
    };

    for (i, line) in lines.iter().enumerate() {
        let coords = line.as_ref();
        match (coords.first(), coords.last()) {
            (Some(first), Some(last)) if coords.len() >= 2 => {
                merger
                    .incidence
                    .entry(coord_key(*first))
                    .or_default()
                    .push((i, true));
                merger
                    .incidence
                    .entry(coord_key(*last))
                    .or_default()
                    .push((i, false));
            }
            _ => merger.visited[i] = true,
        }
    }

    let stops = |merger: &Merger<'_, L>, c: Coord| merger.degree(c) != 2 || is_node(c);
    let mut chains = vec![];

    for i in 0..lines.len() {
        for at_start in [true, false] {
            if merger.visited[i] {
                break;
            }

            let coords = merger.coords(i);
            let node = if at_start {
                coords[0]
            } else {
                coords[coords.len() - 1]
            };
            if stops(&merger, node) {
                chains.push(merger.walk(i, at_start, &stops));
            }
        }
    }

    for i in 0..lines.len() {
        if !merger.visited[i] {
            chains.push(merger.walk(i, true, &stops));
        }
    }

    chains.sort_by_key(|(min_index, _)| *min_index);
    chains.into_iter().map(|(_, coords)| coords).collect()
}

/// Merges the linear components of the geometry. Other components are ignored.
pub(crate) fn line_merge(geometry: &GeoGeometry<f64>) -> GeoGeometry<f64> {
    let components = Components::of(geometry);
    let lines: Vec<&[Coord]> = components.lines.iter().map(|l| &l.0[..]).collect();
    Components {
        lines: merge_lines(&lines, |_| false)
            .into_iter()
            .map(GeoLineString::new)
            .collect(),
        ..Default::default()
    }
    .into_geometry()
}
