//! Polygonization of noded linework.
//!
//! Builds a planar graph of the segments, removes dangling edges and cut edges, and traces the faces of the graph.
//! Counter-clockwise faces are the output polygons. Clockwise rings are outlines of connected components; an
//! outline that lies inside a polygon of another component becomes a hole of the smallest such polygon.

use ahash::{AHashMap, AHashSet};
use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo_types::{Coord, LineString as GeoLineString, Polygon as GeoPolygon};

use super::noding::NodedSegment;
use super::{coord_key, CoordKey};

struct Graph {
    coords: Vec<Coord>,
    /// Half edges. Edge `2k` and `2k + 1` are the two directions of the same segment.
    half_edges: Vec<(usize, usize)>,
    /// Outgoing half edges of every vertex sorted counter-clockwise by angle.
    outgoing: Vec<Vec<usize>>,
    alive: Vec<bool>,
}

impl Graph {
    fn new(segments: &[NodedSegment]) -> Self {
        let mut index: AHashMap<CoordKey, usize> = AHashMap::new();
        let mut coords = vec![];
        let mut vertex = |c: Coord, coords: &mut Vec<Coord>| {
            *index.entry(coord_key(c)).or_insert_with(|| {
                coords.push(c);
                coords.len() - 1
            })
        };

        let mut seen = AHashSet::new();
        let mut half_edges = vec![];
        for segment in segments {
            let u = vertex(segment.start, &mut coords);
            let v = vertex(segment.end, &mut coords);
            if u == v || !seen.insert((u.min(v), u.max(v))) {
                continue;
            }

            half_edges.push((u, v));
            half_edges.push((v, u));
        }

        let mut outgoing = vec![vec![]; coords.len()];
        for (h, (from, _)) in half_edges.iter().enumerate() {
            outgoing[*from].push(h);
        }

        let angle = |h: usize| {
            let (from, to) = half_edges[h];
            let (a, b) = (coords[from], coords[to]);
            (b.y - a.y).atan2(b.x - a.x)
        };
        for edges in &mut outgoing {
            edges.sort_by(|a, b| angle(*a).total_cmp(&angle(*b)));
        }

        let alive = vec![true; half_edges.len() / 2];
        Self {
            coords,
            half_edges,
            outgoing,
            alive,
        }
    }

    fn is_alive(&self, h: usize) -> bool {
        self.alive[h / 2]
    }

    fn degree(&self, vertex: usize) -> usize {
        self.outgoing[vertex]
            .iter()
            .filter(|h| self.is_alive(**h))
            .count()
    }

    fn prune_dangles(&mut self) {
        let mut queue: Vec<usize> = (0..self.coords.len())
            .filter(|v| self.degree(*v) == 1)
            .collect();

        while let Some(v) = queue.pop() {
            let Some(h) = self.outgoing[v]
                .iter()
                .copied()
                .find(|h| self.is_alive(*h))
            else {
                continue;
            };

            self.alive[h / 2] = false;
            let other = self.half_edges[h].1;
            if self.degree(other) == 1 {
                queue.push(other);
            }
        }
    }

    /// Next half edge of the face to the left of `h`.
    fn next(&self, h: usize) -> Option<usize> {
        let vertex = self.half_edges[h].1;
        let sym = h ^ 1;
        let edges: Vec<usize> = self.outgoing[vertex]
            .iter()
            .copied()
            .filter(|e| self.is_alive(*e))
            .collect();
        let pos = edges.iter().position(|e| *e == sym)?;
        Some(edges[(pos + edges.len() - 1) % edges.len()])
    }

    fn trace_rings(&self) -> (Vec<Vec<usize>>, Vec<Option<usize>>) {
        let mut ring_of = vec![None; self.half_edges.len()];
        let mut rings = vec![];

        for start in 0..self.half_edges.len() {
            if !self.is_alive(start) || ring_of[start].is_some() {
                continue;
            }

            let mut ring = vec![];
            let mut current = start;
            loop {
                ring_of[current] = Some(rings.len());
                ring.push(current);
                match self.next(current) {
                    Some(next) if next != start && ring_of[next].is_none() => current = next,
                    _ => break,
                }
            }
            rings.push(ring);
        }

        (rings, ring_of)
    }

    fn ring_coords(&self, ring: &[usize]) -> Vec<Coord> {
        let mut coords: Vec<Coord> = ring
            .iter()
            .map(|h| self.coords[self.half_edges[*h].0])
            .collect();
        if let Some(first) = coords.first().copied() {
            coords.push(first);
        }
        coords
    }
}

fn signed_area(coords: &[Coord]) -> f64 {
    coords
        .windows(2)
        .map(|w| w[0].x * w[1].y - w[1].x * w[0].y)
        .sum::<f64>()
        / 2.0
}

fn bbox(coords: &[Coord]) -> (Coord, Coord) {
    coords.iter().fold(
        (
            Coord {
                x: f64::INFINITY,
                y: f64::INFINITY,
            },
            Coord {
                x: f64::NEG_INFINITY,
                y: f64::NEG_INFINITY,
            },
        ),
        |(min, max), c| {
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
        },
    )
}

struct Shell {
    ring: GeoLineString<f64>,
    area: f64,
    bbox: (Coord, Coord),
    vertices: AHashSet<CoordKey>,
    holes: Vec<GeoLineString<f64>>,
}

/// Builds polygons from the faces of noded linework.
pub(crate) fn polygonize(segments: &[NodedSegment]) -> Vec<GeoPolygon<f64>> {
    let mut graph = Graph::new(segments);
    graph.prune_dangles();

    let rings = loop {
        let (rings, ring_of) = graph.trace_rings();
        let cut_edges: Vec<usize> = (0..graph.alive.len())
            .filter(|k| graph.alive[*k] && ring_of[2 * k] == ring_of[2 * k + 1])
            .collect();
        if cut_edges.is_empty() {
            break rings;
        }

        log::trace!("Removing {} cut edges before polygonization", cut_edges.len());
        for k in cut_edges {
            graph.alive[k] = false;
        }
        graph.prune_dangles();
    };

    let mut shells = vec![];
    let mut holes = vec![];
    for ring in &rings {
        let coords = graph.ring_coords(ring);
        if coords.len() < 4 {
            continue;
        }

        let area = signed_area(&coords);
        if area > 0.0 {
            shells.push(Shell {
                bbox: bbox(&coords),
                vertices: coords.iter().map(|c| coord_key(*c)).collect(),
                ring: GeoLineString::new(coords),
                area,
                holes: vec![],
            });
        } else if area < 0.0 {
            holes.push(coords);
        }
    }

    for hole in holes {
        let (min, max) = bbox(&hole);
        let mut best: Option<usize> = None;
        for (i, shell) in shells.iter().enumerate() {
            let (smin, smax) = shell.bbox;
            if smin.x > min.x || smin.y > min.y || smax.x < max.x || smax.y < max.y {
                continue;
            }

            let Some(test) = hole
                .iter()
                .find(|c| !shell.vertices.contains(&coord_key(**c)))
            else {
                continue;
            };

            let polygon = GeoPolygon::new(shell.ring.clone(), vec![]);
            if polygon.coordinate_position(test) != CoordPos::Inside {
                continue;
            }

            if best.map_or(true, |b| shells[b].area > shell.area) {
                best = Some(i);
            }
        }

        if let Some(b) = best {
            shells[b].holes.push(GeoLineString::new(hole));
        }
    }

    shells
        .into_iter()
        .map(|shell| GeoPolygon::new(shell.ring, shell.holes))
        .collect()
}
