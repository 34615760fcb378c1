//! Noding of linework.
//!
//! After noding, every point where two input segments meet is a vertex of both of them, and no two output
//! segments overlap. Overlapping pieces of different inputs are reported once, with the origins of all inputs that
//! contributed them.

use ahash::AHashMap;
use geo::line_intersection::{line_intersection, LineIntersection};
use geo_types::{Coord, Line};

use super::{coord_key, CoordKey};

/// Segment comes from the first input.
pub(crate) const ORIGIN_A: u8 = 1;
/// Segment comes from the second input.
pub(crate) const ORIGIN_B: u8 = 2;

/// Relative tolerance used to merge intersection points computed from different pairs of segments.
const SNAP_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct NodedSegment {
    pub start: Coord,
    pub end: Coord,
    pub origin: u8,
}

impl NodedSegment {
    pub fn midpoint(&self) -> Coord {
        Coord {
            x: (self.start.x + self.end.x) / 2.0,
            y: (self.start.y + self.end.y) / 2.0,
        }
    }

    pub fn length(&self) -> f64 {
        (self.end.x - self.start.x).hypot(self.end.y - self.start.y)
    }

    pub fn is_from(&self, origin: u8) -> bool {
        self.origin & origin != 0
    }
}

fn segment_key(a: Coord, b: Coord) -> (CoordKey, CoordKey) {
    let (ka, kb) = (coord_key(a), coord_key(b));
    if ka <= kb {
        (ka, kb)
    } else {
        (kb, ka)
    }
}

#[derive(Debug, Copy, Clone)]
struct RawSegment {
    start: Coord,
    end: Coord,
    origin: u8,
}

impl RawSegment {
    fn line(&self) -> Line<f64> {
        Line::new(self.start, self.end)
    }

    fn min_x(&self) -> f64 {
        self.start.x.min(self.end.x)
    }

    fn max_x(&self) -> f64 {
        self.start.x.max(self.end.x)
    }

    fn min_y(&self) -> f64 {
        self.start.y.min(self.end.y)
    }

    fn max_y(&self) -> f64 {
        self.start.y.max(self.end.y)
    }

    fn param(&self, p: Coord) -> f64 {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        ((p.x - self.start.x) * dx + (p.y - self.start.y) * dy) / (dx * dx + dy * dy)
    }
}

/// Grid index that returns an already known point when a new one is within the tolerance from it.
struct SnapIndex {
    tolerance: f64,
    cells: AHashMap<(i64, i64), Vec<Coord>>,
}

impl SnapIndex {
    fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            cells: AHashMap::new(),
        }
    }

    fn cell(&self, c: Coord) -> (i64, i64) {
        (
            (c.x / self.tolerance).floor() as i64,
            (c.y / self.tolerance).floor() as i64,
        )
    }

    fn insert(&mut self, c: Coord) {
        let cell = self.cell(c);
        let entry = self.cells.entry(cell).or_default();
        if !entry.contains(&c) {
            entry.push(c);
        }
    }

    fn snap(&mut self, c: Coord) -> Coord {
        let (cx, cy) = self.cell(c);
        let tolerance_sq = self.tolerance * self.tolerance;
        let mut best: Option<(f64, Coord)> = None;
        for x in cx - 1..=cx + 1 {
            for y in cy - 1..=cy + 1 {
                let Some(points) = self.cells.get(&(x, y)) else {
                    continue;
                };
                for p in points {
                    let d = (p.x - c.x).powi(2) + (p.y - c.y).powi(2);
                    if d <= tolerance_sq && best.map_or(true, |(bd, _)| d < bd) {
                        best = Some((d, *p));
                    }
                }
            }
        }

        match best {
            Some((_, p)) => p,
            None => {
                self.insert(c);
                c
            }
        }
    }
}

/// Nodes the given lines. Each line is given with the origin flag of its input.
///
/// Output segments keep the direction of the input segment they come from and are listed in input order.
pub(crate) fn node<'a>(lines: impl IntoIterator<Item = (&'a [Coord], u8)>) -> Vec<NodedSegment> {
    let mut raw = vec![];
    let mut scale = 0.0f64;
    for (coords, origin) in lines {
        for c in coords {
            scale = scale.max(c.x.abs()).max(c.y.abs());
        }

        for w in coords.windows(2) {
            if w[0] != w[1] {
                raw.push(RawSegment {
                    start: w[0],
                    end: w[1],
                    origin,
                });
            }
        }
    }

    let mut index = SnapIndex::new(scale.max(1.0) * SNAP_TOLERANCE);
    for segment in &raw {
        index.insert(segment.start);
        index.insert(segment.end);
    }

    let mut splits: Vec<Vec<Coord>> = vec![vec![]; raw.len()];
    let mut order: Vec<usize> = (0..raw.len()).collect();
    order.sort_by(|a, b| raw[*a].min_x().total_cmp(&raw[*b].min_x()));

    for (pos, &i) in order.iter().enumerate() {
        let si = raw[i];
        for &j in &order[pos + 1..] {
            let sj = raw[j];
            if sj.min_x() > si.max_x() {
                break;
            }
            if sj.min_y() > si.max_y() || sj.max_y() < si.min_y() {
                continue;
            }

            match line_intersection(si.line(), sj.line()) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    let p = index.snap(intersection);
                    splits[i].push(p);
                    splits[j].push(p);
                }
                Some(LineIntersection::Collinear { intersection }) => {
                    for p in [intersection.start, intersection.end] {
                        let p = index.snap(p);
                        splits[i].push(p);
                        splits[j].push(p);
                    }
                }
                None => {}
            }
        }
    }

    let mut result: Vec<NodedSegment> = vec![];
    let mut seen: AHashMap<(CoordKey, CoordKey), usize> = AHashMap::new();
    let mut push = |start: Coord, end: Coord, origin: u8| {
        let key = segment_key(start, end);
        match seen.get(&key) {
            Some(&idx) => result[idx].origin |= origin,
            None => {
                seen.insert(key, result.len());
                result.push(NodedSegment { start, end, origin });
            }
        }
    };

    for (segment, mut points) in raw.iter().zip(splits) {
        points.retain(|p| *p != segment.start && *p != segment.end);
        points.sort_by(|a, b| segment.param(*a).total_cmp(&segment.param(*b)));
        points.dedup();

        let mut prev = segment.start;
        for p in points.into_iter().chain(std::iter::once(segment.end)) {
            if p != prev {
                push(prev, p, segment.origin);
                prev = p;
            }
        }
    }

    result
}

/// Number of segments incident to every vertex.
pub(crate) fn vertex_degrees(segments: &[NodedSegment]) -> AHashMap<CoordKey, usize> {
    let mut degrees = AHashMap::new();
    for segment in segments {
        *degrees.entry(coord_key(segment.start)).or_insert(0) += 1;
        *degrees.entry(coord_key(segment.end)).or_insert(0) += 1;
    }

    degrees
}
