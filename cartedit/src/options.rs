//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Default number of segments used to approximate a quarter of a circle.
pub const DEFAULT_QUADRANT_SEGMENTS: u32 = 8;

/// Parameters of a [`GeometryEngine`](crate::GeometryEngine).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Size of the grid the coordinates are snapped to before they are passed to the kernel. `0` disables
    /// snapping.
    pub precision: f64,
    /// Half-width of the band around `1.0` that the area ratio of a polygon split fragment must fall into for the
    /// fragment to be accepted. The band is exclusive on both ends.
    pub split_area_tolerance: f64,
    /// Number of segments used to approximate a quarter of a circle in buffers.
    pub quadrant_segments: u32,
    /// Half-width of the band around `1.0` that the length ratio must fall into for one line to be considered
    /// lying along another one during reshape.
    pub line_containment_tolerance: f64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            precision: 0.0,
            split_area_tolerance: 0.01,
            quadrant_segments: DEFAULT_QUADRANT_SEGMENTS,
            line_containment_tolerance: 0.1,
        }
    }
}

/// Shape of the buffer at the ends of lines.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndCapStyle {
    /// Half circle around the end point.
    #[default]
    Round,
    /// The buffer ends exactly at the end point.
    Flat,
    /// The buffer is extended past the end point by the buffer distance.
    Square,
}

/// Shape of the buffer or offset curve at the vertices where the line turns.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinStyle {
    /// Arc around the vertex.
    #[default]
    Round,
    /// Sharp corner, limited by the mitre limit.
    Mitre,
    /// The corner is cut off.
    Bevel,
}

/// Parameters of buffer and offset curve computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BufferParameters {
    /// Number of segments used to approximate a quarter of a circle.
    pub quadrant_segments: u32,
    /// End cap style.
    pub end_cap: EndCapStyle,
    /// Join style.
    pub join: JoinStyle,
    /// Largest allowed distance from a vertex to the mitre corner, as a multiple of the buffer distance. Corners
    /// further away are beveled.
    pub mitre_limit: f64,
}

impl Default for BufferParameters {
    fn default() -> Self {
        Self {
            quadrant_segments: DEFAULT_QUADRANT_SEGMENTS,
            end_cap: EndCapStyle::Round,
            join: JoinStyle::Round,
            mitre_limit: 5.0,
        }
    }
}
