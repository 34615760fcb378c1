//! Geometry model for vector editing.
//!
//! The types in this crate form a plain ownership tree: a [`Geometry`] owns its parts, a [`Polygon`] owns its rings
//! and a [`LineString`] owns its vertices. Every vertex carries optional `z` and `m` ordinates, and every line
//! carries the [`CoordDims`] flags shared by all of its vertices.
//!
//! [`EditableGeometry`] wraps a geometry together with a generation number that changes every time the geometry is
//! modified, which lets consumers keep derived data (like spatial indices or kernel representations) and know
//! exactly when it goes stale.

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

mod point;
pub use point::*;

mod line_string;
pub use line_string::*;

mod polygon;
pub use polygon::*;

mod multi_point;
pub use multi_point::*;

mod multi_line_string;
pub use multi_line_string::*;

mod multi_polygon;
pub use multi_polygon::*;

mod collection;
pub use collection::*;

mod geometry;
pub use geometry::*;

pub mod editable;
pub use editable::{EditableGeometry, GeometryEdit};

pub mod error;
pub mod geometry_type;
pub mod rect;
