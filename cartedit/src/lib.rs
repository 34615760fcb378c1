//! Cartedit is a vector geometry engine for editing tools. It wraps a single geometry of the
//! [`cartedit_types`] model and answers questions about it (relations, measures, validity), combines it with other
//! geometries (intersection, union, difference) and edits it (split by a line, reshape along a path).
//!
//! # Quick start
//!
//! ```
//! use cartedit::GeometryEngine;
//! use cartedit::cartedit_types::{LineString, Point, Polygon};
//!
//! let square = Polygon::new(
//!     LineString::from(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)]),
//!     vec![],
//! );
//! let engine = GeometryEngine::new(square.into());
//!
//! let outcome = engine
//!     .split_geometry(&[Point::new(2.0, -1.0), Point::new(2.0, 5.0)], false)
//!     .expect("the square is cut in two");
//! assert_eq!(outcome.geometries.len(), 2);
//! ```
//!
//! # Main components
//!
//! * [`GeometryEngine`] owns the geometry and keeps its kernel representation cached until the geometry changes.
//!   It can be created directly or with [`GeometryEngineBuilder`] when non-default [`EngineOptions`] are needed.
//! * The [`kernel`] implements the planar algorithms on top of the `geo` crate: overlay, noding, polygonization,
//!   relate, validity, buffers. Every kernel call is guarded so that an internal failure becomes an
//!   [`EngineError::Kernel`] instead of a panic.
//! * The [`adapter`] converts geometries between the model and the kernel, snapping coordinates to the precision
//!   grid and keeping `z` and `m` ordinates.
//!
//! Split and reshape report failures with [`EngineError`] variants that carry stable numeric
//! [codes](EngineError::code), so editing tools can tell "nothing to split" from "the result is invalid".

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod adapter;
mod derived;
mod engine;
pub mod error;
mod fragments;
pub mod kernel;
pub mod options;
mod overlay;
mod predicate;
mod reshape;
mod split;

pub use engine::{GeometryEngine, GeometryEngineBuilder};
pub use error::EngineError;
pub use kernel::relate::RelateMatrix;
pub use kernel::runtime::{KernelMessageHandler, KernelRuntime, LogMessageHandler};
pub use kernel::KernelGeometry;
pub use options::{BufferParameters, EndCapStyle, EngineOptions, JoinStyle};
pub use split::SplitOutcome;

// Reexport cartedit_types
pub use cartedit_types;

#[cfg(test)]
mod tests;
