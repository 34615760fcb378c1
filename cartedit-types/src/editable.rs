//! Geometry with change tracking.
//!
//! All mutable access to the geometry goes through [`GeometryEdit`]. When the geometry is modified through
//! [`AsMut::as_mut`] or replaced with [`GeometryEdit::replace`], the owning [`EditableGeometry`] receives a new
//! generation number. Anything derived from the geometry can store the generation it was built from and compare it
//! with [`EditableGeometry::generation`] to find out if it must be rebuilt.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::Geometry;

static GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Geometry with a generation number that changes on every modification.
///
/// Generation numbers are unique in the process, so two different editable geometries never share one.
#[derive(Debug, Deserialize, Serialize)]
pub struct EditableGeometry {
    geometry: Geometry,
    #[serde(skip, default = "next_generation")]
    generation: u64,
}

impl EditableGeometry {
    /// Wraps the geometry.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            generation: next_generation(),
        }
    }

    /// Current generation of the geometry.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns a container that gives mutable access to the geometry.
    pub fn edit(&mut self) -> GeometryEdit<'_> {
        GeometryEdit {
            entry: self,
            is_updated: false,
        }
    }

    /// Consumes the wrapper and returns the geometry.
    pub fn into_inner(self) -> Geometry {
        self.geometry
    }
}

impl Clone for EditableGeometry {
    fn clone(&self) -> Self {
        Self::new(self.geometry.clone())
    }
}

impl AsRef<Geometry> for EditableGeometry {
    fn as_ref(&self) -> &Geometry {
        &self.geometry
    }
}

impl From<Geometry> for EditableGeometry {
    fn from(value: Geometry) -> Self {
        Self::new(value)
    }
}

/// Mutable container for the geometry of an [`EditableGeometry`].
///
/// Reference to the container can be converted into a reference to the geometry using [`AsRef`] and [`AsMut`]
/// traits. Only [`AsMut`] access marks the geometry as changed.
pub struct GeometryEdit<'a> {
    entry: &'a mut EditableGeometry,
    is_updated: bool,
}

impl GeometryEdit<'_> {
    /// Returns true if the geometry was accessed mutably through this container.
    pub fn is_updated(&self) -> bool {
        self.is_updated
    }

    /// Replaces the geometry with a new one.
    pub fn replace(&mut self, geometry: Geometry) -> Geometry {
        std::mem::replace(self.as_mut(), geometry)
    }
}

impl AsRef<Geometry> for GeometryEdit<'_> {
    fn as_ref(&self) -> &Geometry {
        &self.entry.geometry
    }
}

impl AsMut<Geometry> for GeometryEdit<'_> {
    fn as_mut(&mut self) -> &mut Geometry {
        if !self.is_updated {
            self.entry.generation = next_generation();
        }

        self.is_updated = true;
        &mut self.entry.geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LineString, Point};

    fn line() -> Geometry {
        LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]).into()
    }

    #[test]
    fn read_access_keeps_generation() {
        let mut geometry = EditableGeometry::new(line());
        let generation = geometry.generation();
        {
            let edit = geometry.edit();
            assert_eq!(edit.as_ref().num_parts(), 1);
            assert!(!edit.is_updated());
        }
        assert_eq!(geometry.generation(), generation);
    }

    #[test]
    fn mutable_access_changes_generation_once() {
        let mut geometry = EditableGeometry::new(line());
        let generation = geometry.generation();
        let after_first = {
            let mut edit = geometry.edit();
            if let Geometry::LineString(l) = edit.as_mut() {
                l.push(Point::new(2.0, 0.0));
            }
            let after_first = edit.entry.generation;
            let _ = edit.as_mut();
            assert_eq!(edit.entry.generation, after_first);
            after_first
        };
        assert_ne!(generation, after_first);
        assert_eq!(geometry.generation(), after_first);
    }

    #[test]
    fn clones_get_own_generation() {
        let geometry = EditableGeometry::new(line());
        let clone = geometry.clone();
        assert_ne!(geometry.generation(), clone.generation());
        assert_eq!(geometry.as_ref(), clone.as_ref());
    }

    #[test]
    fn replace_returns_old_geometry() {
        let mut geometry = EditableGeometry::new(line());
        let generation = geometry.generation();
        let old = geometry.edit().replace(Point::new(5.0, 5.0).into());
        assert_eq!(old, line());
        assert_ne!(geometry.generation(), generation);
    }

    #[test]
    fn deserialized_geometry_gets_new_generation() {
        let geometry = EditableGeometry::new(
            LineString::new(vec![Point::new_zm(0.0, 0.0, 10.0, 1.0), Point::new_zm(1.0, 1.0, 12.5, 2.0)]).into(),
        );
        let json = serde_json::to_string(&geometry).unwrap();
        assert!(!json.contains("generation"));

        let restored: EditableGeometry = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.as_ref(), geometry.as_ref());
        assert_ne!(restored.generation(), geometry.generation());
    }
}
