use std::cell::RefCell;
use std::rc::Rc;

use cartedit_types::{EditableGeometry, Geometry, GeometryEdit};
use geo_types::Geometry as GeoGeometry;

use crate::adapter::{from_kernel, to_kernel};
use crate::error::EngineError;
use crate::kernel::prepared::PreparedGeometry;
use crate::kernel::KernelGeometry;
use crate::options::EngineOptions;

mod builder;
pub use builder::GeometryEngineBuilder;

/// Kernel representation of the engine geometry, valid for one generation of the geometry.
#[derive(Default)]
struct HandleCache {
    generation: Option<u64>,
    handle: Option<Rc<KernelGeometry>>,
    prepared: Option<Rc<PreparedGeometry>>,
}

/// Geometry engine operating on a single geometry.
///
/// The engine converts its geometry into the kernel representation on first use and keeps it until the geometry
/// is modified through [`GeometryEngine::edit`]. All operations take `&self`: the cache is rebuilt lazily behind
/// interior mutability, so an engine must not be shared between threads. Use one engine per thread instead.
///
/// Every operation that needs the engine geometry fails with [`EngineError::MissingGeometry`] if the geometry is
/// empty.
pub struct GeometryEngine {
    geometry: EditableGeometry,
    options: EngineOptions,
    cache: RefCell<HandleCache>,
}

impl GeometryEngine {
    /// Creates a new engine with default options.
    pub fn new(geometry: Geometry) -> Self {
        Self::with_options(geometry, EngineOptions::default())
    }

    /// Creates a new engine with the given options.
    pub fn with_options(geometry: impl Into<EditableGeometry>, options: EngineOptions) -> Self {
        Self {
            geometry: geometry.into(),
            options,
            cache: RefCell::new(HandleCache::default()),
        }
    }

    /// Geometry of the engine.
    pub fn geometry(&self) -> &Geometry {
        self.geometry.as_ref()
    }

    /// Returns the container to modify the geometry. Any mutable access invalidates the cached kernel
    /// representation and the prepared geometry.
    pub fn edit(&mut self) -> GeometryEdit<'_> {
        self.geometry.edit()
    }

    /// Replaces the geometry of the engine, returning the old one.
    pub fn set_geometry(&mut self, geometry: Geometry) -> Geometry {
        self.geometry.edit().replace(geometry)
    }

    /// Options of the engine.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Consumes the engine and returns its geometry.
    pub fn into_geometry(self) -> Geometry {
        self.geometry.into_inner()
    }

    /// Returns the kernel representation of the engine geometry, building it if the geometry changed since the
    /// last call.
    pub(crate) fn handle(&self) -> Result<Rc<KernelGeometry>, EngineError> {
        let generation = self.geometry.generation();
        let mut cache = self.cache.borrow_mut();
        if cache.generation == Some(generation) {
            if let Some(handle) = &cache.handle {
                return Ok(handle.clone());
            }
        }

        if cache.prepared.is_some() {
            log::debug!("Engine geometry changed, dropping prepared geometry");
        }
        cache.prepared = None;
        cache.handle = None;
        cache.generation = Some(generation);

        if self.geometry().is_empty() {
            return Err(EngineError::MissingGeometry);
        }

        log::debug!(
            "Building kernel geometry for {} (generation {generation})",
            self.geometry().kind()
        );
        let handle = Rc::new(to_kernel(self.geometry(), self.options.precision)?);
        cache.handle = Some(handle.clone());
        Ok(handle)
    }

    /// Prepared representation of the engine geometry, if [`GeometryEngine::prepare`] was called since the
    /// geometry was last changed.
    pub(crate) fn prepared(&self) -> Option<Rc<PreparedGeometry>> {
        let cache = self.cache.borrow();
        if cache.generation == Some(self.geometry.generation()) {
            cache.prepared.clone()
        } else {
            None
        }
    }

    /// Builds the prepared geometry used to speed up repeated relation queries.
    ///
    /// The prepared geometry is dropped when the engine geometry is modified.
    pub fn prepare(&self) -> Result<(), EngineError> {
        let handle = self.handle()?;
        let prepared = crate::kernel::guard("prepare", || PreparedGeometry::new(handle.geometry()))?;
        log::debug!("Prepared engine geometry");
        self.cache.borrow_mut().prepared = Some(Rc::new(prepared));
        Ok(())
    }

    /// Returns true if relation queries currently go through the prepared geometry.
    pub fn is_prepared(&self) -> bool {
        self.prepared().is_some()
    }

    /// Converts an argument geometry into the kernel representation with the engine precision.
    ///
    /// Unlike the engine geometry, an empty argument is accepted and converted into an empty collection: it is the
    /// empty point set, so overlays and relations with it are well defined. Arguments that cannot be represented
    /// in the kernel, such as rings with too few points or non-finite coordinates, fail with
    /// [`EngineError::Conversion`].
    pub(crate) fn kernel_of(&self, geometry: &Geometry) -> Result<KernelGeometry, EngineError> {
        to_kernel(geometry, self.options.precision)
    }

    /// Converts a kernel result computed from `sources` back into the model.
    pub(crate) fn result(
        &self,
        geometry: GeoGeometry<f64>,
        sources: &[&KernelGeometry],
    ) -> Result<Geometry, EngineError> {
        from_kernel(&KernelGeometry::derived(geometry, sources))
    }
}
