//! Process-wide state of the geometry kernel.

use std::sync::OnceLock;

use parking_lot::RwLock;

static INSTANCE: OnceLock<KernelRuntime> = OnceLock::new();

/// Receiver of the diagnostic messages reported by the kernel.
pub trait KernelMessageHandler {
    /// Informational message, e.g. a rejected degenerate input.
    fn notice(&self, message: &str);
    /// Internal kernel failure that was caught at the kernel boundary.
    fn error(&self, message: &str);
}

/// Handler that forwards kernel messages to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMessageHandler;

impl KernelMessageHandler for LogMessageHandler {
    fn notice(&self, message: &str) {
        log::debug!("Geometry kernel notice: {message}");
    }

    fn error(&self, message: &str) {
        log::error!("Geometry kernel error: {message}");
    }
}

/// Kernel runtime singleton holding the message handlers.
///
/// The runtime is created either explicitly with [`KernelRuntime::initialize`] or lazily with
/// [`LogMessageHandler`] on the first kernel call.
pub struct KernelRuntime {
    handler: RwLock<Box<dyn KernelMessageHandler + Send + Sync>>,
}

impl KernelRuntime {
    /// Initializes the runtime with the given handler.
    ///
    /// If the runtime was already created, the handler replaces the current one.
    pub fn initialize(handler: impl KernelMessageHandler + Send + Sync + 'static) {
        if let Some(runtime) = INSTANCE.get() {
            log::warn!("Kernel runtime is already initialized. Replacing the message handler.");
            *runtime.handler.write() = Box::new(handler);
            return;
        }

        let mut handler = Some(handler);
        let runtime = INSTANCE.get_or_init(|| {
            log::debug!("Initializing geometry kernel runtime");
            let handler: Box<dyn KernelMessageHandler + Send + Sync> = match handler.take() {
                Some(handler) => Box::new(handler),
                None => Box::new(LogMessageHandler),
            };
            Self {
                handler: RwLock::new(handler),
            }
        });

        // Lost the race against a lazy initialization on another thread.
        if let Some(handler) = handler {
            *runtime.handler.write() = Box::new(handler);
        }
    }

    /// Returns the runtime, creating it with the default handler if it was not initialized yet.
    pub fn instance() -> &'static Self {
        INSTANCE.get_or_init(|| {
            log::debug!("Initializing geometry kernel runtime with default handler");
            Self {
                handler: RwLock::new(Box::new(LogMessageHandler)),
            }
        })
    }

    /// Restores the default handler, releasing the one that was set with [`KernelRuntime::initialize`].
    pub fn finish() {
        if let Some(runtime) = INSTANCE.get() {
            log::debug!("Finishing geometry kernel runtime");
            *runtime.handler.write() = Box::new(LogMessageHandler);
        }
    }

    /// Reports an informational message.
    pub fn notice(&self, message: &str) {
        self.handler.read().notice(message);
    }

    /// Reports a kernel failure.
    pub fn error(&self, message: &str) {
        self.handler.read().error(message);
    }
}
