use crate::frame::Frame;
use crate::module::{Bus, Resources, Services};
use crate::sync::ShutdownToken;

/// Context passed to modules.
///
/// This prevents modules from taking `&mut Engine`.
pub struct ModuleCtx<'a, E: Send + 'static> {
    services: &'a dyn Services,
    resources: &'a mut Resources,
    bus: &'a Bus<E>,
    shutdown: &'a ShutdownToken,
    exit: &'a mut bool,

    frame: Option<Frame>,
}

impl<'a, E: Send + 'static> ModuleCtx<'a, E> {
    #[inline]
    pub(crate) fn new(
        services: &'a dyn Services,
        resources: &'a mut Resources,
        bus: &'a Bus<E>,
        shutdown: &'a ShutdownToken,
        exit: &'a mut bool,
    ) -> Self {
        Self {
            services,
            resources,
            bus,
            shutdown,
            exit,
            frame: None,
        }
    }

    #[inline]
    pub(crate) fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = Some(frame);
        self
    }

    #[inline]
    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    #[inline]
    pub fn services(&self) -> &dyn Services {
        self.services
    }

    #[inline]
    pub fn resources(&mut self) -> &mut Resources {
        self.resources
    }

    /// Commands queue (single-consumer by rules).
    #[inline]
    pub fn bus(&self) -> &Bus<E> {
        self.bus
    }

    /// Settings table for a module id, taken from the engine config.
    #[inline]
    pub fn module_data(&self, id: &str) -> Option<&toml::Value> {
        self.services.module_data(id)
    }

    #[inline]
    pub fn request_exit(&mut self) {
        *self.exit = true;
    }

    #[inline]
    pub fn is_exit_requested(&self) -> bool {
        *self.exit || self.shutdown.is_requested()
    }
}
