use crate::config::EngineConfig;

/// Engine-wide immutable services.
///
/// This is intentionally small and stable.
/// Extend via Resources if you need typed APIs.
pub trait Services: Send + Sync {
    fn logger(&self) -> &dyn log::Log;

    /// Per-module settings table from the engine config.
    fn module_data(&self, _id: &str) -> Option<&toml::Value> {
        None
    }
}

/// Default engine services implementation backed by a loaded `EngineConfig`.
pub struct EngineServices {
    config: EngineConfig,
}

impl EngineServices {
    #[inline]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Services for EngineServices {
    #[inline(always)]
    fn logger(&self) -> &dyn log::Log {
        log::logger()
    }

    fn module_data(&self, id: &str) -> Option<&toml::Value> {
        self.config.module_data(id)
    }
}
