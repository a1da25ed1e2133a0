use newengine_core::{EngineResult, Module, ModuleCtx};

pub const MODULE_ID: &str = "logging";

const DEFAULT_FILTER: &str = "info";

/// Installs `env_logger` behind the `log` facade.
///
/// `RUST_LOG` wins over `filter`. Safe to call more than once; only the first
/// call installs a logger.
pub fn init_logging(filter: &str) -> bool {
    let env = env_logger::Env::default().default_filter_or(filter.to_string());
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .is_test(false)
        .try_init()
        .is_ok()
}

/// Engine module form of `init_logging`, reading `filter` from its config table.
pub struct LoggingModule {
    filter: Option<String>,
}

impl LoggingModule {
    #[inline]
    pub fn new() -> Self {
        Self { filter: None }
    }

    #[inline]
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self {
            filter: Some(filter.into()),
        }
    }
}

impl Default for LoggingModule {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Send + 'static> Module<E> for LoggingModule {
    fn id(&self) -> &'static str {
        MODULE_ID
    }

    fn init(&mut self, ctx: &mut ModuleCtx<'_, E>) -> EngineResult<()> {
        let filter = self
            .filter
            .clone()
            .or_else(|| {
                ctx.module_data(MODULE_ID)
                    .and_then(|d| d.get("filter"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        if init_logging(&filter) {
            log::info!("logging: env_logger installed filter='{filter}'");
        }
        Ok(())
    }
}
