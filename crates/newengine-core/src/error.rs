use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Engine-wide error.
///
/// Modules keep their own error types and map them into `EngineError::Module`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("exit requested")]
    ExitRequested,

    #[error("config error: {0}")]
    Config(String),

    #[error("module error [{module}]: {source}")]
    Module {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("engine error: {0}")]
    Other(String),
}

impl EngineError {
    #[inline]
    pub fn module(module: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Module {
            module,
            source: source.into(),
        }
    }
}
