use thiserror::Error;

use crate::bridge::BridgeError;
use crate::registry::RegistryError;
use crate::window::{LifecycleError, WindowUid};

pub type BrowserResult<T> = Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    InvalidState(#[from] LifecycleError),

    #[error("unknown window uid={0}")]
    UnknownWindow(WindowUid),

    #[error("window uid={0} is not active")]
    NotActive(WindowUid),

    #[error("invalid window size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("browser config: {0}")]
    Config(String),
}
