pub mod config;
pub mod engine;
pub mod error;
pub mod frame;
pub mod module;
pub mod sync;

pub use crate::config::{EngineConfig, ModuleConfig};
pub use crate::engine::Engine;
pub use crate::error::{EngineError, EngineResult};
pub use crate::frame::Frame;
pub use crate::module::{Bus, EngineServices, Module, ModuleCtx, Resources, Services};
pub use crate::sync::ShutdownToken;
