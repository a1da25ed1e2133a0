mod bus;
mod ctx;
mod module;
mod resources;
mod services;

pub use bus::Bus;
pub use ctx::ModuleCtx;
pub use module::Module;
pub use resources::Resources;
pub use services::{EngineServices, Services};
