use crate::error::EngineResult;
use crate::frame::Frame;

use super::ModuleCtx;

/// Module lifecycle contract.
///
/// Modules talk to each other through `Resources` (typed APIs) and
/// `Bus` events only.
///
/// `shutdown` runs in reverse registration order.
pub trait Module<E: Send + 'static>: Send {
    fn id(&self) -> &'static str;

    fn init(&mut self, _ctx: &mut ModuleCtx<'_, E>) -> EngineResult<()> {
        Ok(())
    }

    fn start(&mut self, _ctx: &mut ModuleCtx<'_, E>) -> EngineResult<()> {
        Ok(())
    }

    fn update(&mut self, _ctx: &mut ModuleCtx<'_, E>, _frame: &Frame) -> EngineResult<()> {
        Ok(())
    }

    fn shutdown(&mut self, _ctx: &mut ModuleCtx<'_, E>) -> EngineResult<()> {
        Ok(())
    }
}
