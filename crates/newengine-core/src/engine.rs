use crate::error::{EngineError, EngineResult};
use crate::frame::Frame;
use crate::module::{Bus, Module, ModuleCtx, Resources, Services};
use crate::sync::ShutdownToken;

use std::time::{Duration, Instant};

pub struct Engine<E: Send + 'static> {
    services: Box<dyn Services>,
    modules: Vec<Box<dyn Module<E>>>,

    resources: Resources,
    bus: Bus<E>,
    shutdown: ShutdownToken,

    exit_requested: bool,
    shut_down: bool,

    frame_index: u64,
    last: Instant,
}

macro_rules! ctx {
    ($self:ident) => {
        ModuleCtx::new(
            $self.services.as_ref(),
            &mut $self.resources,
            &$self.bus,
            &$self.shutdown,
            &mut $self.exit_requested,
        )
    };
}

impl<E: Send + 'static> Engine<E> {
    pub fn new(
        services: Box<dyn Services>,
        bus: Bus<E>,
        shutdown: ShutdownToken,
    ) -> EngineResult<Self> {
        Ok(Self {
            services,
            modules: Vec::new(),
            resources: Resources::default(),
            bus,
            shutdown,
            exit_requested: false,
            shut_down: false,
            frame_index: 0,
            last: Instant::now(),
        })
    }

    pub fn register_module(&mut self, mut module: Box<dyn Module<E>>) -> EngineResult<()> {
        log::info!("engine: init module '{}'", module.id());
        let mut ctx = ctx!(self);
        module.init(&mut ctx)?;
        self.modules.push(module);
        Ok(())
    }

    pub fn start(&mut self) -> EngineResult<()> {
        for m in &mut self.modules {
            let mut ctx = ctx!(self);
            m.start(&mut ctx)?;
        }
        self.last = Instant::now();
        Ok(())
    }

    /// Advance one frame.
    pub fn step(&mut self) -> EngineResult<Frame> {
        if self.exit_requested || self.shutdown.is_requested() {
            return Err(EngineError::ExitRequested);
        }

        let now = Instant::now();
        let frame = Frame {
            frame_index: self.frame_index,
            dt: (now - self.last).as_secs_f32(),
        };
        self.last = now;

        for m in &mut self.modules {
            let mut ctx = ctx!(self).with_frame(frame);
            m.update(&mut ctx, &frame)?;
        }

        self.frame_index = self.frame_index.wrapping_add(1);
        Ok(frame)
    }

    /// Step until exit is requested, then shut modules down.
    ///
    /// `frame_budget` of zero runs unpaced.
    pub fn run(&mut self, frame_budget: Duration) -> EngineResult<()> {
        loop {
            let began = Instant::now();
            match self.step() {
                Ok(_) => {}
                Err(EngineError::ExitRequested) => break,
                Err(e) => {
                    log::error!("engine: frame failed: {e}");
                    self.shutdown()?;
                    return Err(e);
                }
            }

            let spent = began.elapsed();
            if spent < frame_budget {
                std::thread::sleep(frame_budget - spent);
            }
        }

        self.shutdown()
    }

    /// Shut modules down in reverse registration order. Runs once.
    pub fn shutdown(&mut self) -> EngineResult<()> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;

        for m in self.modules.iter_mut().rev() {
            let mut ctx = ctx!(self);
            if let Err(e) = m.shutdown(&mut ctx) {
                log::warn!("engine: module '{}' shutdown failed: {e}", m.id());
            }
        }
        Ok(())
    }

    #[inline]
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    #[inline]
    pub fn exit_requested(&self) -> bool {
        self.exit_requested || self.shutdown.is_requested()
    }

    #[inline]
    pub fn resources(&self) -> &Resources {
        &self.resources
    }
}
