//! Embedded browser host for NewEngine.
//!
//! The browser engine lives in a native module loaded at runtime. It owns the
//! windows, renders them into textures and reports back through callbacks
//! that may fire on any thread. This crate keeps the host-side window
//! entities in step with it and tears the session down in a bounded time.

mod api;
mod bridge;
mod collab;
mod config;
mod dispatcher;
mod error;
mod event;
mod ffi;
mod format;
mod ime;
mod input;
mod log_route;
mod native;
mod navigation;
mod registry;
mod shutdown;
mod window;

pub use api::{BrowserApi, BrowserApiRef, BrowserHandle};
pub use bridge::{
    param, BridgeError, BridgeResult, BrowserCallbacks, BrowserParam, NativeBridge,
    NativeBridgeRef, NativeLogLevel, WindowRequest,
};
pub use collab::{
    Collaborators, NavigationSink, RenderTarget, RenderTargetNotice, RenderTargetQueue,
    RenderTargetSink, TextInputSink,
};
pub use config::{BrowserConfig, WindowSize};
pub use dispatcher::EventDispatcher;
pub use error::{BrowserError, BrowserResult};
pub use event::{code as event_code, BrowserEvent, FullscreenPhase, ImeState, RawBrowserEvent};
pub use format::TextureFormat;
pub use ime::{ImeSession, ImeShow};
pub use input::{
    window_coord_for_tex_coord, BrowserKey, KeyEvent, MouseButton, PointerEvent,
    PointerEventKind, WindowControl,
};
pub use log_route::{classify_native_line, route_native_line, NATIVE_LOG_TARGET};
pub use native::NativeLibraryBridge;
pub use navigation::{NavigationState, PageState};
pub use registry::{RegistryError, WindowRegistry};
pub use shutdown::{
    Clock, ShutdownCoordinator, ShutdownPhase, ShutdownReport, ShutdownSignal, SystemClock,
};
pub use window::{LifecycleError, Window, WindowIndex, WindowOrigin, WindowState, WindowUid};

use newengine_core::{EngineError, EngineResult, Frame, Module, ModuleCtx};
use std::sync::Arc;

pub const MODULE_ID: &str = "browser";

/// Live session parts, present between `init` and `shutdown`.
struct Session {
    config: BrowserConfig,
    bridge: NativeBridgeRef,
    registry: Arc<WindowRegistry>,
    signal: Arc<ShutdownSignal>,
    dispatcher: Arc<EventDispatcher>,
    render_queue: Option<Arc<RenderTargetQueue>>,
}

pub struct BrowserModule {
    config: Option<BrowserConfig>,
    bridge: Option<NativeBridgeRef>,
    render_targets: Option<Arc<dyn RenderTargetSink>>,
    navigation: Option<Arc<dyn NavigationSink>>,
    text_input: Option<Arc<dyn TextInputSink>>,
    clock: Option<Arc<dyn Clock>>,
    session: Option<Session>,
}

impl BrowserModule {
    #[inline]
    pub fn new() -> Self {
        Self {
            config: None,
            bridge: None,
            render_targets: None,
            navigation: None,
            text_input: None,
            clock: None,
            session: None,
        }
    }

    /// Overrides the `browser` table of the engine config.
    pub fn with_config(mut self, config: BrowserConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Uses `bridge` instead of loading the configured library.
    pub fn with_bridge(mut self, bridge: NativeBridgeRef) -> Self {
        self.bridge = Some(bridge);
        self
    }

    /// Replaces the default queue-backed render target sink.
    pub fn with_render_targets(mut self, sink: Arc<dyn RenderTargetSink>) -> Self {
        self.render_targets = Some(sink);
        self
    }

    pub fn with_navigation(mut self, sink: Arc<dyn NavigationSink>) -> Self {
        self.navigation = Some(sink);
        self
    }

    pub fn with_text_input(mut self, sink: Arc<dyn TextInputSink>) -> Self {
        self.text_input = Some(sink);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    fn open_session(
        &mut self,
        config: BrowserConfig,
    ) -> Result<(Session, BrowserHandle), BrowserError> {
        let bridge: NativeBridgeRef = match self.bridge.take() {
            Some(b) => b,
            None => Arc::new(NativeLibraryBridge::load(&config.library)?),
        };

        bridge.set_log_level(config.log_level);
        if config.forward_native_log {
            bridge.set_log_forwarding(true);
        }

        if let Some(path) = &config.resources_path {
            bridge.set_param(BrowserParam::String {
                name: param::RESOURCES_PATH,
                value: path.to_string_lossy().into_owned(),
            })?;
        }
        if !config.close_native_window_on_close {
            bridge.set_param(BrowserParam::Bool {
                name: param::CLOSE_NATIVE_WINDOW_ON_CLOSE,
                value: false,
            })?;
        }
        if let Some(homepage) = config.homepage.as_ref().filter(|h| !h.is_empty()) {
            bridge.set_param(BrowserParam::String {
                name: param::HOMEPAGE,
                value: homepage.clone(),
            })?;
        }

        let mut render_queue: Option<Arc<RenderTargetQueue>> = None;
        let render_targets: Arc<dyn RenderTargetSink> = match &self.render_targets {
            Some(sink) => sink.clone(),
            None => {
                let q = Arc::new(RenderTargetQueue::new());
                render_queue = Some(q.clone());
                q
            }
        };

        let navigation = Arc::new(match self.navigation.take() {
            Some(down) => NavigationState::with_downstream(down),
            None => NavigationState::new(),
        });

        let registry = Arc::new(WindowRegistry::new());
        let signal = Arc::new(ShutdownSignal::new());
        let dispatcher = Arc::new(EventDispatcher::new(
            registry.clone(),
            bridge.clone(),
            signal.clone(),
            Collaborators {
                render_targets: Some(render_targets),
                navigation: Some(navigation.clone()),
                text_input: self.text_input.clone(),
            },
        ));

        bridge.initialize(dispatcher.clone(), &config.user_agent)?;

        let handle = BrowserHandle::new(
            dispatcher.clone(),
            bridge.clone(),
            navigation,
            render_queue.clone(),
        );

        Ok((
            Session {
                config,
                bridge,
                registry,
                signal,
                dispatcher,
                render_queue,
            },
            handle,
        ))
    }
}

impl Default for BrowserModule {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Send + 'static> Module<E> for BrowserModule {
    fn id(&self) -> &'static str {
        MODULE_ID
    }

    fn init(&mut self, ctx: &mut ModuleCtx<'_, E>) -> EngineResult<()> {
        let config = match self.config.take() {
            Some(c) => c,
            None => BrowserConfig::from_module_data(ctx.module_data(MODULE_ID))
                .map_err(|e| EngineError::module(MODULE_ID, e))?,
        };

        let (session, handle) = self
            .open_session(config)
            .map_err(|e| EngineError::module(MODULE_ID, e))?;

        let api: BrowserApiRef = Arc::new(handle);
        ctx.resources().insert::<BrowserApiRef>(Arc::new(api));

        self.session = Some(session);
        Ok(())
    }

    fn start(&mut self, _ctx: &mut ModuleCtx<'_, E>) -> EngineResult<()> {
        let Some(s) = &self.session else {
            return Ok(());
        };
        if let Some(size) = s.config.initial_window {
            s.dispatcher
                .request_window(size.width, size.height)
                .map_err(|e| EngineError::module(MODULE_ID, e))?;
        }
        Ok(())
    }

    fn update(&mut self, _ctx: &mut ModuleCtx<'_, E>, _frame: &Frame) -> EngineResult<()> {
        let Some(s) = &self.session else {
            return Ok(());
        };
        for index in s.registry.active_indices() {
            s.bridge.service_window_events(index);
        }
        s.bridge.flush_log();
        Ok(())
    }

    fn shutdown(&mut self, ctx: &mut ModuleCtx<'_, E>) -> EngineResult<()> {
        let Some(s) = self.session.take() else {
            return Ok(());
        };

        ctx.resources().remove::<BrowserApiRef>();
        if let Some(index) = s.dispatcher.ime().end() {
            log::debug!("browser: IME for index={index} ended by shutdown");
            if let Some(text_input) = &s.dispatcher.collaborators().text_input {
                text_input.hide();
            }
        }

        let mut coordinator =
            ShutdownCoordinator::new(s.registry.clone(), s.bridge.clone(), s.signal.clone())
                .with_render_targets(s.dispatcher.collaborators().render_targets.clone())
                .with_timeout(s.config.shutdown_timeout())
                .with_poll(s.config.shutdown_poll());
        if let Some(clock) = &self.clock {
            coordinator = coordinator.with_clock(clock.clone());
        }

        let result = coordinator.run();

        // Targets are already gone; nobody is left to read the notices.
        if let Some(queue) = &s.render_queue {
            let stale = queue.drain().len();
            if stale > 0 {
                log::debug!("browser: discarded {stale} render notice(s) at shutdown");
            }
        }

        if s.config.forward_native_log {
            s.bridge.set_log_forwarding(false);
        }

        let report = result.map_err(|e| EngineError::module(MODULE_ID, e))?;
        if report.timed_out {
            log::warn!("browser: session closed without acknowledgement");
        }
        Ok(())
    }
}
