#![allow(dead_code)]

use newengine_modules_browser::{
    event_code, BridgeError, BridgeResult, BrowserCallbacks, BrowserParam, Clock, Collaborators,
    EventDispatcher, FullscreenPhase, KeyEvent, NativeBridge, NativeBridgeRef, NativeLogLevel,
    NavigationSink, PointerEvent, RawBrowserEvent, RenderTargetSink, ShutdownSignal,
    TextInputSink, Window, WindowControl, WindowIndex, WindowRegistry, WindowRequest, WindowUid,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const RGBA32: i32 = 1;

/* ---------------------------------------------------------------------------------------------
   Clock
   --------------------------------------------------------------------------------------------- */

#[derive(Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    pub fn advance(&self, by: Duration) -> Duration {
        let mut now = self.now.lock();
        *now += by;
        *now
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

/* ---------------------------------------------------------------------------------------------
   Fake bridge
   --------------------------------------------------------------------------------------------- */

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Initialize(String),
    SetParam(BrowserParam),
    RequestNewWindow(WindowRequest),
    CloseWindow(WindowIndex),
    Service(WindowIndex),
    Pointer(WindowIndex, PointerEvent),
    Key(WindowIndex, bool, KeyEvent),
    Control(WindowIndex, WindowControl),
    LogForwarding(bool),
    LogLevel(NativeLogLevel),
    FlushLog,
    Finalize,
}

/// When the fake raises the shutdown acknowledgement.
#[derive(Debug, Clone, Copy)]
pub enum Ack {
    Never,
    /// On the first service call at or after this simulated time.
    At(Duration),
}

/// Scripted stand-in for the native module.
///
/// Each `service_window_events` advances the manual clock by one
/// millisecond. Window requests are answered reentrantly with a creation
/// callback unless `auto_create` is off.
pub struct FakeBridge {
    callbacks: Mutex<Option<Arc<dyn BrowserCallbacks>>>,
    calls: Mutex<Vec<Call>>,
    titles: Mutex<HashMap<WindowIndex, String>>,
    urls: Mutex<HashMap<WindowIndex, String>>,
    next_index: AtomicI32,
    auto_create: bool,
    ack: Ack,
    clock: Arc<ManualClock>,
    ack_sent: Mutex<bool>,
    watched: Mutex<Option<Arc<WindowRegistry>>>,
    windows_at_finalize: Mutex<Option<usize>>,
    before_finalize: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl FakeBridge {
    pub fn new(ack: Ack, clock: Arc<ManualClock>) -> Self {
        Self {
            callbacks: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            titles: Mutex::new(HashMap::new()),
            urls: Mutex::new(HashMap::new()),
            next_index: AtomicI32::new(1),
            auto_create: true,
            ack,
            clock,
            ack_sent: Mutex::new(false),
            watched: Mutex::new(None),
            windows_at_finalize: Mutex::new(None),
            before_finalize: Mutex::new(None),
        }
    }

    pub fn manual() -> Self {
        let mut b = Self::new(Ack::Never, Arc::new(ManualClock::default()));
        b.auto_create = false;
        b
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, f: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| f(c)).count()
    }

    pub fn finalize_count(&self) -> usize {
        self.count(|c| *c == Call::Finalize)
    }

    pub fn set_title(&self, index: WindowIndex, title: &str) {
        self.titles.lock().insert(index, title.to_string());
    }

    pub fn set_url(&self, index: WindowIndex, url: &str) {
        self.urls.lock().insert(index, url.to_string());
    }

    /// Records the registry size the moment `finalize` is called.
    pub fn watch(&self, registry: Arc<WindowRegistry>) {
        *self.watched.lock() = Some(registry);
    }

    /// Runs `f` once, inside `finalize`, before the call is recorded.
    pub fn before_finalize(&self, f: impl FnOnce() + Send + 'static) {
        *self.before_finalize.lock() = Some(Box::new(f));
    }

    pub fn windows_at_finalize(&self) -> Option<usize> {
        *self.windows_at_finalize.lock()
    }

    pub fn callbacks(&self) -> Option<Arc<dyn BrowserCallbacks>> {
        self.callbacks.lock().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

impl NativeBridge for FakeBridge {
    fn initialize(&self, callbacks: Arc<dyn BrowserCallbacks>, user_agent: &str) -> BridgeResult<()> {
        let mut slot = self.callbacks.lock();
        if slot.is_some() {
            return Err(BridgeError::AlreadyInitialized);
        }
        *slot = Some(callbacks);
        drop(slot);
        self.record(Call::Initialize(user_agent.to_string()));
        Ok(())
    }

    fn set_param(&self, param: BrowserParam) -> BridgeResult<()> {
        if self.callbacks.lock().is_some() {
            return Err(BridgeError::ParametersLocked(param.name().to_string()));
        }
        self.record(Call::SetParam(param));
        Ok(())
    }

    fn request_new_window(&self, req: &WindowRequest) -> BridgeResult<()> {
        self.record(Call::RequestNewWindow(*req));
        if self.auto_create {
            let index = self.next_index.fetch_add(1, Ordering::Relaxed);
            if let Some(cb) = self.callbacks() {
                cb.on_window_created(
                    req.uid,
                    WindowIndex(index),
                    req.width as i32,
                    req.height as i32,
                    RGBA32,
                );
            }
        }
        Ok(())
    }

    fn close_window(&self, window_index: WindowIndex) -> BridgeResult<()> {
        self.record(Call::CloseWindow(window_index));
        Ok(())
    }

    fn service_window_events(&self, window_index: WindowIndex) {
        self.record(Call::Service(window_index));
        let now = self.clock.advance(Duration::from_millis(1));

        if let Ack::At(at) = self.ack {
            let mut sent = self.ack_sent.lock();
            if now >= at && !*sent {
                *sent = true;
                drop(sent);
                if let Some(cb) = self.callbacks() {
                    // Deliberately names a uid the host never knew.
                    cb.on_browser_event(RawBrowserEvent {
                        uid: WindowUid(-42),
                        event_type: event_code::SHUTDOWN,
                        data0: 0,
                        data1: 0,
                        text: None,
                    });
                }
            }
        }
    }

    fn send_pointer_event(&self, window_index: WindowIndex, event: PointerEvent) {
        self.record(Call::Pointer(window_index, event));
    }

    fn send_key_event(&self, window_index: WindowIndex, is_down: bool, event: KeyEvent) {
        self.record(Call::Key(window_index, is_down, event));
    }

    fn send_window_control_event(&self, window_index: WindowIndex, control: &WindowControl) {
        self.record(Call::Control(window_index, control.clone()));
    }

    fn window_title(&self, window_index: WindowIndex) -> Option<String> {
        self.titles.lock().get(&window_index).cloned()
    }

    fn window_url(&self, window_index: WindowIndex) -> Option<String> {
        self.urls.lock().get(&window_index).cloned()
    }

    fn set_log_forwarding(&self, enabled: bool) {
        self.record(Call::LogForwarding(enabled));
    }

    fn set_log_level(&self, level: NativeLogLevel) {
        self.record(Call::LogLevel(level));
    }

    fn flush_log(&self) {
        self.record(Call::FlushLog);
    }

    fn finalize(&self) -> BridgeResult<()> {
        if self.callbacks.lock().take().is_none() {
            return Err(BridgeError::NotInitialized);
        }
        if let Some(reg) = self.watched.lock().as_ref() {
            *self.windows_at_finalize.lock() = Some(reg.len());
        }
        let hook = self.before_finalize.lock().take();
        if let Some(f) = hook {
            f();
        }
        self.record(Call::Finalize);
        Ok(())
    }
}

/* ---------------------------------------------------------------------------------------------
   Recording collaborators
   --------------------------------------------------------------------------------------------- */

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Note {
    Activated(Window),
    Resized(Window),
    Released(WindowUid),
    Fullscreen(WindowIndex, FullscreenPhase),
    Load(WindowIndex, bool),
    History(WindowIndex, bool, bool),
    Title(WindowIndex, String),
    Url(WindowIndex, String),
    ImeShow(WindowIndex, String, i32, bool),
    ImeHide,
}

#[derive(Default)]
pub struct Recorder {
    notes: Mutex<Vec<Note>>,
}

impl Recorder {
    pub fn notes(&self) -> Vec<Note> {
        self.notes.lock().clone()
    }

    fn push(&self, n: Note) {
        self.notes.lock().push(n);
    }
}

impl RenderTargetSink for Recorder {
    fn window_activated(&self, window: &Window) {
        self.push(Note::Activated(window.clone()));
    }
    fn window_resized(&self, window: &Window) {
        self.push(Note::Resized(window.clone()));
    }
    fn release_window(&self, window: &Window) {
        self.push(Note::Released(window.uid));
    }
    fn fullscreen_changed(&self, window_index: WindowIndex, phase: FullscreenPhase) {
        self.push(Note::Fullscreen(window_index, phase));
    }
}

impl NavigationSink for Recorder {
    fn load_state_changed(&self, window_index: WindowIndex, loading: bool) {
        self.push(Note::Load(window_index, loading));
    }
    fn history_changed(&self, window_index: WindowIndex, back: bool, forward: bool) {
        self.push(Note::History(window_index, back, forward));
    }
    fn title_changed(&self, window_index: WindowIndex, title: &str) {
        self.push(Note::Title(window_index, title.to_string()));
    }
    fn url_changed(&self, window_index: WindowIndex, url: &str) {
        self.push(Note::Url(window_index, url.to_string()));
    }
}

impl TextInputSink for Recorder {
    fn show(&self, window_index: WindowIndex, text: &str, caret_index: i32, multiline: bool) {
        self.push(Note::ImeShow(window_index, text.to_string(), caret_index, multiline));
    }
    fn hide(&self) {
        self.push(Note::ImeHide);
    }
}

/* ---------------------------------------------------------------------------------------------
   Harness
   --------------------------------------------------------------------------------------------- */

pub struct Harness {
    pub bridge: Arc<FakeBridge>,
    pub registry: Arc<WindowRegistry>,
    pub signal: Arc<ShutdownSignal>,
    pub recorder: Arc<Recorder>,
    pub dispatcher: Arc<EventDispatcher>,
}

impl Harness {
    /// Dispatcher with every collaborator wired to one recorder.
    pub fn new(bridge: FakeBridge) -> Self {
        let recorder = Arc::new(Recorder::default());
        Self::with_collaborators(
            bridge,
            recorder.clone(),
            Collaborators {
                render_targets: Some(recorder.clone()),
                navigation: Some(recorder.clone()),
                text_input: Some(recorder),
            },
        )
    }

    /// Dispatcher with no collaborators at all.
    pub fn bare(bridge: FakeBridge) -> Self {
        Self::with_collaborators(bridge, Arc::new(Recorder::default()), Collaborators::default())
    }

    fn with_collaborators(
        bridge: FakeBridge,
        recorder: Arc<Recorder>,
        collaborators: Collaborators,
    ) -> Self {
        let bridge = Arc::new(bridge);
        let registry = Arc::new(WindowRegistry::new());
        let signal = Arc::new(ShutdownSignal::new());
        let native: NativeBridgeRef = bridge.clone();
        let dispatcher = Arc::new(EventDispatcher::new(
            registry.clone(),
            native.clone(),
            signal.clone(),
            collaborators,
        ));
        native
            .initialize(dispatcher.clone(), "test-agent")
            .expect("fake initialize");
        bridge.watch(registry.clone());

        Self {
            bridge,
            registry,
            signal,
            recorder,
            dispatcher,
        }
    }

    pub fn native(&self) -> NativeBridgeRef {
        self.bridge.clone()
    }

    pub fn create(&self, uid: i32, index: i32, w: i32, h: i32, format: i32) {
        self.dispatcher
            .on_window_created(WindowUid(uid), WindowIndex(index), w, h, format);
    }

    pub fn event(&self, uid: i32, event_type: i32, data0: i32, data1: i32, text: Option<&str>) {
        self.dispatcher.on_browser_event(RawBrowserEvent {
            uid: WindowUid(uid),
            event_type,
            data0,
            data1,
            text: text.map(str::to_string),
        });
    }
}
