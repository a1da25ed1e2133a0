mod common;

use common::{Ack, Call, FakeBridge, ManualClock, Note, Recorder};
use newengine_core::{Bus, Engine, EngineConfig, EngineServices, ShutdownToken};
use newengine_modules_browser::{
    param, BrowserApiRef, BrowserConfig, BrowserModule, BrowserParam, KeyEvent, NativeBridgeRef,
    event_code, BrowserCallbacks, NativeLogLevel, PointerEvent, RawBrowserEvent,
    RenderTargetNotice, WindowControl, WindowIndex, WindowSize, WindowState, WindowUid,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

fn config() -> BrowserConfig {
    BrowserConfig {
        homepage: Some("https://example.org/".into()),
        close_native_window_on_close: false,
        log_level: NativeLogLevel::Warn,
        shutdown_timeout_ms: 50,
        initial_window: Some(WindowSize {
            width: 1024,
            height: 768,
        }),
        ..BrowserConfig::default()
    }
}

fn engine_with(bridge: Arc<FakeBridge>, clock: Arc<ManualClock>) -> Engine<()> {
    let mut engine: Engine<()> = Engine::new(
        Box::new(EngineServices::new(EngineConfig::default())),
        Bus::unbounded(),
        ShutdownToken::new(),
    )
    .unwrap();

    let native: NativeBridgeRef = bridge;
    engine
        .register_module(Box::new(
            BrowserModule::new()
                .with_config(config())
                .with_bridge(native)
                .with_clock(clock),
        ))
        .unwrap();
    engine
}

#[test]
fn init_sets_params_before_initialize_and_publishes_the_api() {
    let clock = Arc::new(ManualClock::default());
    let bridge = Arc::new(FakeBridge::new(Ack::Never, clock.clone()));
    let engine = engine_with(bridge.clone(), clock);

    let calls = bridge.calls();
    let init_at = calls
        .iter()
        .position(|c| matches!(c, Call::Initialize(_)))
        .unwrap();
    let params: Vec<_> = calls[..init_at]
        .iter()
        .filter_map(|c| match c {
            Call::SetParam(p) => Some(p.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        params,
        vec![
            BrowserParam::Bool {
                name: param::CLOSE_NATIVE_WINDOW_ON_CLOSE,
                value: false
            },
            BrowserParam::String {
                name: param::HOMEPAGE,
                value: "https://example.org/".into()
            },
        ]
    );
    assert!(calls[..init_at].contains(&Call::LogLevel(NativeLogLevel::Warn)));
    assert!(calls[..init_at].contains(&Call::LogForwarding(true)));

    assert!(engine.resources().get::<BrowserApiRef>().is_some());
}

#[test]
fn full_session_through_the_engine() {
    let clock = Arc::new(ManualClock::default());
    let bridge = Arc::new(FakeBridge::new(Ack::At(Duration::from_millis(3)), clock.clone()));
    let mut engine = engine_with(bridge.clone(), clock);

    engine.start().unwrap();
    let api = engine.resources().require::<BrowserApiRef>().unwrap();

    let windows = api.windows();
    assert_eq!(windows.len(), 1);
    let uid = windows[0].uid;
    assert_eq!(windows[0].state, WindowState::Active);
    assert_eq!((windows[0].width, windows[0].height), (1024, 768));

    let notices = api.drain_render_notices();
    assert!(matches!(
        notices.as_slice(),
        [RenderTargetNotice::Activated { width: 1024, height: 768, .. }]
    ));

    engine.step().unwrap();
    assert!(bridge.count(|c| *c == Call::Service(WindowIndex(1))) >= 1);
    assert!(bridge.count(|c| *c == Call::FlushLog) >= 1);

    api.navigate(uid, "https://example.org/docs").unwrap();
    api.control(uid, &WindowControl::Reload).unwrap();
    api.send_pointer(uid, PointerEvent::over(10, 20)).unwrap();
    api.send_key(uid, true, KeyEvent::character('a')).unwrap();
    assert_eq!(api.pointer_position(uid, 0.5, 0.5).unwrap(), (512, 384));
    assert!(!api.ime_complete());

    engine.shutdown().unwrap();

    assert_eq!(bridge.finalize_count(), 1);
    assert_eq!(bridge.calls().last(), Some(&Call::LogForwarding(false)));
    assert!(engine.resources().get::<BrowserApiRef>().is_none());
    assert!(api.windows().is_empty());
}

#[test]
fn shutdown_without_acknowledgement_still_finalizes_once() {
    let clock = Arc::new(ManualClock::default());
    let bridge = Arc::new(FakeBridge::new(Ack::Never, clock.clone()));
    let mut engine = engine_with(bridge.clone(), clock);

    engine.start().unwrap();
    engine.shutdown().unwrap();
    engine.shutdown().unwrap();

    assert_eq!(bridge.finalize_count(), 1);
    let serviced = bridge.count(|c| matches!(c, Call::Service(_)));
    assert_eq!(serviced, 50);
}

#[test]
fn engine_toml_configures_the_module() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.toml");
    std::fs::write(
        &path,
        r#"
        [[modules]]
        id = "browser"

        [modules.data]
        user_agent = "Editor/0.1"
        resources_path = "assets/browser"
        forward_native_log = false
        "#,
    )
    .unwrap();
    let config = EngineConfig::load_or_default(&path).unwrap();

    let bridge = Arc::new(FakeBridge::manual());
    let native: NativeBridgeRef = bridge.clone();
    let mut engine: Engine<()> = Engine::new(
        Box::new(EngineServices::new(config)),
        Bus::unbounded(),
        ShutdownToken::new(),
    )
    .unwrap();
    engine
        .register_module(Box::new(BrowserModule::new().with_bridge(native)))
        .unwrap();

    let calls = bridge.calls();
    assert!(calls.contains(&Call::Initialize("Editor/0.1".into())));
    assert!(calls.contains(&Call::SetParam(BrowserParam::String {
        name: param::RESOURCES_PATH,
        value: "assets/browser".into(),
    })));
    assert!(!calls.iter().any(|c| matches!(c, Call::LogForwarding(_))));

    engine.start().unwrap();
    assert!(engine
        .resources()
        .require::<BrowserApiRef>()
        .unwrap()
        .windows()
        .is_empty());
    engine.shutdown().unwrap();
    assert_eq!(bridge.finalize_count(), 1);
}

#[test]
fn default_render_targets_are_gone_before_finalize() {
    let clock = Arc::new(ManualClock::default());
    let bridge = Arc::new(FakeBridge::new(Ack::Never, clock.clone()));
    let mut engine = engine_with(bridge.clone(), clock);

    engine.start().unwrap();
    let api = engine.resources().require::<BrowserApiRef>().unwrap();
    let uid = api.windows()[0].uid;
    assert!(api.render_target(uid).is_some());

    let at_finalize = Arc::new(Mutex::new(None));
    {
        let api = api.clone();
        let at_finalize = at_finalize.clone();
        bridge.before_finalize(move || {
            *at_finalize.lock() = Some(api.render_target(uid));
        });
    }

    engine.shutdown().unwrap();

    assert_eq!(*at_finalize.lock(), Some(None));
    assert_eq!(bridge.finalize_count(), 1);
    assert!(api.drain_render_notices().is_empty());
}

#[test]
fn shutdown_hides_an_open_text_input() {
    let clock = Arc::new(ManualClock::default());
    let bridge = Arc::new(FakeBridge::new(Ack::Never, clock.clone()));
    let recorder = Arc::new(Recorder::default());

    let mut engine: Engine<()> = Engine::new(
        Box::new(EngineServices::new(EngineConfig::default())),
        Bus::unbounded(),
        ShutdownToken::new(),
    )
    .unwrap();
    let native: NativeBridgeRef = bridge.clone();
    engine
        .register_module(Box::new(
            BrowserModule::new()
                .with_config(config())
                .with_bridge(native)
                .with_text_input(recorder.clone())
                .with_clock(clock),
        ))
        .unwrap();
    engine.start().unwrap();

    let callbacks = bridge.callbacks().unwrap();
    callbacks.on_browser_event(RawBrowserEvent {
        uid: WindowUid(1),
        event_type: event_code::IME_STATE_CHANGED,
        data0: 1,
        data1: 0,
        text: Some(String::new()),
    });
    assert!(engine
        .resources()
        .require::<BrowserApiRef>()
        .unwrap()
        .ime_active());

    engine.shutdown().unwrap();

    assert_eq!(recorder.notes().last(), Some(&Note::ImeHide));
}
