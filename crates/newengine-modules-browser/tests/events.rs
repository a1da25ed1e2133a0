mod common;

use common::{Call, FakeBridge, Harness, Note, RGBA32};
use newengine_modules_browser::{
    event_code as code, FullscreenPhase, ShutdownPhase, WindowControl, WindowIndex, WindowUid,
};

fn active() -> Harness {
    let h = Harness::new(FakeBridge::manual());
    h.create(1, 4, 320, 240, RGBA32);
    h
}

/// Notes after the activation one.
fn forwarded(h: &Harness) -> Vec<Note> {
    h.recorder.notes().into_iter().skip(1).collect()
}

#[test]
fn load_and_history_reach_navigation() {
    let h = active();
    h.event(1, code::LOAD_STATE_CHANGED, 1, 0, None);
    h.event(1, code::LOAD_STATE_CHANGED, 0, 0, None);
    h.event(1, code::HISTORY_CHANGED, 1, 0, None);

    assert_eq!(
        forwarded(&h),
        vec![
            Note::Load(WindowIndex(4), true),
            Note::Load(WindowIndex(4), false),
            Note::History(WindowIndex(4), true, false),
        ]
    );
}

#[test]
fn title_and_url_are_pulled_by_window_index() {
    let h = active();
    h.bridge.set_title(WindowIndex(4), "Example Domain");
    h.bridge.set_url(WindowIndex(4), "https://example.com/");

    h.event(1, code::TITLE_CHANGED, 0, 0, None);
    h.event(1, code::URL_CHANGED, 0, 0, None);

    assert_eq!(
        forwarded(&h),
        vec![
            Note::Title(WindowIndex(4), "Example Domain".into()),
            Note::Url(WindowIndex(4), "https://example.com/".into()),
        ]
    );
}

#[test]
fn title_for_unknown_uid_is_discarded() {
    let h = active();
    h.bridge.set_title(WindowIndex(4), "x");
    h.event(99, code::TITLE_CHANGED, 0, 0, None);
    assert!(forwarded(&h).is_empty());
}

#[test]
fn unknown_event_type_changes_nothing() {
    let h = active();
    let before = h.registry.live_windows();

    h.event(1, 42, 1, 1, Some("?"));
    h.event(1, -3, 0, 0, None);
    h.event(1, code::NOP, 0, 0, None);

    assert_eq!(h.registry.live_windows(), before);
    assert!(forwarded(&h).is_empty());
}

#[test]
fn events_for_unknown_uid_are_discarded() {
    let h = active();
    h.event(55, code::LOAD_STATE_CHANGED, 1, 0, None);
    h.event(55, code::IME_STATE_CHANGED, 1, 0, Some("a"));
    assert!(forwarded(&h).is_empty());
    assert_eq!(h.registry.len(), 1);
}

#[test]
fn shutdown_is_processed_for_any_uid() {
    let h = active();
    h.signal.arm();
    h.event(12345, code::SHUTDOWN, 0, 0, None);
    assert_eq!(h.signal.phase(), ShutdownPhase::Acknowledged);
}

#[test]
fn duplicate_ime_show_leaves_one_session() {
    let h = active();
    h.create(2, 5, 320, 240, RGBA32);

    h.event(1, code::IME_STATE_CHANGED, 1, 3, Some("abc"));
    h.event(2, code::IME_STATE_CHANGED, 1, 0, Some("zzz"));

    let ime = h.dispatcher.ime();
    assert!(ime.is_active());
    assert_eq!(ime.sessions_opened(), 1);
    assert_eq!(ime.target(), Some(WindowIndex(5)));

    let shows: Vec<_> = h
        .recorder
        .notes()
        .into_iter()
        .filter(|n| matches!(n, Note::ImeShow(..)))
        .collect();
    assert_eq!(
        shows,
        vec![Note::ImeShow(WindowIndex(4), "abc".into(), 3, false)]
    );
}

#[test]
fn ime_hide_dismisses_the_target_window() {
    let h = active();
    h.event(1, code::IME_STATE_CHANGED, 2, 0, Some("multi"));
    h.event(1, code::IME_STATE_CHANGED, 0, 0, None);

    assert!(!h.dispatcher.ime().is_active());
    assert_eq!(
        forwarded(&h),
        vec![
            Note::ImeShow(WindowIndex(4), "multi".into(), 0, true),
            Note::ImeHide,
        ]
    );
    assert_eq!(
        h.bridge
            .count(|c| *c == Call::Control(WindowIndex(4), WindowControl::ImeDismissed)),
        1
    );

    // Nothing is up any more.
    h.event(1, code::IME_STATE_CHANGED, 0, 0, None);
    assert_eq!(forwarded(&h).len(), 2);
}

#[test]
fn ime_complete_sends_return_then_dismisses() {
    let h = active();
    h.event(1, code::IME_STATE_CHANGED, 1, 0, Some(""));

    assert!(h.dispatcher.ime().complete(h.bridge.as_ref()));
    assert!(!h.dispatcher.ime().complete(h.bridge.as_ref()));

    let tail: Vec<_> = h
        .bridge
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Key(..) | Call::Control(..)))
        .collect();
    assert_eq!(tail.len(), 3);
    assert!(matches!(tail[0], Call::Key(WindowIndex(4), true, _)));
    assert!(matches!(tail[1], Call::Key(WindowIndex(4), false, _)));
    assert_eq!(tail[2], Call::Control(WindowIndex(4), WindowControl::ImeDismissed));
}

#[test]
fn fullscreen_is_advisory() {
    let h = active();
    h.event(1, code::FULLSCREEN_STATE_CHANGED, 1, 0, None);
    h.event(1, code::FULLSCREEN_STATE_CHANGED, 9, 0, None);

    assert_eq!(
        forwarded(&h),
        vec![Note::Fullscreen(WindowIndex(4), FullscreenPhase::DidEnter)]
    );
    assert!(h.registry.lookup(WindowUid(1)).unwrap().is_active());
}

#[test]
fn missing_collaborators_drop_events_quietly() {
    let h = Harness::bare(FakeBridge::manual());
    h.create(1, 1, 10, 10, RGBA32);

    h.event(1, code::LOAD_STATE_CHANGED, 1, 0, None);
    h.event(1, code::HISTORY_CHANGED, 1, 1, None);
    h.event(1, code::TITLE_CHANGED, 0, 0, None);
    h.event(1, code::IME_STATE_CHANGED, 1, 0, Some("x"));

    assert!(!h.dispatcher.ime().is_active());
    assert!(h.registry.lookup(WindowUid(1)).unwrap().is_active());
}

#[test]
fn navigation_commands_go_to_the_window_index() {
    let h = active();
    h.dispatcher
        .send_control(WindowUid(1), &WindowControl::Navigate("https://rust-lang.org/".into()))
        .unwrap();
    h.dispatcher
        .send_control(WindowUid(1), &WindowControl::GoBack)
        .unwrap();
    assert!(h
        .dispatcher
        .send_control(WindowUid(2), &WindowControl::Reload)
        .is_err());

    let controls: Vec<_> = h
        .bridge
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Control(..)))
        .collect();
    assert_eq!(
        controls,
        vec![
            Call::Control(
                WindowIndex(4),
                WindowControl::Navigate("https://rust-lang.org/".into())
            ),
            Call::Control(WindowIndex(4), WindowControl::GoBack),
        ]
    );
}
