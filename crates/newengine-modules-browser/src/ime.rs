use parking_lot::Mutex;

use crate::bridge::NativeBridge;
use crate::input::{BrowserKey, KeyEvent, WindowControl};
use crate::window::WindowIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImeShow {
    /// No session was active; one was opened.
    Opened,
    /// A session was already active; only its target changed.
    Retargeted,
}

#[derive(Debug, Default)]
struct Inner {
    target: Option<WindowIndex>,
    opened: u64,
}

/// The single text-input session. The engine may ask to show the IME again
/// while it is already up; that never opens a second session.
#[derive(Debug, Default)]
pub struct ImeSession {
    inner: Mutex<Inner>,
}

impl ImeSession {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&self, window_index: WindowIndex) -> ImeShow {
        let mut inner = self.inner.lock();
        let was_active = inner.target.replace(window_index).is_some();
        if was_active {
            ImeShow::Retargeted
        } else {
            inner.opened += 1;
            ImeShow::Opened
        }
    }

    /// Ends the session, returning the window it targeted.
    pub fn end(&self) -> Option<WindowIndex> {
        self.inner.lock().target.take()
    }

    #[inline]
    pub fn target(&self) -> Option<WindowIndex> {
        self.inner.lock().target
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.target().is_some()
    }

    /// Sessions opened over the lifetime of this value.
    #[inline]
    pub fn sessions_opened(&self) -> u64 {
        self.inner.lock().opened
    }

    /// Key down+up to the active window.
    pub fn press(&self, bridge: &dyn NativeBridge, event: KeyEvent) -> bool {
        let Some(index) = self.target() else {
            return false;
        };
        bridge.send_key_event(index, true, event);
        bridge.send_key_event(index, false, event);
        true
    }

    /// Tells the engine the user dismissed the IME and ends the session.
    pub fn dismiss(&self, bridge: &dyn NativeBridge) -> bool {
        let Some(index) = self.end() else {
            return false;
        };
        log::debug!("browser: IME dismissed for index={index}");
        bridge.send_window_control_event(index, &WindowControl::ImeDismissed);
        true
    }

    /// Submits the input with Return, then dismisses.
    pub fn complete(&self, bridge: &dyn NativeBridge) -> bool {
        if !self.press(bridge, KeyEvent::key(BrowserKey::Return)) {
            return false;
        }
        self.dismiss(bridge)
    }
}
