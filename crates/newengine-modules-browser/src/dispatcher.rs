use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use crate::bridge::{BrowserCallbacks, NativeBridgeRef, WindowRequest};
use crate::collab::Collaborators;
use crate::error::{BrowserError, BrowserResult};
use crate::event::{BrowserEvent, ImeState, RawBrowserEvent};
use crate::format::TextureFormat;
use crate::ime::{ImeSession, ImeShow};
use crate::input::WindowControl;
use crate::registry::{RegistryError, WindowRegistry};
use crate::shutdown::ShutdownSignal;
use crate::window::{Window, WindowIndex, WindowState, WindowUid};

/// Receives every native callback and drives the window lifecycle.
///
/// Callbacks run on whatever thread the engine picks. Each one resolves the
/// uid and applies its transition under the registry lock, then notifies
/// collaborators with the lock released so they may call back into the
/// bridge. Nothing here returns an error to the caller; every failure ends
/// in a log line.
pub struct EventDispatcher {
    registry: Arc<WindowRegistry>,
    bridge: NativeBridgeRef,
    signal: Arc<ShutdownSignal>,
    collaborators: Collaborators,
    ime: Arc<ImeSession>,
    next_uid: AtomicI32,
}

impl EventDispatcher {
    pub fn new(
        registry: Arc<WindowRegistry>,
        bridge: NativeBridgeRef,
        signal: Arc<ShutdownSignal>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            registry,
            bridge,
            signal,
            collaborators,
            ime: Arc::new(ImeSession::new()),
            next_uid: AtomicI32::new(1),
        }
    }

    #[inline]
    pub fn registry(&self) -> &Arc<WindowRegistry> {
        &self.registry
    }

    #[inline]
    pub fn ime(&self) -> &Arc<ImeSession> {
        &self.ime
    }

    #[inline]
    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /* ---------------------------------------------------------------------------------------------
       Host-initiated operations
       --------------------------------------------------------------------------------------------- */

    /// Registers a `Requested` entity and asks the engine for a window.
    /// The entity exists before the native call since the creation callback
    /// may arrive from inside it.
    pub fn request_window(&self, width: u32, height: u32) -> BrowserResult<WindowUid> {
        if width == 0 || height == 0 {
            return Err(BrowserError::InvalidSize { width, height });
        }

        let uid = loop {
            let uid = WindowUid(self.next_uid.fetch_add(1, Ordering::Relaxed));
            match self.registry.register(Window::requested(uid, width, height)) {
                Ok(()) => break uid,
                // Taken by an engine-initiated window.
                Err(RegistryError::DuplicateKey(_)) => continue,
            }
        };

        let req = WindowRequest { uid, width, height };
        if let Err(e) = self.bridge.request_new_window(&req) {
            self.registry.remove(uid);
            log::error!("browser: request_new_window uid={uid} failed: {e}");
            return Err(e.into());
        }

        log::info!("browser: requested window uid={uid} {width}x{height}");
        Ok(uid)
    }

    /// Closes one window: release the host render target, release the
    /// native window, then drop the entity.
    ///
    /// A window the engine has not created yet stays behind as a `Closing`
    /// entry without an index. Its creation callback releases the native
    /// window instead of activating it.
    pub fn close_window(&self, uid: WindowUid) -> BrowserResult<()> {
        let window = self
            .registry
            .update(uid, |w| w.begin_close().map(|()| w.clone()))
            .ok_or(BrowserError::UnknownWindow(uid))??;

        match &self.collaborators.render_targets {
            Some(sink) => sink.release_window(&window),
            None => log::debug!("browser: no render target sink for uid={uid}"),
        }

        let Some(index) = window.window_index else {
            log::info!("browser: window uid={uid} closed before creation, awaiting its callback");
            return Ok(());
        };

        if self.ime.target() == Some(index) {
            self.ime.end();
            if let Some(text_input) = &self.collaborators.text_input {
                text_input.hide();
            }
        }
        let native = self.bridge.close_window(index);

        if let Some(Err(e)) = self.registry.update(uid, Window::finish_close) {
            log::warn!("browser: {e}");
        }
        self.registry.remove(uid);

        match native {
            Ok(()) => {
                log::info!("browser: closed window uid={uid}");
                Ok(())
            }
            Err(e) => {
                log::error!("browser: close_window uid={uid} failed: {e}");
                Err(e.into())
            }
        }
    }

    /// Sends a control event to an active window.
    pub fn send_control(&self, uid: WindowUid, control: &WindowControl) -> BrowserResult<()> {
        let index = self.active_index(uid)?;
        self.bridge.send_window_control_event(index, control);
        Ok(())
    }

    pub fn active_index(&self, uid: WindowUid) -> BrowserResult<WindowIndex> {
        let window = self
            .registry
            .lookup(uid)
            .ok_or(BrowserError::UnknownWindow(uid))?;
        match (window.is_active(), window.window_index) {
            (true, Some(index)) => Ok(index),
            _ => Err(BrowserError::NotActive(uid)),
        }
    }

    /* ---------------------------------------------------------------------------------------------
       Callback handlers
       --------------------------------------------------------------------------------------------- */

    fn window_created(
        &self,
        uid: WindowUid,
        window_index: WindowIndex,
        width: i32,
        height: i32,
        format_code: i32,
    ) {
        let format = TextureFormat::from_native(format_code);
        let (Some(width), Some(height), Some(format)) = (positive(width), positive(height), format)
        else {
            log::error!(
                "browser: invalid creation payload uid={uid} index={window_index} \
                 size={width}x{height} format={format_code}, discarded"
            );
            if self.forget_pending(uid).is_some() {
                log::warn!("browser: dropped pending window uid={uid} after invalid creation");
            }
            return;
        };

        if self.close_if_abandoned(uid, window_index) {
            return;
        }

        if self.registry.lookup(uid).is_none() {
            let (_, created) = self.registry.create_if_absent(uid, Window::engine_initiated);
            if created {
                log::info!("browser: engine-initiated window uid={uid}");
            }
        }

        let activated = self.registry.update(uid, |w| {
            w.activate(window_index, width, height, format)
                .map(|()| w.clone())
        });

        let window = match activated {
            Some(Ok(window)) => window,
            Some(Err(e)) => {
                log::warn!("browser: duplicate creation callback discarded: {e}");
                return;
            }
            None => {
                log::warn!("browser: window uid={uid} removed before activation");
                return;
            }
        };

        log::info!(
            "browser: window uid={uid} active index={window_index} {width}x{height} {format:?}"
        );

        match &self.collaborators.render_targets {
            Some(sink) => sink.window_activated(&window),
            None => log::warn!("browser: no render target sink, activation of uid={uid} dropped"),
        }
    }

    /// Removes an entry still waiting for its creation callback.
    fn forget_pending(&self, uid: WindowUid) -> Option<Window> {
        let pending = self
            .registry
            .update(uid, |w| w.window_index.is_none() && is_pending(w.state))?;
        if pending {
            self.registry.remove(uid)
        } else {
            None
        }
    }

    /// Finishes a close the host issued before the engine created the
    /// window. Returns false if `uid` is not such an entry.
    fn close_if_abandoned(&self, uid: WindowUid, window_index: WindowIndex) -> bool {
        let closed = self.registry.update(uid, |w| {
            if w.state != WindowState::Closing || w.window_index.is_some() {
                return None;
            }
            w.window_index = Some(window_index);
            Some(w.finish_close())
        });
        let Some(Some(closed)) = closed else {
            return false;
        };

        if let Err(e) = closed {
            log::warn!("browser: {e}");
        }
        self.registry.remove(uid);

        log::info!(
            "browser: window uid={uid} was closed while pending, releasing index={window_index}"
        );
        if let Err(e) = self.bridge.close_window(window_index) {
            log::error!("browser: close_window uid={uid} failed: {e}");
        }
        true
    }

    fn window_resized(&self, uid: WindowUid, width: i32, height: i32) {
        let (Some(width), Some(height)) = (positive(width), positive(height)) else {
            log::error!("browser: invalid resize uid={uid} {width}x{height}, discarded");
            return;
        };

        let resized = self
            .registry
            .update(uid, |w| w.resize(width, height).map(|()| w.clone()));

        let window = match resized {
            Some(Ok(window)) => window,
            Some(Err(e)) => {
                log::warn!("browser: resize discarded: {e}");
                return;
            }
            None => {
                log::warn!("browser: resize for unknown window uid={uid}, discarded");
                return;
            }
        };

        log::debug!("browser: window uid={uid} resized to {width}x{height}");

        match &self.collaborators.render_targets {
            Some(sink) => sink.window_resized(&window),
            None => log::warn!("browser: no render target sink, resize of uid={uid} dropped"),
        }
    }

    fn browser_event(&self, raw: RawBrowserEvent) {
        let uid = raw.uid;
        let event = BrowserEvent::decode(&raw);

        // The uid may already be gone.
        if event == BrowserEvent::Shutdown {
            log::info!("browser: shutdown acknowledged (uid={uid})");
            self.signal.acknowledge();
            return;
        }

        let Some(window) = self.registry.lookup(uid) else {
            log::warn!("browser: {event:?} for unknown window uid={uid}, discarded");
            return;
        };

        if let BrowserEvent::Unknown(code) = event {
            log::warn!("browser: unknown event type {code} for uid={uid}, ignored");
            return;
        }
        if event == BrowserEvent::Nop {
            return;
        }

        let Some(index) = window.window_index else {
            log::warn!("browser: {event:?} for uid={uid} before creation, discarded");
            return;
        };

        match event {
            BrowserEvent::LoadStateChanged { loading } => {
                log::debug!("browser: load {} index={index}", if loading { "began" } else { "ended" });
                match &self.collaborators.navigation {
                    Some(nav) => nav.load_state_changed(index, loading),
                    None => log::warn!("browser: no navigation sink, load state dropped"),
                }
            }
            BrowserEvent::HistoryChanged {
                can_go_back,
                can_go_forward,
            } => match &self.collaborators.navigation {
                Some(nav) => nav.history_changed(index, can_go_back, can_go_forward),
                None => log::warn!("browser: no navigation sink, history change dropped"),
            },
            BrowserEvent::TitleChanged => {
                let Some(nav) = &self.collaborators.navigation else {
                    log::warn!("browser: no navigation sink, title change dropped");
                    return;
                };
                match self.bridge.window_title(index) {
                    Some(title) => nav.title_changed(index, &title),
                    None => log::warn!("browser: title unavailable for index={index}"),
                }
            }
            BrowserEvent::UrlChanged => {
                let Some(nav) = &self.collaborators.navigation else {
                    log::warn!("browser: no navigation sink, url change dropped");
                    return;
                };
                match self.bridge.window_url(index) {
                    Some(url) => nav.url_changed(index, &url),
                    None => log::warn!("browser: url unavailable for index={index}"),
                }
            }
            BrowserEvent::ImeStateChanged(state) => self.ime_changed(index, state),
            BrowserEvent::FullscreenStateChanged(phase) => {
                let Some(phase) = phase else {
                    log::warn!("browser: unknown fullscreen phase {} for index={index}", raw.data0);
                    return;
                };
                log::debug!("browser: fullscreen {phase:?} index={index}");
                if let Some(sink) = &self.collaborators.render_targets {
                    sink.fullscreen_changed(index, phase);
                }
            }
            BrowserEvent::Nop | BrowserEvent::Shutdown | BrowserEvent::Unknown(_) => {}
        }
    }

    fn ime_changed(&self, index: WindowIndex, state: ImeState) {
        let Some(text_input) = &self.collaborators.text_input else {
            log::warn!("browser: no text input sink, IME {state:?} dropped");
            return;
        };

        match state {
            ImeState::Show {
                text,
                caret_index,
                multiline,
            } => match self.ime.show(index) {
                ImeShow::Opened => {
                    log::debug!("browser: IME shown for index={index}");
                    text_input.show(index, &text, caret_index, multiline);
                }
                ImeShow::Retargeted => {
                    log::debug!("browser: IME already shown, retargeted to index={index}");
                }
            },
            ImeState::Hide => {
                if self.ime.dismiss(self.bridge.as_ref()) {
                    text_input.hide();
                }
            }
        }
    }
}

#[inline]
fn is_pending(state: WindowState) -> bool {
    matches!(state, WindowState::Requested | WindowState::Closing)
}

#[inline]
fn positive(v: i32) -> Option<u32> {
    u32::try_from(v).ok().filter(|v| *v > 0)
}

impl BrowserCallbacks for EventDispatcher {
    fn on_window_created(
        &self,
        uid: WindowUid,
        window_index: WindowIndex,
        width: i32,
        height: i32,
        format_code: i32,
    ) {
        self.window_created(uid, window_index, width, height, format_code);
    }

    fn on_window_resized(&self, uid: WindowUid, width: i32, height: i32) {
        self.window_resized(uid, width, height);
    }

    fn on_browser_event(&self, event: RawBrowserEvent) {
        self.browser_event(event);
    }
}
