use std::sync::Arc;

use crate::bridge::NativeBridgeRef;
use crate::collab::{RenderTarget, RenderTargetNotice, RenderTargetQueue};
use crate::dispatcher::EventDispatcher;
use crate::error::{BrowserError, BrowserResult};
use crate::input::{window_coord_for_tex_coord, KeyEvent, PointerEvent, WindowControl};
use crate::navigation::{NavigationState, PageState};
use crate::window::{Window, WindowUid};

/// Browser API exposed to engine modules through `Resources`.
pub trait BrowserApi: Send + Sync {
    /// Asks the engine for a window. It becomes usable once it reports
    /// `Active`.
    fn request_window(&self, width: u32, height: u32) -> BrowserResult<WindowUid>;

    fn close_window(&self, uid: WindowUid) -> BrowserResult<()>;

    fn window(&self, uid: WindowUid) -> Option<Window>;

    /// Every window the host knows about, ordered by window index.
    fn windows(&self) -> Vec<Window>;

    fn navigate(&self, uid: WindowUid, url: &str) -> BrowserResult<()> {
        self.control(uid, &WindowControl::Navigate(url.to_string()))
    }

    /// Refresh, reload, stop, back, forward, home.
    fn control(&self, uid: WindowUid, control: &WindowControl) -> BrowserResult<()>;

    fn send_pointer(&self, uid: WindowUid, event: PointerEvent) -> BrowserResult<()>;

    /// Maps a texture coordinate (origin bottom-left) to the window pixel it
    /// lands on.
    fn pointer_position(&self, uid: WindowUid, u: f32, v: f32) -> BrowserResult<(i32, i32)>;

    fn send_key(&self, uid: WindowUid, is_down: bool, event: KeyEvent) -> BrowserResult<()>;

    /// Key down+up to the window the IME targets. False when no IME is up.
    fn ime_press(&self, event: KeyEvent) -> bool;

    /// Submits IME input with Return and dismisses it.
    fn ime_complete(&self) -> bool;

    fn ime_dismiss(&self) -> bool;

    fn ime_active(&self) -> bool;

    fn page(&self, uid: WindowUid) -> Option<PageState>;

    /// Pending render-target work. Empty when the host installed its own
    /// render target sink.
    fn drain_render_notices(&self) -> Vec<RenderTargetNotice>;

    /// Target currently bound to the window. Always `None` with a host sink.
    fn render_target(&self, uid: WindowUid) -> Option<RenderTarget>;
}

pub type BrowserApiRef = Arc<dyn BrowserApi + Send + Sync>;

/// `BrowserApi` over the live dispatcher.
pub struct BrowserHandle {
    dispatcher: Arc<EventDispatcher>,
    bridge: NativeBridgeRef,
    navigation: Arc<NavigationState>,
    render_queue: Option<Arc<RenderTargetQueue>>,
}

impl BrowserHandle {
    pub fn new(
        dispatcher: Arc<EventDispatcher>,
        bridge: NativeBridgeRef,
        navigation: Arc<NavigationState>,
        render_queue: Option<Arc<RenderTargetQueue>>,
    ) -> Self {
        Self {
            dispatcher,
            bridge,
            navigation,
            render_queue,
        }
    }
}

impl BrowserApi for BrowserHandle {
    fn request_window(&self, width: u32, height: u32) -> BrowserResult<WindowUid> {
        self.dispatcher.request_window(width, height)
    }

    fn close_window(&self, uid: WindowUid) -> BrowserResult<()> {
        let index = self.window(uid).and_then(|w| w.window_index);
        let res = self.dispatcher.close_window(uid);
        if let Some(index) = index {
            self.navigation.forget(index);
        }
        res
    }

    fn window(&self, uid: WindowUid) -> Option<Window> {
        self.dispatcher.registry().lookup(uid)
    }

    fn windows(&self) -> Vec<Window> {
        self.dispatcher.registry().live_windows()
    }

    fn control(&self, uid: WindowUid, control: &WindowControl) -> BrowserResult<()> {
        self.dispatcher.send_control(uid, control)
    }

    fn send_pointer(&self, uid: WindowUid, event: PointerEvent) -> BrowserResult<()> {
        let index = self.dispatcher.active_index(uid)?;
        self.bridge.send_pointer_event(index, event);
        Ok(())
    }

    fn pointer_position(&self, uid: WindowUid, u: f32, v: f32) -> BrowserResult<(i32, i32)> {
        let w = self.window(uid).ok_or(BrowserError::UnknownWindow(uid))?;
        if !w.is_active() {
            return Err(BrowserError::NotActive(uid));
        }
        Ok(window_coord_for_tex_coord(u, v, w.width, w.height))
    }

    fn send_key(&self, uid: WindowUid, is_down: bool, event: KeyEvent) -> BrowserResult<()> {
        let index = self.dispatcher.active_index(uid)?;
        self.bridge.send_key_event(index, is_down, event);
        Ok(())
    }

    fn ime_press(&self, event: KeyEvent) -> bool {
        self.dispatcher.ime().press(self.bridge.as_ref(), event)
    }

    fn ime_complete(&self) -> bool {
        self.dispatcher.ime().complete(self.bridge.as_ref())
    }

    fn ime_dismiss(&self) -> bool {
        self.dispatcher.ime().dismiss(self.bridge.as_ref())
    }

    fn ime_active(&self) -> bool {
        self.dispatcher.ime().is_active()
    }

    fn page(&self, uid: WindowUid) -> Option<PageState> {
        let index = self.window(uid)?.window_index?;
        self.navigation.page(index)
    }

    fn drain_render_notices(&self) -> Vec<RenderTargetNotice> {
        self.render_queue
            .as_ref()
            .map(|q| q.drain())
            .unwrap_or_default()
    }

    fn render_target(&self, uid: WindowUid) -> Option<RenderTarget> {
        self.render_queue.as_ref()?.target(uid)
    }
}
