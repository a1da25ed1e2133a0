use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::event::FullscreenPhase;
use crate::format::TextureFormat;
use crate::window::{Window, WindowIndex, WindowUid};

/// Owner of the host-side render targets bound to window textures.
pub trait RenderTargetSink: Send + Sync {
    /// Window reached `Active`; allocate a target for its texture.
    fn window_activated(&self, window: &Window);

    /// Dimensions changed; reallocate.
    fn window_resized(&self, window: &Window);

    /// Release everything bound to the window's texture. Always called
    /// before the native side lets go of it.
    fn release_window(&self, window: &Window);

    fn fullscreen_changed(&self, _window_index: WindowIndex, _phase: FullscreenPhase) {}
}

pub trait NavigationSink: Send + Sync {
    fn load_state_changed(&self, window_index: WindowIndex, loading: bool);
    fn history_changed(&self, window_index: WindowIndex, can_go_back: bool, can_go_forward: bool);
    fn title_changed(&self, window_index: WindowIndex, title: &str);
    fn url_changed(&self, window_index: WindowIndex, url: &str);
}

/// On-screen keyboard or any other text entry surface.
pub trait TextInputSink: Send + Sync {
    fn show(&self, window_index: WindowIndex, text: &str, caret_index: i32, multiline: bool);
    fn hide(&self);
}

/// Host collaborators events are forwarded to. Any of them may be absent;
/// events for a missing one are logged and dropped.
#[derive(Clone, Default)]
pub struct Collaborators {
    pub render_targets: Option<Arc<dyn RenderTargetSink>>,
    pub navigation: Option<Arc<dyn NavigationSink>>,
    pub text_input: Option<Arc<dyn TextInputSink>>,
}

/* =============================================================================================
   Queue-backed render target sink
   ============================================================================================= */

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderTargetNotice {
    Activated {
        uid: WindowUid,
        window_index: WindowIndex,
        width: u32,
        height: u32,
        format: TextureFormat,
    },
    Resized {
        uid: WindowUid,
        window_index: WindowIndex,
        width: u32,
        height: u32,
    },
    Released {
        uid: WindowUid,
        window_index: Option<WindowIndex>,
    },
    Fullscreen {
        window_index: WindowIndex,
        phase: FullscreenPhase,
    },
}

/// Host-side target bound to one window texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    pub window_index: WindowIndex,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Default render target sink.
///
/// The target table is updated on the calling thread, so a release is done
/// when `release_window` returns. Notices are marshalled onto the frame loop
/// for whoever wants to follow along.
pub struct RenderTargetQueue {
    targets: Mutex<HashMap<WindowUid, RenderTarget>>,
    tx: Sender<RenderTargetNotice>,
    rx: Receiver<RenderTargetNotice>,
}

impl Default for RenderTargetQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderTargetQueue {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            targets: Mutex::new(HashMap::new()),
            tx,
            rx,
        }
    }

    pub fn target(&self, uid: WindowUid) -> Option<RenderTarget> {
        self.targets.lock().get(&uid).copied()
    }

    #[inline]
    pub fn target_count(&self) -> usize {
        self.targets.lock().len()
    }

    #[inline]
    pub fn receiver(&self) -> Receiver<RenderTargetNotice> {
        self.rx.clone()
    }

    pub fn drain(&self) -> Vec<RenderTargetNotice> {
        self.rx.try_iter().collect()
    }

    fn push(&self, notice: RenderTargetNotice) {
        // Receiver is owned by self, so the channel never disconnects.
        let _ = self.tx.send(notice);
    }
}

impl RenderTargetSink for RenderTargetQueue {
    fn window_activated(&self, window: &Window) {
        let (Some(window_index), Some(format)) = (window.window_index, window.format) else {
            log::warn!("browser: activation notice for uid={} without index/format", window.uid);
            return;
        };
        self.targets.lock().insert(
            window.uid,
            RenderTarget {
                window_index,
                width: window.width,
                height: window.height,
                format,
            },
        );
        self.push(RenderTargetNotice::Activated {
            uid: window.uid,
            window_index,
            width: window.width,
            height: window.height,
            format,
        });
    }

    fn window_resized(&self, window: &Window) {
        let Some(window_index) = window.window_index else {
            return;
        };
        if let Some(t) = self.targets.lock().get_mut(&window.uid) {
            t.width = window.width;
            t.height = window.height;
        }
        self.push(RenderTargetNotice::Resized {
            uid: window.uid,
            window_index,
            width: window.width,
            height: window.height,
        });
    }

    fn release_window(&self, window: &Window) {
        if self.targets.lock().remove(&window.uid).is_some() {
            log::debug!("browser: released render target uid={}", window.uid);
        }
        self.push(RenderTargetNotice::Released {
            uid: window.uid,
            window_index: window.window_index,
        });
    }

    fn fullscreen_changed(&self, window_index: WindowIndex, phase: FullscreenPhase) {
        self.push(RenderTargetNotice::Fullscreen {
            window_index,
            phase,
        });
    }
}
