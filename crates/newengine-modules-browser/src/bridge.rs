use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::event::RawBrowserEvent;
use crate::input::{KeyEvent, PointerEvent, WindowControl};
use crate::window::{WindowIndex, WindowUid};

pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("load library failed file='{path}': {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("missing symbol '{name}' in '{path}'")]
    MissingSymbol { name: &'static str, path: PathBuf },

    #[error("browser session already initialized")]
    AlreadyInitialized,

    #[error("no live browser session")]
    NotInitialized,

    #[error("parameter '{0}' rejected: session already initialized")]
    ParametersLocked(String),

    #[error("string argument contains an interior NUL byte")]
    InteriorNul,

    #[error("native call '{call}' failed with status {status}")]
    Native { call: &'static str, status: i32 },
}

/// Callbacks the native engine invokes. May be called from any thread, at any
/// time after `initialize`, including reentrantly from inside a bridge call.
/// Implementations must never panic or fail back across the boundary.
pub trait BrowserCallbacks: Send + Sync {
    fn on_window_created(
        &self,
        uid: WindowUid,
        window_index: WindowIndex,
        width: i32,
        height: i32,
        format_code: i32,
    );

    fn on_window_resized(&self, uid: WindowUid, width: i32, height: i32);

    fn on_browser_event(&self, event: RawBrowserEvent);
}

/// Launch-time parameters. Only accepted before `initialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserParam {
    Bool { name: &'static str, value: bool },
    String { name: &'static str, value: String },
}

impl BrowserParam {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool { name, .. } | Self::String { name, .. } => name,
        }
    }
}

pub mod param {
    pub const CLOSE_NATIVE_WINDOW_ON_CLOSE: &str = "close_native_window_on_close";
    pub const HOMEPAGE: &str = "homepage";
    pub const RESOURCES_PATH: &str = "resources_path";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRequest {
    pub uid: WindowUid,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum NativeLogLevel {
    Debug = 0,
    #[default]
    Info = 1,
    Warn = 2,
    Error = 3,
    RelInfo = 4,
}

/// Typed entry points into the native browser module.
///
/// Exactly one session may be live per process. Forwarding calls
/// (pointer/key/control) are fire-and-forget and must be tolerated for
/// windows that are mid-teardown.
pub trait NativeBridge: Send + Sync {
    fn initialize(&self, callbacks: Arc<dyn BrowserCallbacks>, user_agent: &str)
        -> BridgeResult<()>;

    fn set_param(&self, param: BrowserParam) -> BridgeResult<()>;

    /// The window is usable only after the creation callback for `req.uid`.
    fn request_new_window(&self, req: &WindowRequest) -> BridgeResult<()>;

    fn close_window(&self, window_index: WindowIndex) -> BridgeResult<()>;

    fn service_window_events(&self, window_index: WindowIndex);

    fn send_pointer_event(&self, window_index: WindowIndex, event: PointerEvent);

    fn send_key_event(&self, window_index: WindowIndex, is_down: bool, event: KeyEvent);

    fn send_window_control_event(&self, window_index: WindowIndex, control: &WindowControl);

    fn window_title(&self, window_index: WindowIndex) -> Option<String>;

    fn window_url(&self, window_index: WindowIndex) -> Option<String>;

    fn set_log_forwarding(&self, enabled: bool);

    fn set_log_level(&self, level: NativeLogLevel);

    fn flush_log(&self);

    /// Releases the session. Every window must already be closed.
    fn finalize(&self) -> BridgeResult<()>;
}

pub type NativeBridgeRef = Arc<dyn NativeBridge>;
