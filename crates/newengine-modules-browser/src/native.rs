#![forbid(unsafe_op_in_unsafe_fn)]

use libloading::Library;
use parking_lot::RwLock;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::bridge::{
    BridgeError, BridgeResult, BrowserCallbacks, BrowserParam, NativeBridge, NativeLogLevel,
    WindowRequest,
};
use crate::event::RawBrowserEvent;
use crate::ffi::NativeApi;
use crate::input::{KeyEvent, PointerEvent, WindowControl};
use crate::log_route::route_native_line;
use crate::window::{WindowIndex, WindowUid};

/* =============================================================================================
   Process-wide session state
   ============================================================================================= */

/// Native callbacks carry no user data, so the live dispatcher is reachable
/// through this slot. Installed by `initialize`, cleared by `finalize`.
static CALLBACKS: RwLock<Option<Arc<dyn BrowserCallbacks>>> = parking_lot::const_rwlock(None);

/// At most one session per process, across all bridge instances.
static SESSION_LIVE: AtomicBool = AtomicBool::new(false);

#[inline]
fn active_callbacks() -> Option<Arc<dyn BrowserCallbacks>> {
    // Clone out so the lock is not held while the dispatcher runs; it may
    // reenter the bridge.
    CALLBACKS.read().clone()
}

/// Runs `f`, swallowing any panic so nothing unwinds into native frames.
fn boundary(name: &'static str, f: impl FnOnce()) {
    if std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)).is_err() {
        log::error!("browser: panic in native callback '{name}' suppressed");
    }
}

/* =============================================================================================
   Trampolines
   ============================================================================================= */

extern "C" fn on_window_created(
    uid: c_int,
    window_index: c_int,
    width: c_int,
    height: c_int,
    format: c_int,
) {
    boundary("on_window_created", || match active_callbacks() {
        Some(cb) => cb.on_window_created(
            WindowUid(uid),
            WindowIndex(window_index),
            width,
            height,
            format,
        ),
        None => log::warn!("browser: window created uid={uid} with no live session, dropped"),
    });
}

extern "C" fn on_window_resized(uid: c_int, width: c_int, height: c_int) {
    boundary("on_window_resized", || match active_callbacks() {
        Some(cb) => cb.on_window_resized(WindowUid(uid), width, height),
        None => log::warn!("browser: window resized uid={uid} with no live session, dropped"),
    });
}

extern "C" fn on_browser_event(
    uid: c_int,
    event_type: c_int,
    data0: c_int,
    data1: c_int,
    data_string: *const c_char,
) {
    boundary("on_browser_event", || {
        // SAFETY: the native side passes NULL or a NUL-terminated string valid for this call.
        let text = unsafe { opt_string(data_string) };
        match active_callbacks() {
            Some(cb) => cb.on_browser_event(RawBrowserEvent {
                uid: WindowUid(uid),
                event_type,
                data0,
                data1,
                text,
            }),
            None => log::warn!(
                "browser: event type={event_type} uid={uid} with no live session, dropped"
            ),
        }
    });
}

extern "C" fn on_log(line: *const c_char) {
    boundary("on_log", || {
        // SAFETY: as above.
        if let Some(line) = unsafe { opt_string(line) } {
            route_native_line(&line);
        }
    });
}

/// # Safety
/// `p` must be NULL or point to a NUL-terminated string.
unsafe fn opt_string(p: *const c_char) -> Option<String> {
    if p.is_null() {
        return None;
    }
    let s = unsafe { CStr::from_ptr(p) };
    Some(s.to_string_lossy().into_owned())
}

/* =============================================================================================
   Bridge
   ============================================================================================= */

/// `NativeBridge` backed by a dynamically loaded native browser module.
pub struct NativeLibraryBridge {
    api: NativeApi,
    path: PathBuf,
    /// This instance owns the process session.
    session: AtomicBool,
    log_forwarding: AtomicBool,
    // Dropped last: `api` points into it.
    _lib: Library,
}

impl NativeLibraryBridge {
    pub fn load(path: impl AsRef<Path>) -> BridgeResult<Self> {
        let path = path.as_ref();
        log::info!("browser: loading native module '{}'", path.display());

        // SAFETY: loading runs the library's initializers; the module is trusted.
        let lib = unsafe { Library::new(path) }.map_err(|e| BridgeError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        // SAFETY: `lib` is stored next to `api` and outlives it.
        let api = unsafe { NativeApi::resolve(&lib, path) }?;

        Ok(Self {
            api,
            path: path.to_path_buf(),
            session: AtomicBool::new(false),
            log_forwarding: AtomicBool::new(false),
            _lib: lib,
        })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    fn live(&self) -> bool {
        self.session.load(Ordering::Acquire)
    }

    fn read_string(
        &self,
        window_index: WindowIndex,
        getter: unsafe extern "C" fn(c_int, *mut c_char, c_int) -> c_int,
    ) -> Option<String> {
        if !self.live() {
            return None;
        }

        let mut buf: Vec<u8> = vec![0; 1024];
        for _ in 0..2 {
            let cap = c_int::try_from(buf.len()).ok()?;
            // SAFETY: `buf` is writable for `cap` bytes.
            let needed = unsafe { getter(window_index.0, buf.as_mut_ptr().cast(), cap) };
            let needed = usize::try_from(needed).ok()?;
            if needed < buf.len() {
                buf.truncate(needed);
                return Some(String::from_utf8_lossy(&buf).into_owned());
            }
            buf = vec![0; needed + 1];
        }
        None
    }
}

fn cstring(s: &str) -> BridgeResult<CString> {
    CString::new(s).map_err(|_| BridgeError::InteriorNul)
}

fn status(call: &'static str, status: c_int) -> BridgeResult<()> {
    if status == 0 {
        Ok(())
    } else {
        Err(BridgeError::Native { call, status })
    }
}

impl NativeBridge for NativeLibraryBridge {
    fn initialize(
        &self,
        callbacks: Arc<dyn BrowserCallbacks>,
        user_agent: &str,
    ) -> BridgeResult<()> {
        let ua = cstring(user_agent)?;

        if SESSION_LIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(BridgeError::AlreadyInitialized);
        }

        // Callbacks can fire during `init` itself.
        *CALLBACKS.write() = Some(callbacks);
        self.session.store(true, Ordering::Release);

        // SAFETY: trampolines are 'static; `ua` lives across the call.
        let rc = unsafe {
            (self.api.init)(on_window_created, on_window_resized, on_browser_event, ua.as_ptr())
        };

        if let Err(e) = status("init", rc) {
            self.session.store(false, Ordering::Release);
            *CALLBACKS.write() = None;
            SESSION_LIVE.store(false, Ordering::Release);
            return Err(e);
        }

        log::info!("browser: session initialized ({})", self.path.display());
        Ok(())
    }

    fn set_param(&self, param: BrowserParam) -> BridgeResult<()> {
        if self.live() {
            return Err(BridgeError::ParametersLocked(param.name().to_string()));
        }

        let name = cstring(param.name())?;
        match &param {
            // SAFETY: both strings live across the call.
            BrowserParam::Bool { value, .. } => unsafe {
                (self.api.set_param_bool)(name.as_ptr(), c_int::from(*value))
            },
            BrowserParam::String { value, .. } => {
                let value = cstring(value)?;
                unsafe { (self.api.set_param_string)(name.as_ptr(), value.as_ptr()) }
            }
        }
        Ok(())
    }

    fn request_new_window(&self, req: &WindowRequest) -> BridgeResult<()> {
        if !self.live() {
            return Err(BridgeError::NotInitialized);
        }
        let w = c_int::try_from(req.width).unwrap_or(c_int::MAX);
        let h = c_int::try_from(req.height).unwrap_or(c_int::MAX);
        // SAFETY: plain integers.
        let rc = unsafe { (self.api.request_new_window)(req.uid.0, w, h) };
        status("request_new_window", rc)
    }

    fn close_window(&self, window_index: WindowIndex) -> BridgeResult<()> {
        if !self.live() {
            return Err(BridgeError::NotInitialized);
        }
        // SAFETY: plain integer.
        let rc = unsafe { (self.api.close_window)(window_index.0) };
        status("close_window", rc)
    }

    fn service_window_events(&self, window_index: WindowIndex) {
        if self.live() {
            // SAFETY: plain integer.
            unsafe { (self.api.service_window_events)(window_index.0) }
        }
    }

    fn send_pointer_event(&self, window_index: WindowIndex, event: PointerEvent) {
        if !self.live() {
            log::trace!("browser: pointer event for index={window_index} after finalize, dropped");
            return;
        }
        // SAFETY: plain integers.
        unsafe {
            (self.api.send_pointer_event)(
                window_index.0,
                event.kind as c_int,
                event.button_code(),
                event.scroll_x,
                event.scroll_y,
                event.x,
                event.y,
            )
        }
    }

    fn send_key_event(&self, window_index: WindowIndex, is_down: bool, event: KeyEvent) {
        if !self.live() {
            log::trace!("browser: key event for index={window_index} after finalize, dropped");
            return;
        }
        let character = c_int::try_from(event.character).unwrap_or(0);
        // SAFETY: plain integers.
        unsafe {
            (self.api.send_key_event)(
                window_index.0,
                c_int::from(is_down),
                event.key as c_int,
                character,
            )
        }
    }

    fn send_window_control_event(&self, window_index: WindowIndex, control: &WindowControl) {
        if !self.live() {
            log::trace!("browser: control event for index={window_index} after finalize, dropped");
            return;
        }
        let wire = control.wire();
        let s = match wire.s.map(cstring).transpose() {
            Ok(s) => s,
            Err(e) => {
                log::warn!("browser: control event {control:?} dropped: {e}");
                return;
            }
        };
        let s_ptr = s.as_ref().map_or(std::ptr::null(), |s| s.as_ptr());
        // SAFETY: `s` lives across the call.
        unsafe {
            (self.api.send_window_control_event)(window_index.0, wire.id, wire.a, wire.b, s_ptr)
        }
    }

    fn window_title(&self, window_index: WindowIndex) -> Option<String> {
        self.read_string(window_index, self.api.get_window_title)
    }

    fn window_url(&self, window_index: WindowIndex) -> Option<String> {
        self.read_string(window_index, self.api.get_window_url)
    }

    fn set_log_forwarding(&self, enabled: bool) {
        self.log_forwarding.store(enabled, Ordering::Release);
        let cb: Option<crate::ffi::on_log_fn> = if enabled { Some(on_log) } else { None };
        // SAFETY: `on_log` is 'static.
        unsafe { (self.api.register_log_callback)(cb) }
    }

    fn set_log_level(&self, level: NativeLogLevel) {
        // SAFETY: plain integer.
        unsafe { (self.api.set_log_level)(level as c_int) }
    }

    fn flush_log(&self) {
        // SAFETY: no arguments.
        unsafe { (self.api.flush_log)() }
    }

    fn finalize(&self) -> BridgeResult<()> {
        if self
            .session
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(BridgeError::NotInitialized);
        }

        // SAFETY: no arguments.
        let rc = unsafe { (self.api.finalize)() };

        *CALLBACKS.write() = None;
        SESSION_LIVE.store(false, Ordering::Release);

        log::info!("browser: session finalized");
        status("finalize", rc)
    }
}

impl Drop for NativeLibraryBridge {
    fn drop(&mut self) {
        if self.live() {
            log::warn!("browser: bridge dropped with a live session, finalizing");
            if let Err(e) = self.finalize() {
                log::error!("browser: finalize on drop failed: {e}");
            }
        }
        if self.log_forwarding.load(Ordering::Acquire) {
            self.set_log_forwarding(false);
        }
    }
}
