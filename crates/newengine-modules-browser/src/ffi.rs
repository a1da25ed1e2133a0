//! C ABI of the native browser module.
#![allow(non_camel_case_types)]

use libloading::Library;
use std::os::raw::{c_char, c_int};
use std::path::Path;

use crate::bridge::{BridgeError, BridgeResult};

pub type on_window_created_fn =
    extern "C" fn(uid: c_int, window_index: c_int, width: c_int, height: c_int, format: c_int);
pub type on_window_resized_fn = extern "C" fn(uid: c_int, width: c_int, height: c_int);
pub type on_browser_event_fn = extern "C" fn(
    uid: c_int,
    event_type: c_int,
    data0: c_int,
    data1: c_int,
    data_string: *const c_char,
);
pub type on_log_fn = extern "C" fn(line: *const c_char);

/// Function table resolved from the native library.
///
/// Status-returning calls use 0 for success. String getters copy into
/// `buf` (NUL-terminated, truncated to `len`) and return the full length
/// required, excluding the terminator, or a negative value on failure.
#[derive(Clone, Copy)]
pub(crate) struct NativeApi {
    pub init: unsafe extern "C" fn(
        on_window_created_fn,
        on_window_resized_fn,
        on_browser_event_fn,
        *const c_char,
    ) -> c_int,
    pub set_param_bool: unsafe extern "C" fn(*const c_char, c_int),
    pub set_param_string: unsafe extern "C" fn(*const c_char, *const c_char),
    pub request_new_window: unsafe extern "C" fn(c_int, c_int, c_int) -> c_int,
    pub close_window: unsafe extern "C" fn(c_int) -> c_int,
    pub service_window_events: unsafe extern "C" fn(c_int),
    pub send_pointer_event: unsafe extern "C" fn(c_int, c_int, c_int, c_int, c_int, c_int, c_int),
    pub send_key_event: unsafe extern "C" fn(c_int, c_int, c_int, c_int),
    pub send_window_control_event:
        unsafe extern "C" fn(c_int, c_int, c_int, c_int, *const c_char),
    pub get_window_title: unsafe extern "C" fn(c_int, *mut c_char, c_int) -> c_int,
    pub get_window_url: unsafe extern "C" fn(c_int, *mut c_char, c_int) -> c_int,
    pub finalize: unsafe extern "C" fn() -> c_int,
    pub register_log_callback: unsafe extern "C" fn(Option<on_log_fn>),
    pub set_log_level: unsafe extern "C" fn(c_int),
    pub flush_log: unsafe extern "C" fn(),
}

impl NativeApi {
    /// Resolves every entry point; a missing one fails the whole load.
    ///
    /// # Safety
    /// The library must export these symbols with exactly these signatures,
    /// and must outlive every copy of the returned table.
    pub(crate) unsafe fn resolve(lib: &Library, path: &Path) -> BridgeResult<Self> {
        unsafe {
            Ok(Self {
                init: symbol(lib, path, "nb_init")?,
                set_param_bool: symbol(lib, path, "nb_set_param_bool")?,
                set_param_string: symbol(lib, path, "nb_set_param_string")?,
                request_new_window: symbol(lib, path, "nb_request_new_window")?,
                close_window: symbol(lib, path, "nb_close_window")?,
                service_window_events: symbol(lib, path, "nb_service_window_events")?,
                send_pointer_event: symbol(lib, path, "nb_send_pointer_event")?,
                send_key_event: symbol(lib, path, "nb_send_key_event")?,
                send_window_control_event: symbol(lib, path, "nb_send_window_control_event")?,
                get_window_title: symbol(lib, path, "nb_get_window_title")?,
                get_window_url: symbol(lib, path, "nb_get_window_url")?,
                finalize: symbol(lib, path, "nb_finalize")?,
                register_log_callback: symbol(lib, path, "nb_register_log_callback")?,
                set_log_level: symbol(lib, path, "nb_set_log_level")?,
                flush_log: symbol(lib, path, "nb_flush_log")?,
            })
        }
    }
}

unsafe fn symbol<T: Copy>(lib: &Library, path: &Path, name: &'static str) -> BridgeResult<T> {
    let mut bytes = Vec::with_capacity(name.len() + 1);
    bytes.extend_from_slice(name.as_bytes());
    bytes.push(0);

    let sym = unsafe { lib.get::<T>(&bytes) }.map_err(|_| BridgeError::MissingSymbol {
        name,
        path: path.to_path_buf(),
    })?;

    // Copy the pointer out; the borrow of `lib` ends here.
    Ok(*sym)
}
