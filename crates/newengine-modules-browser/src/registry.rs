use parking_lot::Mutex;
use std::collections::HashMap;
use thiserror::Error;

use crate::window::{Window, WindowIndex, WindowUid};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("window uid={0} is already registered")]
    DuplicateKey(WindowUid),
}

/// uid -> host window entity.
///
/// Single point of truth for uid resolution. Native callbacks may hit it from
/// any thread; every operation holds the lock for its whole read-modify-write.
#[derive(Default)]
pub struct WindowRegistry {
    windows: Mutex<HashMap<WindowUid, Window>>,
}

impl WindowRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn lookup(&self, uid: WindowUid) -> Option<Window> {
        self.windows.lock().get(&uid).cloned()
    }

    pub fn register(&self, window: Window) -> Result<(), RegistryError> {
        let mut windows = self.windows.lock();
        if windows.contains_key(&window.uid) {
            return Err(RegistryError::DuplicateKey(window.uid));
        }
        windows.insert(window.uid, window);
        Ok(())
    }

    /// Returns the entry for `uid`, synthesizing it with `factory` if absent.
    /// The bool is true when this call created it.
    pub fn create_if_absent<F>(&self, uid: WindowUid, factory: F) -> (Window, bool)
    where
        F: FnOnce(WindowUid) -> Window,
    {
        let mut windows = self.windows.lock();
        if let Some(existing) = windows.get(&uid) {
            return (existing.clone(), false);
        }
        let window = factory(uid);
        windows.insert(uid, window.clone());
        (window, true)
    }

    /// Idempotent.
    #[inline]
    pub fn remove(&self, uid: WindowUid) -> Option<Window> {
        self.windows.lock().remove(&uid)
    }

    /// Runs `f` against the entry under the registry lock.
    pub fn update<R>(&self, uid: WindowUid, f: impl FnOnce(&mut Window) -> R) -> Option<R> {
        self.windows.lock().get_mut(&uid).map(f)
    }

    /// Snapshot of every entry, ordered by window index (uncreated last) then uid.
    pub fn live_windows(&self) -> Vec<Window> {
        let mut out: Vec<Window> = self.windows.lock().values().cloned().collect();
        out.sort_by_key(|w| (w.window_index.is_none(), w.window_index, w.uid));
        out
    }

    pub fn active_indices(&self) -> Vec<WindowIndex> {
        self.live_windows()
            .into_iter()
            .filter(|w| w.is_active())
            .filter_map(|w| w.window_index)
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.windows.lock().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.windows.lock().is_empty()
    }
}
