use std::fmt;
use thiserror::Error;

use crate::format::TextureFormat;

/// Engine-assigned window identifier, stable for the window's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowUid(pub i32);

/// Handle used to address a window in outbound native calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowIndex(pub i32);

impl fmt::Display for WindowUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for WindowIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `Requested` only exists for host-initiated windows; engine-initiated
/// windows are synthesized directly in `Created`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Requested,
    Created,
    Active,
    Closing,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOrigin {
    HostInitiated,
    EngineInitiated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("window uid={uid}: invalid transition {from:?} -> {to:?}")]
pub struct LifecycleError {
    pub uid: WindowUid,
    pub from: WindowState,
    pub to: WindowState,
}

/// Host-side window entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub uid: WindowUid,
    pub window_index: Option<WindowIndex>,
    pub width: u32,
    pub height: u32,
    pub format: Option<TextureFormat>,
    pub origin: WindowOrigin,
    pub state: WindowState,
}

impl Window {
    /// Entity for a window the host asked the engine to open.
    pub fn requested(uid: WindowUid, width: u32, height: u32) -> Self {
        Self {
            uid,
            window_index: None,
            width,
            height,
            format: None,
            origin: WindowOrigin::HostInitiated,
            state: WindowState::Requested,
        }
    }

    /// Minimal entity for a window the engine opened on its own (popups etc).
    pub fn engine_initiated(uid: WindowUid) -> Self {
        Self {
            uid,
            window_index: None,
            width: 0,
            height: 0,
            format: None,
            origin: WindowOrigin::EngineInitiated,
            state: WindowState::Created,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == WindowState::Active
    }

    /// Applies a creation payload: `Requested -> Created -> Active`, or
    /// `Created -> Active` for synthesized windows.
    pub fn activate(
        &mut self,
        window_index: WindowIndex,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<(), LifecycleError> {
        match self.state {
            WindowState::Requested => self.state = WindowState::Created,
            WindowState::Created => {}
            from => return Err(self.invalid(from, WindowState::Active)),
        }

        self.window_index = Some(window_index);
        self.width = width;
        self.height = height;
        self.format = Some(format);
        self.state = WindowState::Active;
        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), LifecycleError> {
        if self.state != WindowState::Active {
            return Err(self.invalid(self.state, WindowState::Active));
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub fn begin_close(&mut self) -> Result<(), LifecycleError> {
        match self.state {
            WindowState::Requested | WindowState::Created | WindowState::Active => {
                self.state = WindowState::Closing;
                Ok(())
            }
            from => Err(self.invalid(from, WindowState::Closing)),
        }
    }

    pub fn finish_close(&mut self) -> Result<(), LifecycleError> {
        if self.state != WindowState::Closing {
            return Err(self.invalid(self.state, WindowState::Closed));
        }
        self.state = WindowState::Closed;
        Ok(())
    }

    #[inline]
    fn invalid(&self, from: WindowState, to: WindowState) -> LifecycleError {
        LifecycleError {
            uid: self.uid,
            from,
            to,
        }
    }
}
