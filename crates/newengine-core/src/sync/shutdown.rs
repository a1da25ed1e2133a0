use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative shutdown token.
///
/// Platform adapter may set it from ctrl-c, window close, etc.
/// The engine checks it once per frame and stops stepping when set.
#[derive(Clone, Default)]
pub struct ShutdownToken {
    flag: Arc<AtomicBool>,
}

impl ShutdownToken {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn request(&self) {
        self.flag.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Returns a closure suitable for signal handlers (`ctrlc::set_handler`).
    pub fn requester(&self) -> impl Fn() + Send + 'static {
        let flag = self.flag.clone();
        move || flag.store(true, Ordering::Release)
    }
}
