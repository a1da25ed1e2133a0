use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::bridge::{BridgeResult, NativeBridgeRef};
use crate::collab::RenderTargetSink;
use crate::registry::WindowRegistry;
use crate::window::{Window, WindowState};

pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(2000);
pub const DEFAULT_SHUTDOWN_POLL: Duration = Duration::from_millis(1);

/* =============================================================================================
   Signal
   ============================================================================================= */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    Idle,
    Waiting,
    Acknowledged,
}

/// One-shot acknowledgement the native engine raises from any thread once
/// its own teardown is done.
#[derive(Debug)]
pub struct ShutdownSignal {
    phase: Mutex<ShutdownPhase>,
    cv: Condvar,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self {
            phase: Mutex::new(ShutdownPhase::Idle),
            cv: Condvar::new(),
        }
    }
}

impl ShutdownSignal {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn phase(&self) -> ShutdownPhase {
        *self.phase.lock()
    }

    #[inline]
    pub fn is_acknowledged(&self) -> bool {
        self.phase() == ShutdownPhase::Acknowledged
    }

    /// `Idle -> Waiting`. An acknowledgement that already landed is kept.
    pub fn arm(&self) {
        let mut phase = self.phase.lock();
        if *phase == ShutdownPhase::Idle {
            *phase = ShutdownPhase::Waiting;
        }
    }

    pub fn acknowledge(&self) {
        *self.phase.lock() = ShutdownPhase::Acknowledged;
        self.cv.notify_all();
    }

    /// Blocks for at most `timeout`. Returns true once acknowledged.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        let mut phase = self.phase.lock();
        if *phase != ShutdownPhase::Acknowledged && !timeout.is_zero() {
            let _ = self.cv.wait_for(&mut phase, timeout);
        }
        *phase == ShutdownPhase::Acknowledged
    }

    pub fn reset(&self) {
        *self.phase.lock() = ShutdownPhase::Idle;
    }
}

/* =============================================================================================
   Clock
   ============================================================================================= */

/// Monotonic time source for the shutdown budget.
pub trait Clock: Send + Sync {
    /// Time since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/* =============================================================================================
   Coordinator
   ============================================================================================= */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    pub acknowledged: bool,
    pub timed_out: bool,
    pub elapsed: Duration,
    pub windows_closed: usize,
}

/// Orders host render-target release before native teardown, waits a
/// bounded time for the engine's acknowledgement, then closes every window
/// and finalizes the session. Consumed by `run`, so finalize happens once.
pub struct ShutdownCoordinator {
    registry: Arc<WindowRegistry>,
    bridge: NativeBridgeRef,
    signal: Arc<ShutdownSignal>,
    render_targets: Option<Arc<dyn RenderTargetSink>>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
    poll: Duration,
}

impl ShutdownCoordinator {
    pub fn new(
        registry: Arc<WindowRegistry>,
        bridge: NativeBridgeRef,
        signal: Arc<ShutdownSignal>,
    ) -> Self {
        Self {
            registry,
            bridge,
            signal,
            render_targets: None,
            clock: Arc::new(SystemClock::default()),
            timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            poll: DEFAULT_SHUTDOWN_POLL,
        }
    }

    pub fn with_render_targets(mut self, sink: Option<Arc<dyn RenderTargetSink>>) -> Self {
        self.render_targets = sink;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }

    pub fn run(self) -> BridgeResult<ShutdownReport> {
        // Armed first: releasing render targets can already provoke the ack.
        self.signal.arm();

        let live = self.registry.live_windows();
        log::info!("browser: shutdown started, {} live window(s)", live.len());

        // 1. host render resources go before anything native.
        match &self.render_targets {
            // Closing entries were released by their own close.
            Some(sink) => live
                .iter()
                .filter(|w| w.state != WindowState::Closing)
                .for_each(|w| sink.release_window(w)),
            None if !live.is_empty() => {
                log::debug!("browser: no render target sink, nothing to release")
            }
            None => {}
        }

        // 2..4. service and wait.
        let (acknowledged, timed_out, elapsed) = self.await_acknowledgement(&live);
        if timed_out {
            log::warn!(
                "browser: no shutdown acknowledgement after {} ms, forcing teardown",
                elapsed.as_millis()
            );
        }

        // 5.
        self.bridge.flush_log();

        // 6.
        let windows_closed = self.close_all();

        let report = ShutdownReport {
            acknowledged,
            timed_out,
            elapsed,
            windows_closed,
        };
        log::info!("browser: shutdown report {report:?}");

        // 7.
        let finalized = self.bridge.finalize();
        self.signal.reset();
        finalized.map(|()| report)
    }

    fn await_acknowledgement(&self, live: &[Window]) -> (bool, bool, Duration) {
        let designated = live.iter().filter_map(|w| w.window_index).min();
        let start = self.clock.now();

        let Some(index) = designated else {
            log::debug!("browser: no window to service, skipping shutdown wait");
            return (self.signal.is_acknowledged(), false, Duration::ZERO);
        };

        loop {
            let elapsed = self.clock.now().saturating_sub(start);
            if self.signal.is_acknowledged() {
                return (true, false, elapsed);
            }
            if elapsed >= self.timeout {
                return (false, true, elapsed);
            }

            // Acknowledgement delivery is driven by servicing.
            self.bridge.service_window_events(index);

            let slice = self.poll.min(self.timeout - elapsed);
            if self.signal.wait_for(slice) {
                let elapsed = self.clock.now().saturating_sub(start);
                return (true, false, elapsed);
            }
        }
    }

    fn close_all(&self) -> usize {
        let mut closed = 0;
        for window in self.registry.live_windows() {
            let res = self.registry.update(window.uid, |w| {
                if w.state != WindowState::Closing {
                    w.begin_close()?;
                }
                w.finish_close()
            });
            if let Some(Err(e)) = res {
                log::warn!("browser: {e}");
            }
            if self.registry.remove(window.uid).is_some() {
                closed += 1;
            }
        }
        closed
    }
}
