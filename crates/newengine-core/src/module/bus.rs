use crossbeam_channel::{Receiver, SendError, Sender};
use std::sync::atomic::{AtomicU64, Ordering};

/// Command queue (single-consumer).
///
/// Producer side: any module, or any thread holding a `sender()`, can `send/try_send`.
/// Consumer side: exactly one thread (the frame loop) should `try_recv/drain`.
///
/// Runtime-guard:
/// - first consumer thread becomes the owner,
/// - other consumers panic in debug builds.
pub struct Bus<E: Send + 'static> {
    tx: Sender<E>,
    rx: Receiver<E>,
    consumer_guard: ConsumerGuard,
}

impl<E: Send + 'static> Bus<E> {
    #[inline]
    pub fn new(tx: Sender<E>, rx: Receiver<E>) -> Self {
        Self {
            tx,
            rx,
            consumer_guard: ConsumerGuard::new(),
        }
    }

    #[inline]
    pub fn unbounded() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self::new(tx, rx)
    }

    /// Producer handle that can be moved to foreign threads.
    #[inline]
    pub fn sender(&self) -> Sender<E> {
        self.tx.clone()
    }

    #[inline]
    pub fn try_send(&self, ev: E) -> bool {
        self.tx.try_send(ev).is_ok()
    }

    #[inline]
    pub fn send(&self, ev: E) -> Result<(), SendError<E>> {
        self.tx.send(ev)
    }

    /// Single-consumer receive.
    #[inline]
    pub fn try_recv(&self) -> Option<E> {
        self.consumer_guard.assert_or_claim();
        self.rx.try_recv().ok()
    }

    /// Single-consumer drain with callback.
    #[inline]
    pub fn drain<F: FnMut(E)>(&self, mut f: F) -> usize {
        self.consumer_guard.assert_or_claim();
        let mut n = 0usize;
        while let Ok(ev) = self.rx.try_recv() {
            f(ev);
            n += 1;
        }
        n
    }
}

struct ConsumerGuard {
    owner: AtomicU64,
}

impl ConsumerGuard {
    #[inline]
    fn new() -> Self {
        Self {
            owner: AtomicU64::new(0),
        }
    }

    #[inline]
    fn assert_or_claim(&self) {
        let id = consumer_id();
        let cur = self.owner.load(Ordering::Acquire);

        if cur == 0 {
            let _ = self
                .owner
                .compare_exchange(0, id, Ordering::AcqRel, Ordering::Acquire);
            return;
        }

        if cur != id && cfg!(debug_assertions) {
            panic!("Bus<E> single-consumer violation: multiple consumers detected");
        }
    }
}

#[inline]
fn consumer_id() -> u64 {
    // Stable per-thread id; only used to detect a second consumer.
    use std::hash::{Hash, Hasher};
    let tid = std::thread::current().id();
    let mut h = std::collections::hash_map::DefaultHasher::new();
    tid.hash(&mut h);
    let v = h.finish();
    if v == 0 {
        1
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreign_producers_reach_the_consumer() {
        let bus: Bus<u32> = Bus::unbounded();
        let tx = bus.sender();
        std::thread::spawn(move || {
            for i in 0..4 {
                tx.send(i).unwrap();
            }
        })
        .join()
        .unwrap();

        let mut got = Vec::new();
        assert_eq!(bus.drain(|v| got.push(v)), 4);
        assert_eq!(got, vec![0, 1, 2, 3]);
        assert!(bus.try_recv().is_none());
    }
}
