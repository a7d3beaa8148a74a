use core::{future::poll_fn, task::Poll};

use embassy_sync::waitqueue::AtomicWaker;
use portable_atomic::{AtomicBool, AtomicU32, Ordering};

/// Single-producer, single-consumer event notification.
///
/// Carries no data, only occurrences. Occurrences are counted, so a burst of
/// notifications posted while the waiter is busy is not coalesced: every
/// `notify()` releases exactly one `wait()`.
///
/// `notify()` never blocks and never allocates. It may be called from
/// interrupt context.
pub struct Notification {
    pending: AtomicU32,
    posted: AtomicU32,
    parked: AtomicBool,
    waker: AtomicWaker,
}

impl Default for Notification {
    fn default() -> Self {
        Self::new()
    }
}

impl Notification {
    pub const fn new() -> Self {
        Self {
            pending: AtomicU32::new(0),
            posted: AtomicU32::new(0),
            parked: AtomicBool::new(false),
            waker: AtomicWaker::new(),
        }
    }

    /// Post one occurrence.
    ///
    /// # Returns
    /// `true` if the waiter was parked on this notification and became ready,
    /// i.e. a context switch should be requested when returning from an
    /// interrupt.
    pub fn notify(&self) -> bool {
        self.posted.fetch_add(1, Ordering::Relaxed);
        self.pending.fetch_add(1, Ordering::Release);
        let parked = self.parked.swap(false, Ordering::AcqRel);
        self.waker.wake();
        parked
    }

    /// Consume one occurrence if there is any.
    pub fn try_take(&self) -> bool {
        self.pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                n.checked_sub(1)
            })
            .is_ok()
    }

    /// Wait for and consume one occurrence.
    ///
    /// There is no timeout.
    pub async fn wait(&self) {
        poll_fn(|cx| {
            if self.try_take() {
                return Poll::Ready(());
            }
            self.waker.register(cx.waker());
            self.parked.store(true, Ordering::Release);
            // A notification may have arrived before the waker was in place.
            if self.try_take() {
                self.parked.store(false, Ordering::Relaxed);
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await
    }

    /// Occurrences posted but not yet consumed.
    pub fn pending(&self) -> u32 {
        self.pending.load(Ordering::Acquire)
    }

    /// Total number of occurrences ever posted. Wraps.
    pub fn posted(&self) -> u32 {
        self.posted.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::{block_on, poll_once};

    #[test]
    fn counting() {
        let n = Notification::new();
        assert!(!n.try_take());
        for _ in 0..3 {
            n.notify();
        }
        assert_eq!(n.pending(), 3);
        for _ in 0..3 {
            block_on(n.wait());
        }
        assert_eq!(n.pending(), 0);
        assert_eq!(n.posted(), 3);
        assert!(poll_once(n.wait()).is_pending());
    }

    #[test]
    fn preemption_hint() {
        let n = Notification::new();
        // Nobody waiting.
        assert!(!n.notify());
        assert!(n.try_take());

        let mut wait = core::pin::pin!(n.wait());
        assert!(poll_once(wait.as_mut()).is_pending());
        assert!(n.notify());
        assert!(poll_once(wait.as_mut()).is_ready());
        // Not parked anymore.
        assert!(!n.notify());
    }
}
