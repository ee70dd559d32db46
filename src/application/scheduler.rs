//! Turn-pacing scheduler.
//!
//! Serializes turns: at most one transport call is outstanding per engine.
//! A second attempt while the input lock is held is dropped, not queued.
//! Once a response arrives the scheduler holds it for the pacing delay
//! before the engine reveals it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::PacingPolicy;

/// Input lock plus reveal pacing.
pub struct TurnScheduler {
    pacing: Arc<dyn PacingPolicy>,
    locked: AtomicBool,
}

impl TurnScheduler {
    pub fn new(pacing: Arc<dyn PacingPolicy>) -> Self {
        Self {
            pacing,
            locked: AtomicBool::new(false),
        }
    }

    /// Takes the input lock, or returns None if it is already held.
    pub fn try_lock(&self) -> Option<InputGuard<'_>> {
        self.locked
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InputGuard {
                locked: &self.locked,
            })
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    /// Suspends for the policy's reveal delay and returns it.
    pub async fn hold(&self) -> Duration {
        let delay = self.pacing.reveal_delay();
        tracing::debug!(delay_ms = delay.as_millis() as u64, "holding bot turn");
        if !delay.is_zero() {
            sleep(delay).await;
        }
        delay
    }
}

impl std::fmt::Debug for TurnScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnScheduler")
            .field("locked", &self.is_locked())
            .finish_non_exhaustive()
    }
}

/// Held input lock; released on drop, including when the owning future is
/// dropped mid-call.
#[derive(Debug)]
pub struct InputGuard<'a> {
    locked: &'a AtomicBool,
}

impl Drop for InputGuard<'_> {
    fn drop(&mut self) {
        self.locked.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::pacing::FixedPacing;

    fn scheduler(delay: Duration) -> TurnScheduler {
        TurnScheduler::new(Arc::new(FixedPacing::new(delay)))
    }

    #[test]
    fn second_lock_attempt_fails_while_held() {
        let scheduler = scheduler(Duration::ZERO);
        let guard = scheduler.try_lock();
        assert!(guard.is_some());
        assert!(scheduler.is_locked());
        assert!(scheduler.try_lock().is_none());
    }

    #[test]
    fn lock_is_released_on_drop() {
        let scheduler = scheduler(Duration::ZERO);
        drop(scheduler.try_lock());
        assert!(!scheduler.is_locked());
        assert!(scheduler.try_lock().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn hold_waits_for_pacing_delay() {
        let scheduler = scheduler(Duration::from_millis(800));
        let started = tokio::time::Instant::now();
        let delay = scheduler.hold().await;
        assert_eq!(delay, Duration::from_millis(800));
        assert!(started.elapsed() >= Duration::from_millis(800));
    }

    #[tokio::test]
    async fn zero_delay_returns_immediately() {
        let scheduler = scheduler(Duration::ZERO);
        assert_eq!(scheduler.hold().await, Duration::ZERO);
    }
}
