use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tokio::time::{Duration, Instant};
use parking_lot::Mutex;

/// Service-wide cap on provider calls.
///
/// The per-request fan-out already bounds in-flight fetches for one
/// portfolio; this limiter bounds them across all concurrent requests and
/// optionally spaces calls to stay within a provider's per-minute quota.
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    next_slot: Mutex<Instant>,
    min_delay: Option<Duration>,
}

impl RateLimiter {
    /// `requests_per_minute == 0` disables spacing.
    pub fn new(max_concurrent: usize, requests_per_minute: u32) -> Self {
        let min_delay = (requests_per_minute > 0)
            .then(|| Duration::from_millis(60_000 / requests_per_minute as u64));
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            next_slot: Mutex::new(Instant::now()),
            min_delay,
        }
    }

    pub fn unlimited_rate(max_concurrent: usize) -> Self {
        Self::new(max_concurrent, 0)
    }

    /// Wait for a concurrency permit and, when spacing is on, for this
    /// caller's time slot. The permit is released when the guard drops.
    pub async fn acquire(&self) -> Result<RateLimitGuard, AcquireError> {
        let permit = self.semaphore.clone().acquire_owned().await?;

        if let Some(delay) = self.min_delay {
            // Reserve a slot under the lock, sleep outside it
            let slot = {
                let mut next = self.next_slot.lock();
                let now = Instant::now();
                let slot = if *next > now { *next } else { now };
                *next = slot + delay;
                slot
            };
            tokio::time::sleep_until(slot).await;
        }

        Ok(RateLimitGuard { _permit: permit })
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

pub struct RateLimitGuard {
    _permit: OwnedSemaphorePermit,
}
