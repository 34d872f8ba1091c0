// crates/strata-engine/src/limiter.rs
//
// Shared rate limiter: one instance gates ledger calls across all workers.
// Grant slots are reserved under a mutex; the sleep happens outside the
// lock so queued workers each get consecutive, correctly spaced slots.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum spacing between granted calls across all callers.
#[derive(Debug)]
pub struct RateLimiter {
    min_spacing: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_spacing: Duration) -> Self {
        Self {
            min_spacing,
            next_slot: Mutex::new(None),
        }
    }

    /// Block until the shared minimum spacing since the last granted call
    /// has elapsed, then grant.
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(last) => now.max(last + self.min_spacing),
                None => now,
            };
            *next = Some(slot);
            slot
        };

        tokio::time::sleep_until(slot).await;
    }
}
