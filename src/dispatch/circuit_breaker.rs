//! Per-Provider Circuit Breaker
//!
//! A deliberately simple 2-state breaker (Closed/Open) rather than the
//! canonical 3-state design: once the cooldown deadline passes, the next
//! `is_open` check observes expiry and the next attempt is a normal
//! attempt. There is no half-open probing state.
//!
//! ## Transitions
//!
//! ```text
//! Closed --[threshold consecutive failures]--> Open
//! Open   --[cooldown deadline elapsed]-------> Closed
//! ```
//!
//! Opening resets the consecutive-failure count to zero. Like
//! [`RateWindow`](super::rate_limiter::RateWindow), this struct carries no
//! lock; the owning `ProviderState` serializes access.

use std::time::Instant;

/// Consecutive-failure breaker for one provider
#[derive(Debug, Clone)]
pub struct Breaker {
    threshold: u32,
    consecutive_failures: u32,
    open_until: Option<Instant>,
}

impl Breaker {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            consecutive_failures: 0,
            open_until: None,
        }
    }

    /// True while the cooldown deadline lies in the future. The provider is
    /// skipped unconditionally while open.
    pub fn is_open(&self, now: Instant) -> bool {
        self.open_until.is_some_and(|until| until > now)
    }

    /// Count one failure. Reaching the threshold opens the circuit until
    /// `cooldown_until` and resets the failure count.
    pub fn record_failure(&mut self, cooldown_until: Instant) {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.threshold {
            self.open_until = Some(cooldown_until);
            self.consecutive_failures = 0;
        }
    }

    /// A single success fully recovers the provider: failure count cleared,
    /// any open deadline dropped.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.open_until = None;
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}
