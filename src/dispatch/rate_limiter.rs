//! Per-Provider Rate Window
//!
//! Rolling request counter with a lazy, non-monotonic reset: the window is
//! reset on the next access after it expires, not by a background timer. A
//! provider idle for several windows therefore does not "catch up" missed
//! resets, and a burst straddling a window boundary can admit up to twice
//! the limit in a short span. Both behaviors are intentional; limiting is
//! advisory rather than a hard SLA.
//!
//! `RateWindow` itself carries no lock. The owning
//! [`ProviderState`](super::state::ProviderState) serializes access per
//! provider.

use std::time::{Duration, Instant};

use crate::registry::RateLimitPolicy;

/// Rate-limit status string exposed by the status contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitStatus {
    Ok,
    LimitReached,
}

impl RateLimitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::LimitReached => "LIMIT_REACHED",
        }
    }
}

impl std::fmt::Display for RateLimitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rolling request counter for one provider
#[derive(Debug, Clone)]
pub struct RateWindow {
    policy: RateLimitPolicy,
    request_count: u32,
    window_start: Instant,
}

impl RateWindow {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            request_count: 0,
            window_start: Instant::now(),
        }
    }

    /// Lazy reset: runs on access, never on a timer. `window_start` jumps
    /// to `now`, it is not advanced by whole windows.
    fn maybe_reset(&mut self, now: Instant) {
        if now.duration_since(self.window_start) >= self.policy.window {
            self.request_count = 0;
            self.window_start = now;
        }
    }

    /// Whether another request fits in the current window. Check only;
    /// recording is a separate operation.
    pub fn allow(&mut self, now: Instant) -> bool {
        self.maybe_reset(now);
        self.request_count < self.policy.max_requests
    }

    /// Count one dispatched request against the window.
    pub fn record(&mut self, now: Instant) {
        self.maybe_reset(now);
        self.request_count += 1;
    }

    /// Give back a slot reserved for an attempt that did not end in a
    /// successful dispatch. Saturating: a reset in between must not
    /// underflow.
    pub fn refund(&mut self) {
        self.request_count = self.request_count.saturating_sub(1);
    }

    pub fn status(&mut self, now: Instant) -> RateLimitStatus {
        if self.allow(now) {
            RateLimitStatus::Ok
        } else {
            RateLimitStatus::LimitReached
        }
    }

    /// End of the current window; the breaker uses this as its default
    /// cooldown deadline.
    pub fn window_end(&self) -> Instant {
        self.window_start + self.policy.window
    }

    pub fn request_count(&self) -> u32 {
        self.request_count
    }

    pub fn window_start(&self) -> Instant {
        self.window_start
    }

    pub fn window_duration(&self) -> Duration {
        self.policy.window
    }
}
