//! Per-Provider Runtime State
//!
//! One [`ProviderState`] per provider, owned by the dispatcher. All four
//! runtime fields (request count, window start, consecutive failures,
//! breaker deadline) live behind a single mutex so every
//! read-check-then-write sequence is one critical section per provider —
//! concurrent route calls cannot lose updates. Admission (breaker check +
//! window check + slot reservation) is likewise a single critical section,
//! which is what caps successful dispatches at the window limit under real
//! parallelism.

use std::sync::Mutex;
use std::time::Instant;

use super::circuit_breaker::Breaker;
use super::rate_limiter::{RateLimitStatus, RateWindow};
use crate::registry::RateLimitPolicy;
use crate::types::AttemptError;

/// The mutable runtime fields for one provider
#[derive(Debug)]
pub struct ProviderRuntimeState {
    pub window: RateWindow,
    pub breaker: Breaker,
}

/// Snapshot of runtime counters for status reporting
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub request_count: u32,
    pub rate_limit_status: RateLimitStatus,
    pub breaker_open: bool,
    pub consecutive_failures: u32,
}

/// Lock-owning wrapper around one provider's runtime state
#[derive(Debug)]
pub struct ProviderState {
    inner: Mutex<ProviderRuntimeState>,
}

impl ProviderState {
    pub fn new(policy: RateLimitPolicy, breaker_threshold: u32) -> Self {
        Self {
            inner: Mutex::new(ProviderRuntimeState {
                window: RateWindow::new(policy),
                breaker: Breaker::new(breaker_threshold),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProviderRuntimeState> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Atomically check breaker and rate window, and reserve a request slot
    /// on success. The reservation stands for a successful dispatch; callers
    /// must [`refund`](Self::refund) it when the attempt fails, so failed
    /// invocations do not consume rate budget.
    pub fn try_admit(&self) -> Result<(), AttemptError> {
        let now = Instant::now();
        let mut state = self.lock();

        if state.breaker.is_open(now) {
            return Err(AttemptError::CircuitOpen);
        }
        if !state.window.allow(now) {
            return Err(AttemptError::RateLimited);
        }
        state.window.record(now);
        Ok(())
    }

    /// Give back the slot reserved by [`try_admit`](Self::try_admit)
    pub fn refund(&self) {
        self.lock().window.refund();
    }

    /// Non-reserving rate check, used for reporting
    pub fn allow(&self) -> bool {
        self.lock().window.allow(Instant::now())
    }

    /// Count one dispatched request without the admission checks
    pub fn record_request(&self) {
        self.lock().window.record(Instant::now());
    }

    /// True while the breaker deadline lies in the future
    pub fn breaker_open(&self) -> bool {
        self.lock().breaker.is_open(Instant::now())
    }

    /// Record a failed invocation. The breaker cooldown defaults to the
    /// remainder of the current rate-limit window.
    pub fn record_failure(&self) {
        let now = Instant::now();
        let mut state = self.lock();

        // Touch the window first so the cooldown is computed against the
        // current window, not a stale one.
        state.window.allow(now);
        let cooldown_until = state.window.window_end();
        state.breaker.record_failure(cooldown_until);
    }

    /// Record a successful invocation: breaker fully recovers.
    pub fn record_success(&self) {
        self.lock().breaker.record_success();
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let now = Instant::now();
        let mut state = self.lock();
        StateSnapshot {
            rate_limit_status: state.window.status(now),
            request_count: state.window.request_count(),
            breaker_open: state.breaker.is_open(now),
            consecutive_failures: state.breaker.consecutive_failures(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn state(max_requests: u32, window_secs: u64, threshold: u32) -> ProviderState {
        ProviderState::new(
            RateLimitPolicy {
                max_requests,
                window: Duration::from_secs(window_secs),
            },
            threshold,
        )
    }

    #[test]
    fn test_admit_up_to_limit() {
        let s = state(2, 60, 3);
        assert!(s.try_admit().is_ok());
        assert!(s.try_admit().is_ok());
        assert_eq!(s.try_admit(), Err(AttemptError::RateLimited));
    }

    #[test]
    fn test_breaker_rejection_takes_precedence() {
        let s = state(10, 60, 1);
        s.record_failure();
        assert_eq!(s.try_admit(), Err(AttemptError::CircuitOpen));
    }

    #[test]
    fn test_refund_after_failed_attempt() {
        let s = state(1, 60, 3);
        assert!(s.try_admit().is_ok());
        s.refund();
        s.record_failure();
        // Budget untouched by the failed attempt
        assert!(s.try_admit().is_ok());
    }

    #[test]
    fn test_breaker_cooldown_is_window_remainder() {
        let s = ProviderState::new(
            RateLimitPolicy {
                max_requests: 10,
                window: Duration::from_millis(80),
            },
            1,
        );
        s.record_failure();
        assert!(s.breaker_open());

        std::thread::sleep(Duration::from_millis(100));
        assert!(!s.breaker_open());
    }

    #[test]
    fn test_success_recovers_breaker() {
        let s = state(10, 60, 2);
        s.record_failure();
        s.record_failure();
        assert!(s.breaker_open());
        s.record_success();
        assert!(!s.breaker_open());
        assert_eq!(s.snapshot().consecutive_failures, 0);
    }

    #[test]
    fn test_snapshot_reports_counters() {
        let s = state(2, 60, 3);
        s.record_request();
        let snap = s.snapshot();
        assert_eq!(snap.request_count, 1);
        assert_eq!(snap.rate_limit_status, RateLimitStatus::Ok);
        assert!(!snap.breaker_open);

        s.record_request();
        assert_eq!(s.snapshot().rate_limit_status, RateLimitStatus::LimitReached);
    }

    #[test]
    fn test_concurrent_admission_never_exceeds_limit() {
        let s = Arc::new(state(10, 3600, 3));
        let mut handles = Vec::new();

        for _ in 0..50 {
            let s = Arc::clone(&s);
            handles.push(std::thread::spawn(move || s.try_admit().is_ok()));
        }

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 10);
        assert_eq!(s.snapshot().request_count, 10);
    }
}
