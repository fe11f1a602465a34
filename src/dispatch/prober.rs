//! Availability Prober
//!
//! Pre-flight liveness gate, distinct from actually serving a request. The
//! probe never errors (every failure maps to `false`) and never counts
//! against a provider's rate budget. Candidates that are rate-limited or
//! circuit-open are never probed; the dispatcher short-circuits first to
//! save the round-trip.

use std::time::Duration;

use tracing::debug;

use crate::constants::probe;
use crate::providers::Provider;

/// Short-timeout liveness checker
#[derive(Debug, Clone)]
pub struct Prober {
    timeout: Duration,
}

impl Default for Prober {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(probe::TIMEOUT_MS),
        }
    }
}

impl Prober {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Probe the provider. Timeouts and errors both read as "unavailable".
    pub async fn probe(&self, provider: &dyn Provider) -> bool {
        match tokio::time::timeout(self.timeout, provider.probe()).await {
            Ok(Ok(alive)) => alive,
            Ok(Err(e)) => {
                debug!(provider = provider.name(), error = %e, "Probe errored");
                false
            }
            Err(_) => {
                debug!(
                    provider = provider.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Probe timed out"
                );
                false
            }
        }
    }
}
