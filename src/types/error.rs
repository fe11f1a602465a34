//! Unified Error Type System
//!
//! Two layers of errors, matching the availability contract:
//!
//! - [`AttemptError`]: per-provider failures (probe miss, rate window
//!   exhausted, breaker open, invocation failure, missing credentials).
//!   These are always recovered inside the dispatcher and never reach the
//!   caller; they only influence which provider is tried next and are
//!   surfaced in the response's attempt diagnostics.
//! - [`GateError`]: caller-visible failures. For routing this is limited to
//!   request validation; the rest cover configuration, I/O, and JSON.

use thiserror::Error;

/// Why a single provider attempt did not produce the response.
///
/// Every variant is locally recovered by the dispatcher: the chain simply
/// moves on to the next candidate, terminating at the local processor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    /// Liveness probe failed or timed out
    #[error("provider unavailable (probe failed)")]
    ProviderUnavailable,

    /// Rate-limit window exhausted
    #[error("rate limit window exhausted")]
    RateLimited,

    /// Circuit breaker tripped and cooldown has not elapsed
    #[error("circuit breaker open")]
    CircuitOpen,

    /// Descriptor is registered but carries no credentials
    #[error("no credentials configured")]
    NoCredentials,

    /// Provider was invoked and failed (network, timeout, non-success)
    #[error("invocation failed: {0}")]
    InvocationFailed(String),
}

impl AttemptError {
    /// Short machine-readable label used in diagnostics and logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::ProviderUnavailable => "UNAVAILABLE",
            Self::RateLimited => "RATE_LIMITED",
            Self::CircuitOpen => "CIRCUIT_OPEN",
            Self::NoCredentials => "NO_CREDENTIALS",
            Self::InvocationFailed(_) => "INVOCATION_FAILED",
        }
    }
}

/// Application error
#[derive(Debug, Error)]
pub enum GateError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    /// Malformed routing request. The only routing failure a caller can see;
    /// raised before any provider is touched.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("provider not found: {0}")]
    ProviderNotFound(String),

    #[error("config error: {0}")]
    Config(String),

    /// Operation timeout with context
    #[error("timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: std::time::Duration,
    },

    #[error("provider error: {0}")]
    Provider(String),
}

impl GateError {
    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }
}

pub type Result<T> = std::result::Result<T, GateError>;
