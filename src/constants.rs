//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Rate limiter constants
pub mod limiter {
    /// Default requests allowed per window
    pub const DEFAULT_MAX_REQUESTS: u32 = 60;

    /// Default window duration (seconds)
    pub const DEFAULT_WINDOW_SECS: u64 = 60;
}

/// Circuit breaker constants
pub mod breaker {
    /// Consecutive failures before opening the circuit
    pub const FAILURE_THRESHOLD: u32 = 3;
}

/// Availability probe constants
pub mod probe {
    /// Probe timeout (milliseconds). Probes must fail fast so a hung
    /// provider cannot stall the whole chain.
    pub const TIMEOUT_MS: u64 = 800;

    /// Token budget for the probe round-trip
    pub const PROBE_MAX_TOKENS: u32 = 1;
}

/// HTTP/Network constants
pub mod network {
    /// Default provider invocation timeout (seconds)
    pub const INVOKE_TIMEOUT_SECS: u64 = 30;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 10;

    /// Default max tokens requested per invocation
    pub const DEFAULT_MAX_TOKENS: u32 = 2048;
}

/// Local processor constants
pub mod local {
    /// Confidence reported for local fallback responses. Remote responses
    /// report [`REMOTE_CONFIDENCE`]; callers use the gap to flag degraded
    /// answers.
    pub const LOCAL_CONFIDENCE: f32 = 0.45;

    /// Confidence reported for remote provider responses
    pub const REMOTE_CONFIDENCE: f32 = 0.9;

    /// Approximate characters per token for estimation heuristics
    pub const CHARS_PER_TOKEN: usize = 4;
}
