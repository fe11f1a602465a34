//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/promptgate/) and project (.promptgate/) level
//! configuration. Descriptors built from this configuration are immutable
//! after startup.

use serde::{Deserialize, Serialize};

use crate::constants::{breaker, limiter, network, probe};
use crate::types::RequestType;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Dispatcher tuning
    pub dispatcher: DispatcherConfig,

    /// Backend provider catalog, in registration order
    pub providers: Vec<ProviderSettings>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            dispatcher: DispatcherConfig::default(),
            providers: Vec::new(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `GateError::Config` on validation failure.
    pub fn validate(&self) -> crate::types::Result<()> {
        if self.dispatcher.invoke_timeout_secs == 0 {
            return Err(crate::types::GateError::Config(
                "dispatcher.invoke_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.dispatcher.probe_timeout_ms == 0 {
            return Err(crate::types::GateError::Config(
                "dispatcher.probe_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.dispatcher.breaker_threshold == 0 {
            return Err(crate::types::GateError::Config(
                "dispatcher.breaker_threshold must be greater than 0".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for provider in &self.providers {
            if provider.name.trim().is_empty() {
                return Err(crate::types::GateError::Config(
                    "provider name must not be empty".to_string(),
                ));
            }
            if provider.name == "local" {
                return Err(crate::types::GateError::Config(
                    "provider name 'local' is reserved for the fallback processor".to_string(),
                ));
            }
            if !seen.insert(provider.name.as_str()) {
                return Err(crate::types::GateError::Config(format!(
                    "duplicate provider name: {}",
                    provider.name
                )));
            }
            if provider.rate_limit.max_requests == 0 || provider.rate_limit.window_secs == 0 {
                return Err(crate::types::GateError::Config(format!(
                    "provider '{}': rate limit max_requests and window_secs must be greater than 0",
                    provider.name
                )));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Dispatcher Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Consecutive failures before a provider's circuit opens
    pub breaker_threshold: u32,

    /// Liveness probe timeout (milliseconds); far shorter than invocation
    pub probe_timeout_ms: u64,

    /// Provider invocation timeout (seconds), enforced caller-side
    pub invoke_timeout_secs: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            breaker_threshold: breaker::FAILURE_THRESHOLD,
            probe_timeout_ms: probe::TIMEOUT_MS,
            invoke_timeout_secs: network::INVOKE_TIMEOUT_SECS,
        }
    }
}

// =============================================================================
// Provider Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Unique provider name
    pub name: String,

    /// Lower is tried first; equal priorities resolve to registration order
    pub priority: u32,

    /// Chat-completions base URL (e.g. `https://api.openai.com/v1`)
    pub endpoint: String,

    /// Model name sent to the endpoint
    pub model: String,

    /// Request types this provider can serve; empty means all
    pub capabilities: Vec<RequestType>,

    /// Rolling request cap
    pub rate_limit: RateLimitSettings,

    /// Environment variable holding the API key. The key itself never
    /// appears in configuration files.
    pub api_key_env: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            priority: 100,
            endpoint: String::new(),
            model: String::new(),
            capabilities: Vec::new(),
            rate_limit: RateLimitSettings::default(),
            api_key_env: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Requests admitted per window
    pub max_requests: u32,

    /// Window duration in seconds
    pub window_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: limiter::DEFAULT_MAX_REQUESTS,
            window_secs: limiter::DEFAULT_WINDOW_SECS,
        }
    }
}
