//! Provider Registry
//!
//! Static catalog of backend provider descriptors, constructed once at
//! startup from configuration and environment. Immutable afterwards, so
//! unsynchronized concurrent reads are safe.
//!
//! Ordering: ascending priority, with equal priorities resolving to
//! registration order. The tie-break is an explicit rule here, enforced by
//! a stable sort at construction.

use secrecy::SecretString;
use std::env;
use std::time::Duration;

use crate::config::{Config, ProviderSettings};
use crate::types::{GateError, RequestType, Result};

/// Requests-per-window policy for one provider
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

/// Immutable-after-load descriptor for one backend provider
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    /// Unique key
    pub name: String,
    /// Lower is tried first
    pub priority: u32,
    /// Request types this provider can serve; empty means all
    pub capabilities: Vec<RequestType>,
    pub rate_limit: RateLimitPolicy,
    /// Opaque endpoint handle, used only by the invocation capability
    pub endpoint: String,
    pub model: String,
    /// Flips only if credentials are rotated; captured at load here
    pub credentials_present: bool,
    /// Resolved API key, never serialized or logged
    pub api_key: Option<SecretString>,
}

impl ProviderDescriptor {
    /// Whether this provider declares support for the given request type
    pub fn supports(&self, request_type: RequestType) -> bool {
        self.capabilities.is_empty() || self.capabilities.contains(&request_type)
    }
}

/// Priority-ordered, read-only catalog of provider descriptors
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<ProviderDescriptor>,
}

impl ProviderRegistry {
    /// Build a registry from descriptors. Sorting is stable, so equal
    /// priorities keep registration order.
    pub fn new(mut providers: Vec<ProviderDescriptor>) -> Self {
        providers.sort_by_key(|p| p.priority);
        Self { providers }
    }

    /// Build from configuration, resolving API keys from the environment.
    pub fn from_config(config: &Config) -> Result<Self> {
        let descriptors = config
            .providers
            .iter()
            .map(Self::descriptor_from_settings)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(descriptors))
    }

    fn descriptor_from_settings(settings: &ProviderSettings) -> Result<ProviderDescriptor> {
        if settings.endpoint.trim().is_empty() {
            return Err(GateError::Config(format!(
                "provider '{}': endpoint must not be empty",
                settings.name
            )));
        }

        let api_key = settings
            .api_key_env
            .as_deref()
            .and_then(|var| env::var(var).ok())
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::from);

        Ok(ProviderDescriptor {
            name: settings.name.clone(),
            priority: settings.priority,
            capabilities: settings.capabilities.clone(),
            rate_limit: RateLimitPolicy {
                max_requests: settings.rate_limit.max_requests,
                window: Duration::from_secs(settings.rate_limit.window_secs),
            },
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            credentials_present: api_key.is_some(),
            api_key,
        })
    }

    /// All descriptors, ascending by priority (registration order on ties)
    pub fn list(&self) -> &[ProviderDescriptor] {
        &self.providers
    }

    /// Look up a descriptor by unique name
    pub fn describe(&self, name: &str) -> Option<&ProviderDescriptor> {
        self.providers.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
