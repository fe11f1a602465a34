//! Provider Abstraction
//!
//! Defines the polymorphic `Provider` capability the dispatcher routes
//! through. The dispatcher never branches on provider name; heterogeneous
//! backends all answer through `invoke` and `probe`.
//!
//! ## Variants
//!
//! - `remote`: OpenAI-compatible HTTP backend (reqwest)
//! - `local`: deterministic in-process fallback that can always answer

mod local;
mod remote;

pub use local::{LOCAL_PROVIDER_NAME, LocalProcessor};
pub use remote::RemoteHttpProvider;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::constants::local as local_constants;
use crate::registry::ProviderDescriptor;
use crate::types::{Result, RoutingRequest};

/// Result of one successful provider invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Generated text
    pub text: String,
    /// Model that actually served the request
    pub model: String,
    /// Tokens consumed, when the backend reports them
    pub tokens_used: Option<u32>,
    /// Quality metadata; local answers report lower confidence
    pub confidence: f32,
}

/// Shared provider handle for concurrent access across route calls
pub type SharedProvider = Arc<dyn Provider>;

/// A backend capable of answering an AI-assistance request
#[async_trait]
pub trait Provider: Send + Sync {
    /// Serve the request. Timeout enforcement is the caller's job.
    async fn invoke(&self, request: &RoutingRequest) -> Result<Invocation>;

    /// Minimal liveness round-trip, distinct from serving a request.
    /// Implementations should keep this cheap (1-token budget).
    async fn probe(&self) -> Result<bool>;

    /// Provider name for logging and diagnostics
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;
}

/// Create the remote provider for a registry descriptor
pub fn create_provider(
    descriptor: &ProviderDescriptor,
    invoke_timeout: Duration,
) -> Result<SharedProvider> {
    Ok(Arc::new(RemoteHttpProvider::new(descriptor, invoke_timeout)?))
}

/// Rough token estimate for text with no backend-reported usage
pub fn estimate_tokens(text: &str) -> u32 {
    (text.len() / local_constants::CHARS_PER_TOKEN).max(1) as u32
}
