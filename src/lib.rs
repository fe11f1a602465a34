//! PromptGate - Multi-Provider AI Request Dispatcher
//!
//! Routes assistance requests across a prioritized chain of remote AI
//! providers with per-provider rate limiting, circuit breaking, and
//! availability probing, falling back to a built-in local processor so
//! every valid request gets an answer.
//!
//! ## Core Features
//!
//! - **Priority Chain**: providers tried strictly by configured priority
//! - **Rate Limiting**: per-provider rolling window with lazy reset
//! - **Circuit Breaking**: consecutive-failure breaker with window-bound cooldown
//! - **Availability Probing**: cheap liveness gate before each invocation
//! - **Local Fallback**: heuristic processor that never fails
//!
//! ## Quick Start
//!
//! ```ignore
//! use promptgate::{ConfigLoader, Dispatcher, RequestType, RoutingRequest};
//!
//! let config = ConfigLoader::load()?;
//! let dispatcher = Dispatcher::from_config(&config)?;
//! let request = RoutingRequest::new(RequestType::Chat, "explain ownership");
//! let response = dispatcher.route(&request).await?;
//! println!("{} via {}", response.text, response.provider_used);
//! ```
//!
//! ## Modules
//!
//! - [`dispatch`]: routing core, rate window, circuit breaker, prober
//! - [`providers`]: the provider trait, remote HTTP client, local processor
//! - [`registry`]: priority-ordered provider descriptors
//! - [`config`]: layered configuration loading
//! - [`types`]: request/response value objects, errors, boundary shapes

pub mod cli;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod providers;
pub mod registry;
pub mod timeout;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader, DispatcherConfig, ProviderSettings};

// Error Types
pub use types::error::{AttemptError, GateError, Result};

// Routing
pub use dispatch::Dispatcher;
pub use types::{RequestType, RoutingRequest, RoutingResponse};

// =============================================================================
// Provider Re-exports
// =============================================================================

pub use providers::{
    Invocation,
    LocalProcessor,
    Provider,
    RemoteHttpProvider,
    SharedProvider,
};
pub use registry::{ProviderDescriptor, ProviderRegistry, RateLimitPolicy};

// =============================================================================
// Boundary Re-exports
// =============================================================================

pub use types::{AssistResponse, HealthReport, StatusReport};

// Timeout
pub use timeout::with_timeout;
