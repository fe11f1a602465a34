//! Configuration Loading and Types

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{Config, DispatcherConfig, ProviderSettings, RateLimitSettings};
