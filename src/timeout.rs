//! Timeout Helpers
//!
//! All suspension points in the dispatch chain (availability probe,
//! provider invocation) carry caller-side timeouts so a hung provider
//! cannot stall the whole chain.

use std::future::Future;
use std::time::Duration;

use crate::types::{GateError, Result};

/// Execute an async operation with a timeout
///
/// Returns a timeout error if the operation doesn't complete within the
/// specified duration. The in-flight future is dropped (canceled) on expiry.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(GateError::timeout(operation_name, timeout)),
    }
}
