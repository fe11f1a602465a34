//! External Interface Shapes
//!
//! The dispatcher sits behind an HTTP-facing boundary owned elsewhere.
//! These serde types preserve that boundary's field names and semantics
//! exactly (camelCase, `rateLimitStatus` as `"OK"`/`"LIMIT_REACHED"`), so
//! the route layer can serialize them as-is.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::request::RoutingResponse;

/// Response body for an assistance request:
/// `{success, result, metadata:{model, source, tokensUsed, confidence, fallbackUsed}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistResponse {
    pub success: bool,
    pub result: String,
    pub metadata: AssistMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistMetadata {
    pub model: String,
    /// Provider name that produced the answer (`"local"` for the fallback)
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_used: Option<bool>,
}

impl From<&RoutingResponse> for AssistResponse {
    fn from(resp: &RoutingResponse) -> Self {
        Self {
            // The availability contract: the caller always receives success
            success: true,
            result: resp.text.clone(),
            metadata: AssistMetadata {
                model: resp.model_used.clone(),
                source: resp.provider_used.clone(),
                tokens_used: Some(resp.token_estimate),
                confidence: Some(resp.confidence),
                fallback_used: Some(resp.fallback_used),
            },
        }
    }
}

/// Per-provider entry of the status endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub name: String,
    pub available: bool,
    pub priority: u32,
    pub request_count: u32,
    /// `"OK"` while the window has room, `"LIMIT_REACHED"` once exhausted
    pub rate_limit_status: String,
}

/// Aggregate status report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub providers: Vec<ProviderStatus>,
    pub active_providers: usize,
    pub total_providers: usize,
    /// The local processor is always armed
    pub emergency_fallback: bool,
}

/// Health-check report produced by probing every registered, available provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub healthy: bool,
    pub providers: BTreeMap<String, bool>,
    pub primary_provider: String,
}
