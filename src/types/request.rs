//! Routing Request/Response Value Objects
//!
//! [`RoutingRequest`] is immutable once constructed, one per call.
//! [`RoutingResponse`] is constructed exactly once per request; the
//! dispatcher guarantees exactly one response per request and never raises
//! provider failures to the caller.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{AttemptError, GateError, Result};

/// Kind of assistance being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    Chat,
    Analyze,
    Generate,
    Debug,
    Explain,
    Optimize,
    Document,
}

impl RequestType {
    /// All known request types, used for capability expansion
    pub const ALL: [RequestType; 7] = [
        Self::Chat,
        Self::Analyze,
        Self::Generate,
        Self::Debug,
        Self::Explain,
        Self::Optimize,
        Self::Document,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Analyze => "analyze",
            Self::Generate => "generate",
            Self::Debug => "debug",
            Self::Explain => "explain",
            Self::Optimize => "optimize",
            Self::Document => "document",
        }
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestType {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "chat" => Ok(Self::Chat),
            "analyze" => Ok(Self::Analyze),
            "generate" => Ok(Self::Generate),
            "debug" => Ok(Self::Debug),
            "explain" => Ok(Self::Explain),
            "optimize" => Ok(Self::Optimize),
            "document" => Ok(Self::Document),
            other => Err(GateError::InvalidRequest(format!(
                "unknown request type '{}'. Valid: chat, analyze, generate, debug, explain, optimize, document",
                other
            ))),
        }
    }
}

/// Input value object for a single routing call.
///
/// Wire-compatible with the boundary JSON body:
/// `{type, code|prompt, language, fileName, context, projectType, useLocal, forceProvider}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingRequest {
    /// Correlation id for logs and diagnostics
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    #[serde(rename = "type")]
    pub request_type: RequestType,

    /// Prompt or source code to operate on
    #[serde(alias = "code")]
    pub prompt: String,

    #[serde(default)]
    pub context: Option<String>,

    #[serde(default)]
    pub language: Option<String>,

    #[serde(default)]
    pub file_name: Option<String>,

    #[serde(default)]
    pub project_type: Option<String>,

    /// Preferred model hint, passed through to the provider
    #[serde(default)]
    pub preferred_model: Option<String>,

    /// Attempt exactly this provider; on failure the local processor answers
    /// directly instead of walking the full chain
    #[serde(default)]
    pub force_provider: Option<String>,

    /// Skip remote providers entirely
    #[serde(default, alias = "useLocal")]
    pub force_local: bool,
}

impl RoutingRequest {
    pub fn new(request_type: RequestType, prompt: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_type,
            prompt: prompt.into(),
            context: None,
            language: None,
            file_name: None,
            project_type: None,
            preferred_model: None,
            force_provider: None,
            force_local: false,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.preferred_model = Some(model.into());
        self
    }

    pub fn with_force_provider(mut self, provider: impl Into<String>) -> Self {
        self.force_provider = Some(provider.into());
        self
    }

    pub fn with_force_local(mut self) -> Self {
        self.force_local = true;
        self
    }

    /// Fail fast on malformed requests before any provider is touched.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(GateError::InvalidRequest(
                "prompt must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// One provider that was considered but did not produce the response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    pub provider: String,
    pub error: AttemptError,
}

impl AttemptRecord {
    pub fn new(provider: impl Into<String>, error: AttemptError) -> Self {
        Self {
            provider: provider.into(),
            error,
        }
    }
}

/// Output value object, constructed exactly once per request
#[derive(Debug, Clone)]
pub struct RoutingResponse {
    pub text: String,
    pub provider_used: String,
    pub model_used: String,
    pub token_estimate: u32,
    /// Confidence metadata; local fallback answers report lower confidence
    /// than remote providers
    pub confidence: f32,
    /// True when the response did not come from the highest-priority
    /// eligible provider at call time
    pub fallback_used: bool,
    /// Ordered diagnostics: every candidate skipped or failed before this
    /// response was produced
    pub attempted_providers: Vec<AttemptRecord>,
}

impl RoutingResponse {
    /// Names of attempted providers, in order
    pub fn attempted_names(&self) -> Vec<&str> {
        self.attempted_providers
            .iter()
            .map(|a| a.provider.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_type_round_trip() {
        for rt in RequestType::ALL {
            let parsed: RequestType = rt.as_str().parse().unwrap();
            assert_eq!(parsed, rt);
        }
    }

    #[test]
    fn test_unknown_request_type_fails_fast() {
        let err = "translate".parse::<RequestType>().unwrap_err();
        assert!(matches!(err, GateError::InvalidRequest(_)));
    }

    #[test]
    fn test_empty_prompt_rejected() {
        let req = RoutingRequest::new(RequestType::Chat, "   ");
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_deserialize_boundary_body() {
        let body = serde_json::json!({
            "type": "debug",
            "code": "fn main() {}",
            "language": "rust",
            "fileName": "main.rs",
            "useLocal": true
        });
        let req: RoutingRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.request_type, RequestType::Debug);
        assert_eq!(req.prompt, "fn main() {}");
        assert_eq!(req.file_name.as_deref(), Some("main.rs"));
        assert!(req.force_local);
    }

    #[test]
    fn test_attempted_names_order() {
        let resp = RoutingResponse {
            text: "ok".into(),
            provider_used: "local".into(),
            model_used: "heuristic".into(),
            token_estimate: 1,
            confidence: 0.45,
            fallback_used: true,
            attempted_providers: vec![
                AttemptRecord::new("a", AttemptError::InvocationFailed("x".into())),
                AttemptRecord::new("b", AttemptError::RateLimited),
            ],
        };
        assert_eq!(resp.attempted_names(), vec!["a", "b"]);
    }
}
