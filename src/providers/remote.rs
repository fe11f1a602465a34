//! Remote HTTP Provider
//!
//! Talks to any OpenAI-compatible chat-completions endpoint. The wire
//! format is deliberately the only one this crate knows; everything else
//! about a backend is carried in its registry descriptor.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{Invocation, Provider};
use crate::constants::{local as local_constants, network, probe};
use crate::registry::ProviderDescriptor;
use crate::types::{GateError, RequestType, Result, RoutingRequest};

/// HTTP backend speaking the chat-completions wire format
pub struct RemoteHttpProvider {
    name: String,
    api_base: String,
    model: String,
    api_key: Option<SecretString>,
    client: reqwest::Client,
}

impl std::fmt::Debug for RemoteHttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteHttpProvider")
            .field("name", &self.name)
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl RemoteHttpProvider {
    pub fn new(descriptor: &ProviderDescriptor, invoke_timeout: Duration) -> Result<Self> {
        let api_base = Self::validate_endpoint(&descriptor.endpoint)?;

        let client = reqwest::Client::builder()
            .timeout(invoke_timeout)
            .connect_timeout(Duration::from_secs(network::CONNECTION_TIMEOUT_SECS))
            .build()
            .map_err(|e| GateError::Provider(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            name: descriptor.name.clone(),
            api_base,
            model: descriptor.model.clone(),
            api_key: descriptor.api_key.clone(),
            client,
        })
    }

    /// Validate endpoint URL for security (SSRF prevention)
    ///
    /// Only allows http/https schemes and warns for plain-http remote hosts.
    fn validate_endpoint(endpoint: &str) -> Result<String> {
        let url = url::Url::parse(endpoint)
            .map_err(|e| GateError::Config(format!("invalid endpoint URL '{}': {}", endpoint, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(GateError::Config(format!(
                "endpoint must use http or https scheme, got: {}",
                url.scheme()
            )));
        }

        if url.scheme() == "http" {
            let host = url.host_str().unwrap_or("");
            if !matches!(host, "localhost" | "127.0.0.1" | "::1") {
                warn!(endpoint, "plain-http endpoint to a remote host");
            }
        }

        // Trailing slash removed for consistent path joining
        let mut result = url.to_string();
        if result.ends_with('/') {
            result.pop();
        }
        Ok(result)
    }

    fn system_prompt(request: &RoutingRequest) -> String {
        let role = match request.request_type {
            RequestType::Chat => "You are a concise programming assistant.",
            RequestType::Analyze => {
                "You are a code reviewer. Report concrete issues with line references."
            }
            RequestType::Generate => "You are a code generator. Respond with code only, no prose.",
            RequestType::Debug => {
                "You are a debugging assistant. Identify the defect and propose a fix."
            }
            RequestType::Explain => "You explain code clearly for an experienced developer.",
            RequestType::Optimize => {
                "You suggest performance improvements without changing behavior."
            }
            RequestType::Document => "You write documentation comments for the given code.",
        };

        let mut content = role.to_string();
        if let Some(language) = &request.language {
            content.push_str(&format!(" The language is {}.", language));
        }
        if let Some(context) = &request.context {
            content.push_str(&format!("\n\nAdditional context:\n{}", context));
        }
        content
    }

    fn build_request(&self, request: &RoutingRequest) -> ChatCompletionRequest {
        let model = request
            .preferred_model
            .clone()
            .unwrap_or_else(|| self.model.clone());

        ChatCompletionRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Self::system_prompt(request),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
            max_tokens: Some(network::DEFAULT_MAX_TOKENS),
        }
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => {
                builder.header("Authorization", format!("Bearer {}", key.expose_secret()))
            }
            None => builder,
        }
    }
}

#[async_trait]
impl Provider for RemoteHttpProvider {
    async fn invoke(&self, request: &RoutingRequest) -> Result<Invocation> {
        let body = self.build_request(request);
        let url = format!("{}/chat/completions", self.api_base);

        debug!(provider = %self.name, model = %body.model, "Sending chat completion request");

        let response = self
            .authorize(self.client.post(&url))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GateError::Provider(format!("{} request failed: {}", self.name, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GateError::Provider(format!(
                "{} API error ({}): {}",
                self.name, status, text
            )));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            GateError::Provider(format!("failed to parse {} response: {}", self.name, e))
        })?;

        let text = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| {
                GateError::Provider(format!("no content in {} response", self.name))
            })?;

        Ok(Invocation {
            model: parsed.model.unwrap_or_else(|| body.model.clone()),
            tokens_used: parsed.usage.map(|u| u.total_tokens),
            confidence: local_constants::REMOTE_CONFIDENCE,
            text,
        })
    }

    /// Minimal 1-token round-trip, separate from serving. Not recorded
    /// against the rate window.
    async fn probe(&self) -> Result<bool> {
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "ping".to_string(),
            }],
            max_tokens: Some(probe::PROBE_MAX_TOKENS),
        };
        let url = format!("{}/chat/completions", self.api_base);

        match self.authorize(self.client.post(&url)).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => Ok(true),
            Ok(resp) => {
                warn!(provider = %self.name, status = %resp.status(), "Probe rejected");
                Ok(false)
            }
            Err(e) => {
                warn!(provider = %self.name, error = %e, "Probe failed");
                Ok(false)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// Request/Response wire types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    total_tokens: u32,
}
