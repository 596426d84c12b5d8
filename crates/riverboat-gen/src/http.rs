//! OpenAI-compatible HTTP generator.
//!
//! [`HttpGenerator`] works with any API that follows the OpenAI chat
//! completion format, which covers OpenAI itself plus the long tail of
//! compatible gateways. Point `base_url` at the endpoint and the generator
//! does the rest.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{GenerationError, Result};
use crate::service::GenerationService;
use crate::types::{GenerationRequest, GenerationResponse};

/// Configuration for an [`HttpGenerator`].
///
/// Every field has a default so a config file may override only the ones it
/// cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Service name used in logs.
    pub name: String,
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Extra headers sent with every request.
    pub headers: HashMap<String, String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            name: "openai".into(),
            base_url: "https://api.openai.com/v1".into(),
            api_key_env: "RIVERBOAT_API_KEY".into(),
            model: "gpt-4o-mini".into(),
            headers: HashMap::new(),
        }
    }
}

/// A generation service client speaking the OpenAI chat completion wire
/// format.
pub struct HttpGenerator {
    config: GeneratorConfig,
    http: reqwest::Client,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatPayload<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    total_tokens: u32,
}

impl HttpGenerator {
    /// Create a generator from configuration.
    ///
    /// The API key is resolved from the environment variable named in
    /// `config.api_key_env` at request time.
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            api_key: None,
        }
    }

    /// Create a generator with an explicit API key, bypassing environment
    /// lookup.
    pub fn with_api_key(config: GeneratorConfig, api_key: String) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            api_key: Some(api_key),
        }
    }

    /// Returns the generator configuration.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Returns the chat completions endpoint URL.
    fn completions_url(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        format!("{base}/chat/completions")
    }

    /// Resolve the API key: explicit key > environment variable.
    fn resolve_api_key(&self) -> Result<String> {
        if let Some(ref key) = self.api_key {
            return Ok(key.clone());
        }
        std::env::var(&self.config.api_key_env).map_err(|_| {
            GenerationError::NotConfigured(format!("set {} env var", self.config.api_key_env))
        })
    }
}

#[async_trait]
impl GenerationService for HttpGenerator {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let api_key = self.resolve_api_key()?;
        let url = self.completions_url();

        debug!(
            service = %self.config.name,
            model = %self.config.model,
            prompt_bytes = request.prompt.len(),
            "sending generation request"
        );

        let payload = ChatPayload {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            max_tokens: request.max_tokens,
        };

        let mut req = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json");

        for (k, v) in &self.config.headers {
            req = req.header(k.as_str(), v.as_str());
        }

        let response = req.json(&payload).send().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout
            } else {
                GenerationError::Http(e)
            }
        })?;
        let status = response.status();

        if !status.is_success() {
            if status.as_u16() == 429 {
                let header_ms = parse_retry_after_header(&response);
                let body = response.text().await.unwrap_or_default();
                let retry_ms = header_ms
                    .or_else(|| parse_retry_after_ms(&body))
                    .unwrap_or(1000);
                warn!(
                    service = %self.config.name,
                    retry_after_ms = retry_ms,
                    "rate limited"
                );
                return Err(GenerationError::RateLimited {
                    retry_after_ms: retry_ms,
                });
            }

            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(GenerationError::AuthFailed(body));
            }

            if status.as_u16() == 404 {
                return Err(GenerationError::ModelNotFound(format!(
                    "model '{}': {}",
                    self.config.model, body
                )));
            }

            return Err(GenerationError::RequestFailed(format!(
                "HTTP {status}: {body}"
            )));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(format!("failed to parse response: {e}")))?;

        let Some(choice) = completion.choices.first() else {
            return Err(GenerationError::InvalidResponse("empty choices array".into()));
        };

        debug!(
            service = %self.config.name,
            content_bytes = choice.message.content.len(),
            "generation response received"
        );

        Ok(GenerationResponse {
            content: choice.message.content.clone(),
            model: completion.model,
            total_tokens: completion.usage.map(|u| u.total_tokens),
        })
    }
}

/// Try to extract a retry-after value from the HTTP `Retry-After` header.
///
/// Only the numeric seconds form is handled; HTTP-date is rare for API
/// providers.
fn parse_retry_after_header(response: &reqwest::Response) -> Option<u64> {
    let header_val = response
        .headers()
        .get("retry-after")
        .or_else(|| response.headers().get("x-ratelimit-reset-after"))
        .and_then(|v| v.to_str().ok())?;

    if let Ok(secs) = header_val.parse::<f64>() {
        return Some((secs * 1000.0).max(0.0) as u64);
    }

    None
}

/// Try to extract a retry-after value from a JSON error response body.
fn parse_retry_after_ms(body: &str) -> Option<u64> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("retry_after_ms")
        .and_then(|v| v.as_u64())
        .or_else(|| {
            value
                .get("retry_after")
                .and_then(|v| v.as_f64())
                .map(|secs| (secs * 1000.0) as u64)
        })
}

impl std::fmt::Debug for HttpGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGenerator")
            .field("name", &self.config.name)
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}
