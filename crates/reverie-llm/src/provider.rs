//! Provider clients: one implementation per backend family.
//!
//! Uses enum dispatch instead of trait objects because async methods are
//! not dyn-compatible in Rust. Each client performs one network exchange
//! per call -- serialize via the wire codec, POST, deserialize via the
//! wire codec -- and normalizes the result into a [`ProviderResponse`].
//!
//! Transport failures and non-2xx statuses never escape as errors from
//! [`ProviderClient::complete`]; they come back as `success: false` with
//! the server's error body (best effort) or a generic transport message.

use std::time::{Duration, Instant};

use crate::codec;
use crate::config::{ProviderConfig, ProviderKind};
use crate::error::LlmError;

/// Request timeout for hosted provider APIs.
const HOSTED_TIMEOUT: Duration = Duration::from_secs(60);

/// Request timeout for local inference, which can be much slower.
const LOCAL_TIMEOUT: Duration = Duration::from_secs(120);

/// The normalized result of one provider exchange.
///
/// `text` is meaningful only when `success` is true.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Whether a round trip completed and a payload was recovered.
    pub success: bool,
    /// The generated text, when `success`.
    pub text: Option<String>,
    /// The failure description, when not `success`.
    pub error: Option<String>,
    /// Total token usage reported by the provider (0 when unreported).
    pub tokens_used: u32,
    /// Wall-clock latency of the exchange in milliseconds.
    pub elapsed_ms: f32,
}

impl ProviderResponse {
    /// Build a failed response.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            text: None,
            error: Some(error.into()),
            tokens_used: 0,
            elapsed_ms: 0.0,
        }
    }

    /// Build a successful response.
    pub const fn succeeded(text: String, tokens_used: u32, elapsed_ms: f32) -> Self {
        Self {
            success: true,
            text: Some(text),
            error: None,
            tokens_used,
            elapsed_ms,
        }
    }
}

/// A provider backend that can turn a prompt pair into generated text.
pub enum ProviderClient {
    /// OpenAI-compatible chat completions.
    OpenAiCompatible(HttpClient),
    /// The distinct-schema messages API.
    AnthropicLike(HttpClient),
    /// Local inference server.
    LocalInference(HttpClient),
}

/// Shared HTTP state for a single provider client.
pub struct HttpClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl ProviderClient {
    /// Build the client for a validated [`ProviderConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Config`] when the HTTP client cannot be built;
    /// a defaulted client would silently lose the per-provider timeout.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, LlmError> {
        let timeout = match config.kind {
            ProviderKind::LocalInference => LOCAL_TIMEOUT,
            _ => HOSTED_TIMEOUT,
        };
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("failed to build HTTP client: {e}")))?;
        let inner = HttpClient {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        };
        Ok(match config.kind {
            ProviderKind::OpenAiCompatible => Self::OpenAiCompatible(inner),
            ProviderKind::AnthropicLike => Self::AnthropicLike(inner),
            ProviderKind::LocalInference => Self::LocalInference(inner),
        })
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::OpenAiCompatible(_) => ProviderKind::OpenAiCompatible.name(),
            Self::AnthropicLike(_) => ProviderKind::AnthropicLike.name(),
            Self::LocalInference(_) => ProviderKind::LocalInference.name(),
        }
    }

    /// Perform one exchange and normalize the outcome.
    pub async fn complete(&self, system: &str, user: &str, max_tokens: u32) -> ProviderResponse {
        let start = Instant::now();
        let outcome = match self {
            Self::OpenAiCompatible(c) => c.chat_completions(system, user, max_tokens).await,
            Self::AnthropicLike(c) => c.messages(system, user, max_tokens).await,
            Self::LocalInference(c) => c.local_chat(system, user).await,
        };
        let elapsed_ms = start.elapsed().as_secs_f32() * 1000.0;
        match outcome {
            Ok((text, tokens_used)) => ProviderResponse::succeeded(text, tokens_used, elapsed_ms),
            Err(e) => {
                let mut response = ProviderResponse::failed(e.to_string());
                response.elapsed_ms = elapsed_ms;
                response
            }
        }
    }

    /// Degenerate exchange verifying that a round trip completes.
    ///
    /// The only contract is that the returned `success` flag reflects
    /// whether the provider answered at all.
    pub async fn test_connection(&self) -> ProviderResponse {
        self.complete(
            "You are a test assistant.",
            "Reply with only the word 'connected'.",
            10,
        )
        .await
    }
}

impl HttpClient {
    /// OpenAI-compatible exchange: bearer auth, `"content":` scanned from
    /// the end, `total_tokens` usage counter.
    async fn chat_completions(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<(String, u32), LlmError> {
        let body = codec::chat_completions_body(&self.model, system, user, max_tokens);
        let mut request = self
            .http
            .post(&self.endpoint)
            .header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }
        let raw = send(request.body(body)).await?;

        let text = codec::string_after_last(&raw, "\"content\":")
            .ok_or_else(|| LlmError::Transport("response missing content payload".to_owned()))?;
        let tokens = codec::number_after(&raw, "\"total_tokens\":").unwrap_or(0);
        Ok((text, tokens))
    }

    /// Distinct-schema exchange: `x-api-key` auth, `"text":` scanned from
    /// the front, usage split into input and output counters.
    async fn messages(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<(String, u32), LlmError> {
        let body = codec::messages_body(&self.model, system, user, max_tokens);
        let mut request = self
            .http
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("anthropic-version", "2023-06-01");
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key.clone());
        }
        let raw = send(request.body(body)).await?;

        let text = codec::string_after_first(&raw, "\"text\":")
            .ok_or_else(|| LlmError::Transport("response missing text payload".to_owned()))?;
        let input = codec::number_after(&raw, "\"input_tokens\":").unwrap_or(0);
        let output = codec::number_after(&raw, "\"output_tokens\":").unwrap_or(0);
        Ok((text, input.saturating_add(output)))
    }

    /// Local-inference exchange: no auth header, no usage counters.
    async fn local_chat(&self, system: &str, user: &str) -> Result<(String, u32), LlmError> {
        let body = codec::local_chat_body(&self.model, system, user);
        let request = self
            .http
            .post(&self.endpoint)
            .header("Content-Type", "application/json");
        let raw = send(request.body(body)).await?;

        let text = codec::string_after_last(&raw, "\"content\":")
            .ok_or_else(|| LlmError::Transport("response missing content payload".to_owned()))?;
        Ok((text, 0))
    }
}

/// Send a prepared request and return the raw response body.
///
/// Non-2xx statuses become [`LlmError::Transport`] carrying the server's
/// error body when it can be read.
async fn send(request: reqwest::RequestBuilder) -> Result<String, LlmError> {
    let response = request
        .send()
        .await
        .map_err(|e| LlmError::Transport(format!("request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error body".to_owned());
        return Err(LlmError::Transport(format!("provider returned {status}: {error_body}")));
    }

    response
        .text()
        .await
        .map_err(|e| LlmError::Transport(format!("failed to read response body: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn from_config_dispatches_by_kind() {
        let config = ProviderConfig::for_kind(ProviderKind::LocalInference);
        let client = ProviderClient::from_config(&config).unwrap();
        assert_eq!(client.name(), "local-inference");

        let config = ProviderConfig::for_kind(ProviderKind::AnthropicLike);
        let client = ProviderClient::from_config(&config).unwrap();
        assert_eq!(client.name(), "anthropic-like");
    }

    #[test]
    fn from_config_builds_for_every_kind() {
        // The builder must succeed up front; a failure here surfaces as
        // a config error at construction, never as a defaulted client.
        for kind in [
            ProviderKind::OpenAiCompatible,
            ProviderKind::AnthropicLike,
            ProviderKind::LocalInference,
        ] {
            let config = ProviderConfig::for_kind(kind);
            assert!(ProviderClient::from_config(&config).is_ok());
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails_without_panicking() {
        let mut config = ProviderConfig::for_kind(ProviderKind::OpenAiCompatible);
        // Discard port on loopback; the connection is refused immediately.
        config.endpoint = "http://127.0.0.1:9/v1/chat/completions".to_owned();
        let client = ProviderClient::from_config(&config).unwrap();

        let response = client.complete("sys", "usr", 10).await;
        assert!(!response.success);
        assert!(response.text.is_none());
        assert!(response.error.is_some());
        assert_eq!(response.tokens_used, 0);
    }

    #[test]
    fn failed_response_reports_zero_usage() {
        let response = ProviderResponse::failed("boom");
        assert!(!response.success);
        assert_eq!(response.tokens_used, 0);
        assert_eq!(response.error.as_deref(), Some("boom"));
    }
}
