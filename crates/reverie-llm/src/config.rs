//! Provider configuration.
//!
//! A [`ProviderConfig`] is constructed from persisted host settings and
//! rebuilt whenever those settings change; there is no partial mutation.
//! The router owns the single live client built from it.

use crate::error::LlmError;

/// The provider backend families the pipeline can speak to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI-compatible chat-completions API (also hosted lookalikes and
    /// local servers exposing the same schema).
    OpenAiCompatible,
    /// The distinct-schema messages API (top-level `system` field,
    /// `x-api-key` header).
    AnthropicLike,
    /// Local inference server (no credential, long timeout,
    /// `stream:false`).
    LocalInference,
}

impl ProviderKind {
    /// Human-readable name for logging.
    pub const fn name(self) -> &'static str {
        match self {
            Self::OpenAiCompatible => "openai-compatible",
            Self::AnthropicLike => "anthropic-like",
            Self::LocalInference => "local-inference",
        }
    }
}

/// Complete configuration for one provider backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Which backend family to speak to.
    pub kind: ProviderKind,
    /// Full endpoint URL the request is POSTed to.
    pub endpoint: String,
    /// Credential; absent for local inference and local-server lookalikes.
    pub api_key: Option<String>,
    /// Model identifier sent in the request body.
    pub model: String,
    /// Generation-length cap per query.
    pub max_tokens: u32,
}

impl ProviderConfig {
    /// Build a config for `kind` using its default endpoint and model.
    pub fn for_kind(kind: ProviderKind) -> Self {
        Self {
            kind,
            endpoint: Self::default_endpoint(kind).to_owned(),
            api_key: None,
            model: Self::default_model(kind).to_owned(),
            max_tokens: 2000,
        }
    }

    /// The well-known endpoint for a provider kind.
    pub const fn default_endpoint(kind: ProviderKind) -> &'static str {
        match kind {
            ProviderKind::OpenAiCompatible => "https://api.openai.com/v1/chat/completions",
            ProviderKind::AnthropicLike => "https://api.anthropic.com/v1/messages",
            ProviderKind::LocalInference => "http://localhost:11434/api/chat",
        }
    }

    /// A sensible default model for a provider kind.
    pub const fn default_model(kind: ProviderKind) -> &'static str {
        match kind {
            ProviderKind::OpenAiCompatible => "gpt-4o-mini",
            ProviderKind::AnthropicLike => "claude-3-haiku-20240307",
            ProviderKind::LocalInference => "llama3.2",
        }
    }

    /// Whether this config requires a credential.
    ///
    /// Local inference never needs one; an OpenAI-compatible endpoint on
    /// the local machine (an LM Studio-style server) is exempt too.
    pub fn requires_api_key(&self) -> bool {
        match self.kind {
            ProviderKind::LocalInference => false,
            ProviderKind::AnthropicLike => true,
            ProviderKind::OpenAiCompatible => {
                !(self.endpoint.contains("localhost") || self.endpoint.contains("127.0.0.1"))
            }
        }
    }

    /// Validate the config, returning a [`LlmError::Config`] when the
    /// credential or model is missing.
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.endpoint.trim().is_empty() {
            return Err(LlmError::Config("endpoint not configured".to_owned()));
        }
        if self.model.trim().is_empty() {
            return Err(LlmError::Config("model not configured".to_owned()));
        }
        if self.requires_api_key()
            && self.api_key.as_deref().is_none_or(|k| k.trim().is_empty())
        {
            return Err(LlmError::Config("API key not configured".to_owned()));
        }
        Ok(())
    }

    /// Load a provider config from environment variables.
    ///
    /// Required: `PROVIDER_KIND` (`openai` | `anthropic` | `local`).
    /// Optional: `PROVIDER_ENDPOINT`, `PROVIDER_API_KEY`,
    /// `PROVIDER_MODEL`, `MAX_TOKENS_PER_QUERY` (default 2000); missing
    /// endpoint/model fall back to the kind's defaults.
    pub fn from_env() -> Result<Self, LlmError> {
        let kind_str = std::env::var("PROVIDER_KIND")
            .map_err(|e| LlmError::Config(format!("missing required env var PROVIDER_KIND: {e}")))?;
        let kind = match kind_str.to_lowercase().as_str() {
            "openai" | "openai-compatible" | "grok" | "lmstudio" => ProviderKind::OpenAiCompatible,
            "anthropic" | "claude" => ProviderKind::AnthropicLike,
            "local" | "ollama" => ProviderKind::LocalInference,
            other => {
                return Err(LlmError::Config(format!("unknown provider kind: {other}")));
            }
        };

        let mut config = Self::for_kind(kind);
        if let Ok(endpoint) = std::env::var("PROVIDER_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Ok(key) = std::env::var("PROVIDER_API_KEY") {
            config.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("PROVIDER_MODEL") {
            config.model = model;
        }
        if let Ok(cap) = std::env::var("MAX_TOKENS_PER_QUERY") {
            config.max_tokens = cap
                .parse()
                .map_err(|e| LlmError::Config(format!("invalid MAX_TOKENS_PER_QUERY: {e}")))?;
        }
        Ok(config)
    }
}
