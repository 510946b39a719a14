//! Request router: the single point through which all outbound provider
//! requests pass.
//!
//! Holds exactly one live [`ProviderClient`], built from a validated
//! [`ProviderConfig`]. When host settings change, the owner constructs a
//! fresh router and swaps it in; a router is never mutated in place.
//!
//! Before forwarding a call the router checks a **global**
//! minimum-interval gate -- elapsed time since the last dispatched
//! request, for any agent -- and fails fast with
//! [`LlmError::RateLimited`] without contacting the network. The gate
//! timestamp advances when a request is dispatched, so a burst of agents
//! cannot stampede the provider.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::LlmError;
use crate::provider::{ProviderClient, ProviderResponse};

/// Knobs the router needs beyond the provider config itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouterOptions {
    /// Global minimum interval between dispatched requests.
    pub min_interval: Duration,
    /// Log the exact outbound prompt at debug level.
    pub log_prompts: bool,
    /// Log the inbound text (or error) at debug level.
    pub log_responses: bool,
}

/// Routes every outbound request through one provider client and one
/// global rate gate.
pub struct RequestRouter {
    client: ProviderClient,
    max_tokens: u32,
    options: RouterOptions,
    last_request: Mutex<Option<Instant>>,
}

impl RequestRouter {
    /// Build a router for a provider config.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Config`] when the config is missing its
    /// credential, endpoint, or model, or when the HTTP client cannot
    /// be built.
    pub fn new(config: &ProviderConfig, options: RouterOptions) -> Result<Self, LlmError> {
        config.validate()?;
        Ok(Self {
            client: ProviderClient::from_config(config)?,
            max_tokens: config.max_tokens,
            options,
            last_request: Mutex::new(None),
        })
    }

    /// Name of the active provider backend.
    pub const fn provider_name(&self) -> &'static str {
        self.client.name()
    }

    /// Forward one exchange to the provider, subject to the global gate.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::RateLimited`] when the minimum interval since
    /// the last dispatched request has not yet elapsed. Transport
    /// failures do not surface here; they come back inside the
    /// [`ProviderResponse`] with `success: false`.
    pub async fn send(&self, system: &str, user: &str) -> Result<ProviderResponse, LlmError> {
        self.pass_gate()?;

        if self.options.log_prompts {
            debug!(system = system, user = user, "outbound prompt");
        }

        let response = self.client.complete(system, user, self.max_tokens).await;

        if self.options.log_responses {
            debug!(
                success = response.success,
                tokens_used = response.tokens_used,
                elapsed_ms = response.elapsed_ms,
                text = response.text.as_deref().unwrap_or_default(),
                error = response.error.as_deref().unwrap_or_default(),
                "inbound response"
            );
        }

        Ok(response)
    }

    /// Degenerate exchange checking that the provider answers at all.
    ///
    /// Bypasses the rate gate: connection tests are operator-initiated
    /// and must not be starved by decision traffic (nor starve it).
    pub async fn test_connection(&self) -> ProviderResponse {
        self.client.test_connection().await
    }

    /// Check the global gate, advancing the timestamp when it passes.
    fn pass_gate(&self) -> Result<(), LlmError> {
        let now = Instant::now();
        let Ok(mut last) = self.last_request.lock() else {
            return Err(LlmError::Transport("rate gate lock poisoned".to_owned()));
        };
        if let Some(previous) = *last {
            let elapsed = now.duration_since(previous);
            if elapsed < self.options.min_interval {
                let remaining = self.options.min_interval.saturating_sub(elapsed);
                return Err(LlmError::RateLimited {
                    remaining_ms: u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
                });
            }
        }
        *last = Some(now);
        Ok(())
    }
}
