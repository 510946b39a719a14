//! Pipeline-wide settings.

use std::time::Duration;

use reverie_llm::{LlmError, ProviderConfig, RouterOptions};
use reverie_types::QueryTiming;

/// Default minimum spacing between exchanges, per agent and globally.
pub const DEFAULT_MIN_QUERY_DELAY: Duration = Duration::from_secs(5);

/// Settings for the whole decision pipeline.
///
/// One value of `min_query_delay` feeds both the per-agent gate and the
/// router's global gate; the two gates stay separate checks on purpose,
/// the per-agent one also spaces re-entry from coalesced triggers.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct PipelineConfig {
    /// Provider endpoint, credential, and model selection.
    pub provider: ProviderConfig,
    /// Minimum spacing between exchanges for any single agent, and
    /// between any two requests globally.
    pub min_query_delay: Duration,
    /// When agents consult the model without an external trigger.
    pub query_timing: QueryTiming,
    /// Whether player orders are put to the model at all. When `false`
    /// agents comply silently and no exchange happens.
    pub can_refuse_orders: bool,
    /// Surface a player notification when an agent refuses an order.
    pub notify_major_decisions: bool,
    /// Log full prompt text at debug level.
    pub log_prompts: bool,
    /// Log full response text at debug level.
    pub log_responses: bool,
}

impl PipelineConfig {
    /// Settings with conservative defaults around a provider choice.
    #[must_use]
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            min_query_delay: DEFAULT_MIN_QUERY_DELAY,
            query_timing: QueryTiming::default(),
            can_refuse_orders: true,
            notify_major_decisions: true,
            log_prompts: false,
            log_responses: false,
        }
    }

    /// Load settings from the environment.
    ///
    /// Provider selection comes from [`ProviderConfig::from_env`]; the
    /// pipeline knobs read `MIN_QUERY_DELAY_SECONDS`, `QUERY_TIMING`,
    /// `CAN_REFUSE_ORDERS`, `NOTIFY_MAJOR_DECISIONS`, `LOG_PROMPTS`, and
    /// `LOG_RESPONSES`, falling back to defaults when unset.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Config`] when the provider selection is
    /// missing or malformed.
    pub fn from_env() -> Result<Self, LlmError> {
        let mut config = Self::new(ProviderConfig::from_env()?);
        if let Some(secs) = env_u64("MIN_QUERY_DELAY_SECONDS") {
            config.min_query_delay = Duration::from_secs(secs);
        }
        if let Ok(timing) = std::env::var("QUERY_TIMING") {
            config.query_timing = match timing.to_ascii_lowercase().as_str() {
                "periodic" => QueryTiming::Periodic,
                "continuous" => QueryTiming::Continuous,
                _ => QueryTiming::EventDriven,
            };
        }
        if let Some(v) = env_bool("CAN_REFUSE_ORDERS") {
            config.can_refuse_orders = v;
        }
        if let Some(v) = env_bool("NOTIFY_MAJOR_DECISIONS") {
            config.notify_major_decisions = v;
        }
        if let Some(v) = env_bool("LOG_PROMPTS") {
            config.log_prompts = v;
        }
        if let Some(v) = env_bool("LOG_RESPONSES") {
            config.log_responses = v;
        }
        Ok(config)
    }

    /// The router options implied by these settings.
    #[must_use]
    pub const fn router_options(&self) -> RouterOptions {
        RouterOptions {
            min_interval: self.min_query_delay,
            log_prompts: self.log_prompts,
            log_responses: self.log_responses,
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.trim().parse().ok()
}

fn env_bool(key: &str) -> Option<bool> {
    match std::env::var(key).ok()?.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use reverie_llm::ProviderKind;

    #[test]
    fn defaults_are_conservative() {
        let config = PipelineConfig::new(ProviderConfig::for_kind(ProviderKind::LocalInference));
        assert_eq!(config.min_query_delay, Duration::from_secs(5));
        assert_eq!(config.query_timing, QueryTiming::EventDriven);
        assert!(config.can_refuse_orders);
        assert!(!config.log_prompts);
    }

    #[test]
    fn router_options_share_the_delay() {
        let mut config = PipelineConfig::new(ProviderConfig::for_kind(ProviderKind::LocalInference));
        config.min_query_delay = Duration::from_secs(9);
        assert_eq!(config.router_options().min_interval, Duration::from_secs(9));
    }
}
