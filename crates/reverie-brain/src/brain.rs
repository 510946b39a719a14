//! Per-agent exchange scheduling.
//!
//! Each AI-controlled agent owns one [`AgentBrain`]. The brain enforces
//! two rules the provider side never sees: **single-flight** (at most one
//! exchange in the air per agent) and **coalescing** (triggers arriving
//! mid-flight overwrite a single pending slot, last writer wins). The
//! pending trigger re-enters through the same per-agent rate gate as a
//! fresh trigger, so a burst of events produces at most one follow-up
//! exchange.
//!
//! Brains are driven from the simulation thread; the actual exchange runs
//! as a task on the shared runtime and finishes by pushing an [`Effect`]
//! onto the deferred queue.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use reverie_llm::{extract_decision, LlmError, PromptEngine, RenderedPrompt};
use reverie_types::{AgentId, Decision};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::backend::DecisionBackend;
use crate::config::PipelineConfig;
use crate::queue::{Effect, EffectQueue};
use crate::world::WorldDescriber;

/// Everything shared by all brains: the backend, the world describer,
/// the prompt engine, the effect queue, and the runtime to spawn on.
pub struct BrainServices<B, D> {
    /// The provider-side backend all exchanges go through.
    pub backend: B,
    /// Snapshots world state into prompt text.
    pub describer: D,
    /// Renders the prompt pair for each exchange kind.
    pub prompts: PromptEngine,
    /// Where finished exchanges queue their effects.
    pub effects: EffectQueue,
    /// Runtime handle exchanges are spawned onto.
    pub runtime: Handle,
    /// Minimum spacing between exchanges for a single agent.
    pub min_query_delay: Duration,
    /// When `false`, player orders never reach the model.
    pub can_refuse_orders: bool,
}

impl<B, D> BrainServices<B, D> {
    /// Bundle the shared services, taking the scheduling knobs from the
    /// pipeline config.
    pub const fn new(
        backend: B,
        describer: D,
        prompts: PromptEngine,
        effects: EffectQueue,
        runtime: Handle,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            backend,
            describer,
            prompts,
            effects,
            runtime,
            min_query_delay: config.min_query_delay,
            can_refuse_orders: config.can_refuse_orders,
        }
    }
}

/// Mutable per-agent scheduling state. Guarded by a mutex that is only
/// ever held for short synchronous sections, never across an await.
#[derive(Debug, Clone, Default)]
pub struct BrainState {
    /// An exchange is currently in flight for this agent.
    pub processing: bool,
    /// When the last *successful* decision exchange completed. Advances
    /// before extraction, so unparseable responses still count.
    pub last_query_time: Option<Instant>,
    /// The most recent extracted decision, kept as short-term memory.
    pub last_decision: Option<Decision>,
    /// The coalesced trigger waiting for the in-flight exchange to end.
    pub pending_trigger: Option<String>,
}

/// What kind of exchange a spawned task is running.
enum ExchangeKind {
    Decision { trigger: String },
    Order { action: String, target: Option<String> },
    Social { initiator: String, interaction: String },
}

/// What one exchange produced.
struct ExchangeOutcome {
    /// The provider answered, even if no decision could be extracted.
    round_trip: bool,
    /// The extracted decision, for decision exchanges only.
    decision: Option<Decision>,
}

impl ExchangeOutcome {
    const fn failed() -> Self {
        Self { round_trip: false, decision: None }
    }
}

/// The decision scheduler for one agent.
pub struct AgentBrain<B, D> {
    agent: AgentId,
    services: Arc<BrainServices<B, D>>,
    state: Arc<Mutex<BrainState>>,
}

impl<B: DecisionBackend, D: WorldDescriber> AgentBrain<B, D> {
    /// A fresh brain for an agent, idle and gate-open.
    pub fn new(agent: AgentId, services: Arc<BrainServices<B, D>>) -> Self {
        Self { agent, services, state: Arc::new(Mutex::new(BrainState::default())) }
    }

    /// The agent this brain schedules for.
    pub const fn agent(&self) -> AgentId {
        self.agent
    }

    /// Whether an exchange is currently in flight.
    pub fn is_processing(&self) -> bool {
        self.state.lock().is_ok_and(|state| state.processing)
    }

    /// A copy of the current scheduling state.
    pub fn snapshot(&self) -> BrainState {
        self.state
            .lock()
            .map_or_else(|_| BrainState::default(), |state| state.clone())
    }

    /// Ask the agent to make a decision in response to a trigger.
    ///
    /// If an exchange is already in flight the trigger is stashed in the
    /// single pending slot, overwriting whatever was there. If the
    /// per-agent rate gate is closed the trigger is dropped outright.
    pub fn request_decision(&self, reason: &str) {
        let Ok(mut state) = self.state.lock() else {
            warn!(agent = %self.agent, "brain state lock poisoned");
            return;
        };
        if state.processing {
            debug!(agent = %self.agent, reason, "exchange in flight, coalescing trigger");
            state.pending_trigger = Some(reason.to_owned());
            return;
        }
        if !gate_open(state.last_query_time, self.services.min_query_delay) {
            debug!(agent = %self.agent, reason, "trigger dropped by per-agent rate gate");
            return;
        }
        state.processing = true;
        drop(state);
        self.spawn_chain(ExchangeKind::Decision { trigger: reason.to_owned() });
    }

    /// Put a player order to the agent.
    ///
    /// When orders cannot be refused this is a no-op: the host applies
    /// the order directly and no exchange happens. Orders are never
    /// coalesced; if an exchange is in flight the order consultation is
    /// skipped and the order simply stands.
    pub fn handle_order(&self, action: &str, target: Option<&str>) {
        if !self.services.can_refuse_orders {
            debug!(agent = %self.agent, action, "orders are not refusable, complying");
            return;
        }
        let Ok(mut state) = self.state.lock() else {
            warn!(agent = %self.agent, "brain state lock poisoned");
            return;
        };
        if state.processing {
            debug!(agent = %self.agent, action, "exchange in flight, order stands unconsulted");
            return;
        }
        state.processing = true;
        drop(state);
        self.spawn_chain(ExchangeKind::Order {
            action: action.to_owned(),
            target: target.map(str::to_owned),
        });
    }

    /// Tell the agent another agent just started a social interaction
    /// with it. Produces a speech-only reaction effect.
    pub fn handle_social(&self, initiator: AgentId, interaction: &str) {
        let Ok(mut state) = self.state.lock() else {
            warn!(agent = %self.agent, "brain state lock poisoned");
            return;
        };
        if state.processing {
            debug!(agent = %self.agent, "exchange in flight, social reaction skipped");
            return;
        }
        state.processing = true;
        drop(state);
        self.spawn_chain(ExchangeKind::Social {
            initiator: self.services.describer.agent_label(initiator),
            interaction: interaction.to_owned(),
        });
    }

    /// Spawn the exchange task. On completion the pending trigger, if
    /// any, re-enters through the rate gate and the chain continues as a
    /// decision exchange; otherwise the brain goes idle.
    fn spawn_chain(&self, first: ExchangeKind) {
        let agent = self.agent;
        let services = Arc::clone(&self.services);
        let state = Arc::clone(&self.state);
        self.services.runtime.spawn(async move {
            let mut kind = first;
            loop {
                let outcome = run_exchange(agent, &services, &kind).await;
                let next = {
                    let Ok(mut st) = state.lock() else {
                        warn!(%agent, "brain state lock poisoned, chain abandoned");
                        return;
                    };
                    if outcome.round_trip && matches!(kind, ExchangeKind::Decision { .. }) {
                        st.last_query_time = Some(Instant::now());
                    }
                    if let Some(decision) = outcome.decision {
                        st.last_decision = Some(decision);
                    }
                    st.processing = false;
                    match st.pending_trigger.take() {
                        Some(pending)
                            if gate_open(st.last_query_time, services.min_query_delay) =>
                        {
                            st.processing = true;
                            Some(pending)
                        }
                        Some(pending) => {
                            debug!(%agent, reason = pending, "pending trigger dropped by rate gate");
                            None
                        }
                        None => None,
                    }
                };
                match next {
                    Some(trigger) => kind = ExchangeKind::Decision { trigger },
                    None => break,
                }
            }
        });
    }
}

/// Whether enough time has passed since the last successful exchange.
fn gate_open(last: Option<Instant>, min_delay: Duration) -> bool {
    last.is_none_or(|t| t.elapsed() >= min_delay)
}

/// Run one exchange end to end: describe, render, send, extract, queue.
async fn run_exchange<B: DecisionBackend, D: WorldDescriber>(
    agent: AgentId,
    services: &BrainServices<B, D>,
    kind: &ExchangeKind,
) -> ExchangeOutcome {
    let Some(ctx) = services.describer.describe(agent) else {
        warn!(%agent, "agent cannot be described, exchange skipped");
        return ExchangeOutcome::failed();
    };

    let rendered: Result<RenderedPrompt, LlmError> = match kind {
        ExchangeKind::Decision { trigger } => services.prompts.render_decision(&ctx, trigger),
        ExchangeKind::Order { action, target } => {
            services.prompts.render_order(&ctx, action, target.as_deref())
        }
        ExchangeKind::Social { initiator, interaction } => {
            services.prompts.render_social(&ctx, initiator, interaction)
        }
    };
    let prompt = match rendered {
        Ok(prompt) => prompt,
        Err(error) => {
            warn!(%agent, %error, "prompt could not be rendered");
            return ExchangeOutcome::failed();
        }
    };

    let response = match services.backend.complete(&prompt.system, &prompt.user).await {
        Ok(response) => response,
        Err(LlmError::RateLimited { remaining_ms }) => {
            debug!(%agent, remaining_ms, "request dropped by global rate gate");
            return ExchangeOutcome::failed();
        }
        Err(error) => {
            warn!(%agent, %error, "exchange failed before dispatch");
            return ExchangeOutcome::failed();
        }
    };
    if !response.success {
        warn!(
            %agent,
            error = response.error.as_deref().unwrap_or("unknown"),
            "provider exchange failed"
        );
        return ExchangeOutcome::failed();
    }

    info!(
        %agent,
        tokens_used = response.tokens_used,
        elapsed_ms = response.elapsed_ms,
        "provider exchange completed"
    );

    let text = response.text.unwrap_or_default();
    match extract_decision(&text) {
        Ok(decision) => {
            info!(%agent, %decision, "decision extracted");
            let (effect, remembered) = match kind {
                ExchangeKind::Decision { .. } => {
                    (Effect::Decision(decision.clone()), Some(decision))
                }
                ExchangeKind::Order { .. } => (Effect::OrderVerdict(decision), None),
                ExchangeKind::Social { .. } => (Effect::SocialReaction(decision), None),
            };
            services.effects.push(agent, effect);
            ExchangeOutcome { round_trip: true, decision: remembered }
        }
        Err(error) => {
            // The round trip still counts against the gates.
            debug!(%agent, %error, "generated text carried no decision");
            ExchangeOutcome { round_trip: true, decision: None }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use reverie_llm::{PromptContext, ProviderResponse};

    use super::*;

    struct FixedBackend {
        calls: AtomicUsize,
        text: String,
    }

    impl FixedBackend {
        fn new(text: &str) -> Self {
            Self { calls: AtomicUsize::new(0), text: text.to_owned() }
        }
    }

    impl DecisionBackend for FixedBackend {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
        ) -> Result<ProviderResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ProviderResponse::succeeded(self.text.clone(), 10, 1.0))
        }
    }

    struct FixedDescriber;

    impl WorldDescriber for FixedDescriber {
        fn describe(&self, _agent: AgentId) -> Option<PromptContext> {
            Some(PromptContext {
                agent_text: "Dana, a settler.".to_owned(),
                colony_text: "A small outpost.".to_owned(),
                actions: Vec::new(),
            })
        }

        fn agent_label(&self, _agent: AgentId) -> String {
            "Dana".to_owned()
        }

        fn is_alive(&self, _agent: AgentId) -> bool {
            true
        }
    }

    fn services(
        backend: FixedBackend,
        min_delay: Duration,
    ) -> (Arc<BrainServices<FixedBackend, FixedDescriber>>, crate::queue::EffectDrain) {
        let (effects, drain) = crate::queue::effect_queue();
        let mut config = PipelineConfig::new(reverie_llm::ProviderConfig::for_kind(
            reverie_llm::ProviderKind::LocalInference,
        ));
        config.min_query_delay = min_delay;
        let services = Arc::new(BrainServices::new(
            backend,
            FixedDescriber,
            PromptEngine::bundled().unwrap(),
            effects,
            Handle::current(),
            &config,
        ));
        (services, drain)
    }

    async fn wait_idle<B: DecisionBackend, D: WorldDescriber>(brain: &AgentBrain<B, D>) {
        for _ in 0_u32..200 {
            if !brain.is_processing() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("brain never went idle");
    }

    #[tokio::test]
    async fn closed_gate_drops_fresh_triggers() {
        let (services, _drain) =
            services(FixedBackend::new(r#"{"action": "wait"}"#), Duration::from_secs(3600));
        let brain = AgentBrain::new(AgentId::new(), Arc::clone(&services));

        brain.request_decision("Became idle - nothing to do");
        wait_idle(&brain).await;
        assert_eq!(services.backend.calls.load(Ordering::SeqCst), 1);

        // Gate is now closed for an hour; nothing further goes out.
        brain.request_decision("Became idle - nothing to do");
        wait_idle(&brain).await;
        assert_eq!(services.backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn successful_exchange_updates_memory_and_gate() {
        let raw = r#"{"thought": "Time to eat.", "action": "eat", "speech": "Lunch."}"#;
        let (services, _drain) = services(FixedBackend::new(raw), Duration::ZERO);
        let brain = AgentBrain::new(AgentId::new(), services);

        brain.request_decision("Hunger is critical");
        wait_idle(&brain).await;

        let state = brain.snapshot();
        assert!(state.last_query_time.is_some());
        let decision = state.last_decision.unwrap();
        assert_eq!(decision.action_name, "eat");
        assert_eq!(decision.spoken_line.as_deref(), Some("Lunch."));
    }

    #[tokio::test]
    async fn unparseable_response_still_advances_the_gate() {
        let (services, _drain) =
            services(FixedBackend::new("I would rather not answer in JSON."), Duration::ZERO);
        let brain = AgentBrain::new(AgentId::new(), services);

        brain.request_decision("Threat detected: raider");
        wait_idle(&brain).await;

        let state = brain.snapshot();
        assert!(state.last_query_time.is_some(), "the round trip happened");
        assert!(state.last_decision.is_none());
    }

    #[tokio::test]
    async fn unrefusable_orders_never_reach_the_backend() {
        let (effects, _drain) = crate::queue::effect_queue();
        let mut config = PipelineConfig::new(reverie_llm::ProviderConfig::for_kind(
            reverie_llm::ProviderKind::LocalInference,
        ));
        config.can_refuse_orders = false;
        let services = Arc::new(BrainServices::new(
            FixedBackend::new(r#"{"action": "refuse"}"#),
            FixedDescriber,
            PromptEngine::bundled().unwrap(),
            effects,
            Handle::current(),
            &config,
        ));
        let brain = AgentBrain::new(AgentId::new(), Arc::clone(&services));

        brain.handle_order("attack", Some("raider"));
        wait_idle(&brain).await;
        assert_eq!(services.backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn order_exchange_does_not_touch_decision_memory() {
        let raw = r#"{"thought": "No.", "action": "refuse", "speech": "I won't."}"#;
        let (services, _drain) = services(FixedBackend::new(raw), Duration::ZERO);
        let brain = AgentBrain::new(AgentId::new(), services);

        brain.handle_order("haul", None);
        wait_idle(&brain).await;

        let state = brain.snapshot();
        assert!(state.last_decision.is_none());
        assert!(state.last_query_time.is_none());
    }
}
