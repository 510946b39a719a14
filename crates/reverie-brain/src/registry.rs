//! Brain registry: roster tracking and tick-driven scheduling.
//!
//! The host calls [`BrainRegistry::on_tick`] once per simulation tick.
//! The registry keeps the brain map in step with the roster on a coarse
//! cadence, and in the periodic timing modes it also polls idle agents
//! for unprompted decisions.

use std::collections::HashMap;
use std::sync::Arc;

use reverie_types::{AgentId, QueryTiming};
use tracing::{debug, info};

use crate::backend::DecisionBackend;
use crate::brain::{AgentBrain, BrainServices};
use crate::world::WorldDescriber;

/// How often the brain map is reconciled against the roster, in ticks.
const ROSTER_SYNC_INTERVAL_TICKS: u64 = 250;
/// Simulation ticks per real-time second.
const TICKS_PER_SECOND: u64 = 60;
/// Trigger text used for unprompted periodic check-ins.
const PERIODIC_TRIGGER: &str = "Periodic check-in - consider your situation";

/// Owns one [`AgentBrain`] per live AI-controlled agent.
pub struct BrainRegistry<B, D> {
    services: Arc<BrainServices<B, D>>,
    brains: HashMap<AgentId, AgentBrain<B, D>>,
    query_timing: QueryTiming,
    periodic_interval_ticks: u64,
}

impl<B: DecisionBackend, D: WorldDescriber> BrainRegistry<B, D> {
    /// An empty registry. The periodic cadence derives from the shared
    /// minimum query delay, so polling never outpaces the rate gates.
    pub fn new(services: Arc<BrainServices<B, D>>, query_timing: QueryTiming) -> Self {
        let delay_secs = services.min_query_delay.as_secs().max(1);
        let periodic_interval_ticks = match query_timing {
            // Continuous mode polls every second; the rate gates decide
            // how many of those polls actually go out.
            QueryTiming::Continuous => TICKS_PER_SECOND,
            _ => delay_secs.saturating_mul(TICKS_PER_SECOND),
        };
        Self { services, brains: HashMap::new(), query_timing, periodic_interval_ticks }
    }

    /// Advance the registry by one simulation tick.
    pub fn on_tick(&mut self, tick: u64, roster: &[AgentId]) {
        if tick.is_multiple_of(ROSTER_SYNC_INTERVAL_TICKS) {
            self.sync_roster(roster);
        }
        if matches!(self.query_timing, QueryTiming::Periodic | QueryTiming::Continuous)
            && tick.is_multiple_of(self.periodic_interval_ticks)
        {
            for brain in self.brains.values() {
                if !brain.is_processing() {
                    brain.request_decision(PERIODIC_TRIGGER);
                }
            }
        }
    }

    /// Reconcile the brain map against the roster right now.
    ///
    /// Brains for departed or dead agents are dropped; any in-flight
    /// exchange they still have will finish on the runtime, and its
    /// effect is discarded by the liveness check at drain time.
    pub fn sync_roster(&mut self, roster: &[AgentId]) {
        for &agent in roster {
            if !self.brains.contains_key(&agent) && self.services.describer.is_alive(agent) {
                info!(%agent, "agent joined, brain created");
                self.brains.insert(agent, AgentBrain::new(agent, Arc::clone(&self.services)));
            }
        }
        let departed: Vec<AgentId> = self
            .brains
            .keys()
            .copied()
            .filter(|agent| {
                !roster.contains(agent) || !self.services.describer.is_alive(*agent)
            })
            .collect();
        for agent in departed {
            info!(%agent, "agent departed, brain dropped");
            self.brains.remove(&agent);
        }
    }

    /// Forward a trigger to one agent's brain, if it has one.
    pub fn request_decision(&self, agent: AgentId, reason: &str) {
        match self.brains.get(&agent) {
            Some(brain) => brain.request_decision(reason),
            None => debug!(%agent, reason, "trigger for unregistered agent ignored"),
        }
    }

    /// Put a player order to one agent's brain, if it has one.
    pub fn handle_order(&self, agent: AgentId, action: &str, target: Option<&str>) {
        if let Some(brain) = self.brains.get(&agent) {
            brain.handle_order(action, target);
        }
    }

    /// Tell one agent's brain about an incoming social interaction.
    pub fn handle_social(&self, agent: AgentId, initiator: AgentId, interaction: &str) {
        if let Some(brain) = self.brains.get(&agent) {
            brain.handle_social(initiator, interaction);
        }
    }

    /// Raise the same trigger for every registered agent. Used for
    /// colony-wide events like raids.
    pub fn broadcast(&self, reason: &str) {
        for brain in self.brains.values() {
            brain.request_decision(reason);
        }
    }

    /// The brain for one agent, if registered.
    pub fn brain(&self, agent: AgentId) -> Option<&AgentBrain<B, D>> {
        self.brains.get(&agent)
    }

    /// How many agents currently have brains.
    pub fn len(&self) -> usize {
        self.brains.len()
    }

    /// Whether no agents are registered.
    pub fn is_empty(&self) -> bool {
        self.brains.is_empty()
    }
}
