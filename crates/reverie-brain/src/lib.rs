//! Simulation-side half of the Reverie decision pipeline.
//!
//! The host simulation raises triggers, orders, and social events; this
//! crate schedules provider exchanges per agent (single-flight, coalesced,
//! rate-gated), queues the resulting effects, and applies them back to the
//! world on the simulation thread through a narrow capability trait.
//!
//! The usual wiring:
//!
//! 1. Build a [`RequestRouter`](reverie_llm::RequestRouter) from a
//!    [`PipelineConfig`] and bundle it into [`BrainServices`] together
//!    with the host's [`WorldDescriber`] and an [`effect_queue`] pair.
//! 2. Hand the services to a [`BrainRegistry`] and call
//!    [`on_tick`](BrainRegistry::on_tick) every simulation tick.
//! 3. Drain the [`EffectDrain`] against the host's
//!    [`WorldCapabilities`] each tick with a [`Dispatcher`].

mod backend;
mod brain;
mod config;
mod dispatch;
mod queue;
mod registry;
mod world;

#[cfg(test)]
mod test_world;

pub use backend::DecisionBackend;
pub use brain::{AgentBrain, BrainServices, BrainState};
pub use config::{PipelineConfig, DEFAULT_MIN_QUERY_DELAY};
pub use dispatch::{DispatchError, Dispatcher};
pub use queue::{effect_queue, DeferredEffect, Effect, EffectDrain, EffectQueue};
pub use registry::BrainRegistry;
pub use world::{JobSpec, WorldCapabilities, WorldDescriber};
