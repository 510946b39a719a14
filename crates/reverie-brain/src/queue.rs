//! Deferred-effect queue.
//!
//! Exchange tasks finish on the runtime's worker threads, but world
//! mutation is only legal on the simulation thread. Completed exchanges
//! therefore push an [`Effect`] here, and the host drains the queue once
//! per simulation tick. Agents can die between completion and drain, so
//! every effect is liveness-checked again at apply time.

use reverie_types::{AgentId, Decision};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::dispatch::Dispatcher;
use crate::world::WorldCapabilities;

/// What a finished exchange wants done to the world.
#[derive(Debug, Clone)]
pub enum Effect {
    /// A full decision: speech plus action routing.
    Decision(Decision),
    /// A verdict on a player order. Only a literal `refuse` action does
    /// anything at all; any other verdict is silent compliance, with the
    /// spoken line dropped along with the rest of the decision.
    OrderVerdict(Decision),
    /// A reaction to an incoming social interaction: speech only, the
    /// action and target are ignored.
    SocialReaction(Decision),
}

/// One queued effect, tagged with the agent it belongs to.
#[derive(Debug, Clone)]
pub struct DeferredEffect {
    /// The agent the effect applies to.
    pub agent: AgentId,
    /// The effect itself.
    pub effect: Effect,
}

/// Producer half, cloned into every exchange task.
#[derive(Debug, Clone)]
pub struct EffectQueue {
    tx: mpsc::UnboundedSender<DeferredEffect>,
}

/// Consumer half, owned by the host and drained on the simulation thread.
#[derive(Debug)]
pub struct EffectDrain {
    rx: mpsc::UnboundedReceiver<DeferredEffect>,
}

/// A fresh queue pair.
#[must_use]
pub fn effect_queue() -> (EffectQueue, EffectDrain) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EffectQueue { tx }, EffectDrain { rx })
}

impl EffectQueue {
    /// Queue an effect for the next drain. Effects for agents that die in
    /// the meantime are discarded at drain time, not here.
    pub fn push(&self, agent: AgentId, effect: Effect) {
        if self.tx.send(DeferredEffect { agent, effect }).is_err() {
            warn!(%agent, "effect dropped, drain side is gone");
        }
    }
}

impl EffectDrain {
    /// Apply every queued effect against the world. Returns how many were
    /// applied successfully; effects for dead agents and failed dispatches
    /// are logged and skipped.
    pub fn drain<W: WorldCapabilities + ?Sized>(
        &mut self,
        world: &mut W,
        dispatcher: &Dispatcher,
    ) -> usize {
        let mut applied = 0_usize;
        while let Ok(item) = self.rx.try_recv() {
            if !world.is_alive(item.agent) {
                debug!(agent = %item.agent, "discarding effect for dead or absent agent");
                continue;
            }
            let result = match &item.effect {
                Effect::Decision(decision) => dispatcher.dispatch(world, item.agent, decision),
                Effect::OrderVerdict(decision) => {
                    if decision.action_name.trim().eq_ignore_ascii_case("refuse") {
                        dispatcher.dispatch(world, item.agent, decision)
                    } else {
                        // Compliance is completely silent: the order
                        // already stands, and not even speech is emitted.
                        Ok(())
                    }
                }
                Effect::SocialReaction(decision) => {
                    if let Some(line) = decision.spoken_line.as_deref() {
                        if !line.trim().is_empty() {
                            world.say(item.agent, line);
                        }
                    }
                    Ok(())
                }
            };
            match result {
                Ok(()) => applied = applied.saturating_add(1),
                Err(error) => {
                    warn!(agent = %item.agent, %error, "effect could not be applied");
                }
            }
        }
        applied
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reverie_types::Cell;

    use super::*;
    use crate::test_world::{decision, RecordingWorld};

    #[test]
    fn decisions_apply_in_arrival_order() {
        let (queue, mut drain) = effect_queue();
        let mut world = RecordingWorld::new();
        let agent = world.spawn("Dana", Cell::new(5, 5));

        queue.push(agent, Effect::Decision(decision("draft", None, Some("To arms!"))));
        queue.push(agent, Effect::Decision(decision("wait", None, None)));

        let applied = drain.drain(&mut world, &Dispatcher::new(false));
        assert_eq!(applied, 2);
        assert_eq!(world.says, vec![(agent, "To arms!".to_owned())]);
        assert!(world.combat_ready.contains(&agent));
    }

    #[test]
    fn effects_for_dead_agents_are_discarded() {
        let (queue, mut drain) = effect_queue();
        let mut world = RecordingWorld::new();
        let agent = world.spawn("Dana", Cell::new(5, 5));

        queue.push(agent, Effect::Decision(decision("draft", None, None)));
        world.kill(agent);

        let applied = drain.drain(&mut world, &Dispatcher::new(false));
        assert_eq!(applied, 0);
        assert!(world.combat_ready.is_empty());
    }

    #[test]
    fn order_verdict_only_acts_on_literal_refuse() {
        let (queue, mut drain) = effect_queue();
        let mut world = RecordingWorld::new();
        let agent = world.spawn("Dana", Cell::new(5, 5));

        // A verdict naming any other action is compliance, and compliance
        // is completely silent: no job, no speech, nothing.
        queue.push(agent, Effect::OrderVerdict(decision("eat", None, Some("Fine."))));
        queue.push(agent, Effect::OrderVerdict(decision(" Refuse ", None, None)));

        let applied = drain.drain(&mut world, &Dispatcher::new(false));
        assert_eq!(applied, 2);
        assert!(world.started.is_empty(), "compliance must not start jobs");
        assert!(world.says.is_empty(), "compliance must not speak");
        assert_eq!(world.ended, vec![agent]);
    }

    #[test]
    fn social_reaction_is_speech_only() {
        let (queue, mut drain) = effect_queue();
        let mut world = RecordingWorld::new();
        let agent = world.spawn("Dana", Cell::new(5, 5));

        queue.push(
            agent,
            Effect::SocialReaction(decision("attack", Some("Rook"), Some("Good one!"))),
        );

        let applied = drain.drain(&mut world, &Dispatcher::new(false));
        assert_eq!(applied, 1);
        assert_eq!(world.says, vec![(agent, "Good one!".to_owned())]);
        assert!(world.started.is_empty());
    }

    #[test]
    fn failed_dispatch_is_skipped_not_fatal() {
        let (queue, mut drain) = effect_queue();
        let mut world = RecordingWorld::new();
        let agent = world.spawn("Dana", Cell::new(5, 5));

        queue.push(agent, Effect::Decision(decision("levitate", None, None)));
        queue.push(agent, Effect::Decision(decision("wait", None, None)));

        let applied = drain.drain(&mut world, &Dispatcher::new(false));
        assert_eq!(applied, 1);
    }
}
