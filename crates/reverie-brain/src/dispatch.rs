//! Maps an extracted [`Decision`] onto world capabilities.
//!
//! Runs on the simulation thread while the deferred queue drains. Spoken
//! lines are emitted before the action routes, so a decision whose action
//! later fails still gets its line out. Unknown actions fail here, never
//! at extraction time.

use reverie_types::{AgentId, CompassDirection, Decision};
use thiserror::Error;
use tracing::{debug, warn};

use crate::world::{JobSpec, WorldCapabilities};

/// Search radius for cover cells around the agent.
const COVER_SEARCH_RADIUS: i32 = 10;
/// Search radius for a fallback flee destination.
const FLEE_FALLBACK_RADIUS: i32 = 30;
/// How far from the map edge a compass flee destination sits.
const EDGE_MARGIN: i32 = 5;

/// Why a decision could not be applied.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The action name is not in the dispatch table.
    #[error("unknown action: {0}")]
    UnknownAction(String),
    /// The action is known but the world could not carry it out.
    #[error("{0}")]
    Failed(String),
}

/// Applies decisions to the world.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    /// Surface a notification when an agent refuses an order.
    pub notify_major_decisions: bool,
}

impl Dispatcher {
    /// A dispatcher with the given notification behavior.
    #[must_use]
    pub const fn new(notify_major_decisions: bool) -> Self {
        Self { notify_major_decisions }
    }

    /// Apply one decision for one agent.
    ///
    /// The spoken line, if any, is emitted unconditionally before the
    /// action routes. `category:subaction` names route through their
    /// category handler; everything else goes through the simple table.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnknownAction`] when the action name is not
    /// recognized, [`DispatchError::Failed`] when the world could not
    /// carry it out.
    pub fn dispatch<W: WorldCapabilities + ?Sized>(
        &self,
        world: &mut W,
        agent: AgentId,
        decision: &Decision,
    ) -> Result<(), DispatchError> {
        if !decision.is_valid() {
            return Err(DispatchError::Failed("decision names no action".to_owned()));
        }
        if let Some(line) = decision.spoken_line.as_deref() {
            if !line.trim().is_empty() {
                world.say(agent, line);
            }
        }

        let action = decision.action_name.trim().to_lowercase();
        let target = decision.target.as_deref();
        debug!(%agent, %action, ?target, "dispatching decision");

        if let Some((category, sub)) = action.split_once(':') {
            match category {
                "work" => return Self::work(world, agent, sub.trim()),
                "social" => return Self::social(world, agent, sub.trim(), target),
                // Unknown categories fall through to the simple table,
                // where the full compound name fails as unknown.
                _ => {}
            }
        }
        self.simple(world, agent, &action, target)
    }

    fn simple<W: WorldCapabilities + ?Sized>(
        &self,
        world: &mut W,
        agent: AgentId,
        action: &str,
        target: Option<&str>,
    ) -> Result<(), DispatchError> {
        match action {
            "wait" | "comply" => Ok(()),
            "eat" => {
                let job = world
                    .find_food(agent)
                    .ok_or_else(|| DispatchError::Failed("no food found".to_owned()))?;
                start(world, agent, job)
            }
            "rest" => {
                // No bed is never fatal: the agent lies down nearby.
                let job = world
                    .find_rest_spot(agent)
                    .unwrap_or(JobSpec::LayDown { spot: None });
                start(world, agent, job)
            }
            "recreation" => {
                let job = world
                    .find_recreation(agent)
                    .ok_or_else(|| DispatchError::Failed("nothing recreational available".to_owned()))?;
                start(world, agent, job)
            }
            "draft" => stance(world, agent, true),
            "undraft" => stance(world, agent, false),
            "attack" => Self::attack(world, agent),
            "flee" => Self::flee(world, agent, target),
            "take_cover" => Self::take_cover(world, agent),
            "go_to" => {
                let label = target
                    .ok_or_else(|| DispatchError::Failed("go_to needs a room target".to_owned()))?;
                let cell = world.room_cell(label).ok_or_else(|| {
                    DispatchError::Failed(format!("no room matching '{label}'"))
                })?;
                start(world, agent, JobSpec::Goto { cell, sprint: false })
            }
            "go_to_pawn" => {
                let name = target
                    .ok_or_else(|| DispatchError::Failed("go_to_pawn needs a target".to_owned()))?;
                let other = world.find_agent_named(name).ok_or_else(|| {
                    DispatchError::Failed(format!("no agent named '{name}'"))
                })?;
                start(world, agent, JobSpec::GotoAgent { target: other })
            }
            "refuse" => {
                world.end_current_activity(agent);
                if self.notify_major_decisions {
                    let label = world.agent_label(agent);
                    world.notify(&format!("{label} refused your order."));
                }
                Ok(())
            }
            other => {
                warn!(%agent, action = other, "decision names an unknown action");
                Err(DispatchError::UnknownAction(other.to_owned()))
            }
        }
    }

    fn work<W: WorldCapabilities + ?Sized>(
        world: &mut W,
        agent: AgentId,
        work_type: &str,
    ) -> Result<(), DispatchError> {
        if !world.work_type_exists(work_type) {
            return Err(DispatchError::Failed(format!("unknown work type '{work_type}'")));
        }
        if !world.work_allowed(agent, work_type) {
            return Err(DispatchError::Failed(format!(
                "agent is not permitted to do '{work_type}' work"
            )));
        }
        let job = world.find_work_job(agent, work_type).ok_or_else(|| {
            DispatchError::Failed(format!("no '{work_type}' job available"))
        })?;
        start(world, agent, job)
    }

    fn social<W: WorldCapabilities + ?Sized>(
        world: &mut W,
        agent: AgentId,
        interaction: &str,
        target: Option<&str>,
    ) -> Result<(), DispatchError> {
        let name = target
            .ok_or_else(|| DispatchError::Failed("social action needs a target".to_owned()))?;
        let other = world
            .find_agent_named(name)
            .ok_or_else(|| DispatchError::Failed(format!("no agent named '{name}'")))?;
        start(world, agent, JobSpec::GotoAgent { target: other })?;
        // Best effort: if the interaction cannot begin the approach still
        // happened, and that alone reads as social intent.
        if !world.interact_with(agent, other, interaction) {
            debug!(%agent, %other, interaction, "interaction could not begin");
        }
        Ok(())
    }

    fn attack<W: WorldCapabilities + ?Sized>(
        world: &mut W,
        agent: AgentId,
    ) -> Result<(), DispatchError> {
        if !world.is_combat_ready(agent) {
            return Err(DispatchError::Failed("agent is not combat-ready".to_owned()));
        }
        let pos = world
            .position_of(agent)
            .ok_or_else(|| DispatchError::Failed("agent is not on the map".to_owned()))?;
        let nearest = world
            .hostiles_near(agent)
            .into_iter()
            .min_by(|a, b| pos.distance_to(a.1).total_cmp(&pos.distance_to(b.1)))
            .ok_or_else(|| DispatchError::Failed("no hostile in range".to_owned()))?;
        start(world, agent, JobSpec::AttackMelee { target: nearest.0 })
    }

    fn flee<W: WorldCapabilities + ?Sized>(
        world: &mut W,
        agent: AgentId,
        target: Option<&str>,
    ) -> Result<(), DispatchError> {
        let pos = world
            .position_of(agent)
            .ok_or_else(|| DispatchError::Failed("agent is not on the map".to_owned()))?;
        let size = world.map_size();

        let hinted = target.and_then(|t| match CompassDirection::parse(t) {
            Some(CompassDirection::North) => {
                Some(reverie_types::Cell::new(pos.x, size.z.saturating_sub(EDGE_MARGIN)))
            }
            Some(CompassDirection::South) => Some(reverie_types::Cell::new(pos.x, EDGE_MARGIN)),
            Some(CompassDirection::East) => {
                Some(reverie_types::Cell::new(size.x.saturating_sub(EDGE_MARGIN), pos.z))
            }
            Some(CompassDirection::West) => Some(reverie_types::Cell::new(EDGE_MARGIN, pos.z)),
            None if t.trim().eq_ignore_ascii_case("indoors") => world.sheltered_cell(),
            None => None,
        });

        let cell = match hinted {
            Some(cell) => cell,
            None => world
                .cells_near(pos, FLEE_FALLBACK_RADIUS)
                .into_iter()
                .find(|&c| c != pos && world.is_standable(c))
                .ok_or_else(|| DispatchError::Failed("nowhere to flee to".to_owned()))?,
        };
        start(world, agent, JobSpec::Flee { cell })
    }

    fn take_cover<W: WorldCapabilities + ?Sized>(
        world: &mut W,
        agent: AgentId,
    ) -> Result<(), DispatchError> {
        let pos = world
            .position_of(agent)
            .ok_or_else(|| DispatchError::Failed("agent is not on the map".to_owned()))?;
        let best = world
            .cells_near(pos, COVER_SEARCH_RADIUS)
            .into_iter()
            .filter(|&c| world.is_standable(c))
            .map(|c| (c, world.cover_at(c)))
            .filter(|&(_, cover)| cover > 0.0)
            .max_by(|a, b| a.1.total_cmp(&b.1));
        match best {
            // Already at the best cover nearby, or no cover at all: stay put.
            Some((cell, _)) if cell != pos => {
                start(world, agent, JobSpec::Goto { cell, sprint: true })
            }
            _ => Ok(()),
        }
    }
}

fn start<W: WorldCapabilities + ?Sized>(
    world: &mut W,
    agent: AgentId,
    job: JobSpec,
) -> Result<(), DispatchError> {
    if world.start_job(agent, job) {
        Ok(())
    } else {
        Err(DispatchError::Failed("job could not be started".to_owned()))
    }
}

fn stance<W: WorldCapabilities + ?Sized>(
    world: &mut W,
    agent: AgentId,
    ready: bool,
) -> Result<(), DispatchError> {
    if world.set_combat_ready(agent, ready) {
        Ok(())
    } else {
        Err(DispatchError::Failed("stance could not change".to_owned()))
    }
}
