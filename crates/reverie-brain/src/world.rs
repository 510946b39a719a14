//! Host-world seams.
//!
//! The pipeline never touches the simulation directly. Everything it needs
//! from the world comes in through two traits: [`WorldDescriber`] snapshots
//! an agent into prompt text on the simulation thread, and
//! [`WorldCapabilities`] is the narrow mutation surface the dispatcher
//! drives when a decision is applied.

use reverie_llm::PromptContext;
use reverie_types::{AgentId, Cell};

/// Snapshots world state into the opaque text blocks a prompt needs.
///
/// Implementations run on the simulation thread, before an exchange is
/// spawned, so they may read live simulation state freely.
pub trait WorldDescriber: Send + Sync + 'static {
    /// Build the agent/colony text blocks plus the legal action list for
    /// one agent. Returns `None` when the agent cannot currently be
    /// described (despawned, off-map).
    fn describe(&self, agent: AgentId) -> Option<PromptContext>;

    /// Short display name, used in prompts and notifications.
    fn agent_label(&self, agent: AgentId) -> String;

    /// Whether the agent is still alive and present in the world.
    fn is_alive(&self, agent: AgentId) -> bool;
}

/// A concrete activity the world can start for an agent.
///
/// The dispatcher decides *what* should happen; the host decides *how* in
/// its own job system. Specs carry just enough detail to be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSpec {
    /// Consume a food item the world already located.
    Ingest {
        /// Host-side label for the chosen food item.
        food: String,
    },
    /// Lie down to rest, in a bed or at a nearby spot.
    LayDown {
        /// Where to lie down; `None` lets the host pick a spot near the agent.
        spot: Option<Cell>,
    },
    /// Do something recreational at the given spot.
    Recreation {
        /// Where the recreation happens.
        spot: Cell,
    },
    /// Walk (or sprint) to a cell.
    Goto {
        /// Destination cell.
        cell: Cell,
        /// Move at sprint speed.
        sprint: bool,
    },
    /// Walk to another agent's position.
    GotoAgent {
        /// The agent to approach.
        target: AgentId,
    },
    /// Close and attack a target in melee.
    AttackMelee {
        /// The hostile to attack.
        target: AgentId,
    },
    /// Run to a cell, abandoning the current activity.
    Flee {
        /// Destination cell.
        cell: Cell,
    },
    /// Pick up a job of the given work type.
    Work {
        /// Host-side work type name, already validated.
        work_type: String,
    },
}

/// The mutation and query surface the dispatcher drives.
///
/// All methods are called on the simulation thread while the deferred
/// queue drains, so implementations may touch live world state.
pub trait WorldCapabilities {
    /// Start a job for an agent, interrupting whatever it was doing.
    /// Returns `false` when the job could not be started.
    fn start_job(&mut self, agent: AgentId, job: JobSpec) -> bool;

    /// Put the agent into or out of the combat-ready stance.
    /// Returns `false` when the agent cannot change stance.
    fn set_combat_ready(&mut self, agent: AgentId, ready: bool) -> bool;

    /// End the agent's current activity immediately.
    fn end_current_activity(&mut self, agent: AgentId) -> bool;

    /// Have the agent speak a line where others can see it.
    fn say(&mut self, agent: AgentId, line: &str);

    /// Surface a notification to the player.
    fn notify(&mut self, message: &str);

    /// Start a social interaction between two agents once adjacent.
    /// Returns `false` when the interaction could not begin.
    fn interact_with(&mut self, agent: AgentId, target: AgentId, interaction: &str) -> bool;

    /// Whether the agent is alive and present.
    fn is_alive(&self, agent: AgentId) -> bool;

    /// Whether the agent is currently combat-ready.
    fn is_combat_ready(&self, agent: AgentId) -> bool;

    /// Short display name for notifications.
    fn agent_label(&self, agent: AgentId) -> String;

    /// Current position, `None` when the agent is not on the map.
    fn position_of(&self, agent: AgentId) -> Option<Cell>;

    /// Map dimensions as the exclusive upper corner.
    fn map_size(&self) -> Cell;

    /// Cells within `radius` of `origin`, in host-preferred order.
    fn cells_near(&self, origin: Cell, radius: i32) -> Vec<Cell>;

    /// Whether an agent can stand on the cell.
    fn is_standable(&self, cell: Cell) -> bool;

    /// Cover effectiveness at a cell, `0.0` for open ground.
    fn cover_at(&self, cell: Cell) -> f32;

    /// Hostiles threatening the agent, with their positions.
    fn hostiles_near(&self, agent: AgentId) -> Vec<(AgentId, Cell)>;

    /// Resolve a display name back to an agent, case-insensitively.
    fn find_agent_named(&self, name: &str) -> Option<AgentId>;

    /// A reachable cell inside the named room, if such a room exists.
    fn room_cell(&self, label: &str) -> Option<Cell>;

    /// A reachable indoor cell suitable for taking shelter.
    fn sheltered_cell(&self) -> Option<Cell>;

    /// Locate food the agent can eat right now.
    fn find_food(&self, agent: AgentId) -> Option<JobSpec>;

    /// Locate a bed or rest spot for the agent.
    fn find_rest_spot(&self, agent: AgentId) -> Option<JobSpec>;

    /// Locate something recreational the agent can do.
    fn find_recreation(&self, agent: AgentId) -> Option<JobSpec>;

    /// Whether the named work type exists in this world.
    fn work_type_exists(&self, name: &str) -> bool;

    /// Whether the agent is permitted to do the named work type.
    fn work_allowed(&self, agent: AgentId, work_type: &str) -> bool;

    /// Find a concrete job of the given work type for the agent.
    fn find_work_job(&self, agent: AgentId, work_type: &str) -> Option<JobSpec>;
}
