//! A recording world shared by the unit tests in this crate.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use std::collections::{HashMap, HashSet};

use reverie_types::{AgentId, Cell, Decision};

use crate::world::{JobSpec, WorldCapabilities};

/// Shorthand for building a decision in tests.
pub(crate) fn decision(action: &str, target: Option<&str>, speech: Option<&str>) -> Decision {
    Decision {
        reasoning: "test".to_owned(),
        action_name: action.to_owned(),
        target: target.map(str::to_owned),
        spoken_line: speech.map(str::to_owned),
    }
}

/// An in-memory world that records every capability call.
#[derive(Default)]
pub(crate) struct RecordingWorld {
    pub names: HashMap<AgentId, String>,
    pub positions: HashMap<AgentId, Cell>,
    pub alive: HashSet<AgentId>,
    pub combat_ready: HashSet<AgentId>,
    pub hostiles: Vec<(AgentId, Cell)>,
    pub cover: HashMap<Cell, f32>,
    pub rooms: HashMap<String, Cell>,
    pub shelter: Option<Cell>,
    pub food: Option<String>,
    pub rest_spot: Option<Cell>,
    pub work_types: HashSet<String>,
    pub allowed_work: HashSet<(AgentId, String)>,
    pub fail_jobs: bool,

    pub started: Vec<(AgentId, JobSpec)>,
    pub says: Vec<(AgentId, String)>,
    pub notifications: Vec<String>,
    pub ended: Vec<AgentId>,
    pub interactions: Vec<(AgentId, AgentId, String)>,
}

impl RecordingWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, name: &str, pos: Cell) -> AgentId {
        let agent = AgentId::new();
        self.names.insert(agent, name.to_owned());
        self.positions.insert(agent, pos);
        self.alive.insert(agent);
        agent
    }

    pub fn spawn_hostile(&mut self, pos: Cell) -> AgentId {
        let hostile = AgentId::new();
        self.hostiles.push((hostile, pos));
        hostile
    }

    pub fn kill(&mut self, agent: AgentId) {
        self.alive.remove(&agent);
    }
}

impl WorldCapabilities for RecordingWorld {
    fn start_job(&mut self, agent: AgentId, job: JobSpec) -> bool {
        if self.fail_jobs {
            return false;
        }
        self.started.push((agent, job));
        true
    }

    fn set_combat_ready(&mut self, agent: AgentId, ready: bool) -> bool {
        if ready {
            self.combat_ready.insert(agent);
        } else {
            self.combat_ready.remove(&agent);
        }
        true
    }

    fn end_current_activity(&mut self, agent: AgentId) -> bool {
        self.ended.push(agent);
        true
    }

    fn say(&mut self, agent: AgentId, line: &str) {
        self.says.push((agent, line.to_owned()));
    }

    fn notify(&mut self, message: &str) {
        self.notifications.push(message.to_owned());
    }

    fn interact_with(&mut self, agent: AgentId, target: AgentId, interaction: &str) -> bool {
        self.interactions.push((agent, target, interaction.to_owned()));
        true
    }

    fn is_alive(&self, agent: AgentId) -> bool {
        self.alive.contains(&agent)
    }

    fn is_combat_ready(&self, agent: AgentId) -> bool {
        self.combat_ready.contains(&agent)
    }

    fn agent_label(&self, agent: AgentId) -> String {
        self.names.get(&agent).cloned().unwrap_or_else(|| "someone".to_owned())
    }

    fn position_of(&self, agent: AgentId) -> Option<Cell> {
        self.positions.get(&agent).copied()
    }

    fn map_size(&self) -> Cell {
        Cell::new(100, 100)
    }

    fn cells_near(&self, origin: Cell, radius: i32) -> Vec<Cell> {
        let mut cells = Vec::new();
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                cells.push(Cell::new(
                    origin.x.saturating_add(dx),
                    origin.z.saturating_add(dz),
                ));
            }
        }
        cells
    }

    fn is_standable(&self, _cell: Cell) -> bool {
        true
    }

    fn cover_at(&self, cell: Cell) -> f32 {
        self.cover.get(&cell).copied().unwrap_or(0.0)
    }

    fn hostiles_near(&self, _agent: AgentId) -> Vec<(AgentId, Cell)> {
        self.hostiles.clone()
    }

    fn find_agent_named(&self, name: &str) -> Option<AgentId> {
        self.names
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name.trim()))
            .map(|(&agent, _)| agent)
    }

    fn room_cell(&self, label: &str) -> Option<Cell> {
        self.rooms.get(&label.trim().to_lowercase()).copied()
    }

    fn sheltered_cell(&self) -> Option<Cell> {
        self.shelter
    }

    fn find_food(&self, _agent: AgentId) -> Option<JobSpec> {
        self.food.clone().map(|food| JobSpec::Ingest { food })
    }

    fn find_rest_spot(&self, _agent: AgentId) -> Option<JobSpec> {
        self.rest_spot.map(|spot| JobSpec::LayDown { spot: Some(spot) })
    }

    fn find_recreation(&self, _agent: AgentId) -> Option<JobSpec> {
        None
    }

    fn work_type_exists(&self, name: &str) -> bool {
        self.work_types.contains(name)
    }

    fn work_allowed(&self, agent: AgentId, work_type: &str) -> bool {
        self.allowed_work.contains(&(agent, work_type.to_owned()))
    }

    fn find_work_job(&self, _agent: AgentId, work_type: &str) -> Option<JobSpec> {
        Some(JobSpec::Work { work_type: work_type.to_owned() })
    }
}
