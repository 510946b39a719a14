//! Shared data model for the Reverie decision pipeline.
//!
//! Reverie drives LLM-backed decision-making for individually simulated
//! agents inside a host simulation. This crate holds the types that cross
//! crate boundaries: the [`AgentId`] identifier, the structured
//! [`Decision`] extracted from generated text, the advisory
//! [`AvailableAction`] descriptor, and the small geometry/enum helpers the
//! dispatcher needs for target search.
//!
//! Everything here is plain data; behavior lives in `reverie-llm`
//! (provider side) and `reverie-brain` (simulation side).

mod decision;
mod enums;
mod geometry;
mod ids;

pub use decision::{AvailableAction, Decision};
pub use enums::{CompassDirection, QueryTiming};
pub use geometry::Cell;
pub use ids::AgentId;
