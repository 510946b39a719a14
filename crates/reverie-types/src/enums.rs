//! Small shared enums: query timing modes and compass directions.

use serde::{Deserialize, Serialize};

/// When the pipeline consults the provider for new decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QueryTiming {
    /// Only host-raised triggers start exchanges.
    #[default]
    EventDriven,
    /// The registry also polls every idle agent on a fixed cadence.
    Periodic,
    /// As `Periodic`, but the cadence is the minimum the rate gates allow.
    Continuous,
}

/// A named compass direction used as a flee destination hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompassDirection {
    /// Toward the top edge of the map.
    North,
    /// Toward the bottom edge of the map.
    South,
    /// Toward the right edge of the map.
    East,
    /// Toward the left edge of the map.
    West,
}

impl CompassDirection {
    /// Parse a direction from a target string, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "north" => Some(Self::North),
            "south" => Some(Self::South),
            "east" => Some(Self::East),
            "west" => Some(Self::West),
            _ => None,
        }
    }
}
