//! The structured decision extracted from generated text, and the
//! advisory action descriptor sent to the model.

use serde::{Deserialize, Serialize};

/// A structured decision recovered from a provider's free-form text.
///
/// Valid iff [`action_name`] is non-empty after trimming. The name may be
/// a plain verb (`"eat"`) or a `category:subaction` compound
/// (`"work:cooking"`). The extractor does not validate the action against
/// the advisory [`AvailableAction`] list; illegal or unknown actions fail
/// gracefully at dispatch time, not at parse time.
///
/// [`action_name`]: Decision::action_name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// The agent's in-character internal monologue.
    pub reasoning: String,
    /// The chosen action name, possibly a `category:subaction` compound.
    pub action_name: String,
    /// Optional target (an agent name, room label, compass direction...).
    pub target: Option<String>,
    /// Optional line spoken out loud.
    pub spoken_line: Option<String>,
}

impl Decision {
    /// Whether this decision names an action at all.
    pub fn is_valid(&self) -> bool {
        !self.action_name.trim().is_empty()
    }
}

impl core::fmt::Display for Decision {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "action: {}, target: {}",
            self.action_name,
            self.target.as_deref().unwrap_or("none"),
        )
    }
}

/// An action the host simulation currently considers legal for an agent.
///
/// Advisory only: it is rendered into the prompt so the model knows its
/// options, but neither the extractor nor the dispatcher checks a
/// [`Decision`] against this list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableAction {
    /// The action name the model should echo back.
    pub name: String,
    /// Routing category (`"work"`, `"social"`, or empty for simple actions).
    pub category: String,
    /// Short human-readable description rendered into the prompt.
    pub description: String,
    /// Optional target hints (names the model may pick from).
    pub targets: Vec<String>,
}
