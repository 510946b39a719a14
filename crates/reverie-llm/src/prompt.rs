//! Prompt template loading and rendering via `minijinja`.
//!
//! Templates can be loaded from a directory so operators can tune agent
//! behavior without recompiling, or taken from the compiled-in defaults.
//! Three user-prompt shapes exist: the normal decision prompt, the
//! order-compliance prompt (comply/refuse), and the social-reaction
//! prompt. All three share the same system prompt, which pins the JSON
//! response format the extractor scans for.

use minijinja::{Environment, context};
use reverie_types::AvailableAction;

use crate::error::LlmError;

/// The template names the engine expects.
const TEMPLATE_NAMES: [&str; 4] = ["system", "decision", "order", "social"];

/// Compiled-in default templates, paired with [`TEMPLATE_NAMES`].
const BUNDLED: [&str; 4] = [
    include_str!("../templates/system.j2"),
    include_str!("../templates/decision.j2"),
    include_str!("../templates/order.j2"),
    include_str!("../templates/social.j2"),
];

/// The opaque context blocks the world describer produced for one agent.
#[derive(Debug, Clone)]
pub struct PromptContext {
    /// Description of the agent itself (identity, mood, needs...).
    pub agent_text: String,
    /// Description of the agent's surroundings and colony.
    pub colony_text: String,
    /// Currently legal actions, advisory only.
    pub actions: Vec<AvailableAction>,
}

/// The complete rendered prompt pair ready for a provider exchange.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    /// System message establishing the agent's reality and output format.
    pub system: String,
    /// User message carrying context and the triggering situation.
    pub user: String,
}

/// Manages prompt template loading and rendering.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    /// Create an engine using the compiled-in default templates.
    pub fn bundled() -> Result<Self, LlmError> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATE_NAMES.iter().zip(BUNDLED) {
            env.add_template_owned((*name).to_owned(), source.to_owned())
                .map_err(|e| LlmError::Template(format!("failed to add {name} template: {e}")))?;
        }
        Ok(Self { env })
    }

    /// Create an engine loading `system.j2`, `decision.j2`, `order.j2`,
    /// and `social.j2` from the given directory.
    pub fn from_dir(templates_dir: &str) -> Result<Self, LlmError> {
        let mut env = Environment::new();
        for name in TEMPLATE_NAMES {
            let path = format!("{templates_dir}/{name}.j2");
            let source = std::fs::read_to_string(&path)
                .map_err(|e| LlmError::Template(format!("failed to read {path}: {e}")))?;
            env.add_template_owned(name.to_owned(), source)
                .map_err(|e| LlmError::Template(format!("failed to add {name} template: {e}")))?;
        }
        Ok(Self { env })
    }

    /// Render the prompt pair for a normal decision exchange.
    pub fn render_decision(
        &self,
        ctx: &PromptContext,
        trigger: &str,
    ) -> Result<RenderedPrompt, LlmError> {
        let user = self.render(
            "decision",
            context! {
                agent => ctx.agent_text,
                colony => ctx.colony_text,
                actions => ctx.actions,
                trigger => trigger,
            },
        )?;
        Ok(RenderedPrompt { system: self.render_system()?, user })
    }

    /// Render the prompt pair for an order-compliance exchange.
    pub fn render_order(
        &self,
        ctx: &PromptContext,
        order_action: &str,
        order_target: Option<&str>,
    ) -> Result<RenderedPrompt, LlmError> {
        let user = self.render(
            "order",
            context! {
                agent => ctx.agent_text,
                order_action => order_action,
                order_target => order_target,
            },
        )?;
        Ok(RenderedPrompt { system: self.render_system()?, user })
    }

    /// Render the prompt pair for a social-reaction exchange.
    pub fn render_social(
        &self,
        ctx: &PromptContext,
        initiator: &str,
        interaction: &str,
    ) -> Result<RenderedPrompt, LlmError> {
        let user = self.render(
            "social",
            context! {
                agent => ctx.agent_text,
                initiator => initiator,
                interaction => interaction,
            },
        )?;
        Ok(RenderedPrompt { system: self.render_system()?, user })
    }

    /// Render the shared system prompt.
    fn render_system(&self) -> Result<String, LlmError> {
        self.render("system", context! {})
    }

    /// Render one named template with the given context.
    fn render<S: serde::Serialize>(&self, name: &str, ctx: S) -> Result<String, LlmError> {
        self.env
            .get_template(name)
            .map_err(|e| LlmError::Template(format!("missing {name} template: {e}")))?
            .render(ctx)
            .map_err(|e| LlmError::Template(format!("{name} render failed: {e}")))
    }
}
