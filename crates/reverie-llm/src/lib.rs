//! Provider side of the Reverie decision pipeline.
//!
//! Speaks the wire protocols of three provider families
//! (OpenAI-compatible, a distinct-schema hosted provider, and local
//! inference), routes every outbound request through one globally
//! rate-gated [`RequestRouter`], renders prompts with `minijinja`, and
//! recovers structured [`Decision`]s from the loosely structured text
//! the providers return.
//!
//! The request and response bodies are assembled and scanned by a
//! deliberately minimal hand-rolled codec ([`codec`]) rather than a JSON
//! library; see that module for the tradeoff.
//!
//! [`Decision`]: reverie_types::Decision

pub mod codec;
mod config;
mod error;
mod extract;
mod prompt;
mod provider;
mod router;

pub use config::{ProviderConfig, ProviderKind};
pub use error::LlmError;
pub use extract::extract_decision;
pub use prompt::{PromptContext, PromptEngine, RenderedPrompt};
pub use provider::{ProviderClient, ProviderResponse};
pub use router::{RequestRouter, RouterOptions};
