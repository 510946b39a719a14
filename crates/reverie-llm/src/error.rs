//! Error types for the provider side of the pipeline.
//!
//! Uses `thiserror` for typed errors that surface through the router,
//! prompt engine, and decision extractor. Rate-limit drops and extraction
//! misses are expected and frequent; callers log them at low severity.
//! Transport failures are logged at higher severity but never retried
//! automatically -- the next natural trigger is the retry mechanism.

/// Errors produced by the provider side of the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Configuration is invalid or missing (endpoint, credential, model).
    #[error("config error: {0}")]
    Config(String),

    /// The global minimum-interval gate has not yet elapsed.
    ///
    /// Raised by the router before any network contact is made.
    #[error("rate limited: next request allowed in {remaining_ms}ms")]
    RateLimited {
        /// Milliseconds until the gate opens again.
        remaining_ms: u64,
    },

    /// The network exchange failed: connection error, timeout, or a
    /// non-2xx status from the provider.
    #[error("transport error: {0}")]
    Transport(String),

    /// A prompt template failed to load or render.
    #[error("template error: {0}")]
    Template(String),

    /// No structured decision could be recovered from the generated text.
    #[error("extraction error: {0}")]
    Extraction(String),
}
