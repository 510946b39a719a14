//! The seam between the scheduler and the provider side.
//!
//! [`AgentBrain`] talks to whatever implements [`DecisionBackend`]; in
//! production that is a [`RequestRouter`], in tests a scripted fake.
//!
//! [`AgentBrain`]: crate::brain::AgentBrain

use std::future::Future;

use reverie_llm::{LlmError, ProviderResponse, RequestRouter};

/// Turns one rendered prompt pair into a provider response.
pub trait DecisionBackend: Send + Sync + 'static {
    /// Perform a single exchange.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::RateLimited`] when a gate rejects the request
    /// before any network contact, and [`LlmError::Config`] when the
    /// backend is not usable at all. Transport failures come back inside
    /// the [`ProviderResponse`] with `success: false`.
    fn complete(
        &self,
        system: &str,
        user: &str,
    ) -> impl Future<Output = Result<ProviderResponse, LlmError>> + Send;
}

impl DecisionBackend for RequestRouter {
    fn complete(
        &self,
        system: &str,
        user: &str,
    ) -> impl Future<Output = Result<ProviderResponse, LlmError>> + Send {
        self.send(system, user)
    }
}
