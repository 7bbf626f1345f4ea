//! Agent service seam.
//!
//! An agent is a named model on the agent service with standing system
//! instructions. The pipeline only ever needs three operations: check that an
//! agent exists, send it one user message, and (re)create it.

pub mod consult;
pub mod ollama;

use async_trait::async_trait;
use thiserror::Error;

pub use consult::{consult, strip_think, Consultation};
pub use ollama::OllamaBackend;

/// Errors from the agent service
#[derive(Debug, Error)]
pub enum AgentError {
    /// The named agent does not exist on the service
    #[error("Agent not loaded: {agent}")]
    Unavailable { agent: String },

    /// The request never produced a response
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The service answered with a non-success status
    #[error("Agent service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not have the expected shape
    #[error("Malformed agent response: {0}")]
    Malformed(String),
}

/// Everything needed to (re)create an agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSpec {
    pub name: String,
    pub base_model: String,
    pub system: String,
    pub num_ctx: u32,
    pub temperature: f32,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Whether `agent` (or `agent:latest`) exists on the service.
    async fn is_available(&self, agent: &str) -> Result<bool, AgentError>;

    /// Send a single user message and return the raw reply text.
    async fn chat(&self, agent: &str, prompt: &str) -> Result<String, AgentError>;

    /// Create the agent, replacing any existing agent of the same name.
    async fn provision(&self, spec: &AgentSpec) -> Result<(), AgentError>;
}
