//! Agent port
//!
//! Every team member is reached through [`AgentPort::process`], which takes a
//! JSON request and returns a JSON reply. Vote requests, critique requests and
//! phase operations all travel over this one call.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors an agent can report
#[derive(Error, Debug, Clone)]
pub enum AgentError {
    #[error("Agent unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// A team member that answers JSON requests
///
/// Implementations live in the infrastructure layer (scripted agents, LLM
/// backed agents, ...).
#[async_trait]
pub trait AgentPort: Send + Sync {
    /// Name matching the agent's roster entry
    fn name(&self) -> &str;

    async fn process(&self, request: &Value) -> Result<Value, AgentError>;
}
