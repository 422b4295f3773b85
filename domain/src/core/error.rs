//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Team has no agents")]
    EmptyTeam,

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Duplicate agent: {0}")]
    DuplicateAgent(String),

    #[error("Unknown subtask: {0}")]
    UnknownSubtask(String),

    #[error("Invalid phase: {0}")]
    InvalidPhase(String),

    #[error("Invalid task: {0}")]
    InvalidTask(String),
}

impl DomainError {
    /// Check if this error means the team cannot act at all
    pub fn is_empty_team(&self) -> bool {
        matches!(self, DomainError::EmptyTeam)
    }
}
