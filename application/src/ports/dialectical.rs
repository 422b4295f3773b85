//! Dialectical reasoning ports
//!
//! - [`DialecticalReasoner`]: produces one thesis / antithesis / synthesis step
//! - [`DialecticalHook`]: observers notified after every loop iteration
//! - [`PhaseRecorder`]: receives each step under the phase it belongs to

use super::agent::AgentPort;
use super::memory::MemoryPort;
use crate::team::Team;
use async_trait::async_trait;
use edrr_domain::{DialecticalSequence, Task};
use serde_json::Value;
use thiserror::Error;

/// Reasoner failures, classified for the retry policy
#[derive(Error, Debug, Clone)]
pub enum ReasonerError {
    /// Worth retrying (agent timeout, temporary unavailability)
    #[error("Transient reasoning failure: {0}")]
    Transient(String),

    #[error("Invalid reasoning payload: {0}")]
    Invalid(String),

    #[error("Task has no solution to reason about")]
    MissingSolution,
}

impl ReasonerError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ReasonerError::Transient(_))
    }
}

/// What a reasoner hands back: a typed sequence or a raw JSON mapping
#[derive(Debug, Clone)]
pub enum ReasoningOutput {
    Sequence(DialecticalSequence),
    Mapping(Value),
}

impl ReasoningOutput {
    pub fn into_sequence(self) -> Result<DialecticalSequence, ReasonerError> {
        match self {
            ReasoningOutput::Sequence(sequence) => Ok(sequence),
            ReasoningOutput::Mapping(value @ Value::Object(_)) => {
                DialecticalSequence::from_value(value)
                    .map_err(|e| ReasonerError::Invalid(e.to_string()))
            }
            ReasoningOutput::Mapping(other) => Err(ReasonerError::Invalid(format!(
                "expected a JSON object, got {}",
                other
            ))),
        }
    }
}

impl From<DialecticalSequence> for ReasoningOutput {
    fn from(sequence: DialecticalSequence) -> Self {
        ReasoningOutput::Sequence(sequence)
    }
}

#[async_trait]
pub trait DialecticalReasoner: Send + Sync {
    async fn apply_dialectical_reasoning(
        &self,
        team: &Team,
        task: &Task,
        critic: &dyn AgentPort,
        memory: Option<&dyn MemoryPort>,
    ) -> Result<ReasoningOutput, ReasonerError>;
}

/// Observer called once per reasoning iteration
///
/// `task` still carries the solution the iteration started from; `results`
/// holds the sequence the iteration just produced.
pub trait DialecticalHook: Send + Sync {
    fn on_iteration(&self, task: &Task, results: &[DialecticalSequence]);
}

impl<F> DialecticalHook for F
where
    F: Fn(&Task, &[DialecticalSequence]) + Send + Sync,
{
    fn on_iteration(&self, task: &Task, results: &[DialecticalSequence]) {
        self(task, results)
    }
}

/// Sink for reasoning results, one method per recorded phase
pub trait PhaseRecorder: Send + Sync {
    fn record_expand_results(&self, result: &DialecticalSequence);
    fn record_differentiate_results(&self, result: &DialecticalSequence);
    /// Also receives RETROSPECT results
    fn record_refine_results(&self, result: &DialecticalSequence);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mapping_parses_into_sequence() {
        let output = ReasoningOutput::Mapping(json!({
            "status": "completed",
            "phase": "refine",
            "synthesis": {"content": "done"},
        }));
        let sequence = output.into_sequence().unwrap();
        assert!(sequence.is_completed());
        assert_eq!(sequence.phase.as_deref(), Some("refine"));
    }

    #[test]
    fn test_non_object_mapping_is_invalid() {
        let err = ReasoningOutput::Mapping(json!([1, 2])).into_sequence().unwrap_err();
        assert!(!err.is_transient());
        assert!(matches!(err, ReasonerError::Invalid(_)));
    }

    #[test]
    fn test_closure_is_a_hook() {
        let calls = std::sync::atomic::AtomicUsize::new(0);
        let hook = |_: &Task, results: &[DialecticalSequence]| {
            calls.fetch_add(results.len(), std::sync::atomic::Ordering::SeqCst);
        };
        hook.on_iteration(&Task::new("t"), &[DialecticalSequence::in_progress(json!("x"))]);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
