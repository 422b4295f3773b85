//! Phase results, execution history and the cycle report

use chrono::{DateTime, Utc};
use edrr_domain::{
    Assignment, DialecticalSequence, PeerReviewOutcome, Phase, Reassignment, RoleHistoryEntry,
    Subtask, Task, VotingResult,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A non-fatal failure of an external collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorFailure {
    /// `memory.retrieve`, `memory.store`, `peer_review`, `code_analyzer`, ...
    pub collaborator: String,
    pub message: String,
}

impl CollaboratorFailure {
    pub fn new(collaborator: impl Into<String>, message: impl ToString) -> Self {
        Self {
            collaborator: collaborator.into(),
            message: message.to_string(),
        }
    }
}

/// Outcome of executing one phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseResult {
    pub phase: Phase,
    pub primus: Option<String>,
    /// Operation name → operation output, in execution order
    pub outputs: Map<String, Value>,
    /// Earlier phases' stored results, grouped by phase
    pub prior_results: Vec<Value>,
    pub errors: Vec<CollaboratorFailure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_review: Option<PeerReviewOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    pub needs_more_work: bool,
    pub revision_cycles: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_id: Option<String>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Completed,
    Failed,
}

/// One attempt to execute a phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub phase: Phase,
    pub primus: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseMetrics {
    pub duration_ms: u64,
    pub operations: usize,
    pub errors: usize,
    pub revision_cycles: u32,
}

/// Reasoning steps grouped by the phase they were recorded under
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DialecticalRecordSet {
    pub expand: Vec<DialecticalSequence>,
    pub differentiate: Vec<DialecticalSequence>,
    /// REFINE and RETROSPECT steps
    pub refine: Vec<DialecticalSequence>,
}

impl DialecticalRecordSet {
    pub fn len(&self) -> usize {
        self.expand.len() + self.differentiate.len() + self.refine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A nested cycle started from this one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicroCycle {
    pub cycle_id: String,
    pub parent_phase: Phase,
    pub task_id: String,
    pub depth: u32,
}

/// Everything known about a cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_cycle_id: Option<String>,
    pub depth: u32,
    pub task: Task,
    pub current_phase: Phase,
    pub phase_results: BTreeMap<Phase, PhaseResult>,
    /// Non-fatal failures from every phase and from the cycle itself
    pub errors: Vec<CollaboratorFailure>,
    pub execution_history: Vec<ExecutionRecord>,
    pub metrics: BTreeMap<Phase, PhaseMetrics>,
    pub role_history: Vec<RoleHistoryEntry>,
    pub dialectical_records: DialecticalRecordSet,
    pub votes: Vec<VotingResult>,
    pub subtasks: Vec<Subtask>,
    pub assignments: Vec<Assignment>,
    pub reassignments: Vec<Reassignment>,
    pub micro_cycles: Vec<MicroCycle>,
    pub started_at: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
}

impl CycleReport {
    pub fn is_complete(&self) -> bool {
        self.phase_results.contains_key(&Phase::Retrospect)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
