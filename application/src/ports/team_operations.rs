//! Team operations port
//!
//! Each EDRR phase is carried out as an ordered [`OperationSet`]. The table in
//! [`OperationSet::for_phase`] is the only place that maps phases to work.

use super::agent::AgentError;
use async_trait::async_trait;
use edrr_domain::{Phase, Task};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A unit of team work performed during a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    GenerateDiverseIdeas,
    EvaluateOptions,
    SelectBestOption,
    ElaborateDetails,
    CreateImplementationPlan,
    OptimizeImplementation,
    PerformQualityAssurance,
    ExtractLearnings,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::GenerateDiverseIdeas => "generate_diverse_ideas",
            Operation::EvaluateOptions => "evaluate_options",
            Operation::SelectBestOption => "select_best_option",
            Operation::ElaborateDetails => "elaborate_details",
            Operation::CreateImplementationPlan => "create_implementation_plan",
            Operation::OptimizeImplementation => "optimize_implementation",
            Operation::PerformQualityAssurance => "perform_quality_assurance",
            Operation::ExtractLearnings => "extract_learnings",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered operations for one phase; the first is the primary operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSet {
    pub phase: Phase,
    pub operations: &'static [Operation],
}

const EXPAND_OPERATIONS: &[Operation] = &[Operation::GenerateDiverseIdeas];
const DIFFERENTIATE_OPERATIONS: &[Operation] = &[
    Operation::EvaluateOptions,
    Operation::SelectBestOption,
];
const REFINE_OPERATIONS: &[Operation] = &[
    Operation::ElaborateDetails,
    Operation::CreateImplementationPlan,
    Operation::OptimizeImplementation,
    Operation::PerformQualityAssurance,
];
const RETROSPECT_OPERATIONS: &[Operation] = &[Operation::ExtractLearnings];

impl OperationSet {
    pub fn for_phase(phase: Phase) -> Self {
        let operations = match phase {
            Phase::Expand => EXPAND_OPERATIONS,
            Phase::Differentiate => DIFFERENTIATE_OPERATIONS,
            Phase::Refine => REFINE_OPERATIONS,
            Phase::Retrospect => RETROSPECT_OPERATIONS,
        };
        Self { phase, operations }
    }

    pub fn primary(&self) -> Operation {
        self.operations[0]
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Everything an operation may look at
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub task: Task,
    pub phase: Phase,
    pub cycle_id: String,
    /// Agent leading the phase
    pub primus: Option<String>,
    /// Stored results of the earlier phases of this cycle, one
    /// `{"phase", "results"}` entry per phase in cycle order
    pub prior_results: Vec<Value>,
    /// Outputs of the operations already run in this phase, keyed by operation name
    pub previous: Map<String, Value>,
    /// Peer review revision number, 0 for the first pass
    pub revision: u32,
    /// Reviewer feedback driving a revision
    pub feedback: Vec<String>,
}

impl OperationContext {
    /// JSON request sent to the agent performing `operation`
    pub fn to_request(&self, operation: Operation) -> Value {
        serde_json::json!({
            "type": "operation",
            "operation": operation.as_str(),
            "phase": self.phase.as_str(),
            "cycle_id": self.cycle_id,
            "task": self.task.to_value(),
            "prior_results": self.prior_results,
            "previous": self.previous,
            "revision": self.revision,
            "feedback": self.feedback,
        })
    }
}

#[derive(Error, Debug)]
pub enum OperationError {
    #[error("Operation failed: {0}")]
    Failed(String),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("Unsupported operation: {0}")]
    Unsupported(Operation),
}

#[async_trait]
pub trait TeamOperations: Send + Sync {
    async fn run(
        &self,
        operation: Operation,
        context: &OperationContext,
    ) -> Result<Value, OperationError>;
}
