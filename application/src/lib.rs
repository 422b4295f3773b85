//! Application layer for edrr-quorum
//!
//! This crate contains the ports the engine talks through, the team
//! aggregate, configuration and the use cases that drive an EDRR cycle.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod rng;
pub mod team;
pub mod use_cases;

// Re-export commonly used types
pub use config::{CoordinatorConfig, PeerReviewSettings, ReasoningLoopParams, VotingParams};
pub use ports::{
    agent::{AgentError, AgentPort},
    code_analysis::{AnalysisError, AstTransformerPort, CodeAnalyzerPort, NoCodeAnalyzer},
    dialectical::{
        DialecticalHook, DialecticalReasoner, PhaseRecorder, ReasonerError, ReasoningOutput,
    },
    event_logger::{CycleEvent, EventLogger, NoEventLogger},
    memory::{MemoryError, MemoryPort, NoMemory},
    peer_review::{PeerReviewError, PeerReviewPort},
    progress::{CycleProgressNotifier, NoProgress},
    seed::Seedable,
    team_operations::{Operation, OperationContext, OperationError, OperationSet, TeamOperations},
};
pub use rng::SharedRng;
pub use team::Team;
pub use use_cases::agent_team_operations::AgentTeamOperations;
pub use use_cases::critique_reasoner::CritiqueReasoner;
pub use use_cases::edrr_coordinator::{
    CollaboratorFailure, CoordinatorError, CycleReport, DialecticalRecordSet, EdrrCoordinator,
    ExecutionStatus, MicroCycle, PhaseResult,
};
pub use use_cases::reasoning_loop::{DialecticalReasoningLoop, ReasoningLoopError};
pub use use_cases::voting_engine::{VotingEngine, VotingError};
