//! Domain layer for edrr-quorum
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns, and
//! nothing in it is async.
//!
//! # Core Concepts
//!
//! ## EDRR
//!
//! A cycle walks through four phases: **Expand** (generate ideas),
//! **Differentiate** (compare them), **Refine** (build the chosen one) and
//! **Retrospect** (learn from the cycle). Each phase is led by a *Primus*
//! chosen by [`RoleAssignor`]; leadership rotates so that, where expertise
//! allows, a different agent leads each phase.
//!
//! ## Decisions
//!
//! - **Voting**: expertise-weighted tallies with ordered tie-break strategies
//!   ([`voting`])
//! - **Consensus**: conflict detection and synthesis over agent opinions,
//!   with a decision log ([`consensus`])
//!
//! ## Work
//!
//! - **Delegation**: subtasks routed by expertise and rebalanced when they
//!   stall ([`TaskDelegator`])
//! - **Dialectic**: the thesis / antithesis / synthesis unit exchanged by the
//!   reasoning loop ([`DialecticalSequence`])

pub mod agent;
pub mod config;
pub mod consensus;
pub mod core;
pub mod dialectic;
pub mod edrr;
pub mod review;
pub mod task;
pub mod voting;

// Re-export commonly used types
pub use agent::{Agent, RoleHistoryEntry, TeamRoster};
pub use config::{ConfigIssue, ConfigIssueCode, Severity};
pub use consensus::{
    Conflict, ConflictKind, ConsensusBuilder, ConsensusResult, DecisionLog, DecisionQuery,
    DecisionRecord, ImplementationStatus, Opinion, Solution, Stance, VerificationStatus,
};
pub use core::error::DomainError;
pub use dialectic::{DialecticalSequence, SequenceStatus};
pub use edrr::{Phase, Role, RoleAssignor};
pub use review::{PeerReviewOutcome, ReviewStatus, WorkProduct, blend_quality};
pub use task::{
    Assignment, ContributionMetrics, Reassignment, Subtask, SubtaskStatus, Task, TaskDelegator,
    TaskKind, TaskOption, task_key,
};
pub use voting::{
    AbstentionPolicy, Ballot, ExpertiseWeigher, ResultType, SelectedOption, Tally,
    TieBreakStrategy, TieResolution, UniformWeigher, VoteWeigher, VotingHistoryEntry, VotingMethod,
    VotingResult,
};
