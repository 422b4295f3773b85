//! Consensus building and decision tracking

pub mod analysis;
pub mod builder;
pub mod conflict;
pub mod decision;
pub mod opinion;

pub use analysis::{Readability, extract_topic, key_points};
pub use builder::{
    ConsensusBuilder, ConsensusDocumentation, ConsensusResult, ResolutionProcess, ResolutionStep,
    expertise_weight,
};
pub use conflict::{Conflict, ConflictKind, text_conflict};
pub use decision::{
    DecisionLog, DecisionMetadata, DecisionQuery, DecisionRationale, DecisionRecord,
    ImplementationStatus, VerificationStatus,
};
pub use opinion::{Opinion, Solution, Stance};
