//! Peer review port
//!
//! Scoring logic lives outside the engine. The coordinator only hands over a
//! [`WorkProduct`] and reacts to the returned [`PeerReviewOutcome`].

use super::memory::MemoryPort;
use async_trait::async_trait;
use edrr_domain::{PeerReviewOutcome, WorkProduct};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum PeerReviewError {
    #[error("No reviewers available")]
    NoReviewers,

    #[error("Review failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait PeerReviewPort: Send + Sync {
    async fn run_peer_review(
        &self,
        work_product: &WorkProduct,
        memory: &dyn MemoryPort,
        max_revision_cycles: u32,
    ) -> Result<PeerReviewOutcome, PeerReviewError>;
}
