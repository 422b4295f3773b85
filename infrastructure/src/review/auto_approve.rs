//! Peer review that approves everything it is shown

use async_trait::async_trait;
use edrr_application::ports::memory::MemoryPort;
use edrr_application::ports::peer_review::{PeerReviewError, PeerReviewPort};
use edrr_domain::{PeerReviewOutcome, WorkProduct};
use serde_json::json;
use tracing::{debug, warn};

/// Approves every work product with a fixed quality score
///
/// The review itself is stored in memory under the reviewed phase, so later
/// phases of the same cycle see it in their prior results.
pub struct AutoApprovePeerReview {
    quality_score: f64,
}

impl AutoApprovePeerReview {
    pub fn new(quality_score: f64) -> Self {
        Self {
            quality_score: quality_score.clamp(0.0, 1.0),
        }
    }
}

impl Default for AutoApprovePeerReview {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[async_trait]
impl PeerReviewPort for AutoApprovePeerReview {
    async fn run_peer_review(
        &self,
        work_product: &WorkProduct,
        memory: &dyn MemoryPort,
        _max_revision_cycles: u32,
    ) -> Result<PeerReviewOutcome, PeerReviewError> {
        let review_id = format!("review-{}", uuid::Uuid::new_v4());
        let outcome = PeerReviewOutcome::approved(review_id.clone(), self.quality_score);
        debug!("Auto-approved {} of {}", work_product.phase, work_product.cycle_id);

        let stored = memory
            .store_with_edrr_phase(
                json!({
                    "review_id": review_id,
                    "status": outcome.status,
                    "quality_score": outcome.quality_score,
                }),
                work_product.phase,
                json!({"type": "peer_review", "cycle_id": work_product.cycle_id}),
            )
            .await;
        if let Err(e) = stored {
            warn!("Failed to store review {}: {}", review_id, e);
        }
        Ok(outcome)
    }
}
