//! Peer review outcomes and work products

use crate::edrr::Phase;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Share of the current quality kept when blending in a review score
pub const CURRENT_QUALITY_WEIGHT: f64 = 0.7;
pub const REVIEW_QUALITY_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    RevisionRequested,
    RevisionSuggested,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::RevisionRequested => "revision_requested",
            ReviewStatus::RevisionSuggested => "revision_suggested",
            ReviewStatus::Rejected => "rejected",
        }
    }

    pub fn is_approved(&self) -> bool {
        *self == ReviewStatus::Approved
    }

    /// Whether reviewers asked for further changes
    pub fn needs_more_work(&self) -> bool {
        matches!(
            self,
            ReviewStatus::RevisionRequested | ReviewStatus::RevisionSuggested
        )
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a peer review round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerReviewOutcome {
    pub review_id: String,
    pub status: ReviewStatus,
    pub quality_score: f64,
    #[serde(default)]
    pub feedback: Vec<String>,
    #[serde(default)]
    pub all_criteria_passed: bool,
}

impl PeerReviewOutcome {
    pub fn approved(review_id: impl Into<String>, quality_score: f64) -> Self {
        Self {
            review_id: review_id.into(),
            status: ReviewStatus::Approved,
            quality_score,
            feedback: Vec::new(),
            all_criteria_passed: true,
        }
    }

    pub fn revision_requested(
        review_id: impl Into<String>,
        quality_score: f64,
        feedback: Vec<String>,
    ) -> Self {
        Self {
            review_id: review_id.into(),
            status: ReviewStatus::RevisionRequested,
            quality_score,
            feedback,
            all_criteria_passed: false,
        }
    }
}

/// What is handed to reviewers after a phase runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkProduct {
    pub phase: Phase,
    pub results: Value,
    pub description: String,
    pub cycle_id: String,
}

/// `0.7 × current + 0.3 × review`
pub fn blend_quality(current: f64, review: f64) -> f64 {
    CURRENT_QUALITY_WEIGHT * current + REVIEW_QUALITY_WEIGHT * review
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_more_work() {
        assert!(ReviewStatus::RevisionRequested.needs_more_work());
        assert!(ReviewStatus::RevisionSuggested.needs_more_work());
        assert!(!ReviewStatus::Approved.needs_more_work());
        assert!(!ReviewStatus::Rejected.needs_more_work());
    }

    #[test]
    fn test_blend_quality() {
        assert!((blend_quality(1.0, 0.0) - 0.7).abs() < 1e-9);
        assert!((blend_quality(0.5, 1.0) - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_status_serde() {
        let outcome: PeerReviewOutcome = serde_json::from_value(serde_json::json!({
            "review_id": "r1",
            "status": "revision_suggested",
            "quality_score": 0.4,
        }))
        .unwrap();
        assert_eq!(outcome.status, ReviewStatus::RevisionSuggested);
        assert!(outcome.feedback.is_empty());
    }
}
