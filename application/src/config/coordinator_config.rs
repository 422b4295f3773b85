//! Coordinator configuration.
//!
//! [`CoordinatorConfig`] groups everything an
//! [`EdrrCoordinator`](crate::use_cases::edrr_coordinator::EdrrCoordinator)
//! needs: cycle control, recursion limits, peer review, and the voting and
//! reasoning parameters it hands to its helpers.

use super::{ReasoningLoopParams, VotingParams};
use edrr_domain::Phase;
use serde::{Deserialize, Serialize};

/// When and how phase results go through peer review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerReviewSettings {
    pub enabled: bool,
    pub phases: Vec<Phase>,
    /// Minimum blended quality a reviewer is expected to accept
    pub quality_threshold: f64,
    pub max_revision_cycles: u32,
}

impl Default for PeerReviewSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            phases: vec![Phase::Refine],
            quality_threshold: 0.7,
            max_revision_cycles: 2,
        }
    }
}

impl PeerReviewSettings {
    pub fn applies_to(&self, phase: Phase) -> bool {
        self.enabled && self.phases.contains(&phase)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Run every phase from `start_cycle` without further calls
    pub auto_progress: bool,
    pub max_recursion_depth: u32,
    /// Micro cycles are refused for tasks whose granularity is below this
    pub granularity_threshold: f64,
    /// ... whose `cost_score / benefit_score` is above this
    pub max_cost_benefit_ratio: f64,
    /// ... whose `quality_score` is already above this
    pub recursion_quality_threshold: f64,
    /// ... whose `resource_usage` is above this
    pub resource_limit: f64,
    pub stalled_threshold: f64,
    pub peer_review: PeerReviewSettings,
    pub voting: VotingParams,
    pub reasoning: ReasoningLoopParams,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            auto_progress: false,
            max_recursion_depth: 3,
            granularity_threshold: 0.2,
            max_cost_benefit_ratio: 0.5,
            recursion_quality_threshold: 0.9,
            resource_limit: 0.8,
            stalled_threshold: 0.3,
            peer_review: PeerReviewSettings::default(),
            voting: VotingParams::default(),
            reasoning: ReasoningLoopParams::default(),
        }
    }
}

impl CoordinatorConfig {
    // ==================== Builder Methods ====================

    pub fn with_auto_progress(mut self, auto: bool) -> Self {
        self.auto_progress = auto;
        self
    }

    pub fn with_max_recursion_depth(mut self, depth: u32) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    pub fn with_granularity_threshold(mut self, threshold: f64) -> Self {
        self.granularity_threshold = threshold;
        self
    }

    pub fn with_stalled_threshold(mut self, threshold: f64) -> Self {
        self.stalled_threshold = threshold;
        self
    }

    pub fn with_peer_review(mut self, settings: PeerReviewSettings) -> Self {
        self.peer_review = settings;
        self
    }

    pub fn with_voting(mut self, voting: VotingParams) -> Self {
        self.voting = voting;
        self
    }

    pub fn with_reasoning(mut self, reasoning: ReasoningLoopParams) -> Self {
        self.reasoning = reasoning;
        self
    }
}
