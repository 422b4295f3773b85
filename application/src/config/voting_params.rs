//! Voting parameters for [`VotingEngine`](crate::use_cases::voting_engine::VotingEngine).

use edrr_domain::{AbstentionPolicy, TieBreakStrategy, VotingMethod};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VotingParams {
    /// Used when the task does not name a method
    pub method: VotingMethod,
    pub abstention: AbstentionPolicy,
    /// Tie-break strategies, applied in order
    pub tie_break: Vec<TieBreakStrategy>,
    pub domain_coefficient: f64,
    pub experience_coefficient: f64,
    /// Per-agent limit on answering a vote request
    pub vote_timeout: Duration,
}

impl Default for VotingParams {
    fn default() -> Self {
        Self {
            method: VotingMethod::Weighted,
            abstention: AbstentionPolicy::Exclude,
            tie_break: TieBreakStrategy::DEFAULT_ORDER.to_vec(),
            domain_coefficient: 1.0,
            experience_coefficient: 0.1,
            vote_timeout: Duration::from_secs(30),
        }
    }
}

impl VotingParams {
    // ==================== Builder Methods ====================

    pub fn with_method(mut self, method: VotingMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_abstention(mut self, abstention: AbstentionPolicy) -> Self {
        self.abstention = abstention;
        self
    }

    pub fn with_tie_break(mut self, strategies: Vec<TieBreakStrategy>) -> Self {
        self.tie_break = strategies;
        self
    }

    pub fn with_coefficients(mut self, domain: f64, experience: f64) -> Self {
        self.domain_coefficient = domain;
        self.experience_coefficient = experience;
        self
    }

    pub fn with_vote_timeout(mut self, timeout: Duration) -> Self {
        self.vote_timeout = timeout;
        self
    }
}
