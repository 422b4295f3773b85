//! Sections of `edrr.toml` as written on disk
//!
//! Enum-valued fields stay strings here and are parsed into domain types,
//! with every parse failure reported as a [`ConfigIssue`].

mod delegation;
mod edrr;
mod logging;
mod peer_review;
mod reasoning;
mod team;
mod voting;

pub use delegation::FileDelegationConfig;
pub use edrr::FileEdrrConfig;
pub use logging::FileLoggingConfig;
pub use peer_review::FilePeerReviewConfig;
pub use reasoning::FileReasoningConfig;
pub use team::{FileTeamAgent, FileTeamConfig};
pub use voting::FileVotingConfig;

use edrr_application::CoordinatorConfig;
use edrr_domain::config::ConfigIssue;
use serde::{Deserialize, Serialize};

/// Every section of the config file, each defaulted when absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Cycle control and recursion limits
    pub edrr: FileEdrrConfig,
    pub voting: FileVotingConfig,
    pub peer_review: FilePeerReviewConfig,
    /// Dialectical reasoning loop
    pub reasoning: FileReasoningConfig,
    pub delegation: FileDelegationConfig,
    /// Team members; empty means the built-in team
    pub team: FileTeamConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Unknown enum values are warnings and fall back to defaults.
    /// Non-positive coefficients and broken team entries are errors.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.edrr.validate());
        issues.extend(self.voting.validate());
        issues.extend(self.peer_review.validate());
        issues.extend(self.reasoning.validate());
        issues.extend(self.delegation.validate());
        issues.extend(self.team.validate());
        issues
    }

    pub fn has_errors(&self) -> bool {
        self.validate().iter().any(ConfigIssue::is_error)
    }

    /// Convert to the application's coordinator configuration
    pub fn to_coordinator_config(&self) -> CoordinatorConfig {
        let mut config = CoordinatorConfig::default()
            .with_auto_progress(self.edrr.auto_progress)
            .with_max_recursion_depth(self.edrr.max_recursion_depth)
            .with_granularity_threshold(self.edrr.granularity_threshold)
            .with_stalled_threshold(self.delegation.stalled_threshold)
            .with_peer_review(self.peer_review.to_settings())
            .with_voting(self.voting.to_voting_params())
            .with_reasoning(self.reasoning.to_params());
        config.max_cost_benefit_ratio = self.edrr.max_cost_benefit_ratio;
        config.recursion_quality_threshold = self.edrr.quality_threshold;
        config.resource_limit = self.edrr.resource_limit;
        config
    }
}
