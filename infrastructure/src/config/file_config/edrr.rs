//! Cycle control from TOML (`[edrr]` section)

use edrr_domain::config::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};

/// Raw cycle control settings
///
/// # Example
///
/// ```toml
/// [edrr]
/// auto_progress = true
/// max_recursion_depth = 3
/// granularity_threshold = 0.2
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEdrrConfig {
    /// Run every phase as soon as a cycle starts
    pub auto_progress: bool,
    pub max_recursion_depth: u32,
    /// Micro cycles are refused for tasks finer than this
    pub granularity_threshold: f64,
    pub max_cost_benefit_ratio: f64,
    /// Micro cycles are refused once a task's quality exceeds this
    pub quality_threshold: f64,
    pub resource_limit: f64,
}

impl Default for FileEdrrConfig {
    fn default() -> Self {
        Self {
            auto_progress: false,
            max_recursion_depth: 3,
            granularity_threshold: 0.2,
            max_cost_benefit_ratio: 0.5,
            quality_threshold: 0.9,
            resource_limit: 0.8,
        }
    }
}

impl FileEdrrConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let unit_fields = [
            ("edrr.granularity_threshold", self.granularity_threshold),
            ("edrr.quality_threshold", self.quality_threshold),
            ("edrr.resource_limit", self.resource_limit),
        ];
        for (field, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::InvalidConstraint {
                        field: field.to_string(),
                    },
                    format!("{}: {} is outside 0.0..=1.0", field, value),
                ));
            }
        }
        if self.max_cost_benefit_ratio <= 0.0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidConstraint {
                    field: "edrr.max_cost_benefit_ratio".to_string(),
                },
                "edrr.max_cost_benefit_ratio must be positive",
            ));
        }
        issues
    }
}
