//! Delegation configuration from TOML (`[delegation]` section)

use edrr_domain::config::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};

/// ```toml
/// [delegation]
/// stalled_threshold = 0.3   # progress below this counts as stalled
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDelegationConfig {
    pub stalled_threshold: f64,
}

impl Default for FileDelegationConfig {
    fn default() -> Self {
        Self {
            stalled_threshold: 0.3,
        }
    }
}

impl FileDelegationConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        if (0.0..=1.0).contains(&self.stalled_threshold) {
            return vec![];
        }
        vec![ConfigIssue::warning(
            ConfigIssueCode::InvalidConstraint {
                field: "delegation.stalled_threshold".to_string(),
            },
            format!(
                "delegation.stalled_threshold: {} is outside 0.0..=1.0",
                self.stalled_threshold
            ),
        )]
    }
}
