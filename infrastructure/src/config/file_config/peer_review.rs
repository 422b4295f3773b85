//! Peer review configuration from TOML (`[peer_review]` section)

use edrr_application::PeerReviewSettings;
use edrr_domain::Phase;
use edrr_domain::config::{ConfigIssue, ConfigIssueCode, Severity};
use serde::{Deserialize, Serialize};

/// Raw peer review configuration
///
/// # Example
///
/// ```toml
/// [peer_review]
/// enabled = true
/// phases = ["refine"]
/// quality_threshold = 0.7
/// max_revision_cycles = 2
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePeerReviewConfig {
    pub enabled: bool,
    /// Phases whose results are reviewed
    pub phases: Vec<String>,
    pub quality_threshold: f64,
    pub max_revision_cycles: u32,
}

impl Default for FilePeerReviewConfig {
    fn default() -> Self {
        let settings = PeerReviewSettings::default();
        Self {
            enabled: settings.enabled,
            phases: settings
                .phases
                .iter()
                .map(|p| p.as_str().to_lowercase())
                .collect(),
            quality_threshold: settings.quality_threshold,
            max_revision_cycles: settings.max_revision_cycles,
        }
    }
}

impl FilePeerReviewConfig {
    /// Parse phase names; unknown names are skipped with a warning
    pub fn parse_phases(&self) -> (Vec<Phase>, Vec<ConfigIssue>) {
        let mut phases = Vec::new();
        let mut issues = Vec::new();
        for name in &self.phases {
            match name.parse::<Phase>() {
                Ok(phase) if !phases.contains(&phase) => phases.push(phase),
                Ok(_) => {}
                Err(_) => issues.push(ConfigIssue {
                    severity: Severity::Warning,
                    code: ConfigIssueCode::InvalidEnumValue {
                        field: "peer_review.phases".to_string(),
                        value: name.clone(),
                        valid_values: Phase::ALL
                            .iter()
                            .map(|p| p.as_str().to_lowercase())
                            .collect(),
                    },
                    message: format!("peer_review.phases: unknown phase '{}' skipped", name),
                }),
            }
        }
        (phases, issues)
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.parse_phases().1;
        if !(0.0..=1.0).contains(&self.quality_threshold) {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::InvalidConstraint {
                    field: "peer_review.quality_threshold".to_string(),
                },
                format!(
                    "peer_review.quality_threshold: {} is outside 0.0..=1.0",
                    self.quality_threshold
                ),
            ));
        }
        issues
    }

    pub fn to_settings(&self) -> PeerReviewSettings {
        PeerReviewSettings {
            enabled: self.enabled,
            phases: self.parse_phases().0,
            quality_threshold: self.quality_threshold,
            max_revision_cycles: self.max_revision_cycles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_review_default_matches_settings() {
        let config = FilePeerReviewConfig::default();
        assert_eq!(config.phases, vec!["refine".to_string()]);
        assert_eq!(config.to_settings(), PeerReviewSettings::default());
    }

    #[test]
    fn test_peer_review_phases_parse() {
        let config = FilePeerReviewConfig {
            enabled: true,
            phases: vec![
                "Expand".to_string(),
                "REFINE".to_string(),
                "review".to_string(),
            ],
            ..Default::default()
        };
        let (phases, issues) = config.parse_phases();
        assert_eq!(phases, vec![Phase::Expand, Phase::Refine]);
        assert_eq!(issues.len(), 1);
        assert!(config.to_settings().applies_to(Phase::Expand));
    }
}
