//! Voting configuration from TOML (`[voting]` section)

use edrr_application::VotingParams;
use edrr_domain::config::{ConfigIssue, ConfigIssueCode, Severity};
use edrr_domain::{AbstentionPolicy, TieBreakStrategy, VotingMethod};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw voting configuration
///
/// # Example
///
/// ```toml
/// [voting]
/// method = "weighted"                # "weighted" or "majority"
/// abstention = "exclude"             # "exclude" or "zero_weight"
/// tie_break = ["primus_vote", "domain_expertise", "strongest_voter", "experience"]
/// domain_coefficient = 1.0
/// experience_coefficient = 0.1
/// vote_timeout_secs = 30
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileVotingConfig {
    pub method: String,
    pub abstention: String,
    /// Tie-break strategies, applied in order
    pub tie_break: Vec<String>,
    /// Weight added per matching domain expertise
    pub domain_coefficient: f64,
    /// Weight added per experience level
    pub experience_coefficient: f64,
    /// How long an agent has to answer a vote request
    pub vote_timeout_secs: f64,
}

impl Default for FileVotingConfig {
    fn default() -> Self {
        Self {
            method: "weighted".to_string(),
            abstention: "exclude".to_string(),
            tie_break: TieBreakStrategy::DEFAULT_ORDER
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            domain_coefficient: 1.0,
            experience_coefficient: 0.1,
            vote_timeout_secs: 30.0,
        }
    }
}

impl FileVotingConfig {
    /// Parse method string into VotingMethod, returning warnings on failure.
    pub fn parse_method(&self) -> (VotingMethod, Vec<ConfigIssue>) {
        match self.method.parse::<VotingMethod>() {
            Ok(method) => (method, vec![]),
            Err(_) => {
                let issue = ConfigIssue {
                    severity: Severity::Warning,
                    code: ConfigIssueCode::InvalidEnumValue {
                        field: "voting.method".to_string(),
                        value: self.method.clone(),
                        valid_values: vec!["weighted".to_string(), "majority".to_string()],
                    },
                    message: format!(
                        "voting.method: unknown value '{}', falling back to 'weighted'",
                        self.method
                    ),
                };
                (VotingMethod::default(), vec![issue])
            }
        }
    }

    pub fn parse_abstention(&self) -> (AbstentionPolicy, Vec<ConfigIssue>) {
        match self.abstention.parse::<AbstentionPolicy>() {
            Ok(policy) => (policy, vec![]),
            Err(_) => {
                let issue = ConfigIssue {
                    severity: Severity::Warning,
                    code: ConfigIssueCode::InvalidEnumValue {
                        field: "voting.abstention".to_string(),
                        value: self.abstention.clone(),
                        valid_values: vec!["exclude".to_string(), "zero_weight".to_string()],
                    },
                    message: format!(
                        "voting.abstention: unknown value '{}', falling back to 'exclude'",
                        self.abstention
                    ),
                };
                (AbstentionPolicy::default(), vec![issue])
            }
        }
    }

    /// Parse the tie-break list; unknown entries are skipped with a warning
    ///
    /// An empty result falls back to the default order.
    pub fn parse_tie_break(&self) -> (Vec<TieBreakStrategy>, Vec<ConfigIssue>) {
        let mut strategies = Vec::new();
        let mut issues = Vec::new();
        for entry in &self.tie_break {
            match entry.parse::<TieBreakStrategy>() {
                Ok(strategy) if !strategies.contains(&strategy) => strategies.push(strategy),
                Ok(_) => {}
                Err(_) => issues.push(ConfigIssue {
                    severity: Severity::Warning,
                    code: ConfigIssueCode::InvalidEnumValue {
                        field: "voting.tie_break".to_string(),
                        value: entry.clone(),
                        valid_values: [
                            TieBreakStrategy::PrimusVote,
                            TieBreakStrategy::DomainExpertise,
                            TieBreakStrategy::StrongestVoter,
                            TieBreakStrategy::Experience,
                            TieBreakStrategy::Random,
                        ]
                        .iter()
                        .map(|s| s.as_str().to_string())
                        .collect(),
                    },
                    message: format!("voting.tie_break: unknown strategy '{}' skipped", entry),
                }),
            }
        }
        if strategies.is_empty() {
            strategies = TieBreakStrategy::DEFAULT_ORDER.to_vec();
        }
        (strategies, issues)
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.parse_method().1);
        issues.extend(self.parse_abstention().1);
        issues.extend(self.parse_tie_break().1);

        let coefficients = [
            ("voting.domain_coefficient", self.domain_coefficient),
            ("voting.experience_coefficient", self.experience_coefficient),
        ];
        for (field, value) in coefficients {
            if value <= 0.0 {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::InvalidConstraint {
                        field: field.to_string(),
                    },
                    format!("{} must be positive, got {}", field, value),
                ));
            }
        }
        if self.vote_timeout_secs <= 0.0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidConstraint {
                    field: "voting.vote_timeout_secs".to_string(),
                },
                "voting.vote_timeout_secs must be positive",
            ));
        }
        issues
    }

    pub fn to_voting_params(&self) -> VotingParams {
        VotingParams::default()
            .with_method(self.parse_method().0)
            .with_abstention(self.parse_abstention().0)
            .with_tie_break(self.parse_tie_break().0)
            .with_coefficients(self.domain_coefficient, self.experience_coefficient)
            .with_vote_timeout(Duration::from_secs_f64(self.vote_timeout_secs.max(0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voting_config_default() {
        let config = FileVotingConfig::default();
        assert!(config.validate().is_empty());
        let params = config.to_voting_params();
        assert_eq!(params.method, VotingMethod::Weighted);
        assert_eq!(params.tie_break, TieBreakStrategy::DEFAULT_ORDER.to_vec());
        assert_eq!(params.vote_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_voting_config_deserialize() {
        let toml_str = r#"
[voting]
method = "majority"
abstention = "zero_weight"
tie_break = ["experience", "random"]
vote_timeout_secs = 2.5
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        let params = config.voting.to_voting_params();
        assert_eq!(params.method, VotingMethod::Majority);
        assert_eq!(params.abstention, AbstentionPolicy::ZeroWeight);
        assert_eq!(
            params.tie_break,
            vec![TieBreakStrategy::Experience, TieBreakStrategy::Random]
        );
        assert_eq!(params.vote_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_unknown_tie_break_is_skipped() {
        let config = FileVotingConfig {
            tie_break: vec!["coin_flip".to_string(), "primus".to_string()],
            ..Default::default()
        };
        let (strategies, issues) = config.parse_tie_break();
        assert_eq!(strategies, vec![TieBreakStrategy::PrimusVote]);
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error());
    }

    #[test]
    fn test_unknown_method_falls_back() {
        let config = FileVotingConfig {
            method: "ranked".to_string(),
            ..Default::default()
        };
        let (method, issues) = config.parse_method();
        assert_eq!(method, VotingMethod::Weighted);
        assert!(matches!(
            &issues[0].code,
            ConfigIssueCode::InvalidEnumValue { field, .. } if field == "voting.method"
        ));
    }

    #[test]
    fn test_non_positive_coefficient_is_an_error() {
        let config = FileVotingConfig {
            experience_coefficient: 0.0,
            ..Default::default()
        };
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_error());
    }
}
