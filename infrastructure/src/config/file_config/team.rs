//! Team members from TOML (`[[team.agents]]` entries)

use edrr_domain::config::{ConfigIssue, ConfigIssueCode, Severity};
use edrr_domain::{Agent, Stance};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Raw team configuration
///
/// # Example
///
/// ```toml
/// [[team.agents]]
/// name = "explorer"
/// expertise = ["brainstorming", "creativity"]
/// experience_level = 6
/// stance = "favor"          # how strongly the agent backs its preferred option
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTeamConfig {
    pub agents: Vec<FileTeamAgent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTeamAgent {
    pub name: String,
    pub expertise: Vec<String>,
    pub experience_level: u32,
    pub stance: Option<String>,
}

impl FileTeamAgent {
    pub fn to_agent(&self) -> Agent {
        Agent::new(self.name.trim())
            .with_expertise(&self.expertise)
            .with_experience(self.experience_level)
    }

    /// Parse the stance, falling back to favor
    pub fn parse_stance(&self, index: usize) -> (Stance, Vec<ConfigIssue>) {
        let Some(raw) = &self.stance else {
            return (Stance::Favor, vec![]);
        };
        match raw.parse::<Stance>() {
            Ok(stance) => (stance, vec![]),
            Err(_) => {
                let issue = ConfigIssue {
                    severity: Severity::Warning,
                    code: ConfigIssueCode::InvalidEnumValue {
                        field: format!("team.agents[{}].stance", index),
                        value: raw.clone(),
                        valid_values: [
                            Stance::StronglyFavor,
                            Stance::Favor,
                            Stance::Neutral,
                            Stance::Oppose,
                            Stance::StronglyOppose,
                        ]
                        .iter()
                        .map(|s| s.as_str().to_string())
                        .collect(),
                    },
                    message: format!(
                        "team.agents[{}].stance: unknown value '{}', falling back to 'favor'",
                        index, raw
                    ),
                };
                (Stance::Favor, vec![issue])
            }
        }
    }
}

impl FileTeamConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let mut seen = BTreeSet::new();
        for (index, entry) in self.agents.iter().enumerate() {
            let name = entry.name.trim();
            if name.is_empty() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::EmptyAgentName { index },
                    format!("team.agents[{}]: name must not be empty", index),
                ));
            } else if !seen.insert(name.to_string()) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::DuplicateAgent {
                        name: name.to_string(),
                    },
                    format!("team.agents: '{}' is listed more than once", name),
                ));
            }
            if entry.expertise.is_empty() {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::InvalidConstraint {
                        field: format!("team.agents[{}].expertise", index),
                    },
                    format!(
                        "team.agents[{}]: '{}' has no expertise and will only lead by fallback",
                        index, name
                    ),
                ));
            }
            issues.extend(entry.parse_stance(index).1);
        }
        issues
    }
}
