//! Voting outcomes

use super::method::VotingMethod;
use super::tally::{Abstention, Vote, VoteWeight};
use super::tie_break::StrategyApplication;
use crate::consensus::ConsensusResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Winner,
    Tie,
}

/// The option a vote settled on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Present when the option was chosen by breaking a tie
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tie_breaking_rationale: Option<String>,
}

/// How a tie was settled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TieResolution {
    pub tied_options: Vec<String>,
    pub strategies_applied: Vec<StrategyApplication>,
    pub winner: String,
    /// `"consensus"` when no strategy could separate the options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consensus: Option<ConsensusResult>,
}

impl TieResolution {
    /// One sentence naming every strategy that was tried
    pub fn rationale(&self) -> String {
        let mut parts: Vec<String> = self
            .strategies_applied
            .iter()
            .map(|s| format!("{} ({})", s.name, s.outcome))
            .collect();
        if let Some(fallback) = &self.fallback {
            parts.push(format!("{} fallback", fallback));
        }
        format!(
            "Tie between {} resolved in favor of {} via {}",
            self.tied_options.join(", "),
            self.winner,
            parts.join(", ")
        )
    }
}

/// Why each agent's vote weighed what it did
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpertiseAssessment {
    pub domain: Option<String>,
    pub justifications: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingResult {
    pub id: String,
    pub task_id: String,
    pub timestamp: DateTime<Utc>,
    pub method: VotingMethod,
    pub options: Vec<String>,
    pub votes: Vec<Vote>,
    pub vote_weights: Vec<VoteWeight>,
    pub option_scores: BTreeMap<String, f64>,
    pub vote_counts: BTreeMap<String, usize>,
    pub abstentions: Vec<Abstention>,
    pub reasoning: BTreeMap<String, String>,
    pub expertise_assessment: ExpertiseAssessment,
    pub participants: usize,
    pub turnout: f64,
    pub result_type: ResultType,
    pub selected_option: SelectedOption,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tie_resolution: Option<TieResolution>,
    pub explanation: String,
}

impl VotingResult {
    pub fn is_tie(&self) -> bool {
        self.result_type == ResultType::Tie
    }

    pub fn winner(&self) -> &str {
        &self.selected_option.id
    }
}

/// One entry of a team's voting history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingHistoryEntry {
    pub task_id: String,
    pub result: VotingResult,
    pub timestamp: DateTime<Utc>,
    pub task_context: Value,
}

/// Condensed result of a plain consensus vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleVoteOutcome {
    /// `"decided"` or `"tie_resolved"`
    pub status: String,
    pub decision: String,
    pub explanation: String,
    pub vote_counts: BTreeMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rationale_names_every_strategy() {
        let resolution = TieResolution {
            tied_options: vec!["a".into(), "b".into()],
            strategies_applied: vec![
                StrategyApplication {
                    name: "primus_vote".into(),
                    description: String::new(),
                    outcome: "no change".into(),
                    remaining: vec!["a".into(), "b".into()],
                },
                StrategyApplication {
                    name: "experience".into(),
                    description: String::new(),
                    outcome: "selected b".into(),
                    remaining: vec!["b".into()],
                },
            ],
            winner: "b".into(),
            fallback: None,
            consensus: None,
        };

        let rationale = resolution.rationale();
        assert!(rationale.contains("primus_vote"));
        assert!(rationale.contains("experience (selected b)"));
        assert!(rationale.contains("in favor of b"));
    }

    #[test]
    fn test_result_type_serde() {
        assert_eq!(serde_json::to_string(&ResultType::Tie).unwrap(), "\"tie\"");
    }
}
