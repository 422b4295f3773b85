//! Vote tallying

use super::method::AbstentionPolicy;
use super::weight::VoteWeigher;
use crate::agent::TeamRoster;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scores closer than this are treated as equal
pub const TIE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub agent_id: String,
    pub option_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteWeight {
    pub agent_id: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abstention {
    pub agent_id: String,
    pub reason: String,
}

/// What one agent handed in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ballot {
    Cast {
        agent_id: String,
        option_id: String,
        reasoning: Option<String>,
    },
    Abstained {
        agent_id: String,
        reason: String,
    },
}

impl Ballot {
    pub fn cast(agent_id: impl Into<String>, option_id: impl Into<String>) -> Self {
        Ballot::Cast {
            agent_id: agent_id.into(),
            option_id: option_id.into(),
            reasoning: None,
        }
    }

    pub fn abstain(agent_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Ballot::Abstained {
            agent_id: agent_id.into(),
            reason: reason.into(),
        }
    }

    pub fn agent_id(&self) -> &str {
        match self {
            Ballot::Cast { agent_id, .. } | Ballot::Abstained { agent_id, .. } => agent_id,
        }
    }
}

/// Weighted count of a set of ballots
///
/// Ballots for options that are not on the ballot paper become abstentions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tally {
    /// Option ids in ballot order
    pub options: Vec<String>,
    pub votes: Vec<Vote>,
    pub vote_weights: Vec<VoteWeight>,
    pub option_scores: BTreeMap<String, f64>,
    pub vote_counts: BTreeMap<String, usize>,
    pub abstentions: Vec<Abstention>,
    pub reasoning: BTreeMap<String, String>,
    /// Agents counted as taking part, per the abstention policy
    pub participants: usize,
    pub team_size: usize,
}

impl Tally {
    pub fn compute(
        roster: &TeamRoster,
        options: &[String],
        ballots: impl IntoIterator<Item = Ballot>,
        weigher: &dyn VoteWeigher,
        domain: Option<&str>,
        policy: AbstentionPolicy,
    ) -> Self {
        let mut tally = Tally {
            options: options.to_vec(),
            option_scores: options.iter().map(|o| (o.clone(), 0.0)).collect(),
            vote_counts: options.iter().map(|o| (o.clone(), 0)).collect(),
            team_size: roster.len(),
            ..Default::default()
        };

        for ballot in ballots {
            match ballot {
                Ballot::Cast {
                    agent_id,
                    option_id,
                    reasoning,
                } if tally.option_scores.contains_key(&option_id) => {
                    let weight = roster
                        .get(&agent_id)
                        .map(|agent| weigher.weight(agent, domain))
                        .unwrap_or(1.0);

                    if let Some(score) = tally.option_scores.get_mut(&option_id) {
                        *score += weight;
                    }
                    if let Some(count) = tally.vote_counts.get_mut(&option_id) {
                        *count += 1;
                    }
                    if let Some(reasoning) = reasoning {
                        tally.reasoning.insert(agent_id.clone(), reasoning);
                    }
                    tally.vote_weights.push(VoteWeight {
                        agent_id: agent_id.clone(),
                        weight,
                    });
                    tally.votes.push(Vote {
                        agent_id,
                        option_id,
                    });
                }
                Ballot::Cast {
                    agent_id, option_id, ..
                } => tally.abstain(
                    agent_id,
                    format!("voted for unknown option '{}'", option_id),
                    policy,
                ),
                Ballot::Abstained { agent_id, reason } => tally.abstain(agent_id, reason, policy),
            }
        }

        tally.participants = match policy {
            AbstentionPolicy::Exclude => tally.votes.len(),
            AbstentionPolicy::ZeroWeight => tally.votes.len() + tally.abstentions.len(),
        };
        tally
    }

    fn abstain(&mut self, agent_id: String, reason: String, policy: AbstentionPolicy) {
        if policy == AbstentionPolicy::ZeroWeight {
            self.vote_weights.push(VoteWeight {
                agent_id: agent_id.clone(),
                weight: 0.0,
            });
        }
        self.abstentions.push(Abstention { agent_id, reason });
    }

    pub fn top_score(&self) -> f64 {
        self.option_scores.values().copied().fold(0.0, f64::max)
    }

    /// Options sharing the top score, in ballot order
    ///
    /// With no valid votes every option is a leader.
    pub fn leaders(&self) -> Vec<String> {
        let top = self.top_score();
        self.options
            .iter()
            .filter(|o| {
                self.option_scores
                    .get(*o)
                    .is_some_and(|s| (top - s).abs() <= TIE_EPSILON)
            })
            .cloned()
            .collect()
    }

    pub fn is_tie(&self) -> bool {
        self.leaders().len() > 1
    }

    /// Option the agent voted for, if any
    pub fn vote_of(&self, agent_id: &str) -> Option<&str> {
        self.votes
            .iter()
            .find(|v| v.agent_id == agent_id)
            .map(|v| v.option_id.as_str())
    }

    pub fn weight_of(&self, agent_id: &str) -> f64 {
        self.vote_weights
            .iter()
            .find(|w| w.agent_id == agent_id)
            .map(|w| w.weight)
            .unwrap_or(0.0)
    }

    /// Agents who voted for `option_id`
    pub fn supporters<'a>(&'a self, option_id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.votes
            .iter()
            .filter(move |v| v.option_id == option_id)
            .map(|v| v.agent_id.as_str())
    }

    /// Participants divided by team size
    pub fn turnout(&self) -> f64 {
        if self.team_size == 0 {
            0.0
        } else {
            self.participants as f64 / self.team_size as f64
        }
    }

    /// Votes for the most-voted option divided by participants
    pub fn winning_share(&self) -> f64 {
        let top = self.vote_counts.values().copied().max().unwrap_or(0);
        if self.participants == 0 {
            0.0
        } else {
            top as f64 / self.participants as f64
        }
    }
}
