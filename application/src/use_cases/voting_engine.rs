//! Voting on critical decisions
//!
//! The engine fans a vote request out to every agent port, turns the replies
//! into ballots and hands them to the pure [`Tally`]. Ties are narrowed by the
//! configured strategies and, when none of them settles it, by building
//! consensus over the tied options.

use crate::config::VotingParams;
use crate::ports::agent::AgentError;
use crate::ports::event_logger::{CycleEvent, EventLogger, NoEventLogger};
use crate::team::Team;
use edrr_domain::consensus::DecisionRationale;
use edrr_domain::voting::{
    ExpertiseAssessment, SimpleVoteOutcome, StrategyApplication, TieContext,
};
use edrr_domain::{
    Ballot, DecisionRecord, ExpertiseWeigher, ResultType, SelectedOption, Stance, Tally, Task,
    TieBreakStrategy, TieResolution, UniformWeigher, VoteWeigher, VotingHistoryEntry,
    VotingMethod, VotingResult, task_key,
};
use futures::future::join_all;
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VotingError {
    #[error("No agents available to vote")]
    NoAgents,

    #[error("Task has no options to vote on")]
    NoOptions,
}

#[derive(Clone)]
pub struct VotingEngine {
    params: VotingParams,
    weigher: Arc<dyn VoteWeigher>,
    events: Arc<dyn EventLogger>,
}

impl VotingEngine {
    pub fn new(params: VotingParams) -> Self {
        let weigher =
            ExpertiseWeigher::new(params.domain_coefficient, params.experience_coefficient);
        Self {
            params,
            weigher: Arc::new(weigher),
            events: Arc::new(NoEventLogger),
        }
    }

    /// Replace the weigher used for weighted votes
    pub fn with_weigher(mut self, weigher: Arc<dyn VoteWeigher>) -> Self {
        self.weigher = weigher;
        self
    }

    pub fn with_event_logger(mut self, events: Arc<dyn EventLogger>) -> Self {
        self.events = events;
        self
    }

    pub fn params(&self) -> &VotingParams {
        &self.params
    }

    /// Run a vote on the task's options
    ///
    /// Always produces a selected option. The result is appended to the
    /// team's voting history and tracked as a decision.
    pub async fn vote_on_critical_decision(
        &self,
        team: &mut Team,
        task: &Task,
    ) -> Result<VotingResult, VotingError> {
        let method = task.voting_method.unwrap_or(self.params.method);
        self.vote(team, task, method, &self.params.tie_break).await
    }

    /// Majority vote with the default tie-break order, summarized
    pub async fn consensus_vote(
        &self,
        team: &mut Team,
        task: &Task,
    ) -> Result<SimpleVoteOutcome, VotingError> {
        let result = self
            .vote(team, task, VotingMethod::Majority, &TieBreakStrategy::DEFAULT_ORDER)
            .await?;

        let status = match result.result_type {
            ResultType::Winner => "decided",
            ResultType::Tie => "tie_resolved",
        };
        Ok(SimpleVoteOutcome {
            status: status.to_string(),
            decision: result.winner().to_string(),
            explanation: result.explanation,
            vote_counts: result.vote_counts,
        })
    }

    async fn vote(
        &self,
        team: &mut Team,
        task: &Task,
        method: VotingMethod,
        strategies: &[TieBreakStrategy],
    ) -> Result<VotingResult, VotingError> {
        if team.is_empty() {
            return Err(VotingError::NoAgents);
        }
        if task.options.is_empty() {
            return Err(VotingError::NoOptions);
        }

        let key = task_key(task);
        let options = task.option_ids();
        info!(
            "Voting on '{}' ({} options, {} agents, {})",
            task.label(),
            options.len(),
            team.len(),
            method
        );

        let ballots = self.collect_ballots(team, task, &options).await;

        let uniform = UniformWeigher;
        let weigher: &dyn VoteWeigher = match method {
            VotingMethod::Majority => &uniform,
            VotingMethod::Weighted => self.weigher.as_ref(),
        };
        let domain = task.domain.as_deref();
        let tally = Tally::compute(
            team.roster(),
            &options,
            ballots,
            weigher,
            domain,
            self.params.abstention,
        );
        for abstention in &tally.abstentions {
            debug!("{} abstained: {}", abstention.agent_id, abstention.reason);
        }

        let justifications = tally
            .votes
            .iter()
            .filter_map(|vote| team.roster().get(&vote.agent_id))
            .map(|agent| (agent.name.clone(), weigher.justification(agent, domain)))
            .collect();
        let expertise_assessment = ExpertiseAssessment {
            domain: task.domain.clone(),
            justifications,
        };

        let leaders = tally.leaders();
        let (result_type, winner, tie_resolution) = if leaders.len() == 1 {
            (ResultType::Winner, leaders[0].clone(), None)
        } else {
            let resolution = self.break_tie(team, task, &tally, leaders, strategies);
            (ResultType::Tie, resolution.winner.clone(), Some(resolution))
        };

        let selected_option = selected_option(task, &winner, tie_resolution.as_ref());
        let explanation = match &tie_resolution {
            None => format!(
                "{} won with {:.2} of {:.2} total weight ({} of {} participants)",
                selected_option.name,
                tally.option_scores.get(&winner).copied().unwrap_or(0.0),
                tally.option_scores.values().sum::<f64>(),
                tally.vote_counts.get(&winner).copied().unwrap_or(0),
                tally.participants
            ),
            Some(resolution) => resolution.rationale(),
        };

        let result = VotingResult {
            id: uuid::Uuid::new_v4().to_string(),
            task_id: key.clone(),
            timestamp: chrono::Utc::now(),
            method,
            options,
            votes: tally.votes.clone(),
            vote_weights: tally.vote_weights.clone(),
            option_scores: tally.option_scores.clone(),
            vote_counts: tally.vote_counts.clone(),
            abstentions: tally.abstentions.clone(),
            reasoning: tally.reasoning.clone(),
            expertise_assessment,
            participants: tally.participants,
            turnout: tally.turnout(),
            result_type,
            selected_option,
            tie_resolution,
            explanation,
        };

        self.track_decision(team, task, &key, &result);
        team.record_vote(VotingHistoryEntry {
            task_id: key.clone(),
            result: result.clone(),
            timestamp: result.timestamp,
            task_context: json!({
                "description": task.description,
                "domain": task.domain,
                "criticality": task.criticality,
                "options": task.option_ids(),
            }),
        });

        info!("Vote on '{}' selected {}", task.label(), result.winner());
        self.events.log(CycleEvent::new(
            "vote_completed",
            json!({
                "task_id": key,
                "method": method.as_str(),
                "result_type": result.result_type,
                "winner": result.winner(),
                "turnout": result.turnout,
                "abstentions": result.abstentions.len(),
            }),
        ));

        Ok(result)
    }

    /// Ask every agent for a vote concurrently
    ///
    /// Errors, timeouts and replies without a vote become abstentions.
    async fn collect_ballots(&self, team: &Team, task: &Task, options: &[String]) -> Vec<Ballot> {
        let request = json!({
            "type": "vote_request",
            "task": task.to_value(),
            "options": options,
        });
        let timeout = self.params.vote_timeout;

        let requests = team.roster().iter().map(|agent| {
            let port = team.agent_port(&agent.name).cloned();
            let name = agent.name.clone();
            let request = &request;
            async move {
                let Some(port) = port else {
                    return Ballot::abstain(name, "no agent port registered");
                };
                match tokio::time::timeout(timeout, port.process(request)).await {
                    Ok(Ok(reply)) => ballot_from_reply(name, &reply),
                    Ok(Err(AgentError::Timeout)) | Err(_) => Ballot::abstain(
                        name,
                        format!("timed out after {:.1}s", timeout.as_secs_f64()),
                    ),
                    Ok(Err(e)) => {
                        warn!("Vote request to {} failed: {}", name, e);
                        Ballot::abstain(name, e.to_string())
                    }
                }
            }
        });

        join_all(requests).await
    }

    fn break_tie(
        &self,
        team: &mut Team,
        task: &Task,
        tally: &Tally,
        tied: Vec<String>,
        strategies: &[TieBreakStrategy],
    ) -> TieResolution {
        debug!("Tie between {}", tied.join(", "));

        let mut domain_keywords: Vec<String> = task.domain.iter().cloned().collect();
        domain_keywords.extend(task.required_expertise.iter().flatten().cloned());

        let mut remaining = tied.clone();
        let mut applied: Vec<StrategyApplication> = Vec::new();
        {
            let ctx = TieContext {
                tally,
                roster: team.roster(),
                primus: team.primus_name(),
                domain_keywords,
            };
            for strategy in strategies {
                if remaining.len() <= 1 {
                    break;
                }
                let application = team
                    .rng()
                    .with_rng(|rng| strategy.apply(&remaining, &ctx, rng));
                debug!("Tie-break {}: {}", application.name, application.outcome);
                remaining = application.remaining.clone();
                applied.push(application);
            }
        }

        if remaining.len() == 1 {
            return TieResolution {
                tied_options: tied,
                strategies_applied: applied,
                winner: remaining.remove(0),
                fallback: None,
                consensus: None,
            };
        }

        // Still tied: every vote for a tied option becomes a favorable opinion,
        // on a scratch copy so the team's recorded opinions stay as they were.
        info!("Tie-break strategies exhausted; falling back to consensus");
        let key = task_key(task);
        let mut scratch = team.consensus().clone();
        for vote in &tally.votes {
            if remaining.contains(&vote.option_id) {
                scratch.set_agent_opinion(&key, &vote.agent_id, &vote.option_id, Stance::Favor);
            }
        }
        let mut narrowed = task.clone();
        narrowed.id = key;
        narrowed.options.retain(|o| remaining.contains(&o.id));
        let consensus = scratch.build_consensus(&narrowed, team.roster());

        let winner = consensus
            .selected_option
            .clone()
            .filter(|id| remaining.contains(id))
            .unwrap_or_else(|| remaining[0].clone());

        TieResolution {
            tied_options: tied,
            strategies_applied: applied,
            winner,
            fallback: Some("consensus".to_string()),
            consensus: Some(consensus),
        }
    }

    fn track_decision(&self, team: &mut Team, task: &Task, key: &str, result: &VotingResult) {
        let mut considerations: Vec<String> = result
            .abstentions
            .iter()
            .map(|a| format!("{} abstained: {}", a.agent_id, a.reason))
            .collect();
        if let Some(resolution) = &result.tie_resolution {
            considerations.push(resolution.rationale());
        }

        let how = format!(
            "by a {} vote of {} participant(s)",
            result.method, result.participants
        );
        let details: Vec<String> = result
            .option_scores
            .iter()
            .map(|(option, score)| {
                format!(
                    "{} received {} vote(s) worth {:.2}",
                    option,
                    result.vote_counts.get(option).copied().unwrap_or(0),
                    score
                )
            })
            .collect();

        let record = DecisionRecord::new(
            key,
            task,
            result.winner(),
            format!("{}_vote", result.method),
            "team vote",
        )
        .with_voting_results(voting_summary(result))
        .with_rationale(DecisionRationale {
            expertise_references: result
                .expertise_assessment
                .justifications
                .values()
                .cloned()
                .collect(),
            considerations,
        })
        .with_explanation(&how, &details);

        let id = team.consensus_mut().track_decision(record);
        debug!("Tracked decision {}", id);
    }
}

fn ballot_from_reply(agent: String, reply: &Value) -> Ballot {
    match reply.get("vote").and_then(Value::as_str) {
        Some(option) => Ballot::Cast {
            agent_id: agent,
            option_id: option.to_string(),
            reasoning: reply
                .get("reasoning")
                .and_then(Value::as_str)
                .map(str::to_string),
        },
        None => Ballot::abstain(agent, "reply carried no vote"),
    }
}

fn selected_option(
    task: &Task,
    winner: &str,
    resolution: Option<&TieResolution>,
) -> SelectedOption {
    let option = task.option(winner);
    SelectedOption {
        id: winner.to_string(),
        name: option.map(|o| o.name.clone()).unwrap_or_else(|| winner.to_string()),
        description: option.and_then(|o| o.description.clone()),
        tie_breaking_rationale: resolution.map(TieResolution::rationale),
    }
}

fn voting_summary(result: &VotingResult) -> Value {
    json!({
        "voting_id": result.id,
        "method": result.method.as_str(),
        "result_type": result.result_type,
        "option_scores": result.option_scores,
        "vote_counts": result.vote_counts,
        "participants": result.participants,
        "turnout": result.turnout,
    })
}
