//! Expertise-based subtask delegation
//!
//! The delegator keeps an arena of subtasks keyed by id, the progress of
//! each one, and the reassignments it has made. Callers pass subtask slices
//! in and get them back updated; the arena mirrors the latest state so
//! workload can be computed across calls.

use super::entities::Task;
use super::subtask::{Subtask, SubtaskStatus};
use crate::agent::{Agent, TeamRoster};
use crate::core::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Progress below which an open subtask counts as stalled
pub const DEFAULT_STALLED_THRESHOLD: f64 = 0.3;

/// Result of delegating one subtask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub subtask_id: String,
    pub agent: String,
    pub expertise_score: f64,
}

/// Record of moving a stalled subtask to another agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reassignment {
    pub subtask_id: String,
    pub previous_assignee: String,
    pub new_assignee: String,
    pub expertise_score: f64,
    pub progress_at_reassignment: f64,
    pub timestamp: DateTime<Utc>,
}

/// Per-agent contribution summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContributionMetrics {
    pub assigned: usize,
    pub completed: usize,
    pub mean_progress: f64,
}

/// Delegates subtasks by expertise and rebalances stalled work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDelegator {
    subtasks: BTreeMap<String, Subtask>,
    by_parent: BTreeMap<String, Vec<String>>,
    progress: BTreeMap<String, f64>,
    reassignments: Vec<Reassignment>,
    stalled_threshold: f64,
}

impl Default for TaskDelegator {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskDelegator {
    pub fn new() -> Self {
        Self {
            subtasks: BTreeMap::new(),
            by_parent: BTreeMap::new(),
            progress: BTreeMap::new(),
            reassignments: Vec::new(),
            stalled_threshold: DEFAULT_STALLED_THRESHOLD,
        }
    }

    pub fn with_stalled_threshold(mut self, threshold: f64) -> Self {
        self.stalled_threshold = clamp_unit(threshold);
        self
    }

    pub fn stalled_threshold(&self) -> f64 {
        self.stalled_threshold
    }

    /// One subtask per required expertise keyword of `task`
    pub fn decompose_by_expertise(task: &Task) -> Vec<Subtask> {
        task.required_expertise
            .iter()
            .flatten()
            .map(|expertise| {
                Subtask::new(
                    format!("{}-{}", task.id, expertise),
                    format!("{} work: {}", expertise, task.label()),
                    expertise.clone(),
                )
                .with_description(task.description.clone())
            })
            .collect()
    }

    /// Store `subtasks` under the parent task and return their ids
    pub fn associate_subtasks(&mut self, task: &Task, subtasks: Vec<Subtask>) -> Vec<String> {
        let ids: Vec<String> = subtasks.iter().map(|s| s.id.clone()).collect();
        for mut subtask in subtasks {
            subtask.parent_id = Some(task.id.clone());
            self.subtasks.insert(subtask.id.clone(), subtask);
        }
        let children = self.by_parent.entry(task.id.clone()).or_default();
        for id in &ids {
            if !children.contains(id) {
                children.push(id.clone());
            }
        }
        ids
    }

    /// Subtasks stored for a parent task, in association order
    pub fn subtasks_for(&self, parent_id: &str) -> Vec<&Subtask> {
        self.by_parent
            .get(parent_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.subtasks.get(id))
            .collect()
    }

    pub fn subtask(&self, id: &str) -> Option<&Subtask> {
        self.subtasks.get(id)
    }

    /// Assign each subtask to the agent with the best expertise match
    ///
    /// Ties go to the agent with the lighter open workload, then by name.
    pub fn delegate_subtasks(
        &mut self,
        roster: &TeamRoster,
        subtasks: &mut [Subtask],
    ) -> Result<Vec<Assignment>, DomainError> {
        if roster.is_empty() {
            return Err(DomainError::EmptyTeam);
        }

        let mut assignments = Vec::with_capacity(subtasks.len());
        for subtask in subtasks.iter_mut() {
            let workload = self.workload();
            let best = roster
                .iter()
                .map(|agent| {
                    let load = workload.get(&agent.name).copied().unwrap_or(0);
                    (agent, expertise_score(agent, &subtask.primary_expertise), load)
                })
                .max_by(|(a, score_a, load_a), (b, score_b, load_b)| {
                    score_a
                        .total_cmp(score_b)
                        .then_with(|| load_b.cmp(load_a))
                        .then_with(|| b.name.cmp(&a.name))
                })
                .ok_or(DomainError::EmptyTeam)?;

            let (agent, score, _) = best;
            subtask.status = SubtaskStatus::Assigned;
            subtask.assigned_to = Some(agent.name.clone());
            self.subtasks.insert(subtask.id.clone(), subtask.clone());

            assignments.push(Assignment {
                subtask_id: subtask.id.clone(),
                agent: agent.name.clone(),
                expertise_score: score,
            });
        }

        Ok(assignments)
    }

    /// Record progress for a subtask, clamped to `[0, 1]`
    ///
    /// Returns the stored value. Status follows progress: 1.0 completes the
    /// subtask, anything above zero marks it in progress.
    pub fn update_subtask_progress(&mut self, id: &str, value: f64) -> Result<f64, DomainError> {
        let subtask = self
            .subtasks
            .get_mut(id)
            .ok_or_else(|| DomainError::UnknownSubtask(id.to_string()))?;

        let progress = clamp_unit(value);
        self.progress.insert(id.to_string(), progress);

        if subtask.assigned_to.is_some() || progress > 0.0 {
            subtask.status = SubtaskStatus::from_progress(progress);
        }
        Ok(progress)
    }

    pub fn progress(&self, id: &str) -> f64 {
        self.progress.get(id).copied().unwrap_or(0.0)
    }

    /// Move stalled work away from over-committed agents
    ///
    /// A subtask is a candidate when it is open, its progress is below the
    /// stalled threshold, and its assignee holds more than one open subtask.
    /// The replacement must have a strictly lighter workload and an expertise
    /// score at least as good as the current assignee's. Candidates are
    /// handled by priority, then by least progress. No-op moves are never made.
    pub fn reassign_subtasks_based_on_progress(
        &mut self,
        roster: &TeamRoster,
        subtasks: &mut [Subtask],
    ) -> Vec<Reassignment> {
        for subtask in subtasks.iter() {
            self.subtasks.insert(subtask.id.clone(), subtask.clone());
        }
        if roster.len() < 2 {
            return Vec::new();
        }

        let mut workload = self.workload();
        let team_size = roster.len() as f64;

        let mut order: Vec<usize> = (0..subtasks.len()).collect();
        order.sort_by(|&a, &b| {
            let (sa, sb) = (&subtasks[a], &subtasks[b]);
            sb.priority
                .cmp(&sa.priority)
                .then_with(|| self.progress(&sa.id).total_cmp(&self.progress(&sb.id)))
                .then_with(|| sa.id.cmp(&sb.id))
        });

        let mut made = Vec::new();
        for index in order {
            let subtask = &mut subtasks[index];
            let progress = self.progress(&subtask.id);
            let Some(current) = subtask.assigned_to.clone() else {
                continue;
            };
            let current_load = workload.get(&current).copied().unwrap_or(0);
            if !subtask.is_open() || progress >= self.stalled_threshold || current_load <= 1 {
                continue;
            }

            let current_score = roster
                .get(&current)
                .map(|a| expertise_score(a, &subtask.primary_expertise))
                .unwrap_or(0.0);

            let replacement = roster
                .iter()
                .filter(|agent| agent.name != current)
                .filter_map(|agent| {
                    let load = workload.get(&agent.name).copied().unwrap_or(0);
                    let score = expertise_score(agent, &subtask.primary_expertise);
                    let qualified = score > 0.0 && score >= current_score && load < current_load;
                    qualified.then(|| {
                        let capacity = 1.0 - (load as f64 / team_size);
                        (agent, score, score * capacity)
                    })
                })
                .max_by(|(a, _, rank_a), (b, _, rank_b)| {
                    rank_a.total_cmp(rank_b).then_with(|| b.name.cmp(&a.name))
                });

            let Some((agent, score, _)) = replacement else {
                continue;
            };

            *workload.entry(current.clone()).or_default() -= 1;
            *workload.entry(agent.name.clone()).or_default() += 1;
            subtask.assigned_to = Some(agent.name.clone());
            subtask.status = SubtaskStatus::from_progress(progress);
            self.subtasks.insert(subtask.id.clone(), subtask.clone());

            made.push(Reassignment {
                subtask_id: subtask.id.clone(),
                previous_assignee: current,
                new_assignee: agent.name.clone(),
                expertise_score: score,
                progress_at_reassignment: progress,
                timestamp: Utc::now(),
            });
        }

        self.reassignments.extend(made.iter().cloned());
        made
    }

    pub fn reassignment_history(&self) -> &[Reassignment] {
        &self.reassignments
    }

    /// Assigned / completed counts and mean progress per agent
    pub fn contribution_metrics(&self) -> BTreeMap<String, ContributionMetrics> {
        let mut metrics: BTreeMap<String, (ContributionMetrics, f64)> = BTreeMap::new();
        for subtask in self.subtasks.values() {
            let Some(agent) = &subtask.assigned_to else {
                continue;
            };
            let entry = metrics.entry(agent.clone()).or_default();
            entry.0.assigned += 1;
            if subtask.status == SubtaskStatus::Completed {
                entry.0.completed += 1;
            }
            entry.1 += self.progress(&subtask.id);
        }

        metrics
            .into_iter()
            .map(|(agent, (mut m, total))| {
                m.mean_progress = if m.assigned == 0 {
                    0.0
                } else {
                    total / m.assigned as f64
                };
                (agent, m)
            })
            .collect()
    }

    /// Open subtasks per assignee
    fn workload(&self) -> BTreeMap<String, usize> {
        let mut load = BTreeMap::new();
        for subtask in self.subtasks.values().filter(|s| s.is_open()) {
            if let Some(agent) = &subtask.assigned_to {
                *load.entry(agent.clone()).or_default() += 1;
            }
        }
        load
    }
}

/// 1.0 for an exact expertise match, 0.5 for a partial (substring) match
pub fn expertise_score(agent: &Agent, expertise: &str) -> f64 {
    let wanted = expertise.trim().to_lowercase();
    if wanted.is_empty() {
        return 0.0;
    }
    if agent.expertise.contains(&wanted) {
        1.0
    } else if agent
        .expertise
        .iter()
        .any(|e| e.contains(wanted.as_str()) || wanted.contains(e.as_str()))
    {
        0.5
    } else {
        0.0
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team() -> TeamRoster {
        TeamRoster::with_agents([
            Agent::new("backend").with_expertise(["rust", "backend"]),
            Agent::new("frontend").with_expertise(["javascript", "frontend"]),
            Agent::new("security").with_expertise(["security", "devops"]),
        ])
        .unwrap()
    }

    fn feature_task() -> Task {
        Task::new("Implement a feature")
            .with_id("feature")
            .with_required_expertise(["rust", "security"])
    }

    #[test]
    fn test_feature_subtasks_go_to_matching_agents() {
        let roster = team();
        let task = feature_task();
        let mut delegator = TaskDelegator::new();

        let mut subtasks = TaskDelegator::decompose_by_expertise(&task);
        delegator.associate_subtasks(&task, subtasks.clone());
        let assignments = delegator.delegate_subtasks(&roster, &mut subtasks).unwrap();

        let by_expertise: BTreeMap<_, _> = subtasks
            .iter()
            .map(|s| (s.primary_expertise.as_str(), s.assigned_to.as_deref()))
            .collect();
        assert_eq!(by_expertise["rust"], Some("backend"));
        assert_eq!(by_expertise["security"], Some("security"));
        assert!(subtasks.iter().all(|s| s.status == SubtaskStatus::Assigned));
        assert!(assignments.iter().all(|a| a.expertise_score == 1.0));
    }

    #[test]
    fn test_associate_sets_parent() {
        let task = feature_task();
        let mut delegator = TaskDelegator::new();
        let ids = delegator.associate_subtasks(&task, TaskDelegator::decompose_by_expertise(&task));

        assert_eq!(ids.len(), 2);
        let children = delegator.subtasks_for("feature");
        assert_eq!(children.len(), 2);
        assert!(children.iter().all(|s| s.parent_id.as_deref() == Some("feature")));
    }

    #[test]
    fn test_delegate_on_empty_team_fails() {
        let mut delegator = TaskDelegator::new();
        let mut subtasks = vec![Subtask::new("s", "t", "rust")];
        let result = delegator.delegate_subtasks(&TeamRoster::new(), &mut subtasks);
        assert_eq!(result.unwrap_err(), DomainError::EmptyTeam);
    }

    #[test]
    fn test_progress_is_clamped_and_drives_status() {
        let roster = team();
        let mut delegator = TaskDelegator::new();
        let mut subtasks = vec![Subtask::new("s1", "API", "rust")];
        delegator.delegate_subtasks(&roster, &mut subtasks).unwrap();

        assert_eq!(delegator.update_subtask_progress("s1", 1.7).unwrap(), 1.0);
        assert_eq!(delegator.subtask("s1").unwrap().status, SubtaskStatus::Completed);

        assert_eq!(delegator.update_subtask_progress("s1", -0.5).unwrap(), 0.0);
        assert_eq!(delegator.subtask("s1").unwrap().status, SubtaskStatus::Assigned);

        assert_eq!(delegator.update_subtask_progress("s1", 0.4).unwrap(), 0.4);
        assert_eq!(delegator.subtask("s1").unwrap().status, SubtaskStatus::InProgress);

        assert_eq!(delegator.update_subtask_progress("s1", f64::NAN).unwrap(), 0.0);
        assert!(delegator.update_subtask_progress("missing", 0.5).is_err());
    }

    #[test]
    fn test_stalled_work_moves_off_overcommitted_agent() {
        let roster = TeamRoster::with_agents([
            Agent::new("busy").with_expertise(["rust"]),
            Agent::new("idle").with_expertise(["rust"]),
        ])
        .unwrap();
        let mut delegator = TaskDelegator::new();

        let mut subtasks = vec![
            Subtask::new("s1", "parser", "rust").with_priority(2),
            Subtask::new("s2", "lexer", "rust").with_priority(1),
        ];
        for s in subtasks.iter_mut() {
            s.status = SubtaskStatus::InProgress;
            s.assigned_to = Some("busy".to_string());
            delegator.subtasks.insert(s.id.clone(), s.clone());
        }
        delegator.update_subtask_progress("s1", 0.1).unwrap();
        delegator.update_subtask_progress("s2", 0.8).unwrap();

        let moved = delegator.reassign_subtasks_based_on_progress(&roster, &mut subtasks);

        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].subtask_id, "s1");
        assert_eq!(moved[0].previous_assignee, "busy");
        assert_eq!(moved[0].new_assignee, "idle");
        assert_eq!(moved[0].progress_at_reassignment, 0.1);
        assert_eq!(subtasks[0].assigned_to.as_deref(), Some("idle"));
        assert_eq!(delegator.reassignment_history().len(), 1);
    }

    #[test]
    fn test_no_reassignment_without_qualified_replacement() {
        let roster = TeamRoster::with_agents([
            Agent::new("busy").with_expertise(["rust"]),
            Agent::new("designer").with_expertise(["ux"]),
        ])
        .unwrap();
        let mut delegator = TaskDelegator::new();
        let mut subtasks = vec![
            Subtask::new("s1", "a", "rust"),
            Subtask::new("s2", "b", "rust"),
        ];
        for s in subtasks.iter_mut() {
            s.status = SubtaskStatus::Assigned;
            s.assigned_to = Some("busy".to_string());
        }

        let moved = delegator.reassign_subtasks_based_on_progress(&roster, &mut subtasks);
        assert!(moved.is_empty());
        assert!(subtasks.iter().all(|s| s.assigned_to.as_deref() == Some("busy")));
    }

    #[test]
    fn test_single_subtask_is_not_overcommitted() {
        let roster = team();
        let mut delegator = TaskDelegator::new();
        let mut subtasks = vec![Subtask::new("s1", "a", "rust")];
        delegator.delegate_subtasks(&roster, &mut subtasks).unwrap();

        let moved = delegator.reassign_subtasks_based_on_progress(&roster, &mut subtasks);
        assert!(moved.is_empty());
    }

    #[test]
    fn test_contribution_metrics() {
        let roster = team();
        let mut delegator = TaskDelegator::new();
        let mut subtasks = vec![
            Subtask::new("s1", "a", "rust"),
            Subtask::new("s2", "b", "security"),
        ];
        delegator.delegate_subtasks(&roster, &mut subtasks).unwrap();
        delegator.update_subtask_progress("s1", 1.0).unwrap();
        delegator.update_subtask_progress("s2", 0.5).unwrap();

        let metrics = delegator.contribution_metrics();
        assert_eq!(metrics["backend"].completed, 1);
        assert_eq!(metrics["backend"].mean_progress, 1.0);
        assert_eq!(metrics["security"].assigned, 1);
        assert_eq!(metrics["security"].mean_progress, 0.5);
        assert!(!metrics.contains_key("frontend"));
    }
}
