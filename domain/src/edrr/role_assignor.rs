//! Primus selection and role rotation

use super::{Phase, Role};
use crate::agent::{Agent, TeamRoster};
use crate::core::error::DomainError;
use crate::task::Task;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// Picks the lead agent for each phase
///
/// Candidates are agents whose expertise intersects the phase's keyword set.
/// Agents that have not yet led during the current cycle are preferred, so
/// leadership rotates across a cycle. When nobody matches, the whole team is
/// eligible.
///
/// The remaining candidates are ordered by experience level. Equal experience
/// goes to the agent covering more of the task's `required_expertise`, and
/// only then to the alphabetically first name. A task without required
/// expertise therefore falls straight through to the name order.
///
/// # Example
///
/// ```
/// use edrr_domain::{Agent, Phase, RoleAssignor, Task, TeamRoster};
///
/// let mut roster = TeamRoster::with_agents([
///     Agent::new("ideas").with_expertise(["brainstorming"]),
///     Agent::new("coder").with_expertise(["coding"]),
/// ])
/// .unwrap();
/// let assignor = RoleAssignor::default();
/// let task = Task::new("Build a cache");
///
/// let primus = assignor.assign_primus(&mut roster, Phase::Refine, &task).unwrap();
/// assert_eq!(primus.name, "coder");
/// ```
#[derive(Debug, Clone)]
pub struct RoleAssignor {
    phase_expertise: HashMap<Phase, BTreeSet<String>>,
}

impl Default for RoleAssignor {
    fn default() -> Self {
        let sets: [(Phase, &[&str]); 4] = [
            (
                Phase::Expand,
                &["exploration", "brainstorming", "creativity", "ideation"],
            ),
            (
                Phase::Differentiate,
                &["comparison", "analysis", "evaluation", "critical thinking"],
            ),
            (
                Phase::Refine,
                &["implementation", "coding", "development", "optimization"],
            ),
            (
                Phase::Retrospect,
                &["evaluation", "reflection", "learning", "improvement"],
            ),
        ];
        Self {
            phase_expertise: sets
                .into_iter()
                .map(|(phase, words)| (phase, words.iter().map(|w| w.to_string()).collect()))
                .collect(),
        }
    }
}

impl RoleAssignor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the keyword set used for `phase`
    pub fn with_phase_expertise<I, S>(mut self, phase: Phase, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.phase_expertise.insert(
            phase,
            keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        );
        self
    }

    pub fn expertise_for(&self, phase: Phase) -> Option<&BTreeSet<String>> {
        self.phase_expertise.get(&phase)
    }

    /// Whether any agent on the roster has expertise for `phase`
    ///
    /// `false` means the next assignment for this phase is a capability
    /// mismatch and falls back to the whole team.
    pub fn has_capable_agent(&self, roster: &TeamRoster, phase: Phase) -> bool {
        roster.iter().any(|agent| self.phase_overlap(agent, phase) > 0)
    }

    /// Select and install the Primus for `phase`
    pub fn assign_primus<'r>(
        &self,
        roster: &'r mut TeamRoster,
        phase: Phase,
        task: &Task,
    ) -> Result<&'r Agent, DomainError> {
        let index = self.select_primus(roster, phase, task)?;
        roster.set_primus(index, phase)
    }

    /// Assign the Primus, then rotate secondary roles over everyone else
    ///
    /// Returns the Primus's name.
    pub fn assign_roles(
        &self,
        roster: &mut TeamRoster,
        phase: Phase,
        task: &Task,
    ) -> Result<String, DomainError> {
        let primus = self.assign_primus(roster, phase, task)?.name.clone();

        let others: Vec<usize> = (0..roster.len())
            .filter(|&i| roster.agent_at(i).is_some_and(|a| a.name != primus))
            .collect();
        for (slot, index) in others.into_iter().enumerate() {
            let role = Role::SECONDARY[slot % Role::SECONDARY.len()];
            roster.set_role(index, role, phase)?;
        }

        Ok(primus)
    }

    fn select_primus(
        &self,
        roster: &TeamRoster,
        phase: Phase,
        task: &Task,
    ) -> Result<usize, DomainError> {
        if roster.is_empty() {
            return Err(DomainError::EmptyTeam);
        }

        let matching: Vec<usize> = (0..roster.len())
            .filter(|&i| {
                roster
                    .agent_at(i)
                    .is_some_and(|a| self.phase_overlap(a, phase) > 0)
            })
            .collect();
        let pool = if matching.is_empty() {
            (0..roster.len()).collect()
        } else {
            matching
        };

        let unused: Vec<usize> = pool
            .iter()
            .copied()
            .filter(|&i| roster.agent_at(i).is_some_and(|a| !a.has_been_primus))
            .collect();
        let candidates = if unused.is_empty() { pool } else { unused };

        let required = task.required_expertise.clone().unwrap_or_default();
        candidates
            .into_iter()
            .filter_map(|i| roster.agent_at(i).map(|a| (i, a)))
            .min_by(|(_, a), (_, b)| rank(a, b, &required))
            .map(|(i, _)| i)
            .ok_or(DomainError::EmptyTeam)
    }

    fn phase_overlap(&self, agent: &Agent, phase: Phase) -> usize {
        self.phase_expertise
            .get(&phase)
            .map(|keywords| agent.expertise_overlap(keywords))
            .unwrap_or(0)
    }
}

/// Experience descending, then overlap with the task's required expertise
/// descending, then name ascending
fn rank(a: &Agent, b: &Agent, required: &BTreeSet<String>) -> Ordering {
    b.experience_level
        .cmp(&a.experience_level)
        .then_with(|| b.expertise_overlap(required).cmp(&a.expertise_overlap(required)))
        .then_with(|| a.name.cmp(&b.name))
}
