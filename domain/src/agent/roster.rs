//! Team roster (arena of agents)

use super::entities::Agent;
use crate::core::error::DomainError;
use crate::edrr::{Phase, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One role assignment, kept for the cycle report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleHistoryEntry {
    pub phase: Phase,
    pub agent: String,
    pub role: Role,
    pub timestamp: DateTime<Utc>,
}

/// The agents of a team, addressed by index or name
///
/// The roster is the single owner of per-agent coordination state.
/// Cloning a roster gives an independent team for a nested cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamRoster {
    agents: Vec<Agent>,
    primus: Option<usize>,
    role_history: Vec<RoleHistoryEntry>,
}

impl TeamRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster, rejecting duplicate names
    pub fn with_agents(agents: impl IntoIterator<Item = Agent>) -> Result<Self, DomainError> {
        let mut roster = Self::new();
        for agent in agents {
            roster.add_agent(agent)?;
        }
        Ok(roster)
    }

    pub fn add_agent(&mut self, agent: Agent) -> Result<(), DomainError> {
        if self.index_of(&agent.name).is_some() {
            return Err(DomainError::DuplicateAgent(agent.name));
        }
        self.agents.push(agent);
        Ok(())
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.agents.iter().position(|a| a.name == name)
    }

    pub fn agent_at(&self, index: usize) -> Option<&Agent> {
        self.agents.get(index)
    }

    /// Current Primus, if one has been assigned
    pub fn primus(&self) -> Option<&Agent> {
        self.primus.and_then(|i| self.agents.get(i))
    }

    /// Make the agent at `index` the Primus for `phase`
    ///
    /// Clears the previous Primus's role and marks the new one as having served.
    pub fn set_primus(&mut self, index: usize, phase: Phase) -> Result<&Agent, DomainError> {
        if index >= self.agents.len() {
            return Err(DomainError::UnknownAgent(format!("#{}", index)));
        }
        if let Some(previous) = self.primus.and_then(|i| self.agents.get_mut(i)) {
            previous.current_role = None;
        }

        let agent = &mut self.agents[index];
        agent.current_role = Some(Role::Primus);
        agent.has_been_primus = true;
        self.primus = Some(index);
        self.role_history.push(RoleHistoryEntry {
            phase,
            agent: agent.name.clone(),
            role: Role::Primus,
            timestamp: Utc::now(),
        });

        Ok(&self.agents[index])
    }

    /// Give a non-Primus role to the agent at `index`
    pub fn set_role(&mut self, index: usize, role: Role, phase: Phase) -> Result<(), DomainError> {
        let agent = self
            .agents
            .get_mut(index)
            .ok_or_else(|| DomainError::UnknownAgent(format!("#{}", index)))?;
        agent.current_role = Some(role);
        self.role_history.push(RoleHistoryEntry {
            phase,
            agent: agent.name.clone(),
            role,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Reset Primus rotation and roles for a new cycle
    pub fn begin_cycle(&mut self) {
        for agent in &mut self.agents {
            agent.has_been_primus = false;
            agent.current_role = None;
        }
        self.primus = None;
    }

    /// Current role of every agent
    pub fn role_map(&self) -> BTreeMap<String, Option<Role>> {
        self.agents
            .iter()
            .map(|a| (a.name.clone(), a.current_role))
            .collect()
    }

    pub fn role_history(&self) -> &[RoleHistoryEntry] {
        &self.role_history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> TeamRoster {
        TeamRoster::with_agents([Agent::new("a"), Agent::new("b"), Agent::new("c")]).unwrap()
    }

    #[test]
    fn test_duplicate_agents_rejected() {
        let result = TeamRoster::with_agents([Agent::new("a"), Agent::new("a")]);
        assert_eq!(result.unwrap_err(), DomainError::DuplicateAgent("a".to_string()));
    }

    #[test]
    fn test_set_primus_clears_previous() {
        let mut roster = roster();
        roster.set_primus(0, Phase::Expand).unwrap();
        roster.set_primus(1, Phase::Differentiate).unwrap();

        assert_eq!(roster.agents()[0].current_role, None);
        assert!(roster.agents()[0].has_been_primus);
        assert!(roster.agents()[1].is_primus());
        assert_eq!(roster.primus().map(|a| a.name.as_str()), Some("b"));
        assert_eq!(roster.role_history().len(), 2);
    }

    #[test]
    fn test_set_primus_out_of_range() {
        let mut roster = roster();
        assert!(roster.set_primus(9, Phase::Expand).is_err());
        assert!(roster.primus().is_none());
    }

    #[test]
    fn test_begin_cycle_resets_rotation() {
        let mut roster = roster();
        roster.set_primus(2, Phase::Refine).unwrap();
        roster.set_role(0, Role::Worker, Phase::Refine).unwrap();
        roster.begin_cycle();

        assert!(roster.primus().is_none());
        assert!(roster.iter().all(|a| !a.has_been_primus && a.current_role.is_none()));
        // history survives across cycles
        assert_eq!(roster.role_history().len(), 2);
    }

    #[test]
    fn test_role_map() {
        let mut roster = roster();
        roster.set_primus(1, Phase::Expand).unwrap();
        let map = roster.role_map();
        assert_eq!(map["b"], Some(Role::Primus));
        assert_eq!(map["a"], None);
    }
}
