//! The working team: roster, agent ports and shared coordination state

use crate::ports::agent::AgentPort;
use crate::ports::dialectical::DialecticalHook;
use crate::ports::seed::Seedable;
use crate::rng::SharedRng;
use edrr_domain::{
    Agent, Assignment, ConsensusBuilder, ConsensusResult, DomainError, Reassignment, Subtask,
    Task, TaskDelegator, TeamRoster, VotingHistoryEntry,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A roster of agents together with the ports that reach them
///
/// The team owns its consensus builder (and therefore the decision log), its
/// voting history and its task delegator. Cloning a team gives an independent
/// roster and coordination state that still talks to the same agent ports,
/// which is what a nested cycle needs.
#[derive(Clone)]
pub struct Team {
    name: String,
    roster: TeamRoster,
    ports: BTreeMap<String, Arc<dyn AgentPort>>,
    hooks: Vec<Arc<dyn DialecticalHook>>,
    consensus: ConsensusBuilder,
    voting_history: BTreeMap<String, Vec<VotingHistoryEntry>>,
    delegator: TaskDelegator,
    rng: Arc<SharedRng>,
    numeric_rng: Arc<SharedRng>,
    seedables: Vec<Arc<dyn Seedable>>,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roster: TeamRoster::new(),
            ports: BTreeMap::new(),
            hooks: Vec::new(),
            consensus: ConsensusBuilder::new(),
            voting_history: BTreeMap::new(),
            delegator: TaskDelegator::new(),
            rng: Arc::new(SharedRng::from_entropy("general")),
            numeric_rng: Arc::new(SharedRng::from_entropy("numeric")),
            seedables: Vec::new(),
        }
    }

    pub fn with_delegator(mut self, delegator: TaskDelegator) -> Self {
        self.delegator = delegator;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add an agent and the port that reaches it
    ///
    /// The port is registered under the agent's roster name.
    pub fn add_agent(&mut self, agent: Agent, port: Arc<dyn AgentPort>) -> Result<(), DomainError> {
        let name = agent.name.clone();
        self.roster.add_agent(agent)?;
        self.ports.insert(name, port);
        Ok(())
    }

    pub fn roster(&self) -> &TeamRoster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut TeamRoster {
        &mut self.roster
    }

    pub fn len(&self) -> usize {
        self.roster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    pub fn agent_port(&self, name: &str) -> Option<&Arc<dyn AgentPort>> {
        self.ports.get(name)
    }

    pub fn primus_name(&self) -> Option<&str> {
        self.roster.primus().map(|agent| agent.name.as_str())
    }

    // ==================== Dialectical hooks ====================

    /// Hooks are called in registration order
    pub fn register_dialectical_hook(&mut self, hook: Arc<dyn DialecticalHook>) {
        self.hooks.push(hook);
    }

    pub fn dialectical_hooks(&self) -> &[Arc<dyn DialecticalHook>] {
        &self.hooks
    }

    // ==================== Randomness ====================

    pub fn rng(&self) -> &SharedRng {
        &self.rng
    }

    pub fn numeric_rng(&self) -> &SharedRng {
        &self.numeric_rng
    }

    /// Register another randomness source to reseed on deterministic runs
    pub fn register_seedable(&mut self, seedable: Arc<dyn Seedable>) {
        self.seedables.push(seedable);
    }

    /// Every PRNG handle that a deterministic run must reseed
    ///
    /// The general and numeric handles come first, then registered sources.
    pub fn seedables(&self) -> Vec<Arc<dyn Seedable>> {
        let mut all = vec![
            self.rng.clone() as Arc<dyn Seedable>,
            self.numeric_rng.clone() as Arc<dyn Seedable>,
        ];
        all.extend(self.seedables.iter().cloned());
        all
    }

    // ==================== Consensus & voting history ====================

    pub fn consensus(&self) -> &ConsensusBuilder {
        &self.consensus
    }

    pub fn consensus_mut(&mut self) -> &mut ConsensusBuilder {
        &mut self.consensus
    }

    pub fn build_consensus(&mut self, task: &Task) -> ConsensusResult {
        self.consensus.build_consensus(task, &self.roster)
    }

    pub fn record_vote(&mut self, entry: VotingHistoryEntry) {
        self.voting_history
            .entry(entry.task_id.clone())
            .or_default()
            .push(entry);
    }

    pub fn voting_history(&self, task_key: &str) -> &[VotingHistoryEntry] {
        self.voting_history
            .get(task_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn all_voting_history(&self) -> impl Iterator<Item = &VotingHistoryEntry> {
        self.voting_history.values().flatten()
    }

    // ==================== Delegation ====================

    pub fn delegator(&self) -> &TaskDelegator {
        &self.delegator
    }

    pub fn delegator_mut(&mut self) -> &mut TaskDelegator {
        &mut self.delegator
    }

    /// Attach `subtasks` to `task` and assign each one to the best-suited agent
    pub fn delegate(
        &mut self,
        task: &Task,
        subtasks: &mut [Subtask],
    ) -> Result<Vec<Assignment>, DomainError> {
        self.delegator.associate_subtasks(task, subtasks.to_vec());
        for subtask in subtasks.iter_mut() {
            subtask.parent_id = Some(task.id.clone());
        }
        self.delegator.delegate_subtasks(&self.roster, subtasks)
    }

    pub fn rebalance(&mut self, subtasks: &mut [Subtask]) -> Vec<Reassignment> {
        self.delegator
            .reassign_subtasks_based_on_progress(&self.roster, subtasks)
    }
}

impl std::fmt::Debug for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Team")
            .field("name", &self.name)
            .field("roster", &self.roster)
            .field("ports", &self.ports.keys().collect::<Vec<_>>())
            .field("hooks", &self.hooks.len())
            .finish()
    }
}
