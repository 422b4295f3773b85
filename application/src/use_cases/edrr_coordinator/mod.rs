//! EDRR coordinator
//!
//! Drives one cycle through EXPAND, DIFFERENTIATE, REFINE and RETROSPECT:
//! 1. Role assignment - a Primus is chosen for the phase
//! 2. Operations - the phase's [`OperationSet`] runs in order
//! 3. Analysis - REFINE output goes through the optional code analyzer and
//!    AST transformer
//! 4. Persistence - results are stored in memory under the phase
//! 5. Peer review - optional, re-running the phase until approved or out of
//!    revision cycles
//!
//! Only operation failures are fatal. Everything an external collaborator
//! gets wrong is recorded in the phase result's `errors` and the cycle goes on.

mod records;
mod types;

pub use records::DialecticalRecords;
pub use types::{
    CollaboratorFailure, CycleReport, DialecticalRecordSet, ExecutionRecord, ExecutionStatus,
    MicroCycle, PhaseMetrics, PhaseResult,
};

use crate::config::{CoordinatorConfig, ReasoningLoopParams};
use crate::ports::agent::AgentPort;
use crate::ports::code_analysis::{AstTransformerPort, CodeAnalyzerPort};
use crate::ports::dialectical::{DialecticalReasoner, PhaseRecorder};
use crate::ports::event_logger::{CycleEvent, EventLogger, NoEventLogger};
use crate::ports::memory::{MemoryPort, NoMemory};
use crate::ports::peer_review::PeerReviewPort;
use crate::ports::progress::{CycleProgressNotifier, NoProgress};
use crate::ports::team_operations::{
    Operation, OperationContext, OperationSet, TeamOperations,
};
use crate::team::Team;
use crate::use_cases::agent_team_operations::AgentTeamOperations;
use crate::use_cases::critique_reasoner::CritiqueReasoner;
use crate::use_cases::reasoning_loop::{DialecticalReasoningLoop, ReasoningLoopError};
use crate::use_cases::voting_engine::{VotingEngine, VotingError};
use chrono::{DateTime, Utc};
use edrr_domain::{
    Assignment, DialecticalSequence, DomainError, Phase, Reassignment, RoleAssignor, Subtask,
    Task, TaskDelegator, VotingResult, WorkProduct, blend_quality,
};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Transformations requested from the AST transformer during REFINE
const REFINE_TRANSFORMATIONS: [&str; 3] = [
    "remove_unused_imports",
    "remove_redundant_assignments",
    "optimize_string_literals",
];

#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("No active cycle")]
    NoActiveCycle,

    #[error("Invalid task: {0}")]
    InvalidTask(String),

    #[error("Operation {operation} failed in {phase}: {message}")]
    PrimaryOperation {
        phase: Phase,
        operation: Operation,
        message: String,
    },

    #[error("Recursion depth {depth} exceeds the maximum of {max}")]
    RecursionLimit { depth: u32, max: u32 },

    #[error("Recursion terminated: {0}")]
    RecursionTerminated(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Voting(#[from] VotingError),

    #[error(transparent)]
    Reasoning(#[from] ReasoningLoopError),
}

struct CycleState {
    id: String,
    task: Task,
    phase: Phase,
    started_at: DateTime<Utc>,
    results: BTreeMap<Phase, PhaseResult>,
    errors: Vec<CollaboratorFailure>,
    history: Vec<ExecutionRecord>,
    metrics: BTreeMap<Phase, PhaseMetrics>,
    votes: Vec<VotingResult>,
    subtasks: Vec<Subtask>,
    assignments: Vec<Assignment>,
    reassignments: Vec<Reassignment>,
    micro_cycles: Vec<MicroCycle>,
    records: Arc<DialecticalRecords>,
}

impl CycleState {
    fn new(id: String, task: Task) -> Self {
        Self {
            id,
            task,
            phase: Phase::Expand,
            started_at: Utc::now(),
            results: BTreeMap::new(),
            errors: Vec::new(),
            history: Vec::new(),
            metrics: BTreeMap::new(),
            votes: Vec::new(),
            subtasks: Vec::new(),
            assignments: Vec::new(),
            reassignments: Vec::new(),
            micro_cycles: Vec::new(),
            records: Arc::new(DialecticalRecords::default()),
        }
    }
}

pub struct EdrrCoordinator {
    team: Team,
    assignor: RoleAssignor,
    operations: Arc<dyn TeamOperations>,
    memory: Arc<dyn MemoryPort>,
    reasoner: Arc<dyn DialecticalReasoner>,
    peer_review: Option<Arc<dyn PeerReviewPort>>,
    code_analyzer: Option<Arc<dyn CodeAnalyzerPort>>,
    ast_transformer: Option<Arc<dyn AstTransformerPort>>,
    voting: VotingEngine,
    events: Arc<dyn EventLogger>,
    progress: Arc<dyn CycleProgressNotifier>,
    config: CoordinatorConfig,
    depth: u32,
    parent_cycle_id: Option<String>,
    cycle: Option<CycleState>,
}

impl EdrrCoordinator {
    /// Coordinator with agent-backed operations and no-op collaborators
    pub fn new(team: Team, config: CoordinatorConfig) -> Self {
        let team = team.with_delegator(
            TaskDelegator::new().with_stalled_threshold(config.stalled_threshold),
        );
        Self {
            operations: Arc::new(AgentTeamOperations::from_team(&team)),
            team,
            assignor: RoleAssignor::new(),
            memory: Arc::new(NoMemory),
            reasoner: Arc::new(CritiqueReasoner::new()),
            peer_review: None,
            code_analyzer: None,
            ast_transformer: None,
            voting: VotingEngine::new(config.voting.clone()),
            events: Arc::new(NoEventLogger),
            progress: Arc::new(NoProgress),
            config,
            depth: 0,
            parent_cycle_id: None,
            cycle: None,
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_role_assignor(mut self, assignor: RoleAssignor) -> Self {
        self.assignor = assignor;
        self
    }

    pub fn with_operations(mut self, operations: Arc<dyn TeamOperations>) -> Self {
        self.operations = operations;
        self
    }

    pub fn with_memory(mut self, memory: Arc<dyn MemoryPort>) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_reasoner(mut self, reasoner: Arc<dyn DialecticalReasoner>) -> Self {
        self.reasoner = reasoner;
        self
    }

    pub fn with_peer_review(mut self, reviewer: Arc<dyn PeerReviewPort>) -> Self {
        self.peer_review = Some(reviewer);
        self
    }

    pub fn with_code_analyzer(mut self, analyzer: Arc<dyn CodeAnalyzerPort>) -> Self {
        self.code_analyzer = Some(analyzer);
        self
    }

    pub fn with_ast_transformer(mut self, transformer: Arc<dyn AstTransformerPort>) -> Self {
        self.ast_transformer = Some(transformer);
        self
    }

    pub fn with_voting_engine(mut self, voting: VotingEngine) -> Self {
        self.voting = voting;
        self
    }

    /// Also routes the voting engine's events to `events`
    pub fn with_event_logger(mut self, events: Arc<dyn EventLogger>) -> Self {
        self.voting = self.voting.with_event_logger(events.clone());
        self.events = events;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn CycleProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    // ==================== Accessors ====================

    pub fn team(&self) -> &Team {
        &self.team
    }

    pub fn team_mut(&mut self) -> &mut Team {
        &mut self.team
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn parent_cycle_id(&self) -> Option<&str> {
        self.parent_cycle_id.as_deref()
    }

    pub fn cycle_id(&self) -> Option<&str> {
        self.cycle.as_ref().map(|c| c.id.as_str())
    }

    pub fn current_phase(&self) -> Option<Phase> {
        self.cycle.as_ref().map(|c| c.phase)
    }

    pub fn task(&self) -> Option<&Task> {
        self.cycle.as_ref().map(|c| &c.task)
    }

    pub fn phase_result(&self, phase: Phase) -> Option<&PhaseResult> {
        self.cycle.as_ref().and_then(|c| c.results.get(&phase))
    }

    fn cycle(&self) -> Result<&CycleState, CoordinatorError> {
        self.cycle.as_ref().ok_or(CoordinatorError::NoActiveCycle)
    }

    fn cycle_mut(&mut self) -> Result<&mut CycleState, CoordinatorError> {
        self.cycle.as_mut().ok_or(CoordinatorError::NoActiveCycle)
    }

    // ==================== Cycle control ====================

    /// Begin a new cycle in EXPAND and return its id
    ///
    /// With `auto_progress` every phase is executed before returning.
    pub async fn start_cycle(&mut self, mut task: Task) -> Result<String, CoordinatorError> {
        if task.description.trim().is_empty() {
            return Err(CoordinatorError::InvalidTask(
                "task description is empty".to_string(),
            ));
        }
        if self.team.is_empty() {
            return Err(DomainError::EmptyTeam.into());
        }
        task.ensure_id();

        let cycle_id = uuid::Uuid::new_v4().to_string();
        info!(
            "Starting EDRR cycle {} for '{}' (depth {})",
            cycle_id,
            task.label(),
            self.depth
        );

        self.team.roster_mut().begin_cycle();
        self.cycle = Some(CycleState::new(cycle_id.clone(), task.clone()));
        self.assign_roles(Phase::Expand)?;

        let metadata = json!({"type": "task", "cycle_id": cycle_id, "depth": self.depth});
        if let Err(e) = self
            .memory
            .store_with_edrr_phase(task.to_value(), Phase::Expand, metadata)
            .await
        {
            warn!("Failed to store task in memory: {}", e);
            self.cycle_mut()?
                .errors
                .push(CollaboratorFailure::new("memory.store", e));
        }

        self.events.log(CycleEvent::new(
            "cycle_started",
            json!({
                "cycle_id": cycle_id,
                "task_id": task.id,
                "depth": self.depth,
                "parent_cycle_id": self.parent_cycle_id,
                "team_size": self.team.len(),
            }),
        ));

        if self.config.auto_progress {
            self.progress_to_phase(Phase::Retrospect).await?;
        }
        Ok(cycle_id)
    }

    /// Execute the phase the cycle is in
    pub async fn execute_current_phase(&mut self) -> Result<PhaseResult, CoordinatorError> {
        let (cycle_id, phase, task) = {
            let cycle = self.cycle()?;
            (cycle.id.clone(), cycle.phase, cycle.task.clone())
        };
        let primus = self.team.primus_name().map(str::to_string);
        info!(
            "Executing {} (Primus: {})",
            phase.display_name(),
            primus.as_deref().unwrap_or("none")
        );
        self.progress.on_phase_start(phase, primus.as_deref());

        let started_at = Utc::now();
        let timer = Instant::now();
        let mut errors = Vec::new();

        // One entry per earlier phase of this cycle, in cycle order
        let query = json!({"cycle_id": cycle_id});
        let mut prior_results = Vec::new();
        for earlier in Phase::ALL.into_iter().take(phase.index()) {
            match self.memory.retrieve_with_edrr_phase(earlier, &query).await {
                Ok(items) => prior_results.push(json!({
                    "phase": earlier.as_str(),
                    "results": items,
                })),
                Err(e) => {
                    warn!("Failed to retrieve {} results: {}", earlier, e);
                    errors.push(CollaboratorFailure::new("memory.retrieve", e));
                }
            }
        }

        let base = OperationContext {
            task: task.clone(),
            phase,
            cycle_id: cycle_id.clone(),
            primus: primus.clone(),
            prior_results: prior_results.clone(),
            previous: Map::new(),
            revision: 0,
            feedback: Vec::new(),
        };
        let mut outputs = match self.run_operations(base.clone()).await {
            Ok(outputs) => outputs,
            Err(e) => {
                let record = ExecutionRecord {
                    phase,
                    primus,
                    started_at,
                    completed_at: Utc::now(),
                    duration_ms: timer.elapsed().as_millis() as u64,
                    status: ExecutionStatus::Failed,
                    error: Some(e.to_string()),
                };
                self.cycle_mut()?.history.push(record);
                return Err(e);
            }
        };

        let analysis = if phase == Phase::Refine {
            self.analyze(&task, &outputs, &mut errors).await
        } else {
            None
        };

        let mut memory_id = self
            .persist(phase, &cycle_id, primus.as_deref(), &outputs, 0, &mut errors)
            .await;

        let mut peer_review = None;
        let mut quality_score = None;
        let mut needs_more_work = false;
        let mut revision_cycles = 0;
        if self.config.peer_review.applies_to(phase)
            && let Some(reviewer) = self.peer_review.clone()
        {
            let max_cycles = self.config.peer_review.max_revision_cycles;
            let mut quality = current_quality(&outputs);
            loop {
                let work_product = WorkProduct {
                    phase,
                    results: Value::Object(outputs.clone()),
                    description: task.description.clone(),
                    cycle_id: cycle_id.clone(),
                };
                let outcome = match reviewer
                    .run_peer_review(&work_product, self.memory.as_ref(), max_cycles)
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!("Peer review of {} failed: {}", phase, e);
                        errors.push(CollaboratorFailure::new("peer_review", e));
                        break;
                    }
                };

                quality = blend_quality(quality, outcome.quality_score);
                debug!(
                    "Peer review of {}: {} (quality {:.2})",
                    phase,
                    outcome.status.as_str(),
                    quality
                );
                self.progress.on_review(phase, &outcome);
                self.events.log(CycleEvent::new(
                    "peer_review",
                    json!({
                        "cycle_id": cycle_id,
                        "phase": phase.as_str(),
                        "review_id": outcome.review_id,
                        "status": outcome.status.as_str(),
                        "quality_score": quality,
                        "revision": revision_cycles,
                    }),
                ));

                let approved = outcome.status.is_approved();
                let feedback = outcome.feedback.clone();
                needs_more_work = outcome.status.needs_more_work();
                quality_score = Some(quality);
                peer_review = Some(outcome);
                if approved || revision_cycles >= max_cycles {
                    break;
                }

                revision_cycles += 1;
                info!(
                    "Revising {} after review (cycle {}/{})",
                    phase, revision_cycles, max_cycles
                );
                let context = OperationContext {
                    revision: revision_cycles,
                    feedback,
                    ..base.clone()
                };
                match self.run_operations(context).await {
                    Ok(revised) => outputs = revised,
                    Err(e) => {
                        warn!("Revision of {} failed: {}", phase, e);
                        errors.push(CollaboratorFailure::new("revision", e));
                        break;
                    }
                }
            }

            if revision_cycles > 0
                && let Some(id) = self
                    .persist(
                        phase,
                        &cycle_id,
                        primus.as_deref(),
                        &outputs,
                        revision_cycles,
                        &mut errors,
                    )
                    .await
            {
                memory_id = Some(id);
            }
        }

        if phase == Phase::Retrospect
            && let Err(e) = self.memory.flush_updates().await
        {
            warn!("Failed to flush memory: {}", e);
            errors.push(CollaboratorFailure::new("memory.flush", e));
        }

        let duration_ms = timer.elapsed().as_millis() as u64;
        let result = PhaseResult {
            phase,
            primus: primus.clone(),
            outputs,
            prior_results,
            errors,
            analysis,
            peer_review,
            quality_score,
            needs_more_work,
            revision_cycles,
            memory_id,
            completed_at: Utc::now(),
        };

        {
            let cycle = self.cycle_mut()?;
            cycle.history.push(ExecutionRecord {
                phase,
                primus,
                started_at,
                completed_at: result.completed_at,
                duration_ms,
                status: ExecutionStatus::Completed,
                error: None,
            });
            cycle.metrics.insert(
                phase,
                PhaseMetrics {
                    duration_ms,
                    operations: OperationSet::for_phase(phase).len(),
                    errors: result.errors.len(),
                    revision_cycles,
                },
            );
            cycle.results.insert(phase, result.clone());
        }

        self.progress.on_phase_complete(phase, result.errors.len());
        self.events.log(CycleEvent::new(
            "phase_completed",
            json!({
                "cycle_id": cycle_id,
                "phase": phase.as_str(),
                "primus": result.primus,
                "duration_ms": duration_ms,
                "errors": result.errors.len(),
                "quality_score": result.quality_score,
                "revision_cycles": revision_cycles,
            }),
        ));
        info!(
            "{} completed in {} ms with {} non-fatal error(s)",
            phase.display_name(),
            duration_ms,
            result.errors.len()
        );

        Ok(result)
    }

    /// Move to `target`, executing skipped phases on the way
    ///
    /// Returns the stored result when the cycle is already in `target` and it
    /// has run. A phase that failed is executed again.
    pub async fn progress_to_phase(
        &mut self,
        target: Phase,
    ) -> Result<PhaseResult, CoordinatorError> {
        let current = self.cycle()?.phase;
        if current == target {
            if let Some(result) = self.cycle()?.results.get(&target) {
                return Ok(result.clone());
            }
            return self.execute_current_phase().await;
        }

        if target > current {
            if !self.cycle()?.results.contains_key(&current) {
                self.execute_current_phase().await?;
            }
            for phase in current.phases_between(target) {
                if !self.cycle()?.results.contains_key(&phase) {
                    self.enter_phase(phase)?;
                    self.execute_current_phase().await?;
                }
            }
        }

        self.enter_phase(target)?;
        self.execute_current_phase().await
    }

    /// Advance one phase; `None` once RETROSPECT has run
    pub async fn progress_to_next_phase(
        &mut self,
    ) -> Result<Option<PhaseResult>, CoordinatorError> {
        let current = self.cycle()?.phase;
        match current.next() {
            Some(next) => self.progress_to_phase(next).await.map(Some),
            None if !self.cycle()?.results.contains_key(&current) => {
                self.execute_current_phase().await.map(Some)
            }
            None => Ok(None),
        }
    }

    /// Snapshot of the cycle; flushes memory first
    pub async fn generate_report(&mut self) -> Result<CycleReport, CoordinatorError> {
        self.cycle()?;
        let flushed = self.memory.flush_updates().await;

        let roles = self.team.roster().role_history().to_vec();
        let parent_cycle_id = self.parent_cycle_id.clone();
        let depth = self.depth;
        let cycle = self.cycle_mut()?;
        if let Err(e) = flushed {
            warn!("Failed to flush memory before report: {}", e);
            cycle.errors.push(CollaboratorFailure::new("memory.flush", e));
        }

        let mut errors = cycle.errors.clone();
        for result in cycle.results.values() {
            errors.extend(result.errors.iter().cloned());
        }

        let report = CycleReport {
            cycle_id: cycle.id.clone(),
            parent_cycle_id,
            depth,
            task: cycle.task.clone(),
            current_phase: cycle.phase,
            phase_results: cycle.results.clone(),
            errors,
            execution_history: cycle.history.clone(),
            metrics: cycle.metrics.clone(),
            role_history: roles,
            dialectical_records: cycle.records.snapshot(),
            votes: cycle.votes.clone(),
            subtasks: cycle.subtasks.clone(),
            assignments: cycle.assignments.clone(),
            reassignments: cycle.reassignments.clone(),
            micro_cycles: cycle.micro_cycles.clone(),
            started_at: cycle.started_at,
            generated_at: Utc::now(),
        };

        self.events.log(CycleEvent::new(
            "report_generated",
            json!({
                "cycle_id": report.cycle_id,
                "phases": report.phase_results.len(),
                "errors": report.errors.len(),
                "complete": report.is_complete(),
            }),
        ));
        Ok(report)
    }

    // ==================== Decisions & work ====================

    /// Vote on the cycle task's options
    pub async fn hold_vote(&mut self) -> Result<VotingResult, CoordinatorError> {
        let (task, phase, cycle_id) = {
            let cycle = self.cycle()?;
            (cycle.task.clone(), cycle.phase, cycle.id.clone())
        };
        let result = self
            .voting
            .vote_on_critical_decision(&mut self.team, &task)
            .await?;

        let stored = self
            .memory
            .store_with_edrr_phase(
                serde_json::to_value(&result).unwrap_or(Value::Null),
                phase,
                json!({"type": "vote", "cycle_id": cycle_id}),
            )
            .await;

        let cycle = self.cycle_mut()?;
        if let Err(e) = stored {
            warn!("Failed to store vote: {}", e);
            cycle.errors.push(CollaboratorFailure::new("memory.store", e));
        }
        cycle.votes.push(result.clone());
        Ok(result)
    }

    /// Assign subtasks of the cycle task; one per required expertise when `None`
    pub fn delegate_subtasks(
        &mut self,
        subtasks: Option<Vec<Subtask>>,
    ) -> Result<Vec<Assignment>, CoordinatorError> {
        let cycle = self.cycle.as_mut().ok_or(CoordinatorError::NoActiveCycle)?;
        let mut subtasks =
            subtasks.unwrap_or_else(|| TaskDelegator::decompose_by_expertise(&cycle.task));
        let assignments = self.team.delegate(&cycle.task, &mut subtasks)?;
        for assignment in &assignments {
            debug!(
                "{} assigned to {} (score {:.1})",
                assignment.subtask_id, assignment.agent, assignment.expertise_score
            );
        }

        cycle.subtasks.extend(subtasks);
        cycle.assignments.extend(assignments.iter().cloned());
        Ok(assignments)
    }

    pub fn update_subtask_progress(
        &mut self,
        subtask_id: &str,
        progress: f64,
    ) -> Result<f64, CoordinatorError> {
        let cycle = self.cycle.as_mut().ok_or(CoordinatorError::NoActiveCycle)?;
        let stored = self
            .team
            .delegator_mut()
            .update_subtask_progress(subtask_id, progress)?;
        if let (Some(local), Some(updated)) = (
            cycle.subtasks.iter_mut().find(|s| s.id == subtask_id),
            self.team.delegator().subtask(subtask_id),
        ) {
            *local = updated.clone();
        }
        Ok(stored)
    }

    /// Move stalled subtasks away from over-committed agents
    pub fn rebalance_subtasks(&mut self) -> Result<Vec<Reassignment>, CoordinatorError> {
        let cycle = self.cycle.as_mut().ok_or(CoordinatorError::NoActiveCycle)?;
        let moves = self.team.rebalance(&mut cycle.subtasks);
        if !moves.is_empty() {
            info!("Reassigned {} stalled subtask(s)", moves.len());
        }
        cycle.reassignments.extend(moves.iter().cloned());
        Ok(moves)
    }

    /// Run the dialectical reasoning loop on the cycle task
    ///
    /// Without a task solution, the latest output of the current phase is
    /// used as the starting thesis. The final synthesis becomes the task's
    /// solution.
    pub async fn run_reasoning_loop(
        &mut self,
        critic: &dyn AgentPort,
    ) -> Result<Vec<DialecticalSequence>, CoordinatorError> {
        let (phase, mut task, records) = {
            let cycle = self.cycle()?;
            (cycle.phase, cycle.task.clone(), cycle.records.clone())
        };
        if task.solution.is_none() {
            task.solution = self
                .cycle()?
                .results
                .get(&phase)
                .and_then(|r| r.outputs.values().last().cloned());
        }

        let params = ReasoningLoopParams {
            phase,
            ..self.config.reasoning.clone()
        };
        let recorder: &dyn PhaseRecorder = records.as_ref();
        let reasoning = DialecticalReasoningLoop::new(self.reasoner.clone());
        let results = reasoning
            .run(
                &self.team,
                &mut task,
                critic,
                Some(self.memory.as_ref()),
                Some(recorder),
                &params,
            )
            .await?;

        self.cycle_mut()?.task.solution = task.solution;
        Ok(results)
    }

    // ==================== Recursion ====================

    /// Start a nested cycle for `task` on an independent copy of the team
    pub async fn create_micro_cycle(
        &mut self,
        task: Task,
        parent_phase: Phase,
    ) -> Result<EdrrCoordinator, CoordinatorError> {
        let parent_id = self.cycle()?.id.clone();
        let depth = self.depth + 1;
        if depth > self.config.max_recursion_depth {
            return Err(CoordinatorError::RecursionLimit {
                depth,
                max: self.config.max_recursion_depth,
            });
        }
        if let Some(reason) = self.recursion_stop_reason(&task) {
            info!("Recursion terminated: {}", reason);
            return Err(CoordinatorError::RecursionTerminated(reason));
        }

        let mut child = EdrrCoordinator {
            team: self.team.clone(),
            assignor: self.assignor.clone(),
            operations: self.operations.clone(),
            memory: self.memory.clone(),
            reasoner: self.reasoner.clone(),
            peer_review: self.peer_review.clone(),
            code_analyzer: self.code_analyzer.clone(),
            ast_transformer: self.ast_transformer.clone(),
            voting: self.voting.clone(),
            events: self.events.clone(),
            progress: self.progress.clone(),
            config: self.config.clone(),
            depth,
            parent_cycle_id: Some(parent_id),
            cycle: None,
        };
        let cycle_id = child.start_cycle(task).await?;
        let task_id = child.task().map(|t| t.id.clone()).unwrap_or_default();
        info!("Created micro cycle {} at depth {}", cycle_id, depth);

        self.cycle_mut()?.micro_cycles.push(MicroCycle {
            cycle_id,
            parent_phase,
            task_id,
            depth,
        });
        Ok(child)
    }

    /// Why a nested cycle for `task` should not be started, if it should not
    pub fn recursion_stop_reason(&self, task: &Task) -> Option<String> {
        match task.human_override.as_deref() {
            Some("terminate") => return Some("human override".to_string()),
            Some("continue") => return None,
            _ => {}
        }

        let config = &self.config;
        if let Some(granularity) = task.granularity_score
            && granularity < config.granularity_threshold
        {
            return Some(format!(
                "granularity {} below threshold {}",
                granularity, config.granularity_threshold
            ));
        }

        let number = |key: &str| task.extra.get(key).and_then(Value::as_f64);
        if let (Some(cost), Some(benefit)) = (number("cost_score"), number("benefit_score")) {
            let ratio = if benefit > 0.0 { cost / benefit } else { f64::INFINITY };
            if ratio > config.max_cost_benefit_ratio {
                return Some(format!(
                    "cost-benefit ratio {:.2} above {}",
                    ratio, config.max_cost_benefit_ratio
                ));
            }
        }
        if let Some(quality) = number("quality_score")
            && quality >= config.recursion_quality_threshold
        {
            return Some(format!(
                "quality {} at or above threshold {}",
                quality, config.recursion_quality_threshold
            ));
        }
        if let Some(usage) = number("resource_usage")
            && usage > config.resource_limit
        {
            return Some(format!(
                "resource usage {} above limit {}",
                usage, config.resource_limit
            ));
        }
        None
    }

    // ==================== Internals ====================

    fn enter_phase(&mut self, phase: Phase) -> Result<(), CoordinatorError> {
        self.cycle_mut()?.phase = phase;
        self.assign_roles(phase)?;
        Ok(())
    }

    fn assign_roles(&mut self, phase: Phase) -> Result<String, CoordinatorError> {
        let task = self.cycle()?.task.clone();
        if !self.assignor.has_capable_agent(self.team.roster(), phase) {
            warn!(
                "No agent has {} expertise; choosing the Primus from the whole team",
                phase.display_name()
            );
        }
        let primus = self
            .assignor
            .assign_roles(self.team.roster_mut(), phase, &task)?;
        debug!("{} leads {}", primus, phase.display_name());
        Ok(primus)
    }

    /// Run every operation of the context's phase; any failure is fatal
    async fn run_operations(
        &self,
        mut context: OperationContext,
    ) -> Result<Map<String, Value>, CoordinatorError> {
        let phase = context.phase;
        let mut outputs = Map::new();
        for &operation in OperationSet::for_phase(phase).operations {
            context.previous = outputs.clone();
            match self.operations.run(operation, &context).await {
                Ok(output) => {
                    outputs.insert(operation.as_str().to_string(), output);
                }
                Err(e) => {
                    warn!("{} failed in {}: {}", operation, phase, e);
                    return Err(CoordinatorError::PrimaryOperation {
                        phase,
                        operation,
                        message: e.to_string(),
                    });
                }
            }
        }
        Ok(outputs)
    }

    async fn analyze(
        &self,
        task: &Task,
        outputs: &Map<String, Value>,
        errors: &mut Vec<CollaboratorFailure>,
    ) -> Option<Value> {
        if self.code_analyzer.is_none() && self.ast_transformer.is_none() {
            return None;
        }
        let code = code_under_refinement(task, outputs);
        let mut analysis = Map::new();

        if let Some(analyzer) = &self.code_analyzer {
            match analyzer.analyze_code(&code).await {
                Ok(report) => {
                    analysis.insert("code_analysis".to_string(), report);
                }
                Err(e) => {
                    warn!("Code analysis failed: {}", e);
                    errors.push(CollaboratorFailure::new("code_analyzer", e));
                }
            }
        }
        if let Some(transformer) = &self.ast_transformer {
            let transformations: Vec<String> =
                REFINE_TRANSFORMATIONS.iter().map(|t| t.to_string()).collect();
            match transformer.transform_code(&code, &transformations).await {
                Ok(transformed) => {
                    analysis.insert("transformed_code".to_string(), Value::String(transformed));
                }
                Err(e) => {
                    warn!("AST transformation failed: {}", e);
                    errors.push(CollaboratorFailure::new("ast_transformer", e));
                }
            }
        }

        (!analysis.is_empty()).then_some(Value::Object(analysis))
    }

    async fn persist(
        &self,
        phase: Phase,
        cycle_id: &str,
        primus: Option<&str>,
        outputs: &Map<String, Value>,
        revision: u32,
        errors: &mut Vec<CollaboratorFailure>,
    ) -> Option<String> {
        let metadata = json!({
            "type": "phase_result",
            "cycle_id": cycle_id,
            "primus": primus,
            "revision": revision,
        });
        match self
            .memory
            .store_with_edrr_phase(Value::Object(outputs.clone()), phase, metadata)
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Failed to store {} results: {}", phase, e);
                errors.push(CollaboratorFailure::new("memory.store", e));
                None
            }
        }
    }
}

impl std::fmt::Debug for EdrrCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdrrCoordinator")
            .field("cycle_id", &self.cycle_id())
            .field("phase", &self.current_phase())
            .field("depth", &self.depth)
            .field("parent_cycle_id", &self.parent_cycle_id)
            .field("team", &self.team)
            .finish_non_exhaustive()
    }
}

/// Quality reported by the phase's own operations, 0.0 when none
fn current_quality(outputs: &Map<String, Value>) -> f64 {
    outputs
        .values()
        .filter_map(|output| output.get("quality_score").and_then(Value::as_f64))
        .last()
        .unwrap_or(0.0)
}

fn code_under_refinement(task: &Task, outputs: &Map<String, Value>) -> String {
    let candidate = outputs
        .get(Operation::OptimizeImplementation.as_str())
        .or(task.solution.as_ref());
    match candidate {
        Some(Value::String(code)) => code.clone(),
        Some(value) => value
            .get("code")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PeerReviewSettings;
    use crate::ports::code_analysis::NoCodeAnalyzer;
    use crate::ports::memory::MemoryError;
    use crate::ports::peer_review::PeerReviewError;
    use crate::ports::team_operations::OperationError;
    use crate::use_cases::test_support::MockAgent;
    use async_trait::async_trait;
    use edrr_domain::{Agent, PeerReviewOutcome, TaskOption};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Operations that echo their name, failing each listed operation once
    struct MockOperations {
        fail_once: Mutex<Vec<Operation>>,
        calls: Mutex<Vec<(Operation, Phase, u32)>>,
    }

    impl MockOperations {
        fn new() -> Self {
            Self::failing_once(vec![])
        }

        fn failing_once(operations: Vec<Operation>) -> Self {
            Self {
                fail_once: Mutex::new(operations),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(Operation, Phase, u32)> {
            self.calls.lock().unwrap().clone()
        }

        fn count(&self, operation: Operation) -> usize {
            self.calls().iter().filter(|(op, _, _)| *op == operation).count()
        }
    }

    #[async_trait]
    impl TeamOperations for MockOperations {
        async fn run(
            &self,
            operation: Operation,
            context: &OperationContext,
        ) -> Result<Value, OperationError> {
            self.calls
                .lock()
                .unwrap()
                .push((operation, context.phase, context.revision));
            {
                let mut fail_once = self.fail_once.lock().unwrap();
                if let Some(index) = fail_once.iter().position(|op| *op == operation) {
                    fail_once.remove(index);
                    return Err(OperationError::Failed("scripted failure".to_string()));
                }
            }
            if operation == Operation::OptimizeImplementation {
                return Ok(json!({"code": "fn main() {}\n"}));
            }
            Ok(json!({
                "operation": operation.as_str(),
                "primus": context.primus,
                "revision": context.revision,
            }))
        }
    }

    struct FailingMemory;

    #[async_trait]
    impl MemoryPort for FailingMemory {
        async fn store_with_edrr_phase(
            &self,
            _item: Value,
            _phase: Phase,
            _metadata: Value,
        ) -> Result<String, MemoryError> {
            Err(MemoryError::Storage("disk full".to_string()))
        }

        async fn retrieve_with_edrr_phase(
            &self,
            _phase: Phase,
            _query: &Value,
        ) -> Result<Vec<Value>, MemoryError> {
            Err(MemoryError::Query("index missing".to_string()))
        }

        async fn flush_updates(&self) -> Result<(), MemoryError> {
            Err(MemoryError::Flush("read-only".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingMemory {
        items: Mutex<Vec<(Phase, Value, Value)>>,
        retrieved: Mutex<Vec<Phase>>,
    }

    impl RecordingMemory {
        fn retrieved(&self) -> Vec<Phase> {
            self.retrieved.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MemoryPort for RecordingMemory {
        async fn store_with_edrr_phase(
            &self,
            item: Value,
            phase: Phase,
            metadata: Value,
        ) -> Result<String, MemoryError> {
            let mut items = self.items.lock().unwrap();
            items.push((phase, item, metadata));
            Ok(format!("item-{}", items.len()))
        }

        async fn retrieve_with_edrr_phase(
            &self,
            phase: Phase,
            query: &Value,
        ) -> Result<Vec<Value>, MemoryError> {
            self.retrieved.lock().unwrap().push(phase);
            let items = self.items.lock().unwrap();
            Ok(items
                .iter()
                .filter(|(p, _, metadata)| {
                    *p == phase && metadata["cycle_id"] == query["cycle_id"]
                })
                .map(|(_, item, _)| item.clone())
                .collect())
        }

        async fn flush_updates(&self) -> Result<(), MemoryError> {
            Ok(())
        }
    }

    struct MockReviewer {
        outcomes: Mutex<VecDeque<PeerReviewOutcome>>,
        reviews: Mutex<usize>,
    }

    impl MockReviewer {
        fn new(outcomes: Vec<PeerReviewOutcome>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                reviews: Mutex::new(0),
            }
        }

        fn reviews(&self) -> usize {
            *self.reviews.lock().unwrap()
        }
    }

    #[async_trait]
    impl PeerReviewPort for MockReviewer {
        async fn run_peer_review(
            &self,
            _work_product: &WorkProduct,
            _memory: &dyn MemoryPort,
            _max_revision_cycles: u32,
        ) -> Result<PeerReviewOutcome, PeerReviewError> {
            *self.reviews.lock().unwrap() += 1;
            let mut outcomes = self.outcomes.lock().unwrap();
            let outcome = if outcomes.len() > 1 {
                outcomes.pop_front()
            } else {
                outcomes.front().cloned()
            };
            outcome.ok_or(PeerReviewError::NoReviewers)
        }
    }

    fn team() -> Team {
        let mut team = Team::new("core");
        let members = [
            ("alice", "exploration"),
            ("bob", "analysis"),
            ("carol", "implementation"),
            ("dave", "reflection"),
        ];
        for (name, expertise) in members {
            team.add_agent(
                Agent::new(name).with_expertise([expertise]).with_experience(5),
                Arc::new(MockAgent::replying(name, json!({"vote": "cache"}))),
            )
            .unwrap();
        }
        team
    }

    fn task() -> Task {
        Task::new("Speed up the report endpoint")
            .with_id("task-1")
            .with_options([
                TaskOption::new("cache", "Add a cache"),
                TaskOption::new("index", "Add an index"),
            ])
    }

    fn coordinator(config: CoordinatorConfig, operations: Arc<MockOperations>) -> EdrrCoordinator {
        EdrrCoordinator::new(team(), config).with_operations(operations)
    }

    fn review_settings(max_revision_cycles: u32) -> PeerReviewSettings {
        PeerReviewSettings {
            enabled: true,
            max_revision_cycles,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_auto_progress_runs_every_phase() {
        let operations = Arc::new(MockOperations::new());
        let mut coordinator = coordinator(
            CoordinatorConfig::default().with_auto_progress(true),
            operations.clone(),
        );

        let cycle_id = coordinator.start_cycle(task()).await.unwrap();
        assert_eq!(coordinator.cycle_id(), Some(cycle_id.as_str()));
        assert_eq!(coordinator.current_phase(), Some(Phase::Retrospect));
        assert_eq!(operations.calls().len(), 8);

        let report = coordinator.generate_report().await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.phase_results.len(), 4);
        assert_eq!(report.execution_history.len(), 4);
        assert!(report.errors.is_empty());
        assert_eq!(report.depth, 0);
    }

    #[tokio::test]
    async fn test_each_phase_has_its_own_primus() {
        let mut coordinator = coordinator(
            CoordinatorConfig::default().with_auto_progress(true),
            Arc::new(MockOperations::new()),
        );
        coordinator.start_cycle(task()).await.unwrap();

        let expected = [
            (Phase::Expand, "alice"),
            (Phase::Differentiate, "bob"),
            (Phase::Refine, "carol"),
            (Phase::Retrospect, "dave"),
        ];
        for (phase, name) in expected {
            let result = coordinator.phase_result(phase).unwrap();
            assert_eq!(result.primus.as_deref(), Some(name), "phase {}", phase);
        }
    }

    #[tokio::test]
    async fn test_operations_see_earlier_outputs_of_the_phase() {
        let operations = Arc::new(MockOperations::new());
        let mut coordinator = coordinator(CoordinatorConfig::default(), operations.clone());
        coordinator.start_cycle(task()).await.unwrap();

        let result = coordinator.progress_to_phase(Phase::Differentiate).await.unwrap();
        let keys: Vec<&String> = result.outputs.keys().collect();
        assert_eq!(keys, ["evaluate_options", "select_best_option"]);
    }

    #[tokio::test]
    async fn test_prior_results_come_from_earlier_phases_of_the_cycle() {
        let memory = Arc::new(RecordingMemory::default());
        memory
            .store_with_edrr_phase(
                json!({"generate_diverse_ideas": "from another cycle"}),
                Phase::Expand,
                json!({"type": "phase_result", "cycle_id": "other-cycle"}),
            )
            .await
            .unwrap();
        let mut coordinator = coordinator(
            CoordinatorConfig::default(),
            Arc::new(MockOperations::new()),
        )
        .with_memory(memory.clone());
        coordinator.start_cycle(task()).await.unwrap();

        let differentiate = coordinator
            .progress_to_phase(Phase::Differentiate)
            .await
            .unwrap();
        assert!(coordinator.phase_result(Phase::Expand).unwrap().prior_results.is_empty());
        assert_eq!(differentiate.prior_results.len(), 1);
        let expand = &differentiate.prior_results[0];
        assert_eq!(expand["phase"], "EXPAND");
        let ideas: Vec<&Value> = expand["results"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|r| r.get("generate_diverse_ideas"))
            .collect();
        assert_eq!(ideas.len(), 1);
        assert_eq!(ideas[0]["operation"], "generate_diverse_ideas");

        let refine = coordinator.progress_to_phase(Phase::Refine).await.unwrap();
        let phases: Vec<&str> = refine
            .prior_results
            .iter()
            .filter_map(|p| p["phase"].as_str())
            .collect();
        assert_eq!(phases, ["EXPAND", "DIFFERENTIATE"]);
        let differentiate_results = &refine.prior_results[1]["results"][0];
        assert!(differentiate_results.get("select_best_option").is_some());

        assert_eq!(
            memory.retrieved(),
            [Phase::Expand, Phase::Expand, Phase::Differentiate]
        );
    }

    #[tokio::test]
    async fn test_invalid_task_and_missing_cycle() {
        let mut coordinator = coordinator(
            CoordinatorConfig::default(),
            Arc::new(MockOperations::new()),
        );

        assert!(matches!(
            coordinator.execute_current_phase().await,
            Err(CoordinatorError::NoActiveCycle)
        ));
        assert!(matches!(
            coordinator.start_cycle(Task::new("   ")).await,
            Err(CoordinatorError::InvalidTask(_))
        ));
        assert!(coordinator.cycle_id().is_none());
    }

    #[tokio::test]
    async fn test_empty_team_is_rejected() {
        let mut coordinator =
            EdrrCoordinator::new(Team::new("empty"), CoordinatorConfig::default());
        let error = coordinator.start_cycle(task()).await.unwrap_err();
        assert!(matches!(error, CoordinatorError::Domain(DomainError::EmptyTeam)));
    }

    #[tokio::test]
    async fn test_primary_failure_keeps_phase_and_can_be_retried() {
        let operations = Arc::new(MockOperations::failing_once(vec![Operation::EvaluateOptions]));
        let mut coordinator = coordinator(CoordinatorConfig::default(), operations.clone());
        coordinator.start_cycle(task()).await.unwrap();

        let error = coordinator
            .progress_to_phase(Phase::Differentiate)
            .await
            .unwrap_err();
        match error {
            CoordinatorError::PrimaryOperation { phase, operation, .. } => {
                assert_eq!(phase, Phase::Differentiate);
                assert_eq!(operation, Operation::EvaluateOptions);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(coordinator.current_phase(), Some(Phase::Differentiate));
        assert!(coordinator.phase_result(Phase::Differentiate).is_none());
        assert!(coordinator.phase_result(Phase::Expand).is_some());

        coordinator.progress_to_phase(Phase::Differentiate).await.unwrap();
        assert_eq!(operations.count(Operation::GenerateDiverseIdeas), 1);
        assert_eq!(operations.count(Operation::EvaluateOptions), 2);

        let report = coordinator.generate_report().await.unwrap();
        let statuses: Vec<ExecutionStatus> =
            report.execution_history.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            [
                ExecutionStatus::Completed,
                ExecutionStatus::Failed,
                ExecutionStatus::Completed
            ]
        );
    }

    #[tokio::test]
    async fn test_skipping_ahead_runs_intermediate_phases() {
        let operations = Arc::new(MockOperations::new());
        let mut coordinator = coordinator(CoordinatorConfig::default(), operations.clone());
        coordinator.start_cycle(task()).await.unwrap();

        coordinator.progress_to_phase(Phase::Refine).await.unwrap();
        assert!(coordinator.phase_result(Phase::Expand).is_some());
        assert!(coordinator.phase_result(Phase::Differentiate).is_some());
        assert_eq!(coordinator.current_phase(), Some(Phase::Refine));
        assert_eq!(operations.calls().len(), 7);

        // Asking again returns the stored result
        coordinator.progress_to_phase(Phase::Refine).await.unwrap();
        assert_eq!(operations.calls().len(), 7);
    }

    #[tokio::test]
    async fn test_progress_to_next_phase_stops_after_retrospect() {
        let mut coordinator = coordinator(
            CoordinatorConfig::default(),
            Arc::new(MockOperations::new()),
        );
        coordinator.start_cycle(task()).await.unwrap();

        let mut phases = Vec::new();
        while let Some(result) = coordinator.progress_to_next_phase().await.unwrap() {
            phases.push(result.phase);
        }
        assert_eq!(
            phases,
            [
                Phase::Differentiate,
                Phase::Refine,
                Phase::Retrospect
            ]
        );
        // EXPAND ran implicitly on the way to DIFFERENTIATE
        assert!(coordinator.phase_result(Phase::Expand).is_some());
    }

    #[tokio::test]
    async fn test_memory_failures_are_not_fatal() {
        let mut coordinator = coordinator(
            CoordinatorConfig::default().with_auto_progress(true),
            Arc::new(MockOperations::new()),
        )
        .with_memory(Arc::new(FailingMemory));
        coordinator.start_cycle(task()).await.unwrap();

        let expand = coordinator.phase_result(Phase::Expand).unwrap();
        let collaborators: Vec<&str> = expand
            .errors
            .iter()
            .map(|e| e.collaborator.as_str())
            .collect();
        assert_eq!(collaborators, ["memory.store"]);
        assert!(expand.memory_id.is_none());

        let refine = coordinator.phase_result(Phase::Refine).unwrap();
        let retrieves = refine
            .errors
            .iter()
            .filter(|e| e.collaborator == "memory.retrieve")
            .count();
        assert_eq!(retrieves, 2);
        assert!(refine.prior_results.is_empty());

        let retrospect = coordinator.phase_result(Phase::Retrospect).unwrap();
        assert!(retrospect.errors.iter().any(|e| e.collaborator == "memory.flush"));

        let report = coordinator.generate_report().await.unwrap();
        assert!(report.is_complete());
        // Task store, 0 + 1 + 2 + 3 retrieves, four stores, the RETROSPECT flush
        // and the report flush
        assert_eq!(report.errors.len(), 13);
    }

    #[tokio::test]
    async fn test_peer_review_revisions_are_bounded() {
        let operations = Arc::new(MockOperations::new());
        let reviewer = Arc::new(MockReviewer::new(vec![PeerReviewOutcome::revision_requested(
            "review-1",
            0.4,
            vec!["Handle timeouts".to_string()],
        )]));
        let mut coordinator = coordinator(
            CoordinatorConfig::default().with_peer_review(review_settings(2)),
            operations.clone(),
        )
        .with_peer_review(reviewer.clone());
        coordinator.start_cycle(task()).await.unwrap();

        let result = coordinator.progress_to_phase(Phase::Refine).await.unwrap();
        assert_eq!(reviewer.reviews(), 3);
        assert_eq!(result.revision_cycles, 2);
        assert!(result.needs_more_work);
        assert_eq!(operations.count(Operation::ElaborateDetails), 3);
        assert_eq!(result.outputs["elaborate_details"]["revision"], 2);

        // EXPAND and DIFFERENTIATE are not reviewed
        assert!(coordinator.phase_result(Phase::Expand).unwrap().peer_review.is_none());
    }

    #[tokio::test]
    async fn test_peer_review_approval_ends_revisions() {
        let reviewer = Arc::new(MockReviewer::new(vec![
            PeerReviewOutcome::revision_requested("review-1", 0.4, vec!["Add tests".to_string()]),
            PeerReviewOutcome::approved("review-2", 0.9),
        ]));
        let mut coordinator = coordinator(
            CoordinatorConfig::default().with_peer_review(review_settings(3)),
            Arc::new(MockOperations::new()),
        )
        .with_peer_review(reviewer.clone());
        coordinator.start_cycle(task()).await.unwrap();

        let result = coordinator.progress_to_phase(Phase::Refine).await.unwrap();
        assert_eq!(reviewer.reviews(), 2);
        assert_eq!(result.revision_cycles, 1);
        assert!(!result.needs_more_work);
        // 0.7 * (0.7 * 0.0 + 0.3 * 0.4) + 0.3 * 0.9
        let quality = result.quality_score.unwrap();
        assert!((quality - 0.354).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_refine_output_is_analyzed() {
        let mut coordinator = coordinator(
            CoordinatorConfig::default(),
            Arc::new(MockOperations::new()),
        )
        .with_code_analyzer(Arc::new(NoCodeAnalyzer))
        .with_ast_transformer(Arc::new(NoCodeAnalyzer));
        coordinator.start_cycle(task()).await.unwrap();

        let differentiate = coordinator.progress_to_phase(Phase::Differentiate).await.unwrap();
        assert!(differentiate.analysis.is_none());

        let refine = coordinator.progress_to_phase(Phase::Refine).await.unwrap();
        let analysis = refine.analysis.unwrap();
        assert_eq!(analysis["code_analysis"]["lines"], 1);
        assert_eq!(analysis["transformed_code"], "fn main() {}\n");
    }

    #[tokio::test]
    async fn test_micro_cycle_depth_and_limit() {
        let mut coordinator = coordinator(
            CoordinatorConfig::default().with_max_recursion_depth(1),
            Arc::new(MockOperations::new()),
        );
        let parent_id = coordinator.start_cycle(task()).await.unwrap();

        let mut child = coordinator
            .create_micro_cycle(Task::new("Pick cache keys"), Phase::Refine)
            .await
            .unwrap();
        assert_eq!(child.depth(), 1);
        assert_eq!(child.parent_cycle_id(), Some(parent_id.as_str()));
        assert_ne!(child.cycle_id(), Some(parent_id.as_str()));
        let described = format!("{:?}", child);
        assert!(described.contains("depth: 1"));
        assert!(described.contains(&parent_id));

        let error = child
            .create_micro_cycle(Task::new("Name the keys"), Phase::Expand)
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            CoordinatorError::RecursionLimit { depth: 2, max: 1 }
        ));

        let report = coordinator.generate_report().await.unwrap();
        assert_eq!(report.micro_cycles.len(), 1);
        assert_eq!(report.micro_cycles[0].parent_phase, Phase::Refine);
    }

    #[tokio::test]
    async fn test_recursion_termination_rules() {
        let mut coordinator = coordinator(
            CoordinatorConfig::default(),
            Arc::new(MockOperations::new()),
        );
        coordinator.start_cycle(task()).await.unwrap();

        let mut fine_grained = Task::new("Rename a variable");
        fine_grained.granularity_score = Some(0.1);
        assert!(matches!(
            coordinator.create_micro_cycle(fine_grained.clone(), Phase::Refine).await,
            Err(CoordinatorError::RecursionTerminated(_))
        ));

        let mut overridden = fine_grained.clone();
        overridden.human_override = Some("continue".to_string());
        assert!(coordinator.recursion_stop_reason(&overridden).is_none());

        let mut stopped = Task::new("Anything");
        stopped.human_override = Some("terminate".to_string());
        assert_eq!(
            coordinator.recursion_stop_reason(&stopped).as_deref(),
            Some("human override")
        );

        let mut costly = Task::new("Rewrite the storage layer");
        costly.extra.insert("cost_score".to_string(), json!(0.8));
        costly.extra.insert("benefit_score".to_string(), json!(0.4));
        assert!(coordinator.recursion_stop_reason(&costly).is_some());

        let mut polished = Task::new("Tidy the docs");
        polished.extra.insert("quality_score".to_string(), json!(0.9));
        assert!(
            coordinator
                .recursion_stop_reason(&polished)
                .is_some_and(|reason| reason.contains("at or above"))
        );
        polished.extra.insert("quality_score".to_string(), json!(0.89));
        assert!(coordinator.recursion_stop_reason(&polished).is_none());

        let mut busy = Task::new("Profile queries");
        busy.extra.insert("resource_usage".to_string(), json!(0.95));
        assert!(coordinator.recursion_stop_reason(&busy).is_some());

        assert!(coordinator.recursion_stop_reason(&Task::new("Plain")).is_none());
    }

    #[tokio::test]
    async fn test_hold_vote_is_reported() {
        let mut coordinator = coordinator(
            CoordinatorConfig::default(),
            Arc::new(MockOperations::new()),
        );
        coordinator.start_cycle(task()).await.unwrap();

        let vote = coordinator.hold_vote().await.unwrap();
        assert_eq!(vote.selected_option.id, "cache");

        let report = coordinator.generate_report().await.unwrap();
        assert_eq!(report.votes.len(), 1);
        assert_eq!(coordinator.team().voting_history("task-1").len(), 1);
    }

    #[tokio::test]
    async fn test_delegation_and_progress() {
        let mut coordinator = coordinator(
            CoordinatorConfig::default(),
            Arc::new(MockOperations::new()),
        );
        let task = task().with_required_expertise(["analysis", "implementation"]);
        coordinator.start_cycle(task).await.unwrap();

        let assignments = coordinator.delegate_subtasks(None).unwrap();
        let agents: Vec<&str> = assignments.iter().map(|a| a.agent.as_str()).collect();
        assert_eq!(agents, ["bob", "carol"]);

        let id = assignments[0].subtask_id.clone();
        assert_eq!(coordinator.update_subtask_progress(&id, 0.5).unwrap(), 0.5);
        assert!(coordinator.update_subtask_progress("missing", 0.5).is_err());
        assert!(coordinator.rebalance_subtasks().unwrap().is_empty());

        let report = coordinator.generate_report().await.unwrap();
        assert_eq!(report.subtasks.len(), 2);
        assert!(report.subtasks.iter().all(|s| s.parent_id.as_deref() == Some("task-1")));
    }

    #[tokio::test]
    async fn test_reasoning_loop_is_recorded_under_the_phase() {
        let mut coordinator = coordinator(
            CoordinatorConfig::default(),
            Arc::new(MockOperations::new()),
        );
        coordinator.start_cycle(task()).await.unwrap();
        coordinator.progress_to_phase(Phase::Refine).await.unwrap();

        let critic = MockAgent::replying("critic", json!({"critiques": []}));
        let results = coordinator.run_reasoning_loop(&critic).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(coordinator.task().unwrap().solution.is_some());

        let report = coordinator.generate_report().await.unwrap();
        assert_eq!(report.dialectical_records.refine.len(), 1);
        assert!(report.dialectical_records.expand.is_empty());
    }

    #[tokio::test]
    async fn test_events_are_logged() {
        struct Collect(Mutex<Vec<&'static str>>);
        impl EventLogger for Collect {
            fn log(&self, event: CycleEvent) {
                self.0.lock().unwrap().push(event.event_type);
            }
        }

        let events = Arc::new(Collect(Mutex::new(Vec::new())));
        let mut coordinator = coordinator(
            CoordinatorConfig::default(),
            Arc::new(MockOperations::new()),
        )
        .with_event_logger(events.clone());
        coordinator.start_cycle(task()).await.unwrap();
        coordinator.execute_current_phase().await.unwrap();
        coordinator.hold_vote().await.unwrap();
        coordinator.generate_report().await.unwrap();

        assert_eq!(
            *events.0.lock().unwrap(),
            ["cycle_started", "phase_completed", "vote_completed", "report_generated"]
        );
    }
}
