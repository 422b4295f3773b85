//! Dialectical reasoning loop
//!
//! Repeats thesis / antithesis / synthesis steps over a task's solution until
//! a step reports `completed`, the iteration limit is reached or the time
//! budget runs out. Each synthesis becomes the next iteration's solution.

use crate::config::ReasoningLoopParams;
use crate::ports::agent::AgentPort;
use crate::ports::dialectical::{DialecticalReasoner, PhaseRecorder, ReasonerError, ReasoningOutput};
use crate::ports::memory::MemoryPort;
use crate::team::Team;
use edrr_domain::{DialecticalSequence, Phase, Task};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone)]
pub enum ReasoningLoopError {
    #[error("Reasoning failed: {0}")]
    Reasoner(#[from] ReasonerError),
}

/// Why an iteration produced nothing
enum Stop {
    GaveUp(ReasonerError),
    OutOfTime,
    Fatal(ReasonerError),
}

pub struct DialecticalReasoningLoop {
    reasoner: Arc<dyn DialecticalReasoner>,
}

impl DialecticalReasoningLoop {
    pub fn new(reasoner: Arc<dyn DialecticalReasoner>) -> Self {
        Self { reasoner }
    }

    /// Run the loop and return one sequence per completed iteration
    ///
    /// `task.solution` is updated in place. Transient reasoner errors are
    /// retried; once retries or time run out the results gathered so far are
    /// returned. Any other reasoner error is returned as an error.
    pub async fn run(
        &self,
        team: &Team,
        task: &mut Task,
        critic: &dyn AgentPort,
        memory: Option<&dyn MemoryPort>,
        recorder: Option<&dyn PhaseRecorder>,
        params: &ReasoningLoopParams,
    ) -> Result<Vec<DialecticalSequence>, ReasoningLoopError> {
        if let Some(seed) = params.deterministic_seed {
            debug!("Seeding {} PRNG handle(s) with {}", team.seedables().len(), seed);
            for seedable in team.seedables() {
                seedable.seed(seed);
            }
        }

        let started = Instant::now();
        let mut phase = params.phase;
        let mut results = Vec::new();

        for iteration in 1..=params.max_iterations {
            if over_budget(started, params.max_total_duration, Duration::ZERO) {
                info!(
                    "Reasoning time budget exhausted after {} iteration(s)",
                    results.len()
                );
                break;
            }

            debug!("Reasoning iteration {} in {}", iteration, phase);
            let output = match self
                .reason_with_retry(team, task, critic, memory, params, started)
                .await
            {
                Ok(output) => output,
                Err(Stop::GaveUp(e)) => {
                    warn!("Giving up after retries: {}", e);
                    break;
                }
                Err(Stop::OutOfTime) => {
                    info!("Reasoning time budget would be exceeded by a retry; stopping");
                    break;
                }
                Err(Stop::Fatal(e)) => return Err(e.into()),
            };

            let result = output.into_sequence()?;
            let effective = result.effective_phase(phase);
            if let Some(recorder) = recorder {
                record(recorder, effective, &result);
            }

            for hook in team.dialectical_hooks() {
                hook.on_iteration(task, std::slice::from_ref(&result));
            }

            if let Some(solution) = result.solution_for_next() {
                task.solution = Some(solution);
            }

            phase = result.next_phase_or_fallback(effective);
            let completed = result.is_completed();
            results.push(result);
            if completed {
                info!("Reasoning converged after {} iteration(s)", iteration);
                break;
            }
        }

        Ok(results)
    }

    async fn reason_with_retry(
        &self,
        team: &Team,
        task: &Task,
        critic: &dyn AgentPort,
        memory: Option<&dyn MemoryPort>,
        params: &ReasoningLoopParams,
        started: Instant,
    ) -> Result<ReasoningOutput, Stop> {
        let mut attempt = 0;
        loop {
            match self
                .reasoner
                .apply_dialectical_reasoning(team, task, critic, memory)
                .await
            {
                Ok(output) => return Ok(output),
                Err(e) if !e.is_transient() => return Err(Stop::Fatal(e)),
                Err(e) if attempt >= params.retry_attempts => return Err(Stop::GaveUp(e)),
                Err(e) => {
                    if over_budget(started, params.max_total_duration, params.retry_backoff) {
                        return Err(Stop::OutOfTime);
                    }
                    attempt += 1;
                    debug!(
                        "Transient reasoning error (attempt {}/{}): {}",
                        attempt, params.retry_attempts, e
                    );
                    tokio::time::sleep(params.retry_backoff).await;
                }
            }
        }
    }
}

fn over_budget(started: Instant, budget: Option<Duration>, extra: Duration) -> bool {
    budget.is_some_and(|budget| started.elapsed() + extra >= budget)
}

fn record(recorder: &dyn PhaseRecorder, phase: Phase, result: &DialecticalSequence) {
    match phase {
        Phase::Expand => recorder.record_expand_results(result),
        Phase::Differentiate => recorder.record_differentiate_results(result),
        Phase::Refine | Phase::Retrospect => recorder.record_refine_results(result),
    }
}
