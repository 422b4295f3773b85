//! Loop control for the dialectical reasoning loop.

use edrr_domain::Phase;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reasoning loop control parameters.
///
/// Controls the starting phase, iteration limit, seeding, time budget and
/// retry policy of one
/// [`DialecticalReasoningLoop`](crate::use_cases::reasoning_loop::DialecticalReasoningLoop) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningLoopParams {
    /// Phase the first iteration is tracked under
    pub phase: Phase,
    pub max_iterations: usize,
    /// Reseed every registered PRNG handle once before the first iteration
    pub deterministic_seed: Option<u64>,
    /// Wall-clock budget for the whole run, including retries
    pub max_total_duration: Option<Duration>,
    /// Retries per iteration for transient reasoner errors
    pub retry_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for ReasoningLoopParams {
    fn default() -> Self {
        Self {
            phase: Phase::Refine,
            max_iterations: 3,
            deterministic_seed: None,
            max_total_duration: None,
            retry_attempts: 2,
            retry_backoff: Duration::from_millis(100),
        }
    }
}

impl ReasoningLoopParams {
    // ==================== Builder Methods ====================

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.deterministic_seed = Some(seed);
        self
    }

    pub fn with_max_total_duration(mut self, budget: Duration) -> Self {
        self.max_total_duration = Some(budget);
        self
    }

    pub fn with_retry(mut self, attempts: u32, backoff: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_backoff = backoff;
        self
    }
}
