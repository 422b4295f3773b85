//! Reasoning loop configuration from TOML (`[reasoning]` section)

use edrr_application::ReasoningLoopParams;
use edrr_domain::config::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw reasoning loop configuration
///
/// # Example
///
/// ```toml
/// [reasoning]
/// max_iterations = 3
/// seed = 42                 # optional, reseeds every team PRNG once per run
/// max_total_seconds = 60    # optional wall-clock budget
/// retry_attempts = 2
/// retry_backoff_ms = 100
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileReasoningConfig {
    pub max_iterations: usize,
    pub seed: Option<u64>,
    pub max_total_seconds: Option<f64>,
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for FileReasoningConfig {
    fn default() -> Self {
        let params = ReasoningLoopParams::default();
        Self {
            max_iterations: params.max_iterations,
            seed: params.deterministic_seed,
            max_total_seconds: params.max_total_duration.map(|d| d.as_secs_f64()),
            retry_attempts: params.retry_attempts,
            retry_backoff_ms: params.retry_backoff.as_millis() as u64,
        }
    }
}

impl FileReasoningConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.max_iterations == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::InvalidConstraint {
                    field: "reasoning.max_iterations".to_string(),
                },
                "reasoning.max_iterations is 0; the reasoning loop will not run",
            ));
        }
        if let Some(seconds) = self.max_total_seconds
            && seconds <= 0.0
        {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidConstraint {
                    field: "reasoning.max_total_seconds".to_string(),
                },
                "reasoning.max_total_seconds must be positive",
            ));
        }
        issues
    }

    pub fn to_params(&self) -> ReasoningLoopParams {
        let mut params = ReasoningLoopParams::default()
            .with_max_iterations(self.max_iterations)
            .with_retry(
                self.retry_attempts,
                Duration::from_millis(self.retry_backoff_ms),
            );
        if let Some(seed) = self.seed {
            params = params.with_seed(seed);
        }
        if let Some(seconds) = self.max_total_seconds
            && seconds > 0.0
        {
            params = params.with_max_total_duration(Duration::from_secs_f64(seconds));
        }
        params
    }
}
