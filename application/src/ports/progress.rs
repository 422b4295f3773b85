//! Progress notification port
//!
//! Defines the interface for reporting progress while a cycle runs.

use edrr_domain::{PeerReviewOutcome, Phase};

/// Callback for progress updates during an EDRR cycle
///
/// Implementations live in the binary and can display progress however they
/// like.
pub trait CycleProgressNotifier: Send + Sync {
    /// Called when a phase starts
    fn on_phase_start(&self, phase: Phase, primus: Option<&str>);

    /// Called when a phase completes, with the number of non-fatal errors
    fn on_phase_complete(&self, phase: Phase, errors: usize);

    /// Called for each peer review round
    fn on_review(&self, _phase: Phase, _outcome: &PeerReviewOutcome) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl CycleProgressNotifier for NoProgress {
    fn on_phase_start(&self, _phase: Phase, _primus: Option<&str>) {}
    fn on_phase_complete(&self, _phase: Phase, _errors: usize) {}
}
