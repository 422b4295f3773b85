//! Phase progress on the terminal

use colored::Colorize;
use edrr_application::CycleProgressNotifier;
use edrr_domain::{PeerReviewOutcome, Phase};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Spinner per phase, finished with the phase's error count
pub struct ProgressReporter {
    phase_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            phase_bar: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn phase_label(phase: Phase) -> String {
        let index = Phase::ALL.iter().position(|p| *p == phase).unwrap_or(0) + 1;
        format!("Phase {}: {}", index, phase.display_name())
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleProgressNotifier for ProgressReporter {
    fn on_phase_start(&self, phase: Phase, primus: Option<&str>) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_prefix(Self::phase_label(phase));
        pb.set_message(match primus {
            Some(name) => format!("led by {}", name),
            None => "starting...".to_string(),
        });
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut slot) = self.phase_bar.lock() {
            if let Some(previous) = slot.replace(pb) {
                previous.finish_and_clear();
            }
        }
    }

    fn on_phase_complete(&self, phase: Phase, errors: usize) {
        let Ok(mut slot) = self.phase_bar.lock() else {
            return;
        };
        if let Some(pb) = slot.take() {
            let status = if errors == 0 {
                format!("{} complete", phase.display_name()).green().to_string()
            } else {
                format!("{} complete ({} errors)", phase.display_name(), errors)
                    .yellow()
                    .to_string()
            };
            pb.finish_with_message(status);
        }
    }

    fn on_review(&self, _phase: Phase, outcome: &PeerReviewOutcome) {
        if let Ok(slot) = self.phase_bar.lock() {
            if let Some(pb) = slot.as_ref() {
                pb.set_message(format!(
                    "review {} ({:.2})",
                    outcome.status.as_str(),
                    outcome.quality_score
                ));
            }
        }
    }
}

/// Plain line-per-phase progress for non-interactive output
pub struct SimpleProgress;

impl CycleProgressNotifier for SimpleProgress {
    fn on_phase_start(&self, phase: Phase, primus: Option<&str>) {
        eprintln!(
            "{} {} (primus: {})",
            "->".cyan(),
            ProgressReporter::phase_label(phase).bold(),
            primus.unwrap_or("none")
        );
    }

    fn on_phase_complete(&self, _phase: Phase, errors: usize) {
        if errors > 0 {
            eprintln!("  {} {} non-fatal error(s)", "!".yellow(), errors);
        }
    }
}
