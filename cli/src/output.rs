//! Console output for cycle reports

use colored::Colorize;
use edrr_application::CycleReport;
use edrr_domain::Phase;
use serde_json::Value;

/// Formats cycle reports for console display
pub struct ReportFormatter;

impl ReportFormatter {
    /// Phase-by-phase summary of the report
    pub fn format(report: &CycleReport) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("EDRR Cycle Report"));
        output.push('\n');

        output.push_str(&format!("{} {}\n", "Task:".cyan().bold(), report.task.label()));
        output.push_str(&format!("{} {}\n", "Cycle:".cyan().bold(), report.cycle_id));
        if report.depth > 0 {
            output.push_str(&format!("{} {}\n", "Depth:".cyan().bold(), report.depth));
        }

        output.push_str(&Self::section_header("Phases"));
        for phase in Phase::ALL {
            let Some(result) = report.phase_results.get(&phase) else {
                output.push_str(&format!("  {} {}\n", "-".dimmed(), phase.display_name().dimmed()));
                continue;
            };
            let mut line = format!(
                "  {} {:<14} primus: {}",
                "v".green(),
                phase.display_name(),
                result.primus.as_deref().unwrap_or("none")
            );
            if let Some(quality) = result.quality_score {
                line.push_str(&format!(", quality {:.2}", quality));
            }
            if result.revision_cycles > 0 {
                line.push_str(&format!(", {} revision(s)", result.revision_cycles));
            }
            if !result.errors.is_empty() {
                let errors = format!("{} error(s)", result.errors.len());
                line.push_str(&format!(", {}", errors.yellow()));
            }
            output.push_str(&line);
            output.push('\n');
        }

        if !report.votes.is_empty() {
            output.push_str(&Self::section_header("Votes"));
            for vote in &report.votes {
                let tie = if vote.is_tie() { " (tie broken)" } else { "" };
                output.push_str(&format!(
                    "  {} {}{}, turnout {:.0}%\n",
                    "Selected:".bold(),
                    vote.selected_option.name.green(),
                    tie,
                    vote.turnout * 100.0
                ));
                for (option, score) in &vote.option_scores {
                    output.push_str(&format!("    {:<16} {:.2}\n", option, score));
                }
                output.push_str(&format!("  {}\n", vote.explanation.dimmed()));
            }
        }

        if !report.assignments.is_empty() {
            output.push_str(&Self::section_header("Assignments"));
            for assignment in &report.assignments {
                output.push_str(&format!(
                    "  {} -> {} (score {:.1})\n",
                    assignment.subtask_id, assignment.agent, assignment.expertise_score
                ));
            }
        }

        let sequences = report.dialectical_records.len();
        if sequences > 0 {
            output.push_str(&Self::section_header("Reasoning"));
            output.push_str(&format!("  {} dialectical sequence(s) recorded\n", sequences));
        }
        if let Some(solution) = &report.task.solution {
            output.push_str(&format!("\n{}\n", "Solution:".cyan().bold()));
            output.push_str(&Self::indent(&Self::render_value(solution), "  "));
            output.push('\n');
        }

        if !report.errors.is_empty() {
            output.push_str(&Self::section_header("Errors"));
            for error in &report.errors {
                output.push_str(&format!(
                    "  {} {}: {}\n",
                    "x".red(),
                    error.collaborator,
                    error.message
                ));
            }
        }

        output.push_str(&Self::footer());
        output
    }

    /// Full report as pretty JSON
    pub fn format_json(report: &CycleReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    fn render_value(value: &Value) -> String {
        match value {
            Value::String(text) => text.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_default(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
