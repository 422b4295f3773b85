//! CLI entrypoint for edrr-quorum
//!
//! Wires the configuration, the simulated team and the infrastructure
//! adapters into an [`EdrrCoordinator`] and drives one full cycle.

mod cli;
mod output;
mod progress;
mod team;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, OutputFormat};
use colored::Colorize;
use edrr_application::{
    CoordinatorConfig, CycleProgressNotifier, CycleReport, EdrrCoordinator, NoCodeAnalyzer,
    NoProgress, Seedable, Team,
};
use edrr_domain::{Phase, Severity, Task, TaskOption};
use edrr_infrastructure::{
    AutoApprovePeerReview, ConfigLoader, FileConfig, InMemoryMemoryStore, JsonlEventLogger,
};
use output::ReportFormatter;
use progress::{ProgressReporter, SimpleProgress};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use team::Member;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.verbose, cli.log_dir.as_deref());

    info!("Starting edrr-quorum");

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow::anyhow!("failed to load configuration: {}", e))?
    };
    check_config(&config)?;

    let Some(task) = load_task(&cli)? else {
        bail!("A task is required. Pass a description or use --task-file.");
    };

    let (mut team, members) = team::build_team(&config)?;
    let mut coordinator_config = config.to_coordinator_config().with_auto_progress(false);
    if let Some(seed) = cli.seed {
        coordinator_config.reasoning = coordinator_config.reasoning.with_seed(seed);
        for seedable in team.seedables() {
            seedable.seed(seed);
        }
    }

    let progress: Arc<dyn CycleProgressNotifier> = if cli.quiet {
        Arc::new(NoProgress)
    } else if std::io::stderr().is_terminal() {
        Arc::new(ProgressReporter::new())
    } else {
        Arc::new(SimpleProgress)
    };

    let mut coordinator = build_coordinator(team, coordinator_config, &cli, &config, progress);
    let report = run_cycle(&mut coordinator, &members, task).await?;

    let output = match cli.output {
        OutputFormat::Summary => ReportFormatter::format(&report),
        OutputFormat::Json => ReportFormatter::format_json(&report),
    };
    println!("{}", output);

    Ok(())
}

/// Console subscriber filtered by verbosity, plus a daily file log when asked
fn init_tracing(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "edrr-quorum.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(EnvFilter::new(level))
                .with(console)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(EnvFilter::new(level))
                .with(console)
                .init();
            None
        }
    }
}

/// Print configuration warnings; refuse to run on errors
fn check_config(config: &FileConfig) -> Result<()> {
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            Severity::Warning => eprintln!("{} {}", "warning:".yellow().bold(), issue.message),
            Severity::Error => eprintln!("{} {}", "error:".red().bold(), issue.message),
        }
    }
    if issues.iter().any(|issue| issue.is_error()) {
        bail!("configuration has errors; fix them or run with --no-config");
    }
    Ok(())
}

/// Task from `--task-file`, or from the positional description and flags
fn load_task(cli: &Cli) -> Result<Option<Task>> {
    if let Some(path) = &cli.task_file {
        return read_task_file(path).map(Some);
    }
    let Some(description) = &cli.task else {
        return Ok(None);
    };

    let options = cli
        .options
        .iter()
        .map(|name| TaskOption::new(option_id(name), name.as_str()));
    let mut task = Task::new(description.as_str()).with_options(options);
    if !cli.required_expertise.is_empty() {
        task = task.with_required_expertise(&cli.required_expertise);
    }
    Ok(Some(task))
}

fn read_task_file(path: &PathBuf) -> Result<Task> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read task file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid task JSON in {}", path.display()))
}

/// Lower-case, dash-separated id for an option name
fn option_id(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

fn build_coordinator(
    team: Team,
    config: CoordinatorConfig,
    cli: &Cli,
    file_config: &FileConfig,
    progress: Arc<dyn CycleProgressNotifier>,
) -> EdrrCoordinator {
    let mut coordinator = EdrrCoordinator::new(team, config)
        .with_memory(Arc::new(InMemoryMemoryStore::new()))
        .with_peer_review(Arc::new(AutoApprovePeerReview::default()))
        .with_code_analyzer(Arc::new(NoCodeAnalyzer))
        .with_ast_transformer(Arc::new(NoCodeAnalyzer))
        .with_progress(progress);

    let event_log = cli
        .event_log
        .clone()
        .or_else(|| file_config.logging.event_log_path());
    if let Some(path) = event_log {
        match JsonlEventLogger::new(&path) {
            Some(logger) => coordinator = coordinator.with_event_logger(Arc::new(logger)),
            None => warn!("Event log disabled: cannot open {}", path.display()),
        }
    }
    coordinator
}

/// One cycle: vote in DIFFERENTIATE, delegate, reason in REFINE, report
async fn run_cycle(
    coordinator: &mut EdrrCoordinator,
    members: &[Member],
    task: Task,
) -> Result<CycleReport> {
    coordinator.start_cycle(task).await?;
    coordinator.execute_current_phase().await?;
    coordinator.progress_to_phase(Phase::Differentiate).await?;

    let task = coordinator
        .task()
        .cloned()
        .context("cycle has no task")?;
    if !task.options.is_empty() {
        team::seed_opinions(coordinator.team_mut(), members, &task);
        let vote = coordinator.hold_vote().await?;
        info!("Vote selected '{}'", vote.selected_option.name);
    }

    let has_requirements = task
        .required_expertise
        .as_ref()
        .is_some_and(|expertise| !expertise.is_empty());
    if has_requirements {
        match coordinator.delegate_subtasks(None) {
            Ok(assignments) => info!("Delegated {} subtask(s)", assignments.len()),
            Err(e) => warn!("Delegation skipped: {}", e),
        }
    }

    coordinator.progress_to_phase(Phase::Refine).await?;
    let critic = team::pick_critic(coordinator.team())
        .and_then(|name| coordinator.team().agent_port(&name).cloned());
    match critic {
        Some(critic) => {
            let sequences = coordinator.run_reasoning_loop(critic.as_ref()).await?;
            info!("Reasoning loop produced {} sequence(s)", sequences.len());
        }
        None => warn!("No critic available; reasoning loop skipped"),
    }

    coordinator.progress_to_phase(Phase::Retrospect).await?;
    Ok(coordinator.generate_report().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_id_slugifies_name() {
        assert_eq!(option_id("Write Through  Cache"), "write-through-cache");
    }

    #[test]
    fn test_load_task_from_positional_and_flags() {
        let cli = Cli::parse_from([
            "edrr-quorum",
            "Choose a cache",
            "--option",
            "Redis",
            "--require",
            "analysis",
        ]);
        let task = load_task(&cli).unwrap().unwrap();
        assert_eq!(task.description, "Choose a cache");
        assert_eq!(task.options[0].id, "redis");
        assert!(task.required_expertise.unwrap().contains("analysis"));
    }

    #[test]
    fn test_load_task_absent_without_input() {
        let cli = Cli::parse_from(["edrr-quorum"]);
        assert!(load_task(&cli).unwrap().is_none());
    }

    #[test]
    fn test_check_config_rejects_errors() {
        assert!(check_config(&FileConfig::default()).is_ok());
        let mut config = FileConfig::default();
        config.voting.method = "coin_flip".to_string();
        assert!(check_config(&config).is_ok());
        config.voting.domain_coefficient = 0.0;
        assert!(check_config(&config).is_err());
    }

    #[tokio::test]
    async fn test_full_cycle_with_builtin_team() {
        let config = FileConfig::default();
        let (team, members) = team::build_team(&config).unwrap();
        let coordinator_config = config
            .to_coordinator_config()
            .with_auto_progress(false)
            .with_reasoning(config.reasoning.to_params().with_seed(11));
        let mut coordinator = EdrrCoordinator::new(team, coordinator_config)
            .with_memory(Arc::new(InMemoryMemoryStore::new()));

        let task = Task::new("Choose between brainstorming and optimization")
            .with_id("cli-task")
            .with_options([
                TaskOption::new("brainstorm", "Brainstorming workshop"),
                TaskOption::new("tune", "Optimization pass"),
            ])
            .with_required_expertise(["analysis", "coding"]);

        let report = run_cycle(&mut coordinator, &members, task).await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.votes.len(), 1);
        assert_eq!(report.assignments.len(), 2);
        assert!(report.task.solution.is_some());
    }
}
