//! CLI argument definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the cycle report
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Phase-by-phase summary
    #[default]
    Summary,
    /// Full report as JSON
    Json,
}

/// Run a multi-agent EDRR cycle on a task
#[derive(Parser, Debug)]
#[command(name = "edrr-quorum")]
#[command(author, version, about)]
#[command(long_about = r#"
edrr-quorum runs a team of agents through one Expand, Differentiate, Refine,
Retrospect cycle. Each phase gets a Primus chosen by expertise, the team votes
on the task options, work is delegated by expertise, and a dialectical
reasoning loop refines the solution.

Example:
  edrr-quorum "Pick a storage engine" --option sqlite --option rocksdb
  edrr-quorum --task-file task.json --output json
  edrr-quorum --show-config
"#)]
pub struct Cli {
    /// Task description (or use --task-file)
    pub task: Option<String>,

    /// Load the task from a JSON file
    #[arg(long, value_name = "PATH", conflicts_with = "task")]
    pub task_file: Option<PathBuf>,

    /// Option to vote on (repeatable, ignored with --task-file)
    #[arg(long = "option", value_name = "NAME")]
    pub options: Vec<String>,

    /// Expertise the task requires (repeatable, ignored with --task-file)
    #[arg(long = "require", value_name = "EXPERTISE")]
    pub required_expertise: Vec<String>,

    /// Path to a configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Ignore all configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Print configuration sources and exit
    #[arg(long)]
    pub show_config: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
    pub output: OutputFormat,

    /// Seed for tie-breaking and reasoning randomness
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write a daily rolling log file into this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Write cycle events as JSON lines to this file
    #[arg(long, value_name = "PATH")]
    pub event_log: Option<PathBuf>,

    /// Hide phase progress
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positional_task_with_options() {
        let cli = Cli::parse_from([
            "edrr-quorum",
            "Pick a cache",
            "--option",
            "redis",
            "--option",
            "memcached",
            "-vv",
        ]);
        assert_eq!(cli.task.as_deref(), Some("Pick a cache"));
        assert_eq!(cli.options, vec!["redis", "memcached"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.output, OutputFormat::Summary));
    }

    #[test]
    fn test_parse_json_output_and_seed() {
        let cli = Cli::parse_from(["edrr-quorum", "x", "--output", "json", "--seed", "7"]);
        assert!(matches!(cli.output, OutputFormat::Json));
        assert_eq!(cli.seed, Some(7));
    }

    #[test]
    fn test_task_file_conflicts_with_positional() {
        let parsed = Cli::try_parse_from(["edrr-quorum", "x", "--task-file", "t.json"]);
        assert!(parsed.is_err());
    }
}
