//! Configuration file loading for edrr-quorum
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `EDRR_*` environment variables (`EDRR_VOTING__METHOD=majority`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./edrr.toml` or `./.edrr.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/edrr-quorum/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileConfig, FileDelegationConfig, FileEdrrConfig, FileLoggingConfig, FilePeerReviewConfig,
    FileReasoningConfig, FileTeamAgent, FileTeamConfig, FileVotingConfig,
};
pub use loader::ConfigLoader;
