//! Layered configuration: defaults, global file, project file, explicit file, env

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const PROJECT_FILES: [&str; 2] = ["edrr.toml", ".edrr.toml"];
const ENV_PREFIX: &str = "EDRR_";

/// Finds configuration files and merges them over the defaults
pub struct ConfigLoader;

impl ConfigLoader {
    /// Merge every source into one [`FileConfig`]
    ///
    /// Later sources win:
    /// 1. built-in defaults
    /// 2. `$XDG_CONFIG_HOME/edrr-quorum/config.toml`
    /// 3. `./edrr.toml` or `./.edrr.toml`
    /// 4. `config_path`, when given
    /// 5. `EDRR_` environment variables, `__` separating nested keys (`EDRR_VOTING__METHOD`)
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        let mut layered = Figment::from(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            layered = layered.merge(Toml::file(&global_path));
        }

        if let Some(project_path) = Self::project_config_path() {
            layered = layered.merge(Toml::file(&project_path));
        }
        if let Some(explicit) = config_path {
            layered = layered.merge(Toml::file(explicit));
        }

        layered
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)
    }

    /// Load a single file over the defaults, ignoring every other source
    pub fn load_file(path: &Path) -> Result<FileConfig, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(FileConfig::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(Box::new)
    }

    /// Built-in defaults, no files or environment
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// `<config dir>/edrr-quorum/config.toml`, whether or not it exists
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("edrr-quorum").join("config.toml"))
    }

    /// First existing project file in the working directory
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Describe each source, highest priority first
    pub fn describe_sources(explicit: Option<&PathBuf>) -> Vec<String> {
        let state = |found: bool| if found { "found" } else { "absent" };
        let mut lines = vec![format!("env       {}* variables", ENV_PREFIX)];
        if let Some(path) = explicit {
            lines.push(format!("explicit  {} ({})", path.display(), state(path.exists())));
        }
        match Self::project_config_path() {
            Some(path) => lines.push(format!("project   {} (found)", path.display())),
            None => lines.push(format!("project   {} (absent)", PROJECT_FILES.join(" | "))),
        }
        if let Some(path) = Self::global_config_path() {
            lines.push(format!("global    {} ({})", path.display(), state(path.exists())));
        }
        lines.push("defaults  built-in".to_string());
        lines
    }

    /// Print [`describe_sources`](Self::describe_sources) for `--show-config`
    pub fn print_config_sources(explicit: Option<&PathBuf>) {
        println!("Configuration sources, highest priority first:");
        for line in Self::describe_sources(explicit) {
            println!("  {}", line);
        }
    }
}
