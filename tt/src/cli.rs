//! CLI argument definitions

use clap::{ArgGroup, Parser};
use std::path::{Path, PathBuf};

use crate::config::{ConfigError, Overrides};
use crate::domain::RepoCoordinate;

/// Path of the log file under the platform data directory
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("todotracker")
        .join("logs")
        .join("todotracker.log")
}

/// todotracker - turn a project description into GitHub labels and issues
#[derive(Debug, Parser)]
#[command(
    name = "tt",
    about = "Turn a project description into GitHub labels and phase-ordered issues",
    version = env!("CARGO_PKG_VERSION"),
    after_help = "Logs are written to: ~/.local/share/todotracker/logs/todotracker.log\n\n\
Examples:\n  \
tt --repo octo/recipes --description \"A recipe sharing site\"\n  \
tt --repo octo/recipes --file project.md --model anthropic/claude-3.5-sonnet\n  \
tt --repo octo/recipes --file project.md --dry-run",
    group(ArgGroup::new("source").required(true).args(["description", "file"]))
)]
pub struct Cli {
    /// Target repository
    #[arg(short, long, value_name = "OWNER/REPO", value_parser = parse_repo)]
    pub repo: RepoCoordinate,

    /// Project description text
    #[arg(short, long, value_name = "TEXT")]
    pub description: Option<String>,

    /// File containing the project description
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Model to use (default from config or DEFAULT_MODEL)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Number of tasks to ask the AI for
    #[arg(long, value_name = "N")]
    pub max_tasks: Option<u32>,

    /// Tasks kept per phase; the rest are dropped with a warning
    #[arg(long, value_name = "N")]
    pub max_tasks_per_phase: Option<usize>,

    /// Skip the project board hint
    #[arg(long)]
    pub no_board: bool,

    /// Write the JSON run summary to this file
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Show the plan without creating anything on GitHub
    #[arg(long)]
    pub dry_run: bool,

    /// Path to config file
    #[arg(short, long, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, help = "Enable verbose (debug) logging")]
    pub verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

fn parse_repo(s: &str) -> Result<RepoCoordinate, String> {
    s.parse()
}

impl Cli {
    /// Command-line values that override the config file
    pub fn overrides(&self) -> Overrides {
        Overrides {
            model: self.model.clone(),
            max_tasks: self.max_tasks,
            max_tasks_per_phase: self.max_tasks_per_phase,
        }
    }

    /// The project description from `--description` or `--file`, trimmed
    pub fn description(&self) -> Result<String, ConfigError> {
        let text = match (&self.description, &self.file) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => read_description(path)?,
            (None, None) => String::new(),
        };
        let text = text.trim();
        if text.is_empty() {
            return Err(ConfigError::EmptyDescription);
        }
        Ok(text.to_string())
    }
}

fn read_description(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::DescriptionFile {
        path: path.to_path_buf(),
        source,
    })
}
