//! Configuration for the `tasksync` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/tasksync/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tasksync_proto::task::Priority;

use crate::view::{FilterMode, SortKey};

/// Base URL used when nothing else is configured.
pub const DEFAULT_REMOTE_URL: &str = "http://127.0.0.1:8080/api";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    remote: RemoteFileConfig,
    cache: CacheFileConfig,
    log: LogFileConfig,
}

/// `[remote]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct RemoteFileConfig {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    offline: Option<bool>,
}

/// `[cache]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct CacheFileConfig {
    dir: Option<PathBuf>,
}

/// `[log]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct LogFileConfig {
    level: Option<String>,
    file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the remote task store.
    pub remote_url: String,
    /// Per-request timeout for remote calls.
    pub request_timeout: Duration,
    /// Skip the remote entirely; every change is local-only.
    pub offline: bool,
    /// Directory holding the durable task cache.
    pub cache_dir: PathBuf,
    /// Log level filter, used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Log file path (default: `$TMPDIR/tasksync.log`).
    pub log_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            remote_url: DEFAULT_REMOTE_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            offline: false,
            cache_dir: dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("tasksync"),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read,
    /// or if any config file that exists cannot be parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Priority: CLI (and env) > file > default.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            remote_url: cli
                .remote_url
                .clone()
                .or_else(|| file.remote.base_url.clone())
                .unwrap_or(defaults.remote_url),
            request_timeout: file
                .remote
                .timeout_secs
                .map_or(defaults.request_timeout, Duration::from_secs),
            offline: cli.offline || file.remote.offline.unwrap_or(defaults.offline),
            cache_dir: cli
                .cache_dir
                .clone()
                .or_else(|| file.cache.dir.clone())
                .unwrap_or(defaults.cache_dir),
            log_level: cli
                .log_level
                .clone()
                .or_else(|| file.log.level.clone())
                .unwrap_or(defaults.log_level),
            log_file: cli.log_file.clone().or_else(|| file.log.file.clone()),
        }
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Task list with remote sync and offline cache")]
pub struct CliArgs {
    /// Base URL of the remote task store.
    #[arg(long, env = "TASKSYNC_REMOTE_URL")]
    pub remote_url: Option<String>,

    /// Never contact the remote store.
    #[arg(long)]
    pub offline: bool,

    /// Directory for the local task cache.
    #[arg(long, env = "TASKSYNC_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Path to config file (default: `~/.config/tasksync/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, env = "TASKSYNC_LOG")]
    pub log_level: Option<String>,

    /// Path to log file (default: `$TMPDIR/tasksync.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Task operations. Without a subcommand, `list` is run.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show tasks.
    List {
        #[arg(long, value_enum, default_value_t = FilterMode::All)]
        filter: FilterMode,
        /// Case-insensitive text matched against title, description and tags.
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, value_enum, default_value_t = SortKey::Manual)]
        sort: SortKey,
    },
    /// Create a task.
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Due date as `YYYY-MM-DD`.
        #[arg(long)]
        due: Option<String>,
        #[arg(long, value_enum, ignore_case = true)]
        priority: Option<PriorityLevel>,
        /// Comma-separated tags.
        #[arg(long)]
        tags: Option<String>,
    },
    /// Change fields of a task.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
        #[arg(long, value_enum, ignore_case = true)]
        priority: Option<PriorityLevel>,
        /// Comma-separated tags; replaces the existing list.
        #[arg(long)]
        tags: Option<String>,
    },
    /// Flip a task between active and completed.
    Toggle { id: String },
    /// Delete a task.
    Rm { id: String },
    /// Delete every completed task.
    ClearCompleted,
    /// Move `src` to the position currently held by `dst`.
    Move { src: String, dst: String },
    /// Write all tasks as JSON to a file, or stdout.
    Export { path: Option<PathBuf> },
    /// Import tasks from a JSON file.
    Import { path: PathBuf },
}

/// Priority accepted on the command line. Labels outside these three are
/// rejected by the parser instead of being stored as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PriorityLevel {
    High,
    Medium,
    Low,
}

impl From<PriorityLevel> for Priority {
    fn from(level: PriorityLevel) -> Self {
        match level {
            PriorityLevel::High => Self::High,
            PriorityLevel::Medium => Self::Medium,
            PriorityLevel::Low => Self::Low,
        }
    }
}

impl Default for Command {
    fn default() -> Self {
        Self::List {
            filter: FilterMode::All,
            search: String::new(),
            sort: SortKey::Manual,
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// Otherwise the default path is tried and a missing file is an empty
/// config.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            // No platform config dir; fall back to defaults.
            return Ok(ConfigFile::default());
        };
        config_dir.join("tasksync").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
