//! Playground configuration
//!
//! Supports user-level and project-level configuration files.
//!
//! # Configuration hierarchy
//!
//! ```text
//! Priority (high → low):
//! 1. CLI arguments
//! 2. Project-level (./lola-playground.toml)
//! 3. User-level (~/.config/lola-playground/config.toml)
//! 4. Default values
//! ```
//!
//! # Usage
//!
//! ```rust
//! use lola_playground::util::config::HostConfig;
//!
//! let config = HostConfig::default();
//! assert_eq!(config.scheduler.step_budget, 1000);
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::controller::ControllerOptions;
use crate::scheduler::StepBudget;
use crate::util::logger::LogLevel;

/// Project-level config file name
pub const PROJECT_CONFIG_FILE: &str = "lola-playground.toml";

/// Host configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HostConfig {
    /// Guest module settings
    #[serde(default)]
    pub module: ModuleConfig,
    /// Tick loop settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Console settings
    #[serde(default)]
    pub console: ConsoleConfig,
    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

/// Guest module configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleConfig {
    /// Path of the interpreter module
    #[serde(default = "default_module_path")]
    pub path: PathBuf,
    /// Import namespace the module expects its console functions in
    #[serde(default = "default_import_module")]
    pub import_module: String,
    #[serde(default)]
    pub exports: ExportNames,
    #[serde(default)]
    pub imports: ImportNames,
}

fn default_module_path() -> PathBuf {
    PathBuf::from("lola.wasm")
}

fn default_import_module() -> String {
    "env".to_string()
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            path: default_module_path(),
            import_module: default_import_module(),
            exports: ExportNames::default(),
            imports: ImportNames::default(),
        }
    }
}

/// Names of the functions the module exports
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportNames {
    pub initialize: String,
    pub allocate: String,
    pub release: String,
    pub validate: String,
    pub init_run: String,
    pub deinit_run: String,
    pub is_finished: String,
    pub step: String,
    pub memory: String,
}

impl Default for ExportNames {
    fn default() -> Self {
        Self {
            initialize: "initialize".to_string(),
            allocate: "malloc".to_string(),
            release: "free".to_string(),
            validate: "validate".to_string(),
            init_run: "initInterpreter".to_string(),
            deinit_run: "deinitInterpreter".to_string(),
            is_finished: "isInterpreterDone".to_string(),
            step: "stepInterpreter".to_string(),
            memory: "memory".to_string(),
        }
    }
}

/// Names of the console functions the module imports
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImportNames {
    pub read: String,
    pub write: String,
    pub clock: String,
}

impl Default for ImportNames {
    fn default() -> Self {
        Self {
            read: "readString".to_string(),
            write: "writeString".to_string(),
            clock: "millis".to_string(),
        }
    }
}

/// Tick loop configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulerConfig {
    /// Guest work units per tick
    #[serde(default = "default_step_budget")]
    pub step_budget: u32,
    /// Delay between ticks in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

fn default_step_budget() -> u32 {
    StepBudget::DEFAULT.get()
}

fn default_tick_interval_ms() -> u64 {
    16
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            step_budget: default_step_budget(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl SchedulerConfig {
    pub fn budget(&self) -> StepBudget {
        StepBudget(self.step_budget)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Console configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsoleConfig {
    /// Clear the console when a program starts
    #[serde(default = "default_true")]
    pub clear_on_start: bool,
    /// Print a greeting before the first program
    #[serde(default = "default_true")]
    pub greeting: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            clear_on_start: true,
            greeting: true,
        }
    }
}

impl ConsoleConfig {
    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            clear_console_on_start: self.clear_on_start,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LogConfig {
    pub fn level(&self) -> Result<LogLevel, ConfigError> {
        self.level
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("unknown log level `{}`", self.level)))
    }
}

impl HostConfig {
    /// Reject settings the tick loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.step_budget == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.step_budget must be at least 1".to_string(),
            ));
        }
        if self.scheduler.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.tick_interval_ms must be at least 1".to_string(),
            ));
        }
        self.log.level()?;
        Ok(())
    }

    /// Parse a config file's contents.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: HostConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config at `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Resolve the effective config: `explicit` if given, else the project
    /// file in `project_dir`, else the user file, else defaults.
    pub fn discover(
        explicit: Option<&Path>,
        project_dir: &Path,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        let project = project_dir.join(PROJECT_CONFIG_FILE);
        if project.exists() {
            return Self::load_from(&project);
        }

        match get_config_path() {
            Some(user) if user.exists() => Self::load_from(&user),
            _ => Ok(Self::default()),
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Get the user config directory
pub fn get_config_dir() -> Option<PathBuf> {
    // Try XDG config directory on Unix
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config).join("lola-playground"));
    }

    // Fallback to ~/.config/lola-playground
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home).join(".config").join("lola-playground"));
    }

    // On Windows, try %APPDATA%
    if let Ok(appdata) = std::env::var("APPDATA") {
        return Some(PathBuf::from(appdata).join("lola-playground"));
    }

    None
}

/// Get the user config file path (~/.config/lola-playground/config.toml)
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
