//! Configuration file loading with precedence handling.

use crate::view::{SettingsProvider, ViewMode};
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "SECTION_VIEW_CONFIG";

/// Environment variable overriding the abbreviation limit.
pub const LIMIT_ENV: &str = "SECTION_VIEW_ABBREVIATED_REPLIES";

/// Replies shown per thread on board pages when nothing else is configured.
pub const DEFAULT_ABBREVIATED_REPLIES: i64 = 5;

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (permission issues, not a file, ...).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax or unknown fields.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },

    /// An override environment variable holds an unusable value.
    #[error("Invalid value {value:?} in environment variable {var}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/section-view/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Replies kept per thread on board pages.
    #[serde(default)]
    pub abbreviated_replies: Option<i64>,

    /// Page kind the replayed views live on.
    #[serde(default)]
    pub mode: Option<ViewMode>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Replies kept per thread on board pages.
    pub abbreviated_replies: i64,
    /// Page kind the views live on.
    pub mode: ViewMode,
    /// Log file receiving tracing output.
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            abbreviated_replies: DEFAULT_ABBREVIATED_REPLIES,
            mode: ViewMode::Board,
            log_file_path: default_log_path(),
        }
    }
}

impl SettingsProvider for ResolvedConfig {
    fn abbreviation_limit(&self) -> i64 {
        self.abbreviated_replies
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/section-view/section-view.log` on Unix-like
/// systems. Falls back to the current directory when no state directory
/// exists.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("section-view").join("section-view.log")
    } else {
        PathBuf::from("section-view.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    // Missing file is not an error - use defaults
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path (`~/.config/section-view/config.toml`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("section-view").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `SECTION_VIEW_CONFIG` environment variable
/// 3. Default path `~/.config/section-view/config.toml`
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Merge config file into defaults to create resolved config.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        abbreviated_replies: config
            .abbreviated_replies
            .unwrap_or(defaults.abbreviated_replies),
        mode: config.mode.unwrap_or(defaults.mode),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    }
}

/// Apply environment variable overrides to resolved config.
///
/// Checks `SECTION_VIEW_ABBREVIATED_REPLIES`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnv`] if the variable is set but is not an
/// integer.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> Result<ResolvedConfig, ConfigError> {
    if let Ok(raw) = std::env::var(LIMIT_ENV) {
        config.abbreviated_replies =
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv {
                    var: LIMIT_ENV,
                    value: raw.clone(),
                })?;
    }

    Ok(config)
}

/// Apply CLI argument overrides to resolved config.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    limit_override: Option<i64>,
    mode_override: Option<ViewMode>,
) -> ResolvedConfig {
    if let Some(limit) = limit_override {
        config.abbreviated_replies = limit;
    }

    if let Some(mode) = mode_override {
        config.mode = mode;
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
