//! Error types for section-view.
//!
//! The section view itself has almost no failure modes: missing posts during
//! truncation are skipped, and everything else assumes well-formed input.
//! The errors below cover the edges of the crate, where input arrives from
//! outside (config files, replay scripts, generated markup).
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level error returned by the binary
//!   - [`ConfigError`] - Config file unreadable or invalid TOML
//!   - [`LoggingError`] - Log directory or subscriber setup failed
//!   - [`ReplayError`] - Replay script unreadable, invalid, or inconsistent
//!   - [`ViewError`] - A view could not be mounted (malformed markup)

use crate::config::loader::ConfigError;
use crate::logging::LoggingError;
use crate::replay::ReplayError;
use crate::view::ViewError;
use thiserror::Error;

/// Top-level application error encompassing all failure modes.
///
/// All variants are fatal for the CLI: the error is printed and the process
/// exits with a non-zero status.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded or resolved.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The tracing subscriber could not be installed.
    #[error("Logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    /// A replay script could not be loaded or run.
    #[error("Replay failed: {0}")]
    Replay(#[from] ReplayError),

    /// Mounting a view failed outside of a replay run.
    #[error("View error: {0}")]
    View(#[from] ViewError),

    /// Any other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MarkupError;
    use std::path::PathBuf;

    #[test]
    fn config_error_converts_and_keeps_path() {
        let err: AppError = ConfigError::ReadError {
            path: PathBuf::from("/tmp/section-view.toml"),
            reason: "denied".to_string(),
        }
        .into();
        let msg = err.to_string();
        assert!(msg.starts_with("Configuration error"));
        assert!(msg.contains("/tmp/section-view.toml"));
    }

    #[test]
    fn view_error_wraps_markup_error() {
        let err: AppError = ViewError::Markup(MarkupError::UnclosedTag {
            tag: "section".to_string(),
        })
        .into();
        assert!(err.to_string().contains("section"));
    }
}
