//! Toolchain error types.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while a toolchain builds a program.
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// The project configuration file could not be found.
    #[error("Project configuration not found: {0}")]
    ConfigNotFound(PathBuf),

    /// The project configuration file could not be parsed.
    #[error("Failed to parse project configuration {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolchainError {
    /// Creates a config-not-found error.
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound(path.into())
    }

    /// Creates a config-parse error.
    pub fn config_parse(path: &Path, message: impl Into<String>) -> Self {
        Self::ConfigParse {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}
