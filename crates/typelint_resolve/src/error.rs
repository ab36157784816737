//! Resolution error types.

use std::path::{Path, PathBuf};

use thiserror::Error;
use typelint_toolchain::ToolchainError;

/// Errors that can occur during program resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Fatal project-configuration diagnostics. User error; never retried.
    #[error("Configuration error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// No configured project covers the file.
    #[error("{0}")]
    NoMatchingProject(String),

    /// Toolchain error.
    #[error("Toolchain error: {0}")]
    Toolchain(#[from] ToolchainError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResolveError {
    /// Creates a configuration error.
    pub fn config(path: &Path, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Creates a no-matching-project error enumerating every attempted
    /// configuration plus an optional remediation hint.
    pub fn no_matching_project(
        file: &Path,
        attempted: &[PathBuf],
        hint: Option<String>,
    ) -> Self {
        let mut message = format!(
            "{} does not belong to any of the configured projects",
            file.display()
        );

        if attempted.is_empty() {
            message.push_str(" (no project configurations were provided)");
        } else {
            let list = attempted
                .iter()
                .map(|path| format!("\n  - {}", path.display()))
                .collect::<String>();
            message.push_str(": ");
            message.push_str(&list);
        }

        if let Some(hint) = hint {
            message.push('\n');
            message.push_str(&hint);
        }

        Self::NoMatchingProject(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_matching_project_lists_attempted_configs() {
        let error = ResolveError::no_matching_project(
            Path::new("/workspace/src/foo.ts"),
            &[
                PathBuf::from("/workspace/project.json"),
                PathBuf::from("/workspace/other.json"),
            ],
            None,
        );

        let message = error.to_string();
        assert!(message.contains("/workspace/src/foo.ts"));
        assert!(message.contains("/workspace/project.json"));
        assert!(message.contains("/workspace/other.json"));
    }

    #[test]
    fn hint_is_appended_when_present() {
        let error = ResolveError::no_matching_project(
            Path::new("/workspace/component.vue"),
            &[PathBuf::from("/workspace/project.json")],
            Some("The extension `.vue` is non-standard.".to_string()),
        );

        assert!(error.to_string().contains("non-standard"));
    }

    #[test]
    fn empty_attempt_list_is_called_out() {
        let error =
            ResolveError::no_matching_project(Path::new("/workspace/src/foo.ts"), &[], None);
        assert!(error.to_string().contains("no project configurations"));
    }
}
