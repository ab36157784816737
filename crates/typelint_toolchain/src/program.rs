//! The compiled-program capability surface.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Severity of a configuration diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

/// A diagnostic produced while parsing a project configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDiagnostic {
    pub severity: DiagnosticSeverity,
    pub message: String,
}

impl ConfigDiagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            message: message.into(),
        }
    }

    /// Fatal diagnostics represent user error and are never retried.
    pub fn is_fatal(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

/// The narrow capability surface of one compiled program.
///
/// The resolution layer depends on nothing beyond these operations, so a
/// stub toolchain can substitute for the real one in tests. A handle is
/// owned by exactly one cache entry and mutated in place; it is never
/// duplicated.
pub trait ProgramHandle: Send {
    /// Whether `path` is currently a source file of this program.
    fn contains_file(&self, path: &Path) -> bool;

    /// The current text of `path`, if it is a source file of this program.
    fn source_text(&self, path: &Path) -> Option<Arc<str>>;

    /// The program's current root file names.
    fn root_file_names(&self) -> Vec<PathBuf>;

    /// Configuration paths of referenced projects.
    fn project_references(&self) -> Vec<PathBuf>;

    /// Diagnostics produced while parsing the project configuration.
    fn config_diagnostics(&self) -> Vec<ConfigDiagnostic>;

    /// Drains pending watch notifications and recomputes the program
    /// synchronously. A no-op when nothing is pending.
    fn resync(&mut self);

    /// Forces binder state (parent pointers) the downstream AST-conversion
    /// layer requires.
    fn ensure_bindings(&mut self);
}
