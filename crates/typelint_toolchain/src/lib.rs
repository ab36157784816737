//! # typelint_toolchain
//!
//! Compiler toolchain capability interface for typelint.
//!
//! The program-resolution layer never talks to a compiler directly. It sees
//! the toolchain through two narrow seams:
//!
//! - [`Toolchain`]: parse a project configuration file and build a compiled
//!   program for it, wired to caller-supplied host hooks instead of real I/O.
//! - [`ProgramHandle`]: the capability surface of one compiled program
//!   (source-file presence, root file names, project references, config
//!   diagnostics, synchronous resync).
//!
//! There are no scheduling hooks by design: a program never recomputes on a
//! timer. All pending change notifications are drained synchronously inside
//! [`ProgramHandle::resync`], which keeps every resolution call deterministic.
//!
//! The [`memory`] module ships a complete in-memory reference toolchain that
//! implements both seams against the real filesystem with glob-based project
//! membership. It backs the integration tests and lets the resolution layer
//! run end to end without a real compiler.

mod error;
mod host;
pub mod memory;
mod program;

pub use error::ToolchainError;
pub use host::{FileChangeKind, ProgramHost, ReadFileHook, WatchCallback, WatchHook};
pub use program::{ConfigDiagnostic, DiagnosticSeverity, ProgramHandle};

use std::path::Path;

/// Options applied when a program is built from a project configuration.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Non-standard file extensions (without the leading dot) to treat as
    /// source files in addition to [`Toolchain::standard_extensions`].
    pub extra_file_extensions: Vec<String>,

    /// Experimental: resolve project references to their original sources
    /// rather than their compiled outputs.
    pub use_source_of_project_references: bool,
}

/// A compiler toolchain, consumed only through this narrow interface so a
/// stub implementation can stand in for the real thing.
pub trait Toolchain {
    /// Parses the project configuration at `config_path` and builds a
    /// compiled program for it.
    ///
    /// All file reads and watch registrations the toolchain performs must go
    /// through `host`; the toolchain never touches the OS watcher APIs.
    fn load_program(
        &self,
        config_path: &Path,
        host: ProgramHost,
        options: &LoadOptions,
    ) -> Result<Box<dyn ProgramHandle>, ToolchainError>;

    /// File extensions (without the leading dot) this toolchain compiles by
    /// default.
    fn standard_extensions(&self) -> &[&str];
}
