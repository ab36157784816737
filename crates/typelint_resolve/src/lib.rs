//! # typelint_resolve
//!
//! Incremental program resolution and caching for typelint.
//!
//! Given a file path, its current text, and an ordered list of project
//! configuration files, [`ProgramResolver::resolve`] returns the compiled
//! program(s) responsible for that file, creating, reusing, or selectively
//! invalidating cached programs as needed.
//!
//! The linter runs once per lint pass, not as a persistent IDE service, so
//! there is no real filesystem watcher. Instead, every watch registration
//! the toolchain makes lands in a [`WatchCallbackRegistry`], and the
//! resolution layer synthesizes exactly the notifications a live watcher
//! would have sent: a content-hash mismatch fires `Changed` for an edited
//! file, a directory climb fires `Changed` for ancestors of an unknown
//! file, and a deleted root file fires `Deleted` to communicate a rename.
//!
//! ## Example
//!
//! ```rust,ignore
//! use typelint_resolve::{ProgramResolver, ResolveOptions};
//! use typelint_toolchain::memory::MemoryToolchain;
//!
//! let mut resolver = ProgramResolver::new(MemoryToolchain::new(), ResolveOptions::default());
//! let programs = resolver.resolve_strict(
//!     "src/foo.ts".as_ref(),
//!     file_text,
//!     &[PathBuf::from("project.json")],
//! )?;
//! ```

mod canonical;
mod content_hash;
mod error;
mod invalidator;
mod program_cache;
mod resolver;
mod watch_registry;

#[cfg(test)]
pub(crate) mod test_support;

pub use canonical::{CanonicalPath, CanonicalPathResolver};
pub use content_hash::ContentHashTracker;
pub use error::ResolveError;
pub use invalidator::{Invalidation, ProgramInvalidator};
pub use program_cache::{Program, ProjectEntry, ProjectProgramCache};
pub use resolver::{ProgramResolver, ResolveOptions};
pub use watch_registry::{SharedRegistry, WatchCallbackRegistry};

pub use typelint_toolchain::{
    ConfigDiagnostic, DiagnosticSeverity, FileChangeKind, LoadOptions, ProgramHandle,
    ProgramHost, Toolchain, ToolchainError, WatchCallback,
};
