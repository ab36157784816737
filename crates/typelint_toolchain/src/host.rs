//! Host hooks handed to the toolchain at program creation.

use std::fs;
use std::path::Path;
use std::sync::Arc;

/// The kind of filesystem change reported to a watch callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileChangeKind {
    /// The path's content (or the directory's listing) changed.
    Changed,
    /// The path no longer exists.
    Deleted,
}

/// A closure the toolchain registers against a file or directory path.
///
/// Invoking it with a [`FileChangeKind`] is the only channel through which
/// the toolchain re-examines that path.
pub type WatchCallback = Arc<dyn Fn(&Path, FileChangeKind) + Send + Sync>;

/// Hook for reading a file's current text.
pub type ReadFileHook = Arc<dyn Fn(&Path) -> Option<String> + Send + Sync>;

/// Hook for registering a watch callback against a path.
pub type WatchHook = Arc<dyn Fn(&Path, WatchCallback) + Send + Sync>;

/// The host object a program is built against.
///
/// `read_file` returns the in-memory text for the file currently being
/// linted and falls back to disk otherwise. `watch_file`/`watch_directory`
/// register callbacks into the resolution layer's registry instead of
/// touching the OS.
#[derive(Clone)]
pub struct ProgramHost {
    pub read_file: ReadFileHook,
    pub watch_file: WatchHook,
    pub watch_directory: WatchHook,
}

impl ProgramHost {
    pub fn new(read_file: ReadFileHook, watch_file: WatchHook, watch_directory: WatchHook) -> Self {
        Self {
            read_file,
            watch_file,
            watch_directory,
        }
    }

    /// A host that reads straight from disk and discards watch
    /// registrations. Useful when no registry is attached (tests, one-shot
    /// program builds).
    pub fn disk() -> Self {
        Self {
            read_file: Arc::new(|path: &Path| fs::read_to_string(path).ok()),
            watch_file: Arc::new(|_: &Path, _: WatchCallback| {}),
            watch_directory: Arc::new(|_: &Path, _: WatchCallback| {}),
        }
    }
}

impl std::fmt::Debug for ProgramHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramHost").finish_non_exhaustive()
    }
}
