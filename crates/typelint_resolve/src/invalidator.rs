//! Staleness decisions for cached programs.
//!
//! There is no real filesystem watcher because the linter runs once per
//! lint pass. When a cached program does not obviously cover a file, this
//! state machine synthesizes exactly the notifications a live watcher would
//! have sent, in the cheapest order: direct presence check, then directory
//! discovery, then deletion.

use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use tracing::debug;
use typelint_toolchain::FileChangeKind;

use crate::{CanonicalPath, CanonicalPathResolver, ProjectEntry, ResolveError, SharedRegistry};

/// Terminal outcome of an invalidation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    /// The program covers the file (possibly after a resync).
    Alive,
    /// The path structurally cannot belong to this project, or is excluded
    /// by its configuration. Not an error by itself.
    Unrelated,
}

/// Decides whether a cached program's membership is still trustworthy and,
/// if not, drives the minimal sequence of synthetic watch events needed to
/// force a resync.
pub struct ProgramInvalidator {
    canonical: CanonicalPathResolver,
    registry: SharedRegistry,
}

impl ProgramInvalidator {
    pub fn new(canonical: CanonicalPathResolver, registry: SharedRegistry) -> Self {
        Self {
            canonical,
            registry,
        }
    }

    pub fn invalidate(
        &self,
        entry: &mut ProjectEntry,
        path: &CanonicalPath,
    ) -> Result<Invalidation, ResolveError> {
        self.check_config_timestamp(entry);

        // Resync first so the config callbacks fired above are visible;
        // a no-op when nothing is pending.
        entry.program().resync();
        if entry.program().contains_file(path.as_path()) {
            debug!("{} directly present in {}", path, entry.config_path());
            return Ok(Invalidation::Alive);
        }

        if !self.climb_directories(path) {
            debug!(
                "{} has no watched ancestor for {}",
                path,
                entry.config_path()
            );
            return Ok(Invalidation::Unrelated);
        }

        entry.program().resync();
        if entry.program().contains_file(path.as_path()) {
            debug!("{} present in {} after resync", path, entry.config_path());
            return Ok(Invalidation::Alive);
        }

        self.retire_deleted_root(entry, path)
    }

    /// Step 1: a changed configuration mtime means `include`/`exclude` may
    /// have changed. Fire the config path's callbacks and drop the cached
    /// membership so it is fully recomputed.
    fn check_config_timestamp(&self, entry: &mut ProjectEntry) {
        let mtime = config_mtime(entry.config_path());
        if mtime == entry.config_mtime() {
            return;
        }

        debug!("config {} timestamp changed", entry.config_path());
        let config = entry.config_path().clone();
        self.registry
            .notify_file(config.key(), config.as_path(), FileChangeKind::Changed);
        entry.invalidate_membership();
        entry.set_config_mtime(mtime);
    }

    /// Step 3: walk ancestor directories from the file's parent toward the
    /// root, notifying every ancestor that holds a directory callback with
    /// both the original directory and the current ancestor. Returns
    /// whether any callback fired.
    fn climb_directories(&self, path: &CanonicalPath) -> bool {
        let Some(parent) = path.as_path().parent() else {
            return false;
        };
        let parent = self.canonical.canonicalize(parent);

        let mut fired = false;
        let mut current = parent.clone();
        loop {
            let reported: Vec<PathBuf> = if current == parent {
                vec![parent.as_path().to_path_buf()]
            } else {
                vec![
                    parent.as_path().to_path_buf(),
                    current.as_path().to_path_buf(),
                ]
            };

            if self
                .registry
                .notify_directory(current.key(), &reported, FileChangeKind::Changed)
                > 0
            {
                fired = true;
            }

            match current.as_path().parent() {
                Some(next) if next != current.as_path() => {
                    current = self.canonical.canonicalize(next);
                }
                _ => break,
            }
        }

        fired
    }

    /// Step 5: a root file missing from disk signals a rename. The old name
    /// must be explicitly retired before the toolchain will admit a
    /// same-slot new file.
    fn retire_deleted_root(
        &self,
        entry: &mut ProjectEntry,
        path: &CanonicalPath,
    ) -> Result<Invalidation, ResolveError> {
        let deleted = entry
            .program()
            .root_file_names()
            .into_iter()
            .find(|root| !root.exists());

        let Some(deleted) = deleted else {
            // Excluded by configuration, not missing due to a rename.
            return Ok(Invalidation::Unrelated);
        };

        debug!("retiring deleted root {}", deleted.display());
        let deleted = self.canonical.canonicalize(&deleted);
        self.registry
            .notify_file(deleted.key(), deleted.as_path(), FileChangeKind::Deleted);
        entry.invalidate_membership();

        entry.program().resync();
        if entry.program().contains_file(path.as_path()) {
            Ok(Invalidation::Alive)
        } else {
            Ok(Invalidation::Unrelated)
        }
    }
}

fn config_mtime(config: &CanonicalPath) -> Option<SystemTime> {
    fs::metadata(config.as_path())
        .and_then(|metadata| metadata.modified())
        .ok()
}
