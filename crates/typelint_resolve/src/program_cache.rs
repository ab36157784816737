//! Per-project program cache.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;
use typelint_toolchain::{ConfigDiagnostic, ProgramHandle};

use crate::{CanonicalPath, CanonicalPathResolver};

/// A shared handle to one compiled program.
///
/// Exactly one live program exists per project configuration; clones share
/// the same instance, which is mutated in place by `resync`. Identity is
/// the `Arc` allocation, compared with [`Program::same_instance`].
#[derive(Clone)]
pub struct Program {
    inner: Arc<Mutex<Box<dyn ProgramHandle>>>,
}

impl Program {
    pub fn new(handle: Box<dyn ProgramHandle>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(handle)),
        }
    }

    /// Whether two handles refer to the same live program.
    pub fn same_instance(&self, other: &Program) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn contains_file(&self, path: &std::path::Path) -> bool {
        self.inner.lock().contains_file(path)
    }

    pub fn source_text(&self, path: &std::path::Path) -> Option<Arc<str>> {
        self.inner.lock().source_text(path)
    }

    pub fn root_file_names(&self) -> Vec<PathBuf> {
        self.inner.lock().root_file_names()
    }

    pub fn project_references(&self) -> Vec<PathBuf> {
        self.inner.lock().project_references()
    }

    pub fn config_diagnostics(&self) -> Vec<ConfigDiagnostic> {
        self.inner.lock().config_diagnostics()
    }

    /// Drains pending watch notifications synchronously. A no-op when
    /// nothing is pending.
    pub fn resync(&self) {
        self.inner.lock().resync();
    }

    pub fn ensure_bindings(&self) {
        self.inner.lock().ensure_bindings();
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("roots", &self.root_file_names().len())
            .finish()
    }
}

/// Cached state for one project configuration.
pub struct ProjectEntry {
    config_path: CanonicalPath,
    program: Program,
    /// Canonical keys of the files known (as of the last resync) to be
    /// compiled by the program. Derived, not authoritative: only ever
    /// trusted for short-circuit hits.
    membership: Option<HashSet<String>>,
    /// Last-seen modification time of the configuration file.
    config_mtime: Option<SystemTime>,
}

impl ProjectEntry {
    pub fn new(
        config_path: CanonicalPath,
        program: Program,
        config_mtime: Option<SystemTime>,
    ) -> Self {
        Self {
            config_path,
            program,
            membership: None,
            config_mtime,
        }
    }

    pub fn config_path(&self) -> &CanonicalPath {
        &self.config_path
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn config_mtime(&self) -> Option<SystemTime> {
        self.config_mtime
    }

    pub fn set_config_mtime(&mut self, mtime: Option<SystemTime>) {
        self.config_mtime = mtime;
    }

    /// The membership set, computed lazily from the program's current root
    /// file names.
    pub fn membership(&mut self, canonical: &CanonicalPathResolver) -> &HashSet<String> {
        let program = &self.program;
        self.membership.get_or_insert_with(|| {
            program
                .root_file_names()
                .iter()
                .map(|path| canonical.canonicalize(path).key().to_string())
                .collect()
        })
    }

    /// Drops the membership set so the next query recomputes it.
    pub fn invalidate_membership(&mut self) {
        self.membership = None;
    }

    /// Recomputes the membership set from the program's current roots.
    pub fn refresh_membership(&mut self, canonical: &CanonicalPathResolver) -> &HashSet<String> {
        self.membership = None;
        self.membership(canonical)
    }
}

/// Insertion-ordered cache of [`ProjectEntry`] values keyed by canonical
/// configuration path. Entries persist for the resolver's lifetime; a
/// program is torn down only when the cache is cleared, never individually.
#[derive(Default)]
pub struct ProjectProgramCache {
    entries: HashMap<String, ProjectEntry>,
    order: Vec<String>,
}

impl ProjectProgramCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&ProjectEntry> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ProjectEntry> {
        self.entries.get_mut(key)
    }

    /// Inserts a freshly created entry and returns a handle to it. An
    /// existing entry for the same config is replaced without disturbing
    /// its position in the iteration order.
    pub fn insert(&mut self, entry: ProjectEntry) -> &mut ProjectEntry {
        let key = entry.config_path().key().to_string();
        if !self.entries.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.entries.entry(key).insert_entry(entry).into_mut()
    }

    /// Snapshot of the known configuration keys in insertion order.
    pub fn known_keys(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
