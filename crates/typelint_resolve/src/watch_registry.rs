//! Watch callback registry.
//!
//! Stores, per canonical file or directory path, the callbacks the
//! toolchain registered when asked to "watch" that path. Invoking a
//! callback is how this layer tells the toolchain "this path changed".
//! Plain synchronous closure invocation; no OS integration.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;
use typelint_toolchain::{FileChangeKind, WatchCallback};

/// The raw per-path callback maps.
#[derive(Default)]
pub struct WatchCallbackRegistry {
    files: HashMap<String, Vec<WatchCallback>>,
    directories: HashMap<String, Vec<WatchCallback>>,
}

impl WatchCallbackRegistry {
    pub fn watch_file(&mut self, key: &str, callback: WatchCallback) {
        self.files.entry(key.to_string()).or_default().push(callback);
    }

    pub fn watch_directory(&mut self, key: &str, callback: WatchCallback) {
        self.directories
            .entry(key.to_string())
            .or_default()
            .push(callback);
    }

    pub fn has_file_callbacks(&self, key: &str) -> bool {
        self.files.get(key).is_some_and(|cbs| !cbs.is_empty())
    }

    pub fn has_directory_callbacks(&self, key: &str) -> bool {
        self.directories.get(key).is_some_and(|cbs| !cbs.is_empty())
    }

    fn file_callbacks(&self, key: &str) -> Vec<WatchCallback> {
        self.files.get(key).cloned().unwrap_or_default()
    }

    fn directory_callbacks(&self, key: &str) -> Vec<WatchCallback> {
        self.directories.get(key).cloned().unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.directories.clear();
    }
}

/// Shared, lock-guarded registry handle.
///
/// Cloned into the host hooks handed to the toolchain; registration happens
/// while a program build is in flight, so access is guarded. Notification
/// clones the callback list out of the lock before invoking, so a callback
/// may itself register new watches.
#[derive(Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<Mutex<WatchCallbackRegistry>>,
}

impl SharedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watch_file(&self, key: &str, callback: WatchCallback) {
        self.inner.lock().watch_file(key, callback);
    }

    pub fn watch_directory(&self, key: &str, callback: WatchCallback) {
        self.inner.lock().watch_directory(key, callback);
    }

    pub fn has_file_callbacks(&self, key: &str) -> bool {
        self.inner.lock().has_file_callbacks(key)
    }

    pub fn has_directory_callbacks(&self, key: &str) -> bool {
        self.inner.lock().has_directory_callbacks(key)
    }

    /// Invokes every file callback registered for `key` with `path` and
    /// `kind`; returns the number of invocations.
    pub fn notify_file(&self, key: &str, path: &Path, kind: FileChangeKind) -> usize {
        let callbacks = self.inner.lock().file_callbacks(key);
        trace!("notify_file {} ({:?}): {} callbacks", key, kind, callbacks.len());
        for callback in &callbacks {
            callback(path, kind);
        }
        callbacks.len()
    }

    /// Invokes every directory callback registered for `key` once per
    /// reported path; returns the number of invocations.
    pub fn notify_directory(
        &self,
        key: &str,
        reported: &[PathBuf],
        kind: FileChangeKind,
    ) -> usize {
        let callbacks = self.inner.lock().directory_callbacks(key);
        let mut invoked = 0;
        for callback in &callbacks {
            for path in reported {
                callback(path, kind);
                invoked += 1;
            }
        }
        invoked
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}
