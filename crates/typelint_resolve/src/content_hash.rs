//! Content-hash records for edit detection.

use std::collections::HashMap;

use crate::CanonicalPath;

/// Detects whether the text handed in for a path differs from what the
/// toolchain last observed, without a real filesystem watcher.
///
/// Records are updated on every observation regardless of outcome, so
/// repeated no-op resolutions stay cheap.
#[derive(Debug, Default)]
pub struct ContentHashTracker {
    records: HashMap<String, String>,
}

impl ContentHashTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the BLAKE3 hash of content.
    pub fn hash_content(content: &str) -> String {
        blake3::hash(content.as_bytes()).to_hex().to_string()
    }

    /// Records `text` for `path` and returns whether it differs from the
    /// previously observed text. A first observation counts as a change.
    pub fn observe(&mut self, path: &CanonicalPath, text: &str) -> bool {
        let hash = Self::hash_content(text);
        let changed = self.records.get(path.key()) != Some(&hash);
        self.records.insert(path.key().to_string(), hash);
        changed
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
