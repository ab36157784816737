//! Canonical path identity.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Component, Path, PathBuf};

/// A normalized, case-correct path used as a cache key.
///
/// Carries the normalized path (original case preserved) plus the folded
/// key string; equality and hashing use only the key. Immutable once
/// derived.
#[derive(Debug, Clone)]
pub struct CanonicalPath {
    path: PathBuf,
    key: String,
}

impl CanonicalPath {
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// The comparable identity key.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.path
    }
}

impl PartialEq for CanonicalPath {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for CanonicalPath {}

impl Hash for CanonicalPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Normalizes file paths to a comparable identity key.
///
/// Relative paths are resolved against a root directory, `.` and `..`
/// components are removed lexically, and on case-insensitive filesystems
/// the key is case-folded so `Foo.ts` and `foo.ts` collide.
#[derive(Debug, Clone)]
pub struct CanonicalPathResolver {
    root: PathBuf,
    fold_case: bool,
}

impl CanonicalPathResolver {
    /// Creates a resolver rooted at `root`, detecting case sensitivity
    /// from the platform.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_case_folding(root, cfg!(any(windows, target_os = "macos")))
    }

    pub fn with_case_folding(root: impl Into<PathBuf>, fold_case: bool) -> Self {
        let root = root.into();
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&root))
                .unwrap_or(root)
        };

        Self {
            root: normalize_components(&root),
            fold_case,
        }
    }

    /// The root directory used for relative resolution.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn canonicalize(&self, path: &Path) -> CanonicalPath {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        let normalized = normalize_components(&absolute);

        let raw = normalized.to_string_lossy();
        let key = if self.fold_case {
            raw.to_lowercase()
        } else {
            raw.into_owned()
        };

        CanonicalPath {
            path: normalized,
            key,
        }
    }
}

fn normalize_components(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            // `..` above the root is dropped rather than preserved.
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolver() -> CanonicalPathResolver {
        CanonicalPathResolver::with_case_folding("/workspace", false)
    }

    use rstest::rstest;

    #[rstest]
    #[case::relative_against_root("src/foo.ts", "/workspace/src/foo.ts")]
    #[case::dot_components("/a/./b/../c/foo.ts", "/a/c/foo.ts")]
    #[case::relative_with_parent("../other/foo.ts", "/other/foo.ts")]
    #[case::parents_above_root("/../../foo.ts", "/foo.ts")]
    fn normalization(#[case] input: &str, #[case] expected: &str) {
        let canonical = resolver().canonicalize(Path::new(input));
        assert_eq!(canonical.as_path(), Path::new(expected));
        assert_eq!(canonical.key(), expected);
    }

    #[test]
    fn case_folding_collides_keys_but_preserves_the_path() {
        let folding = CanonicalPathResolver::with_case_folding("/workspace", true);
        let upper = folding.canonicalize(Path::new("/Src/Foo.ts"));
        let lower = folding.canonicalize(Path::new("/src/foo.ts"));

        assert_eq!(upper, lower);
        assert_eq!(upper.as_path(), Path::new("/Src/Foo.ts"));
    }

    #[test]
    fn case_sensitive_keys_stay_distinct() {
        let upper = resolver().canonicalize(Path::new("/src/Foo.ts"));
        let lower = resolver().canonicalize(Path::new("/src/foo.ts"));
        assert_ne!(upper, lower);
    }

    #[test]
    fn equal_keys_hash_equal() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(resolver().canonicalize(Path::new("src/../src/foo.ts")));
        assert!(set.contains(&resolver().canonicalize(Path::new("src/foo.ts"))));
    }
}
