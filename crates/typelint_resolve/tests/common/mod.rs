//! Shared fixtures for program-resolution integration tests.

// Not every test binary uses every fixture method.
#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use typelint_resolve::{ProgramResolver, ResolveOptions};
use typelint_toolchain::memory::MemoryToolchain;

/// A throwaway project workspace on disk.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create workspace tempdir"),
        }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Writes a file (creating parent directories) and returns its path.
    pub fn write(&self, relative: &str, text: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent directories");
        }
        fs::write(&path, text).expect("failed to write fixture file");
        path
    }

    pub fn remove(&self, relative: &str) {
        fs::remove_file(self.path(relative)).expect("failed to remove fixture file");
    }

    pub fn resolver(&self) -> ProgramResolver<MemoryToolchain> {
        self.resolver_with(|_| {})
    }

    pub fn resolver_with(
        &self,
        configure: impl FnOnce(&mut ResolveOptions),
    ) -> ProgramResolver<MemoryToolchain> {
        let mut options = ResolveOptions {
            root_dir: self.dir.path().to_path_buf(),
            ..Default::default()
        };
        configure(&mut options);
        ProgramResolver::new(MemoryToolchain::new(), options)
    }
}
