//! Shared fakes for unit tests.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use typelint_toolchain::{
    ConfigDiagnostic, LoadOptions, ProgramHandle, ProgramHost, Toolchain, ToolchainError,
};

/// Mutable state behind a [`FakeProgram`], shared with the test so it can
/// stage changes that become visible on the next resync.
#[derive(Debug, Default)]
pub struct FakeState {
    /// Current root files (path strings).
    pub files: BTreeSet<String>,
    /// Root set applied by the next resync, simulating a pending rescan.
    pub staged_files: Option<BTreeSet<String>>,
    pub texts: HashMap<String, Arc<str>>,
    pub resyncs: usize,
    pub bindings: usize,
    pub diagnostics: Vec<ConfigDiagnostic>,
}

/// A [`ProgramHandle`] whose behavior is scripted through [`FakeState`].
pub struct FakeProgram {
    state: Arc<Mutex<FakeState>>,
}

impl FakeProgram {
    pub fn with_files(files: &[&str]) -> Self {
        let state = FakeState {
            files: files.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn state(&self) -> Arc<Mutex<FakeState>> {
        Arc::clone(&self.state)
    }
}

impl ProgramHandle for FakeProgram {
    fn contains_file(&self, path: &Path) -> bool {
        self.state
            .lock()
            .files
            .contains(path.to_string_lossy().as_ref())
    }

    fn source_text(&self, path: &Path) -> Option<Arc<str>> {
        self.state
            .lock()
            .texts
            .get(path.to_string_lossy().as_ref())
            .cloned()
    }

    fn root_file_names(&self) -> Vec<PathBuf> {
        self.state.lock().files.iter().map(PathBuf::from).collect()
    }

    fn project_references(&self) -> Vec<PathBuf> {
        Vec::new()
    }

    fn config_diagnostics(&self) -> Vec<ConfigDiagnostic> {
        self.state.lock().diagnostics.clone()
    }

    fn resync(&mut self) {
        let mut state = self.state.lock();
        state.resyncs += 1;
        if let Some(staged) = state.staged_files.take() {
            state.files = staged;
        }
    }

    fn ensure_bindings(&mut self) {
        self.state.lock().bindings += 1;
    }
}

/// A [`Toolchain`] serving scripted per-config file sets and recording every
/// `load_program` call.
#[derive(Default)]
pub struct FakeToolchain {
    memberships: HashMap<String, Vec<String>>,
    diagnostics: HashMap<String, Vec<ConfigDiagnostic>>,
    loads: Arc<Mutex<Vec<PathBuf>>>,
    states: Arc<Mutex<HashMap<String, Arc<Mutex<FakeState>>>>>,
}

impl FakeToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the files the program for `config` compiles.
    pub fn with_project(mut self, config: &str, files: &[&str]) -> Self {
        self.memberships.insert(
            config.to_string(),
            files.iter().map(|f| f.to_string()).collect(),
        );
        self
    }

    pub fn with_diagnostics(mut self, config: &str, diagnostics: Vec<ConfigDiagnostic>) -> Self {
        self.diagnostics.insert(config.to_string(), diagnostics);
        self
    }

    /// Every config path `load_program` was called with, in order.
    pub fn loads(&self) -> Vec<PathBuf> {
        self.loads.lock().clone()
    }

    /// Shared state of the program built for `config`, if any.
    pub fn program_state(&self, config: &str) -> Option<Arc<Mutex<FakeState>>> {
        self.states.lock().get(config).cloned()
    }
}

impl Toolchain for FakeToolchain {
    fn load_program(
        &self,
        config_path: &Path,
        _host: ProgramHost,
        _options: &LoadOptions,
    ) -> Result<Box<dyn ProgramHandle>, ToolchainError> {
        self.loads.lock().push(config_path.to_path_buf());

        let key = config_path.to_string_lossy().to_string();
        let files = self
            .memberships
            .get(&key)
            .ok_or_else(|| ToolchainError::config_not_found(config_path))?;

        let program = FakeProgram::with_files(&files.iter().map(String::as_str).collect::<Vec<_>>());
        if let Some(diagnostics) = self.diagnostics.get(&key) {
            program.state().lock().diagnostics = diagnostics.clone();
        }
        self.states.lock().insert(key, program.state());
        Ok(Box::new(program))
    }

    fn standard_extensions(&self) -> &[&str] {
        &["ts", "tsx", "js", "jsx"]
    }
}
