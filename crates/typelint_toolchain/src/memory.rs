//! In-memory reference toolchain.
//!
//! Implements [`Toolchain`] and [`ProgramHandle`] against the real
//! filesystem with glob-based project membership, without doing any type
//! checking. Project configuration files are JSONC:
//!
//! ```jsonc
//! {
//!   // globs are relative to the config's directory
//!   "include": ["src/**/*"],
//!   "exclude": ["**/generated/**"],
//!   "files": ["polyfill.ts"],
//!   "references": [{ "path": "../lib/project.json" }]
//! }
//! ```
//!
//! Watch callbacks registered through the host push pending change events
//! into the program; `resync()` drains them synchronously, re-walking the
//! project tree after structural events and re-reading changed files
//! through the host's `read_file` hook.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use globset::{Glob, GlobSet, GlobSetBuilder};
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::{
    ConfigDiagnostic, FileChangeKind, LoadOptions, ProgramHandle, ProgramHost, Toolchain,
    ToolchainError,
};

/// Extensions the reference toolchain compiles by default.
pub const STANDARD_EXTENSIONS: &[&str] =
    &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// Counters exposed for observability and tests.
#[derive(Debug, Default)]
pub struct ToolchainStats {
    programs_created: AtomicUsize,
    configs_parsed: AtomicUsize,
    rescans: AtomicUsize,
}

impl ToolchainStats {
    pub fn programs_created(&self) -> usize {
        self.programs_created.load(Ordering::Relaxed)
    }

    pub fn configs_parsed(&self) -> usize {
        self.configs_parsed.load(Ordering::Relaxed)
    }

    pub fn rescans(&self) -> usize {
        self.rescans.load(Ordering::Relaxed)
    }
}

/// The reference toolchain.
#[derive(Debug, Default)]
pub struct MemoryToolchain {
    stats: Arc<ToolchainStats>,
}

impl MemoryToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared counters, incremented by every program this toolchain builds.
    pub fn stats(&self) -> Arc<ToolchainStats> {
        Arc::clone(&self.stats)
    }
}

impl Toolchain for MemoryToolchain {
    fn load_program(
        &self,
        config_path: &Path,
        host: ProgramHost,
        options: &LoadOptions,
    ) -> Result<Box<dyn ProgramHandle>, ToolchainError> {
        let program =
            MemoryProgram::load(config_path, host, options.clone(), Arc::clone(&self.stats))?;
        self.stats.programs_created.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(program))
    }

    fn standard_extensions(&self) -> &[&str] {
        STANDARD_EXTENSIONS
    }
}

/// On-disk shape of a project configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ProjectConfigFile {
    include: Vec<String>,
    exclude: Vec<String>,
    files: Vec<String>,
    references: Vec<ProjectReference>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProjectReference {
    path: String,
}

fn parse_config_file(path: &Path) -> Result<ProjectConfigFile, ToolchainError> {
    let content =
        fs::read_to_string(path).map_err(|_| ToolchainError::config_not_found(path))?;

    let value = jsonc_parser::parse_to_serde_value(&content, &Default::default())
        .map_err(|e| ToolchainError::config_parse(path, e.to_string()))?
        .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

    serde_json::from_value(value).map_err(|e| ToolchainError::config_parse(path, e.to_string()))
}

/// Lexically normalizes a path: absolutizes against the current directory
/// and resolves `.`/`..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Membership test for one project configuration.
#[derive(Debug)]
struct ProjectMatcher {
    base_dir: PathBuf,
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
    explicit: Vec<PathBuf>,
    extensions: Vec<String>,
    /// No `include` and no `files` means everything under the base
    /// directory with an admitted extension.
    admit_all: bool,
}

impl ProjectMatcher {
    fn from_config(
        base_dir: PathBuf,
        config: &ProjectConfigFile,
        extensions: Vec<String>,
        diagnostics: &mut Vec<ConfigDiagnostic>,
    ) -> Self {
        let include = Self::build_globset(&config.include, diagnostics);
        let exclude = Self::build_globset(&config.exclude, diagnostics);
        let explicit = config
            .files
            .iter()
            .map(|f| normalize(&base_dir.join(f)))
            .collect();
        let admit_all = config.include.is_empty() && config.files.is_empty();

        Self {
            base_dir,
            include,
            exclude,
            explicit,
            extensions,
            admit_all,
        }
    }

    fn build_globset(
        patterns: &[String],
        diagnostics: &mut Vec<ConfigDiagnostic>,
    ) -> Option<GlobSet> {
        if patterns.is_empty() {
            return None;
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => {
                    diagnostics.push(ConfigDiagnostic::error(format!(
                        "Invalid glob pattern '{}': {}",
                        pattern, e
                    )));
                }
            }
        }

        match builder.build() {
            Ok(set) => Some(set),
            Err(e) => {
                diagnostics.push(ConfigDiagnostic::error(format!(
                    "Failed to build glob set: {}",
                    e
                )));
                None
            }
        }
    }

    fn extension_admitted(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed == ext))
    }

    /// Whether `path` (normalized, absolute) belongs to this project.
    fn admits(&self, path: &Path) -> bool {
        if self.explicit.iter().any(|f| f == path) {
            return true;
        }

        let Ok(relative) = path.strip_prefix(&self.base_dir) else {
            return false;
        };

        if let Some(exclude) = &self.exclude
            && exclude.is_match(relative)
        {
            return false;
        }

        if !self.extension_admitted(path) {
            return false;
        }

        match &self.include {
            Some(include) => include.is_match(relative),
            None => self.admit_all,
        }
    }
}

#[derive(Debug, Clone)]
enum PendingEvent {
    ConfigChanged,
    FileChanged(PathBuf),
    FileDeleted(PathBuf),
    DirectoryChanged(PathBuf),
}

/// Everything derived from one parse of the configuration file.
struct ConfigState {
    matcher: ProjectMatcher,
    references: Vec<PathBuf>,
    reference_matchers: Vec<ProjectMatcher>,
    diagnostics: Vec<ConfigDiagnostic>,
}

impl ConfigState {
    fn derive(
        base_dir: &Path,
        config: &ProjectConfigFile,
        options: &LoadOptions,
        stats: &ToolchainStats,
    ) -> Self {
        let extensions: Vec<String> = STANDARD_EXTENSIONS
            .iter()
            .map(|e| e.to_string())
            .chain(options.extra_file_extensions.iter().cloned())
            .collect();

        let mut diagnostics = Vec::new();
        let matcher = ProjectMatcher::from_config(
            base_dir.to_path_buf(),
            config,
            extensions.clone(),
            &mut diagnostics,
        );

        let references: Vec<PathBuf> = config
            .references
            .iter()
            .map(|r| normalize(&base_dir.join(&r.path)))
            .collect();

        let mut reference_matchers = Vec::new();
        if options.use_source_of_project_references {
            for reference in &references {
                match parse_config_file(reference) {
                    Ok(ref_config) => {
                        stats.configs_parsed.fetch_add(1, Ordering::Relaxed);
                        let base = reference
                            .parent()
                            .map(Path::to_path_buf)
                            .unwrap_or_else(|| PathBuf::from("/"));
                        reference_matchers.push(ProjectMatcher::from_config(
                            base,
                            &ref_config,
                            extensions.clone(),
                            &mut diagnostics,
                        ));
                    }
                    Err(e) => {
                        warn!("Skipping unreadable project reference: {}", e);
                        diagnostics.push(ConfigDiagnostic::warning(format!(
                            "Unreadable project reference {}: {}",
                            reference.display(),
                            e
                        )));
                    }
                }
            }
        }

        Self {
            matcher,
            references,
            reference_matchers,
            diagnostics,
        }
    }
}

/// One compiled program of the reference toolchain.
pub struct MemoryProgram {
    config_path: PathBuf,
    base_dir: PathBuf,
    host: ProgramHost,
    options: LoadOptions,
    stats: Arc<ToolchainStats>,
    matcher: ProjectMatcher,
    references: Vec<PathBuf>,
    reference_matchers: Vec<ProjectMatcher>,
    diagnostics: Vec<ConfigDiagnostic>,
    files: BTreeMap<PathBuf, Arc<str>>,
    watched: HashSet<PathBuf>,
    pending: Arc<Mutex<Vec<PendingEvent>>>,
    bindings_ready: bool,
}

impl MemoryProgram {
    fn load(
        config_path: &Path,
        host: ProgramHost,
        options: LoadOptions,
        stats: Arc<ToolchainStats>,
    ) -> Result<Self, ToolchainError> {
        let config_path = normalize(config_path);
        let base_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));

        let config = parse_config_file(&config_path)?;
        stats.configs_parsed.fetch_add(1, Ordering::Relaxed);
        let state = ConfigState::derive(&base_dir, &config, &options, &stats);

        let mut program = Self {
            config_path,
            base_dir,
            host,
            options,
            stats,
            matcher: state.matcher,
            references: state.references,
            reference_matchers: state.reference_matchers,
            diagnostics: state.diagnostics,
            files: BTreeMap::new(),
            watched: HashSet::new(),
            pending: Arc::new(Mutex::new(Vec::new())),
            bindings_ready: false,
        };

        program.register_config_watch();
        program.register_directory_watch();
        program.scan();

        Ok(program)
    }

    fn apply_config(&mut self, config: &ProjectConfigFile) {
        let state = ConfigState::derive(&self.base_dir, config, &self.options, &self.stats);
        self.matcher = state.matcher;
        self.references = state.references;
        self.reference_matchers = state.reference_matchers;
        self.diagnostics = state.diagnostics;
    }

    fn register_config_watch(&self) {
        let pending = Arc::clone(&self.pending);
        (self.host.watch_file)(
            &self.config_path,
            Arc::new(move |_path: &Path, _kind: FileChangeKind| {
                pending.lock().push(PendingEvent::ConfigChanged);
            }),
        );
    }

    fn register_directory_watch(&self) {
        let pending = Arc::clone(&self.pending);
        (self.host.watch_directory)(
            &self.base_dir,
            Arc::new(move |path: &Path, _kind: FileChangeKind| {
                pending
                    .lock()
                    .push(PendingEvent::DirectoryChanged(path.to_path_buf()));
            }),
        );
    }

    fn register_file_watches(&mut self) {
        let paths: Vec<PathBuf> = self
            .files
            .keys()
            .filter(|p| !self.watched.contains(*p))
            .cloned()
            .collect();

        for path in paths {
            let pending = Arc::clone(&self.pending);
            (self.host.watch_file)(
                &path,
                Arc::new(move |path: &Path, kind: FileChangeKind| {
                    let event = match kind {
                        FileChangeKind::Changed => PendingEvent::FileChanged(path.to_path_buf()),
                        FileChangeKind::Deleted => PendingEvent::FileDeleted(path.to_path_buf()),
                    };
                    pending.lock().push(event);
                }),
            );
            self.watched.insert(path);
        }
    }

    /// Walks the project tree and rebuilds the root file set, reading every
    /// admitted file through the host.
    fn scan(&mut self) {
        self.stats.rescans.fetch_add(1, Ordering::Relaxed);

        let mut files = BTreeMap::new();
        let walker = WalkDir::new(&self.base_dir).into_iter().filter_entry(|e| {
            e.depth() == 0
                || !e
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.starts_with('.'))
        });

        for entry in walker {
            let Ok(entry) = entry else { continue };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = normalize(entry.path());
            if path == self.config_path {
                continue;
            }
            if self.matcher.admits(&path) {
                let text = (self.host.read_file)(&path).unwrap_or_default();
                files.insert(path, Arc::from(text));
            }
        }

        // Explicit roots may live outside the walked tree.
        for path in &self.matcher.explicit {
            if !files.contains_key(path)
                && let Some(text) = (self.host.read_file)(path)
            {
                files.insert(path.clone(), Arc::from(text));
            }
        }

        debug!(
            "Scanned {}: {} root files",
            self.config_path.display(),
            files.len()
        );
        self.files = files;
        self.register_file_watches();
    }
}

impl ProgramHandle for MemoryProgram {
    fn contains_file(&self, path: &Path) -> bool {
        let path = normalize(path);
        if self.files.contains_key(&path) {
            return true;
        }
        self.options.use_source_of_project_references
            && path.is_file()
            && self.reference_matchers.iter().any(|m| m.admits(&path))
    }

    fn source_text(&self, path: &Path) -> Option<Arc<str>> {
        self.files.get(&normalize(path)).cloned()
    }

    fn root_file_names(&self) -> Vec<PathBuf> {
        self.files.keys().cloned().collect()
    }

    fn project_references(&self) -> Vec<PathBuf> {
        self.references.clone()
    }

    fn config_diagnostics(&self) -> Vec<ConfigDiagnostic> {
        self.diagnostics.clone()
    }

    fn resync(&mut self) {
        let events: Vec<PendingEvent> = self.pending.lock().drain(..).collect();
        if events.is_empty() {
            return;
        }

        let mut rescan = false;
        for event in events {
            match event {
                PendingEvent::ConfigChanged => {
                    match parse_config_file(&self.config_path) {
                        Ok(config) => {
                            self.stats.configs_parsed.fetch_add(1, Ordering::Relaxed);
                            self.apply_config(&config);
                        }
                        Err(e) => {
                            warn!("Config reload failed: {}", e);
                            self.diagnostics.push(ConfigDiagnostic::error(e.to_string()));
                        }
                    }
                    rescan = true;
                }
                PendingEvent::DirectoryChanged(_) => rescan = true,
                PendingEvent::FileDeleted(path) => {
                    self.files.remove(&normalize(&path));
                    rescan = true;
                }
                PendingEvent::FileChanged(path) => {
                    let path = normalize(&path);
                    if self.files.contains_key(&path) || self.matcher.admits(&path) {
                        let text = (self.host.read_file)(&path).unwrap_or_default();
                        self.files.insert(path, Arc::from(text));
                    }
                }
            }
        }

        if rescan {
            self.scan();
        }
    }

    fn ensure_bindings(&mut self) {
        self.bindings_ready = true;
    }
}
