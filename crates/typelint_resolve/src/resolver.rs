//! Program resolution orchestrator.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;
use tracing::{debug, info};
use typelint_toolchain::{
    FileChangeKind, LoadOptions, ProgramHost, ReadFileHook, Toolchain, WatchHook,
};

use crate::{
    CanonicalPath, CanonicalPathResolver, ContentHashTracker, Invalidation, Program,
    ProgramInvalidator, ProjectEntry, ProjectProgramCache, ResolveError, SharedRegistry,
};

/// Caller-facing configuration for a [`ProgramResolver`].
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Root directory for resolving relative paths.
    pub root_dir: PathBuf,

    /// Non-standard file extensions (without the leading dot) to treat as
    /// source files.
    pub extra_file_extensions: Vec<String>,

    /// Experimental: resolve project references to their original sources
    /// rather than their compiled outputs.
    pub use_source_of_project_references: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            extra_file_extensions: Vec::new(),
            use_source_of_project_references: false,
        }
    }
}

/// The in-memory text of the file currently being resolved, served to the
/// toolchain ahead of whatever is on disk (editor-in-progress edits).
type LintOverlay = Arc<Mutex<Option<(String, Arc<str>)>>>;

/// Public entry point of the resolution layer.
///
/// Owns every cache: programs per project configuration, watch callbacks,
/// content records, and the lint-text overlay. Multiple independent
/// resolvers can coexist; nothing is process-global.
pub struct ProgramResolver<T: Toolchain> {
    toolchain: T,
    options: ResolveOptions,
    canonical: CanonicalPathResolver,
    registry: SharedRegistry,
    invalidator: ProgramInvalidator,
    content: ContentHashTracker,
    cache: ProjectProgramCache,
    overlay: LintOverlay,
}

impl<T: Toolchain> ProgramResolver<T> {
    pub fn new(toolchain: T, options: ResolveOptions) -> Self {
        let canonical = CanonicalPathResolver::new(options.root_dir.clone());
        let registry = SharedRegistry::new();
        let invalidator = ProgramInvalidator::new(canonical.clone(), registry.clone());

        Self {
            toolchain,
            options,
            canonical,
            registry,
            invalidator,
            content: ContentHashTracker::new(),
            cache: ProjectProgramCache::new(),
            overlay: Arc::default(),
        }
    }

    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    /// Returns the program(s) responsible for `path`, creating, reusing, or
    /// selectively invalidating cached programs as needed.
    ///
    /// An empty result means no configured project covers the file; the
    /// caller decides whether that is fatal (see [`Self::resolve_strict`]).
    pub fn resolve(
        &mut self,
        path: &Path,
        text: &str,
        project_configs: &[PathBuf],
    ) -> Result<Vec<Program>, ResolveError> {
        let file = self.canonical.canonicalize(path);
        *self.overlay.lock() = Some((file.key().to_string(), Arc::from(text)));

        // An edit since the last observation is communicated the same way a
        // live watcher would: fire the file's callbacks before any lookup.
        if self.content.observe(&file, text) && self.registry.has_file_callbacks(file.key()) {
            debug!("{} changed since last resolution", file);
            self.registry
                .notify_file(file.key(), file.as_path(), FileChangeKind::Changed);
        }

        // First pass: trust cached membership for a short-circuit hit.
        for key in self.cache.known_keys() {
            let Some(entry) = self.cache.get_mut(&key) else {
                continue;
            };
            if entry.membership(&self.canonical).contains(file.key()) {
                debug!("membership hit for {} in {}", file, entry.config_path());
                entry.program().resync();
                entry.program().ensure_bindings();
                return Ok(vec![entry.program().clone()]);
            }
        }

        // Second pass: walk the caller's configs in order, invalidating
        // stale entries and creating missing ones.
        let mut candidates = Vec::new();
        for raw_config in project_configs {
            let config = self.canonical.canonicalize(raw_config);

            if self.cache.contains(config.key()) {
                let Some(entry) = self.cache.get_mut(config.key()) else {
                    continue;
                };
                match self.invalidator.invalidate(entry, &file)? {
                    Invalidation::Unrelated => {
                        debug!("{} does not cover {}", config, file);
                        continue;
                    }
                    Invalidation::Alive => {
                        entry.program().ensure_bindings();
                        if entry.refresh_membership(&self.canonical).contains(file.key()) {
                            return Ok(vec![entry.program().clone()]);
                        }
                        candidates.push(entry.program().clone());
                    }
                }
            } else {
                let entry = Self::create_entry(
                    &self.toolchain,
                    &self.options,
                    &self.canonical,
                    &self.registry,
                    &self.overlay,
                    &mut self.cache,
                    config,
                )?;
                entry.program().ensure_bindings();
                if entry.membership(&self.canonical).contains(file.key()) {
                    return Ok(vec![entry.program().clone()]);
                }
                candidates.push(entry.program().clone());
            }
        }

        Ok(candidates)
    }

    /// Like [`Self::resolve`], but a result in which no program actually
    /// compiles `path` becomes a descriptive
    /// [`ResolveError::NoMatchingProject`]. Candidate programs that merely
    /// exist (freshly created for a config that turned out not to include
    /// the file) do not count as a match.
    pub fn resolve_strict(
        &mut self,
        path: &Path,
        text: &str,
        project_configs: &[PathBuf],
    ) -> Result<Vec<Program>, ResolveError> {
        let programs = self.resolve(path, text, project_configs)?;
        let file = self.canonical.canonicalize(path);
        if programs
            .iter()
            .any(|program| program.contains_file(file.as_path()))
        {
            Ok(programs)
        } else {
            Err(self.match_failure(path, project_configs))
        }
    }

    /// Purges every owned cache. Idempotent; used between isolated runs.
    pub fn clear(&mut self) {
        self.cache.clear();
        self.registry.clear();
        self.content.clear();
        *self.overlay.lock() = None;
    }

    fn create_entry<'cache>(
        toolchain: &T,
        options: &ResolveOptions,
        canonical: &CanonicalPathResolver,
        registry: &SharedRegistry,
        overlay: &LintOverlay,
        cache: &'cache mut ProjectProgramCache,
        config: CanonicalPath,
    ) -> Result<&'cache mut ProjectEntry, ResolveError> {
        info!("creating program for {}", config);

        let host = Self::build_host(canonical, registry, overlay);
        let load_options = LoadOptions {
            extra_file_extensions: options.extra_file_extensions.clone(),
            use_source_of_project_references: options.use_source_of_project_references,
        };

        let handle = toolchain.load_program(config.as_path(), host, &load_options)?;
        let program = Program::new(handle);

        let fatal: Vec<String> = program
            .config_diagnostics()
            .iter()
            .filter(|diagnostic| diagnostic.is_fatal())
            .map(|diagnostic| diagnostic.message.clone())
            .collect();
        if !fatal.is_empty() {
            return Err(ResolveError::config(config.as_path(), fatal.join("; ")));
        }

        let mtime = config_mtime(&config);
        Ok(cache.insert(ProjectEntry::new(config, program, mtime)))
    }

    /// Wires the toolchain's host object to this resolver's overlay and
    /// registry instead of real I/O.
    fn build_host(
        canonical: &CanonicalPathResolver,
        registry: &SharedRegistry,
        overlay: &LintOverlay,
    ) -> ProgramHost {
        let read_canonical = canonical.clone();
        let read_overlay = Arc::clone(overlay);
        let read_file: ReadFileHook = Arc::new(move |path: &Path| {
            let path = read_canonical.canonicalize(path);
            if let Some((key, text)) = read_overlay.lock().as_ref()
                && key == path.key()
            {
                return Some(text.to_string());
            }
            fs::read_to_string(path.as_path()).ok()
        });

        let file_canonical = canonical.clone();
        let file_registry = registry.clone();
        let watch_file: WatchHook = Arc::new(move |path: &Path, callback| {
            file_registry.watch_file(file_canonical.canonicalize(path).key(), callback);
        });

        let dir_canonical = canonical.clone();
        let dir_registry = registry.clone();
        let watch_directory: WatchHook = Arc::new(move |path: &Path, callback| {
            dir_registry.watch_directory(dir_canonical.canonicalize(path).key(), callback);
        });

        ProgramHost::new(read_file, watch_file, watch_directory)
    }

    fn match_failure(&self, path: &Path, project_configs: &[PathBuf]) -> ResolveError {
        let attempted: Vec<PathBuf> = project_configs
            .iter()
            .map(|config| self.canonical.canonicalize(config).into_path_buf())
            .collect();

        let extension = path.extension().and_then(|e| e.to_str());
        let standard = self.toolchain.standard_extensions();
        let extra = &self.options.extra_file_extensions;

        let hint = match extension {
            Some(ext) if !standard.contains(&ext) => {
                if extra.iter().any(|allowed| allowed == ext) {
                    Some(format!(
                        "The extension `.{ext}` is already listed in extra_file_extensions; \
                         none of the configured projects include this file."
                    ))
                } else {
                    Some(format!(
                        "The extension `.{ext}` is non-standard. \
                         Add it to extra_file_extensions to lint this file."
                    ))
                }
            }
            Some(ext) if extra.iter().any(|allowed| allowed == ext) => Some(format!(
                "The extension `.{ext}` is standard; listing it in extra_file_extensions \
                 has no effect. None of the configured projects include this file."
            )),
            _ => Some("None of the configured projects include this file.".to_string()),
        };

        ResolveError::no_matching_project(path, &attempted, hint)
    }
}

fn config_mtime(config: &CanonicalPath) -> Option<SystemTime> {
    fs::metadata(config.as_path())
        .and_then(|metadata| metadata.modified())
        .ok()
}
