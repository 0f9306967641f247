//! Build collaborator abstractions
//!
//! The orchestrator never compiles anything itself. It hands entry paths to
//! a `Compiler`, stylesheets to a `StyleCompiler` and, for release builds,
//! the finished output tree to a `Packager`. Implementations may shell out
//! (see `command`) or be in-process fakes in tests.

use crate::config::{BuildEnvironment, SourceMapMode};
use crate::error::KilnResult;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Options passed to every `Compiler` invocation
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Absolute project root; entry paths are relative to it
    pub project_root: PathBuf,
    /// Absolute output root
    pub out_root: PathBuf,
    /// Source map emission
    pub sourcemap: SourceMapMode,
    /// Minify output (release builds)
    pub minify: bool,
    /// File extension to loader mode
    pub loaders: BTreeMap<String, String>,
    /// Environment name exposed to the compiled code
    pub environment: BuildEnvironment,
    /// Directory (relative to the project root) output paths are laid out
    /// from; `None` lets the compiler use the entries' common directory
    pub entry_root: Option<PathBuf>,
}

impl CompileOptions {
    /// Options for a one-shot release build
    pub fn release(
        project_root: PathBuf,
        out_root: PathBuf,
        environment: BuildEnvironment,
    ) -> Self {
        Self {
            project_root,
            out_root,
            sourcemap: SourceMapMode::None,
            minify: true,
            loaders: BTreeMap::new(),
            environment,
            entry_root: None,
        }
    }

    /// Options for watch-mode builds
    pub fn watch(
        project_root: PathBuf,
        out_root: PathBuf,
        environment: BuildEnvironment,
        sourcemap: SourceMapMode,
    ) -> Self {
        Self {
            project_root,
            out_root,
            sourcemap,
            minify: false,
            loaders: BTreeMap::new(),
            environment,
            entry_root: None,
        }
    }

    /// Attach a loader table
    pub fn with_loaders(mut self, loaders: BTreeMap<String, String>) -> Self {
        self.loaders = loaders;
        self
    }

    /// Lay output out relative to `root`
    pub fn with_entry_root(mut self, root: Option<PathBuf>) -> Self {
        self.entry_root = root;
        self
    }
}

/// Result of a compiler invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOutcome {
    /// Whether the compiler reported success
    pub success: bool,
    /// Diagnostic lines worth showing to the user
    pub diagnostics: Vec<String>,
    /// Output files produced (absolute or relative to the output root)
    pub artifacts: Vec<PathBuf>,
}

impl CompileOutcome {
    /// A successful outcome with the given artifacts
    pub fn ok(artifacts: Vec<PathBuf>) -> Self {
        Self {
            success: true,
            diagnostics: Vec::new(),
            artifacts,
        }
    }

    /// A failed outcome with the given diagnostics
    pub fn failed(diagnostics: Vec<String>) -> Self {
        Self {
            success: false,
            diagnostics,
            artifacts: Vec::new(),
        }
    }
}

/// Script and markup compiler
#[async_trait]
pub trait Compiler: Send + Sync {
    /// Compile `entries` (project-relative) into `options.out_root`
    async fn compile(
        &self,
        entries: &[PathBuf],
        options: &CompileOptions,
    ) -> KilnResult<CompileOutcome>;

    /// Human-readable name for logs
    fn name(&self) -> &str;
}

/// Stylesheet compiler
///
/// Output lands at `<out_root>/<stem>.css` for each source.
#[async_trait]
pub trait StyleCompiler: Send + Sync {
    /// Compile `sources` (project-relative) into `out_root`
    async fn compile(
        &self,
        project_root: &Path,
        sources: &[PathBuf],
        out_root: &Path,
    ) -> KilnResult<CompileOutcome>;

    /// Human-readable name for logs
    fn name(&self) -> &str;
}

/// Release archive packager
#[async_trait]
pub trait Packager: Send + Sync {
    /// Package `out_root` and return the archive path
    async fn package(&self, project_root: &Path, out_root: &Path) -> KilnResult<PathBuf>;
}

/// Deterministic output location of a compiled stylesheet
pub fn style_output_path(out_root: &Path, source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "style".to_string());
    out_root.join(format!("{}.css", stem))
}
