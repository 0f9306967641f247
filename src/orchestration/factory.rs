//! Orchestrator factory
//!
//! Wires the configured command collaborators, the usage cache and the
//! project layout into a `BuildOrchestrator` for a given build mode.

use crate::cache::StyleUsageCache;
use crate::config::{BuildEnvironment, Config};
use crate::error::{KilnError, KilnResult};
use crate::orchestration::command::{CommandCompiler, CommandPackager, CommandStyleCompiler};
use crate::orchestration::orchestrator::{BuildOrchestrator, ProjectLayout};
use crate::orchestration::runtime::{CompileOptions, Packager};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// How the output is meant to be consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// One-shot minified build without source maps
    Release,
    /// Incremental development build
    Watch,
}

impl BuildMode {
    /// Human-readable mode name
    pub fn name(&self) -> &'static str {
        match self {
            BuildMode::Release => "release",
            BuildMode::Watch => "watch",
        }
    }
}

/// Create an orchestrator for the project at `project_root`
///
/// # Returns
/// * `Ok(BuildOrchestrator)` - Ready to run full or partial builds
/// * `Err` - If the project root does not exist
pub fn create_orchestrator(
    config: &Config,
    project_root: &Path,
    environment: BuildEnvironment,
    mode: BuildMode,
) -> KilnResult<BuildOrchestrator> {
    if !project_root.is_dir() {
        return Err(KilnError::ProjectNotFound(project_root.to_path_buf()));
    }

    let layout = ProjectLayout::from_config(project_root.to_path_buf(), &config.project);
    let out_root = layout.out_root();

    debug!("Creating {} orchestrator for {}", mode.name(), project_root.display());

    let options = match mode {
        BuildMode::Release => {
            CompileOptions::release(project_root.to_path_buf(), out_root, environment)
        }
        BuildMode::Watch => CompileOptions::watch(
            project_root.to_path_buf(),
            out_root,
            environment,
            config.build.sourcemap,
        ),
    }
    .with_loaders(config.compiler.loaders.clone());

    let cache = Arc::new(StyleUsageCache::new(project_root.join(&config.cache.path)));

    Ok(BuildOrchestrator::new(
        layout,
        Arc::new(CommandCompiler::new(config.compiler.clone())),
        Arc::new(CommandStyleCompiler::new(config.styles.clone())),
        cache,
        options,
    ))
}

/// Create the release packager, if one is configured
pub fn create_packager(config: &Config) -> Option<Box<dyn Packager>> {
    CommandPackager::from_config(&config.package).map(|p| Box::new(p) as Box<dyn Packager>)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn mode_name() {
        assert_eq!(BuildMode::Release.name(), "release");
        assert_eq!(BuildMode::Watch.name(), "watch");
    }

    #[test]
    fn missing_project_root_rejected() {
        let temp = TempDir::new().unwrap();
        let result = create_orchestrator(
            &Config::default(),
            &temp.path().join("nope"),
            BuildEnvironment::Dev,
            BuildMode::Release,
        );
        assert!(matches!(result, Err(KilnError::ProjectNotFound(_))));
    }

    #[test]
    fn layout_follows_config() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.project.out_dir = "build".to_string();

        let orchestrator = create_orchestrator(
            &config,
            temp.path(),
            BuildEnvironment::Dev,
            BuildMode::Watch,
        )
        .unwrap();

        assert_eq!(orchestrator.layout().out_root(), temp.path().join("build"));
        assert_eq!(
            orchestrator.cache().path(),
            temp.path().join(".kiln/style-usage.json")
        );
    }

    #[test]
    fn packager_only_when_configured() {
        let mut config = Config::default();
        assert!(create_packager(&config).is_none());

        config.package.program = "zip".to_string();
        assert!(create_packager(&config).is_some());
    }
}
