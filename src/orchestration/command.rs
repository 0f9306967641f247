//! Process-backed build collaborators
//!
//! Runs the programs configured in `kiln.toml`. The compiler command line
//! follows the `bun build` flag conventions; the style command is invoked
//! once per stylesheet as `<program> <args..> <source> <output>`.

use crate::classify::{ActionKind, Classifier};
use crate::config::schema::{CompilerConfig, PackageConfig, StylesConfig};
use crate::config::SourceMapMode;
use crate::error::{KilnError, KilnResult};
use crate::orchestration::runtime::{
    style_output_path, CompileOptions, CompileOutcome, Compiler, Packager, StyleCompiler,
};
use crate::orchestration::{build_error_output, stream_child_output};
use async_trait::async_trait;
use futures_util::future::join_all;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Exit status and captured output of one program run
struct ProgramRun {
    success: bool,
    output: Vec<String>,
}

/// Spawn `program` in `cwd`, streaming its output to the debug log
async fn run_program(
    program: &str,
    args: &[String],
    cwd: &Path,
    envs: &[(&str, String)],
) -> KilnResult<ProgramRun> {
    debug!("Executing: {} {:?}", program, args);

    let mut child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .envs(envs.iter().map(|(k, v)| (*k, v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| KilnError::command_failed(format!("{} {:?}", program, args), e))?;

    let label = program.to_string();
    let output = stream_child_output(&mut child, &move |line| {
        debug!("[{}] {}", label, line);
    })
    .await;

    let status = child
        .wait()
        .await
        .map_err(|e| KilnError::command_failed(program, e))?;

    Ok(ProgramRun {
        success: status.success(),
        output,
    })
}

/// Turn a failed run's output into diagnostic lines
fn diagnostics_from(run: &ProgramRun, fallback: &str) -> Vec<String> {
    let tail = build_error_output(&run.output);
    if tail.iter().all(|line| line.trim().is_empty()) {
        vec![fallback.to_string()]
    } else {
        tail
    }
}

/// Compiler that shells out to a bundler
pub struct CommandCompiler {
    config: CompilerConfig,
}

impl CommandCompiler {
    /// Create a compiler from its config section
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    /// Full argument list for one invocation
    fn command_args(&self, entries: &[PathBuf], options: &CompileOptions) -> Vec<String> {
        let mut args = self.config.args.clone();

        args.push("--outdir".to_string());
        args.push(options.out_root.display().to_string());

        if options.minify {
            args.push("--minify".to_string());
        }

        args.push(format!("--sourcemap={}", options.sourcemap));

        if let Some(root) = &options.entry_root {
            args.push("--root".to_string());
            args.push(root.display().to_string());
        }

        for (ext, loader) in &options.loaders {
            args.push("--loader".to_string());
            args.push(format!("{}:{}", ext, loader));
        }

        args.push("--define".to_string());
        args.push(format!(
            "process.env.NODE_ENV=\"{}\"",
            options.environment
        ));

        args.extend(entries.iter().map(|e| e.display().to_string()));
        args
    }
}

#[async_trait]
impl Compiler for CommandCompiler {
    async fn compile(
        &self,
        entries: &[PathBuf],
        options: &CompileOptions,
    ) -> KilnResult<CompileOutcome> {
        let args = self.command_args(entries, options);
        let envs = [("NODE_ENV", options.environment.to_string())];
        let run = run_program(&self.config.program, &args, &options.project_root, &envs).await?;

        if run.success {
            let mut artifacts =
                expected_artifacts(entries, options.entry_root.as_deref(), &options.out_root);
            if options.sourcemap == SourceMapMode::External {
                let maps: Vec<PathBuf> = artifacts
                    .iter()
                    .filter(|a| a.extension().is_some_and(|e| e == "js"))
                    .map(|a| PathBuf::from(format!("{}.map", a.display())))
                    .collect();
                artifacts.extend(maps);
            }
            Ok(CompileOutcome::ok(artifacts))
        } else {
            Ok(CompileOutcome::failed(diagnostics_from(
                &run,
                &format!("{} exited with an error", self.config.program),
            )))
        }
    }

    fn name(&self) -> &str {
        &self.config.program
    }
}

/// Stylesheet compiler that runs one process per source, concurrently
pub struct CommandStyleCompiler {
    config: StylesConfig,
}

impl CommandStyleCompiler {
    /// Create a style compiler from its config section
    pub fn new(config: StylesConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl StyleCompiler for CommandStyleCompiler {
    async fn compile(
        &self,
        project_root: &Path,
        sources: &[PathBuf],
        out_root: &Path,
    ) -> KilnResult<CompileOutcome> {
        tokio::fs::create_dir_all(out_root)
            .await
            .map_err(|e| KilnError::io(format!("creating {}", out_root.display()), e))?;

        let runs = sources.iter().map(|source| async move {
            let output = style_output_path(out_root, source);
            let mut args = self.config.args.clone();
            args.push(source.display().to_string());
            args.push(output.display().to_string());
            let run = run_program(&self.config.program, &args, project_root, &[]).await?;
            Ok::<_, KilnError>((source, output, run))
        });

        let mut outcome = CompileOutcome::ok(Vec::new());
        for result in join_all(runs).await {
            let (source, output, run) = result?;
            if run.success {
                outcome.artifacts.push(output);
            } else {
                outcome.success = false;
                outcome.diagnostics.extend(diagnostics_from(
                    &run,
                    &format!("{} failed for {}", self.config.program, source.display()),
                ));
            }
        }

        Ok(outcome)
    }

    fn name(&self) -> &str {
        &self.config.program
    }
}

/// Packager that runs an archiving program over the output tree
pub struct CommandPackager {
    config: PackageConfig,
}

impl CommandPackager {
    /// Create a packager, or `None` when packaging is not configured
    pub fn from_config(config: &PackageConfig) -> Option<Self> {
        config.enabled().then(|| Self {
            config: config.clone(),
        })
    }
}

#[async_trait]
impl Packager for CommandPackager {
    async fn package(&self, project_root: &Path, out_root: &Path) -> KilnResult<PathBuf> {
        let archive = project_root.join(&self.config.archive);
        if archive.exists() {
            std::fs::remove_file(&archive)
                .map_err(|e| KilnError::io(format!("removing {}", archive.display()), e))?;
        }

        let out_dir = out_root
            .strip_prefix(project_root)
            .unwrap_or(out_root)
            .display()
            .to_string();
        let args: Vec<String> = self
            .config
            .args
            .iter()
            .map(|a| {
                a.replace("{archive}", &self.config.archive)
                    .replace("{out_dir}", &out_dir)
            })
            .collect();

        let run = run_program(&self.config.program, &args, project_root, &[]).await?;
        if !run.success {
            return Err(KilnError::PackageFailed(
                diagnostics_from(&run, "archive program exited with an error").join("\n"),
            ));
        }
        if !archive.exists() {
            return Err(KilnError::PackageFailed(format!(
                "{} was not created",
                archive.display()
            )));
        }

        Ok(archive)
    }
}

/// Output files a bundler writes for `entries`.
///
/// Entries are laid out relative to `entry_root`, or without one relative
/// to their deepest common directory, the same way bundlers flatten
/// multiple entry points. Script sources become `.js`; other entries keep
/// their extension.
pub fn expected_artifacts(
    entries: &[PathBuf],
    entry_root: Option<&Path>,
    out_root: &Path,
) -> Vec<PathBuf> {
    let common = entry_root
        .map(Path::to_path_buf)
        .unwrap_or_else(|| common_parent(entries));
    let classifier = Classifier::default();

    entries
        .iter()
        .map(|entry| {
            let relative = entry.strip_prefix(&common).unwrap_or(entry);
            let mut target = out_root.join(relative);
            if classifier.classify(entry) == ActionKind::Script {
                target.set_extension("js");
            }
            target
        })
        .collect()
}

/// Deepest directory shared by every entry's parent
fn common_parent(entries: &[PathBuf]) -> PathBuf {
    let mut parents = entries.iter().map(|e| e.parent().unwrap_or(Path::new("")));
    let first = match parents.next() {
        Some(p) => p.to_path_buf(),
        None => return PathBuf::new(),
    };

    parents.fold(first, |common, parent| {
        common
            .components()
            .zip(parent.components())
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a.as_os_str())
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildEnvironment;
    use std::collections::BTreeMap;

    fn options() -> CompileOptions {
        CompileOptions::release(
            PathBuf::from("/p"),
            PathBuf::from("/p/dist"),
            BuildEnvironment::Prod,
        )
    }

    #[test]
    fn compiler_args_release() {
        let compiler = CommandCompiler::new(CompilerConfig::default());
        let options = options()
            .with_loaders(BTreeMap::from([(".svg".to_string(), "file".to_string())]))
            .with_entry_root(Some(PathBuf::from("src")));

        let args = compiler.command_args(&[PathBuf::from("src/popup/index.tsx")], &options);
        assert_eq!(&args[..3], &["build", "--target", "browser"]);
        assert!(args.windows(2).any(|w| w == ["--root", "src"]));
        assert!(args.windows(2).any(|w| w == ["--outdir", "/p/dist"]));
        assert!(args.contains(&"--minify".to_string()));
        assert!(args.contains(&"--sourcemap=none".to_string()));
        assert!(args.windows(2).any(|w| w == ["--loader", ".svg:file"]));
        assert!(args.contains(&"process.env.NODE_ENV=\"prod\"".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("src/popup/index.tsx"));
    }

    #[test]
    fn compiler_args_watch() {
        let compiler = CommandCompiler::new(CompilerConfig::default());
        let options = CompileOptions::watch(
            PathBuf::from("/p"),
            PathBuf::from("/p/dist"),
            BuildEnvironment::Dev,
            SourceMapMode::External,
        );
        let args = compiler.command_args(&[PathBuf::from("src/a.ts")], &options);
        assert!(!args.contains(&"--root".to_string()));
        assert!(!args.contains(&"--minify".to_string()));
        assert!(args.contains(&"--sourcemap=external".to_string()));
    }

    #[test]
    fn diagnostics_use_merged_output_or_fallback() {
        let silent = ProgramRun {
            success: false,
            output: vec![String::new()],
        };
        assert_eq!(diagnostics_from(&silent, "bundler failed"), vec!["bundler failed"]);

        let noisy = ProgramRun {
            success: false,
            output: vec!["warn: unused".to_string(), "error: bad import".to_string()],
        };
        assert_eq!(
            diagnostics_from(&noisy, "bundler failed"),
            vec!["warn: unused", "error: bad import"]
        );
    }

    #[test]
    fn artifacts_relative_to_common_dir() {
        let entries = vec![
            PathBuf::from("src/popup/index.tsx"),
            PathBuf::from("src/content/content_script.tsx"),
            PathBuf::from("src/index.html"),
        ];
        let artifacts = expected_artifacts(&entries, None, Path::new("dist"));
        assert_eq!(
            artifacts,
            vec![
                PathBuf::from("dist/popup/index.js"),
                PathBuf::from("dist/content/content_script.js"),
                PathBuf::from("dist/index.html"),
            ]
        );
    }

    #[test]
    fn single_entry_artifact_is_flat() {
        let entries = [PathBuf::from("src/content/x.ts")];
        let artifacts = expected_artifacts(&entries, None, Path::new("dist"));
        assert_eq!(artifacts, vec![PathBuf::from("dist/x.js")]);
    }

    #[test]
    fn entry_root_keeps_structure() {
        let entries = [PathBuf::from("src/content/x.ts")];
        let artifacts = expected_artifacts(&entries, Some(Path::new("src")), Path::new("dist"));
        assert_eq!(artifacts, vec![PathBuf::from("dist/content/x.js")]);
    }

    #[test]
    fn packager_disabled_without_program() {
        assert!(CommandPackager::from_config(&PackageConfig::default()).is_none());
    }

    #[tokio::test]
    async fn missing_program_is_command_error() {
        let compiler = CommandCompiler::new(CompilerConfig {
            program: "kiln-definitely-missing-compiler".to_string(),
            args: vec![],
            loaders: BTreeMap::new(),
        });
        let temp = tempfile::TempDir::new().unwrap();
        let options = CompileOptions::release(
            temp.path().to_path_buf(),
            temp.path().join("dist"),
            BuildEnvironment::Dev,
        );
        let err = compiler
            .compile(&[PathBuf::from("src/a.ts")], &options)
            .await
            .unwrap_err();
        assert!(matches!(err, KilnError::CommandFailed { .. }));
    }
}
