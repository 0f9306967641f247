//! Build command - one-shot release build

use crate::cli::args::BuildArgs;
use crate::config::{BuildEnvironment, Config};
use crate::error::KilnResult;
use crate::orchestration::{
    create_orchestrator, create_packager, BuildMode, BuildResult, BuildTask,
};
use crate::report::{format_size, render_rows};
use crate::ui::{self, BuildProgress, TaskSpinner, UiContext};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config, project_root: &Path) -> KilnResult<()> {
    let ctx = UiContext::detect();
    let environment = resolve_environment(args.environment.as_deref(), config)?;

    let orchestrator =
        create_orchestrator(config, project_root, environment, BuildMode::Release)?;
    ui::intro(&ctx, &format!("kiln build ({})", environment));

    let sources = orchestrator.layout().discover();
    debug!("Discovered {} source files", sources.len());

    let progress = BuildProgress::new(&ctx, orchestrator.planned_tasks(&sources));
    let observer = progress.clone();
    let orchestrator =
        orchestrator.with_observer(Arc::new(move |task: &BuildTask| observer.on_task(task)));

    let outcome = orchestrator.run_full(&sources).await;
    progress.finish();

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            ui::outro_error(&ctx, "Build failed");
            return Err(e);
        }
    };
    print_summary(&ctx, &result);

    if !args.no_package {
        if let Some(packager) = create_packager(config) {
            let mut spinner = TaskSpinner::new(&ctx);
            spinner.start("Packaging output...");
            match packager
                .package(project_root, &orchestrator.layout().out_root())
                .await
            {
                Ok(archive) => {
                    let size = std::fs::metadata(&archive).map(|m| m.len()).unwrap_or(0);
                    let name = archive.strip_prefix(project_root).unwrap_or(&archive);
                    spinner.stop(&format!("Packaged {} ({})", name.display(), format_size(size)));
                }
                Err(e) => {
                    spinner.stop_error("Packaging failed");
                    return Err(e);
                }
            }
        }
    }

    ui::outro_success(&ctx, "Build complete");
    Ok(())
}

/// Environment from the command line, else the configured default
pub(crate) fn resolve_environment(
    requested: Option<&str>,
    config: &Config,
) -> KilnResult<BuildEnvironment> {
    requested
        .unwrap_or(config.build.environment.as_str())
        .parse()
}

/// Module count, size table and elapsed time of a full build
pub(crate) fn print_summary(ctx: &UiContext, result: &BuildResult) {
    ui::step_ok_detail(
        ctx,
        &format!("Built {} modules", result.module_count),
        &format!("{} ms", result.elapsed.as_millis()),
    );

    if let Some(report) = result.report.as_ref().filter(|r| !r.is_empty()) {
        ui::section(ctx, "Output");
        for row in render_rows(report) {
            println!("  {}", row);
        }
        let total: u64 = report.iter().map(|e| e.size_bytes).sum();
        ui::key_value(ctx, "Total", &format_size(total));
    }
}
