//! Watch command - full build, then incremental rebuilds until Ctrl-C

use crate::cli::args::WatchArgs;
use crate::cli::commands::build::{print_summary, resolve_environment};
use crate::config::Config;
use crate::error::KilnResult;
use crate::orchestration::{create_orchestrator, BuildMode};
use crate::ui::{self, HotReloadNotifier, UiContext};
use crate::watch::{start_watcher, WatchDebouncer};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Execute the watch command
pub async fn execute(args: WatchArgs, config: &Config, project_root: &Path) -> KilnResult<()> {
    let ctx = UiContext::detect();
    let environment = resolve_environment(args.environment.as_deref(), config)?;

    let orchestrator = Arc::new(
        create_orchestrator(config, project_root, environment, BuildMode::Watch)?
            .with_notifier(Arc::new(HotReloadNotifier::stdout())),
    );
    ui::intro(&ctx, &format!("kiln watch ({})", environment));

    // A broken tree at startup should not stop the watcher
    let sources = orchestrator.layout().discover();
    match orchestrator.run_full(&sources).await {
        Ok(result) => print_summary(&ctx, &result),
        Err(e) => ui::step_error_detail(&ctx, "Initial build failed", &e.to_string()),
    }

    let (watcher, mut changes) = start_watcher(project_root, &orchestrator.layout().source_dirs)?;
    for dir in watcher.watched() {
        debug!("Watching {}", dir.display());
    }
    ui::step_info(&ctx, "Watching for changes (Ctrl-C to stop)");

    let mut debouncer = WatchDebouncer::new(
        config.build.tooling.clone(),
        &orchestrator.layout().source_dirs,
    );
    let mut builds = JoinSet::new();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = changes.recv() => {
                let Some(path) = changed else { break };
                let Some(event) = debouncer.on_fs_event(&path) else {
                    debug!("Ignoring tooling change {}", path.display());
                    continue;
                };
                let orchestrator = Arc::clone(&orchestrator);
                builds.spawn(async move {
                    orchestrator.run_partial(&event.path, event.sequence).await
                });
            }
            Some(joined) = builds.join_next(), if !builds.is_empty() => {
                if let Err(e) = joined {
                    warn!("Rebuild task aborted: {}", e);
                }
            }
        }
    }

    drop(watcher);
    println!();
    ui::remark(&ctx, "Shutting down watchers...");

    while let Some(joined) = builds.join_next().await {
        if let Err(e) = joined {
            warn!("Rebuild task aborted: {}", e);
        }
    }

    ui::outro_success(&ctx, "Stopped");
    Ok(())
}
