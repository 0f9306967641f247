//! Spinners and progress bars with CI fallback

use super::context::UiContext;
use crate::orchestration::BuildTask;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner for a single long step (packaging)
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    pub fn stop(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.stop(message),
            None => println!("{} {}", style("[OK]").green(), message),
        }
    }

    pub fn stop_error(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.error(message),
            None => println!("{} {}", style("[FAIL]").red(), message),
        }
    }
}

/// Progress over the subtasks of a full build.
///
/// Cloneable so it can be moved into a task observer.
#[derive(Clone)]
pub struct BuildProgress {
    bar: Option<ProgressBar>,
}

impl BuildProgress {
    /// Bar over `total` subtasks in interactive mode, nothing in CI
    pub fn new(ctx: &UiContext, total: usize) -> Self {
        let bar = ctx.use_fancy_output().then(|| {
            let bar = ProgressBar::new(total as u64);
            if let Ok(template) = ProgressStyle::default_bar().template(
                "  {spinner:.yellow} Building  {bar:20.yellow/dim} {pos}/{len} {msg:.dim}  {elapsed:.dim}",
            ) {
                bar.set_style(
                    template
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                        .progress_chars("━╸─"),
                );
            }
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        });
        Self { bar }
    }

    /// Advance by one settled task
    pub fn on_task(&self, task: &BuildTask) {
        match &self.bar {
            Some(bar) => {
                bar.inc(1);
                bar.set_message(task.label.clone());
            }
            None => {
                let mark = if task.is_failed() {
                    style("[FAIL]").red()
                } else {
                    style("[OK]").green()
                };
                println!("  {} {}", mark, task.label);
            }
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}
