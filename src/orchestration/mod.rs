//! Build orchestration
//!
//! Schedules compiler, style compiler and copy subtasks for full and
//! partial builds:
//! - Full: fan out over every source, join, then copy static assets
//! - Partial: one changed path, with a style cascade when class usage changes

pub mod assets;
pub mod command;
mod factory;
pub mod orchestrator;
pub mod runtime;
pub mod task;

pub use assets::AssetCopier;
pub use command::{CommandCompiler, CommandPackager, CommandStyleCompiler};
pub use factory::{create_orchestrator, create_packager, BuildMode};
pub use orchestrator::{BuildOrchestrator, ProjectLayout, TaskObserver};
pub use runtime::{CompileOptions, CompileOutcome, Compiler, Packager, StyleCompiler};
pub use task::{BuildResult, BuildTask, TaskStatus};

use tokio::io::{AsyncBufReadExt, BufReader};

/// Max number of output lines to include in build error messages.
const BUILD_ERROR_TAIL_LINES: usize = 50;

/// Extract the useful tail of merged build output for error diagnostics.
///
/// Returns the last `BUILD_ERROR_TAIL_LINES` lines so error messages are
/// actionable without being overwhelming.
pub(crate) fn build_error_output(output: &[String]) -> Vec<String> {
    let start = output.len().saturating_sub(BUILD_ERROR_TAIL_LINES);
    output[start..].to_vec()
}

/// Stream stdout+stderr from a child process, calling `on_output` for each line.
///
/// Returns all collected output lines for error reporting.
pub(crate) async fn stream_child_output(
    child: &mut tokio::process::Child,
    on_output: &(dyn Fn(String) + Send + Sync),
) -> Vec<String> {
    let stderr = child.stderr.take().expect("stderr piped");
    let stdout = child.stdout.take().expect("stdout piped");

    let mut stderr_reader = BufReader::new(stderr).lines();
    let mut stdout_reader = BufReader::new(stdout).lines();

    let mut all_output = Vec::new();
    let mut stderr_done = false;
    let mut stdout_done = false;

    while !stderr_done || !stdout_done {
        tokio::select! {
            line = stderr_reader.next_line(), if !stderr_done => {
                match line {
                    Ok(Some(line)) => {
                        on_output(line.clone());
                        all_output.push(line);
                    }
                    _ => stderr_done = true,
                }
            }
            line = stdout_reader.next_line(), if !stdout_done => {
                match line {
                    Ok(Some(line)) => {
                        on_output(line.clone());
                        all_output.push(line);
                    }
                    _ => stdout_done = true,
                }
            }
        }
    }

    all_output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_output_keeps_short_output() {
        let output = vec!["a".to_string(), "b".to_string()];
        assert_eq!(build_error_output(&output), output);
    }

    #[test]
    fn error_output_keeps_tail() {
        let output: Vec<String> = (0..80).map(|i| format!("line {i}")).collect();
        let lines = build_error_output(&output);
        assert_eq!(lines.len(), BUILD_ERROR_TAIL_LINES);
        assert_eq!(lines[0], "line 30");
        assert_eq!(lines[BUILD_ERROR_TAIL_LINES - 1], "line 79");
    }
}
