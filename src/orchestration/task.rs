//! Per-invocation build tasks and their aggregated result

use crate::classify::ActionKind;
use crate::orchestration::runtime::CompileOutcome;
use crate::report::BuildReportEntry;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// One unit of build work (a compiler run, a copy, a style compile)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildTask {
    /// Unique task ID
    pub id: Uuid,

    /// Action kind this task performs
    pub kind: ActionKind,

    /// Short description for progress output
    pub label: String,

    /// Current status
    pub status: TaskStatus,

    /// Diagnostics collected from the collaborator
    pub diagnostics: Vec<String>,

    /// Files written by this task
    pub artifacts: Vec<PathBuf>,
}

impl BuildTask {
    /// Create a pending task
    pub fn new(kind: ActionKind, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            label: label.into(),
            status: TaskStatus::Pending,
            diagnostics: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    /// Mark the task as running
    pub fn start(&mut self) {
        self.status = TaskStatus::Running;
    }

    /// Settle the task from a collaborator outcome
    pub fn settle(&mut self, outcome: CompileOutcome) {
        self.status = if outcome.success {
            TaskStatus::Succeeded
        } else {
            TaskStatus::Failed
        };
        self.diagnostics = outcome.diagnostics;
        self.artifacts = outcome.artifacts;
    }

    /// Settle the task as failed with one diagnostic
    pub fn fail(&mut self, diagnostic: impl Into<String>) {
        self.status = TaskStatus::Failed;
        self.diagnostics.push(diagnostic.into());
    }

    /// Whether the task has failed
    pub fn is_failed(&self) -> bool {
        self.status == TaskStatus::Failed
    }
}

/// Aggregated outcome of one full or partial build
#[derive(Debug, Clone, Default)]
pub struct BuildResult {
    /// Changed path for a partial build, `None` for a full build
    pub target: Option<PathBuf>,

    /// Repeat-change sequence for a partial build
    pub sequence: u32,

    /// Every task launched, in launch order
    pub tasks: Vec<BuildTask>,

    /// Number of source files the build covered
    pub module_count: usize,

    /// Whether a script change cascaded into a full style recompile
    pub cascaded: bool,

    /// Output summary (full builds only)
    pub report: Option<Vec<BuildReportEntry>>,

    /// Wall-clock time of the build
    pub elapsed: Duration,
}

impl BuildResult {
    /// True when no task failed
    pub fn success(&self) -> bool {
        !self.tasks.iter().any(BuildTask::is_failed)
    }

    /// Diagnostics of every failed task
    pub fn diagnostics(&self) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|t| t.is_failed())
            .flat_map(|t| t.diagnostics.iter().cloned())
            .collect()
    }

    /// The output the user cares about for a partial build.
    ///
    /// The first artifact of the last task (the changed file's own compile
    /// or copy), falling back to the changed path itself.
    pub fn primary_output(&self) -> Option<PathBuf> {
        self.tasks
            .last()
            .and_then(|t| t.artifacts.first().cloned())
            .or_else(|| self.target.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_lifecycle() {
        let mut task = BuildTask::new(ActionKind::Script, "compile");
        assert_eq!(task.status, TaskStatus::Pending);

        task.start();
        assert_eq!(task.status, TaskStatus::Running);

        task.settle(CompileOutcome::ok(vec![PathBuf::from("dist/a.js")]));
        assert_eq!(task.status, TaskStatus::Succeeded);
        assert_eq!(task.artifacts, vec![PathBuf::from("dist/a.js")]);
    }

    #[test]
    fn task_ids_unique() {
        let a = BuildTask::new(ActionKind::Style, "a");
        let b = BuildTask::new(ActionKind::Style, "a");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn result_success_and_diagnostics() {
        let mut ok = BuildTask::new(ActionKind::Markup, "copy");
        ok.settle(CompileOutcome::ok(vec![]));
        let mut bad = BuildTask::new(ActionKind::Script, "compile");
        bad.settle(CompileOutcome::failed(vec!["src/a.ts:3 oops".to_string()]));

        let result = BuildResult {
            tasks: vec![ok.clone()],
            ..Default::default()
        };
        assert!(result.success());

        let result = BuildResult {
            tasks: vec![ok, bad],
            ..Default::default()
        };
        assert!(!result.success());
        assert_eq!(result.diagnostics(), vec!["src/a.ts:3 oops"]);
    }

    #[test]
    fn primary_output_falls_back_to_target() {
        let result = BuildResult {
            target: Some(PathBuf::from("src/a.ts")),
            ..Default::default()
        };
        assert_eq!(result.primary_output(), Some(PathBuf::from("src/a.ts")));

        let mut task = BuildTask::new(ActionKind::Script, "compile");
        task.settle(CompileOutcome::ok(vec![PathBuf::from("dist/a.js")]));
        let result = BuildResult {
            target: Some(PathBuf::from("src/a.ts")),
            tasks: vec![task],
            ..Default::default()
        };
        assert_eq!(result.primary_output(), Some(PathBuf::from("dist/a.js")));
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&TaskStatus::Succeeded).unwrap();
        assert_eq!(json, "\"succeeded\"");
    }
}
