//! Full and partial build scheduling
//!
//! A full build fans out into three independent subtasks (compiler, markup
//! copy, style compiler), joins them, and only then copies static assets.
//! A partial build handles one changed path; script edits that change
//! style-class usage cascade into recompiling every stylesheet.

use crate::cache::{extract_tokens, StyleUsageCache};
use crate::classify::{ActionKind, Classifier};
use crate::config::schema::ProjectConfig;
use crate::error::{KilnError, KilnResult};
use crate::orchestration::assets::AssetCopier;
use crate::orchestration::runtime::{CompileOptions, CompileOutcome, Compiler, StyleCompiler};
use crate::orchestration::task::{BuildResult, BuildTask};
use crate::report;
use crate::ui::HotReloadNotifier;
use crate::walker::{discover_sources, relative_to};
use chrono::Local;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Callback invoked with every settled task
pub type TaskObserver = Arc<dyn Fn(&BuildTask) + Send + Sync>;

/// Where sources live and where output goes
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    /// Absolute project root
    pub root: PathBuf,
    /// Source directories relative to the root
    pub source_dirs: Vec<String>,
    /// Static asset directory relative to the root
    pub static_dir: String,
    /// Output directory relative to the root
    pub out_dir: String,
}

impl ProjectLayout {
    /// Layout from the `[project]` config section
    pub fn from_config(root: PathBuf, config: &ProjectConfig) -> Self {
        Self {
            root,
            source_dirs: config.source_dirs.clone(),
            static_dir: config.static_dir.clone(),
            out_dir: config.out_dir.clone(),
        }
    }

    /// Absolute output root
    pub fn out_root(&self) -> PathBuf {
        self.root.join(&self.out_dir)
    }

    /// Every source file currently in the tree
    pub fn discover(&self) -> Vec<PathBuf> {
        discover_sources(&self.root, &self.source_dirs)
    }
}

/// Sources of a full build split by the subtask that handles them
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FullPlan {
    /// Script, markup and unknown files outside the static directory
    pub entries: Vec<PathBuf>,
    /// Markup pages outside the static directory
    pub markup: Vec<PathBuf>,
    /// Stylesheets anywhere in the tree
    pub styles: Vec<PathBuf>,
    /// Non-style files under the static directory
    pub statics: Vec<PathBuf>,
    /// Script files outside the static directory; their class usage seeds
    /// the cache
    pub scripts: Vec<PathBuf>,
}

impl FullPlan {
    /// Partition sources by build route
    pub fn partition(classifier: &Classifier, sources: &[PathBuf]) -> Self {
        let mut plan = Self::default();

        for path in sources {
            match classifier.route(path) {
                ActionKind::Style => plan.styles.push(path.clone()),
                ActionKind::StaticAsset => plan.statics.push(path.clone()),
                ActionKind::Script => {
                    plan.scripts.push(path.clone());
                    plan.entries.push(path.clone());
                }
                ActionKind::Markup => {
                    plan.entries.push(path.clone());
                    plan.markup.push(path.clone());
                }
                ActionKind::Unknown => plan.entries.push(path.clone()),
            }
        }

        plan
    }
}

/// Schedules build subtasks against the configured collaborators
pub struct BuildOrchestrator {
    layout: ProjectLayout,
    classifier: Classifier,
    compiler: Arc<dyn Compiler>,
    styles: Arc<dyn StyleCompiler>,
    assets: AssetCopier,
    cache: Arc<StyleUsageCache>,
    options: CompileOptions,
    notifier: Option<Arc<HotReloadNotifier>>,
    observer: Option<TaskObserver>,
}

impl BuildOrchestrator {
    /// Create an orchestrator. `options.out_root` should match the layout.
    pub fn new(
        layout: ProjectLayout,
        compiler: Arc<dyn Compiler>,
        styles: Arc<dyn StyleCompiler>,
        cache: Arc<StyleUsageCache>,
        options: CompileOptions,
    ) -> Self {
        let classifier = Classifier::new(layout.static_dir.clone());
        let assets = AssetCopier::new(
            layout.root.clone(),
            layout.out_root(),
            &layout.source_dirs,
            &layout.static_dir,
        );

        Self {
            layout,
            classifier,
            compiler,
            styles,
            assets,
            cache,
            options,
            notifier: None,
            observer: None,
        }
    }

    /// Emit a hot-reload line after every partial build
    pub fn with_notifier(mut self, notifier: Arc<HotReloadNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Observe tasks as they settle
    pub fn with_observer(mut self, observer: TaskObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Project layout
    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// The shared usage cache
    pub fn cache(&self) -> &Arc<StyleUsageCache> {
        &self.cache
    }

    /// Number of subtasks a full build over `sources` will launch
    pub fn planned_tasks(&self, sources: &[PathBuf]) -> usize {
        let plan = FullPlan::partition(&self.classifier, sources);
        [
            !plan.entries.is_empty(),
            !plan.markup.is_empty(),
            !plan.styles.is_empty(),
            !plan.statics.is_empty(),
        ]
        .iter()
        .filter(|launched| **launched)
        .count()
    }

    /// Build every source into the output tree.
    ///
    /// Any subtask failure is returned as an error; in that case no static
    /// assets are copied and no report is produced.
    pub async fn run_full(&self, sources: &[PathBuf]) -> KilnResult<BuildResult> {
        let started = Instant::now();
        let plan = FullPlan::partition(&self.classifier, sources);

        info!(
            "Full build: {} entries, {} markup, {} styles, {} static",
            plan.entries.len(),
            plan.markup.len(),
            plan.styles.len(),
            plan.statics.len()
        );

        let compile = async {
            if plan.entries.is_empty() {
                None
            } else {
                Some(self.compile_task(&plan.entries).await)
            }
        };
        let markup = async {
            if plan.markup.is_empty() {
                None
            } else {
                Some(self.assets.stage_markup(&plan.markup).await)
            }
        };
        let styles = async {
            if plan.styles.is_empty() {
                None
            } else {
                Some(self.style_task(&plan.styles).await)
            }
        };

        let (compiled, staged, styled) = tokio::join!(compile, markup, styles);

        if let Some(task) = compiled.as_ref().filter(|t| t.is_failed()) {
            return Err(KilnError::build_failed(self.compiler.name(), &task.diagnostics));
        }
        if let Some(task) = styled.as_ref().filter(|t| t.is_failed()) {
            return Err(KilnError::build_failed(&task.label, &task.diagnostics));
        }

        // Pages are written only once the Compiler has settled, so the
        // copied page replaces anything the Compiler emitted at that path.
        let copied = match staged {
            Some(staged) => {
                let task = BuildTask::new(ActionKind::Markup, Self::markup_label(&plan.markup));
                let write = async {
                    match staged {
                        Ok(pages) => self.assets.write_pages(pages).await,
                        Err(e) => Err(e),
                    }
                };
                let task = self.run_task(task, write).await;
                if task.is_failed() {
                    return Err(KilnError::build_failed(&task.label, &task.diagnostics));
                }
                Some(task)
            }
            None => None,
        };

        let mut tasks: Vec<BuildTask> = [compiled, copied, styled].into_iter().flatten().collect();

        if !plan.statics.is_empty() {
            let task = self.static_task(&plan.statics).await;
            if task.is_failed() {
                return Err(KilnError::build_failed(&task.label, &task.diagnostics));
            }
            tasks.push(task);
        }

        self.seed_usage_cache(&plan.scripts).await;

        let report = match report::summarize(&self.layout.out_root()) {
            Ok(entries) => Some(entries),
            Err(e) => {
                warn!("Could not summarize build output: {}", e);
                None
            }
        };

        Ok(BuildResult {
            target: None,
            sequence: 0,
            tasks,
            module_count: sources.len(),
            cascaded: false,
            report,
            elapsed: started.elapsed(),
        })
    }

    /// Rebuild whatever one changed path affects.
    ///
    /// Never fails: errors are recorded as failed tasks, logged and shown in
    /// the single notifier line this emits.
    pub async fn run_partial(&self, changed: &Path, sequence: u32) -> BuildResult {
        let started = Instant::now();
        let path = relative_to(&self.layout.root, changed).unwrap_or_else(|| changed.to_path_buf());
        let kind = self.classifier.route(&path);
        debug!("Partial build #{} for {} ({})", sequence, path.display(), kind);

        let mut result = BuildResult {
            target: Some(path.clone()),
            sequence,
            module_count: 1,
            ..Default::default()
        };

        match kind {
            ActionKind::Style => {
                result.tasks.push(self.style_task(std::slice::from_ref(&path)).await);
            }
            ActionKind::Script => {
                match self.usage_changed(&path).await {
                    Ok(true) => {
                        let styles = self.current_styles();
                        if !styles.is_empty() {
                            info!(
                                "Class usage changed in {}, recompiling {} stylesheet(s)",
                                path.display(),
                                styles.len()
                            );
                            result.cascaded = true;
                            result.tasks.push(self.style_task(&styles).await);
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        let mut task = BuildTask::new(ActionKind::Style, "class usage");
                        task.fail(e.to_string());
                        self.observe(&task);
                        result.tasks.push(task);
                    }
                }
                result.tasks.push(self.compile_task(std::slice::from_ref(&path)).await);
            }
            ActionKind::Markup => {
                result.tasks.push(self.markup_task(std::slice::from_ref(&path)).await);
            }
            ActionKind::StaticAsset => {
                result.tasks.push(self.static_task(std::slice::from_ref(&path)).await);
            }
            ActionKind::Unknown => {
                result.tasks.push(self.compile_task(std::slice::from_ref(&path)).await);
            }
        }

        result.elapsed = started.elapsed();

        if !result.success() {
            warn!(
                "Rebuild of {} failed:\n{}",
                path.display(),
                result.diagnostics().join("\n")
            );
        }

        if let Some(notifier) = &self.notifier {
            let output = result
                .primary_output()
                .map(|p| relative_to(&self.layout.root, &p).unwrap_or(p))
                .unwrap_or_else(|| path.clone());
            notifier.notify(&output, sequence, Local::now(), result.success());
        }

        result
    }

    /// Read a script, extract its class tokens and consult the cache
    async fn usage_changed(&self, path: &Path) -> KilnResult<bool> {
        let full = self.layout.root.join(path);
        let source = tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| KilnError::io(format!("reading {}", full.display()), e))?;
        let tokens = extract_tokens(&source);
        self.cache
            .has_changed(&path.to_string_lossy(), &tokens)
            .await
    }

    /// Record class usage for every script after a successful full build
    async fn seed_usage_cache(&self, scripts: &[PathBuf]) {
        for path in scripts {
            if let Err(e) = self.usage_changed(path).await {
                debug!("Skipping usage for {}: {}", path.display(), e);
            }
        }
    }

    /// Stylesheets currently in the source tree
    fn current_styles(&self) -> Vec<PathBuf> {
        self.layout
            .discover()
            .into_iter()
            .filter(|p| self.classifier.classify(p) == ActionKind::Style)
            .collect()
    }

    /// Source directory containing every entry, so a single-file rebuild
    /// lands where the full build put it
    fn entry_root(&self, entries: &[PathBuf]) -> Option<PathBuf> {
        let mut dirs: Vec<&String> = self.layout.source_dirs.iter().collect();
        dirs.sort_by_key(|d| std::cmp::Reverse(Path::new(d).components().count()));
        dirs.into_iter()
            .map(PathBuf::from)
            .find(|dir| entries.iter().all(|e| e.starts_with(dir)))
    }

    async fn compile_task(&self, entries: &[PathBuf]) -> BuildTask {
        let task = BuildTask::new(ActionKind::Script, format!("compile {} file(s)", entries.len()));
        let options = self
            .options
            .clone()
            .with_entry_root(self.entry_root(entries));
        self.run_task(task, self.compiler.compile(entries, &options))
            .await
    }

    async fn style_task(&self, sources: &[PathBuf]) -> BuildTask {
        let task = BuildTask::new(ActionKind::Style, format!("{} stylesheet(s)", sources.len()));
        let out_root = self.layout.out_root();
        self.run_task(
            task,
            self.styles.compile(&self.layout.root, sources, &out_root),
        )
        .await
    }

    async fn markup_task(&self, paths: &[PathBuf]) -> BuildTask {
        let task = BuildTask::new(ActionKind::Markup, Self::markup_label(paths));
        self.run_task(task, self.assets.copy_markup(paths)).await
    }

    fn markup_label(paths: &[PathBuf]) -> String {
        format!("copy {} page(s)", paths.len())
    }

    async fn static_task(&self, paths: &[PathBuf]) -> BuildTask {
        let task = BuildTask::new(ActionKind::StaticAsset, format!("copy {} asset(s)", paths.len()));
        self.run_task(task, self.assets.copy_static(paths)).await
    }

    /// Drive one subtask to completion and settle its task record
    async fn run_task<F>(&self, mut task: BuildTask, work: F) -> BuildTask
    where
        F: Future<Output = KilnResult<CompileOutcome>>,
    {
        task.start();
        match work.await {
            Ok(outcome) => task.settle(outcome),
            Err(e) => task.fail(e.to_string()),
        }
        debug!("Task {} ({}) {:?}", task.label, task.id, task.status);
        self.observe(&task);
        task
    }

    fn observe(&self, task: &BuildTask) {
        if let Some(observer) = &self.observer {
            observer(task);
        }
    }
}
