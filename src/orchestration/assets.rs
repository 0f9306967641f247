//! Markup and static asset copying
//!
//! Markup pages are copied with their source directory stripped
//! (`src/index.html` -> `dist/index.html`). Static assets keep their
//! structure relative to the static directory
//! (`public/icons/16.png` -> `dist/icons/16.png`). Scripts shipped as
//! static assets are copied uncompiled under a `.js` name
//! (`public/background.ts` -> `dist/background.js`).

use crate::classify::{classify, ActionKind};
use crate::error::{KilnError, KilnResult};
use crate::orchestration::runtime::CompileOutcome;
use futures_util::future::join_all;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// A markup page read from the source tree, not yet written
#[derive(Debug, Clone)]
pub struct StagedPage {
    /// Output path the page is written to
    pub destination: PathBuf,
    contents: Vec<u8>,
}

/// Copies non-compiled files into the output tree
#[derive(Debug, Clone)]
pub struct AssetCopier {
    project_root: PathBuf,
    out_root: PathBuf,
    source_dirs: Vec<PathBuf>,
    static_dir: PathBuf,
}

impl AssetCopier {
    /// Create a copier for a project layout
    pub fn new(
        project_root: PathBuf,
        out_root: PathBuf,
        source_dirs: &[String],
        static_dir: &str,
    ) -> Self {
        // Longest prefix first so nested source dirs strip as much as possible
        let mut source_dirs: Vec<PathBuf> = source_dirs.iter().map(PathBuf::from).collect();
        source_dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));

        Self {
            project_root,
            out_root,
            source_dirs,
            static_dir: PathBuf::from(static_dir),
        }
    }

    /// Output path for a markup page
    pub fn markup_destination(&self, path: &Path) -> PathBuf {
        let relative = self
            .source_dirs
            .iter()
            .find_map(|dir| path.strip_prefix(dir).ok())
            .map(Path::to_path_buf)
            .or_else(|| path.file_name().map(PathBuf::from))
            .unwrap_or_else(|| path.to_path_buf());
        self.out_root.join(relative)
    }

    /// Output path for a static asset
    pub fn static_destination(&self, path: &Path) -> PathBuf {
        let relative = path.strip_prefix(&self.static_dir).unwrap_or(path);
        let mut target = self.out_root.join(relative);
        if classify(path) == ActionKind::Script {
            target.set_extension("js");
        }
        target
    }

    /// Copy markup pages with their destination rewritten
    pub async fn copy_markup(&self, paths: &[PathBuf]) -> KilnResult<CompileOutcome> {
        let pages = self.stage_markup(paths).await?;
        self.write_pages(pages).await
    }

    /// Read markup pages into memory without touching the output tree
    pub async fn stage_markup(&self, paths: &[PathBuf]) -> KilnResult<Vec<StagedPage>> {
        let reads = paths.iter().map(|path| async move {
            let from = self.project_root.join(path);
            let contents = fs::read(&from)
                .await
                .map_err(|e| KilnError::io(format!("reading {}", from.display()), e))?;
            Ok::<_, KilnError>(StagedPage {
                destination: self.markup_destination(path),
                contents,
            })
        });

        join_all(reads).await.into_iter().collect()
    }

    /// Write staged pages to their destinations, replacing whatever is there
    pub async fn write_pages(&self, pages: Vec<StagedPage>) -> KilnResult<CompileOutcome> {
        let writes = pages.into_iter().map(|page| async move {
            if let Some(parent) = page.destination.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| KilnError::io(format!("creating {}", parent.display()), e))?;
            }
            fs::write(&page.destination, &page.contents)
                .await
                .map_err(|e| KilnError::io(format!("writing {}", page.destination.display()), e))?;
            debug!("Wrote page {}", page.destination.display());
            Ok::<_, KilnError>(page.destination)
        });

        let mut artifacts = Vec::new();
        for result in join_all(writes).await {
            artifacts.push(result?);
        }
        Ok(CompileOutcome::ok(artifacts))
    }

    /// Copy static assets preserving structure under the static directory
    pub async fn copy_static(&self, paths: &[PathBuf]) -> KilnResult<CompileOutcome> {
        self.copy_all(paths, |p| self.static_destination(p)).await
    }

    async fn copy_all<F>(&self, paths: &[PathBuf], destination: F) -> KilnResult<CompileOutcome>
    where
        F: Fn(&Path) -> PathBuf,
    {
        let copies = paths.iter().map(|path| {
            let target = destination(path);
            async move {
                self.copy_one(path, &target).await?;
                Ok::<_, KilnError>(target)
            }
        });

        let mut artifacts = Vec::with_capacity(paths.len());
        for result in join_all(copies).await {
            artifacts.push(result?);
        }
        Ok(CompileOutcome::ok(artifacts))
    }

    async fn copy_one(&self, source: &Path, target: &Path) -> KilnResult<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| KilnError::io(format!("creating {}", parent.display()), e))?;
        }

        let from = self.project_root.join(source);
        fs::copy(&from, target).await.map_err(|e| {
            KilnError::io(
                format!("copying {} to {}", from.display(), target.display()),
                e,
            )
        })?;

        debug!("Copied {} -> {}", source.display(), target.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn copier(root: &Path) -> AssetCopier {
        AssetCopier::new(
            root.to_path_buf(),
            root.join("dist"),
            &["src".to_string(), "public".to_string()],
            "public",
        )
    }

    #[test]
    fn markup_destination_strips_source_dir() {
        let c = copier(Path::new("/p"));
        assert_eq!(
            c.markup_destination(Path::new("src/index.html")),
            PathBuf::from("/p/dist/index.html")
        );
        assert_eq!(
            c.markup_destination(Path::new("src/popup/popup.html")),
            PathBuf::from("/p/dist/popup/popup.html")
        );
        assert_eq!(
            c.markup_destination(Path::new("elsewhere/page.html")),
            PathBuf::from("/p/dist/page.html")
        );
    }

    #[test]
    fn nested_source_dir_wins() {
        let c = AssetCopier::new(
            PathBuf::from("/p"),
            PathBuf::from("/p/dist"),
            &["src".to_string(), "src/pages".to_string()],
            "public",
        );
        assert_eq!(
            c.markup_destination(Path::new("src/pages/options.html")),
            PathBuf::from("/p/dist/options.html")
        );
    }

    #[test]
    fn static_destination_preserves_structure() {
        let c = copier(Path::new("/p"));
        assert_eq!(
            c.static_destination(Path::new("public/icons/16.png")),
            PathBuf::from("/p/dist/icons/16.png")
        );
        assert_eq!(
            c.static_destination(Path::new("public/manifest.json")),
            PathBuf::from("/p/dist/manifest.json")
        );
    }

    #[test]
    fn static_script_lands_as_js() {
        let c = copier(Path::new("/p"));
        assert_eq!(
            c.static_destination(Path::new("public/background.ts")),
            PathBuf::from("/p/dist/background.js")
        );
    }

    #[tokio::test]
    async fn copies_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("public/icons")).unwrap();
        std::fs::write(root.join("public/icons/16.png"), b"png").unwrap();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::write(root.join("src/index.html"), "<html></html>").unwrap();

        let c = copier(root);
        let outcome = c
            .copy_static(&[PathBuf::from("public/icons/16.png")])
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(
            std::fs::read(root.join("dist/icons/16.png")).unwrap(),
            b"png"
        );

        c.copy_markup(&[PathBuf::from("src/index.html")]).await.unwrap();
        assert!(root.join("dist/index.html").exists());
    }

    #[tokio::test]
    async fn staging_leaves_output_untouched() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::write(root.join("src/index.html"), "<html>page</html>").unwrap();

        let c = copier(root);
        let pages = c.stage_markup(&[PathBuf::from("src/index.html")]).await.unwrap();
        assert_eq!(pages[0].destination, root.join("dist/index.html"));
        assert!(!root.join("dist").exists());

        std::fs::create_dir_all(root.join("dist")).unwrap();
        std::fs::write(root.join("dist/index.html"), "bundled").unwrap();
        c.write_pages(pages).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(root.join("dist/index.html")).unwrap(),
            "<html>page</html>"
        );
    }

    #[tokio::test]
    async fn missing_source_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = copier(temp.path())
            .copy_static(&[PathBuf::from("public/gone.png")])
            .await
            .unwrap_err();
        assert!(matches!(err, KilnError::Io { .. }));
    }
}
