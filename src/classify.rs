//! Source file classification
//!
//! Maps a project-relative path to the build action that handles it.
//! Classification looks only at the extension and the leading path
//! components, never at file contents.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};

/// Default directory holding files copied verbatim into the output tree
pub const DEFAULT_STATIC_DIR: &str = "public";

/// Build action for a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Script or component source, compiled by the Compiler
    Script,
    /// HTML page, copied with its destination rewritten
    Markup,
    /// Style source, compiled by the StyleCompiler
    Style,
    /// File under the static directory, copied as-is
    StaticAsset,
    /// Anything else; forwarded to the Compiler as a best effort
    Unknown,
}

impl ActionKind {
    /// Extensions handled by the StyleCompiler
    const STYLE_EXTENSIONS: &'static [&'static str] = &["scss", "sass", "css"];

    /// Script and markup-component extensions handled by the Compiler
    const SCRIPT_EXTENSIONS: &'static [&'static str] = &[
        "ts", "tsx", "js", "jsx", "mjs", "cjs", "mts", "cts", "vue", "svelte",
    ];

    /// Markup page extensions
    const MARKUP_EXTENSIONS: &'static [&'static str] = &["html", "htm"];
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Script => "script",
            Self::Markup => "markup",
            Self::Style => "style",
            Self::StaticAsset => "static",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// Path classifier bound to a static directory
#[derive(Debug, Clone)]
pub struct Classifier {
    static_dir: String,
}

impl Classifier {
    /// Create a classifier treating `static_dir` as the static asset root
    pub fn new(static_dir: impl Into<String>) -> Self {
        let static_dir = static_dir.into();
        Self {
            static_dir: static_dir.trim_matches('/').to_string(),
        }
    }

    /// The static asset root this classifier was built with
    pub fn static_dir(&self) -> &str {
        &self.static_dir
    }

    /// Classify a path. Total and side-effect free.
    pub fn classify(&self, path: &Path) -> ActionKind {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if ActionKind::STYLE_EXTENSIONS.contains(&ext.as_str()) {
            ActionKind::Style
        } else if ActionKind::SCRIPT_EXTENSIONS.contains(&ext.as_str()) {
            ActionKind::Script
        } else if ActionKind::MARKUP_EXTENSIONS.contains(&ext.as_str()) {
            ActionKind::Markup
        } else if self.is_static(path) {
            ActionKind::StaticAsset
        } else {
            ActionKind::Unknown
        }
    }

    /// Action a build takes for `path`.
    ///
    /// Same as `classify`, except that everything under the static
    /// directory other than stylesheets is copied rather than compiled.
    /// Full and partial builds both route through here so an edited file
    /// lands where the full build put it.
    pub fn route(&self, path: &Path) -> ActionKind {
        match self.classify(path) {
            ActionKind::Style => ActionKind::Style,
            _ if self.is_static(path) => ActionKind::StaticAsset,
            kind => kind,
        }
    }

    /// Whether a path is rooted under the static directory
    pub fn is_static(&self, path: &Path) -> bool {
        if self.static_dir.is_empty() {
            return false;
        }
        let relative = strip_cur_dir(path);
        relative.starts_with(Path::new(&self.static_dir))
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_STATIC_DIR)
    }
}

/// Classify with the default static directory
pub fn classify(path: &Path) -> ActionKind {
    Classifier::default().classify(path)
}

/// Drop leading `./` components so `./public/x` and `public/x` agree
fn strip_cur_dir(path: &Path) -> &Path {
    let mut rest = path;
    while let Some(Component::CurDir) = rest.components().next() {
        rest = match rest.strip_prefix(".") {
            Ok(p) => p,
            Err(_) => break,
        };
    }
    rest
}
