//! Configuration schema for Kiln
//!
//! Configuration is read from `kiln.toml` at the project root, falling back
//! to `~/.config/kiln/config.toml`.

use crate::error::{KilnError, KilnResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source and output layout
    pub project: ProjectConfig,

    /// Build behavior
    pub build: BuildConfig,

    /// Script/markup compiler command
    pub compiler: CompilerConfig,

    /// Stylesheet compiler command
    pub styles: StylesConfig,

    /// Release archive packaging
    pub package: PackageConfig,

    /// Style usage cache settings
    pub cache: CacheConfig,
}

/// Project layout, all paths relative to the project root
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Directories scanned for sources and watched for changes
    pub source_dirs: Vec<String>,

    /// Directory whose files are copied verbatim
    pub static_dir: String,

    /// Output directory
    pub out_dir: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            source_dirs: vec!["src".to_string(), "public".to_string()],
            static_dir: crate::classify::DEFAULT_STATIC_DIR.to_string(),
            out_dir: "dist".to_string(),
        }
    }
}

/// Build settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Default environment name: dev, stage or prod
    pub environment: String,

    /// Source map mode for watch builds
    pub sourcemap: SourceMapMode,

    /// File names of the build tooling itself; never trigger rebuilds when
    /// at the project root or directly inside a source directory
    pub tooling: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            environment: BuildEnvironment::Dev.to_string(),
            sourcemap: SourceMapMode::External,
            tooling: vec![
                "kiln.toml".to_string(),
                "build.ts".to_string(),
                "builder.ts".to_string(),
            ],
        }
    }
}

/// Compiler command settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Program to execute
    pub program: String,

    /// Arguments placed before the generated flags and entry paths
    pub args: Vec<String>,

    /// File extension to loader mode, e.g. `".svg" = "file"`
    pub loaders: BTreeMap<String, String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: "bun".to_string(),
            args: vec![
                "build".to_string(),
                "--target".to_string(),
                "browser".to_string(),
            ],
            loaders: BTreeMap::new(),
        }
    }
}

/// Stylesheet compiler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StylesConfig {
    /// Program to execute once per stylesheet
    pub program: String,

    /// Arguments placed before `<source> <output>`
    pub args: Vec<String>,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            program: "sass".to_string(),
            args: vec!["--no-source-map".to_string()],
        }
    }
}

/// Release packaging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    /// Program to execute; empty disables packaging
    pub program: String,

    /// Arguments; `{archive}` and `{out_dir}` are substituted
    pub args: Vec<String>,

    /// Archive path relative to the project root
    pub archive: String,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            program: String::new(),
            args: vec![
                "-r".to_string(),
                "{archive}".to_string(),
                "{out_dir}".to_string(),
            ],
            archive: "extension.zip".to_string(),
        }
    }
}

impl PackageConfig {
    /// Whether a packaging program is configured
    pub fn enabled(&self) -> bool {
        !self.program.trim().is_empty()
    }
}

/// Style usage cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache file relative to the project root
    pub path: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: ".kiln/style-usage.json".to_string(),
        }
    }
}

/// Source map emission mode passed to the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMapMode {
    None,
    External,
}

impl fmt::Display for SourceMapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::External => write!(f, "external"),
        }
    }
}

/// Named build environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildEnvironment {
    Dev,
    Stage,
    Prod,
}

impl FromStr for BuildEnvironment {
    type Err = KilnError;

    fn from_str(s: &str) -> KilnResult<Self> {
        match s {
            "dev" => Ok(Self::Dev),
            "stage" => Ok(Self::Stage),
            "prod" => Ok(Self::Prod),
            other => Err(KilnError::InvalidEnvironment(other.to_string())),
        }
    }
}

impl fmt::Display for BuildEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dev => "dev",
            Self::Stage => "stage",
            Self::Prod => "prod",
        };
        write!(f, "{}", name)
    }
}
