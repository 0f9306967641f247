//! Error types for Kiln
//!
//! All modules use `KilnResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Kiln operations
pub type KilnResult<T> = Result<T, KilnError>;

/// All errors that can occur in Kiln
#[derive(Error, Debug)]
pub enum KilnError {
    // Configuration errors
    #[error("Unknown build environment: {0}")]
    InvalidEnvironment(String),

    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Project directory not found: {0}")]
    ProjectNotFound(PathBuf),

    // Build errors
    #[error("{stage} failed:\n{diagnostics}")]
    BuildFailed { stage: String, diagnostics: String },

    #[error("Packaging failed: {0}")]
    PackageFailed(String),

    // Watch errors
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl KilnError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a build failure for a named stage
    pub fn build_failed(stage: impl Into<String>, diagnostics: &[String]) -> Self {
        Self::BuildFailed {
            stage: stage.into(),
            diagnostics: diagnostics.join("\n"),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidEnvironment(_) => Some("Use one of: dev, stage, prod"),
            Self::ConfigInvalid { .. } => Some("Run: kiln config init --force"),
            Self::ProjectNotFound(_) => Some("Pass the project root with --project"),
            Self::CommandFailed { .. } => {
                Some("Check the [compiler] and [styles] programs in kiln.toml")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = KilnError::InvalidEnvironment("qa".to_string());
        assert!(err.to_string().contains("Unknown build environment: qa"));
    }

    #[test]
    fn error_hint() {
        let err = KilnError::InvalidEnvironment("qa".to_string());
        assert_eq!(err.hint(), Some("Use one of: dev, stage, prod"));
        assert_eq!(KilnError::Internal("x".into()).hint(), None);
    }

    #[test]
    fn build_failed_joins_diagnostics() {
        let err = KilnError::build_failed(
            "Compiler",
            &["src/a.ts:1 error".to_string(), "src/b.ts:2 error".to_string()],
        );
        let text = err.to_string();
        assert!(text.starts_with("Compiler failed:"));
        assert!(text.contains("src/a.ts:1 error\nsrc/b.ts:2 error"));
    }
}
