//! Error types for Vigil
//!
//! All modules use `VigilResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Vigil operations
pub type VigilResult<T> = Result<T, VigilError>;

/// All errors that can occur in Vigil
#[derive(Error, Debug)]
pub enum VigilError {
    // Preflight errors
    #[error("Required tool not found: {name}. {hint}")]
    MissingDependency { name: String, hint: String },

    // Upstream sync errors
    #[error("Upstream source unavailable ({context}): {reason}")]
    SourceUnavailable {
        context: String,
        reason: String,
        code: Option<i32>,
    },

    // Rebuild errors
    #[error("Snapshot rebuild failed during {stage}: {reason}")]
    RebuildFailed {
        stage: String,
        reason: String,
        code: Option<i32>,
    },

    #[error("Incremental refresh failed: {reason}")]
    RefreshFailed { reason: String, code: Option<i32> },

    #[error("Task '{name}' failed: {reason}")]
    TaskFailed {
        name: String,
        reason: String,
        code: Option<i32>,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Upstream repository URL is not configured")]
    UpstreamNotConfigured,

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

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

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl VigilError {
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

    /// Exit status carried over from a failed external collaborator, if any
    pub fn status_code(&self) -> Option<i32> {
        match self {
            Self::SourceUnavailable { code, .. }
            | Self::RebuildFailed { code, .. }
            | Self::RefreshFailed { code, .. }
            | Self::TaskFailed { code, .. } => *code,
            _ => None,
        }
    }

    /// Process exit code for this error
    ///
    /// A collaborator's own exit status is passed through when it fits;
    /// everything else terminates with 1.
    pub fn exit_code(&self) -> u8 {
        match self.status_code() {
            Some(code @ 1..=255) => code as u8,
            _ => 1,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::UpstreamNotConfigured => {
                Some("Set upstream.url in the config file (see: vigil config path)")
            }
            Self::ConfigInvalid { .. } => Some("Run: vigil config init --force to reset"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = VigilError::MissingDependency {
            name: "git".to_string(),
            hint: "Install git".to_string(),
        };
        assert!(err.to_string().contains("git"));
    }

    #[test]
    fn error_hint() {
        let err = VigilError::UpstreamNotConfigured;
        assert!(err.hint().unwrap().contains("upstream.url"));
        assert!(VigilError::io("reading state", std::io::Error::other("x"))
            .hint()
            .is_none());
    }

    #[test]
    fn exit_code_passes_through_collaborator_status() {
        let err = VigilError::RebuildFailed {
            stage: "export".to_string(),
            reason: "boom".to_string(),
            code: Some(3),
        };
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn exit_code_defaults_to_one() {
        assert_eq!(VigilError::UpstreamNotConfigured.exit_code(), 1);

        let err = VigilError::RefreshFailed {
            reason: "killed".to_string(),
            code: None,
        };
        assert_eq!(err.exit_code(), 1);

        // Out-of-range codes collapse to the generic failure code
        let err = VigilError::RefreshFailed {
            reason: "weird".to_string(),
            code: Some(-9),
        };
        assert_eq!(err.exit_code(), 1);
    }
}
