//! Error types for Strata
//!
//! All modules use `StrataResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Strata operations
pub type StrataResult<T> = Result<T, StrataError>;

/// All errors that can occur in Strata
#[derive(Error, Debug)]
pub enum StrataError {
    // Declaration errors
    #[error("Duplicate layer position {position}: positions must be unique within a build")]
    DuplicateSequence { position: u64 },

    #[error("Build file not found: {0}")]
    BuildFileNotFound(PathBuf),

    #[error("Invalid build file {path}: {reason}")]
    BuildFileInvalid { path: PathBuf, reason: String },

    // Execution errors
    #[error("Layer {position} failed ({instruction}): {source}")]
    Execution {
        position: u64,
        instruction: String,
        #[source]
        source: Box<StrataError>,
    },

    #[error("Build cancelled after {completed} layer(s)")]
    Cancelled { completed: usize },

    #[error("Command timed out after {limit:?}: {command}")]
    ExecutionTimeout {
        command: String,
        limit: std::time::Duration,
    },

    // Cache errors
    #[error("Cache index unavailable: {reason}")]
    CacheUnavailable { reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

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

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl StrataError {
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

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Create a cache unavailable error
    pub fn cache_unavailable(reason: impl Into<String>) -> Self {
        Self::CacheUnavailable {
            reason: reason.into(),
        }
    }

    /// Wrap an executor failure with the layer it happened in
    pub fn execution(position: u64, instruction: impl Into<String>, source: StrataError) -> Self {
        Self::Execution {
            position,
            instruction: instruction.into(),
            source: Box::new(source),
        }
    }

    /// Sequence position of the failed layer, if this is an execution error
    pub fn failed_position(&self) -> Option<u64> {
        match self {
            Self::Execution { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::DuplicateSequence { .. } => {
                Some("Give every [[layer]] a distinct position, or omit position entirely")
            }
            Self::BuildFileNotFound(_) => Some("Pass a build file with -f, or create Strata.toml"),
            Self::CacheUnavailable { .. } => Some("Check --cache-dir permissions, or run: strata cache clear"),
            Self::ExecutionTimeout { .. } => Some("Raise executor.timeout_secs in the config file"),
            _ => None,
        }
    }
}
