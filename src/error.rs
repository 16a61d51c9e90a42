//! Error types for buildc
//!
//! All modules use `BuildcResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for buildc operations
pub type BuildcResult<T> = Result<T, BuildcError>;

/// Process exit status for an unresolvable repository mapping
pub const EXIT_CONF_ITEM_NOT_FOUND: u8 = 3;

/// Process exit status for a repository entry with a bad field count
pub const EXIT_TUPLE_NUMBER_INVALID: u8 = 4;

/// All errors that can occur in buildc
#[derive(Error, Debug)]
pub enum BuildcError {
    // Configuration errors
    #[error("{url} does not exist in the repository configuration")]
    CacheRootNotFound { url: String },

    #[error("Repository entry has {count} fields, expected 1 to 3: {fields:?}")]
    DescriptorFieldCount { count: usize, fields: Vec<String> },

    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Cache tree errors
    #[error("Libraries map is inconsistent with the repository configuration")]
    TreeInconsistent,

    #[error("Malformed libraries map entry: {key}")]
    MalformedTree { key: String },

    #[error("Libraries map not found: {0}")]
    IndexNotFound(PathBuf),

    #[error("Remove [{}] failed, exit status: {status}", path.display())]
    RemoveFailed { path: PathBuf, status: i32 },

    // VCS errors
    #[error("VCS command failed: {command}: {stderr}")]
    VcsCommand { command: String, stderr: String },

    #[error("VCS returned no revision for {0}")]
    RevisionMissing(String),

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

    #[error("{0}")]
    User(String),
}

impl BuildcError {
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

    /// Create a VCS command error from captured stderr
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::VcsCommand {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Whether this error comes from the repository configuration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::CacheRootNotFound { .. }
                | Self::DescriptorFieldCount { .. }
                | Self::ConfigInvalid { .. }
        )
    }

    /// Process exit status for this error
    ///
    /// Configuration problems get distinguished codes; a failed removal
    /// exits with the status of the removal command itself.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::CacheRootNotFound { .. } => EXIT_CONF_ITEM_NOT_FOUND,
            Self::DescriptorFieldCount { .. } => EXIT_TUPLE_NUMBER_INVALID,
            Self::RemoveFailed { status, .. } => u8::try_from(*status)
                .ok()
                .filter(|code| *code != 0)
                .unwrap_or(1),
            _ => 1,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::CacheRootNotFound { .. } => {
                Some("Add the repository to `repositories` in config.toml")
            }
            Self::DescriptorFieldCount { .. } => {
                Some("Use [url], [url, cache_root] or [url, cache_root, reserved]")
            }
            Self::TreeInconsistent => Some("Run: buildc cache upgrade"),
            Self::IndexNotFound(_) => Some("Run: buildc cache init"),
            _ => None,
        }
    }
}
