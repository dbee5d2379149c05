//! Unified error types for wordtrail.
//!
//! Storage failures propagate unchanged to the caller. The only error that
//! the engines absorb is [`WordtrailError::Conflict`], which signals that a
//! create-if-absent lost a race and the winner should be re-read.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for wordtrail operations.
#[derive(Error, Debug)]
pub enum WordtrailError {
    /// I/O errors from the file store.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Storage backend failures that are not plain I/O.
    #[error("backend error: {message}")]
    Backend { message: String },

    /// JSON or TOML serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Caller supplied a malformed identifier or out-of-range value.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A create-if-absent found an existing record under the same key.
    #[error("{entity} already exists: {key}")]
    Conflict { entity: &'static str, key: String },

    /// Stored data violates an invariant the engines rely on.
    #[error("invalid state: {message}")]
    InvalidState { message: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },
}

/// A specialized Result type for wordtrail operations.
pub type Result<T> = std::result::Result<T, WordtrailError>;

impl WordtrailError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a conflict error.
    pub fn conflict(entity: &'static str, key: impl Into<String>) -> Self {
        Self::Conflict {
            entity,
            key: key.into(),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error is a create-if-absent collision.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Whether this error reports a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this error was caused by caller input.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}

impl From<io::Error> for WordtrailError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for WordtrailError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Exit codes for the wordtrail CLI.
pub mod exit_codes {
    /// Command completed.
    pub const SUCCESS: i32 = 0;

    /// Storage, config or other infrastructure failure.
    pub const FAILURE: i32 = 1;

    /// Caller input was rejected.
    pub const INVALID_ARGUMENT: i32 = 2;

    /// A referenced word, progress record or book does not exist.
    pub const NOT_FOUND: i32 = 3;

    /// Map an error to the exit code the CLI reports for it.
    pub fn for_error(err: &super::WordtrailError) -> i32 {
        if err.is_invalid_argument() {
            INVALID_ARGUMENT
        } else if err.is_not_found() {
            NOT_FOUND
        } else {
            FAILURE
        }
    }
}
