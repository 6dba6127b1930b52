//! Error types for tracker
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, bad config, unknown id)
//! - 3: Rejected by the store (schedule conflict, validation)
//! - 4: Operation failed (I/O, persistence, corrupt data file)

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::task::{TaskId, TaskKind};

/// Exit codes for the tracker CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const REJECTED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for tracker operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("{kind} {id} not found")]
    NotFound { kind: TaskKind, id: TaskId },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Rejected mutations (exit code 3)
    #[error("Schedule conflict: task {id} overlaps task {conflicting_id}")]
    ScheduleConflict { id: TaskId, conflicting_id: TaskId },

    #[error("Validation failed: {0}")]
    Validation(String),

    // Operation failures (exit code 4)
    #[error("Failed to save {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Corrupt record on line {line}: {reason}")]
    CorruptRecord { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    pub fn not_found(kind: TaskKind, id: TaskId) -> Self {
        Error::NotFound { kind, id }
    }

    pub fn persistence(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Persistence {
            path: path.into(),
            source,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::NotFound { .. } | Error::InvalidConfig(_) | Error::InvalidArgument(_) => {
                exit_codes::USER_ERROR
            }

            Error::ScheduleConflict { .. } | Error::Validation(_) => exit_codes::REJECTED,

            Error::Persistence { .. }
            | Error::CorruptRecord { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Stable machine-readable tag, independent of the message text
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "NOT_FOUND",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::InvalidArgument(_) => "INVALID_ARGUMENT",
            Error::ScheduleConflict { .. } => "SCHEDULE_CONFLICT",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::Persistence { .. } => "PERSISTENCE_ERROR",
            Error::CorruptRecord { .. } => "CORRUPT_RECORD",
            Error::Io(_) => "IO_ERROR",
            Error::Json(_) => "JSON_ERROR",
            Error::TomlParse(_) | Error::TomlSerialize(_) => "TOML_ERROR",
        }
    }

    /// Structured details for JSON output, where the variant carries any
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::NotFound { kind, id } => Some(serde_json::json!({
                "kind": kind,
                "id": id,
            })),
            Error::ScheduleConflict { id, conflicting_id } => Some(serde_json::json!({
                "id": id,
                "conflicting_id": conflicting_id,
            })),
            Error::Persistence { path, .. } => Some(serde_json::json!({
                "path": path.display().to_string(),
            })),
            Error::CorruptRecord { line, .. } => Some(serde_json::json!({ "line": line })),
            _ => None,
        }
    }
}

/// Result type alias for tracker operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            kind: err.code(),
            details: err.details(),
        }
    }
}
