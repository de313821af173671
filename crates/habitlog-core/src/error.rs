//! Error types for habitlog-core.
//!
//! Store operations return [`StoreError`]; [`CoreError`] is the top-level
//! type for callers that mix storage and configuration work. Schedule and
//! statistics computations are total and define no error type.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Top-level error type for habitlog-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Store-related errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced by [`TrackerStore`](crate::storage::TrackerStore) operations.
///
/// Every mutating operation reports failure explicitly; storage failures are
/// never swallowed.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the database file
    #[error("failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Failed to create or resolve the data directory
    #[error("failed to prepare data directory: {0}")]
    DataDir(#[from] std::io::Error),

    /// A command field failed validation (empty name, unknown color, ...)
    #[error("invalid {field}: {message}")]
    InvalidInput {
        field: &'static str,
        message: String,
    },

    /// Category title collides case-insensitively with an existing one
    #[error("category title '{0}' is already taken")]
    DuplicateTitle(String),

    /// No category with the given id
    #[error("category {0} not found")]
    CategoryNotFound(Uuid),

    /// No tracker with the given id
    #[error("tracker {0} not found")]
    TrackerNotFound(Uuid),

    /// Completion toggle requested for a date after today
    #[error("cannot record a completion for future date {0}")]
    FutureDate(NaiveDate),

    /// Underlying durable write or query failed
    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl StoreError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> StoreError {
        StoreError::InvalidInput {
            field,
            message: message.into(),
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
