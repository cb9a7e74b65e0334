//! Error types for the pagination engine.
//!
//! This module defines the error hierarchy used throughout the engine,
//! separating document store errors, cursor errors, and configuration errors.
//!
//! Only a subset of store errors is ever visible to callers of the engine:
//! the missing-index class is absorbed by the index fallback resolver and
//! stale results are not errors at all (see
//! [`NavigationOutcome::Superseded`](crate::engine::NavigationOutcome)).

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for engine operations.
#[derive(Error, Debug, Clone)]
pub enum ListingError {
    /// Document store errors
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Cursor decoding and validity errors
    #[error(transparent)]
    Cursor(#[from] CursorError),

    /// Listing configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The spawned fetch did not run to completion.
    #[error("navigation task failed: {message}")]
    TaskFailed { message: String },
}

/// Errors reported by a document store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The filter and sort combination has no supporting composite index.
    #[error("missing index on {collection} for fields [{}]", fields.join(", "))]
    IndexMissing {
        collection: String,
        fields: Vec<String>,
        hint: Option<String>,
    },

    /// Network failure or unavailable store.
    #[error("transient fetch error: {message}")]
    Transient { message: String },

    /// The fetch did not complete in time.
    #[error("fetch timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The caller is not allowed to read the collection.
    #[error("permission denied on {collection}: {message}")]
    PermissionDenied { collection: String, message: String },
}

/// Errors related to pagination cursors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CursorError {
    /// The cursor string could not be decoded.
    #[error("invalid pagination cursor: {cursor}")]
    InvalidCursor { cursor: String },

    /// The cursor was produced by a different query.
    #[error("cursor belongs to a different query")]
    QueryMismatch,
}

/// Errors related to listing configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration failed validation.
    #[error("invalid listing configuration: {}", errors.join("; "))]
    Invalid { errors: Vec<String> },
}

/// Result type alias for engine operations.
pub type ListingResult<T> = Result<T, ListingError>;

/// Result type alias for document store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Maps a remote status code and message onto the error taxonomy.
    ///
    /// Codes follow the gRPC-style names used by hosted document databases
    /// (`failed-precondition`, `permission-denied`, ...). A failed precondition
    /// only counts as a missing index when the message mentions an index; the
    /// console link the store usually embeds is kept as the provisioning hint.
    pub fn classify(collection: &str, code: &str, message: &str) -> Self {
        let code = code.trim().to_ascii_lowercase().replace('_', "-");
        match code.as_str() {
            "failed-precondition" if message.to_ascii_lowercase().contains("index") => {
                StoreError::IndexMissing {
                    collection: collection.to_string(),
                    fields: Vec::new(),
                    hint: extract_link(message),
                }
            }
            "permission-denied" | "unauthenticated" => StoreError::PermissionDenied {
                collection: collection.to_string(),
                message: message.to_string(),
            },
            "deadline-exceeded" => StoreError::Timeout { timeout_ms: 0 },
            _ => StoreError::Transient {
                message: format!("{code}: {message}"),
            },
        }
    }

    /// Returns true for the missing-index class.
    pub fn is_index_missing(&self) -> bool {
        matches!(self, StoreError::IndexMissing { .. })
    }

    /// Returns true if a manual refresh may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Transient { .. } | StoreError::Timeout { .. })
    }
}

fn extract_link(message: &str) -> Option<String> {
    message
        .split_whitespace()
        .find(|word| word.starts_with("https://"))
        .map(|word| word.trim_end_matches(['.', ',', ')']).to_string())
}
