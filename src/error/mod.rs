//! Error handling for milestone-sync.
//!
//! This module provides:
//! - [`SyncError`]: The main error enum for all operations
//! - [`ErrorCode`]: Standardized error codes for machine parsing
//! - [`StructuredError`]: JSON-friendly error used by `--robot` output

mod codes;

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use codes::ErrorCode;

/// HTTP status the tracker uses to signal rate limiting.
pub const RATE_LIMITED_STATUS: u16 = 429;

/// Main error type for milestone-sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing required config: {0}")]
    MissingConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to fetch milestones: {0}")]
    DirectoryFetch(String),

    #[error("Failed to fetch issue {issue_key}: {message}")]
    IssueFetch {
        issue_key: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Failed to update milestones on {issue_key}: {message}")]
    Mutation {
        issue_key: String,
        status: Option<u16>,
        message: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(String),
}

impl SyncError {
    /// HTTP status carried by the failure, if the tracker answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::IssueFetch { status, .. } | Self::Mutation { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether the tracker rejected the call with 429.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(RATE_LIMITED_STATUS)
    }

    /// Get the error code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        if self.is_rate_limited() {
            return ErrorCode::RateLimited;
        }
        match self {
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::SerializationError,
            Self::Csv(_) => ErrorCode::CsvInvalid,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::MissingConfig(_) => ErrorCode::ConfigMissingRequired,
            Self::InvalidInput(_) => ErrorCode::InputInvalid,
            Self::DirectoryFetch(_) => ErrorCode::DirectoryFetchFailed,
            Self::IssueFetch { .. } => ErrorCode::IssueFetchFailed,
            Self::Mutation { .. } => ErrorCode::MutationFailed,
            Self::Http(_) => ErrorCode::NetworkUnreachable,
        }
    }

    /// Get context information for this error as JSON.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::MissingConfig(key) => Some(serde_json::json!({ "config_key": key })),
            Self::IssueFetch {
                issue_key, status, ..
            }
            | Self::Mutation {
                issue_key, status, ..
            } => Some(serde_json::json!({ "issue_key": issue_key, "status": status })),
            _ => None,
        }
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_sync_error(self)
    }
}

/// A structured error with machine-readable code, suggestion, and context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// The error code (e.g., "MUTATION_FAILED")
    pub code: ErrorCode,

    /// The numeric error code (e.g., 303)
    pub numeric_code: u16,

    /// Human-readable error message
    pub message: String,

    /// Actionable suggestion for recovery
    pub suggestion: String,

    /// Additional context for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Whether this error is potentially recoverable by the user
    pub recoverable: bool,

    /// Error category (e.g., "config", "tracker")
    pub category: String,
}

impl StructuredError {
    /// Create a new structured error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            numeric_code: code.numeric(),
            suggestion: code.suggestion().to_string(),
            context: None,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
            code,
            message: message.into(),
        }
    }

    /// Create a structured error from a [`SyncError`].
    #[must_use]
    pub fn from_sync_error(err: &SyncError) -> Self {
        let mut structured = Self::new(err.code(), err.to_string());
        structured.context = err.context();
        structured
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<&SyncError> for StructuredError {
    fn from(err: &SyncError) -> Self {
        Self::from_sync_error(err)
    }
}

/// Result type alias using [`SyncError`].
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn mutation(status: Option<u16>) -> SyncError {
        SyncError::Mutation {
            issue_key: "PRJ-1".into(),
            status,
            message: "boom".into(),
        }
    }

    #[test]
    fn test_status_only_on_tracker_errors() {
        assert_eq!(mutation(Some(500)).status(), Some(500));
        assert_eq!(SyncError::Http("reset".into()).status(), None);
        assert_eq!(SyncError::DirectoryFetch("x".into()).status(), None);
    }

    #[test]
    fn test_rate_limited_detection() {
        assert!(mutation(Some(429)).is_rate_limited());
        assert!(!mutation(Some(503)).is_rate_limited());
        assert!(!mutation(None).is_rate_limited());
    }

    #[test]
    fn test_code_mapping() {
        assert_eq!(mutation(Some(429)).code(), ErrorCode::RateLimited);
        assert_eq!(mutation(Some(400)).code(), ErrorCode::MutationFailed);
        assert_eq!(
            SyncError::MissingConfig("MILESTONE".into()).code(),
            ErrorCode::ConfigMissingRequired
        );
        assert_eq!(
            SyncError::DirectoryFetch("down".into()).code(),
            ErrorCode::DirectoryFetchFailed
        );
    }

    #[test]
    fn test_structured_error_carries_context() {
        let structured = mutation(Some(403)).to_structured();
        assert_eq!(structured.code, ErrorCode::MutationFailed);
        assert_eq!(structured.numeric_code, 303);
        assert_eq!(structured.category, "tracker");
        let ctx = structured.context.unwrap();
        assert_eq!(ctx["issue_key"], "PRJ-1");
        assert_eq!(ctx["status"], 403);
    }

    #[test]
    fn test_structured_error_serialization() {
        let err = StructuredError::new(ErrorCode::ConfigMissingRequired, "MILESTONE is not set");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("CONFIG_MISSING_REQUIRED"));
        assert!(json.contains("\"numeric_code\":102"));
        assert!(json.contains("\"recoverable\":true"));
        assert_eq!(format!("{err}"), "[E102] MILESTONE is not set");
    }
}
