use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{ErrorCode, SyncError};

/// Envelope for every `--robot` response.
#[derive(Serialize)]
pub struct RobotResponse<T> {
    pub status: RobotStatus,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub data: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotStatus {
    Ok,
    /// Rich error with structured information
    Error {
        /// Error code enum value (e.g., "DIRECTORY_FETCH_FAILED")
        code: ErrorCode,
        /// Numeric error code (e.g., 301)
        numeric_code: u16,
        /// Human-readable error message
        message: String,
        /// Actionable suggestion for recovery
        suggestion: String,
        /// Additional context for debugging
        #[serde(skip_serializing_if = "Option::is_none")]
        context: Option<serde_json::Value>,
        /// Whether this error is recoverable by the user
        recoverable: bool,
        /// Error category (e.g., "tracker", "config")
        category: String,
    },
}

pub fn robot_ok<T: Serialize>(data: T) -> RobotResponse<T> {
    RobotResponse {
        status: RobotStatus::Ok,
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data,
        warnings: Vec::new(),
    }
}

/// Create a robot error response from a `SyncError` with structured information.
pub fn robot_error(err: &SyncError) -> RobotResponse<serde_json::Value> {
    let structured = err.to_structured();
    RobotResponse {
        status: RobotStatus::Error {
            code: structured.code,
            numeric_code: structured.numeric_code,
            message: structured.message,
            suggestion: structured.suggestion,
            context: structured.context,
            recoverable: structured.recoverable,
            category: structured.category,
        },
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data: serde_json::Value::Null,
        warnings: Vec::new(),
    }
}

/// Print a response as one JSON line on stdout.
pub fn emit_json<T: Serialize>(response: &RobotResponse<T>) -> crate::error::Result<()> {
    println!("{}", serde_json::to_string(response)?);
    Ok(())
}
