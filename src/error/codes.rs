//! Standardized error codes for machine-parseable output.
//!
//! Error codes follow a numeric taxonomy:
//! - 1xx: Config errors
//! - 2xx: Input errors (CSV, encoding)
//! - 3xx: Tracker API errors
//! - 4xx: Network errors
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Standardized error codes for robot mode output.
///
/// Each variant maps to a numeric code (e.g., `ConfigMissingRequired` -> E102).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================
    // Config errors (1xx)
    // ========================================
    /// E101: Config file or value could not be parsed
    ConfigInvalid,
    /// E102: Required config value is missing
    ConfigMissingRequired,

    // ========================================
    // Input errors (2xx)
    // ========================================
    /// E201: CSV file is malformed or unreadable
    CsvInvalid,
    /// E202: Input value failed validation
    InputInvalid,

    // ========================================
    // Tracker API errors (3xx)
    // ========================================
    /// E301: Milestone list for the project could not be fetched
    DirectoryFetchFailed,
    /// E302: Issue could not be fetched
    IssueFetchFailed,
    /// E303: Milestone update was rejected
    MutationFailed,
    /// E304: Tracker answered 429 after all retries
    RateLimited,

    // ========================================
    // Network errors (4xx)
    // ========================================
    /// E401: Request never reached the tracker
    NetworkUnreachable,

    // ========================================
    // Internal errors (9xx)
    // ========================================
    /// E901: Serialization/deserialization failed
    SerializationError,
    /// E902: IO operation failed
    IoError,
}

impl ErrorCode {
    /// Get the numeric error code (e.g., `ConfigInvalid` -> 101).
    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            Self::ConfigInvalid => 101,
            Self::ConfigMissingRequired => 102,

            Self::CsvInvalid => 201,
            Self::InputInvalid => 202,

            Self::DirectoryFetchFailed => 301,
            Self::IssueFetchFailed => 302,
            Self::MutationFailed => 303,
            Self::RateLimited => 304,

            Self::NetworkUnreachable => 401,

            Self::SerializationError => 901,
            Self::IoError => 902,
        }
    }

    /// Get the error code as a formatted string (e.g., "E101").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("E{}", self.numeric())
    }

    /// Get the default suggestion for this error code.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::ConfigInvalid => "Check TOML syntax in the config file and numeric environment values",
            Self::ConfigMissingRequired => "Set the value in .env, the environment, the config file, or pass it as a flag",

            Self::CsvInvalid => "Make sure the CSV is UTF-8 with a header row. Run `milestone-sync convert` for Shift_JIS exports",
            Self::InputInvalid => "Check the value passed on the command line",

            Self::DirectoryFetchFailed => "Verify BACKLOG_SPACE_URL, BACKLOG_PROJECT_KEY and BACKLOG_API_KEY",
            Self::IssueFetchFailed => "Check that the issue key exists and the API key can read it",
            Self::MutationFailed => "Check that the API key has permission to edit the issue",
            Self::RateLimited => "Increase --delay-ms or the retry base delay and run again",

            Self::NetworkUnreachable => "Check your network connection and the space URL",

            Self::SerializationError => "The tracker returned an unexpected payload. Re-run with -vv for details",
            Self::IoError => "File operation failed. Check path exists and permissions are correct",
        }
    }

    /// Check if this error is potentially recoverable by the user.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::SerializationError)
    }

    /// Get the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.numeric() / 100 {
            1 => "config",
            2 => "input",
            3 => "tracker",
            4 => "network",
            9 => "internal",
            _ => "unknown",
        }
    }

    /// Iterate over all error codes.
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::ConfigInvalid,
            Self::ConfigMissingRequired,
            Self::CsvInvalid,
            Self::InputInvalid,
            Self::DirectoryFetchFailed,
            Self::IssueFetchFailed,
            Self::MutationFailed,
            Self::RateLimited,
            Self::NetworkUnreachable,
            Self::SerializationError,
            Self::IoError,
        ]
        .into_iter()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code_string())
    }
}
