//! BacklogClient - blocking REST client for the Backlog API v2.
//!
//! Only the three calls the milestone engine needs are implemented:
//! listing project versions, reading one issue, and replacing an issue's
//! milestone list.

use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, SyncError};

use super::types::{BacklogErrorResponse, IssueSnapshot, Milestone};

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Form field Backlog expects for the milestone list.
const MILESTONE_FIELD: &str = "milestoneId[]";

/// Operations the batch engine consumes from the tracker.
///
/// This trait is the seam between the engine and the network, so the engine
/// can run against [`super::mock::MockBacklogClient`] in tests.
pub trait BacklogOperations {
    /// List every milestone of the configured project.
    fn fetch_milestones(&self) -> Result<Vec<Milestone>>;

    /// Read the current summary and milestone list of one issue.
    fn fetch_issue(&self, issue_key: &str) -> Result<IssueSnapshot>;

    /// Replace the milestone list of one issue with exactly `milestone_ids`.
    fn apply_milestones(&self, issue_key: &str, milestone_ids: &[u64]) -> Result<()>;
}

/// Connection settings for a Backlog space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacklogSettings {
    /// e.g. `https://example.backlog.com`
    pub space_url: String,
    pub project_key: String,
    pub api_key: String,
}

/// Failure of a single HTTP exchange, before it is tied to an operation.
#[derive(Debug)]
struct HttpFailure {
    status: Option<u16>,
    message: String,
}

/// Client for the Backlog REST API.
pub struct BacklogClient {
    settings: BacklogSettings,
    http_client: reqwest::blocking::Client,
}

impl BacklogClient {
    /// Create a new client with the given request timeout.
    pub fn new(settings: BacklogSettings, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Config(format!("HTTP client error: {e}")))?;

        Ok(Self {
            settings,
            http_client,
        })
    }

    pub fn settings(&self) -> &BacklogSettings {
        &self.settings
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/api/v2/{}?apiKey={}",
            self.settings.space_url.trim_end_matches('/'),
            path,
            urlencoding::encode(&self.settings.api_key)
        )
    }

    fn issue_path(issue_key: &str) -> String {
        format!("issues/{}", urlencoding::encode(issue_key))
    }

    fn get(&self, path: &str) -> std::result::Result<String, HttpFailure> {
        debug!(path = %path, "GET");
        let response = self
            .http_client
            .get(self.endpoint(path))
            .send()
            .map_err(transport_failure)?;
        read_body(response)
    }

    fn patch_form(&self, path: &str, body: String) -> std::result::Result<String, HttpFailure> {
        debug!(path = %path, body = %body, "PATCH");
        let response = self
            .http_client
            .patch(self.endpoint(path))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .map_err(transport_failure)?;
        read_body(response)
    }
}

impl BacklogOperations for BacklogClient {
    fn fetch_milestones(&self) -> Result<Vec<Milestone>> {
        let path = format!(
            "projects/{}/versions",
            urlencoding::encode(&self.settings.project_key)
        );
        let body = self.get(&path).map_err(|failure| {
            SyncError::DirectoryFetch(match failure.status {
                Some(status) => format!("HTTP {status}: {}", failure.message),
                None => failure.message,
            })
        })?;
        let milestones: Vec<Milestone> = serde_json::from_str(&body)
            .map_err(|e| SyncError::DirectoryFetch(format!("invalid versions response: {e}")))?;

        info!(
            project = %self.settings.project_key,
            count = milestones.len(),
            "Fetched project milestones"
        );
        Ok(milestones)
    }

    fn fetch_issue(&self, issue_key: &str) -> Result<IssueSnapshot> {
        let body = self
            .get(&Self::issue_path(issue_key))
            .map_err(|failure| SyncError::IssueFetch {
                issue_key: issue_key.to_string(),
                status: failure.status,
                message: failure.message,
            })?;
        let issue: IssueSnapshot =
            serde_json::from_str(&body).map_err(|e| SyncError::IssueFetch {
                issue_key: issue_key.to_string(),
                status: None,
                message: format!("invalid issue response: {e}"),
            })?;

        debug!(
            issue_key = %issue_key,
            milestones = issue.milestones.len(),
            "Fetched issue"
        );
        Ok(issue)
    }

    fn apply_milestones(&self, issue_key: &str, milestone_ids: &[u64]) -> Result<()> {
        self.patch_form(&Self::issue_path(issue_key), milestone_form(milestone_ids))
            .map_err(|failure| SyncError::Mutation {
                issue_key: issue_key.to_string(),
                status: failure.status,
                message: failure.message,
            })?;

        info!(issue_key = %issue_key, ids = ?milestone_ids, "Updated issue milestones");
        Ok(())
    }
}

/// Encode a milestone id list as Backlog's repeated `milestoneId[]` field.
///
/// An empty list still sends the field with no value so Backlog clears it.
pub fn milestone_form(milestone_ids: &[u64]) -> String {
    let field = urlencoding::encode(MILESTONE_FIELD);
    if milestone_ids.is_empty() {
        return format!("{field}=");
    }
    milestone_ids
        .iter()
        .map(|id| format!("{field}={id}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn transport_failure(err: reqwest::Error) -> HttpFailure {
    HttpFailure {
        status: err.status().map(|s| s.as_u16()),
        message: format!("HTTP request failed: {err}"),
    }
}

fn read_body(response: reqwest::blocking::Response) -> std::result::Result<String, HttpFailure> {
    let status = response.status();
    let body = response.text().map_err(|e| HttpFailure {
        status: Some(status.as_u16()),
        message: format!("Failed to read response: {e}"),
    })?;

    if status.is_success() {
        return Ok(body);
    }

    let message = serde_json::from_str::<BacklogErrorResponse>(&body)
        .ok()
        .and_then(|e| e.summary())
        .unwrap_or_else(|| format!("Backlog error ({status}): {body}"));
    Err(HttpFailure {
        status: Some(status.as_u16()),
        message,
    })
}
