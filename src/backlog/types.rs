//! Wire types for the Backlog REST API v2.

use serde::{Deserialize, Deserializer, Serialize};

/// A project milestone ("version" in Backlog's API).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_due_date: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

impl Milestone {
    /// Build a bare milestone with only the fields the engine needs.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            release_due_date: None,
            archived: false,
        }
    }
}

/// A milestone as attached to an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneRef {
    pub id: u64,
    pub name: String,
}

impl MilestoneRef {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// The parts of an issue the milestone engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSnapshot {
    #[serde(default)]
    pub id: u64,
    pub issue_key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, rename = "milestone", deserialize_with = "null_as_default")]
    pub milestones: Vec<MilestoneRef>,
}

impl IssueSnapshot {
    pub fn new(issue_key: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id: 0,
            issue_key: issue_key.into(),
            summary: summary.into(),
            milestones: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_milestones(mut self, milestones: Vec<MilestoneRef>) -> Self {
        self.milestones = milestones;
        self
    }
}

/// Error payload Backlog returns on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogErrorResponse {
    #[serde(default)]
    pub errors: Vec<BacklogErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogErrorDetail {
    pub message: String,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub more_info: Option<String>,
}

impl BacklogErrorResponse {
    /// Join every error message into one line.
    pub fn summary(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_snapshot_parses_backlog_payload() {
        let json = r#"{
            "id": 10,
            "issueKey": "PRJ-1",
            "summary": "Login fails",
            "milestone": [{"id": 1, "projectId": 5, "name": "v1", "archived": false}]
        }"#;
        let issue: IssueSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(issue.issue_key, "PRJ-1");
        assert_eq!(issue.milestones, vec![MilestoneRef::new(1, "v1")]);
    }

    #[test]
    fn test_issue_snapshot_null_milestone_is_empty() {
        let json = r#"{"issueKey": "PRJ-2", "summary": null, "milestone": null}"#;
        let issue: IssueSnapshot = serde_json::from_str(json).unwrap();
        assert!(issue.milestones.is_empty());
        assert_eq!(issue.summary, "");
    }

    #[test]
    fn test_milestone_parses_version_payload() {
        let json = r#"{"id": 3, "projectId": 1, "name": "2024.1", "description": null,
            "startDate": null, "releaseDueDate": "2024-03-01T00:00:00Z",
            "archived": true, "displayOrder": 0}"#;
        let milestone: Milestone = serde_json::from_str(json).unwrap();
        assert_eq!(milestone.id, 3);
        assert!(milestone.archived);
        assert_eq!(milestone.release_due_date.as_deref(), Some("2024-03-01T00:00:00Z"));
    }

    #[test]
    fn test_error_response_summary() {
        let json = r#"{"errors":[{"message":"No issue.","code":6,"moreInfo":""}]}"#;
        let err: BacklogErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(err.summary().as_deref(), Some("No issue."));
    }
}
