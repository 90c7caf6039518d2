//! In-memory `BacklogOperations` implementation for tests.
//!
//! `MockBacklogClient` keeps a milestone list and a set of issues, applies
//! milestone updates to its own store, records every call, and can inject
//! failures with an optional HTTP status (e.g. 429 a fixed number of times).
//!
//! ```rust,ignore
//! use milestone_sync::backlog::mock::{MockBacklogClient, ErrorInjection, MockOp};
//!
//! let mock = MockBacklogClient::new()
//!     .with_milestones(vec![Milestone::new(1, "v1")])
//!     .with_issue(IssueSnapshot::new("PRJ-1", "Crash"));
//! mock.inject_error(ErrorInjection::Times(MockOp::ApplyMilestones, Some(429), 2));
//! ```

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::{Result, SyncError};

use super::client::BacklogOperations;
use super::types::{IssueSnapshot, Milestone, MilestoneRef};

/// Operation names used for error injection and call recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOp {
    FetchMilestones,
    FetchIssue,
    ApplyMilestones,
}

/// A call the mock received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    FetchMilestones,
    FetchIssue(String),
    ApplyMilestones(String, Vec<u64>),
}

/// Error injection configuration for testing.
#[derive(Debug, Clone)]
pub enum ErrorInjection {
    /// Fail every call with this status.
    All(Option<u16>),

    /// Fail every call of one operation.
    Operation(MockOp, Option<u16>),

    /// Fail every call touching one issue key.
    IssueKey(String, Option<u16>),

    /// Fail the next `n` calls of one operation, then succeed.
    Times(MockOp, Option<u16>, usize),
}

/// Mock Backlog tracker.
#[derive(Debug, Default)]
pub struct MockBacklogClient {
    milestones: Vec<Milestone>,
    issues: RefCell<HashMap<String, IssueSnapshot>>,
    calls: RefCell<Vec<RecordedCall>>,
    injections: RefCell<Vec<ErrorInjection>>,
}

impl MockBacklogClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the project milestone list.
    #[must_use]
    pub fn with_milestones(mut self, milestones: Vec<Milestone>) -> Self {
        self.milestones = milestones;
        self
    }

    /// Pre-populate with an issue.
    #[must_use]
    pub fn with_issue(self, issue: IssueSnapshot) -> Self {
        self.insert_issue(issue);
        self
    }

    pub fn insert_issue(&self, issue: IssueSnapshot) {
        self.issues
            .borrow_mut()
            .insert(issue.issue_key.clone(), issue);
    }

    /// Current state of an issue in the store.
    pub fn issue(&self, issue_key: &str) -> Option<IssueSnapshot> {
        self.issues.borrow().get(issue_key).cloned()
    }

    /// Milestone names currently attached to an issue, in stored order.
    pub fn milestone_names(&self, issue_key: &str) -> Vec<String> {
        self.issue(issue_key)
            .map(|issue| issue.milestones.into_iter().map(|m| m.name).collect())
            .unwrap_or_default()
    }

    pub fn inject_error(&self, injection: ErrorInjection) {
        self.injections.borrow_mut().push(injection);
    }

    pub fn clear_errors(&self) {
        self.injections.borrow_mut().clear();
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    /// Only the mutation calls, as `(issue_key, ids)`.
    pub fn mutations(&self) -> Vec<(String, Vec<u64>)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                RecordedCall::ApplyMilestones(key, ids) => Some((key.clone(), ids.clone())),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: RecordedCall) {
        self.calls.borrow_mut().push(call);
    }

    /// Returns the status to fail with, if an injection matches.
    fn injected_failure(&self, op: MockOp, issue_key: Option<&str>) -> Option<Option<u16>> {
        let mut injections = self.injections.borrow_mut();
        for injection in injections.iter_mut() {
            match injection {
                ErrorInjection::All(status) => return Some(*status),
                ErrorInjection::Operation(target, status) if *target == op => {
                    return Some(*status);
                }
                ErrorInjection::IssueKey(target, status) if Some(target.as_str()) == issue_key => {
                    return Some(*status);
                }
                ErrorInjection::Times(target, status, remaining)
                    if *target == op && *remaining > 0 =>
                {
                    *remaining -= 1;
                    return Some(*status);
                }
                _ => {}
            }
        }
        None
    }

    fn resolve_ref(&self, issue: &IssueSnapshot, id: u64) -> MilestoneRef {
        issue
            .milestones
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .or_else(|| {
                self.milestones
                    .iter()
                    .find(|m| m.id == id)
                    .map(|m| MilestoneRef::new(m.id, m.name.clone()))
            })
            .unwrap_or_else(|| MilestoneRef::new(id, format!("#{id}")))
    }
}

impl BacklogOperations for MockBacklogClient {
    fn fetch_milestones(&self) -> Result<Vec<Milestone>> {
        self.record(RecordedCall::FetchMilestones);
        if let Some(status) = self.injected_failure(MockOp::FetchMilestones, None) {
            return Err(SyncError::DirectoryFetch(format!(
                "mock error (status {status:?})"
            )));
        }
        Ok(self.milestones.clone())
    }

    fn fetch_issue(&self, issue_key: &str) -> Result<IssueSnapshot> {
        self.record(RecordedCall::FetchIssue(issue_key.to_string()));
        if let Some(status) = self.injected_failure(MockOp::FetchIssue, Some(issue_key)) {
            return Err(SyncError::IssueFetch {
                issue_key: issue_key.to_string(),
                status,
                message: "mock error".to_string(),
            });
        }
        self.issue(issue_key).ok_or_else(|| SyncError::IssueFetch {
            issue_key: issue_key.to_string(),
            status: Some(404),
            message: "No issue.".to_string(),
        })
    }

    fn apply_milestones(&self, issue_key: &str, milestone_ids: &[u64]) -> Result<()> {
        self.record(RecordedCall::ApplyMilestones(
            issue_key.to_string(),
            milestone_ids.to_vec(),
        ));
        if let Some(status) = self.injected_failure(MockOp::ApplyMilestones, Some(issue_key)) {
            return Err(SyncError::Mutation {
                issue_key: issue_key.to_string(),
                status,
                message: "mock error".to_string(),
            });
        }

        let mut issues = self.issues.borrow_mut();
        let Some(issue) = issues.get_mut(issue_key) else {
            return Err(SyncError::Mutation {
                issue_key: issue_key.to_string(),
                status: Some(404),
                message: "No issue.".to_string(),
            });
        };
        let updated = milestone_ids
            .iter()
            .map(|id| self.resolve_ref(issue, *id))
            .collect();
        issue.milestones = updated;
        Ok(())
    }
}
