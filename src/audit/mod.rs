//! Audit trail for batch runs.
//!
//! The batch driver reports every outcome through [`AuditSink`]. [`RunLog`]
//! writes those events to the console and to an append-only log file;
//! [`RecordingSink`] keeps them in memory for tests.

mod recording;
mod run_log;

use serde::Serialize;

use crate::core::RunSummary;
use crate::error::SyncError;

pub use recording::{AuditEvent, RecordingSink};
pub use run_log::{ConsoleMode, RunLog, log_file_name};

/// Text used for an empty milestone list.
pub const NONE_TEXT: &str = "(none)";

/// Outcome category recorded for one issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffStatus {
    Apply,
    NoChange,
    Skip,
    HasSkipMilestone,
}

impl DiffStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Apply => "apply",
            Self::NoChange => "no-change",
            Self::Skip => "skip",
            Self::HasSkipMilestone => "has-skip-milestone",
        }
    }

    const fn is_skip(self) -> bool {
        matches!(self, Self::Skip | Self::HasSkipMilestone)
    }
}

/// Before/after record for one issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffRecord {
    pub issue_key: String,
    pub summary: String,
    pub before: Vec<String>,
    pub after: Vec<String>,
    pub status: DiffStatus,
    pub dry_run: bool,
}

impl DiffRecord {
    /// Group header, e.g. `[DRY-RUN] PRJ-1 Crash on start`.
    pub fn header(&self) -> String {
        let label = if self.status.is_skip() {
            "SKIP"
        } else if self.dry_run {
            "DRY-RUN"
        } else {
            "APPLY"
        };
        format!("[{label}] {} {}", self.issue_key, self.summary)
            .trim_end()
            .to_string()
    }

    /// Diff line, e.g. `changed: v1 -> v1, v2` or `unchanged: v1`.
    pub fn diff_line(&self) -> String {
        match self.status {
            DiffStatus::Apply => format!(
                "changed: {} -> {}",
                render_names(&self.before),
                render_names(&self.after)
            ),
            DiffStatus::NoChange => format!("unchanged: {}", render_names(&self.before)),
            DiffStatus::Skip | DiffStatus::HasSkipMilestone => format!(
                "{}: {}",
                self.status.as_str(),
                render_names(&self.before)
            ),
        }
    }
}

/// Join names with `, `, or [`NONE_TEXT`] when empty.
pub fn render_names(names: &[String]) -> String {
    if names.is_empty() {
        NONE_TEXT.to_string()
    } else {
        names.join(", ")
    }
}

/// Receiver for everything the batch driver reports.
pub trait AuditSink {
    /// A row without an issue key was passed over.
    fn empty_key_row(&mut self, row_number: usize, column: &str);

    /// Processing of an issue row starts (`position` is 1-based).
    fn begin_issue(&mut self, position: usize, total: usize, issue_key: &str);

    /// The computed before/after state of an issue.
    fn emit_diff(&mut self, record: &DiffRecord);

    /// Informational line, scoped to an issue when `issue_key` is set.
    fn note(&mut self, issue_key: Option<&str>, message: &str);

    /// The mutation call for an issue succeeded.
    fn mutation_applied(&mut self, issue_key: &str);

    /// Fetch or mutation failed for an issue.
    fn failure(&mut self, issue_key: &str, error: &SyncError);

    /// Processing of an issue row ended, whatever the outcome.
    fn end_issue(&mut self, issue_key: &str);

    /// The batch finished.
    fn finish(&mut self, summary: &RunSummary);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: DiffStatus, dry_run: bool) -> DiffRecord {
        DiffRecord {
            issue_key: "PRJ-1".into(),
            summary: "Crash on start".into(),
            before: vec!["v1".into(), "v2".into()],
            after: vec!["v1".into()],
            status,
            dry_run,
        }
    }

    #[test]
    fn header_labels() {
        assert_eq!(
            record(DiffStatus::Apply, true).header(),
            "[DRY-RUN] PRJ-1 Crash on start"
        );
        assert_eq!(
            record(DiffStatus::NoChange, false).header(),
            "[APPLY] PRJ-1 Crash on start"
        );
        assert!(record(DiffStatus::HasSkipMilestone, false).header().starts_with("[SKIP]"));
    }

    #[test]
    fn diff_lines() {
        assert_eq!(
            record(DiffStatus::Apply, false).diff_line(),
            "changed: v1, v2 -> v1"
        );
        assert_eq!(
            record(DiffStatus::NoChange, false).diff_line(),
            "unchanged: v1, v2"
        );
        assert_eq!(
            record(DiffStatus::HasSkipMilestone, false).diff_line(),
            "has-skip-milestone: v1, v2"
        );
    }

    #[test]
    fn empty_lists_render_as_none() {
        let mut rec = record(DiffStatus::Apply, false);
        rec.after.clear();
        assert_eq!(rec.diff_line(), "changed: v1, v2 -> (none)");
    }

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&DiffStatus::HasSkipMilestone).unwrap();
        assert_eq!(json, "\"has-skip-milestone\"");
    }
}
