use crate::core::RunSummary;
use crate::error::SyncError;

use super::{AuditSink, DiffRecord};

/// One event captured by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    EmptyKeyRow(usize),
    BeginIssue { position: usize, total: usize, issue_key: String },
    Diff(DiffRecord),
    Note { issue_key: Option<String>, message: String },
    Applied(String),
    Failure { issue_key: String, message: String },
    EndIssue(String),
    Finish(RunSummary),
}

/// In-memory sink.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AuditEvent>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diffs(&self) -> Vec<&DiffRecord> {
        self.events
            .iter()
            .filter_map(|event| match event {
                AuditEvent::Diff(record) => Some(record),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                AuditEvent::Failure { issue_key, .. } => Some(issue_key.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn notes(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                AuditEvent::Note { message, .. } => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl AuditSink for RecordingSink {
    fn empty_key_row(&mut self, row_number: usize, _column: &str) {
        self.events.push(AuditEvent::EmptyKeyRow(row_number));
    }

    fn begin_issue(&mut self, position: usize, total: usize, issue_key: &str) {
        self.events.push(AuditEvent::BeginIssue {
            position,
            total,
            issue_key: issue_key.to_string(),
        });
    }

    fn emit_diff(&mut self, record: &DiffRecord) {
        self.events.push(AuditEvent::Diff(record.clone()));
    }

    fn note(&mut self, issue_key: Option<&str>, message: &str) {
        self.events.push(AuditEvent::Note {
            issue_key: issue_key.map(ToString::to_string),
            message: message.to_string(),
        });
    }

    fn mutation_applied(&mut self, issue_key: &str) {
        self.events.push(AuditEvent::Applied(issue_key.to_string()));
    }

    fn failure(&mut self, issue_key: &str, error: &SyncError) {
        self.events.push(AuditEvent::Failure {
            issue_key: issue_key.to_string(),
            message: error.to_string(),
        });
    }

    fn end_issue(&mut self, issue_key: &str) {
        self.events.push(AuditEvent::EndIssue(issue_key.to_string()));
    }

    fn finish(&mut self, summary: &RunSummary) {
        self.events.push(AuditEvent::Finish(summary.clone()));
    }
}
