//! Batch driver: runs one policy over every CSV row, in order.
//!
//! Per issue: fetch snapshot -> skip gate -> policy -> no-change, dry-run
//! hold or mutation. A failing issue is reported and the batch moves on;
//! only configuration and directory errors abort the run.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::audit::{AuditSink, DiffRecord, DiffStatus};
use crate::backlog::{BacklogOperations, IssueSnapshot};
use crate::error::Result;
use crate::input::CsvRow;

use super::directory::MilestoneDirectory;
use super::pacing::Sleeper;
use super::policy::{IssueMilestoneState, SkipReason, reconcile, resolve_ids};
use super::retry::call_with_retry;
use super::run_config::{Operation, RunConfig};
use super::skip_gate::matching_skip_milestones;

/// Terminal state of one issue row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueOutcome {
    HasSkipMilestone,
    UnknownMilestone,
    NoChange,
    DryRunHold,
    Applied,
    Failed,
}

/// Counters for a finished batch.
///
/// `skipped_count` counts rows without an issue key. Issues stopped by the
/// skip gate are counted in `gated` and still count as processed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    #[serde(rename = "rows")]
    pub row_count: usize,
    #[serde(rename = "processed")]
    pub processed_count: usize,
    #[serde(rename = "skipped")]
    pub skipped_count: usize,
    pub applied: usize,
    pub unchanged: usize,
    pub held: usize,
    pub gated: usize,
    pub unknown: usize,
    pub failed: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: IssueOutcome) {
        let counter = match outcome {
            IssueOutcome::Applied => &mut self.applied,
            IssueOutcome::NoChange => &mut self.unchanged,
            IssueOutcome::DryRunHold => &mut self.held,
            IssueOutcome::HasSkipMilestone => &mut self.gated,
            IssueOutcome::UnknownMilestone => &mut self.unknown,
            IssueOutcome::Failed => &mut self.failed,
        };
        *counter += 1;
    }
}

/// Sequential batch runner.
pub struct BatchDriver<'a> {
    config: &'a RunConfig,
    backlog: &'a dyn BacklogOperations,
    sleeper: &'a dyn Sleeper,
}

impl<'a> BatchDriver<'a> {
    pub fn new(
        config: &'a RunConfig,
        backlog: &'a dyn BacklogOperations,
        sleeper: &'a dyn Sleeper,
    ) -> Self {
        Self {
            config,
            backlog,
            sleeper,
        }
    }

    /// Validate config, load the directory, then process every row.
    pub fn run(&self, rows: &[CsvRow], sink: &mut dyn AuditSink) -> Result<RunSummary> {
        self.config.validate()?;
        let directory = MilestoneDirectory::fetch(self.backlog)?;
        self.preflight(&directory, sink);
        Ok(self.run_with_directory(&directory, rows, sink))
    }

    /// Process every row against an already loaded directory.
    pub fn run_with_directory(
        &self,
        directory: &MilestoneDirectory,
        rows: &[CsvRow],
        sink: &mut dyn AuditSink,
    ) -> RunSummary {
        let column = self.config.issue_key_column.as_str();
        let total = rows.iter().filter(|row| row.issue_key(column).is_some()).count();
        let mut summary = RunSummary::default();
        let mut position = 0;

        for (idx, row) in rows.iter().enumerate() {
            summary.row_count += 1;
            let Some(issue_key) = row.issue_key(column) else {
                summary.skipped_count += 1;
                sink.empty_key_row(row.row_number, column);
                continue;
            };

            summary.processed_count += 1;
            position += 1;
            sink.begin_issue(position, total, issue_key);
            let outcome = self.process_issue(issue_key, row, directory, sink);
            sink.end_issue(issue_key);
            debug!(issue_key, ?outcome, "Issue done");
            summary.record(outcome);

            if idx + 1 < rows.len() {
                self.sleeper.sleep(self.config.delay);
            }
        }

        info!(
            rows = summary.row_count,
            processed = summary.processed_count,
            skipped = summary.skipped_count,
            failed = summary.failed,
            "Batch finished"
        );
        sink.finish(&summary);
        summary
    }

    /// Warn once when the Add/Delete target is not in the directory.
    fn preflight(&self, directory: &MilestoneDirectory, sink: &mut dyn AuditSink) {
        let message = match &self.config.operation {
            Operation::Add { milestone } if !directory.contains(milestone) => format!(
                "milestone \"{milestone}\" does not exist in the project; every issue will be left unchanged"
            ),
            Operation::Delete { milestone } if !directory.contains(milestone) => format!(
                "milestone \"{milestone}\" is not listed in the project; it is removed by the ids attached to each issue"
            ),
            _ => return,
        };
        warn!(target_milestone = self.config.operation.target(), "{message}");
        sink.note(None, &message);
    }

    fn process_issue(
        &self,
        issue_key: &str,
        row: &CsvRow,
        directory: &MilestoneDirectory,
        sink: &mut dyn AuditSink,
    ) -> IssueOutcome {
        let retry = &self.config.retry;
        let snapshot = match call_with_retry(retry, self.sleeper, || {
            self.backlog.fetch_issue(issue_key)
        }) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(issue_key, error = %err, "Issue fetch failed");
                sink.failure(issue_key, &err);
                return IssueOutcome::Failed;
            }
        };

        let state = IssueMilestoneState::from_snapshot(&snapshot);
        let before = state.names();

        let hits = matching_skip_milestones(&before, &self.config.skip_if_present);
        if !hits.is_empty() {
            sink.emit_diff(&self.diff(&snapshot, &before, &before, DiffStatus::HasSkipMilestone));
            sink.note(Some(issue_key), &SkipReason::HasSkipMilestone(hits).to_string());
            return IssueOutcome::HasSkipMilestone;
        }

        let policy = self.config.operation.policy_for(row);
        let result = reconcile(&policy, &state, directory);

        if let Some(reason) = &result.skip_reason {
            sink.emit_diff(&self.diff(&snapshot, &before, &before, DiffStatus::Skip));
            sink.note(Some(issue_key), &reason.to_string());
            return IssueOutcome::UnknownMilestone;
        }

        let status = if result.changed {
            DiffStatus::Apply
        } else {
            DiffStatus::NoChange
        };
        sink.emit_diff(&self.diff(&snapshot, &result.before_names, &result.after_names, status));
        for note in &result.notes {
            sink.note(Some(issue_key), &note.to_string());
        }

        if !result.changed {
            return IssueOutcome::NoChange;
        }
        if self.config.dry_run {
            return IssueOutcome::DryRunHold;
        }

        let ids = resolve_ids(&result.after_names, &state, directory);
        match call_with_retry(retry, self.sleeper, || {
            self.backlog.apply_milestones(issue_key, &ids)
        }) {
            Ok(()) => {
                info!(issue_key, ?ids, "Milestones updated");
                sink.mutation_applied(issue_key);
                IssueOutcome::Applied
            }
            Err(err) => {
                warn!(issue_key, error = %err, "Milestone update failed");
                sink.failure(issue_key, &err);
                IssueOutcome::Failed
            }
        }
    }

    fn diff(
        &self,
        snapshot: &IssueSnapshot,
        before: &[String],
        after: &[String],
        status: DiffStatus,
    ) -> DiffRecord {
        DiffRecord {
            issue_key: snapshot.issue_key.clone(),
            summary: snapshot.summary.clone(),
            before: before.to_vec(),
            after: after.to_vec(),
            status,
            dry_run: self.config.dry_run,
        }
    }
}

/// Run a batch with a fresh [`BatchDriver`].
pub fn run_batch(
    config: &RunConfig,
    backlog: &dyn BacklogOperations,
    rows: &[CsvRow],
    sink: &mut dyn AuditSink,
    sleeper: &dyn Sleeper,
) -> Result<RunSummary> {
    BatchDriver::new(config, backlog, sleeper).run(rows, sink)
}
