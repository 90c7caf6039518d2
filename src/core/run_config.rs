//! Immutable per-run settings handed to the batch driver.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::error::{Result, SyncError};
use crate::input::CsvRow;

use super::policy::Policy;
use super::retry::RetryConfig;

/// Which policy a batch applies to its rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Add { milestone: String },
    Delete { milestone: String },
    /// Set each issue to the names listed in `milestone_column`.
    Reconcile { milestone_column: String },
}

impl Operation {
    /// Policy for one row.
    pub fn policy_for(&self, row: &CsvRow) -> Policy {
        match self {
            Self::Add { milestone } => Policy::Add {
                milestone: milestone.clone(),
            },
            Self::Delete { milestone } => Policy::Delete {
                milestone: milestone.clone(),
            },
            Self::Reconcile { milestone_column } => Policy::SetExact {
                raw_names: row.milestone_list(milestone_column),
            },
        }
    }

    /// Target milestone for Add/Delete.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Add { milestone } | Self::Delete { milestone } => Some(milestone),
            Self::Reconcile { .. } => None,
        }
    }

    /// Log file prefix without the dry-run suffix.
    pub const fn log_prefix(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add-milestone",
            Self::Delete { .. } => "delete-milestone",
            Self::Reconcile { .. } => "update",
        }
    }
}

/// Settings for one batch run. Built once at startup, never mutated.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub operation: Operation,
    /// Issues carrying any of these milestones are left alone.
    pub skip_if_present: BTreeSet<String>,
    pub dry_run: bool,
    /// Wait between rows.
    pub delay: Duration,
    pub retry: RetryConfig,
    pub issue_key_column: String,
}

impl RunConfig {
    pub fn new(operation: Operation, issue_key_column: impl Into<String>) -> Self {
        Self {
            operation,
            skip_if_present: BTreeSet::new(),
            dry_run: false,
            delay: Duration::ZERO,
            retry: RetryConfig::default(),
            issue_key_column: issue_key_column.into(),
        }
    }

    /// Check preconditions that must hold before any row is processed.
    pub fn validate(&self) -> Result<()> {
        if let Some(target) = self.operation.target() {
            if target.trim().is_empty() {
                return Err(SyncError::MissingConfig(
                    "MILESTONE (target milestone name)".to_string(),
                ));
            }
        }
        if let Operation::Reconcile { milestone_column } = &self.operation {
            if milestone_column.trim().is_empty() {
                return Err(SyncError::Config(
                    "milestone column name must not be empty".to_string(),
                ));
            }
        }
        if self.issue_key_column.trim().is_empty() {
            return Err(SyncError::Config(
                "issue key column name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Log file prefix, with `-dry-run` appended in dry-run mode.
    pub fn log_prefix(&self) -> String {
        let base = self.operation.log_prefix();
        if self.dry_run {
            format!("{base}-dry-run")
        } else {
            base.to_string()
        }
    }

    /// `DRY-RUN` or `APPLY`.
    pub const fn mode_label(&self) -> &'static str {
        if self.dry_run { "DRY-RUN" } else { "APPLY" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_without_target_is_missing_config() {
        let config = RunConfig::new(
            Operation::Add {
                milestone: "  ".into(),
            },
            "key",
        );
        assert!(matches!(config.validate(), Err(SyncError::MissingConfig(_))));
    }

    #[test]
    fn reconcile_needs_no_target() {
        let config = RunConfig::new(
            Operation::Reconcile {
                milestone_column: "milestones".into(),
            },
            "key",
        );
        assert!(config.validate().is_ok());
        assert_eq!(config.operation.target(), None);
    }

    #[test]
    fn prefixes_follow_mode() {
        let mut config = RunConfig::new(
            Operation::Delete {
                milestone: "v1".into(),
            },
            "key",
        );
        assert_eq!(config.log_prefix(), "delete-milestone");
        config.dry_run = true;
        assert_eq!(config.log_prefix(), "delete-milestone-dry-run");
        assert_eq!(config.mode_label(), "DRY-RUN");
    }

    #[test]
    fn reconcile_policy_reads_row_column() {
        let op = Operation::Reconcile {
            milestone_column: "ms".into(),
        };
        let row = CsvRow::from_pairs(1, [("key", "PRJ-1"), ("ms", "v1, v2")]);
        assert_eq!(
            op.policy_for(&row),
            Policy::SetExact {
                raw_names: vec!["v1".into(), " v2".into()]
            }
        );
    }
}
