//! Reconciliation policies.
//!
//! Each policy is a pure function of the issue's current milestones, the
//! policy input and the project directory. It never touches the tracker and
//! never mutates the issue state; it returns a fresh [`ReconciliationResult`].

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::Serialize;

use crate::backlog::{IssueSnapshot, MilestoneRef};

use super::directory::MilestoneDirectory;

/// Milestones currently attached to one issue.
///
/// Keeps the issue's own ids, which may include milestones the directory no
/// longer lists (archived or hidden).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueMilestoneState {
    entries: Vec<MilestoneRef>,
}

impl IssueMilestoneState {
    /// Build from the issue's milestone objects, dropping repeated names.
    pub fn new(refs: &[MilestoneRef]) -> Self {
        let mut seen = HashSet::new();
        let entries = refs
            .iter()
            .filter(|m| seen.insert(m.name.clone()))
            .cloned()
            .collect();
        Self { entries }
    }

    pub fn from_snapshot(snapshot: &IssueSnapshot) -> Self {
        Self::new(&snapshot.milestones)
    }

    /// Names in the order the tracker reported them.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|m| m.name.clone()).collect()
    }

    pub fn id_of(&self, name: &str) -> Option<u64> {
        self.entries.iter().find(|m| m.name == name).map(|m| m.id)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|m| m.name == name)
    }

    pub fn entries(&self) -> &[MilestoneRef] {
        &self.entries
    }
}

/// The rule deciding an issue's desired milestone set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Policy {
    /// Attach one milestone, keeping the rest.
    Add { milestone: String },
    /// Detach one milestone, keeping the rest.
    Delete { milestone: String },
    /// Replace the whole set with the listed names that exist in the project.
    SetExact { raw_names: Vec<String> },
}

/// Informational diagnostics a policy can attach to its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "milestone", rename_all = "snake_case")]
pub enum PolicyNote {
    /// Delete target is not listed in the project; the issue's own id is used.
    NotInDirectory(String),
}

impl fmt::Display for PolicyNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInDirectory(name) => write!(
                f,
                "removing milestone \"{name}\" which is not currently listed in the project"
            ),
        }
    }
}

/// Why an issue was left untouched without being an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "milestones", rename_all = "snake_case")]
pub enum SkipReason {
    /// Add target does not exist in the project.
    UnknownMilestone(String),
    /// Issue carries a milestone from the skip set.
    HasSkipMilestone(Vec<String>),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMilestone(name) => {
                write!(f, "milestone \"{name}\" does not exist in the project")
            }
            Self::HasSkipMilestone(names) => {
                write!(f, "issue has skip milestone(s): {}", names.join(", "))
            }
        }
    }
}

/// Before/after milestone names for one issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    pub before_names: Vec<String>,
    pub after_names: Vec<String>,
    pub changed: bool,
    pub skipped: bool,
    pub skip_reason: Option<SkipReason>,
    pub notes: Vec<PolicyNote>,
}

impl ReconciliationResult {
    fn computed(before_names: Vec<String>, after_names: Vec<String>) -> Self {
        let changed = !same_set(&before_names, &after_names);
        Self {
            before_names,
            after_names,
            changed,
            skipped: false,
            skip_reason: None,
            notes: Vec::new(),
        }
    }

    /// A result that leaves the issue exactly as it is.
    pub fn untouched(before_names: Vec<String>, reason: SkipReason) -> Self {
        Self {
            after_names: before_names.clone(),
            before_names,
            changed: false,
            skipped: true,
            skip_reason: Some(reason),
            notes: Vec::new(),
        }
    }

    fn with_note(mut self, note: PolicyNote) -> Self {
        self.notes.push(note);
        self
    }
}

/// Compute the target milestone set for one issue.
pub fn reconcile(
    policy: &Policy,
    current: &IssueMilestoneState,
    directory: &MilestoneDirectory,
) -> ReconciliationResult {
    let before = current.names();
    match policy {
        Policy::Add { milestone } => {
            if !directory.contains(milestone) {
                return ReconciliationResult::untouched(
                    before,
                    SkipReason::UnknownMilestone(milestone.clone()),
                );
            }
            let mut after = before.clone();
            after.push(milestone.clone());
            ReconciliationResult::computed(before, dedup(after))
        }
        Policy::Delete { milestone } => {
            let removed: HashSet<u64> = current
                .entries()
                .iter()
                .filter(|m| &m.name == milestone)
                .map(|m| m.id)
                .collect();
            let after = current
                .entries()
                .iter()
                .filter(|m| !removed.contains(&m.id))
                .map(|m| m.name.clone())
                .collect();
            let result = ReconciliationResult::computed(before, after);
            if directory.contains(milestone) {
                result
            } else {
                result.with_note(PolicyNote::NotInDirectory(milestone.clone()))
            }
        }
        Policy::SetExact { raw_names } => {
            let after = raw_names
                .iter()
                .map(|name| name.trim())
                .filter(|name| !name.is_empty() && directory.contains(name))
                .map(ToString::to_string)
                .collect();
            ReconciliationResult::computed(before, dedup(after))
        }
    }
}

/// Ids to send for `after_names`, preferring the issue's own ids.
///
/// Names known to neither the issue nor the directory are dropped.
pub fn resolve_ids(
    after_names: &[String],
    current: &IssueMilestoneState,
    directory: &MilestoneDirectory,
) -> Vec<u64> {
    let mut seen = HashSet::new();
    after_names
        .iter()
        .filter_map(|name| current.id_of(name).or_else(|| directory.id_of(name)))
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Order-insensitive, duplicate-insensitive comparison.
pub fn same_set(a: &[String], b: &[String]) -> bool {
    let a: BTreeSet<&str> = a.iter().map(String::as_str).collect();
    let b: BTreeSet<&str> = b.iter().map(String::as_str).collect();
    a == b
}

fn dedup(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}
