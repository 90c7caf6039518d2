//! Milestone reconciliation engine

pub mod batch;
pub mod directory;
pub mod pacing;
pub mod policy;
pub mod retry;
pub mod run_config;
pub mod skip_gate;

pub use batch::{BatchDriver, IssueOutcome, RunSummary, run_batch};
pub use directory::MilestoneDirectory;
pub use pacing::{RecordingSleeper, Sleeper, ThreadSleeper};
pub use policy::{
    IssueMilestoneState, Policy, PolicyNote, ReconciliationResult, SkipReason, reconcile,
    resolve_ids,
};
pub use retry::{CallOutcome, RetryConfig, call_with_retry};
pub use run_config::{Operation, RunConfig};
pub use skip_gate::should_skip;
