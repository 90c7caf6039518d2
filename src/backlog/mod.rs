//! Backlog (nulab) integration module.
//!
//! Provides the tracker collaborator the milestone engine talks to.
//!
//! # Usage
//!
//! ```rust,ignore
//! use milestone_sync::backlog::{BacklogClient, BacklogOperations, BacklogSettings};
//!
//! let client = BacklogClient::new(settings, Duration::from_secs(30))?;
//! let milestones = client.fetch_milestones()?;
//! let issue = client.fetch_issue("PRJ-1")?;
//! client.apply_milestones("PRJ-1", &[1, 2])?;
//! ```

mod client;
pub mod mock;
mod types;

pub use client::{
    BacklogClient, BacklogOperations, BacklogSettings, DEFAULT_TIMEOUT_SECS, milestone_form,
};
pub use types::{BacklogErrorDetail, BacklogErrorResponse, IssueSnapshot, Milestone, MilestoneRef};
