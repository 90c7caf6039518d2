//! Project milestone directory: display name -> milestone id.

use std::collections::HashMap;

use tracing::debug;

use crate::backlog::{BacklogOperations, Milestone};
use crate::error::{Result, SyncError};

/// Name -> id resolution table for one project, fetched once per run.
#[derive(Debug, Clone, Default)]
pub struct MilestoneDirectory {
    milestones: Vec<Milestone>,
    by_name: HashMap<String, u64>,
}

impl MilestoneDirectory {
    /// Build from a milestone list. A later duplicate name wins.
    pub fn from_milestones(milestones: Vec<Milestone>) -> Self {
        let by_name = milestones
            .iter()
            .map(|m| (m.name.clone(), m.id))
            .collect();
        Self {
            milestones,
            by_name,
        }
    }

    /// Fetch the directory from the tracker. Any failure is a directory error.
    pub fn fetch(backlog: &dyn BacklogOperations) -> Result<Self> {
        let milestones = backlog.fetch_milestones().map_err(|err| match err {
            SyncError::DirectoryFetch(_) => err,
            other => SyncError::DirectoryFetch(other.to_string()),
        })?;
        debug!(count = milestones.len(), "Milestone directory loaded");
        Ok(Self::from_milestones(milestones))
    }

    pub fn id_of(&self, name: &str) -> Option<u64> {
        self.by_name.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Milestones in the order the tracker returned them.
    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backlog::mock::{ErrorInjection, MockBacklogClient, MockOp};

    #[test]
    fn resolves_names_to_ids() {
        let dir = MilestoneDirectory::from_milestones(vec![
            Milestone::new(1, "v1"),
            Milestone::new(2, "v2"),
        ]);
        assert_eq!(dir.id_of("v2"), Some(2));
        assert_eq!(dir.id_of("v3"), None);
        assert!(dir.contains("v1"));
        assert_eq!(dir.len(), 2);
    }

    #[test]
    fn later_duplicate_name_wins() {
        let dir = MilestoneDirectory::from_milestones(vec![
            Milestone::new(1, "v1"),
            Milestone::new(7, "v1"),
        ]);
        assert_eq!(dir.id_of("v1"), Some(7));
        assert_eq!(dir.milestones().len(), 2);
    }

    #[test]
    fn fetch_failure_is_directory_error() {
        let mock = MockBacklogClient::new();
        mock.inject_error(ErrorInjection::Operation(MockOp::FetchMilestones, Some(500)));
        let err = MilestoneDirectory::fetch(&mock).unwrap_err();
        assert!(matches!(err, SyncError::DirectoryFetch(_)));
    }
}
