//! Skip gate: leave an issue alone when it carries an excluded milestone.

use std::collections::BTreeSet;

/// Names in `current` that are also in `skip_set`, in `current` order.
pub fn matching_skip_milestones(current: &[String], skip_set: &BTreeSet<String>) -> Vec<String> {
    if skip_set.is_empty() {
        return Vec::new();
    }
    current
        .iter()
        .filter(|name| skip_set.contains(name.as_str()))
        .cloned()
        .collect()
}

/// True iff `skip_set` is non-empty and shares a name with `current`.
pub fn should_skip(current: &[String], skip_set: &BTreeSet<String>) -> bool {
    !skip_set.is_empty() && current.iter().any(|name| skip_set.contains(name.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn empty_skip_set_never_skips() {
        assert!(!should_skip(&names(&["frozen"]), &BTreeSet::new()));
    }

    #[test]
    fn intersection_skips() {
        let skip = set(&["frozen"]);
        assert!(should_skip(&names(&["frozen", "v1"]), &skip));
        assert!(!should_skip(&names(&["v1"]), &skip));
        assert!(!should_skip(&[], &skip));
    }

    #[test]
    fn matching_reports_hits_in_issue_order() {
        let skip = set(&["b", "a"]);
        assert_eq!(
            matching_skip_milestones(&names(&["a", "x", "b"]), &skip),
            names(&["a", "b"])
        );
    }
}
