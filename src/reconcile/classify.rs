use std::collections::BTreeSet;

use crate::inventory::Inventory;

/// A set of inventory paths, ordered for stable reporting.
pub type PathSet = BTreeSet<String>;

/// Paths in `a` that are absent from `b` or carry a different digest there.
pub fn diff_modified(a: &Inventory, b: &Inventory) -> PathSet {
    a.iter()
        .filter(|(path, digest)| b.get(path) != Some(*digest))
        .map(|(path, _)| path.clone())
        .collect()
}

/// Paths present in `b` but missing from `a`.
pub fn diff_removed(a: &Inventory, b: &Inventory) -> PathSet {
    b.paths()
        .filter(|path| !a.contains(path))
        .map(str::to_string)
        .collect()
}

/// The four canonical change sets, all anchored on the `local` baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSets {
    /// Added or modified in the working tree.
    pub push: PathSet,
    /// Added or modified on the remote.
    pub pull: PathSet,
    /// Deleted from the working tree.
    pub purge: PathSet,
    /// Deleted from the remote.
    pub kill: PathSet,
}

impl ChangeSets {
    pub fn compute(current: &Inventory, local: &Inventory, master: &Inventory) -> Self {
        ChangeSets {
            push: diff_modified(current, local),
            pull: diff_modified(master, local),
            purge: diff_removed(current, local),
            kill: diff_removed(master, local),
        }
    }

    /// Only the local half, for when the remote is not consulted.
    pub fn local_only(current: &Inventory, local: &Inventory) -> Self {
        ChangeSets {
            push: diff_modified(current, local),
            purge: diff_removed(current, local),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.push.is_empty() && self.pull.is_empty() && self.purge.is_empty() && self.kill.is_empty()
    }

    /// Every path mentioned by any of the four sets.
    pub fn touched(&self) -> PathSet {
        self.push
            .iter()
            .chain(&self.pull)
            .chain(&self.purge)
            .chain(&self.kill)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::fixtures::{inv, set};

    #[test]
    fn test_diff_modified_detects_new_and_changed() {
        let a = inv(&[("new", "1"), ("changed", "2"), ("same", "3")]);
        let b = inv(&[("changed", "9"), ("same", "3"), ("gone", "4")]);

        assert_eq!(diff_modified(&a, &b), set(&["changed", "new"]));
    }

    #[test]
    fn test_diff_removed_detects_missing() {
        let a = inv(&[("kept", "1")]);
        let b = inv(&[("kept", "1"), ("gone", "2")]);

        assert_eq!(diff_removed(&a, &b), set(&["gone"]));
    }

    #[test]
    fn test_empty_baseline_everything_is_new() {
        let current = inv(&[("a", "1"), ("b", "2")]);
        let master = inv(&[("c", "3")]);
        let changes = ChangeSets::compute(&current, &Inventory::new(), &master);

        assert_eq!(changes.push, set(&["a", "b"]));
        assert_eq!(changes.pull, set(&["c"]));
        assert!(changes.purge.is_empty());
        assert!(changes.kill.is_empty());
    }

    #[test]
    fn test_untouched_file_in_no_set() {
        let same = inv(&[("x", "1"), ("y", "2")]);
        let changes = ChangeSets::compute(&same, &same, &same);
        assert!(changes.is_empty());
        assert!(changes.touched().is_empty());
    }

    #[test]
    fn test_local_only_leaves_remote_sets_empty() {
        let current = inv(&[("a", "2")]);
        let local = inv(&[("a", "1"), ("b", "1")]);
        let changes = ChangeSets::local_only(&current, &local);

        assert_eq!(changes.push, set(&["a"]));
        assert_eq!(changes.purge, set(&["b"]));
        assert!(changes.pull.is_empty() && changes.kill.is_empty());
    }
}
