use serde::{Deserialize, Serialize};

use super::classify::PathSet;
use super::resolve::{PathState, Reconciliation};
use crate::inventory::Inventory;

/// What a pull will transfer, finalize and refuse, plus the baseline to
/// persist once the transfer succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullPlan {
    pub transfer: PathSet,
    pub resolved: PathSet,
    pub conflicts: PathSet,
    pub baseline: Inventory,
}

/// What a push will transfer, finalize and refuse, plus the baseline and
/// remote manifest that describe the tree after it succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushPlan {
    pub transfer: PathSet,
    pub resolved: PathSet,
    pub conflicts: PathSet,
    pub baseline: Inventory,
    pub manifest: Inventory,
}

/// Categorized view used by `status --remote`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub conflicts: PathSet,
    pub modified_remotely: PathSet,
    pub modified_locally: PathSet,
    pub deleted_remotely: PathSet,
    pub deleted_locally: PathSet,
    /// Informational only here, although a pull refuses these paths.
    pub deleted_remotely_modified_locally: PathSet,
    pub resolved: PathSet,
}

impl StatusReport {
    /// True when nothing needs to move in either direction.
    pub fn is_current(&self) -> bool {
        self.conflicts.is_empty()
            && self.modified_remotely.is_empty()
            && self.modified_locally.is_empty()
            && self.deleted_remotely.is_empty()
            && self.deleted_locally.is_empty()
    }
}

impl<'a> Reconciliation<'a> {
    pub fn plan_pull(&self) -> PullPlan {
        let mut baseline = self.local.clone();

        for (path, state) in self.states() {
            match state {
                PathState::PullOnly | PathState::PushPullResolved => {
                    if let Some(digest) = self.master.get(path) {
                        baseline.insert(path, digest.clone());
                    }
                }
                PathState::KillOnly | PathState::PurgeKillResolved => {
                    baseline.remove(path);
                }
                _ => {}
            }
        }

        PullPlan {
            transfer: self.paths_in(&[PathState::PullOnly, PathState::KillOnly]),
            resolved: self.paths_in(&[PathState::PushPullResolved, PathState::PurgeKillResolved]),
            conflicts: self.paths_in(&[
                PathState::PushPullConflict,
                PathState::PurgeConflict,
                PathState::KillConflict,
            ]),
            baseline,
        }
    }

    pub fn plan_push(&self) -> PushPlan {
        let mut baseline = self.local.clone();
        let mut manifest = self.master.clone();

        for (path, state) in self.states() {
            match state {
                PathState::PushOnly | PathState::KillConflict => {
                    if let Some(digest) = self.current.get(path) {
                        baseline.insert(path, digest.clone());
                        manifest.insert(path, digest.clone());
                    }
                }
                PathState::PushPullResolved => {
                    if let Some(digest) = self.current.get(path) {
                        baseline.insert(path, digest.clone());
                    }
                }
                PathState::PurgeOnly => {
                    baseline.remove(path);
                    manifest.remove(path);
                }
                PathState::PurgeKillResolved => {
                    baseline.remove(path);
                }
                _ => {}
            }
        }

        PushPlan {
            transfer: self.paths_in(&[
                PathState::PushOnly,
                PathState::KillConflict,
                PathState::PurgeOnly,
            ]),
            resolved: self.paths_in(&[PathState::PushPullResolved, PathState::PurgeKillResolved]),
            conflicts: self.paths_in(&[PathState::PushPullConflict, PathState::PurgeConflict]),
            baseline,
            manifest,
        }
    }

    pub fn status(&self) -> StatusReport {
        StatusReport {
            conflicts: self.paths_in(&[PathState::PushPullConflict, PathState::PurgeConflict]),
            modified_remotely: self.paths_in(&[PathState::PullOnly]),
            modified_locally: self.paths_in(&[PathState::PushOnly]),
            deleted_remotely: self.paths_in(&[PathState::KillOnly]),
            deleted_locally: self.paths_in(&[PathState::PurgeOnly]),
            deleted_remotely_modified_locally: self.paths_in(&[PathState::KillConflict]),
            resolved: self.paths_in(&[PathState::PushPullResolved, PathState::PurgeKillResolved]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::Digest;
    use crate::reconcile::fixtures::{inv, scenario, set};

    #[test]
    fn test_scenario_pull_plan() {
        let (current, local, master) = scenario();
        let plan = Reconciliation::new(&current, &local, &master).plan_pull();

        assert_eq!(plan.conflicts, set(&["c", "f", "h", "j"]));
        assert_eq!(plan.transfer, set(&["b", "i", "m"]));
        assert_eq!(plan.resolved, set(&["d", "g", "l"]));

        // finalized to the remote content, without transfer
        assert_eq!(plan.baseline.get("d"), Some(&Digest::from("4")));
        assert_eq!(plan.baseline.get("g"), Some(&Digest::from("7")));
        assert!(!plan.baseline.contains("l"));
        // transferred
        assert_eq!(plan.baseline.get("b"), Some(&Digest::from("20")));
        assert_eq!(plan.baseline.get("m"), Some(&Digest::from("30")));
        assert!(!plan.baseline.contains("i"));
        // conflicts untouched
        for path in ["c", "f", "h", "j"] {
            assert_eq!(plan.baseline.get(path), local.get(path), "{path}");
        }
    }

    #[test]
    fn test_scenario_push_plan() {
        let (current, local, master) = scenario();
        let plan = Reconciliation::new(&current, &local, &master).plan_push();

        assert_eq!(plan.conflicts, set(&["c", "f", "h"]));
        assert_eq!(plan.transfer, set(&["a", "e", "j", "k"]));
        assert_eq!(plan.resolved, set(&["d", "g", "l"]));

        assert_eq!(plan.baseline.get("a"), current.get("a"));
        assert_eq!(plan.baseline.get("d"), current.get("d"));
        assert_eq!(plan.baseline.get("j"), current.get("j"));
        assert!(!plan.baseline.contains("e"));
        assert!(!plan.baseline.contains("l"));
        assert_eq!(plan.baseline.get("c"), local.get("c"));

        assert_eq!(plan.manifest.get("a"), current.get("a"));
        assert_eq!(plan.manifest.get("j"), current.get("j"));
        assert_eq!(plan.manifest.get("k"), current.get("k"));
        assert!(!plan.manifest.contains("e"));
        // remote conflicts stay as published
        assert_eq!(plan.manifest.get("c"), master.get("c"));
        assert_eq!(plan.manifest.get("f"), master.get("f"));
    }

    #[test]
    fn test_scenario_status() {
        let (current, local, master) = scenario();
        let status = Reconciliation::new(&current, &local, &master).status();

        assert_eq!(status.conflicts, set(&["c", "f", "h"]));
        assert_eq!(status.modified_remotely, set(&["b", "m"]));
        assert_eq!(status.modified_locally, set(&["a", "k"]));
        assert_eq!(status.deleted_remotely, set(&["i"]));
        assert_eq!(status.deleted_locally, set(&["e"]));
        assert_eq!(status.deleted_remotely_modified_locally, set(&["j"]));
        assert!(!status.is_current());
    }

    #[test]
    fn test_in_sync_tree_has_empty_plans() {
        let tree = inv(&[("a", "1"), ("b", "2")]);
        let rec = Reconciliation::new(&tree, &tree, &tree);

        let pull = rec.plan_pull();
        assert!(pull.transfer.is_empty() && pull.conflicts.is_empty());
        assert_eq!(pull.baseline, tree);

        let push = rec.plan_push();
        assert!(push.transfer.is_empty());
        assert_eq!(push.manifest, tree);
        assert!(rec.status().is_current());
    }

    #[test]
    fn test_push_after_pull_converges() {
        let (current, local, master) = scenario();
        let push = Reconciliation::new(&current, &local, &master).plan_push();

        // After a successful push, the remote manifest and baseline agree on
        // every path the push touched.
        for path in &push.transfer {
            assert_eq!(push.baseline.get(path), push.manifest.get(path), "{path}");
        }
    }
}
