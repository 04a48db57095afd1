//! Property tests for change classification and conflict resolution.

use dat::inventory::{Digest, Inventory};
use dat::reconcile::{diff_modified, diff_removed, PathSet, Reconciliation, Resolution};
use proptest::prelude::*;

/// Small key and digest spaces so the three inventories overlap often.
fn inventory() -> impl Strategy<Value = Inventory> {
    prop::collection::btree_map("[a-f]", 0u8..3, 0..6).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(path, digest)| (path, Digest::new(digest.to_string())))
            .collect()
    })
}

fn union(a: &PathSet, b: &PathSet) -> PathSet {
    a.union(b).cloned().collect()
}

fn intersection(a: &PathSet, b: &PathSet) -> PathSet {
    a.intersection(b).cloned().collect()
}

fn assert_partition(resolution: &Resolution, input: &PathSet, competing: &PathSet) {
    assert!(resolution.conflict.is_disjoint(&resolution.resolved));
    assert_eq!(
        union(&resolution.conflict, &resolution.resolved),
        intersection(input, competing)
    );
}

proptest! {
    #[test]
    fn diff_of_identical_inventories_is_empty(a in inventory()) {
        prop_assert!(diff_modified(&a, &a).is_empty());
        prop_assert!(diff_removed(&a, &a).is_empty());
    }

    #[test]
    fn modified_and_removed_are_disjoint(a in inventory(), b in inventory()) {
        prop_assert!(diff_modified(&a, &b).is_disjoint(&diff_removed(&a, &b)));
    }

    #[test]
    fn resolvers_partition_their_overlap(
        current in inventory(),
        local in inventory(),
        master in inventory(),
    ) {
        let rec = Reconciliation::new(&current, &local, &master);
        let changes = rec.changes().clone();

        assert_partition(&rec.resolve_push_conflicts(), &changes.push, &changes.pull);
        assert_partition(
            &rec.resolve_pull_conflicts(),
            &changes.pull,
            &union(&changes.push, &changes.purge),
        );
        assert_partition(
            &rec.resolve_purge_conflicts(),
            &changes.purge,
            &union(&changes.pull, &changes.kill),
        );
        assert_partition(
            &rec.resolve_kill_conflicts(),
            &changes.kill,
            &union(&changes.push, &changes.purge),
        );
    }

    #[test]
    fn resolved_paths_agree_and_conflicts_do_not(
        current in inventory(),
        local in inventory(),
        master in inventory(),
    ) {
        let rec = Reconciliation::new(&current, &local, &master);

        let push = rec.resolve_push_conflicts();
        for path in &push.resolved {
            prop_assert_eq!(current.get(path), master.get(path));
        }
        for path in &push.conflict {
            prop_assert_ne!(current.get(path), master.get(path));
        }

        for path in &rec.resolve_purge_conflicts().resolved {
            prop_assert!(!current.contains(path) && !master.contains(path));
        }
        for path in &rec.resolve_kill_conflicts().conflict {
            prop_assert!(current.contains(path) && !master.contains(path));
        }
    }

    #[test]
    fn plans_never_transfer_conflicts(
        current in inventory(),
        local in inventory(),
        master in inventory(),
    ) {
        let rec = Reconciliation::new(&current, &local, &master);

        let pull = rec.plan_pull();
        prop_assert!(pull.transfer.is_disjoint(&pull.conflicts));
        prop_assert!(pull.transfer.is_disjoint(&pull.resolved));
        prop_assert!(pull.resolved.is_disjoint(&pull.conflicts));

        let push = rec.plan_push();
        prop_assert!(push.transfer.is_disjoint(&push.conflicts));
        prop_assert!(push.transfer.is_disjoint(&push.resolved));
        for path in &push.transfer {
            prop_assert_eq!(push.baseline.get(path), push.manifest.get(path));
        }
    }

    #[test]
    fn pull_leaves_only_conflicts_pending(
        current in inventory(),
        local in inventory(),
        master in inventory(),
    ) {
        let plan = Reconciliation::new(&current, &local, &master).plan_pull();

        // The working tree after the mirror has run.
        let mut pulled = current.clone();
        for path in &plan.transfer {
            match master.get(path) {
                Some(digest) => { pulled.insert(path.as_str(), digest.clone()); }
                None => { pulled.remove(path); }
            }
        }

        let again = Reconciliation::new(&pulled, &plan.baseline, &master);
        let pending = union(&again.changes().pull, &again.changes().kill);
        prop_assert!(pending.is_subset(&plan.conflicts));
    }
}
