use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::classify::{ChangeSets, PathSet};
use crate::inventory::Inventory;

/// Where a single path stands once all four change sets are known.
///
/// Exactly one state applies to each path, so every resolver below reads the
/// same decision and their partitions cannot disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathState {
    Unchanged,
    /// Changed in the working tree only.
    PushOnly,
    /// Changed on the remote only.
    PullOnly,
    /// Changed on both sides to different content.
    PushPullConflict,
    /// Changed on both sides to the same content.
    PushPullResolved,
    /// Deleted in the working tree only.
    PurgeOnly,
    /// Deleted on the remote only.
    KillOnly,
    /// Deleted on both sides.
    PurgeKillResolved,
    /// Deleted locally while the remote changed it.
    PurgeConflict,
    /// Deleted remotely while the working tree changed it.
    KillConflict,
}

impl PathState {
    fn classify(path: &str, changes: &ChangeSets, current: &Inventory, master: &Inventory) -> Self {
        let membership = (
            changes.push.contains(path),
            changes.pull.contains(path),
            changes.purge.contains(path),
            changes.kill.contains(path),
        );

        match membership {
            (false, false, false, false) => PathState::Unchanged,
            (true, true, _, _) => {
                if current.get(path) == master.get(path) {
                    PathState::PushPullResolved
                } else {
                    PathState::PushPullConflict
                }
            }
            (true, false, _, true) => PathState::KillConflict,
            (true, false, _, false) => PathState::PushOnly,
            (false, true, true, _) => PathState::PurgeConflict,
            (false, true, false, _) => PathState::PullOnly,
            (false, false, true, true) => PathState::PurgeKillResolved,
            (false, false, true, false) => PathState::PurgeOnly,
            (false, false, false, true) => PathState::KillOnly,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PathState::Unchanged => "unchanged",
            PathState::PushOnly => "modified locally",
            PathState::PullOnly => "modified remotely",
            PathState::PushPullConflict => "modified on both sides",
            PathState::PushPullResolved => "identical on both sides",
            PathState::PurgeOnly => "deleted locally",
            PathState::KillOnly => "deleted remotely",
            PathState::PurgeKillResolved => "deleted on both sides",
            PathState::PurgeConflict => "deleted locally, modified remotely",
            PathState::KillConflict => "deleted remotely, modified locally",
        }
    }
}

/// Outcome of one resolver: the overlap split into what needs a human and
/// what can be finalized without transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub conflict: PathSet,
    pub resolved: PathSet,
}

/// Classification of every touched path across `current`, `local` and `master`.
///
/// Building one is pure; nothing here mutates an inventory.
#[derive(Debug, Clone)]
pub struct Reconciliation<'a> {
    pub(crate) current: &'a Inventory,
    pub(crate) local: &'a Inventory,
    pub(crate) master: &'a Inventory,
    changes: ChangeSets,
    states: BTreeMap<String, PathState>,
}

impl<'a> Reconciliation<'a> {
    pub fn new(current: &'a Inventory, local: &'a Inventory, master: &'a Inventory) -> Self {
        let changes = ChangeSets::compute(current, local, master);

        let states = changes
            .touched()
            .into_iter()
            .map(|path| {
                let state = PathState::classify(&path, &changes, current, master);
                (path, state)
            })
            .collect();

        Reconciliation {
            current,
            local,
            master,
            changes,
            states,
        }
    }

    pub fn changes(&self) -> &ChangeSets {
        &self.changes
    }

    pub fn state(&self, path: &str) -> PathState {
        self.states.get(path).copied().unwrap_or(PathState::Unchanged)
    }

    /// Every touched path with its state, in path order.
    pub fn states(&self) -> impl Iterator<Item = (&str, PathState)> {
        self.states.iter().map(|(p, s)| (p.as_str(), *s))
    }

    /// Paths whose state is one of `wanted`.
    pub fn paths_in(&self, wanted: &[PathState]) -> PathSet {
        self.states()
            .filter(|(_, state)| wanted.contains(state))
            .map(|(path, _)| path.to_string())
            .collect()
    }

    fn partition(&self, input: &PathSet, conflict: &[PathState], resolved: &[PathState]) -> Resolution {
        let mut resolution = Resolution::default();
        for path in input {
            let state = self.state(path);
            if conflict.contains(&state) {
                resolution.conflict.insert(path.clone());
            } else if resolved.contains(&state) {
                resolution.resolved.insert(path.clone());
            }
        }
        resolution
    }

    /// Local edits that collide with remote edits.
    ///
    /// A path deleted remotely but edited locally is not a conflict here: the
    /// push re-publishes it.
    pub fn resolve_push_conflicts(&self) -> Resolution {
        self.partition(
            &self.changes.push,
            &[PathState::PushPullConflict],
            &[PathState::PushPullResolved],
        )
    }

    /// Remote edits that collide with local edits or local deletions.
    pub fn resolve_pull_conflicts(&self) -> Resolution {
        self.partition(
            &self.changes.pull,
            &[PathState::PushPullConflict, PathState::PurgeConflict],
            &[PathState::PushPullResolved],
        )
    }

    /// Local deletions that collide with remote edits.
    pub fn resolve_purge_conflicts(&self) -> Resolution {
        self.partition(
            &self.changes.purge,
            &[PathState::PurgeConflict],
            &[PathState::PurgeKillResolved],
        )
    }

    /// Remote deletions that collide with local edits.
    pub fn resolve_kill_conflicts(&self) -> Resolution {
        self.partition(
            &self.changes.kill,
            &[PathState::KillConflict],
            &[PathState::PurgeKillResolved],
        )
    }
}
