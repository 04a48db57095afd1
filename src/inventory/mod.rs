//! Inventories: snapshots mapping relative file paths to content digests.
//!
//! Three inventories take part in every sync: `current` (the live tree),
//! `local` (the baseline persisted after the last successful sync) and
//! `master` (the manifest published on the remote).

mod scan;
mod store;

pub use scan::{digest_file, take_inventory};
pub use store::{BaselineStore, StagedManifest};
pub(crate) use scan::relative_key;
pub(crate) use store::{read_inventory_file, write_atomic};

use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::SyncError;

/// Hex-encoded MD5 digest of a file's bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    pub fn new(hex: impl Into<String>) -> Self {
        Digest(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Digest {
    fn from(value: &str) -> Self {
        Digest(value.to_string())
    }
}

/// Mapping of `/`-separated relative path to digest.
///
/// Keys are kept sorted so the persisted form is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    entries: BTreeMap<String, Digest>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&Digest> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn insert(&mut self, path: impl Into<String>, digest: Digest) -> Option<Digest> {
        self.entries.insert(path.into(), digest)
    }

    pub fn remove(&mut self, path: &str) -> Option<Digest> {
        self.entries.remove(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Digest> {
        self.entries.iter()
    }

    /// Parse the tab-separated manifest format (`path\tdigest` per line).
    ///
    /// `source_name` only labels errors. Blank lines are skipped; anything
    /// else that is not a non-empty path and digest separated by a tab is
    /// rejected rather than silently dropped.
    pub fn parse(content: &str, source_name: &str) -> Result<Self, SyncError> {
        let mut inventory = Inventory::new();

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            let (path, digest) = line
                .split_once('\t')
                .ok_or_else(|| SyncError::malformed(source_name, index + 1, "missing tab separator"))?;

            let digest = digest.trim();
            if path.is_empty() {
                return Err(SyncError::malformed(source_name, index + 1, "empty path"));
            }
            if path.starts_with('/') || path.split('/').any(|part| part == "..") {
                return Err(SyncError::malformed(
                    source_name,
                    index + 1,
                    format!("path escapes the repository: {path}"),
                ));
            }
            if digest.is_empty() || digest.contains('\t') {
                return Err(SyncError::malformed(source_name, index + 1, "invalid digest"));
            }

            inventory.insert(path, Digest::new(digest));
        }

        Ok(inventory)
    }

    /// Render in the manifest format, sorted by path.
    pub fn to_manifest_string(&self) -> String {
        let mut out = String::new();
        for (path, digest) in &self.entries {
            out.push_str(path);
            out.push('\t');
            out.push_str(digest.as_str());
            out.push('\n');
        }
        out
    }
}

impl<P: Into<String>> FromIterator<(P, Digest)> for Inventory {
    fn from_iter<T: IntoIterator<Item = (P, Digest)>>(iter: T) -> Self {
        Inventory {
            entries: iter.into_iter().map(|(p, d)| (p.into(), d)).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Inventory {
    type Item = (&'a String, &'a Digest);
    type IntoIter = btree_map::Iter<'a, String, Digest>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
