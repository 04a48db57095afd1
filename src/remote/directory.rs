//! Remote backed by a plain directory.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::{key_to_path, Direction, ManifestSource, MirrorRequest, MirrorScope, Mirrorer, Remote};
use crate::config::MANIFEST_KEY;
use crate::error::SyncError;
use crate::filter::PathFilter;
use crate::inventory::{self, Inventory};

/// Mirrors into another directory with ordinary file copies.
#[derive(Debug, Clone)]
pub struct DirectoryRemote {
    dir: PathBuf,
    filter: PathFilter,
}

impl DirectoryRemote {
    pub fn new(dir: impl Into<PathBuf>, filter: PathFilter) -> Self {
        DirectoryRemote {
            dir: dir.into(),
            filter,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn endpoints<'a>(&'a self, request: &'a MirrorRequest) -> (&'a Path, &'a Path) {
        match request.direction {
            Direction::Push => (request.root.as_path(), self.dir.as_path()),
            Direction::Pull => (self.dir.as_path(), request.root.as_path()),
        }
    }

    fn tracked_keys(&self, base: &Path) -> Result<BTreeSet<String>> {
        if !base.exists() {
            return Ok(BTreeSet::new());
        }
        let mut keys: BTreeSet<String> = inventory::take_inventory(base, &self.filter)?
            .paths()
            .map(str::to_string)
            .collect();
        if key_to_path(base, MANIFEST_KEY).is_file() {
            keys.insert(MANIFEST_KEY.to_string());
        }
        Ok(keys)
    }
}

/// Copy `key` from `src` to `dst`, or remove it from `dst` when the source
/// lacks it and deletion is allowed.
fn mirror_one(src: &Path, dst: &Path, key: &str, delete: bool) -> Result<()> {
    let from = key_to_path(src, key);
    let to = key_to_path(dst, key);

    if from.is_file() {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::copy(&from, &to)
            .with_context(|| format!("Failed to copy {} to {}", from.display(), to.display()))?;
        log::debug!("copied {}", key);
    } else if delete && to.is_file() {
        fs::remove_file(&to).with_context(|| format!("Failed to delete {}", to.display()))?;
        log::debug!("deleted {}", key);
    }

    Ok(())
}

impl Mirrorer for DirectoryRemote {
    fn mirror(&self, request: &MirrorRequest) -> Result<()> {
        if request.direction == Direction::Pull && !self.dir.is_dir() {
            return Err(SyncError::transfer(
                request.direction,
                format!("remote directory {} does not exist", self.dir.display()),
            )
            .into());
        }

        let (src, dst) = self.endpoints(request);

        let run = || -> Result<()> {
            match &request.scope {
                MirrorScope::Only(keys) => {
                    for key in keys {
                        mirror_one(src, dst, key, request.delete)?;
                    }
                }
                MirrorScope::Everything => {
                    let source_keys = self.tracked_keys(src)?;
                    for key in &source_keys {
                        mirror_one(src, dst, key, false)?;
                    }
                    if request.delete {
                        for key in self.tracked_keys(dst)?.difference(&source_keys) {
                            mirror_one(src, dst, key, true)?;
                        }
                    }
                }
            }
            Ok(())
        };

        run().map_err(|e| SyncError::transfer(request.direction, format!("{e:#}")).into())
    }
}

impl ManifestSource for DirectoryRemote {
    fn fetch_manifest(&self) -> Result<Option<Inventory>> {
        if !self.dir.is_dir() {
            return Err(SyncError::RemoteUnavailable {
                remote: self.describe(),
                message: "directory does not exist".to_string(),
            }
            .into());
        }
        inventory::read_inventory_file(&key_to_path(&self.dir, MANIFEST_KEY))
    }

    fn inventory_contents(&self, _scratch: &Path) -> Result<Inventory> {
        if !self.dir.is_dir() {
            return Err(SyncError::RemoteUnavailable {
                remote: self.describe(),
                message: "directory does not exist".to_string(),
            }
            .into());
        }
        inventory::take_inventory(&self.dir, &self.filter)
    }
}

impl Remote for DirectoryRemote {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn preview(&self, request: &MirrorRequest) -> String {
        let (src, dst) = self.endpoints(request);
        let scope = match &request.scope {
            MirrorScope::Only(keys) => format!("{} file(s)", keys.len()),
            MirrorScope::Everything => "all tracked files".to_string(),
        };
        format!(
            "copy {} from {} to {}{}",
            scope,
            src.display(),
            dst.display(),
            if request.delete { " (deleting extraneous files)" } else { "" }
        )
    }
}
