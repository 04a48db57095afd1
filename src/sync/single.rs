use anyhow::{anyhow, bail, Result};
use colored::Colorize;
use std::path::{Component, Path, PathBuf};

use super::state::Repository;
use super::{narrate, Operation, SyncOutcome};
use crate::config::MANIFEST_KEY;
use crate::inventory::{self, StagedManifest};
use crate::reconcile::PathSet;
use crate::remote::{key_to_path, Direction, MirrorRequest, Remote};
use crate::report;
use crate::VerbosityLevel;

/// Turn a user-supplied file argument into an inventory key.
///
/// `file` may be relative to `cwd` or absolute; it need not exist. Both
/// `root` and `cwd` are expected to be canonical.
pub fn resolve_key(repo: &Repository, cwd: &Path, file: &Path) -> Result<String> {
    let joined = if file.is_absolute() {
        file.to_path_buf()
    } else {
        cwd.join(file)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    bail!("Invalid path: {}", file.display());
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    let relative = normalized.strip_prefix(repo.root()).map_err(|_| {
        anyhow!(
            "{} is outside the repository at {}",
            file.display(),
            repo.root().display()
        )
    })?;

    if relative.as_os_str().is_empty() || repo.filter().is_reserved(relative) {
        bail!("{} is not a trackable file", file.display());
    }

    let key = inventory::relative_key(relative)?;
    if repo.filter().is_excluded(&key) {
        bail!("{key} matches an exclude pattern");
    }
    Ok(key)
}

/// Fetch one file from the remote and record it in the baseline.
///
/// Nothing else in the tree is touched, and nothing is deleted.
pub fn checkout(
    repo: &Repository,
    remote: &dyn Remote,
    key: &str,
    verbosity: VerbosityLevel,
) -> Result<SyncOutcome> {
    let master = repo.fetch_master(remote, None)?;
    if !master.contains(key) {
        bail!("{key} is not listed in the remote manifest");
    }

    narrate(verbosity, "Fetching", key);
    let keys: PathSet = [key.to_string()].into_iter().collect();
    remote.mirror(&MirrorRequest::only(Direction::Pull, repo.root(), keys.clone(), false))?;

    let digest = inventory::digest_file(&key_to_path(repo.root(), key))?;
    if master.get(key) != Some(&digest) {
        log::warn!("{key} does not match the remote manifest after checkout");
    }

    let store = repo.baseline();
    let mut local = store.load()?;
    local.insert(key, digest);
    store.store(&local)?;

    println!("{} Checked out {}", "✓".green(), key.cyan());

    let outcome = SyncOutcome {
        transferred: keys,
        ..SyncOutcome::new(Operation::Checkout, false)
    };
    report::record(&repo.paths, &outcome);
    Ok(outcome)
}

/// Publish one file and the updated manifest, regardless of what the remote
/// holds for it.
pub fn checkin(
    repo: &mut Repository,
    remote: &dyn Remote,
    key: &str,
    verbosity: VerbosityLevel,
) -> Result<SyncOutcome> {
    let path = key_to_path(repo.root(), key);
    if !path.is_file() {
        bail!("{key} does not exist");
    }
    let digest = inventory::digest_file(&path)?;

    let store = repo.baseline();
    let mut local = store.load()?;
    let mut master = repo.fetch_master(remote, Some(&local))?;

    if master.contains(key) && master.get(key) != local.get(key) {
        log::warn!("Overwriting remote changes to {key}");
    }
    master.insert(key, digest.clone());
    local.insert(key, digest);

    let keys: PathSet = [key.to_string()].into_iter().collect();
    let mut includes = keys.clone();
    includes.insert(MANIFEST_KEY.to_string());

    {
        let _staged = StagedManifest::write(repo.paths.manifest_file(), &master)?;
        narrate(verbosity, "Sending", key);
        remote.mirror(&MirrorRequest::only(Direction::Push, repo.root(), includes, false))?;
    }

    store.store(&local)?;
    repo.mark_pushed()?;

    println!("{} Checked in {}", "✓".green(), key.cyan());

    let outcome = SyncOutcome {
        transferred: keys,
        ..SyncOutcome::new(Operation::Checkin, false)
    };
    report::record(&repo.paths, &outcome);
    Ok(outcome)
}
