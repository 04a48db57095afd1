use anyhow::{bail, Context, Result};
use colored::{Color, Colorize};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::print_paths;
use super::state::Repository;
use crate::inventory;
use crate::reconcile::{PathSet, Reconciliation};
use crate::remote::{key_to_path, Remote};
use crate::VerbosityLevel;

/// What `stash` did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StashOutcome {
    /// Files moved into `.dat/stash/`
    pub stashed: PathSet,
    /// Paths dropped from the baseline (a superset of `stashed`)
    pub forgotten: PathSet,
}

/// Move every file that blocks a pull out of the way.
///
/// Blocking files go to `.dat/stash/` under their relative path and are
/// forgotten by the baseline, so the next pull takes the remote version.
pub fn stash(repo: &Repository, remote: &dyn Remote, verbosity: VerbosityLevel) -> Result<StashOutcome> {
    let stash_dir = repo.paths.stash_dir();
    if stash_dir.exists() {
        bail!(
            "Unpopped stash detected at {}; run 'dat stash pop' first",
            stash_dir.display()
        );
    }

    let current = repo.take_inventory()?;
    let store = repo.baseline();
    let mut local = store.load()?;
    let master = repo.fetch_master(remote, None)?;
    if local.is_empty() {
        log::info!("Baseline is empty; treating the working tree as the baseline");
        local = current.clone();
    }

    let blocking = Reconciliation::new(&current, &local, &master)
        .plan_pull()
        .conflicts;
    if blocking.is_empty() {
        println!("{} Nothing to stash", "✓".green());
        return Ok(StashOutcome::default());
    }

    fs::create_dir_all(&stash_dir)
        .with_context(|| format!("Failed to create {}", stash_dir.display()))?;

    let mut outcome = StashOutcome::default();
    for key in &blocking {
        let source = key_to_path(repo.root(), key);
        if source.is_file() {
            move_file(&source, &key_to_path(&stash_dir, key))?;
            outcome.stashed.insert(key.clone());
        }
        local.remove(key);
        outcome.forgotten.insert(key.clone());
    }

    store.store(&local)?;
    log::info!("Stashed {} file(s)", outcome.stashed.len());

    if verbosity != VerbosityLevel::Quiet {
        print_paths("Stashed:", &outcome.stashed, Color::Yellow);
    }
    println!(
        "{} Stashed {} file(s); run 'dat pull' to take the remote versions",
        "✓".green(),
        outcome.stashed.len()
    );

    Ok(outcome)
}

/// Move stashed files back into the working tree.
///
/// Unless `hard`, nothing is moved when any destination already exists.
pub fn stash_pop(repo: &Repository, hard: bool) -> Result<PathSet> {
    let stash_dir = repo.paths.stash_dir();
    if !stash_dir.is_dir() {
        bail!("No stash to pop");
    }

    let mut stashed = PathSet::new();
    for entry in WalkDir::new(&stash_dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to read {}", stash_dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(&stash_dir)
            .with_context(|| format!("Unexpected stash entry {}", entry.path().display()))?;
        stashed.insert(inventory::relative_key(relative)?);
    }

    if !hard {
        let occupied: PathSet = stashed
            .iter()
            .filter(|key| key_to_path(repo.root(), key).exists())
            .cloned()
            .collect();
        if !occupied.is_empty() {
            print_paths("Would overwrite:", &occupied, Color::Red);
            bail!(
                "{} stashed file(s) would overwrite existing files; use --hard to overwrite",
                occupied.len()
            );
        }
    }

    for key in &stashed {
        let destination = key_to_path(repo.root(), key);
        if hard && destination.is_file() {
            fs::remove_file(&destination)
                .with_context(|| format!("Failed to remove {}", destination.display()))?;
        }
        move_file(&key_to_path(&stash_dir, key), &destination)?;
    }

    fs::remove_dir_all(&stash_dir)
        .with_context(|| format!("Failed to remove {}", stash_dir.display()))?;

    println!("{} Restored {} stashed file(s)", "✓".green(), stashed.len());
    Ok(stashed)
}

fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::rename(from, to)
        .with_context(|| format!("Failed to move {} to {}", from.display(), to.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepoPaths;
    use crate::sync::RepoConfig;
    use tempfile::TempDir;

    fn repo() -> (TempDir, Repository) {
        let temp = TempDir::new().unwrap();
        let paths = RepoPaths::new(temp.path());
        let config = RepoConfig::new("./share");
        config.save(&paths).unwrap();
        let repo = Repository::open(temp.path()).unwrap();
        (temp, repo)
    }

    #[test]
    fn test_pop_restores_nested_files() {
        let (temp, repo) = repo();
        let stash_dir = repo.paths.stash_dir();
        fs::create_dir_all(stash_dir.join("data")).unwrap();
        fs::write(stash_dir.join("data/x.csv"), "mine").unwrap();

        let restored = stash_pop(&repo, false).unwrap();

        assert!(restored.contains("data/x.csv"));
        assert_eq!(fs::read_to_string(temp.path().join("data/x.csv")).unwrap(), "mine");
        assert!(!stash_dir.exists());
    }

    #[test]
    fn test_pop_refuses_to_overwrite_without_hard() {
        let (temp, repo) = repo();
        let stash_dir = repo.paths.stash_dir();
        fs::create_dir_all(&stash_dir).unwrap();
        fs::write(stash_dir.join("a.txt"), "stashed").unwrap();
        fs::write(stash_dir.join("b.txt"), "stashed").unwrap();
        fs::write(temp.path().join("a.txt"), "pulled").unwrap();

        assert!(stash_pop(&repo, false).is_err());
        // nothing moved
        assert!(stash_dir.join("b.txt").exists());
        assert!(!temp.path().join("b.txt").exists());

        stash_pop(&repo, true).unwrap();
        assert_eq!(fs::read_to_string(temp.path().join("a.txt")).unwrap(), "stashed");
        assert!(temp.path().join("b.txt").exists());
    }

    #[test]
    fn test_pop_without_stash_is_error() {
        let (_temp, repo) = repo();
        assert!(stash_pop(&repo, false).is_err());
    }
}
