use anyhow::{bail, Result};
use colored::Colorize;

use super::state::Repository;
use super::{narrate, Operation, SyncOutcome};
use crate::config::MANIFEST_KEY;
use crate::inventory::StagedManifest;
use crate::reconcile::PathSet;
use crate::remote::{Direction, MirrorRequest, Remote};
use crate::report;
use crate::VerbosityLevel;

/// Rebuild a missing or corrupt remote manifest from what the remote holds.
///
/// Only `.dat/master` is uploaded; remote files and the local baseline are
/// left alone.
pub fn repair_master(
    repo: &mut Repository,
    remote: &dyn Remote,
    verbosity: VerbosityLevel,
) -> Result<SyncOutcome> {
    let scratch = repo.paths.remote_scratch();
    if scratch.exists() {
        bail!(
            "{} already exists; remove it before running repair-master",
            scratch.display()
        );
    }

    if verbosity != VerbosityLevel::Quiet {
        println!(
            "{}",
            format!("Rebuilding the manifest of {}...", remote.describe())
                .cyan()
                .bold()
        );
    }

    narrate(verbosity, "Taking", "inventory of the remote...");
    let master = remote.inventory_contents(&scratch)?;
    log::info!("Remote holds {} tracked file(s)", master.len());

    let keys: PathSet = [MANIFEST_KEY.to_string()].into_iter().collect();
    {
        let _staged = StagedManifest::write(repo.paths.manifest_file(), &master)?;
        narrate(verbosity, "Publishing", "manifest...");
        remote.mirror(&MirrorRequest::only(Direction::Push, repo.root(), keys.clone(), false))?;
    }
    repo.mark_pushed()?;

    println!(
        "{} Manifest rebuilt with {} file(s)",
        "✓".green(),
        master.len()
    );

    let outcome = SyncOutcome {
        transferred: keys,
        ..SyncOutcome::new(Operation::RepairMaster, false)
    };
    report::record(&repo.paths, &outcome);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepoPaths;
    use crate::filter::PathFilter;
    use crate::remote::{DirectoryRemote, ManifestSource};
    use crate::sync::RepoConfig;
    use std::fs;
    use tempfile::TempDir;

    fn repo(share: &TempDir) -> (TempDir, Repository) {
        let temp = TempDir::new().unwrap();
        let paths = RepoPaths::new(temp.path());
        let config = RepoConfig::new(share.path().to_str().unwrap());
        let repo = Repository::from_parts(paths, config).unwrap();
        (temp, repo)
    }

    #[test]
    fn test_repair_lists_remote_files() {
        let share = TempDir::new().unwrap();
        fs::create_dir_all(share.path().join("data")).unwrap();
        fs::write(share.path().join("data/x.csv"), "1,2").unwrap();
        fs::write(share.path().join("notes.md"), "n").unwrap();
        let (_temp, mut repo) = repo(&share);
        let remote = DirectoryRemote::new(share.path(), PathFilter::default());

        let outcome = repair_master(&mut repo, &remote, VerbosityLevel::Quiet).unwrap();

        assert_eq!(outcome.operation, Operation::RepairMaster);
        let manifest = remote.fetch_manifest().unwrap().unwrap();
        assert_eq!(manifest.paths().collect::<Vec<_>>(), vec!["data/x.csv", "notes.md"]);
        assert!(!repo.paths.manifest_file().exists());
        assert!(repo.config.pushed);
    }

    #[test]
    fn test_repair_refuses_leftover_scratch() {
        let share = TempDir::new().unwrap();
        let (_temp, mut repo) = repo(&share);
        fs::create_dir_all(repo.paths.remote_scratch()).unwrap();
        let remote = DirectoryRemote::new(share.path(), PathFilter::default());

        assert!(repair_master(&mut repo, &remote, VerbosityLevel::Quiet).is_err());
        assert!(!share.path().join(".dat/master").exists());
    }
}
