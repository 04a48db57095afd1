use anyhow::Result;
use colored::Colorize;

use super::state::Repository;
use super::{narrate, print_summary, Operation, SyncOutcome};
use crate::inventory::StagedManifest;
use crate::remote::{Direction, MirrorRequest, MirrorScope, Remote};
use crate::report;
use crate::VerbosityLevel;

/// Replace the remote with the working tree.
///
/// Publishes `current` as the manifest, mirrors every tracked file with
/// deletion of anything else, and resets the baseline to `current`. Remote
/// changes are discarded without classification; callers confirm first.
pub fn overwrite_master(
    repo: &mut Repository,
    remote: &dyn Remote,
    verbosity: VerbosityLevel,
) -> Result<SyncOutcome> {
    if verbosity != VerbosityLevel::Quiet {
        println!(
            "{}",
            format!("Overwriting {} with the working tree...", remote.describe())
                .cyan()
                .bold()
        );
    }

    narrate(verbosity, "Taking", "inventory...");
    let current = repo.take_inventory()?;

    let request = MirrorRequest {
        direction: Direction::Push,
        root: repo.root().to_path_buf(),
        scope: MirrorScope::Everything,
        delete: true,
    };

    {
        let _staged = StagedManifest::write(repo.paths.manifest_file(), &current)?;
        narrate(
            verbosity,
            "Transferring",
            &format!("{} file(s)...", current.len()),
        );
        remote.mirror(&request)?;
    }

    repo.baseline().store(&current)?;
    repo.mark_pushed()?;
    log::info!("Remote overwritten with {} file(s)", current.len());

    let outcome = SyncOutcome {
        transferred: current.paths().map(str::to_string).collect(),
        ..SyncOutcome::new(Operation::OverwriteMaster, false)
    };
    print_summary(&outcome, verbosity);
    report::record(&repo.paths, &outcome);

    Ok(outcome)
}
