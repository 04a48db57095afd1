use anyhow::Result;
use colored::{Color, Colorize};

use super::state::Repository;
use super::{
    narrate, print_dry_run, print_paths, print_summary, print_up_to_date, Operation, SyncOptions,
    SyncOutcome,
};
use crate::reconcile::Reconciliation;
use crate::remote::{Direction, MirrorRequest, Remote};
use crate::report;
use crate::VerbosityLevel;

/// Bring remote changes into the working tree.
///
/// Only paths unchanged locally are transferred; paths that changed on both
/// sides are refused and listed. Paths whose local and remote edits already
/// agree are recorded in the baseline without any transfer. The baseline is
/// written only after the mirror succeeds, so a failed transfer leaves the
/// repository exactly as it was.
pub fn pull(repo: &mut Repository, remote: &dyn Remote, options: &SyncOptions) -> Result<SyncOutcome> {
    let verbosity = options.verbosity;
    if verbosity != VerbosityLevel::Quiet {
        println!("{}", format!("Pulling from {}...", remote.describe()).cyan().bold());
    }

    narrate(verbosity, "Taking", "inventory...");
    let current = repo.take_inventory()?;
    let store = repo.baseline();
    let local = store.load()?;

    narrate(verbosity, "Obtaining", "master manifest...");
    let master = repo.fetch_master(remote, None)?;
    log::debug!(
        "pull: {} current, {} local, {} master",
        current.len(),
        local.len(),
        master.len()
    );

    let reconciliation = Reconciliation::new(&current, &local, &master);
    for (path, state) in reconciliation.states() {
        log::debug!("{path}: {}", state.as_str());
    }
    let plan = reconciliation.plan_pull();

    print_paths(
        "Unable to pull the following files (conflict with current):",
        &plan.conflicts,
        Color::Red,
    );

    let changes = reconciliation.changes();
    if changes.pull.is_empty() && changes.kill.is_empty() {
        if !options.dry_run {
            store.store(&plan.baseline)?;
        }
        print_up_to_date(verbosity);
        let mut outcome = SyncOutcome::up_to_date(Operation::Pull);
        outcome.conflicts = plan.conflicts;
        return Ok(outcome);
    }

    let request = (!plan.transfer.is_empty())
        .then(|| MirrorRequest::only(Direction::Pull, repo.root(), plan.transfer.clone(), true));

    let mut outcome = SyncOutcome::new(Operation::Pull, options.dry_run);
    outcome.resolved = plan.resolved.clone();
    outcome.conflicts = plan.conflicts.clone();

    if options.dry_run {
        print_dry_run(remote, request.as_ref(), &plan.resolved);
        outcome.transferred = plan.transfer;
        return Ok(outcome);
    }

    if let Some(request) = &request {
        narrate(
            verbosity,
            "Transferring",
            &format!("{} file(s)...", plan.transfer.len()),
        );
        remote.mirror(request)?;
    }

    store.store(&plan.baseline)?;
    repo.mark_pushed()?;
    log::info!(
        "pull finished: {} transferred, {} resolved, {} conflicts",
        plan.transfer.len(),
        plan.resolved.len(),
        plan.conflicts.len()
    );

    outcome.transferred = plan.transfer;
    print_summary(&outcome, verbosity);
    report::record(&repo.paths, &outcome);

    Ok(outcome)
}
