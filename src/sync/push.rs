use anyhow::Result;
use colored::{Color, Colorize};

use super::state::Repository;
use super::{
    narrate, print_dry_run, print_paths, print_summary, print_up_to_date, Operation, SyncOptions,
    SyncOutcome,
};
use crate::config::MANIFEST_KEY;
use crate::inventory::StagedManifest;
use crate::reconcile::{ChangeSets, Reconciliation};
use crate::remote::{Direction, MirrorRequest, Remote};
use crate::report;
use crate::VerbosityLevel;

/// Publish local changes to the remote.
///
/// When nothing changed locally the remote is not contacted at all. Otherwise
/// the new manifest is staged at `.dat/master` and mirrored together with the
/// changed files, so the remote never lists a file it does not hold. Paths
/// that changed on the remote since the last sync are refused.
pub fn push(repo: &mut Repository, remote: &dyn Remote, options: &SyncOptions) -> Result<SyncOutcome> {
    let verbosity = options.verbosity;
    if verbosity != VerbosityLevel::Quiet {
        println!("{}", format!("Pushing to {}...", remote.describe()).cyan().bold());
    }

    narrate(verbosity, "Taking", "inventory...");
    let current = repo.take_inventory()?;
    let store = repo.baseline();
    let local = store.load()?;

    let local_changes = ChangeSets::local_only(&current, &local);
    if local_changes.push.is_empty() && local_changes.purge.is_empty() {
        print_up_to_date(verbosity);
        return Ok(SyncOutcome::up_to_date(Operation::Push));
    }

    narrate(verbosity, "Obtaining", "master manifest...");
    let master = repo.fetch_master(remote, Some(&local))?;

    let reconciliation = Reconciliation::new(&current, &local, &master);
    for (path, state) in reconciliation.states() {
        log::debug!("{path}: {}", state.as_str());
    }
    let plan = reconciliation.plan_push();

    print_paths(
        "Unable to push the following files (conflict with master):",
        &plan.conflicts,
        Color::Red,
    );

    let request = (!plan.transfer.is_empty()).then(|| {
        let mut includes = plan.transfer.clone();
        includes.insert(MANIFEST_KEY.to_string());
        MirrorRequest::only(Direction::Push, repo.root(), includes, true)
    });

    let mut outcome = SyncOutcome::new(Operation::Push, options.dry_run);
    outcome.resolved = plan.resolved.clone();
    outcome.conflicts = plan.conflicts.clone();

    if options.dry_run {
        print_dry_run(remote, request.as_ref(), &plan.resolved);
        outcome.transferred = plan.transfer;
        return Ok(outcome);
    }

    if let Some(request) = &request {
        let staged = StagedManifest::write(repo.paths.manifest_file(), &plan.manifest)?;
        log::debug!("Staged manifest at {}", staged.path().display());

        narrate(
            verbosity,
            "Transferring",
            &format!("{} file(s)...", plan.transfer.len()),
        );
        remote.mirror(request)?;
        drop(staged);
        repo.mark_pushed()?;
    }

    store.store(&plan.baseline)?;
    log::info!(
        "push finished: {} transferred, {} resolved, {} conflicts",
        plan.transfer.len(),
        plan.resolved.len(),
        plan.conflicts.len()
    );

    outcome.transferred = plan.transfer;
    print_summary(&outcome, verbosity);
    report::record(&repo.paths, &outcome);

    Ok(outcome)
}
