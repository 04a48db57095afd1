//! Commands that move data between the working tree and the remote.
//!
//! Every command follows the same shape: take inventories, let
//! [`Reconciliation`](crate::reconcile::Reconciliation) decide, print what is
//! refused, mirror what is allowed, and only then persist the new baseline.

mod init;
mod overwrite;
mod pull;
mod push;
mod repair;
mod single;
mod stash;
mod state;
mod status;

pub use init::init_repository;
pub use overwrite::overwrite_master;
pub use pull::pull;
pub use push::push;
pub use repair::repair_master;
pub use single::{checkin, checkout, resolve_key};
pub use stash::{stash, stash_pop, StashOutcome};
pub use state::{RepoConfig, Repository};
pub use status::{print_status, status, StatusView};

use colored::{Color, Colorize};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::reconcile::PathSet;
use crate::remote::{MirrorRequest, Remote};
use crate::VerbosityLevel;

/// Flags shared by every transfer command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Print what would happen and change nothing
    pub dry_run: bool,
    pub verbosity: VerbosityLevel,
}

/// Commands that produce a [`SyncOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Pull,
    Push,
    Checkout,
    Checkin,
    OverwriteMaster,
    RepairMaster,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Pull => "pull",
            Operation::Push => "push",
            Operation::Checkout => "checkout",
            Operation::Checkin => "checkin",
            Operation::OverwriteMaster => "overwrite-master",
            Operation::RepairMaster => "repair-master",
        };
        f.write_str(name)
    }
}

/// Result of a transfer command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub operation: Operation,
    pub dry_run: bool,
    /// Nothing needed to move; no remote call was made for the transfer
    pub up_to_date: bool,
    pub transferred: PathSet,
    pub resolved: PathSet,
    pub conflicts: PathSet,
}

impl SyncOutcome {
    fn new(operation: Operation, dry_run: bool) -> Self {
        SyncOutcome {
            operation,
            dry_run,
            up_to_date: false,
            transferred: PathSet::new(),
            resolved: PathSet::new(),
            conflicts: PathSet::new(),
        }
    }

    fn up_to_date(operation: Operation) -> Self {
        SyncOutcome {
            up_to_date: true,
            ..SyncOutcome::new(operation, false)
        }
    }
}

fn narrate(verbosity: VerbosityLevel, verb: &str, rest: &str) {
    if verbosity != VerbosityLevel::Quiet {
        println!("  {} {}", verb.cyan(), rest);
    }
}

/// Print a titled, indented path list; empty lists print nothing.
pub(crate) fn print_paths(title: &str, paths: &PathSet, color: Color) {
    if paths.is_empty() {
        return;
    }
    println!("{}", title.color(color).bold());
    for path in paths {
        println!("    {path}");
    }
}

fn print_dry_run(remote: &dyn Remote, request: Option<&MirrorRequest>, resolved: &PathSet) {
    println!("{}", "Dry run; nothing will be changed.".yellow());
    match request {
        Some(request) => println!("  {}", remote.preview(request)),
        None => println!("  --no transfer needed--"),
    }
    print_paths(
        "Resolved without transfer:",
        resolved,
        Color::Green,
    );
}

fn print_up_to_date(verbosity: VerbosityLevel) {
    if verbosity == VerbosityLevel::Quiet {
        println!("Everything up-to-date");
    } else {
        println!("  {} Everything up-to-date", "✓".green());
    }
}

fn print_summary(outcome: &SyncOutcome, verbosity: VerbosityLevel) {
    if verbosity == VerbosityLevel::Quiet {
        println!(
            "{} complete: {} transferred, {} resolved, {} conflicts",
            outcome.operation,
            outcome.transferred.len(),
            outcome.resolved.len(),
            outcome.conflicts.len()
        );
        return;
    }

    let title = format!("=== {} Summary ===", capitalize(&outcome.operation.to_string()));
    println!("\n{}", title.bold().cyan());
    println!(
        "  {} transferred, {} resolved, {} conflicts",
        outcome.transferred.len().to_string().green(),
        outcome.resolved.len().to_string().green(),
        if outcome.conflicts.is_empty() {
            "0".normal()
        } else {
            outcome.conflicts.len().to_string().red()
        }
    );
    if verbosity == VerbosityLevel::Verbose {
        print_paths("Transferred:", &outcome.transferred, Color::Cyan);
        print_paths("Resolved:", &outcome.resolved, Color::Green);
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
