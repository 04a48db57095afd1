use anyhow::Result;
use colored::{Color, Colorize};

use super::print_paths;
use super::state::Repository;
use crate::reconcile::{ChangeSets, PathSet, Reconciliation, StatusReport};
use crate::remote::Remote;

/// What `status` found. Computing it never modifies the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusView {
    /// Three-way comparison against the remote manifest.
    Remote(StatusReport),
    /// Working tree against the baseline only.
    Local {
        modified: PathSet,
        deleted: PathSet,
        baseline_empty: bool,
    },
}

/// Compare the working tree with the baseline, and with the remote manifest
/// when `remote` is given.
pub fn status(repo: &Repository, remote: Option<&dyn Remote>) -> Result<StatusView> {
    let current = repo.take_inventory()?;
    let local = repo.baseline().load()?;

    match remote {
        Some(remote) => {
            let master = repo.fetch_master(remote, Some(&local))?;
            Ok(StatusView::Remote(
                Reconciliation::new(&current, &local, &master).status(),
            ))
        }
        None => {
            let changes = ChangeSets::local_only(&current, &local);
            Ok(StatusView::Local {
                modified: changes.push,
                deleted: changes.purge,
                baseline_empty: local.is_empty(),
            })
        }
    }
}

/// Print a [`StatusView`]; `pushed` tells an empty baseline on a shared
/// repository apart from a fresh one.
pub fn print_status(view: &StatusView, pushed: bool) {
    if !pushed {
        println!("{}", "dat initialized, but never pushed".red());
    }

    match view {
        StatusView::Remote(report) => {
            print_paths("Conflicts:", &report.conflicts, Color::Red);
            print_paths("Modified remotely:", &report.modified_remotely, Color::Cyan);
            print_paths("Modified locally:", &report.modified_locally, Color::Yellow);
            print_paths("Deleted remotely:", &report.deleted_remotely, Color::Cyan);
            print_paths("Deleted locally:", &report.deleted_locally, Color::Yellow);
            print_paths(
                "Deleted remotely, modified locally:",
                &report.deleted_remotely_modified_locally,
                Color::Magenta,
            );
            print_paths("Identical on both sides:", &report.resolved, Color::Green);

            if report.is_current() && report.deleted_remotely_modified_locally.is_empty() {
                println!("{} Everything up-to-date", "✓".green());
            }
        }
        StatusView::Local {
            modified,
            deleted,
            baseline_empty,
        } => {
            print_paths("Modified locally:", modified, Color::Yellow);
            print_paths("Deleted locally:", deleted, Color::Yellow);

            if modified.is_empty() && deleted.is_empty() {
                if *baseline_empty && pushed {
                    println!("{}", "Local dat empty; never been pulled?".yellow());
                } else {
                    println!("{} Nothing to push; local is clean", "✓".green());
                }
            }
        }
    }
}
