//! `dat overwrite-master` handler

use anyhow::{bail, Context, Result};
use colored::Colorize;
use inquire::Confirm;

use crate::remote::Remote;
use crate::sync::{self, Repository};
use crate::VerbosityLevel;

/// Check if we're running in an interactive terminal
pub fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout)
}

/// Handle overwrite-master command
///
/// Asks for confirmation unless `yes`; without a terminal to ask on, `yes`
/// is required.
pub fn handle_overwrite_master(
    repo: &mut Repository,
    remote: &dyn Remote,
    yes: bool,
    verbosity: VerbosityLevel,
) -> Result<()> {
    if !yes {
        if !is_interactive() {
            bail!("Refusing to overwrite the remote without confirmation; pass --yes");
        }

        println!(
            "{}",
            format!(
                "Warning: this will completely replace {} with your working tree.",
                remote.describe()
            )
            .yellow()
            .bold()
        );

        let confirm = Confirm::new("Are you sure you want to overwrite the remote?")
            .with_default(false)
            .with_help_message("Remote changes that were never pulled will be lost")
            .prompt()
            .context("Failed to get confirmation")?;

        if !confirm {
            println!("\n{}", "Overwrite cancelled.".yellow());
            return Ok(());
        }
    }

    sync::overwrite_master(repo, remote, verbosity)?;
    Ok(())
}
