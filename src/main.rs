use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use dat::handlers::{self, ConfigEdits};
use dat::sync::{self, Repository, SyncOptions};
use dat::{logger, report, VerbosityLevel};

#[derive(Parser)]
#[command(name = "dat")]
#[command(about = "Keep a data directory in sync with S3 or a shared folder", long_about = None)]
#[command(version)]
struct Cli {
    /// Print per-file details and debug logs
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Print results only
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Make the current directory a dat repository
    Init {
        /// s3://bucket/prefix, bucket/prefix, or a directory path
        remote: String,

        /// AWS CLI profile to use
        #[arg(long)]
        profile: Option<String>,

        /// AWS region (default: us-east-1)
        #[arg(long)]
        region: Option<String>,
    },

    /// Send local changes to the remote
    Push {
        /// Show what would be transferred without changing anything
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Bring remote changes into the working tree
    Pull {
        /// Show what would be transferred without changing anything
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Show what changed since the last sync
    Status {
        /// Also compare against the remote manifest
        #[arg(short, long)]
        remote: bool,
    },

    /// Fetch a single file from the remote
    Checkout {
        file: PathBuf,
    },

    /// Publish a single file, overriding the remote copy
    Checkin {
        file: PathBuf,
    },

    /// Move files that block a pull into .dat/stash
    Stash {
        #[command(subcommand)]
        action: Option<StashAction>,
    },

    /// Replace the remote with the working tree
    OverwriteMaster {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Rebuild the remote manifest from the files the remote holds
    RepairMaster,

    /// Show or change repository settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Change the remote location
        #[arg(long)]
        remote: Option<String>,

        /// AWS CLI profile (empty to unset)
        #[arg(long)]
        profile: Option<String>,

        /// AWS region
        #[arg(long)]
        region: Option<String>,

        /// Add an exclude glob (repeatable)
        #[arg(long)]
        add_exclude: Vec<String>,

        /// Remove an exclude glob (repeatable)
        #[arg(long)]
        remove_exclude: Vec<String>,
    },

    /// View the report of the last sync
    Report {
        /// Output format: json, markdown or summary
        #[arg(short, long, default_value = "summary")]
        format: String,

        /// Output file (default: print to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum StashAction {
    /// Move stashed files back into the working tree
    Pop {
        /// Overwrite files that exist at the destination
        #[arg(long)]
        hard: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbosity = if cli.quiet {
        VerbosityLevel::Quiet
    } else if cli.verbose {
        VerbosityLevel::Verbose
    } else {
        VerbosityLevel::Normal
    };

    if let Err(e) = logger::init_logger(cli.verbose) {
        eprintln!("Warning: logging unavailable: {e:#}");
    }

    let cwd = std::env::current_dir()
        .and_then(|dir| dir.canonicalize())
        .context("Failed to determine the working directory")?;

    let result = run(cli.command, &cwd, verbosity);
    let summary = match &result {
        Ok(()) => "command succeeded".to_string(),
        Err(e) => format!("command failed: {e:#}"),
    };
    if let Err(e) = logger::log_to_file(&summary) {
        log::debug!("Failed to write log file: {e:#}");
    }

    result
}

fn run(command: Commands, cwd: &Path, verbosity: VerbosityLevel) -> Result<()> {
    if let Commands::Init {
        remote,
        profile,
        region,
    } = command
    {
        sync::init_repository(cwd, &remote, profile, region)?;
        return Ok(());
    }

    let mut repo = Repository::discover(cwd)?;
    log::debug!("Repository at {}", repo.root().display());

    match command {
        Commands::Init { .. } => {}
        Commands::Push { dry_run } => {
            let remote = repo.remote()?;
            let options = SyncOptions { dry_run, verbosity };
            sync::push(&mut repo, remote.as_ref(), &options)?;
        }
        Commands::Pull { dry_run } => {
            let remote = repo.remote()?;
            let options = SyncOptions { dry_run, verbosity };
            sync::pull(&mut repo, remote.as_ref(), &options)?;
        }
        Commands::Status { remote } => {
            let remote = if remote { Some(repo.remote()?) } else { None };
            let view = sync::status(&repo, remote.as_deref())?;
            sync::print_status(&view, repo.config.pushed);
        }
        Commands::Checkout { file } => {
            let key = sync::resolve_key(&repo, cwd, &file)?;
            let remote = repo.remote()?;
            sync::checkout(&repo, remote.as_ref(), &key, verbosity)?;
        }
        Commands::Checkin { file } => {
            let key = sync::resolve_key(&repo, cwd, &file)?;
            let remote = repo.remote()?;
            sync::checkin(&mut repo, remote.as_ref(), &key, verbosity)?;
        }
        Commands::Stash { action } => match action {
            None => {
                let remote = repo.remote()?;
                sync::stash(&repo, remote.as_ref(), verbosity)?;
            }
            Some(StashAction::Pop { hard }) => {
                sync::stash_pop(&repo, hard)?;
            }
        },
        Commands::OverwriteMaster { yes } => {
            let remote = repo.remote()?;
            handlers::handle_overwrite_master(&mut repo, remote.as_ref(), yes, verbosity)?;
        }
        Commands::RepairMaster => {
            let remote = repo.remote()?;
            sync::repair_master(&mut repo, remote.as_ref(), verbosity)?;
        }
        Commands::Config {
            show,
            remote,
            profile,
            region,
            add_exclude,
            remove_exclude,
        } => {
            let edits = ConfigEdits {
                remote,
                profile,
                region,
                add_exclude,
                remove_exclude,
            };
            handlers::handle_config(&repo, show, edits)?;
        }
        Commands::Report { format, output } => {
            report::generate_report(&repo.paths, &format, output.as_deref())?;
        }
    }

    Ok(())
}
