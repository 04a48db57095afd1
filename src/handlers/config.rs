//! `dat config` handler
//!
//! Shows or edits `.dat/config.toml` for the enclosing repository.

use anyhow::{Context, Result};
use colored::Colorize;

use crate::filter::PathFilter;
use crate::remote::RemoteLocation;
use crate::sync::{RepoConfig, Repository};

/// Requested edits to the repository config. Empty means "show".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigEdits {
    pub remote: Option<String>,
    /// An empty string removes the profile
    pub profile: Option<String>,
    pub region: Option<String>,
    pub add_exclude: Vec<String>,
    pub remove_exclude: Vec<String>,
}

impl ConfigEdits {
    pub fn is_empty(&self) -> bool {
        self == &ConfigEdits::default()
    }
}

/// Handle `dat config`
pub fn handle_config(repo: &Repository, show: bool, edits: ConfigEdits) -> Result<()> {
    if edits.is_empty() || show {
        display_config(&repo.config);
        if edits.is_empty() {
            return Ok(());
        }
        println!();
    }

    let updated = apply_edits(&repo.config, edits)?;
    updated
        .save(&repo.paths)
        .context("Failed to save configuration")?;

    println!("{} Configuration saved", "✓".green());
    Ok(())
}

/// Apply `edits` to a copy of `config`, validating remotes and patterns.
pub fn apply_edits(config: &RepoConfig, edits: ConfigEdits) -> Result<RepoConfig> {
    let mut updated = config.clone();

    if let Some(remote) = edits.remote {
        RemoteLocation::parse(&remote)?;
        println!("  {} remote to {}", "Set".green(), remote.cyan());
        updated.remote = remote.trim().to_string();
    }

    if let Some(profile) = edits.profile {
        if profile.trim().is_empty() {
            println!("  {} profile", "Unset".green());
            updated.profile = None;
        } else {
            println!("  {} profile to {}", "Set".green(), profile.cyan());
            updated.profile = Some(profile);
        }
    }

    if let Some(region) = edits.region {
        println!("  {} region to {}", "Set".green(), region.cyan());
        updated.region = region;
    }

    for pattern in edits.add_exclude {
        if updated.exclude.contains(&pattern) {
            println!("  {} {} already excluded", "Note:".yellow(), pattern);
        } else {
            println!("  {} exclude pattern {}", "Added".green(), pattern.cyan());
            updated.exclude.push(pattern);
        }
    }

    for pattern in edits.remove_exclude {
        let before = updated.exclude.len();
        updated.exclude.retain(|p| p != &pattern);
        if updated.exclude.len() == before {
            println!("  {} {} was not excluded", "Note:".yellow(), pattern);
        } else {
            println!("  {} exclude pattern {}", "Removed".green(), pattern.cyan());
        }
    }

    PathFilter::new(&updated.exclude)?;
    Ok(updated)
}

fn display_config(config: &RepoConfig) {
    println!("{}", "Repository Configuration".cyan().bold());
    println!("  {}: {}", "Remote".bold(), config.remote);
    println!(
        "  {}: {}",
        "Profile".bold(),
        config.profile.as_deref().unwrap_or("(default)")
    );
    println!("  {}: {}", "Region".bold(), config.region);
    println!(
        "  {}: {}",
        "Pushed".bold(),
        if config.pushed { "yes".green() } else { "never".yellow() }
    );
    if config.exclude.is_empty() {
        println!("  {}: none", "Exclude".bold());
    } else {
        println!("  {}:", "Exclude".bold());
        for pattern in &config.exclude {
            println!("    {pattern}");
        }
    }
}
