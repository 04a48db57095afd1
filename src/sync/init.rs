use anyhow::{bail, Result};
use colored::Colorize;
use std::path::Path;

use super::state::{RepoConfig, Repository};
use crate::config::RepoPaths;
use crate::remote::RemoteLocation;

/// Turn `root` into a repository tracking `remote`.
///
/// Only writes `.dat/config.toml`; nothing is transferred until the first
/// push or pull.
pub fn init_repository(
    root: &Path,
    remote: &str,
    profile: Option<String>,
    region: Option<String>,
) -> Result<Repository> {
    let location = RemoteLocation::parse(remote)?;
    let paths = RepoPaths::new(root);

    if paths.config_file().exists() {
        bail!(
            "{} is already a dat repository ({} exists)",
            root.display(),
            paths.config_file().display()
        );
    }

    println!("{}", "Initializing dat repository...".cyan().bold());

    let mut config = RepoConfig::new(remote.trim());
    config.profile = profile;
    if let Some(region) = region {
        config.region = region;
    }
    config.save(&paths)?;
    log::info!("Initialized {} with remote {:?}", root.display(), location);

    println!("  {} {}", "Root:".bold(), root.display());
    println!("  {} {}", "Remote:".bold(), config.remote.cyan());

    if root.join(".git").exists() {
        println!(
            "  {} add '.dat/' to your .gitignore to keep sync state out of git",
            "Note:".yellow()
        );
    }

    println!("{} Run 'dat pull' or 'dat push' to sync", "✓".green());

    Repository::from_parts(paths, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_config() {
        let temp = TempDir::new().unwrap();
        let repo =
            init_repository(temp.path(), "s3://bucket/prefix", Some("work".into()), None).unwrap();

        assert_eq!(repo.config.profile.as_deref(), Some("work"));
        assert_eq!(repo.config.region, "us-east-1");
        assert!(temp.path().join(".dat/config.toml").is_file());
        assert!(!temp.path().join(".dat/local").exists());
    }

    #[test]
    fn test_init_refuses_existing_repository() {
        let temp = TempDir::new().unwrap();
        init_repository(temp.path(), "bucket", None, None).unwrap();
        assert!(init_repository(temp.path(), "other", None, None).is_err());
    }

    #[test]
    fn test_init_rejects_invalid_remote() {
        let temp = TempDir::new().unwrap();
        assert!(init_repository(temp.path(), "", None, None).is_err());
        assert!(!temp.path().join(".dat").exists());
    }
}
