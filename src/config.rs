use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::error::SyncError;
use crate::filter::DAT_DIR;

/// Cross-platform user configuration directory manager
pub struct ConfigManager;

impl ConfigManager {
    /// Get the user-level configuration directory path following platform conventions:
    /// - Linux: $XDG_CONFIG_HOME/dat or ~/.config/dat
    /// - macOS: ~/Library/Application Support/dat
    /// - Windows: %APPDATA%\dat
    pub fn config_dir() -> Result<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
                Ok(PathBuf::from(xdg_config).join("dat"))
            } else {
                let home = dirs::home_dir().context("Failed to get home directory")?;
                Ok(home.join(".config").join("dat"))
            }
        }

        #[cfg(target_os = "macos")]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home.join("Library").join("Application Support").join("dat"))
        }

        #[cfg(target_os = "windows")]
        {
            Ok(dirs::config_dir()
                .context("Failed to get Windows config directory")?
                .join("dat"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home.join(".dat-global"))
        }
    }

    /// Get the log file path
    pub fn log_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("dat.log"))
    }

    /// Ensure the configuration directory exists
    pub fn ensure_config_dir() -> Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir).with_context(|| {
            format!("Failed to create config directory: {}", config_dir.display())
        })?;
        Ok(config_dir)
    }
}

/// Locations of a repository's bookkeeping files under `<root>/.dat/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPaths {
    root: PathBuf,
}

impl RepoPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Walk up from `start` to the first directory holding `.dat/config.toml`.
    pub fn discover(start: &Path) -> Result<Self> {
        let start = start
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", start.display()))?;

        for dir in start.ancestors() {
            let candidate = RepoPaths::new(dir);
            if candidate.config_file().is_file() {
                log::debug!("Repository root: {}", dir.display());
                return Ok(candidate);
            }
        }

        Err(SyncError::NotARepository { start }.into())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dat_dir(&self) -> PathBuf {
        self.root.join(DAT_DIR)
    }

    pub fn config_file(&self) -> PathBuf {
        self.dat_dir().join("config.toml")
    }

    /// The persisted `local` baseline.
    pub fn baseline_file(&self) -> PathBuf {
        self.dat_dir().join("local")
    }

    /// Where the manifest is staged before a push, and fetched to on a pull.
    pub fn manifest_file(&self) -> PathBuf {
        self.dat_dir().join("master")
    }

    pub fn stash_dir(&self) -> PathBuf {
        self.dat_dir().join("stash")
    }

    /// Where a remote is downloaded while its manifest is rebuilt.
    pub fn remote_scratch(&self) -> PathBuf {
        self.dat_dir().join("remote")
    }

    pub fn report_file(&self) -> PathBuf {
        self.dat_dir().join("last-report.json")
    }
}

/// The manifest's key relative to the root, as it appears on the remote.
pub const MANIFEST_KEY: &str = ".dat/master";

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_config_paths() {
        let config_dir = ConfigManager::config_dir().unwrap();
        assert!(config_dir.to_string_lossy().contains("dat"));

        let log = ConfigManager::log_file_path().unwrap();
        assert!(log.to_string_lossy().ends_with("dat.log"));
    }

    #[test]
    #[serial]
    #[cfg(target_os = "linux")]
    fn test_xdg_config_home_respected() {
        std::env::set_var("XDG_CONFIG_HOME", "/tmp/test-xdg-config");
        let config_dir = ConfigManager::config_dir().unwrap();
        std::env::remove_var("XDG_CONFIG_HOME");
        assert_eq!(config_dir, PathBuf::from("/tmp/test-xdg-config/dat"));
    }

    #[test]
    fn test_repo_paths_layout() {
        let paths = RepoPaths::new("/work/tree");
        assert_eq!(paths.baseline_file(), PathBuf::from("/work/tree/.dat/local"));
        assert_eq!(paths.manifest_file(), PathBuf::from("/work/tree/.dat/master"));
        assert_eq!(paths.config_file(), PathBuf::from("/work/tree/.dat/config.toml"));
        assert_eq!(paths.stash_dir(), PathBuf::from("/work/tree/.dat/stash"));
        assert_eq!(paths.remote_scratch(), PathBuf::from("/work/tree/.dat/remote"));
    }

    #[test]
    fn test_discover_walks_up() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        std::fs::create_dir_all(root.join(".dat")).unwrap();
        std::fs::write(root.join(".dat/config.toml"), "remote = \"s3://b\"\n").unwrap();
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = RepoPaths::discover(&nested).unwrap();
        assert_eq!(found.root(), root.as_path());
    }

    #[test]
    fn test_discover_outside_repository_fails() {
        let temp = TempDir::new().unwrap();
        let err = RepoPaths::discover(temp.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::NotARepository { .. })
        ));
    }
}
