use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::RepoPaths;
use crate::error::SyncError;
use crate::filter::PathFilter;
use crate::inventory::{self, BaselineStore, Inventory};
use crate::remote::{self, ManifestSource, Remote, RemoteOptions};

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Per-repository configuration stored in `.dat/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    /// `s3://bucket/prefix`, `bucket/prefix`, or a directory path
    pub remote: String,

    /// AWS CLI profile passed as `--profile`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// AWS region passed as `--region`
    #[serde(default = "default_region")]
    pub region: String,

    /// Whether the remote has ever received a manifest from this tree
    ///
    /// Until it has, a missing remote manifest is expected and the baseline
    /// stands in for it.
    #[serde(default)]
    pub pushed: bool,

    /// Glob patterns of files never to track
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl RepoConfig {
    pub fn new(remote: impl Into<String>) -> Self {
        RepoConfig {
            remote: remote.into(),
            profile: None,
            region: default_region(),
            pushed: false,
            exclude: Vec::new(),
        }
    }

    pub fn load(paths: &RepoPaths) -> Result<Self> {
        let config_path = paths.config_file();

        if !config_path.exists() {
            return Err(anyhow!(
                "Not a dat repository; {} does not exist. Run 'dat init' first.",
                config_path.display()
            ));
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
    }

    pub fn save(&self, paths: &RepoPaths) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        inventory::write_atomic(&paths.config_file(), content.as_bytes())
    }
}

/// An opened repository: its root, config and tracking rules.
#[derive(Debug, Clone)]
pub struct Repository {
    pub paths: RepoPaths,
    pub config: RepoConfig,
    filter: PathFilter,
}

impl Repository {
    pub fn open(root: &Path) -> Result<Self> {
        let paths = RepoPaths::new(root);
        let config = RepoConfig::load(&paths)?;
        Self::from_parts(paths, config)
    }

    /// Open the repository enclosing `start`.
    pub fn discover(start: &Path) -> Result<Self> {
        let paths = RepoPaths::discover(start)?;
        let config = RepoConfig::load(&paths)?;
        Self::from_parts(paths, config)
    }

    pub fn from_parts(paths: RepoPaths, config: RepoConfig) -> Result<Self> {
        let filter = PathFilter::new(&config.exclude)?;
        Ok(Repository {
            paths,
            config,
            filter,
        })
    }

    pub fn root(&self) -> &Path {
        self.paths.root()
    }

    pub fn filter(&self) -> &PathFilter {
        &self.filter
    }

    /// Walk and hash the working tree.
    pub fn take_inventory(&self) -> Result<Inventory> {
        inventory::take_inventory(self.root(), &self.filter)
    }

    pub fn baseline(&self) -> BaselineStore {
        BaselineStore::new(self.paths.baseline_file())
    }

    /// Open the configured remote backend.
    pub fn remote(&self) -> Result<Box<dyn Remote>> {
        remote::open(RemoteOptions {
            location: &self.config.remote,
            profile: self.config.profile.as_deref(),
            region: Some(self.config.region.as_str()),
            filter: &self.filter,
            root: self.root(),
        })
    }

    /// Fetch the `master` inventory.
    ///
    /// When the remote has no manifest and this tree never pushed, `fallback`
    /// (normally the baseline) is used; without a fallback, or once the tree
    /// has pushed, a missing manifest is an error.
    pub fn fetch_master<S: ManifestSource + ?Sized>(
        &self,
        source: &S,
        fallback: Option<&Inventory>,
    ) -> Result<Inventory> {
        match source.fetch_manifest()? {
            Some(master) => {
                log::debug!("Remote manifest lists {} files", master.len());
                Ok(master)
            }
            None if !self.config.pushed => match fallback {
                Some(fallback) => {
                    log::info!("Remote has never been pushed; using the baseline as master");
                    Ok(fallback.clone())
                }
                None => Err(SyncError::RemoteUnavailable {
                    remote: self.config.remote.clone(),
                    message: "nothing has been pushed to the remote yet".to_string(),
                }
                .into()),
            },
            None => Err(SyncError::RemoteUnavailable {
                remote: self.config.remote.clone(),
                message: "the remote manifest (.dat/master) is missing".to_string(),
            }
            .into()),
        }
    }

    /// Record that the remote now carries a manifest.
    pub fn mark_pushed(&mut self) -> Result<()> {
        if !self.config.pushed {
            self.config.pushed = true;
            self.config.save(&self.paths)?;
        }
        Ok(())
    }
}
