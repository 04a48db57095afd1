//! S3 backend driven through the `aws` CLI.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::{Direction, ManifestSource, MirrorRequest, MirrorScope, Mirrorer, Remote};
use crate::config::MANIFEST_KEY;
use crate::error::SyncError;
use crate::filter::PathFilter;
use crate::inventory::{self, Inventory};

/// Substrings of `aws s3 cp` stderr meaning the manifest object is absent.
const MISSING_OBJECT_MARKERS: &[&str] = &["(404)", "Not Found", "NoSuchKey", "does not exist"];

/// Make an inventory key match only itself in an `--include` filter, which
/// the aws CLI reads as a glob.
fn literal_filter(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for ch in key.chars() {
        match ch {
            '*' | '?' | '[' => {
                escaped.push('[');
                escaped.push(ch);
                escaped.push(']');
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// S3 remote using `aws s3 sync` for transfers and `aws s3 cp` for the manifest.
pub struct AwsCli {
    url: String,
    profile: Option<String>,
    region: Option<String>,
    filter: PathFilter,
    manifest_download: PathBuf,
}

impl AwsCli {
    pub fn new(
        bucket: String,
        prefix: Option<String>,
        profile: Option<String>,
        region: Option<String>,
        filter: PathFilter,
        root: &Path,
    ) -> Self {
        let url = match prefix {
            Some(prefix) => format!("s3://{bucket}/{prefix}"),
            None => format!("s3://{bucket}"),
        };

        AwsCli {
            url,
            profile,
            region,
            filter,
            manifest_download: root.join(MANIFEST_KEY),
        }
    }

    fn common_args(&self, args: &mut Vec<String>) {
        if let Some(profile) = &self.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        if let Some(region) = &self.region {
            args.push("--region".to_string());
            args.push(region.clone());
        }
    }

    /// Arguments for `aws` implementing `request`.
    pub fn sync_args(&self, request: &MirrorRequest) -> Vec<String> {
        let root = request.root.to_string_lossy().to_string();
        let mut args = vec!["s3".to_string(), "sync".to_string()];

        match request.direction {
            Direction::Push => {
                args.push("--no-follow-symlinks".to_string());
                args.push(root);
                args.push(self.url.clone());
            }
            Direction::Pull => {
                args.push(self.url.clone());
                args.push(root);
            }
        }

        if request.delete {
            args.push("--delete".to_string());
        }

        // Later filters take precedence in the aws CLI.
        match &request.scope {
            MirrorScope::Only(paths) => {
                args.push("--exclude".to_string());
                args.push("*".to_string());
                for path in paths {
                    args.push("--include".to_string());
                    args.push(literal_filter(path));
                }
            }
            MirrorScope::Everything => {
                for pattern in [".dat/*", ".git*", "*.DS_Store"]
                    .into_iter()
                    .map(str::to_string)
                    .chain(self.filter.patterns().iter().cloned())
                {
                    args.push("--exclude".to_string());
                    args.push(pattern);
                }
                args.push("--include".to_string());
                args.push(MANIFEST_KEY.to_string());
            }
        }

        self.common_args(&mut args);
        args
    }

    fn manifest_url(&self) -> String {
        format!("{}/{}", self.url, MANIFEST_KEY)
    }
}

impl Mirrorer for AwsCli {
    fn mirror(&self, request: &MirrorRequest) -> Result<()> {
        let args = self.sync_args(request);
        log::info!("Running aws {}", args.join(" "));

        let output = Command::new("aws")
            .args(&args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| SyncError::transfer(request.direction, format!("failed to run 'aws': {e}")))?;

        if !output.status.success() {
            return Err(SyncError::transfer(
                request.direction,
                format!(
                    "aws s3 sync exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            )
            .into());
        }

        Ok(())
    }
}

impl ManifestSource for AwsCli {
    fn fetch_manifest(&self) -> Result<Option<Inventory>> {
        if let Some(parent) = self.manifest_download.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut args = vec![
            "s3".to_string(),
            "cp".to_string(),
            self.manifest_url(),
            self.manifest_download.to_string_lossy().to_string(),
        ];
        self.common_args(&mut args);
        log::debug!("Fetching manifest: aws {}", args.join(" "));

        let output = Command::new("aws")
            .args(&args)
            .output()
            .map_err(|e| SyncError::RemoteUnavailable {
                remote: self.url.clone(),
                message: format!("failed to run 'aws': {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if MISSING_OBJECT_MARKERS.iter().any(|m| stderr.contains(m)) {
                log::info!("No manifest published at {}", self.manifest_url());
                return Ok(None);
            }
            return Err(SyncError::RemoteUnavailable {
                remote: self.url.clone(),
                message: format!("{} (are you logged in?)", stderr.trim()),
            }
            .into());
        }

        let content = fs::read_to_string(&self.manifest_download);
        let _ = fs::remove_file(&self.manifest_download);
        let content = content.with_context(|| {
            format!("Failed to read downloaded manifest {}", self.manifest_download.display())
        })?;

        Ok(Some(Inventory::parse(&content, &self.manifest_url())?))
    }

    fn inventory_contents(&self, scratch: &Path) -> Result<Inventory> {
        let mut args = vec![
            "s3".to_string(),
            "cp".to_string(),
            self.url.clone(),
            scratch.to_string_lossy().to_string(),
            "--recursive".to_string(),
        ];
        self.common_args(&mut args);
        log::info!("Downloading remote: aws {}", args.join(" "));

        let download = Command::new("aws")
            .args(&args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .output();

        let result = match download {
            Err(e) => Err(SyncError::RemoteUnavailable {
                remote: self.url.clone(),
                message: format!("failed to run 'aws': {e}"),
            }
            .into()),
            Ok(output) if !output.status.success() => Err(SyncError::RemoteUnavailable {
                remote: self.url.clone(),
                message: format!(
                    "{} (are you logged in?)",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            }
            .into()),
            // an empty prefix downloads nothing and leaves no directory
            Ok(_) if !scratch.exists() => Ok(Inventory::new()),
            Ok(_) => inventory::take_inventory(scratch, &self.filter),
        };

        if scratch.exists() {
            if let Err(e) = fs::remove_dir_all(scratch) {
                log::warn!("Failed to remove {}: {}", scratch.display(), e);
            }
        }
        result
    }
}

impl Remote for AwsCli {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn preview(&self, request: &MirrorRequest) -> String {
        let quoted: Vec<String> = self
            .sync_args(request)
            .into_iter()
            .map(|arg| {
                if arg.contains(['*', '?', '[', ' ', '"']) {
                    format!("\"{}\"", arg.replace('"', "\\\""))
                } else {
                    arg
                }
            })
            .collect();
        format!("aws {}", quoted.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::PathSet;

    fn remote() -> AwsCli {
        AwsCli::new(
            "bucket".to_string(),
            Some("team/data".to_string()),
            Some("personal".to_string()),
            Some("us-east-1".to_string()),
            PathFilter::new(&["*.tmp".to_string()]).unwrap(),
            Path::new("/work"),
        )
    }

    fn paths(items: &[&str]) -> PathSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_push_args_include_only() {
        let request = MirrorRequest::only(
            Direction::Push,
            Path::new("/work"),
            paths(&["a.txt", ".dat/master"]),
            true,
        );
        let args = remote().sync_args(&request);

        assert_eq!(
            args,
            vec![
                "s3", "sync", "--no-follow-symlinks", "/work", "s3://bucket/team/data", "--delete",
                "--exclude", "*", "--include", ".dat/master", "--include", "a.txt",
                "--profile", "personal", "--region", "us-east-1",
            ]
        );
    }

    #[test]
    fn test_pull_args_reverse_endpoints() {
        let request = MirrorRequest::only(Direction::Pull, Path::new("/work"), paths(&["b"]), true);
        let args = remote().sync_args(&request);

        assert_eq!(&args[..4], &["s3", "sync", "s3://bucket/team/data", "/work"]);
        assert!(!args.contains(&"--no-follow-symlinks".to_string()));
    }

    #[test]
    fn test_everything_scope_keeps_manifest() {
        let request = MirrorRequest {
            direction: Direction::Push,
            root: PathBuf::from("/work"),
            scope: MirrorScope::Everything,
            delete: true,
        };
        let args = remote().sync_args(&request);
        let joined = args.join(" ");

        assert!(joined.contains("--exclude .dat/* --exclude .git* --exclude *.DS_Store --exclude *.tmp --include .dat/master"));
    }

    #[test]
    fn test_include_filters_match_keys_literally() {
        let request = MirrorRequest::only(
            Direction::Push,
            Path::new("/work"),
            paths(&["data[1].csv", "what?.txt", "star*.log", "plain.txt"]),
            true,
        );
        let args = remote().sync_args(&request);
        let includes: Vec<&str> = args
            .windows(2)
            .filter(|pair| pair[0] == "--include")
            .map(|pair| pair[1].as_str())
            .collect();

        assert_eq!(
            includes,
            vec!["data[[]1].csv", "plain.txt", "star[*].log", "what[?].txt"]
        );
    }

    #[test]
    fn test_preview_quotes_globs() {
        let request = MirrorRequest::only(Direction::Pull, Path::new("/work"), paths(&["my file"]), false);
        let preview = remote().preview(&request);

        assert!(preview.starts_with("aws s3 sync s3://bucket/team/data /work"));
        assert!(preview.contains("--exclude \"*\" --include \"my file\""));
    }
}
