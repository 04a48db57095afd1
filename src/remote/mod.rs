//! Remote collaborators: the manifest source and the mirroring primitive.
//!
//! Two backends exist: S3 through the `aws` CLI, and a plain directory
//! (a mounted share, or a scratch folder in tests).

mod aws;
mod directory;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub use aws::AwsCli;
pub use directory::DirectoryRemote;

use crate::error::SyncError;
use crate::filter::PathFilter;
use crate::inventory::Inventory;
use crate::reconcile::PathSet;

/// Direction of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Working tree to remote.
    Push,
    /// Remote to working tree.
    Pull,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Push => f.write_str("local -> remote"),
            Direction::Pull => f.write_str("remote -> local"),
        }
    }
}

/// Which files a mirror call may touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorScope {
    /// Only these inventory keys (everything else is excluded).
    Only(PathSet),
    /// The whole tracked tree plus the manifest.
    Everything,
}

/// One invocation of the mirroring primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorRequest {
    pub direction: Direction,
    pub root: PathBuf,
    pub scope: MirrorScope,
    /// Remove files in scope at the destination that the source lacks.
    pub delete: bool,
}

impl MirrorRequest {
    pub fn only(direction: Direction, root: &Path, paths: PathSet, delete: bool) -> Self {
        MirrorRequest {
            direction,
            root: root.to_path_buf(),
            scope: MirrorScope::Only(paths),
            delete,
        }
    }
}

/// Performs the byte transfer. Implementations must be idempotent: running
/// the same request twice leaves the destination as running it once.
pub trait Mirrorer {
    fn mirror(&self, request: &MirrorRequest) -> Result<()>;
}

/// Supplies the `master` inventory published on the remote.
pub trait ManifestSource {
    /// `Ok(None)` when the remote holds no manifest yet.
    fn fetch_manifest(&self) -> Result<Option<Inventory>>;

    /// Inventory of the files actually stored on the remote, ignoring the
    /// manifest. Backends that must download first use `scratch`, which does
    /// not exist on entry and is removed again before returning.
    fn inventory_contents(&self, scratch: &Path) -> Result<Inventory>;
}

/// A complete remote backend.
pub trait Remote: Mirrorer + ManifestSource {
    /// Human-readable location, for messages.
    fn describe(&self) -> String;

    /// What `mirror` would run for `request`, for dry runs.
    fn preview(&self, request: &MirrorRequest) -> String;
}

/// Parsed form of the `remote` config value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteLocation {
    S3 { bucket: String, prefix: Option<String> },
    Directory(PathBuf),
}

impl RemoteLocation {
    /// Accepts `s3://bucket[/prefix]`, bare `bucket[/prefix]`, and directory
    /// paths (absolute, `./`-relative, `~/`, or `file://`).
    pub fn parse(value: &str) -> Result<Self, SyncError> {
        let value = value.trim();
        let invalid = |message: &str| SyncError::InvalidRemote {
            remote: value.to_string(),
            message: message.to_string(),
        };

        if value.is_empty() {
            return Err(invalid("remote is empty"));
        }

        if let Some(dir) = value.strip_prefix("file://") {
            return Ok(RemoteLocation::Directory(PathBuf::from(dir)));
        }
        if let Some(rest) = value.strip_prefix("~/") {
            let home = dirs::home_dir().ok_or_else(|| invalid("cannot resolve home directory"))?;
            return Ok(RemoteLocation::Directory(home.join(rest)));
        }
        if value.starts_with('.') || Path::new(value).is_absolute() {
            return Ok(RemoteLocation::Directory(PathBuf::from(value)));
        }

        let id = value.strip_prefix("s3://").unwrap_or(value).trim_end_matches('/');
        let (bucket, prefix) = match id.split_once('/') {
            Some((bucket, prefix)) => (bucket, Some(prefix.trim_matches('/').to_string())),
            None => (id, None),
        };

        if bucket.is_empty() {
            return Err(invalid("missing bucket name"));
        }
        if bucket.contains(':') || bucket.chars().any(char::is_whitespace) {
            return Err(invalid("bucket names cannot contain ':' or whitespace"));
        }

        Ok(RemoteLocation::S3 {
            bucket: bucket.to_string(),
            prefix: prefix.filter(|p| !p.is_empty()),
        })
    }
}

/// Settings needed to open a remote backend.
#[derive(Debug, Clone)]
pub struct RemoteOptions<'a> {
    pub location: &'a str,
    pub profile: Option<&'a str>,
    pub region: Option<&'a str>,
    pub filter: &'a PathFilter,
    pub root: &'a Path,
}

/// Open the backend matching the configured location.
pub fn open(options: RemoteOptions<'_>) -> Result<Box<dyn Remote>> {
    match RemoteLocation::parse(options.location)? {
        RemoteLocation::S3 { bucket, prefix } => Ok(Box::new(AwsCli::new(
            bucket,
            prefix,
            options.profile.map(str::to_string),
            options.region.map(str::to_string),
            options.filter.clone(),
            options.root,
        ))),
        RemoteLocation::Directory(dir) => {
            let dir = if dir.is_relative() {
                options.root.join(dir)
            } else {
                dir
            };
            Ok(Box::new(DirectoryRemote::new(dir, options.filter.clone())))
        }
    }
}

/// Join an inventory key onto a directory.
pub(crate) fn key_to_path(base: &Path, key: &str) -> PathBuf {
    key.split('/').fold(base.to_path_buf(), |path, part| path.join(part))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("s3://my-bucket", "my-bucket", None)]
    #[case("s3://my-bucket/", "my-bucket", None)]
    #[case("s3://my-bucket/projects/a", "my-bucket", Some("projects/a"))]
    #[case("my-bucket/projects", "my-bucket", Some("projects"))]
    #[case("my-bucket", "my-bucket", None)]
    fn test_parse_s3(#[case] value: &str, #[case] bucket: &str, #[case] prefix: Option<&str>) {
        assert_eq!(
            RemoteLocation::parse(value).unwrap(),
            RemoteLocation::S3 {
                bucket: bucket.to_string(),
                prefix: prefix.map(str::to_string),
            }
        );
    }

    #[rstest]
    #[case("/srv/share/project")]
    #[case("./share")]
    #[case("../share")]
    #[case("file:///srv/share")]
    fn test_parse_directory(#[case] value: &str) {
        assert!(matches!(
            RemoteLocation::parse(value).unwrap(),
            RemoteLocation::Directory(_)
        ));
    }

    #[rstest]
    #[case("")]
    #[case("s3://")]
    #[case("aws:bucket")]
    fn test_parse_invalid(#[case] value: &str) {
        assert!(RemoteLocation::parse(value).is_err());
    }

    #[test]
    fn test_key_to_path() {
        let path = key_to_path(Path::new("/root"), "a/b/c.txt");
        assert_eq!(path, Path::new("/root").join("a").join("b").join("c.txt"));
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Push.to_string(), "local -> remote");
        assert_eq!(Direction::Pull.to_string(), "remote -> local");
    }
}
