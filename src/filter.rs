use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Component, Path};

/// Directory holding the repository's own bookkeeping files.
pub const DAT_DIR: &str = ".dat";

/// OS metadata files that are never tracked, wherever they appear.
const IGNORED_FILE_NAMES: &[&str] = &[".DS_Store"];

/// Decides which files under the repository root are tracked.
///
/// Two layers apply: fixed reserved entries (the `.dat` directory, anything
/// at the top level starting with `.git`, `.DS_Store` files) and the user's
/// exclude globs from the repository config, matched against inventory keys.
#[derive(Debug, Clone)]
pub struct PathFilter {
    excludes: GlobSet,
    patterns: Vec<String>,
}

impl Default for PathFilter {
    fn default() -> Self {
        PathFilter {
            excludes: GlobSet::empty(),
            patterns: Vec::new(),
        }
    }
}

impl PathFilter {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern)
                .with_context(|| format!("Invalid exclude pattern: {pattern}"))?;
            builder.add(glob);
        }

        Ok(PathFilter {
            excludes: builder.build().context("Failed to compile exclude patterns")?,
            patterns: patterns.to_vec(),
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Check whether a path relative to the root is reserved bookkeeping.
    pub fn is_reserved(&self, relative: &Path) -> bool {
        let mut components = relative.components().filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        });

        if let Some(first) = components.next() {
            if first == DAT_DIR || first.starts_with(".git") {
                return true;
            }
        }

        relative
            .file_name()
            .and_then(|n| n.to_str())
            .map(|name| IGNORED_FILE_NAMES.contains(&name))
            .unwrap_or(false)
    }

    /// Check an inventory key against the user's exclude globs.
    pub fn is_excluded(&self, key: &str) -> bool {
        self.excludes.is_match(key)
    }

    /// Check whether an inventory key should be tracked at all.
    pub fn should_include(&self, key: &str) -> bool {
        !self.is_reserved(Path::new(key)) && !self.is_excluded(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(".dat/local", true)]
    #[case(".dat", true)]
    #[case(".git/config", true)]
    #[case(".gitignore", true)]
    #[case(".github/workflows/ci.yml", true)]
    #[case("photos/.DS_Store", true)]
    #[case("docs/.git-notes", false)]
    #[case(".data/table.csv", false)]
    #[case("report.pdf", false)]
    fn test_reserved_entries(#[case] path: &str, #[case] reserved: bool) {
        let filter = PathFilter::default();
        assert_eq!(filter.is_reserved(Path::new(path)), reserved, "{path}");
    }

    #[test]
    fn test_exclude_globs() {
        let filter =
            PathFilter::new(&["*.log".to_string(), "cache/**".to_string()]).unwrap();

        assert!(filter.is_excluded("server.log"));
        assert!(filter.is_excluded("nested/server.log"));
        assert!(filter.is_excluded("cache/a/b.bin"));
        assert!(!filter.is_excluded("src/cache.rs"));
        assert!(filter.should_include("README.md"));
        assert!(!filter.should_include(".dat/master"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let result = PathFilter::new(&["[unclosed".to_string()]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid exclude pattern"));
    }
}
