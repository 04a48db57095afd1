use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::Inventory;

/// Persistent home of the `local` baseline.
#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the baseline; a missing file means this tree has never synced.
    pub fn load(&self) -> Result<Inventory> {
        read_inventory_file(&self.path).map(Option::unwrap_or_default)
    }

    /// Replace the baseline atomically.
    pub fn store(&self, inventory: &Inventory) -> Result<()> {
        write_atomic(&self.path, inventory.to_manifest_string().as_bytes())?;
        log::debug!(
            "Baseline {} written ({} entries)",
            self.path.display(),
            inventory.len()
        );
        Ok(())
    }
}

/// Read an inventory file, returning `None` when it does not exist.
pub(crate) fn read_inventory_file(path: &Path) -> Result<Option<Inventory>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read inventory {}", path.display()))?;
    let inventory = Inventory::parse(&content, &path.display().to_string())?;
    Ok(Some(inventory))
}

/// Write-to-temp-then-rename so readers never observe a half-written file.
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(temp_name);

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .with_context(|| format!("Failed to create {}", temp_path.display()))?;
    file.write_all(content)
        .with_context(|| format!("Failed to write {}", temp_path.display()))?;
    file.sync_all()
        .with_context(|| format!("Failed to flush {}", temp_path.display()))?;
    drop(file);

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
    }

    Ok(())
}

/// A manifest written into the tree for the duration of a push.
///
/// The file is removed when the guard drops, whether or not the transfer
/// succeeded.
#[derive(Debug)]
pub struct StagedManifest {
    path: PathBuf,
}

impl StagedManifest {
    pub fn write(path: impl Into<PathBuf>, manifest: &Inventory) -> Result<Self> {
        let path = path.into();
        write_atomic(&path, manifest.to_manifest_string().as_bytes())?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedManifest {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to remove staged manifest {}: {}", self.path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::Digest;
    use tempfile::TempDir;

    #[test]
    fn test_missing_baseline_loads_empty() {
        let temp = TempDir::new().unwrap();
        let store = BaselineStore::new(temp.path().join(".dat").join("local"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_store_then_load() {
        let temp = TempDir::new().unwrap();
        let store = BaselineStore::new(temp.path().join(".dat").join("local"));

        let mut baseline = Inventory::new();
        baseline.insert("docs/a.txt", Digest::from("abc"));
        baseline.insert("b.txt", Digest::from("def"));
        store.store(&baseline).unwrap();

        assert_eq!(store.load().unwrap(), baseline);
        let raw = fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, "b.txt\tdef\ndocs/a.txt\tabc\n");
    }

    #[test]
    fn test_corrupt_baseline_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("local");
        fs::write(&path, "no separator here\n").unwrap();

        assert!(BaselineStore::new(&path).load().is_err());
    }

    #[test]
    fn test_staged_manifest_removed_on_drop() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".dat").join("master");

        {
            let mut manifest = Inventory::new();
            manifest.insert("x", Digest::from("1"));
            let staged = StagedManifest::write(&path, &manifest).unwrap();
            assert_eq!(fs::read_to_string(staged.path()).unwrap(), "x\t1\n");
        }

        assert!(!path.exists());
    }
}
