use anyhow::{anyhow, Context, Result};
use md5::{Digest as _, Md5};
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path};
use walkdir::WalkDir;

use super::{Digest, Inventory};
use crate::filter::PathFilter;

/// Hash a file's contents with MD5, streaming in 64KB chunks.
pub fn digest_file(path: &Path) -> Result<Digest> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Md5::new();
    let mut buffer = [0u8; 65536];

    loop {
        let read = file
            .read(&mut buffer)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(Digest::new(format!("{:x}", hasher.finalize())))
}

/// Characters the manifest format uses as separators.
const MANIFEST_SEPARATORS: &[char] = &['\t', '\n', '\r'];

/// Convert a path relative to the repository root into its inventory key.
///
/// Names the manifest cannot represent are rejected here, so a walk aborts
/// before anything is staged or transferred.
pub(crate) fn relative_key(relative: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| anyhow!("Unsupported non UTF-8 file name: {}", relative.display()))?;
                if part.contains(MANIFEST_SEPARATORS) {
                    return Err(anyhow!(
                        "Unsupported file name containing a tab or line break: {:?}",
                        relative
                    ));
                }
                parts.push(part);
            }
            Component::CurDir => {}
            _ => return Err(anyhow!("Path escapes the repository: {}", relative.display())),
        }
    }
    Ok(parts.join("/"))
}

/// Build the `current` inventory by walking `root` and hashing every tracked file.
///
/// Any unreadable entry aborts the walk; a partial inventory would make files
/// look deleted.
pub fn take_inventory(root: &Path, filter: &PathFilter) -> Result<Inventory> {
    let mut inventory = Inventory::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || entry
                    .path()
                    .strip_prefix(root)
                    .map(|rel| !filter.is_reserved(rel))
                    .unwrap_or(true)
        });

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;

        if entry.file_type().is_symlink() {
            log::debug!("Skipping symlink {}", entry.path().display());
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .with_context(|| format!("{} is outside {}", entry.path().display(), root.display()))?;
        let key = relative_key(relative)?;

        if filter.is_excluded(&key) {
            log::trace!("Excluded by pattern: {}", key);
            continue;
        }

        let digest = digest_file(entry.path())?;
        inventory.insert(key, digest);
    }

    log::debug!("Inventory of {} holds {} files", root.display(), inventory.len());
    Ok(inventory)
}
