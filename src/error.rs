//! Error types for sync operations.
//!
//! Most functions return `anyhow::Result`; the variants here mark the failures
//! callers need to tell apart (a failed transfer versus a corrupt manifest).

use std::path::PathBuf;

/// Errors that abort a sync run before or during the transfer step.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Not a dat repository (no .dat/config.toml found from {start})")]
    NotARepository { start: PathBuf },

    #[error("Malformed inventory {source_name} at line {line}: {message}")]
    MalformedInventory {
        source_name: String,
        line: usize,
        message: String,
    },

    #[error("Remote manifest unavailable for {remote}: {message}")]
    RemoteUnavailable { remote: String, message: String },

    #[error("Transfer {direction} failed: {message}")]
    Transfer { direction: String, message: String },

    #[error("Invalid remote '{remote}': {message}")]
    InvalidRemote { remote: String, message: String },
}

impl SyncError {
    pub fn malformed(source_name: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::MalformedInventory {
            source_name: source_name.into(),
            line,
            message: message.into(),
        }
    }

    pub fn transfer(direction: impl ToString, message: impl Into<String>) -> Self {
        Self::Transfer {
            direction: direction.to_string(),
            message: message.into(),
        }
    }
}
