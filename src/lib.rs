//! # dat
//!
//! A command-line tool for keeping a directory of data files in step with a
//! remote copy (an S3 prefix or a shared directory), without version history.
//!
//! ## Overview
//!
//! `dat` compares three inventories, each a map of relative path to content
//! digest:
//!
//! - **current**: the files on disk right now
//! - **local**: the baseline recorded at `.dat/local` after the last successful sync
//! - **master**: the manifest published on the remote at `.dat/master`
//!
//! Comparing `current` and `master` against `local` tells which side changed
//! each path. Changes on one side only are transferred; changes on both sides
//! are refused unless both sides already agree, in which case the path is
//! recorded without any transfer.
//!
//! ## Architecture
//!
//! - Inventories and their persistence ([`inventory`], [`filter`])
//! - Change classification and conflict resolution ([`reconcile`])
//! - Remote backends and the mirroring primitive ([`remote`])
//! - Commands built on top of them ([`sync`], [`handlers`], [`report`])
//! - Configuration, errors and logging ([`config`], [`error`], [`logger`])

/// Repository layout and the user-level configuration directory.
///
/// Locates the repository root by walking up to `.dat/config.toml`, and the
/// platform config directory (XDG on Linux, Application Support on macOS,
/// AppData on Windows) that holds the log file.
pub mod config;

/// Typed errors for conditions callers need to tell apart.
pub mod error;

/// Which files are tracked.
///
/// Skips the `.dat/` bookkeeping directory, top-level `.git*` entries,
/// `.DS_Store` files, and the user's exclude globs.
pub mod filter;

/// Handlers for `dat config` and `dat overwrite-master`.
pub mod handlers;

/// Inventory snapshots, the digest walker and the baseline store.
pub mod inventory;

/// Logging configuration and utilities.
///
/// Sets up dual logging to both console (configurable via `RUST_LOG` environment
/// variable) and a persistent log file in the config directory. Includes automatic
/// log rotation when files exceed size limits.
pub mod logger;

/// Change classification, conflict resolution and transfer planning.
///
/// Pure functions over three inventories; nothing here touches the
/// filesystem or the network.
pub mod reconcile;

/// Remote backends: S3 through the `aws` CLI, and plain directories.
pub mod remote;

/// Report of the last transfer in JSON, Markdown or console form.
pub mod report;

/// Push, pull, status and the single-file, stash and overwrite commands.
///
/// Each command takes inventories, asks [`reconcile`] for a plan, mirrors
/// what the plan allows and persists the new baseline only after the
/// transfer succeeds.
pub mod sync;

/// How much progress output commands print.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VerbosityLevel {
    Quiet, // Results only
    #[default]
    Normal, // Step narration
    Verbose, // Step narration plus per-file lists
}
