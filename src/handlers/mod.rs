//! Command handler modules
//!
//! Handlers for the commands that need interaction or config editing beyond
//! what the sync functions do.

pub mod config;
pub mod overwrite;

pub use config::{handle_config, ConfigEdits};
pub use overwrite::{handle_overwrite_master, is_interactive};
