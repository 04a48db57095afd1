use anyhow::{Context, Result};
use log::LevelFilter;
use std::fs::OpenOptions;
use std::io::Write;

use crate::config::ConfigManager;

/// Initialize the logging system
///
/// Sets up console logging plus an append-only log file in the user config
/// directory.
///
/// **Console logging** is controlled via the `RUST_LOG` environment variable
/// (`error`, `warn`, `info`, `debug`, `trace`, `off`); the default is `warn`
/// so that command output is not interleaved with log lines, and `-v` raises
/// it to `debug`.
///
/// **File logging** records each command invocation and its outcome at:
/// - Linux: ~/.config/dat/dat.log or $XDG_CONFIG_HOME/dat/dat.log
/// - macOS: ~/Library/Application Support/dat/dat.log
/// - Windows: %APPDATA%\dat\dat.log
///
/// ```bash
/// RUST_LOG=debug dat pull
/// ```
pub fn init_logger(verbose: bool) -> Result<()> {
    ConfigManager::ensure_config_dir()?;

    let fallback = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let default_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or(fallback);

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{:5}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(default_level)
        .target(env_logger::Target::Stderr)
        .try_init()
        .ok(); // already initialized in tests

    rotate_log_if_needed()?;
    log_to_file(&format!("Logger initialized with level: {default_level:?}"))?;

    Ok(())
}

/// Append a timestamped line to the log file
pub fn log_to_file(message: &str) -> Result<()> {
    let log_path = ConfigManager::log_file_path()?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

    writeln!(
        file,
        "[{}] {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        message
    )?;

    Ok(())
}

/// Rotate log file if it exceeds the size limit (10MB)
pub fn rotate_log_if_needed() -> Result<()> {
    const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

    let log_path = ConfigManager::log_file_path()?;

    if log_path.exists() {
        let metadata = std::fs::metadata(&log_path)?;

        if metadata.len() > MAX_LOG_SIZE {
            let old_log_path = log_path.with_extension("log.old");

            if old_log_path.exists() {
                std::fs::remove_file(&old_log_path)?;
            }

            std::fs::rename(&log_path, &old_log_path)?;

            log::info!("Log file rotated to {}", old_log_path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs::File;
    use tempfile::TempDir;

    struct XdgGuard(TempDir);

    impl XdgGuard {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            std::env::set_var("XDG_CONFIG_HOME", temp.path());
            XdgGuard(temp)
        }
    }

    impl Drop for XdgGuard {
        fn drop(&mut self) {
            std::env::remove_var("XDG_CONFIG_HOME");
        }
    }

    #[test]
    #[serial]
    #[cfg(target_os = "linux")]
    fn test_init_logger_succeeds() {
        let _guard = XdgGuard::new();
        assert!(init_logger(false).is_ok());
    }

    #[test]
    #[serial]
    #[cfg(target_os = "linux")]
    fn test_log_to_file() -> Result<()> {
        let _guard = XdgGuard::new();
        ConfigManager::ensure_config_dir()?;
        log_to_file("Test log message")?;

        let contents = std::fs::read_to_string(ConfigManager::log_file_path()?)?;
        assert!(contents.contains("Test log message"));

        Ok(())
    }

    #[test]
    #[serial]
    #[cfg(target_os = "linux")]
    fn test_rotate_log_creates_backup() -> Result<()> {
        let _guard = XdgGuard::new();
        ConfigManager::ensure_config_dir()?;
        let log_path = ConfigManager::log_file_path()?;
        let mut file = File::create(&log_path)?;
        file.write_all(&vec![b'a'; 11 * 1024 * 1024])?;
        drop(file);

        rotate_log_if_needed()?;

        assert!(log_path.with_extension("log.old").exists());
        assert!(!log_path.exists());

        Ok(())
    }
}
