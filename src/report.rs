use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::RepoPaths;
use crate::inventory;
use crate::reconcile::PathSet;
use crate::sync::{Operation, SyncOutcome};

/// Record of the last transfer command run in a repository
///
/// Saved as JSON at `.dat/last-report.json` after every push, pull, checkin,
/// checkout or overwrite-master that changed something, and shown by
/// `dat report`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// RFC 3339 time the command finished
    pub timestamp: String,

    pub operation: Operation,

    pub dry_run: bool,

    /// Paths handed to the mirror (or deleted by it)
    pub transferred: PathSet,

    /// Paths whose edits already agreed on both sides; recorded in the
    /// baseline without transfer
    pub resolved: PathSet,

    /// Paths refused because both sides changed them differently
    pub conflicts: PathSet,
}

impl SyncReport {
    pub fn from_outcome(outcome: &SyncOutcome) -> Self {
        SyncReport {
            timestamp: chrono::Utc::now().to_rfc3339(),
            operation: outcome.operation,
            dry_run: outcome.dry_run,
            transferred: outcome.transferred.clone(),
            resolved: outcome.resolved.clone(),
            conflicts: outcome.conflicts.clone(),
        }
    }

    /// Generate a markdown report
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# dat {} report\n\n", self.operation));
        output.push_str(&format!("**Generated:** {}\n", self.timestamp));
        if self.dry_run {
            output.push_str("**Dry run:** yes\n");
        }
        output.push_str(&format!(
            "**Transferred:** {} | **Resolved:** {} | **Conflicts:** {}\n\n",
            self.transferred.len(),
            self.resolved.len(),
            self.conflicts.len()
        ));

        for (title, paths) in [
            ("Conflicts", &self.conflicts),
            ("Transferred", &self.transferred),
            ("Resolved", &self.resolved),
        ] {
            if paths.is_empty() {
                continue;
            }
            output.push_str(&format!("## {title}\n\n"));
            for path in paths {
                output.push_str(&format!("- `{path}`\n"));
            }
            output.push('\n');
        }

        if self.conflicts.is_empty() {
            output.push_str("No conflicts detected.\n");
        }

        output
    }

    /// Generate a JSON report
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report to JSON")
    }

    /// Print a colored console summary
    pub fn print_summary(&self) {
        println!("\n{}", "=== Sync Report ===".bold().cyan());
        println!("{}: {}", "Operation".bold(), self.operation);
        println!("{}: {}", "Timestamp".bold(), self.timestamp);
        if self.dry_run {
            println!("{}: {}", "Dry run".bold(), "yes".yellow());
        }
        println!(
            "{}: {}",
            "Transferred".bold(),
            self.transferred.len().to_string().green()
        );
        println!("{}: {}", "Resolved".bold(), self.resolved.len().to_string().green());
        println!(
            "{}: {}",
            "Conflicts".bold(),
            self.conflicts.len().to_string().yellow()
        );

        if self.conflicts.is_empty() {
            println!("\n{}", "No conflicts detected!".green());
            return;
        }

        println!("\n{}", "Conflicts:".bold());
        for path in &self.conflicts {
            println!("  {}", path.yellow());
        }
        println!();
    }

    /// Save report to file
    pub fn save(&self, path: &Path, format: &str) -> Result<()> {
        let content = match format.to_lowercase().as_str() {
            "json" => self.to_json()?,
            "markdown" | "md" => self.to_markdown(),
            _ => return Err(anyhow!("Unsupported format: {format}")),
        };

        fs::write(path, content)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;

        println!(
            "{} {}",
            "Report saved to:".green().bold(),
            path.display().to_string().cyan()
        );

        Ok(())
    }
}

/// Show the last saved report, or write it to `output`.
pub fn generate_report(paths: &RepoPaths, format: &str, output: Option<&Path>) -> Result<()> {
    let Some(report) = load_latest_report(paths)? else {
        println!("{}", "No sync has been recorded in this repository yet.".yellow());
        return Ok(());
    };

    if let Some(output_path) = output {
        report.save(output_path, format)?;
    } else {
        match format.to_lowercase().as_str() {
            "json" => println!("{}", report.to_json()?),
            "markdown" | "md" => println!("{}", report.to_markdown()),
            "summary" => report.print_summary(),
            _ => return Err(anyhow!("Unsupported format: {format}")),
        }
    }

    Ok(())
}

/// Load `.dat/last-report.json`; `None` when no command has saved one.
pub fn load_latest_report(paths: &RepoPaths) -> Result<Option<SyncReport>> {
    let report_path = paths.report_file();

    if !report_path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&report_path)
        .with_context(|| format!("Failed to read report from {}", report_path.display()))?;

    let report: SyncReport =
        serde_json::from_str(&content).context("Failed to parse sync report")?;

    Ok(Some(report))
}

/// Save a report to `.dat/last-report.json`.
pub fn save_sync_report(paths: &RepoPaths, report: &SyncReport) -> Result<()> {
    let content = report.to_json()?;
    inventory::write_atomic(&paths.report_file(), content.as_bytes())
}

/// Save the report for a finished command. The command already succeeded,
/// so a failure here is only logged.
pub(crate) fn record(paths: &RepoPaths, outcome: &SyncOutcome) {
    if outcome.dry_run {
        return;
    }
    if let Err(e) = save_sync_report(paths, &SyncReport::from_outcome(outcome)) {
        log::warn!("Failed to save sync report: {:#}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn report() -> SyncReport {
        SyncReport {
            timestamp: "2025-01-01T00:00:00Z".to_string(),
            operation: Operation::Pull,
            dry_run: false,
            transferred: ["b".to_string(), "m".to_string()].into_iter().collect(),
            resolved: ["d".to_string()].into_iter().collect(),
            conflicts: ["c".to_string()].into_iter().collect(),
        }
    }

    #[test]
    fn test_markdown_generation() {
        let markdown = report().to_markdown();
        assert!(markdown.contains("# dat pull report"));
        assert!(markdown.contains("## Conflicts\n\n- `c`"));
        assert!(!markdown.contains("No conflicts detected"));
    }

    #[test]
    fn test_markdown_without_conflicts() {
        let mut report = report();
        report.conflicts.clear();
        assert!(report.to_markdown().contains("No conflicts detected"));
    }

    #[test]
    fn test_json_generation() {
        let json = report().to_json().unwrap();
        assert!(json.contains("\"operation\": \"pull\""));
        assert!(json.contains("\"transferred\""));
    }

    #[test]
    fn test_record_and_load() {
        let temp = TempDir::new().unwrap();
        let paths = RepoPaths::new(temp.path());
        assert!(load_latest_report(&paths).unwrap().is_none());

        save_sync_report(&paths, &report()).unwrap();
        let loaded = load_latest_report(&paths).unwrap().unwrap();
        assert_eq!(loaded, report());
    }

    #[test]
    fn test_save_rejects_unknown_format() {
        let temp = TempDir::new().unwrap();
        assert!(report().save(&temp.path().join("r.txt"), "yaml").is_err());
    }
}
