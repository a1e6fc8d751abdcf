//! Log file discovery
//!
//! Non-recursive: `*_summary.log` in the log directory, falling back to
//! `*_console.log` when no summary logs exist. A missing directory simply
//! holds no logs.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};

pub const SUMMARY_SUFFIX: &str = "_summary.log";
pub const CONSOLE_SUFFIX: &str = "_console.log";

/// Find the KneadData logs to report on, in discovery order
pub fn discover_logs<P: AsRef<Path>>(log_dir: P) -> Result<Vec<PathBuf>> {
    let log_dir = log_dir.as_ref();
    if !log_dir.is_dir() {
        warn!("Log directory not found: {}", log_dir.display());
        return Ok(Vec::new());
    }
    let summaries = find_with_suffix(log_dir, SUMMARY_SUFFIX)?;
    if !summaries.is_empty() {
        return Ok(summaries);
    }
    debug!("No *{} files, falling back to *{}", SUMMARY_SUFFIX, CONSOLE_SUFFIX);
    find_with_suffix(log_dir, CONSOLE_SUFFIX)
}

fn find_with_suffix(log_dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let dir = log_dir
        .to_str()
        .with_context(|| format!("Log directory is not valid UTF-8: {}", log_dir.display()))?;
    let pattern = Path::new(&glob::Pattern::escape(dir)).join(format!("*{}", suffix));
    let pattern = pattern.to_string_lossy();

    let mut paths = Vec::new();
    for entry in glob::glob(&pattern).with_context(|| format!("Invalid glob pattern {}", pattern))? {
        paths.push(entry?);
    }
    debug!("{} matched {} file(s)", pattern, paths.len());
    Ok(paths)
}
