//! Per-round result files and the append-only summary log.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Write `{dir}/{prefix}_{stamp}.txt` and return its path.
pub fn write_result_file(dir: &Path, prefix: &str, stamp: &str, contents: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create results dir {}", dir.display()))?;
    let path = dir.join(format!("{prefix}_{stamp}.txt"));
    std::fs::write(&path, contents)
        .with_context(|| format!("Failed to write result file {}", path.display()))?;
    info!(path = %path.display(), "Round results saved");
    Ok(path)
}

/// Append one summary block (plus newline) to the summary log.
pub fn append_summary(path: &Path, summary: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open summary log {}", path.display()))?;
    writeln!(file, "{summary}")
        .with_context(|| format!("Failed to append to summary log {}", path.display()))?;
    info!(path = %path.display(), "Summary appended");
    Ok(())
}
