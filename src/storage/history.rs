//! JSON history log: `{"records": [...]}`, one record per round.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, warn};

use crate::types::{HistoryLog, HistoryRecord};

/// Load the history log. Missing or malformed files read as empty.
pub fn load_history(path: &Path) -> HistoryLog {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(_) => return HistoryLog::default(),
    };
    match serde_json::from_str(&json) {
        Ok(log) => log,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "History file unreadable, starting a new log");
            HistoryLog::default()
        }
    }
}

/// Newest record, if any. A last entry that does not decode counts as none.
pub fn last_history_record(path: &Path) -> Option<HistoryRecord> {
    let last = load_history(path).records.pop()?;
    match serde_json::from_value(last) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Last history record unreadable");
            None
        }
    }
}

/// Append one record and rewrite the file. Returns the new record count.
///
/// Existing entries are carried over as-is, whatever their shape.
pub fn append_history_record(path: &Path, record: HistoryRecord) -> Result<usize> {
    let mut log = load_history(path);
    log.records
        .push(serde_json::to_value(&record).context("Failed to serialise history record")?);

    let json = serde_json::to_string_pretty(&log).context("Failed to serialise history")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write history to {}", path.display()))?;

    debug!(path = %path.display(), records = log.records.len(), "History record appended");
    Ok(log.records.len())
}
