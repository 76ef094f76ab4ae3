//! Previous-scores snapshot: `label,address,score` per line.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::types::{parse_score, Address, WalletResult};

/// Load the snapshot written by the previous round.
///
/// A missing file is a first run; any other read failure is logged and
/// treated the same way.
pub fn load_previous_scores(path: &Path) -> HashMap<Address, Decimal> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_previous_scores(&contents),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "No previous scores found, first run starts from zero");
            HashMap::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read previous scores");
            HashMap::new()
        }
    }
}

pub fn parse_previous_scores(contents: &str) -> HashMap<Address, Decimal> {
    let mut prev = HashMap::new();
    for line in contents.lines() {
        let parts: Vec<&str> = line.trim().split(',').collect();
        if parts.len() < 3 {
            continue;
        }
        match parse_score(parts[2]) {
            Some(score) => {
                prev.insert(Address::new(parts[1]), score);
            }
            None => warn!(line = line.trim(), "Unparsable score in previous scores, skipping"),
        }
    }
    prev
}

/// Overwrite the snapshot with this round's scores, in wallet-list order.
pub fn save_current_scores(path: &Path, results: &[WalletResult]) -> Result<()> {
    let mut out = String::new();
    for r in results {
        let _ = writeln!(out, "{},{},{}", r.entry.label, r.entry.address, r.score);
    }
    std::fs::write(path, out)
        .with_context(|| format!("Failed to write current scores to {}", path.display()))?;
    debug!(path = %path.display(), wallets = results.len(), "Current scores saved");
    Ok(())
}
