//! Wallet list loading.
//!
//! Format, one wallet per line:
//!
//! ```text
//! # comment
//! node-a,0xAbC...      labelled
//! 0xdef...             auto-labelled {prefix}_{n}
//! ```

use std::io::ErrorKind;
use std::path::Path;
use tracing::{info, warn};

use crate::types::WalletEntry;

/// Load the wallet list. A missing or unreadable file yields an empty list.
pub fn load_wallets(path: &Path, label_prefix: &str) -> Vec<WalletEntry> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let wallets = parse_wallets(&contents, label_prefix);
            info!(path = %path.display(), count = wallets.len(), "Wallet list loaded");
            wallets
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "Wallet file not found");
            Vec::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read wallet file");
            Vec::new()
        }
    }
}

/// Parse wallet list text.
///
/// Bare addresses are numbered from 1 in file order. A label seen twice
/// keeps its first position but takes the later address.
pub fn parse_wallets(contents: &str, label_prefix: &str) -> Vec<WalletEntry> {
    let mut wallets: Vec<WalletEntry> = Vec::new();
    let mut auto_index = 1;

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (label, address) = match line.split_once(',') {
            Some((label, address)) => (label.trim().to_string(), address.trim()),
            None => {
                let label = format!("{label_prefix}_{auto_index}");
                auto_index += 1;
                (label, line)
            }
        };

        if address.is_empty() {
            warn!(label = %label, "Wallet line has no address, skipping");
            continue;
        }

        let entry = WalletEntry::new(label, address);
        match wallets.iter_mut().find(|w| w.label == entry.label) {
            Some(existing) => existing.address = entry.address,
            None => wallets.push(entry),
        }
    }

    wallets
}
