//! Poller: sequential per-wallet lookups with a fixed retry policy.
//!
//! Lookups never fail the round: once the attempts are spent the wallet
//! is recorded as a failed lookup (score 0, unknown rank).

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ApiConfig;
use crate::source::PointsSource;
use crate::types::{Address, LookupOutcome, WalletEntry, WalletResult};

/// Fixed-count, fixed-delay retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ApiConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: Duration::from_secs(config.retry_delay_secs),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ApiConfig::default())
    }
}

/// Look up one wallet, retrying on any error.
pub async fn fetch_with_retry(
    source: &dyn PointsSource,
    address: &Address,
    policy: &RetryPolicy,
) -> LookupOutcome {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match source.fetch_points(address).await {
            Ok(reading) => return LookupOutcome::Fetched(reading),
            Err(e) if attempt < attempts => {
                debug!(
                    source = source.name(),
                    address = %address,
                    attempt,
                    error = %e,
                    "Lookup failed, retrying"
                );
                attempt += 1;
                tokio::time::sleep(policy.delay).await;
            }
            Err(e) => {
                warn!(source = source.name(), address = %address, error = %e, "Lookup failed");
                return LookupOutcome::Failed {
                    reason: format!("{e:#}"),
                };
            }
        }
    }
}

/// Look up every wallet in list order and compare against `previous`.
pub async fn poll_wallets(
    source: &dyn PointsSource,
    wallets: &[WalletEntry],
    previous: &HashMap<Address, Decimal>,
    policy: &RetryPolicy,
) -> Vec<WalletResult> {
    let mut results = Vec::with_capacity(wallets.len());
    for entry in wallets {
        let outcome = fetch_with_retry(source, &entry.address, policy).await;
        let prev = previous.get(&entry.address).copied().unwrap_or(Decimal::ZERO);
        let result = WalletResult::new(entry.clone(), &outcome, prev);
        debug!(
            label = %result.entry.label,
            score = %result.score,
            increment = %result.increment,
            "Wallet polled"
        );
        results.push(result);
    }
    info!(
        wallets = results.len(),
        fetched = results.iter().filter(|r| r.fetched).count(),
        "Polling complete"
    );
    results
}
