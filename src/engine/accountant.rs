//! Accountant: aggregate statistics for one round.
//!
//! Reconciles the per-wallet results of a round into totals, growth
//! classification, hourly growth rates and threshold counts.

use chrono::NaiveDateTime;
use std::collections::HashSet;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use tracing::info;

use crate::config::ThresholdsConfig;
use crate::types::{HistoryRecord, WalletResult};

/// Timestamp format shared by history records and report headers.
pub const HUMAN_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Smallest elapsed time used as a rate denominator.
const MIN_ELAPSED_HOURS: f64 = 1e-6;

/// Total increments at or below this magnitude count as "no change".
const CHANGE_EPSILON: Decimal = dec!(0.001);

// ---------------------------------------------------------------------------
// Round statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RoundStats {
    pub wallet_count: usize,
    pub success_count: usize,
    pub fail_count: usize,
    pub growth_count: usize,
    pub no_growth_count: usize,
    pub total_score: Decimal,
    pub avg_score: Decimal,
    pub max_score: Decimal,
    pub min_score: Decimal,
    pub total_increment: Decimal,
    pub elapsed_hours: f64,
    pub hourly_growth: Decimal,
    pub hourly_growth_per_wallet: Decimal,
    /// Wallets scoring above the high-score threshold.
    pub high_score_count: usize,
    /// Wallets ranked within the top-percent threshold.
    pub top_rank_count: usize,
    pub high_and_top_count: usize,
}

impl RoundStats {
    pub fn compute(
        results: &[WalletResult],
        thresholds: &ThresholdsConfig,
        elapsed_hours: f64,
    ) -> Self {
        // Two labels on one address are one wallet for the statistics.
        let mut seen = HashSet::new();
        let wallets: Vec<&WalletResult> = results
            .iter()
            .filter(|r| seen.insert(&r.entry.address))
            .collect();

        let n = wallets.len();
        let divisor = Decimal::from(n.max(1));

        let total_score: Decimal = wallets.iter().map(|r| r.score).sum();
        let total_increment: Decimal = wallets.iter().map(|r| r.increment).sum();
        let max_score = wallets.iter().map(|r| r.score).max().unwrap_or(Decimal::ZERO);
        let min_score = wallets.iter().map(|r| r.score).min().unwrap_or(Decimal::ZERO);

        let success_count = wallets.iter().filter(|r| r.fetched).count();
        let growth_count = wallets.iter().filter(|r| r.has_growth()).count();

        let mut high_score_count = 0;
        let mut top_rank_count = 0;
        let mut high_and_top_count = 0;
        for r in &wallets {
            let high = r.score > thresholds.high_score;
            let top = r.percentile.is_within_top(thresholds.top_percent);
            if high {
                high_score_count += 1;
            }
            if top {
                top_rank_count += 1;
            }
            if high && top {
                high_and_top_count += 1;
            }
        }

        let elapsed_hours = elapsed_hours.max(MIN_ELAPSED_HOURS);
        let hours = Decimal::from_f64(elapsed_hours).unwrap_or(Decimal::ONE);
        let hourly_growth = total_increment.checked_div(hours).unwrap_or(Decimal::ZERO);

        let stats = Self {
            wallet_count: n,
            success_count,
            fail_count: n - success_count,
            growth_count,
            no_growth_count: n - growth_count,
            total_score,
            avg_score: total_score / divisor,
            max_score,
            min_score,
            total_increment,
            elapsed_hours,
            hourly_growth,
            hourly_growth_per_wallet: hourly_growth / divisor,
            high_score_count,
            top_rank_count,
            high_and_top_count,
        };

        info!(
            wallets = stats.wallet_count,
            success = stats.success_count,
            failed = stats.fail_count,
            growth = stats.growth_count,
            total = %stats.total_score.round_dp(2),
            increment = %stats.total_increment.round_dp(2),
            "Round reconciled"
        );

        stats
    }

    /// Whether the round moved the total enough to be worth reporting.
    pub fn has_change(&self) -> bool {
        self.total_increment.abs() > CHANGE_EPSILON
    }

    /// History line for this round.
    pub fn history_record(&self, timestamp: &str) -> HistoryRecord {
        HistoryRecord {
            timestamp: timestamp.to_string(),
            total_score: self.total_score,
            success_count: self.success_count,
            increment: self.total_increment,
        }
    }
}

/// Hours between the last history record and `now`.
///
/// Falls back to `fallback_hours` (the configured interval) when there is
/// no record or its timestamp does not parse.
pub fn elapsed_hours(last: Option<&HistoryRecord>, now: NaiveDateTime, fallback_hours: f64) -> f64 {
    let parsed = last.and_then(|r| NaiveDateTime::parse_from_str(&r.timestamp, HUMAN_TIME_FORMAT).ok());
    let hours = match parsed {
        Some(then) => (now - then).num_seconds().abs() as f64 / 3600.0,
        None => fallback_hours,
    };
    hours.max(MIN_ELAPSED_HOURS)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
