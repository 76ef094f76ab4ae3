//! Text renderings of a round: chat detail, result file lines, the
//! summary block and the console table.

use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt::Write as _;
use std::path::Path;

use super::accountant::RoundStats;
use super::host::HostInfo;
use crate::types::WalletResult;

const SEPARATOR: &str = "=================================================";

/// `d` rounded to `dp` places with trailing zeros kept; never `-0.00`.
pub fn fmt_dp(d: Decimal, dp: u32) -> String {
    let mut rounded = d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        rounded = Decimal::ZERO;
    }
    rounded.rescale(dp);
    rounded.to_string()
}

/// Like [`fmt_dp`] with an explicit `+` on non-negative values.
pub fn fmt_signed(d: Decimal, dp: u32) -> String {
    let s = fmt_dp(d, dp);
    if s.starts_with('-') {
        s
    } else {
        format!("+{s}")
    }
}

fn wallet_line(r: &WalletResult, address: &str) -> String {
    format!(
        "{} | wallet: {} | score: {} | rank: {} | increment: {}",
        r.entry.label,
        address,
        r.score,
        r.percentile,
        fmt_dp(r.increment, 2)
    )
}

/// Chat detail message: masked addresses.
pub fn detail_lines(timestamp: &str, results: &[WalletResult]) -> String {
    let mut lines = vec![format!("Query time: {timestamp}")];
    lines.extend(results.iter().map(|r| wallet_line(r, &r.entry.address.masked())));
    lines.join("\n")
}

/// Result-file body lines: full addresses.
pub fn result_lines(timestamp: &str, results: &[WalletResult]) -> String {
    let mut lines = vec![format!("Query time: {timestamp}")];
    lines.extend(results.iter().map(|r| wallet_line(r, r.entry.address.as_str())));
    lines.join("\n")
}

/// Core summary block, closed by a separator line.
pub fn summary_block(timestamp: &str, stats: &RoundStats, host: &HostInfo) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "Query time: {timestamp}");
    let _ = writeln!(s, "Host name: {}", host.name);
    let _ = writeln!(s, "Host IP: {}", host.ip);
    let _ = writeln!(
        s,
        "Lookups: {} succeeded, {} failed",
        stats.success_count, stats.fail_count
    );
    let _ = writeln!(
        s,
        "No growth: {}, growth: {}",
        stats.no_growth_count, stats.growth_count
    );
    let _ = writeln!(s, "Total score: {}", fmt_dp(stats.total_score, 2));
    let _ = writeln!(s, "Average score: {}", fmt_dp(stats.avg_score, 2));
    let _ = writeln!(s, "Highest score: {}", fmt_dp(stats.max_score, 2));
    let _ = writeln!(s, "Lowest score: {}", fmt_dp(stats.min_score, 2));
    let _ = writeln!(s, "Total increment: {}", fmt_signed(stats.total_increment, 2));
    let _ = writeln!(s, "Hourly growth: {}", fmt_dp(stats.hourly_growth, 2));
    let _ = writeln!(
        s,
        "Hourly growth per wallet: {}",
        fmt_dp(stats.hourly_growth_per_wallet, 4)
    );
    s.push_str(SEPARATOR);
    s
}

/// Summary block followed by the threshold counts.
pub fn extended_summary(
    timestamp: &str,
    stats: &RoundStats,
    host: &HostInfo,
    high_score: Decimal,
    top_percent: Decimal,
) -> String {
    format!(
        "{}\nWallets above {}: {}\nWallets in top {}%: {}\nWallets above {} and in top {}%: {}",
        summary_block(timestamp, stats, host),
        high_score,
        stats.high_score_count,
        top_percent,
        stats.top_rank_count,
        high_score,
        top_percent,
        stats.high_and_top_count,
    )
}

/// Result file: result lines, blank line, extended summary.
pub fn result_file_body(result_lines: &str, extended_summary: &str) -> String {
    format!("{result_lines}\n\n{extended_summary}\n")
}

/// Summary message for chat, with the locations of this round's files.
pub fn summary_message(extended_summary: &str, result: &Path, summary: &Path, history: &Path) -> String {
    format!(
        "{extended_summary}\nResults saved to {}\nSummary saved to {}\nHistory saved to {}",
        result.display(),
        summary.display(),
        history.display()
    )
}

/// Fixed-width table for the terminal.
pub fn console_table(results: &[WalletResult]) -> String {
    let rule = "=".repeat(60);
    let mut s = String::new();
    let _ = writeln!(s, "{rule}");
    let _ = writeln!(
        s,
        "{:<10} | {:<42} | {:<10} | {:<10} | {:<10}",
        "Label", "Wallet", "Score", "Rank", "Increment"
    );
    let _ = writeln!(s, "{}", "-".repeat(60));
    for r in results {
        let _ = writeln!(
            s,
            "{:<10} | {:<42} | {:<10} | {:<10} | {}",
            r.entry.label,
            r.entry.address,
            fmt_dp(r.score, 2),
            r.percentile,
            fmt_signed(r.increment, 2)
        );
    }
    s
}
