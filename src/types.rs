//! Shared types for the POINTWATCH tracker.
//!
//! Flat records only: wallets, readings from the points API, per-wallet
//! round results and the history log. Every other module depends on
//! these, never the other way round.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// Canonical wallet address: trimmed, lowercase, `0x`-prefixed.
///
/// Construction always normalises, so two addresses that differ only in
/// case or a missing prefix compare equal and hash to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(raw: &str) -> Self {
        Self(normalize_address(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for chat messages: `****` followed by the last six chars.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() > 6 {
            let tail: String = chars[chars.len() - 6..].iter().collect();
            format!("****{tail}")
        } else {
            self.0.clone()
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Normalise a raw address string to its canonical form.
pub fn normalize_address(raw: &str) -> String {
    let a = raw.trim().to_lowercase();
    if a.starts_with("0x") {
        a
    } else {
        format!("0x{a}")
    }
}

// ---------------------------------------------------------------------------
// Wallets
// ---------------------------------------------------------------------------

/// One line of the wallet list: a display label and the wallet address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletEntry {
    pub label: String,
    pub address: Address,
}

impl WalletEntry {
    pub fn new(label: impl Into<String>, address: &str) -> Self {
        Self {
            label: label.into(),
            address: Address::new(address),
        }
    }
}

// ---------------------------------------------------------------------------
// Percentile
// ---------------------------------------------------------------------------

/// Rank bucket reported by the points API.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Percentile {
    /// "top N%"; holds N exactly as the API reported it.
    Top(String),
    /// Any other label, shown verbatim.
    Other(String),
    /// No rank available (missing field or failed lookup).
    #[default]
    Unknown,
}

impl Percentile {
    /// Interpret the raw `percentile` JSON field.
    pub fn from_json(value: Option<&serde_json::Value>) -> Self {
        match value {
            None | Some(serde_json::Value::Null) => Percentile::Unknown,
            Some(serde_json::Value::String(s)) => match s.strip_prefix("top_") {
                Some(rest) => Percentile::Top(rest.to_string()),
                None => Percentile::Other(s.clone()),
            },
            Some(serde_json::Value::Number(n)) => Percentile::Top(n.to_string()),
            Some(other) => Percentile::Other(other.to_string()),
        }
    }

    /// Numeric N of a "top N%" bucket, when N parses as a number.
    pub fn percent_value(&self) -> Option<Decimal> {
        match self {
            Percentile::Top(raw) => parse_decimal(raw.trim_end_matches('%')),
            _ => None,
        }
    }

    /// True when the wallet sits inside the top `limit` percent.
    pub fn is_within_top(&self, limit: Decimal) -> bool {
        self.percent_value().is_some_and(|v| v <= limit)
    }
}

impl fmt::Display for Percentile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Percentile::Top(n) => format!("top {n}%"),
            Percentile::Other(s) => s.clone(),
            Percentile::Unknown => "unknown rank".to_string(),
        };
        f.pad(&text)
    }
}

/// Parse a decimal from plain or scientific notation.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Largest score magnitude accepted from the API or the snapshot file.
///
/// Keeps per-round sums and rates far inside `Decimal`'s range, so the
/// aggregation arithmetic cannot overflow.
pub const MAX_SCORE: Decimal = dec!(1000000000000000);

/// Parse a score, rejecting values beyond [`MAX_SCORE`].
pub fn parse_score(raw: &str) -> Option<Decimal> {
    parse_decimal(raw).filter(|d| d.abs() <= MAX_SCORE)
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// One successful answer from the points API.
#[derive(Debug, Clone, PartialEq)]
pub struct PointsReading {
    pub score: Decimal,
    pub percentile: Percentile,
}

/// Result of a lookup after retries have been spent.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Fetched(PointsReading),
    Failed { reason: String },
}

impl LookupOutcome {
    /// Score to record: failed lookups count as zero.
    pub fn score(&self) -> Decimal {
        match self {
            LookupOutcome::Fetched(r) => r.score,
            LookupOutcome::Failed { .. } => Decimal::ZERO,
        }
    }

    pub fn percentile(&self) -> Percentile {
        match self {
            LookupOutcome::Fetched(r) => r.percentile.clone(),
            LookupOutcome::Failed { .. } => Percentile::Unknown,
        }
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self, LookupOutcome::Fetched(_))
    }
}

/// Everything known about one wallet at the end of a round.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletResult {
    pub entry: WalletEntry,
    pub score: Decimal,
    pub percentile: Percentile,
    pub previous: Decimal,
    /// `score - previous`.
    pub increment: Decimal,
    pub fetched: bool,
}

impl WalletResult {
    pub fn new(entry: WalletEntry, outcome: &LookupOutcome, previous: Decimal) -> Self {
        let score = outcome.score();
        Self {
            entry,
            score,
            percentile: outcome.percentile(),
            previous,
            increment: score - previous,
            fetched: outcome.is_fetched(),
        }
    }

    pub fn has_growth(&self) -> bool {
        self.increment > Decimal::ZERO
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// One line of the JSON history log, written once per round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Local time, `%Y-%m-%d %H:%M:%S`.
    pub timestamp: String,
    pub total_score: Decimal,
    pub success_count: usize,
    pub increment: Decimal,
}

/// On-disk shape of the history file.
///
/// Records are raw JSON; entries that no longer decode survive a rewrite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryLog {
    pub records: Vec<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for POINTWATCH.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Points API returned HTTP {status} for {address}")]
    HttpStatus { address: String, status: u16 },

    #[error("Points API response for {0} has no points or score field")]
    MissingScore(String),

    #[error("Unparsable score value: {0}")]
    InvalidScore(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
