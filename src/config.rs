//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API key, webhook URL and secret) are referenced by env-var
//! name in the config and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::TrackerError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
}

/// Whether the tracker runs a single round or keeps polling.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Once,
    #[default]
    Loop,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrackerConfig {
    pub name: String,
    pub run_mode: RunMode,
    /// Minutes between rounds in loop mode (floored at one minute).
    pub interval_minutes: u64,
    /// Wait after the very first round.
    pub first_wait_secs: u64,
    /// Wait before re-reading an empty wallet list.
    pub empty_retry_secs: u64,
    /// Label prefix for wallet lines without an explicit label.
    pub label_prefix: String,
    /// Public IP lookup used when no local address is found; empty disables.
    pub public_ip_url: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            name: "POINTWATCH".to_string(),
            run_mode: RunMode::Loop,
            interval_minutes: 120,
            first_wait_secs: 300,
            empty_retry_secs: 10,
            label_prefix: "wallet".to_string(),
            public_ip_url: "https://ifconfig.me".to_string(),
        }
    }
}

impl TrackerConfig {
    /// Sleep between rounds: `first_wait_secs` after the first round,
    /// otherwise the interval with a one-minute floor.
    pub fn wait_after_round(&self, first_round: bool) -> Duration {
        if first_round {
            Duration::from_secs(self.first_wait_secs)
        } else {
            Duration::from_secs((self.interval_minutes * 60).max(60))
        }
    }

    pub fn interval_hours(&self) -> f64 {
        self.interval_minutes as f64 / 60.0
    }

    pub fn public_ip_url(&self) -> Option<&str> {
        let url = self.public_ip_url.trim();
        (!url.is_empty()).then_some(url)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FilesConfig {
    pub wallets: PathBuf,
    pub previous_scores: PathBuf,
    pub summary: PathBuf,
    pub history: PathBuf,
    pub results_dir: PathBuf,
    pub result_prefix: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            wallets: PathBuf::from("wallets.txt"),
            previous_scores: PathBuf::from("previous_scores.txt"),
            summary: PathBuf::from("summary.txt"),
            history: PathBuf::from("history.json"),
            results_dir: PathBuf::from("."),
            result_prefix: "scores".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    /// Endpoint prefix; the normalised address is appended as the last
    /// path segment.
    pub base_url: String,
    pub api_key_env: String,
    pub referer: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://mainnet.dkn.dria.co/dashboard/v1/node/points/all-time".to_string(),
            api_key_env: "POINTS_API_KEY".to_string(),
            referer: "https://dria.co/".to_string(),
            timeout_secs: 30,
            max_attempts: 3,
            retry_delay_secs: 2,
        }
    }
}

/// Which messages go to the chat webhook after a round.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    /// Per-wallet detail only.
    Detail,
    /// Detail followed by the summary.
    DetailAndSummary,
    /// Summary only.
    #[default]
    Summary,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NotifyConfig {
    pub enabled: bool,
    pub mode: ReportMode,
    /// Shown as a bracketed header on every chat message.
    pub title: String,
    pub webhook_url_env: String,
    pub webhook_secret_env: String,
    pub chunk_chars: usize,
    pub chunk_pause_secs: u64,
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: ReportMode::Summary,
            title: "points report".to_string(),
            webhook_url_env: "WEBHOOK_URL".to_string(),
            webhook_secret_env: "WEBHOOK_SECRET".to_string(),
            chunk_chars: 2000,
            chunk_pause_secs: 2,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ThresholdsConfig {
    /// Wallets scoring strictly above this count as high scorers.
    pub high_score: Decimal,
    /// Wallets ranked within this top percentage are counted.
    pub top_percent: Decimal,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            high_score: dec!(10000),
            top_percent: dec!(50),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from TOML text and validate it.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), TrackerError> {
        if self.api.max_attempts == 0 {
            return Err(TrackerError::Config("api.max_attempts must be at least 1".into()));
        }
        if self.notify.chunk_chars == 0 {
            return Err(TrackerError::Config("notify.chunk_chars must be at least 1".into()));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(TrackerError::Config("api.base_url is empty".into()));
        }
        Ok(())
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Resolve a secret referenced by env-var name.
    pub fn resolve_secret(env_name: &str) -> Result<SecretString> {
        Self::resolve_env(env_name).map(SecretString::new)
    }
}
