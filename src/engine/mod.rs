//! Core engine: one fetch → aggregate → persist → notify round.

pub mod accountant;
pub mod host;
pub mod poller;
pub mod report;

use anyhow::Result;
use chrono::{DateTime, Local};
use std::path::PathBuf;
use tracing::info;

use crate::config::{AppConfig, FilesConfig, ReportMode, ThresholdsConfig, TrackerConfig};
use crate::notify::Notifier;
use crate::source::PointsSource;
use crate::storage;
use crate::types::WalletResult;
use accountant::{elapsed_hours, RoundStats, HUMAN_TIME_FORMAT};
use poller::RetryPolicy;

/// Timestamp embedded in result file names.
const FILE_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";

// ---------------------------------------------------------------------------
// Round outcome
// ---------------------------------------------------------------------------

/// Everything a completed round produced.
#[derive(Debug, Clone)]
pub struct RoundReport {
    pub timestamp: String,
    pub results: Vec<WalletResult>,
    pub stats: RoundStats,
    pub extended_summary: String,
    pub result_path: PathBuf,
    /// History record count after this round's append.
    pub history_len: usize,
    /// Messages handed to the notifier.
    pub messages_sent: usize,
}

#[derive(Debug, Clone)]
pub enum RoundOutcome {
    /// The wallet list was empty; nothing was fetched or written.
    Skipped,
    Completed(Box<RoundReport>),
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

pub struct Tracker {
    source: Box<dyn PointsSource>,
    notifier: Option<Box<dyn Notifier>>,
    tracker: TrackerConfig,
    files: FilesConfig,
    thresholds: ThresholdsConfig,
    report_mode: ReportMode,
    retry: RetryPolicy,
}

impl Tracker {
    pub fn new(
        config: &AppConfig,
        source: Box<dyn PointsSource>,
        notifier: Option<Box<dyn Notifier>>,
    ) -> Self {
        Self {
            source,
            notifier,
            tracker: config.tracker.clone(),
            files: config.files.clone(),
            thresholds: config.thresholds.clone(),
            report_mode: config.notify.mode,
            retry: RetryPolicy::from_config(&config.api),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifier.is_some()
    }

    /// Announce that tracking has started.
    pub async fn announce_start(&self) {
        if let Some(notifier) = &self.notifier {
            notifier.send("Tracker started, watching for score changes...").await;
        }
    }

    /// Run one full round at wall-clock time `now`.
    pub async fn run_round(&self, first_round: bool, now: DateTime<Local>) -> Result<RoundOutcome> {
        let timestamp = now.format(HUMAN_TIME_FORMAT).to_string();
        let file_stamp = now.format(FILE_TIME_FORMAT).to_string();

        let wallets = storage::load_wallets(&self.files.wallets, &self.tracker.label_prefix);
        if wallets.is_empty() {
            info!("Wallet list is empty, nothing to track this round");
            return Ok(RoundOutcome::Skipped);
        }

        let previous = storage::load_previous_scores(&self.files.previous_scores);
        info!(wallets = wallets.len(), source = self.source.name(), "Starting round");

        let results =
            poller::poll_wallets(self.source.as_ref(), &wallets, &previous, &self.retry).await;

        let last = storage::last_history_record(&self.files.history);
        let hours = elapsed_hours(last.as_ref(), now.naive_local(), self.tracker.interval_hours());
        let stats = RoundStats::compute(&results, &self.thresholds, hours);

        let host = host::detect(self.tracker.public_ip_url()).await;
        let extended_summary = report::extended_summary(
            &timestamp,
            &stats,
            &host,
            self.thresholds.high_score,
            self.thresholds.top_percent,
        );

        storage::save_current_scores(&self.files.previous_scores, &results)?;
        let result_path = storage::write_result_file(
            &self.files.results_dir,
            &self.files.result_prefix,
            &file_stamp,
            &report::result_file_body(&report::result_lines(&timestamp, &results), &extended_summary),
        )?;
        storage::append_summary(&self.files.summary, &extended_summary)?;
        let history_len =
            storage::append_history_record(&self.files.history, stats.history_record(&timestamp))?;

        let mut round = RoundReport {
            timestamp,
            results,
            stats,
            extended_summary,
            result_path,
            history_len,
            messages_sent: 0,
        };
        round.messages_sent = self.notify_round(&round, first_round).await;

        Ok(RoundOutcome::Completed(Box::new(round)))
    }

    /// Push the round to chat when something changed (always on the first
    /// round). Returns the number of messages sent.
    async fn notify_round(&self, round: &RoundReport, first_round: bool) -> usize {
        let Some(notifier) = &self.notifier else {
            info!("Notifications disabled, results shown in terminal only");
            return 0;
        };
        if !(round.stats.has_change() || first_round) {
            info!("No score change, skipping notification this round");
            return 0;
        }

        let mut messages = Vec::new();
        if matches!(self.report_mode, ReportMode::Detail | ReportMode::DetailAndSummary) {
            messages.push(report::detail_lines(&round.timestamp, &round.results));
        }
        if matches!(self.report_mode, ReportMode::Summary | ReportMode::DetailAndSummary) {
            messages.push(report::summary_message(
                &round.extended_summary,
                &round.result_path,
                &self.files.summary,
                &self.files.history,
            ));
        }

        for message in &messages {
            notifier.send(message).await;
        }
        messages.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
