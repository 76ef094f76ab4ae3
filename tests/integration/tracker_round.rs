//! End-to-end rounds: signed lookups with retry, file persistence and
//! webhook delivery through the real HTTP clients.

use chrono::{Local, TimeZone};
use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde_json::json;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pointwatch::config::{AppConfig, ReportMode};
use pointwatch::engine::poller::RetryPolicy;
use pointwatch::engine::{RoundOutcome, RoundReport, Tracker};
use pointwatch::notify::webhook::WebhookNotifier;
use pointwatch::notify::Notifier;
use pointwatch::source::dkn::DknClient;

use crate::fake_services::{FakeServices, API_KEY, WEBHOOK_SECRET};

const WALLET_A: &str = "0x00000000000000000000000000000000000000aa";
const WALLET_B: &str = "0x00000000000000000000000000000000000000bb";
const WALLET_C: &str = "0x00000000000000000000000000000000000000cc";

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pointwatch_it_{}_{name}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn config(dir: &Path, addr: SocketAddr, mode: ReportMode) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.files.wallets = dir.join("wallets.txt");
    cfg.files.previous_scores = dir.join("previous_scores.txt");
    cfg.files.summary = dir.join("summary.txt");
    cfg.files.history = dir.join("history.json");
    cfg.files.results_dir = dir.join("results");
    cfg.tracker.public_ip_url = String::new();
    cfg.api.base_url = format!("http://{addr}/points");
    cfg.api.timeout_secs = 5;
    cfg.notify.enabled = true;
    cfg.notify.mode = mode;
    cfg.notify.title = "farm".into();
    cfg.notify.chunk_pause_secs = 0;
    cfg.notify.timeout_secs = 5;
    cfg
}

fn tracker(cfg: &AppConfig, addr: SocketAddr, api_key: &str) -> Tracker {
    let source = DknClient::new(&cfg.api, SecretString::new(api_key.into())).unwrap();
    let notifier = WebhookNotifier::new(
        &cfg.notify,
        format!("http://{addr}/robot/send"),
        SecretString::new(WEBHOOK_SECRET.into()),
    )
    .unwrap();
    Tracker::new(cfg, Box::new(source), Some(Box::new(notifier))).with_retry(RetryPolicy {
        max_attempts: 3,
        delay: Duration::ZERO,
    })
}

fn completed(outcome: RoundOutcome) -> Box<RoundReport> {
    match outcome {
        RoundOutcome::Completed(round) => round,
        RoundOutcome::Skipped => panic!("round should complete"),
    }
}

fn three_wallet_services() -> FakeServices {
    FakeServices::default()
        .with_wallet(WALLET_A, json!({"points": 1500, "percentile": "top_5"}), 0)
        .with_wallet(WALLET_B, json!({"score": "20000", "percentile": "top_40"}), 2)
}

#[tokio::test]
async fn test_full_round_with_retries_and_failures() {
    let services = three_wallet_services();
    let addr = services.spawn().await;
    let dir = temp_dir("full_round");
    std::fs::write(
        dir.join("wallets.txt"),
        // Mixed case on purpose: addresses are normalised before lookup.
        format!("# farm\nnode-a,{WALLET_A}\nnode-b,{}\n{WALLET_C}\n", WALLET_B.to_uppercase()),
    )
    .unwrap();

    let cfg = config(&dir, addr, ReportMode::DetailAndSummary);
    let round = completed(tracker(&cfg, addr, API_KEY).run_round(true, Local::now()).await.unwrap());

    // Wallet B succeeds on its third attempt; C is unknown and exhausts retries.
    assert_eq!(services.requests_for(WALLET_B), 3);
    assert_eq!(services.requests_for(WALLET_C), 3);
    assert_eq!(services.requests_for(WALLET_A), 1);

    let stats = &round.stats;
    assert_eq!(stats.success_count, 2);
    assert_eq!(stats.fail_count, 1);
    assert_eq!(stats.total_score, dec!(21500));
    assert_eq!(stats.total_increment, dec!(21500));
    assert_eq!(stats.high_score_count, 1);
    assert_eq!(stats.top_rank_count, 2);
    assert_eq!(stats.high_and_top_count, 1);
    assert!(stats.has_change());

    let failed = &round.results[2];
    assert!(!failed.fetched);
    assert_eq!(failed.score, dec!(0));
    assert_eq!(failed.percentile.to_string(), "unknown rank");

    let previous = std::fs::read_to_string(dir.join("previous_scores.txt")).unwrap();
    assert!(previous.contains(&format!("node-a,{WALLET_A},1500\n")));
    assert!(previous.contains(&format!("node-b,{WALLET_B},20000\n")));
    assert!(previous.contains(&format!("{WALLET_C},0\n")));

    let result_file = std::fs::read_to_string(&round.result_path).unwrap();
    assert!(result_file.contains(&format!("node-a | wallet: {WALLET_A} | score: 1500 | rank: top 5%")));
    assert!(result_file.contains("Lookups: 2 succeeded, 1 failed"));
    assert!(result_file.ends_with("Wallets above 10000 and in top 50%: 1\n"));

    assert_eq!(round.messages_sent, 2);
    let messages = services.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.starts_with("【farm】\n")));
    assert!(messages[0].contains("wallet: ****0000aa |"));
    assert!(!messages[0].contains(WALLET_A));
    assert!(messages[1].contains("Total score: 21500.00"));
    assert!(messages[1].contains("History saved to"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_unchanged_second_round_stays_quiet() {
    let services = FakeServices::default()
        .with_wallet(WALLET_A, json!({"points": 42.5, "percentile": 12}), 0);
    let addr = services.spawn().await;
    let dir = temp_dir("quiet_round");
    std::fs::write(dir.join("wallets.txt"), format!("node-a,{WALLET_A}\n")).unwrap();

    let cfg = config(&dir, addr, ReportMode::Summary);
    let tracker = tracker(&cfg, addr, API_KEY);

    let first = Local.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap();
    let second = Local.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
    let r1 = completed(tracker.run_round(true, first).await.unwrap());
    let r2 = completed(tracker.run_round(false, second).await.unwrap());

    assert_eq!(r1.messages_sent, 1);
    assert_eq!(r2.messages_sent, 0);
    assert_eq!(services.messages().len(), 1);

    assert_eq!(r2.results[0].increment, dec!(0));
    assert_eq!(r2.history_len, 2);
    assert!((r2.stats.elapsed_hours - 4.0).abs() < 1e-9);

    let history: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.join("history.json")).unwrap()).unwrap();
    assert_eq!(history["records"].as_array().unwrap().len(), 2);

    let summary = std::fs::read_to_string(dir.join("summary.txt")).unwrap();
    assert_eq!(summary.matches("Total score: 42.50").count(), 2);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_wrong_api_key_marks_every_wallet_failed() {
    let services = three_wallet_services();
    let addr = services.spawn().await;
    let dir = temp_dir("bad_key");
    std::fs::write(dir.join("wallets.txt"), format!("{WALLET_A}\n{WALLET_B}\n")).unwrap();

    let cfg = config(&dir, addr, ReportMode::Summary);
    let round = completed(tracker(&cfg, addr, "wrong-key").run_round(true, Local::now()).await.unwrap());

    assert_eq!(round.stats.success_count, 0);
    assert_eq!(round.stats.fail_count, 2);
    assert_eq!(round.stats.total_score, dec!(0));
    assert_eq!(round.history_len, 1);
    // Rejected before reaching the wallet table.
    assert_eq!(services.requests_for(WALLET_A), 0);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_empty_wallet_list_writes_nothing() {
    let services = FakeServices::default();
    let addr = services.spawn().await;
    let dir = temp_dir("empty");

    let cfg = config(&dir, addr, ReportMode::Summary);
    let outcome = tracker(&cfg, addr, API_KEY).run_round(true, Local::now()).await.unwrap();

    assert!(matches!(outcome, RoundOutcome::Skipped));
    assert!(!dir.join("summary.txt").exists());
    assert!(!dir.join("history.json").exists());
    assert!(services.messages().is_empty());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_webhook_splits_long_messages() {
    let services = FakeServices::default();
    let addr = services.spawn().await;

    let mut cfg = config(Path::new("."), addr, ReportMode::Summary);
    cfg.notify.chunk_chars = 10;
    let notifier = WebhookNotifier::new(
        &cfg.notify,
        format!("http://{addr}/robot/send"),
        SecretString::new(WEBHOOK_SECRET.into()),
    )
    .unwrap();

    let delivered = notifier.send("0123456789abcdefghijKLMNO").await;
    assert_eq!(delivered, 3);
    assert_eq!(
        services.messages(),
        vec!["【farm】\n0123456789", "【farm】\nabcdefghij", "【farm】\nKLMNO"]
    );
}

#[tokio::test]
async fn test_announce_start_sends_one_message() {
    let services = FakeServices::default();
    let addr = services.spawn().await;
    let dir = temp_dir("announce");

    let cfg = config(&dir, addr, ReportMode::Summary);
    let tracker = tracker(&cfg, addr, API_KEY);
    assert!(tracker.notifications_enabled());
    tracker.announce_start().await;

    let messages = services.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Tracker started"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_wrong_webhook_secret_is_not_fatal() {
    let services = FakeServices::default();
    let addr = services.spawn().await;

    let cfg = config(Path::new("."), addr, ReportMode::Summary);
    let notifier = WebhookNotifier::new(
        &cfg.notify,
        format!("http://{addr}/robot/send"),
        SecretString::new("SECwrong".into()),
    )
    .unwrap();

    assert_eq!(notifier.send("report").await, 0);
    assert!(services.messages().is_empty());
}
