//! POINTWATCH: periodic wallet points tracker
//!
//! Entry point. Loads configuration, initialises structured logging,
//! builds the points source and optional chat notifier, and runs the
//! fetch→aggregate→persist→notify loop with graceful shutdown.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use secrecy::SecretString;
use std::time::Duration;
use tracing::{error, info, warn};

use pointwatch::config::{self, ReportMode, RunMode};
use pointwatch::engine::{report, RoundOutcome, Tracker};
use pointwatch::notify::webhook::WebhookNotifier;
use pointwatch::notify::Notifier;
use pointwatch::source::dkn::DknClient;

const BANNER: &str = r#"
  POINTWATCH
  wallet points tracker
"#;

#[derive(Parser)]
#[command(name = "pointwatch", about = "Track wallet points and report score changes")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, default_value = "config.toml")]
    config: String,

    /// Run a single round or keep polling (overrides config)
    #[arg(long, value_enum)]
    mode: Option<RunMode>,

    /// Minutes between rounds in loop mode (overrides config)
    #[arg(long)]
    interval_minutes: Option<u64>,

    /// Send chat notifications (overrides config)
    #[arg(long, conflicts_with = "no_notify")]
    notify: bool,

    /// Terminal output only (overrides config)
    #[arg(long)]
    no_notify: bool,

    /// Which messages go to chat (overrides config)
    #[arg(long, value_enum)]
    report_mode: Option<ReportMode>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let args = Args::parse();
    let mut cfg = config::AppConfig::load(&args.config)?;
    apply_overrides(&mut cfg, &args);

    init_logging();

    println!("{BANNER}");
    info!(
        name = %cfg.tracker.name,
        mode = ?cfg.tracker.run_mode,
        interval_minutes = cfg.tracker.interval_minutes,
        notify = cfg.notify.enabled,
        report_mode = ?cfg.notify.mode,
        "POINTWATCH starting up"
    );

    // -- Initialise components -------------------------------------------

    let api_key = match config::AppConfig::resolve_secret(&cfg.api.api_key_env) {
        Ok(key) => key,
        Err(e) => {
            warn!(error = %e, "No points API key configured, requests will be unsigned");
            SecretString::new(String::new())
        }
    };
    let source = DknClient::new(&cfg.api, api_key)?;

    let notifier: Option<Box<dyn Notifier>> = if cfg.notify.enabled {
        let url = config::AppConfig::resolve_env(&cfg.notify.webhook_url_env)
            .context("Notifications enabled but no webhook URL")?;
        let secret = config::AppConfig::resolve_secret(&cfg.notify.webhook_secret_env)
            .context("Notifications enabled but no webhook secret")?;
        Some(Box::new(WebhookNotifier::new(&cfg.notify, url, secret)?))
    } else {
        info!("Chat notifications disabled");
        None
    };

    let tracker = Tracker::new(&cfg, Box::new(source), notifier);
    tracker.announce_start().await;

    // -- Main loop -------------------------------------------------------

    let once = cfg.tracker.run_mode == RunMode::Once;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut first_round = true;
    loop {
        let wait = match tracker.run_round(first_round, Local::now()).await {
            Ok(RoundOutcome::Skipped) => {
                if once {
                    break;
                }
                Duration::from_secs(cfg.tracker.empty_retry_secs)
            }
            Ok(RoundOutcome::Completed(round)) => {
                println!("{}", report::console_table(&round.results));
                println!("{}", round.extended_summary);
                info!(
                    total = %report::fmt_dp(round.stats.total_score, 2),
                    increment = %report::fmt_signed(round.stats.total_increment, 2),
                    history_records = round.history_len,
                    result_file = %round.result_path.display(),
                    "Round complete"
                );
                if once {
                    info!("Single round finished, exiting");
                    break;
                }
                let wait = cfg.tracker.wait_after_round(first_round);
                first_round = false;
                wait
            }
            Err(e) => {
                if once {
                    return Err(e);
                }
                error!(error = %e, "Round failed, continuing to next");
                let wait = cfg.tracker.wait_after_round(first_round);
                first_round = false;
                wait
            }
        };

        info!(wait_secs = wait.as_secs(), "Next round scheduled");
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!("POINTWATCH shut down cleanly.");
    Ok(())
}

/// Apply command-line overrides on top of the file config.
fn apply_overrides(cfg: &mut config::AppConfig, args: &Args) {
    if let Some(mode) = args.mode {
        cfg.tracker.run_mode = mode;
    }
    if let Some(minutes) = args.interval_minutes {
        cfg.tracker.interval_minutes = minutes.max(1);
    }
    if args.notify {
        cfg.notify.enabled = true;
    }
    if args.no_notify {
        cfg.notify.enabled = false;
    }
    if let Some(mode) = args.report_mode {
        cfg.notify.mode = mode;
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pointwatch=info"));

    let json_logging = std::env::var("POINTWATCH_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
