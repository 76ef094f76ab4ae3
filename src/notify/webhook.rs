//! Signed chat-robot webhook.
//!
//! Posts plain text messages of the form
//! `{"msgtype": "text", "text": {"content": "..."}}` to a robot URL that
//! carries `timestamp` and `sign` query parameters.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use secrecy::SecretString;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use super::{split_message, Notifier};
use crate::config::NotifyConfig;
use crate::signing::signed_webhook_url;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    msgtype: &'static str,
    text: TextContent<'a>,
}

#[derive(Debug, Serialize)]
struct TextContent<'a> {
    content: &'a str,
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

pub struct WebhookNotifier {
    http: Client,
    webhook_url: String,
    secret: SecretString,
    title: String,
    chunk_chars: usize,
    chunk_pause: Duration,
}

impl WebhookNotifier {
    pub fn new(config: &NotifyConfig, webhook_url: String, secret: SecretString) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client for webhook")?;

        Ok(Self {
            http,
            webhook_url,
            secret,
            title: config.title.clone(),
            chunk_chars: config.chunk_chars,
            chunk_pause: Duration::from_secs(config.chunk_pause_secs),
        })
    }

    /// Message body for one part, headed by the bracketed title.
    fn content_for(&self, part: &str) -> String {
        format!("【{}】\n{}", self.title, part)
    }

    async fn post_part(&self, url: &str, part: &str) -> Result<()> {
        let content = self.content_for(part);
        let body = TextMessage {
            msgtype: "text",
            text: TextContent { content: &content },
        };

        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .context("Webhook request failed")?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Webhook returned {status}: {text}");
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, message: &str) -> usize {
        let parts = split_message(message, self.chunk_chars);
        let url = signed_webhook_url(
            &self.webhook_url,
            &self.secret,
            Utc::now().timestamp_millis(),
        );

        let mut delivered = 0;
        for (i, part) in parts.iter().enumerate() {
            match self.post_part(&url, part).await {
                Ok(()) => {
                    delivered += 1;
                    info!(part = i + 1, total = parts.len(), "Webhook message sent");
                }
                Err(e) => {
                    warn!(part = i + 1, total = parts.len(), error = %e, "Webhook delivery failed");
                }
            }
            tokio::time::sleep(self.chunk_pause).await;
        }
        delivered
    }
}
