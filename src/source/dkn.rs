//! Node points dashboard client.
//!
//! One signed GET per wallet against the all-time points endpoint.
//!
//! Endpoint: `{base_url}/{address}`
//! Auth: `x-api-key` plus an HMAC of the current UTC second
//! (`x-message` / `x-signature`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::PointsSource;
use crate::config::ApiConfig;
use crate::signing::{api_signature, ApiSignature};
use crate::types::{parse_score, Address, Percentile, PointsReading, TrackerError};

const SOURCE_NAME: &str = "dkn";

/// Browser-like agent; the dashboard rejects bare client agents.
const USER_AGENT: &str = "Mozilla/5.0";

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct DknClient {
    http: Client,
    base_url: String,
    referer: String,
    api_key: SecretString,
}

impl DknClient {
    pub fn new(config: &ApiConfig, api_key: SecretString) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client for points API")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            referer: config.referer.clone(),
            api_key,
        })
    }

    fn url_for(&self, address: &Address) -> String {
        format!("{}/{}", self.base_url, address)
    }

    /// Extract score and rank from a points response body.
    ///
    /// `points` wins over `score`; either may be a JSON number or a
    /// numeric string.
    pub fn parse_body(address: &Address, body: &Value) -> Result<PointsReading, TrackerError> {
        let raw = body
            .get("points")
            .or_else(|| body.get("score"))
            .ok_or_else(|| TrackerError::MissingScore(address.to_string()))?;

        let score = match raw {
            Value::Number(n) => parse_score(&n.to_string()),
            Value::String(s) => parse_score(s),
            _ => None,
        }
        .ok_or_else(|| TrackerError::InvalidScore(raw.to_string()))?;

        Ok(PointsReading {
            score,
            percentile: Percentile::from_json(body.get("percentile")),
        })
    }
}

#[async_trait]
impl PointsSource for DknClient {
    async fn fetch_points(&self, address: &Address) -> Result<PointsReading> {
        let url = self.url_for(address);
        let sig = api_signature(&self.api_key, Utc::now());

        debug!(url = %url, "Fetching wallet points");

        let resp = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::REFERER, &self.referer)
            .header(ApiSignature::MESSAGE_HEADER, &sig.message)
            .header(ApiSignature::SIGNATURE_HEADER, &sig.signature)
            .header(ApiSignature::API_KEY_HEADER, self.api_key.expose_secret())
            .send()
            .await
            .context("Points API request failed")?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(TrackerError::HttpStatus {
                address: address.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let body: Value = resp
            .json()
            .await
            .context("Failed to parse points API response")?;

        Ok(Self::parse_body(address, &body)?)
    }

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
