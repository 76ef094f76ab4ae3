//! Fake points API and chat webhook for integration testing.
//!
//! Both run on one Axum router bound to an ephemeral localhost port.
//! The points endpoint checks request signatures the way the real
//! dashboard does; the webhook checks the `timestamp`/`sign` query and
//! records every message body it accepts.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use pointwatch::signing::{hmac_sha256, webhook_signature};

pub const API_KEY: &str = "test-api-key";
pub const WEBHOOK_SECRET: &str = "SECtest";

/// Canned response for one wallet.
#[derive(Clone)]
pub struct FakeWallet {
    pub body: Value,
    /// Respond 500 this many times before succeeding.
    pub failures: u32,
}

#[derive(Default)]
struct Inner {
    wallets: HashMap<String, FakeWallet>,
    requests: HashMap<String, u32>,
    messages: Vec<String>,
}

/// Shared, inspectable state for the fake services.
#[derive(Clone, Default)]
pub struct FakeServices {
    inner: Arc<Mutex<Inner>>,
}

impl FakeServices {
    pub fn with_wallet(self, address: &str, body: Value, failures: u32) -> Self {
        self.inner
            .lock()
            .unwrap()
            .wallets
            .insert(address.to_string(), FakeWallet { body, failures });
        self
    }

    /// Requests seen for `address`, including failed ones.
    pub fn requests_for(&self, address: &str) -> u32 {
        self.inner
            .lock()
            .unwrap()
            .requests
            .get(address)
            .copied()
            .unwrap_or(0)
    }

    /// Webhook message contents, in arrival order.
    pub fn messages(&self) -> Vec<String> {
        self.inner.lock().unwrap().messages.clone()
    }

    /// Serve on an ephemeral port; returns the bound address.
    pub async fn spawn(&self) -> SocketAddr {
        let app = Router::new()
            .route("/points/:address", get(points))
            .route("/robot/send", post(webhook))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or("")
}

async fn points(
    State(state): State<FakeServices>,
    Path(address): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let message = header(&headers, "x-message");
    let expected = hex::encode(hmac_sha256(API_KEY.as_bytes(), message.as_bytes()));
    if header(&headers, "x-api-key") != API_KEY || header(&headers, "x-signature") != expected {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad signature"})));
    }

    let mut inner = state.inner.lock().unwrap();
    *inner.requests.entry(address.clone()).or_default() += 1;
    let Some(wallet) = inner.wallets.get_mut(&address) else {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "unknown node"})));
    };
    if wallet.failures > 0 {
        wallet.failures -= 1;
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "busy"})));
    }
    (StatusCode::OK, Json(wallet.body.clone()))
}

async fn webhook(
    State(state): State<FakeServices>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let timestamp = query.get("timestamp").cloned().unwrap_or_default();
    let Ok(ts) = timestamp.parse::<i64>() else {
        return (StatusCode::BAD_REQUEST, Json(json!({"errcode": 1})));
    };
    let (_, sign) = webhook_signature(&SecretString::new(WEBHOOK_SECRET.into()), ts);
    let sign = urlencoding::decode(&sign).unwrap().into_owned();
    if query.get("sign") != Some(&sign) || body["msgtype"] != "text" {
        return (StatusCode::FORBIDDEN, Json(json!({"errcode": 310000})));
    }

    let content = body["text"]["content"].as_str().unwrap_or_default().to_string();
    state.inner.lock().unwrap().messages.push(content);
    (StatusCode::OK, Json(json!({"errcode": 0})))
}
