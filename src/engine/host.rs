//! Host identification for report headers.
//!
//! Several trackers usually run side by side, so every summary carries
//! the machine's host name and address.

use reqwest::Client;
use std::net::{IpAddr, UdpSocket};
use std::process::Command;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

const UNKNOWN: &str = "unknown";

/// Any routable address works; a UDP connect sends no packets.
const ROUTE_PROBE_ADDR: &str = "8.8.8.8:80";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub name: String,
    pub ip: String,
}

/// Detect host name and IP.
///
/// The IP is the first non-loopback local IPv4; without one, the public
/// address from `public_ip_url` (when configured); otherwise `unknown`.
pub async fn detect(public_ip_url: Option<&str>) -> HostInfo {
    let name = hostname().unwrap_or_else(|| {
        warn!("Could not determine host name");
        UNKNOWN.to_string()
    });

    let ip = match local_ipv4() {
        Some(ip) => ip.to_string(),
        None => {
            warn!("No local IPv4 address, trying public IP lookup");
            match public_ip_url {
                Some(url) => public_ip(url).await.unwrap_or_else(|| UNKNOWN.to_string()),
                None => UNKNOWN.to_string(),
            }
        }
    };

    HostInfo { name, ip }
}

/// Host name, looked up once per process.
fn hostname() -> Option<String> {
    static HOSTNAME: OnceLock<Option<String>> = OnceLock::new();
    HOSTNAME.get_or_init(lookup_hostname).clone()
}

fn lookup_hostname() -> Option<String> {
    let non_empty = |s: String| {
        let s = s.trim().to_string();
        (!s.is_empty()).then_some(s)
    };

    std::fs::read_to_string("/etc/hostname")
        .ok()
        .and_then(non_empty)
        .or_else(|| std::env::var("HOSTNAME").ok().and_then(non_empty))
        .or_else(|| {
            Command::new("hostname")
                .output()
                .ok()
                .filter(|out| out.status.success())
                .and_then(|out| non_empty(String::from_utf8_lossy(&out.stdout).into_owned()))
        })
}

fn local_ipv4() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect(ROUTE_PROBE_ADDR).ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_loopback() && !ip.is_unspecified()).then_some(ip)
}

async fn public_ip(url: &str) -> Option<String> {
    let http = Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .ok()?;
    let resp = http.get(url).send().await.ok()?;
    if !resp.status().is_success() {
        debug!(status = %resp.status(), "Public IP lookup failed");
        return None;
    }
    let text = resp.text().await.ok()?;
    let ip = text.trim();
    (!ip.is_empty()).then(|| ip.to_string())
}
