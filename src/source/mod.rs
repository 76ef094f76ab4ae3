//! Points API integrations.
//!
//! Defines the `PointsSource` trait and the HTTP client for the node
//! points dashboard. A source makes exactly one attempt per call; retry
//! policy belongs to the engine.

pub mod dkn;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{Address, PointsReading};

/// Abstraction over a remote points service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PointsSource: Send + Sync {
    /// Fetch the current all-time score and rank for one wallet.
    async fn fetch_points(&self, address: &Address) -> Result<PointsReading>;

    /// Source name for logging.
    fn name(&self) -> &'static str;
}
