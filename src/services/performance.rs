//! Revenue-stream performance feed seam.
//!
//! Stream ROI numbers arrive from outside (an admin-entered weekly
//! snapshot); this subsystem treats the feed as opaque and assumes no
//! refresh cadence. Streams absent from the feed read as zero.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[async_trait]
pub trait PerformanceFeed: Send + Sync {
    /// Current per-period ROI percentage for a revenue stream; 0 when the
    /// stream is unknown
    async fn current_stream_roi_pct(&self, stream: &str) -> Decimal;

    /// Rates for a set of streams in one call
    async fn rates_for(&self, streams: &[String]) -> HashMap<String, Decimal> {
        let mut rates = HashMap::with_capacity(streams.len());
        for stream in streams {
            rates.insert(stream.clone(), self.current_stream_roi_pct(stream).await);
        }
        rates
    }
}

/// Feed backed by the most recently supplied snapshot
#[derive(Default)]
pub struct SnapshotPerformanceFeed {
    snapshot: RwLock<HashMap<String, Decimal>>,
}

impl SnapshotPerformanceFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: HashMap<String, Decimal>) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
        }
    }

    /// Replace the snapshot wholesale (admin entry point)
    pub async fn set_snapshot(&self, snapshot: HashMap<String, Decimal>) {
        *self.snapshot.write().await = snapshot;
    }
}

#[async_trait]
impl PerformanceFeed for SnapshotPerformanceFeed {
    async fn current_stream_roi_pct(&self, stream: &str) -> Decimal {
        self.snapshot
            .read()
            .await
            .get(stream)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}
