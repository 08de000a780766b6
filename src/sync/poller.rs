// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! # Store Sync Poller
//!
//! Background task that repeats the full storefront sync on a fixed
//! interval, so the mirror stays fresh even when nobody triggers a sync from
//! the admin screens.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::StoreSync;

/// Background poller that repeats the full store sync.
pub struct StoreSyncPoller {
    sync: Arc<StoreSync>,
    poll_interval: Duration,
}

impl StoreSyncPoller {
    /// Create a new poller over the sync engine.
    pub fn new(sync: Arc<StoreSync>, poll_interval: Duration) -> Self {
        Self {
            sync,
            poll_interval,
        }
    }

    /// Run the poller loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(poller.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.poll_interval.as_secs(),
            "Store sync poller starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Store sync poller shutting down");
                return;
            }

            match self.sync.run(None).await {
                Ok(report) => {
                    info!(
                        upserted = report.upserted,
                        marked_missing = report.marked_missing,
                        page_errors = report.page_errors,
                        "Store sync poller: run complete"
                    );
                }
                Err(e) => {
                    warn!(error = %e, "Store sync poller: run failed");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Store sync poller shutting down");
                    return;
                }
            }
        }
    }
}
