// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! # Storefront Mirror Sync
//!
//! One-way pull-and-upsert from the remote store into the local mirror.
//!
//! ## Strategy
//!
//! 1. Fetch products page by page (100 per page) until an empty page.
//! 2. Upsert each product into the mirror keyed by its remote numeric ID
//!    (last write wins; the remote ID is the only idempotency token).
//! 3. After the loop, mark mirror rows that did not appear in this run as
//!    missing from the store.
//!
//! A failed page is logged and skipped; there is no retry, no backoff and no
//! partial rollback. Rejected credentials abort the run and surface as an
//! error string. Progress lines stream to the caller over a channel (served
//! as server-sent events); a run has no cancel/resume.

pub mod poller;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::providers::{RemoteProduct, WooClient, WooError};
use crate::storage::{MirrorCache, OpsDatabase, StoredStoreProduct};

pub use poller::StoreSyncPoller;

/// Remote page size.
pub const PAGE_SIZE: u32 = 100;

/// Safety cap on pagination; the remote is expected to terminate with an
/// empty page long before this.
const MAX_PAGES: u32 = 500;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("{0}")]
    Credentials(String),

    #[error("mirror write failed: {0}")]
    Mirror(#[from] crate::storage::OpsDbError),
}

/// Outcome of one full sync run.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SyncReport {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Pages fetched (including failed ones)
    pub pages: u32,
    /// Rows upserted into the mirror
    pub upserted: usize,
    /// Rows flagged missing after the run
    pub marked_missing: usize,
    /// Pages that failed to fetch and were skipped
    pub page_errors: u32,
    /// Whether the pagination safety cap cut the run short
    pub truncated: bool,
}

/// One-way storefront mirror sync.
pub struct StoreSync {
    ops: Arc<OpsDatabase>,
    cache: Arc<MirrorCache>,
    client: WooClient,
}

impl StoreSync {
    /// Create a sync engine over the mirror database and store client.
    pub fn new(ops: Arc<OpsDatabase>, cache: Arc<MirrorCache>, client: WooClient) -> Self {
        Self { ops, cache, client }
    }

    /// Run one full sync.
    ///
    /// `progress` receives textual progress lines when provided; a closed
    /// receiver never stops the run.
    pub async fn run(
        &self,
        progress: Option<mpsc::Sender<String>>,
    ) -> Result<SyncReport, SyncError> {
        let started_at = Utc::now();
        let mut seen: HashSet<u64> = HashSet::new();
        let mut upserted = 0usize;
        let mut pages = 0u32;
        let mut page_errors = 0u32;
        let mut truncated = true;

        emit(&progress, "sync started".to_string()).await;
        info!("Store sync starting");

        let mut page = 1u32;
        while page <= MAX_PAGES {
            pages = page;

            let batch = match self.client.fetch_products_page(page, PAGE_SIZE).await {
                Ok(batch) => batch,
                Err(WooError::Unauthorized(msg)) => {
                    warn!(error = %msg, "Store sync aborted: credentials rejected");
                    emit(&progress, format!("error: {msg}")).await;
                    return Err(SyncError::Credentials(msg));
                }
                Err(e) => {
                    // Log and continue with the next page; no retry
                    warn!(page, error = %e, "Page fetch failed, skipping");
                    emit(&progress, format!("page {page}: fetch failed ({e})")).await;
                    page_errors += 1;
                    page += 1;
                    continue;
                }
            };

            if batch.is_empty() {
                truncated = false;
                break;
            }

            let count = batch.len();
            for remote in &batch {
                let row = mirror_row(remote);
                seen.insert(row.remote_id);
                self.ops.mirror_upsert(&row)?;
                upserted += 1;
            }

            emit(&progress, format!("page {page}: {count} products")).await;
            page += 1;
        }

        if truncated {
            warn!(max_pages = MAX_PAGES, "Store sync hit the pagination cap");
            emit(&progress, format!("warning: stopped at page cap {MAX_PAGES}")).await;
        }

        let marked_missing = self.ops.mirror_mark_missing(&seen)?;
        let finished_at = Utc::now();

        let report = SyncReport {
            started_at,
            finished_at,
            pages,
            upserted,
            marked_missing,
            page_errors,
            truncated,
        };

        self.ops.set_last_sync_at(finished_at)?;
        if let Ok(value) = serde_json::to_value(&report) {
            self.ops.set_last_sync_report(&value)?;
        }
        self.cache.invalidate_all();

        info!(
            pages = report.pages,
            upserted = report.upserted,
            marked_missing = report.marked_missing,
            page_errors = report.page_errors,
            "Store sync complete"
        );
        emit(
            &progress,
            format!(
                "done: {} synced, {} missing, {} page errors",
                report.upserted, report.marked_missing, report.page_errors
            ),
        )
        .await;

        Ok(report)
    }
}

/// Map a remote feed entry onto a mirror row.
fn mirror_row(remote: &RemoteProduct) -> StoredStoreProduct {
    let now = Utc::now();
    StoredStoreProduct {
        remote_id: remote.id,
        name: remote.name.clone(),
        sku: remote.sku.clone(),
        price: remote.price.clone(),
        stock_quantity: remote.stock_quantity,
        status: remote.status.clone(),
        permalink: remote.permalink.clone(),
        is_missing_from_store: false,
        last_seen_at: now,
        synced_at: now,
    }
}

/// Send a progress line, ignoring a closed receiver.
async fn emit(progress: &Option<mpsc::Sender<String>>, line: String) {
    if let Some(tx) = progress {
        let _ = tx.send(line).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(id: u64) -> RemoteProduct {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": format!("Remote {id}"),
            "sku": format!("R-{id}"),
            "price": "10.00",
            "stock_quantity": 3,
            "status": "publish",
            "permalink": format!("https://store.example/p/{id}")
        }))
        .unwrap()
    }

    #[test]
    fn mirror_row_clears_missing_flag_and_stamps_times() {
        let row = mirror_row(&remote(42));
        assert_eq!(row.remote_id, 42);
        assert!(!row.is_missing_from_store);
        assert_eq!(row.stock_quantity, Some(3));
        assert_eq!(row.last_seen_at, row.synced_at);
    }

    #[tokio::test]
    async fn emit_tolerates_closed_receiver() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        // Must not panic or block
        emit(&Some(tx), "line".to_string()).await;
    }
}
