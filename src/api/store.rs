// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Storefront mirror endpoints: listing, sync trigger and sync status.
//!
//! Triggering a sync answers with a server-sent-events stream of textual
//! progress lines. The run is fire-and-forget on the server side: closing
//! the stream does not cancel it (there is no cancel/resume).

use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use utoipa::{IntoParams, ToSchema};

use crate::{
    audit_log,
    auth::Auth,
    error::{ApiError, Envelope},
    state::AppState,
    storage::{AuditEventType, StoredStoreProduct},
};

/// Query params for mirror listing.
#[derive(Debug, Deserialize, IntoParams)]
pub struct StoreProductsQuery {
    /// Remote ID cursor from the previous page
    pub cursor: Option<u64>,
    /// Page size (default 50)
    pub limit: Option<usize>,
}

/// One page of mirrored products.
#[derive(Debug, Serialize, ToSchema)]
pub struct StoreProductsPage {
    /// Mirrored products, ascending by remote ID
    pub products: Vec<StoredStoreProduct>,
    /// Cursor for the next page, when more rows exist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<u64>,
}

/// Sync status response.
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncStatusResponse {
    /// Whether store credentials are configured
    pub configured: bool,
    /// When the last full sync completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Report of the last completed sync
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub last_report: Option<serde_json::Value>,
    /// Rows in the mirror
    pub total: u64,
    /// Rows currently flagged missing from the store
    pub missing: u64,
}

#[utoipa::path(
    get,
    path = "/v1/store/products",
    params(StoreProductsQuery),
    tag = "Store",
    responses((status = 200, body = StoreProductsPage))
)]
pub async fn list_store_products(
    Auth(_caller): Auth,
    State(state): State<AppState>,
    Query(params): Query<StoreProductsQuery>,
) -> Result<Json<Envelope<StoreProductsPage>>, ApiError> {
    let limit = params.limit.unwrap_or(50).clamp(1, 200);

    // Only the first page is cached; it is the common poll from the UI
    if params.cursor.is_none() {
        if let Some(products) = state.mirror_cache.get_first_page(limit) {
            let next_cursor = (products.len() >= limit)
                .then(|| products.last().map(|p| p.remote_id))
                .flatten();
            return Ok(Json(Envelope::new(StoreProductsPage {
                products,
                next_cursor,
            })));
        }
    }

    let (products, next_cursor) = state.ops.mirror_list(params.cursor, limit)?;

    if params.cursor.is_none() {
        state.mirror_cache.put_first_page(limit, products.clone());
    }

    Ok(Json(Envelope::new(StoreProductsPage {
        products,
        next_cursor,
    })))
}

#[utoipa::path(
    post,
    path = "/v1/store/sync",
    tag = "Store",
    responses(
        (status = 200, description = "SSE stream of progress lines"),
        (status = 400, description = "Storefront is not configured")
    )
)]
pub async fn trigger_sync(
    Auth(caller): Auth,
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let sync = state
        .store_sync
        .clone()
        .ok_or_else(|| ApiError::bad_request("storefront credentials are not configured"))?;

    audit_log!(&state.datastore, AuditEventType::StoreSyncStarted, &caller);

    let (tx, rx) = mpsc::channel::<String>(32);
    let datastore = state.datastore.clone();
    let caller_id = caller.user_id.clone();
    tokio::spawn(async move {
        let outcome = sync.run(Some(tx)).await;
        let repo = crate::storage::AuditRepository::new(&datastore);
        let event = match outcome {
            Ok(report) => crate::storage::AuditEvent::new(AuditEventType::StoreSyncCompleted)
                .with_user(&caller_id)
                .with_details(serde_json::json!({
                    "upserted": report.upserted,
                    "marked_missing": report.marked_missing,
                    "page_errors": report.page_errors,
                })),
            Err(e) => crate::storage::AuditEvent::new(AuditEventType::StoreSyncCompleted)
                .with_user(&caller_id)
                .failed(e.to_string()),
        };
        let _ = repo.log(&event);
    });

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|line| (Ok::<_, Infallible>(Event::default().data(line)), rx))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[utoipa::path(
    get,
    path = "/v1/store/sync/status",
    tag = "Store",
    responses((status = 200, body = SyncStatusResponse))
)]
pub async fn sync_status(
    Auth(_caller): Auth,
    State(state): State<AppState>,
) -> Result<Json<Envelope<SyncStatusResponse>>, ApiError> {
    let (total, missing) = state.ops.mirror_counts()?;

    Ok(Json(Envelope::new(SyncStatusResponse {
        configured: state.store_configured(),
        last_synced_at: state.ops.get_last_sync_at()?,
        last_report: state.ops.get_last_sync_report()?,
        total,
        missing,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, Role};
    use crate::state::test_support::test_state;

    fn manager() -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: "mgr-1".to_string(),
            username: "manager".to_string(),
            role: Role::Manager,
            expires_at: 0,
        }
    }

    fn seed_mirror(state: &AppState, remote_id: u64, missing: bool) {
        let now = Utc::now();
        state
            .ops
            .mirror_upsert(&StoredStoreProduct {
                remote_id,
                name: format!("Remote {remote_id}"),
                sku: String::new(),
                price: "5.00".to_string(),
                stock_quantity: None,
                status: "publish".to_string(),
                permalink: String::new(),
                is_missing_from_store: missing,
                last_seen_at: now,
                synced_at: now,
            })
            .unwrap();
    }

    #[tokio::test]
    async fn listing_paginates_and_caches_first_page() {
        let (state, _tmp) = test_state();
        for id in 1u64..=3 {
            seed_mirror(&state, id, false);
        }

        let Json(page) = list_store_products(
            Auth(manager()),
            State(state.clone()),
            Query(StoreProductsQuery {
                cursor: None,
                limit: Some(2),
            }),
        )
        .await
        .unwrap();
        assert_eq!(page.data.products.len(), 2);
        assert_eq!(page.data.next_cursor, Some(2));

        // Cached: a row added behind the cache is not visible until invalidation
        seed_mirror(&state, 4, false);
        let Json(cached) = list_store_products(
            Auth(manager()),
            State(state.clone()),
            Query(StoreProductsQuery {
                cursor: None,
                limit: Some(2),
            }),
        )
        .await
        .unwrap();
        assert_eq!(cached.data.products[0].remote_id, 1);

        let Json(page2) = list_store_products(
            Auth(manager()),
            State(state),
            Query(StoreProductsQuery {
                cursor: Some(2),
                limit: Some(10),
            }),
        )
        .await
        .unwrap();
        assert_eq!(page2.data.products.len(), 2);
        assert!(page2.data.next_cursor.is_none());
    }

    #[tokio::test]
    async fn sync_status_reports_counts() {
        let (state, _tmp) = test_state();
        seed_mirror(&state, 1, false);
        seed_mirror(&state, 2, true);

        let Json(envelope) = sync_status(Auth(manager()), State(state)).await.unwrap();
        assert!(!envelope.data.configured);
        assert_eq!(envelope.data.total, 2);
        assert_eq!(envelope.data.missing, 1);
        assert!(envelope.data.last_synced_at.is_none());
    }

    #[tokio::test]
    async fn trigger_sync_requires_configuration() {
        let (state, _tmp) = test_state();
        let result = trigger_sync(Auth(manager()), State(state)).await;
        let err = result.err().expect("unconfigured store must 400");
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }
}
