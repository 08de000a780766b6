// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Admin-only API endpoints for system management.
//!
//! These endpoints require the Admin role and provide:
//! - Route-access override management (the encrypted RBAC blob)
//! - System statistics
//! - Audit log queries

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    audit_log,
    auth::{gate, AdminOnly, Role},
    error::{ApiError, Envelope},
    state::AppState,
    storage::{AuditEvent, AuditEventType, AuditRepository, UserRepository, UserStatus},
};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Route-access view: route → allowed role names.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RouteAccessResponse {
    /// Effective rules (defaults merged with overrides)
    pub rules: HashMap<String, Vec<String>>,
}

/// Request body replacing the route-access overrides.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateRouteAccessRequest {
    /// Route → allowed role names; replaces the stored override blob
    pub rules: HashMap<String, Vec<String>>,
}

/// System statistics response.
#[derive(Debug, Serialize, ToSchema)]
pub struct SystemStatsResponse {
    /// Total number of user accounts.
    pub total_users: usize,
    /// Number of active accounts.
    pub active_users: usize,
    /// Number of suspended accounts.
    pub suspended_users: usize,
    /// Products in the catalog.
    pub products: u64,
    /// Recorded POS orders.
    pub orders: u64,
    /// Rows in the storefront mirror.
    pub mirror_products: u64,
    /// Mirror rows currently flagged missing.
    pub mirror_missing: u64,
    /// Server uptime in seconds.
    pub uptime_seconds: u64,
    /// Current timestamp.
    pub timestamp: String,
}

/// Query parameters for audit log queries.
#[derive(Debug, Deserialize, IntoParams)]
pub struct AuditQueryParams {
    /// Start date (YYYY-MM-DD); defaults to today.
    pub start_date: Option<String>,
    /// End date (YYYY-MM-DD); defaults to the start date.
    pub end_date: Option<String>,
    /// Filter by user ID.
    pub user_id: Option<String>,
    /// Maximum number of results (default 100).
    pub limit: Option<usize>,
}

/// Response for audit log queries.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuditLogResponse {
    /// Audit events matching the query.
    pub events: Vec<AuditEvent>,
    /// Total count before the limit was applied.
    pub total: usize,
}

// ============================================================================
// Handlers
// ============================================================================

#[utoipa::path(
    get,
    path = "/v1/admin/route-access",
    tag = "Admin",
    responses((status = 200, body = RouteAccessResponse))
)]
pub async fn get_route_access(
    AdminOnly(user): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<Envelope<RouteAccessResponse>>, ApiError> {
    audit_log!(&state.datastore, AuditEventType::AdminAccess, &user);

    let rules = state.route_access.read().await.as_name_map();
    Ok(Json(Envelope::new(RouteAccessResponse { rules })))
}

#[utoipa::path(
    put,
    path = "/v1/admin/route-access",
    request_body = UpdateRouteAccessRequest,
    tag = "Admin",
    responses(
        (status = 200, body = RouteAccessResponse),
        (status = 400, description = "Unknown role name")
    )
)]
pub async fn update_route_access(
    AdminOnly(user): AdminOnly,
    State(state): State<AppState>,
    Json(request): Json<UpdateRouteAccessRequest>,
) -> Result<Json<Envelope<RouteAccessResponse>>, ApiError> {
    // Validate strictly on write; the tolerant parser is for stored blobs
    for (route, names) in &request.rules {
        if !route.starts_with('/') {
            return Err(ApiError::bad_request(format!(
                "route {route} must start with '/'"
            )));
        }
        for name in names {
            if Role::from_str(name).is_none() {
                return Err(ApiError::bad_request(format!("unknown role: {name}")));
            }
        }
    }

    // Persist the override blob encrypted, then swap the live map
    gate::save_overrides(&state.datastore, &state.cipher, &request.rules)?;
    let overrides = gate::parse_name_map(request.rules);
    let updated = crate::auth::RouteAccess::defaults().with_overrides(overrides);
    *state.route_access.write().await = updated;

    audit_log!(
        &state.datastore,
        AuditEventType::RouteAccessChanged,
        &user,
        "config",
        "route_access"
    );

    let rules = state.route_access.read().await.as_name_map();
    Ok(Json(Envelope::new(RouteAccessResponse { rules })))
}

#[utoipa::path(
    get,
    path = "/v1/admin/stats",
    tag = "Admin",
    responses((status = 200, body = SystemStatsResponse))
)]
pub async fn system_stats(
    AdminOnly(user): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<Envelope<SystemStatsResponse>>, ApiError> {
    audit_log!(&state.datastore, AuditEventType::AdminAccess, &user);

    let users = UserRepository::new(&state.datastore).list_all()?;
    let active = users
        .iter()
        .filter(|u| u.status == UserStatus::Active)
        .count();
    let suspended = users
        .iter()
        .filter(|u| u.status == UserStatus::Suspended)
        .count();

    let (mirror_products, mirror_missing) = state.ops.mirror_counts()?;

    Ok(Json(Envelope::new(SystemStatsResponse {
        total_users: users.len(),
        active_users: active,
        suspended_users: suspended,
        products: state.ops.product_count()?,
        orders: state.ops.order_count()?,
        mirror_products,
        mirror_missing,
        uptime_seconds: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now().to_rfc3339(),
    })))
}

#[utoipa::path(
    get,
    path = "/v1/admin/audit",
    params(AuditQueryParams),
    tag = "Admin",
    responses((status = 200, body = AuditLogResponse))
)]
pub async fn query_audit_logs(
    AdminOnly(user): AdminOnly,
    State(state): State<AppState>,
    Query(params): Query<AuditQueryParams>,
) -> Result<Json<Envelope<AuditLogResponse>>, ApiError> {
    audit_log!(&state.datastore, AuditEventType::AdminAccess, &user);

    let today = Utc::now().format("%Y-%m-%d").to_string();
    let start = params.start_date.unwrap_or_else(|| today.clone());
    let end = params.end_date.unwrap_or_else(|| start.clone());
    let limit = params.limit.unwrap_or(100).clamp(1, 1000);

    let repo = AuditRepository::new(&state.datastore);
    let mut events = repo
        .read_events_range(&start, &end)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    if let Some(ref user_id) = params.user_id {
        events.retain(|e| e.user_id.as_deref() == Some(user_id));
    }

    let total = events.len();
    events.truncate(limit);

    Ok(Json(Envelope::new(AuditLogResponse { events, total })))
}
