// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Per-route role gating.
//!
//! A `{route: [roles]}` allow-list consulted on every request after
//! authentication. Admins always pass; other roles pass when the exact
//! request path either is absent from the map or lists their role. There is
//! no hierarchy and no wildcard matching.
//!
//! The compiled-in defaults can be overridden per route by a JSON blob that
//! persists encrypted in the datastore and is editable at runtime through the
//! admin API.

use std::collections::HashMap;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use super::claims::AuthenticatedUser;
use super::error::AuthError;
use super::roles::Role;
use crate::crypto::FieldCipher;
use crate::storage::{AuditEvent, AuditEventType, AuditRepository, Datastore, StorageResult};

/// Route → allowed-roles allow-list.
#[derive(Debug, Clone)]
pub struct RouteAccess {
    rules: HashMap<String, Vec<Role>>,
}

impl Default for RouteAccess {
    fn default() -> Self {
        Self::defaults()
    }
}

impl RouteAccess {
    /// Compiled-in defaults for the gated routes.
    pub fn defaults() -> Self {
        let mut rules = HashMap::new();
        let r = |roles: &[Role]| roles.to_vec();

        rules.insert("/v1/users".to_string(), r(&[Role::Admin, Role::Hr]));
        rules.insert(
            "/v1/products".to_string(),
            r(&[Role::Admin, Role::Manager, Role::Cashier]),
        );
        rules.insert(
            "/v1/orders".to_string(),
            r(&[Role::Admin, Role::Manager, Role::Cashier]),
        );
        rules.insert(
            "/v1/payroll".to_string(),
            r(&[Role::Admin, Role::Hr, Role::Finance]),
        );
        rules.insert(
            "/v1/payroll/generate".to_string(),
            r(&[Role::Admin, Role::Hr]),
        );
        rules.insert(
            "/v1/expenses".to_string(),
            r(&[Role::Admin, Role::Finance]),
        );
        rules.insert(
            "/v1/expenses/summary".to_string(),
            r(&[Role::Admin, Role::Finance]),
        );
        rules.insert(
            "/v1/documents".to_string(),
            r(&[Role::Admin, Role::Manager, Role::Finance]),
        );
        rules.insert(
            "/v1/projects".to_string(),
            r(&[Role::Admin, Role::Manager]),
        );
        rules.insert(
            "/v1/store/products".to_string(),
            r(&[Role::Admin, Role::Manager]),
        );
        rules.insert(
            "/v1/store/sync".to_string(),
            r(&[Role::Admin, Role::Manager]),
        );
        rules.insert(
            "/v1/store/sync/status".to_string(),
            r(&[Role::Admin, Role::Manager]),
        );
        rules.insert("/v1/admin/route-access".to_string(), r(&[Role::Admin]));
        rules.insert("/v1/admin/stats".to_string(), r(&[Role::Admin]));
        rules.insert("/v1/admin/audit".to_string(), r(&[Role::Admin]));

        Self { rules }
    }

    /// Apply per-route overrides on top of the defaults.
    pub fn with_overrides(mut self, overrides: HashMap<String, Vec<Role>>) -> Self {
        for (route, roles) in overrides {
            self.rules.insert(route, roles);
        }
        self
    }

    /// Check whether `role` may access `path`.
    ///
    /// Admins always pass. Paths absent from the map are open to any
    /// authenticated user; exact-path lookup only.
    pub fn allows(&self, path: &str, role: Role) -> bool {
        if role == Role::Admin {
            return true;
        }
        match self.rules.get(path) {
            Some(allowed) => allowed.contains(&role),
            None => true,
        }
    }

    /// The current rules as role-name lists, for the admin API.
    pub fn as_name_map(&self) -> HashMap<String, Vec<String>> {
        self.rules
            .iter()
            .map(|(route, roles)| {
                (
                    route.clone(),
                    roles.iter().map(|r| r.to_string()).collect(),
                )
            })
            .collect()
    }
}

/// Parse a role-name map into typed rules, dropping unknown role names.
pub fn parse_name_map(raw: HashMap<String, Vec<String>>) -> HashMap<String, Vec<Role>> {
    let mut rules = HashMap::new();
    for (route, names) in raw {
        let mut roles = Vec::with_capacity(names.len());
        for name in names {
            match Role::from_str(&name) {
                Some(role) => roles.push(role),
                None => warn!(route = %route, role = %name, "Ignoring unknown role in route-access overrides"),
            }
        }
        rules.insert(route, roles);
    }
    rules
}

/// Load persisted route-access overrides, decrypting the stored blob.
///
/// Returns `None` when no override blob exists or it fails to parse.
pub fn load_overrides(
    datastore: &Datastore,
    cipher: &FieldCipher,
) -> Option<HashMap<String, Vec<Role>>> {
    let path = datastore.paths().route_access_file();
    if !datastore.exists(&path) {
        return None;
    }

    let raw = match datastore.read_raw(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Failed to read route-access overrides");
            return None;
        }
    };

    let sealed = String::from_utf8(raw).ok()?;
    let json = cipher.decrypt(sealed.trim());
    match serde_json::from_str::<HashMap<String, Vec<String>>>(&json) {
        Ok(raw_map) => Some(parse_name_map(raw_map)),
        Err(e) => {
            warn!(error = %e, "Route-access override blob did not parse; using defaults");
            None
        }
    }
}

/// Persist route-access overrides as an encrypted JSON blob.
pub fn save_overrides(
    datastore: &Datastore,
    cipher: &FieldCipher,
    overrides: &HashMap<String, Vec<String>>,
) -> StorageResult<()> {
    let json = serde_json::to_string(overrides)?;
    let sealed = cipher.encrypt(&json);
    datastore.write_raw(datastore.paths().route_access_file(), sealed.as_bytes())
}

/// Authentication + route gating middleware for the protected subtree.
///
/// Verifies the session token, stores the user in request extensions for the
/// `Auth` extractor, and consults the route allow-list.
pub async fn gate_middleware(
    State(state): State<crate::state::AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = match request.headers().get(axum::http::header::AUTHORIZATION) {
        Some(header) => header,
        None => return AuthError::MissingAuthHeader.into_response(),
    };

    let auth_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(_) => return AuthError::InvalidAuthHeader.into_response(),
    };

    let token = match auth_str.strip_prefix("Bearer ") {
        Some(t) => t.trim(),
        None => return AuthError::InvalidAuthHeader.into_response(),
    };

    let user = match state.tokens.verify(token) {
        Ok(claims) => AuthenticatedUser::from_claims(claims),
        Err(e) => return e.into_response(),
    };

    // Nested routers strip their prefix from the request URI; the rules are
    // keyed on full paths, so prefer the original URI when present
    let path = request
        .extensions()
        .get::<axum::extract::OriginalUri>()
        .map(|uri| uri.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let allowed = state.route_access.read().await.allows(&path, user.role);
    if !allowed {
        let repo = AuditRepository::new(&state.datastore);
        let event = AuditEvent::new(AuditEventType::PermissionDenied)
            .with_user(&user.user_id)
            .with_resource("route", &path);
        let _ = repo.log(&event);
        return AuthError::InsufficientPermissions.into_response();
    }

    request.extensions_mut().insert(user);
    next.run(request).await
}
