// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Axum extractors for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{AuthenticatedUser, AuthError};
use crate::state::AppState;

/// Extractor for authenticated users.
///
/// The route gate middleware verifies the session token and stores the user
/// in request extensions; this extractor picks it up from there. When a
/// handler runs outside the gated subtree it falls back to verifying the
/// Authorization header itself.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // First check if the gate middleware already set the user
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let token = bearer_token(parts)?;
        let claims = state.tokens.verify(token)?;
        Ok(Auth(AuthenticatedUser::from_claims(claims)))
    }
}

/// Extractor that requires admin role.
pub struct AdminOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AdminOnly(user))
    }
}

/// Extract the bearer token from the Authorization header.
pub fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidAuthHeader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::state::test_support::test_state;
    use axum::http::Request;

    fn parts_with_header(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/test");
        if let Some(v) = value {
            builder = builder.header("Authorization", v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn auth_extractor_requires_auth_header() {
        let (state, _tmp) = test_state();
        let mut parts = parts_with_header(None);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_succeeds_with_token() {
        let (state, _tmp) = test_state();
        let token = state.tokens.issue("user-123", "budi", Role::Staff).unwrap();
        let mut parts = parts_with_header(Some(&format!("Bearer {token}")));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        let Auth(user) = result.expect("valid token authenticates");
        assert_eq!(user.user_id, "user-123");
        assert_eq!(user.role, Role::Staff);
    }

    #[tokio::test]
    async fn auth_extractor_prefers_extensions() {
        let (state, _tmp) = test_state();
        let mut parts = parts_with_header(None);

        let user = AuthenticatedUser {
            user_id: "user_from_middleware".to_string(),
            username: "mw".to_string(),
            role: Role::Admin,
            expires_at: 0,
        };
        parts.extensions.insert(user);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert_eq!(result.unwrap().0.user_id, "user_from_middleware");
    }

    #[tokio::test]
    async fn admin_only_rejects_non_admin() {
        let (state, _tmp) = test_state();
        let token = state
            .tokens
            .issue("user-123", "budi", Role::Cashier)
            .unwrap();
        let mut parts = parts_with_header(Some(&format!("Bearer {token}")));

        let result = AdminOnly::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InsufficientPermissions)));
    }

    #[tokio::test]
    async fn admin_only_accepts_admin() {
        let (state, _tmp) = test_state();
        let token = state.tokens.issue("root", "root", Role::Admin).unwrap();
        let mut parts = parts_with_header(Some(&format!("Bearer {token}")));

        let result = AdminOnly::from_request_parts(&mut parts, &state).await;
        assert!(result.is_ok());
    }

    #[test]
    fn bearer_token_rejects_other_schemes() {
        let parts = parts_with_header(Some("Basic dXNlcjpwYXNz"));
        assert!(matches!(
            bearer_token(&parts),
            Err(AuthError::InvalidAuthHeader)
        ));
    }
}
