// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Session endpoints: login and current-user lookup.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    audit_log,
    auth::{passwords, Auth, AuthError, Role},
    error::{ApiError, Envelope},
    state::AppState,
    storage::{AuditEvent, AuditEventType, AuditRepository, UserRepository, UserResponse,
        UserStatus},
};

/// Roles allowed to read the sensitive user columns (salary, birth date).
pub fn can_view_sensitive(role: Role) -> bool {
    matches!(role, Role::Admin | Role::Hr)
}

/// Login request body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Login username
    pub username: String,
    /// Plaintext password
    pub password: String,
}

/// Login response: the session token and the logged-in user.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests
    pub token: String,
    /// The authenticated user
    pub user: UserResponse,
}

#[utoipa::path(
    post,
    path = "/v1/session/login",
    request_body = LoginRequest,
    tag = "Session",
    responses(
        (status = 200, body = LoginResponse),
        (status = 401, description = "Invalid username or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Envelope<LoginResponse>>, AuthError> {
    let repo = UserRepository::new(&state.datastore);

    let user = repo
        .find_by_username(&request.username)
        .map_err(|e| AuthError::InternalError(e.to_string()))?;

    let user = match user {
        Some(u) if u.status == UserStatus::Active => u,
        _ => {
            log_login_failure(&state, &request.username);
            return Err(AuthError::InvalidCredentials);
        }
    };

    if !passwords::verify_password(&request.password, &user.password_hash) {
        log_login_failure(&state, &request.username);
        return Err(AuthError::InvalidCredentials);
    }

    let token = state.tokens.issue(&user.user_id, &user.username, user.role)?;
    audit_log!(&state.datastore, AuditEventType::LoginSuccess, &user);

    let response = LoginResponse {
        user: user.to_response(&state.cipher, can_view_sensitive(user.role)),
        token,
    };
    Ok(Json(Envelope::new(response)))
}

#[utoipa::path(
    get,
    path = "/v1/session/me",
    tag = "Session",
    responses((status = 200, body = UserResponse))
)]
pub async fn me(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Envelope<UserResponse>>, ApiError> {
    let repo = UserRepository::new(&state.datastore);
    let stored = repo.get(&user.user_id)?;
    Ok(Json(Envelope::new(
        stored.to_response(&state.cipher, can_view_sensitive(user.role)),
    )))
}

/// Record a failed login attempt; failures never block the response.
fn log_login_failure(state: &AppState, username: &str) {
    let repo = AuditRepository::new(&state.datastore);
    let event = AuditEvent::new(AuditEventType::LoginFailure)
        .with_details(serde_json::json!({ "username": username }))
        .failed("invalid credentials");
    let _ = repo.log(&event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;
    use crate::storage::StoredUser;
    use chrono::Utc;

    fn seed_user(state: &AppState, username: &str, password: &str, role: Role) -> StoredUser {
        let sealed = state.cipher.seal("Test Person");
        let now = Utc::now();
        let user = StoredUser {
            user_id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            full_name_enc: sealed.enc,
            full_name_hash: sealed.hash,
            password_hash: passwords::hash_password(password).unwrap(),
            role,
            position: "Tester".to_string(),
            base_salary_enc: state.cipher.encrypt("4200.00"),
            birth_date_enc: None,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        };
        UserRepository::new(&state.datastore).create(&user).unwrap();
        user
    }

    #[tokio::test]
    async fn login_succeeds_with_valid_credentials() {
        let (state, _tmp) = test_state();
        seed_user(&state, "budi", "password123", Role::Cashier);

        let Json(envelope) = login(
            State(state.clone()),
            Json(LoginRequest {
                username: "budi".to_string(),
                password: "password123".to_string(),
            }),
        )
        .await
        .expect("login succeeds");

        assert!(envelope.success);
        assert_eq!(envelope.data.user.username, "budi");
        // Cashiers do not see sensitive columns
        assert!(envelope.data.user.base_salary.is_none());

        // The issued token verifies
        let claims = state.tokens.verify(&envelope.data.token).unwrap();
        assert_eq!(claims.role, Role::Cashier);
    }

    #[tokio::test]
    async fn login_rejects_wrong_password() {
        let (state, _tmp) = test_state();
        seed_user(&state, "budi", "password123", Role::Staff);

        let result = login(
            State(state),
            Json(LoginRequest {
                username: "budi".to_string(),
                password: "wrong".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn login_rejects_suspended_user() {
        let (state, _tmp) = test_state();
        let mut user = seed_user(&state, "budi", "password123", Role::Staff);
        user.status = UserStatus::Suspended;
        UserRepository::new(&state.datastore).update(&user).unwrap();

        let result = login(
            State(state),
            Json(LoginRequest {
                username: "budi".to_string(),
                password: "password123".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn login_rejects_unknown_user() {
        let (state, _tmp) = test_state();
        let result = login(
            State(state),
            Json(LoginRequest {
                username: "ghost".to_string(),
                password: "password123".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn hr_sees_sensitive_columns_on_login() {
        let (state, _tmp) = test_state();
        seed_user(&state, "hr", "password123", Role::Hr);

        let Json(envelope) = login(
            State(state),
            Json(LoginRequest {
                username: "hr".to_string(),
                password: "password123".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(envelope.data.user.base_salary.as_deref(), Some("4200.00"));
    }
}
