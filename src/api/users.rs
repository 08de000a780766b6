// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! User management endpoints.
//!
//! Listing and lookup are open to the roles the route gate allows; creating,
//! updating and deleting accounts is admin-only at the handler level.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::session::can_view_sensitive;
use crate::{
    audit_log,
    auth::{passwords, AdminOnly, Auth, Role},
    error::{ApiError, Envelope},
    money::parse_decimal_to_minor,
    state::AppState,
    storage::{AuditEventType, StoredUser, UserRepository, UserResponse, UserStatus},
};

/// Request body for creating a user.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    /// Login username (unique)
    pub username: String,
    /// Initial password (min 8 chars)
    pub password: String,
    /// Full legal name (stored encrypted)
    pub full_name: String,
    /// Authorization role name
    pub role: String,
    /// Job position/title
    pub position: String,
    /// Base monthly salary, decimal string (stored encrypted)
    pub base_salary: String,
    /// Birth date YYYY-MM-DD (stored encrypted)
    #[serde(default)]
    pub birth_date: Option<String>,
}

/// Request body for updating a user. Absent fields stay unchanged.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    /// New full name
    #[serde(default)]
    pub full_name: Option<String>,
    /// New role name
    #[serde(default)]
    pub role: Option<String>,
    /// New position
    #[serde(default)]
    pub position: Option<String>,
    /// New base salary, decimal string
    #[serde(default)]
    pub base_salary: Option<String>,
    /// New status ("active" or "suspended")
    #[serde(default)]
    pub status: Option<String>,
    /// New password
    #[serde(default)]
    pub password: Option<String>,
}

/// Query params for listing users.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListUsersQuery {
    /// Equality search on the encrypted full-name column
    pub full_name: Option<String>,
}

fn parse_role(raw: &str) -> Result<Role, ApiError> {
    Role::from_str(raw).ok_or_else(|| ApiError::bad_request(format!("unknown role: {raw}")))
}

#[utoipa::path(
    get,
    path = "/v1/users",
    params(ListUsersQuery),
    tag = "Users",
    responses((status = 200, body = [UserResponse]))
)]
pub async fn list_users(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Query(params): Query<ListUsersQuery>,
) -> Result<Json<Envelope<Vec<UserResponse>>>, ApiError> {
    let repo = UserRepository::new(&state.datastore);
    let include_sensitive = can_view_sensitive(caller.role);

    let users = match params.full_name {
        Some(ref name) => repo.find_by_full_name(&state.cipher, name)?,
        None => repo
            .list_all()?
            .into_iter()
            .filter(|u| u.status != UserStatus::Deleted)
            .collect(),
    };

    let responses = users
        .iter()
        .map(|u| u.to_response(&state.cipher, include_sensitive))
        .collect();
    Ok(Json(Envelope::new(responses)))
}

#[utoipa::path(
    get,
    path = "/v1/users/{user_id}",
    params(("user_id" = String, Path, description = "User to fetch")),
    tag = "Users",
    responses((status = 200, body = UserResponse), (status = 404))
)]
pub async fn get_user(
    Auth(caller): Auth,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Envelope<UserResponse>>, ApiError> {
    let repo = UserRepository::new(&state.datastore);
    let user = repo.get(&user_id)?;
    Ok(Json(Envelope::new(
        user.to_response(&state.cipher, can_view_sensitive(caller.role)),
    )))
}

#[utoipa::path(
    post,
    path = "/v1/users",
    request_body = CreateUserRequest,
    tag = "Users",
    responses((status = 201, body = UserResponse), (status = 409))
)]
pub async fn create_user(
    AdminOnly(caller): AdminOnly,
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Envelope<UserResponse>>), ApiError> {
    let role = parse_role(&request.role)?;
    // Validate the amount before sealing it
    parse_decimal_to_minor(&request.base_salary).map_err(ApiError::bad_request)?;

    if request.username.trim().is_empty() {
        return Err(ApiError::bad_request("username must not be empty"));
    }

    let password_hash = passwords::hash_password(&request.password)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let sealed_name = state.cipher.seal(request.full_name.trim());
    let now = Utc::now();
    let user = StoredUser {
        user_id: uuid::Uuid::new_v4().to_string(),
        username: request.username.trim().to_string(),
        full_name_enc: sealed_name.enc,
        full_name_hash: sealed_name.hash,
        password_hash,
        role,
        position: request.position,
        base_salary_enc: state.cipher.encrypt(request.base_salary.trim()),
        birth_date_enc: request
            .birth_date
            .as_deref()
            .map(|d| state.cipher.encrypt(d)),
        status: UserStatus::Active,
        created_at: now,
        updated_at: now,
    };

    let repo = UserRepository::new(&state.datastore);
    repo.create(&user)?;

    audit_log!(
        &state.datastore,
        AuditEventType::UserCreated,
        &caller,
        "user",
        &user.user_id
    );

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(user.to_response(&state.cipher, true))),
    ))
}

#[utoipa::path(
    put,
    path = "/v1/users/{user_id}",
    params(("user_id" = String, Path, description = "User to update")),
    request_body = UpdateUserRequest,
    tag = "Users",
    responses((status = 200, body = UserResponse), (status = 404))
)]
pub async fn update_user(
    AdminOnly(caller): AdminOnly,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<Envelope<UserResponse>>, ApiError> {
    let repo = UserRepository::new(&state.datastore);
    let mut user = repo.get(&user_id)?;

    if let Some(full_name) = request.full_name {
        let sealed = state.cipher.seal(full_name.trim());
        user.full_name_enc = sealed.enc;
        user.full_name_hash = sealed.hash;
    }
    if let Some(role) = request.role {
        user.role = parse_role(&role)?;
    }
    if let Some(position) = request.position {
        user.position = position;
    }
    if let Some(base_salary) = request.base_salary {
        parse_decimal_to_minor(&base_salary).map_err(ApiError::bad_request)?;
        user.base_salary_enc = state.cipher.encrypt(base_salary.trim());
    }
    if let Some(status) = request.status {
        user.status = match status.as_str() {
            "active" => UserStatus::Active,
            "suspended" => UserStatus::Suspended,
            other => return Err(ApiError::bad_request(format!("unknown status: {other}"))),
        };
    }
    if let Some(password) = request.password {
        user.password_hash = passwords::hash_password(&password)
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
    }
    user.updated_at = Utc::now();

    repo.update(&user)?;
    audit_log!(
        &state.datastore,
        AuditEventType::UserUpdated,
        &caller,
        "user",
        &user.user_id
    );

    Ok(Json(Envelope::new(user.to_response(&state.cipher, true))))
}

#[utoipa::path(
    delete,
    path = "/v1/users/{user_id}",
    params(("user_id" = String, Path, description = "User to delete")),
    tag = "Users",
    responses((status = 204), (status = 404))
)]
pub async fn delete_user(
    AdminOnly(caller): AdminOnly,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let repo = UserRepository::new(&state.datastore);
    repo.soft_delete(&user_id)?;

    audit_log!(
        &state.datastore,
        AuditEventType::UserDeleted,
        &caller,
        "user",
        &user_id
    );
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedUser;
    use crate::state::test_support::test_state;

    fn admin() -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: "admin-1".to_string(),
            username: "root".to_string(),
            role: Role::Admin,
            expires_at: 0,
        }
    }

    fn create_request(username: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            password: "password123".to_string(),
            full_name: "Budi Santoso".to_string(),
            role: "cashier".to_string(),
            position: "Cashier".to_string(),
            base_salary: "4200.00".to_string(),
            birth_date: Some("1992-01-15".to_string()),
        }
    }

    #[tokio::test]
    async fn create_user_stores_encrypted_fields() {
        let (state, _tmp) = test_state();

        let (status, Json(envelope)) = create_user(
            AdminOnly(admin()),
            State(state.clone()),
            Json(create_request("budi")),
        )
        .await
        .expect("user creation succeeds");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(envelope.data.full_name, "Budi Santoso");

        // On disk the name and salary are ciphertext
        let stored = UserRepository::new(&state.datastore)
            .get(&envelope.data.user_id)
            .unwrap();
        assert_ne!(stored.full_name_enc, "Budi Santoso");
        assert_ne!(stored.base_salary_enc, "4200.00");
        assert_eq!(state.cipher.decrypt(&stored.base_salary_enc), "4200.00");
    }

    #[tokio::test]
    async fn create_user_rejects_bad_role_and_salary() {
        let (state, _tmp) = test_state();

        let mut bad_role = create_request("a");
        bad_role.role = "wizard".to_string();
        let result = create_user(AdminOnly(admin()), State(state.clone()), Json(bad_role)).await;
        assert!(result.is_err());

        let mut bad_salary = create_request("b");
        bad_salary.base_salary = "lots".to_string();
        let result = create_user(AdminOnly(admin()), State(state), Json(bad_salary)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn list_users_gates_sensitive_columns_by_role() {
        let (state, _tmp) = test_state();
        create_user(
            AdminOnly(admin()),
            State(state.clone()),
            Json(create_request("budi")),
        )
        .await
        .unwrap();

        let staff = AuthenticatedUser {
            user_id: "staff-1".to_string(),
            username: "staff".to_string(),
            role: Role::Staff,
            expires_at: 0,
        };
        let Json(envelope) = list_users(
            Auth(staff),
            State(state.clone()),
            Query(ListUsersQuery { full_name: None }),
        )
        .await
        .unwrap();
        assert_eq!(envelope.data.len(), 1);
        assert!(envelope.data[0].base_salary.is_none());

        let Json(envelope) = list_users(
            Auth(admin()),
            State(state),
            Query(ListUsersQuery { full_name: None }),
        )
        .await
        .unwrap();
        assert_eq!(envelope.data[0].base_salary.as_deref(), Some("4200.00"));
    }

    #[tokio::test]
    async fn list_users_equality_search_by_name() {
        let (state, _tmp) = test_state();
        create_user(
            AdminOnly(admin()),
            State(state.clone()),
            Json(create_request("budi")),
        )
        .await
        .unwrap();
        let mut other = create_request("ani");
        other.full_name = "Ani Wijaya".to_string();
        create_user(AdminOnly(admin()), State(state.clone()), Json(other))
            .await
            .unwrap();

        let Json(envelope) = list_users(
            Auth(admin()),
            State(state),
            Query(ListUsersQuery {
                full_name: Some("Ani Wijaya".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(envelope.data.len(), 1);
        assert_eq!(envelope.data[0].username, "ani");
    }

    #[tokio::test]
    async fn update_and_delete_user() {
        let (state, _tmp) = test_state();
        let (_, Json(created)) = create_user(
            AdminOnly(admin()),
            State(state.clone()),
            Json(create_request("budi")),
        )
        .await
        .unwrap();
        let user_id = created.data.user_id;

        let Json(updated) = update_user(
            AdminOnly(admin()),
            Path(user_id.clone()),
            State(state.clone()),
            Json(UpdateUserRequest {
                full_name: None,
                role: Some("manager".to_string()),
                position: Some("Store Manager".to_string()),
                base_salary: Some("5000.00".to_string()),
                status: None,
                password: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.data.role, Role::Manager);
        assert_eq!(updated.data.base_salary.as_deref(), Some("5000.00"));

        let status = delete_user(
            AdminOnly(admin()),
            Path(user_id.clone()),
            State(state.clone()),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        // Soft delete: record remains, marked deleted
        let stored = UserRepository::new(&state.datastore).get(&user_id).unwrap();
        assert_eq!(stored.status, UserStatus::Deleted);
    }
}
