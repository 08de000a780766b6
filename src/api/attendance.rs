// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Attendance endpoints: daily check-in/check-out and monthly listings.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    audit_log,
    auth::{Auth, Role},
    error::{ApiError, Envelope},
    state::AppState,
    storage::{AttendanceRepository, AuditEventType, StorageError, StoredAttendance},
};

/// Request body for checking in.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CheckInRequest {
    /// Free-form note (remote work, field assignment, ...)
    #[serde(default)]
    pub note: Option<String>,
}

/// Query params for attendance listing.
#[derive(Debug, Deserialize, IntoParams)]
pub struct AttendanceQuery {
    /// User to list; defaults to the caller. Only admins and HR may list
    /// other users.
    pub user_id: Option<String>,
    /// Year (defaults to the current year)
    pub year: Option<i32>,
    /// Month 1-12 (defaults to the current month)
    pub month: Option<u32>,
}

#[utoipa::path(
    post,
    path = "/v1/attendance/check-in",
    request_body = CheckInRequest,
    tag = "Attendance",
    responses(
        (status = 201, body = StoredAttendance),
        (status = 409, description = "Already checked in today")
    )
)]
pub async fn check_in(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Json(request): Json<CheckInRequest>,
) -> Result<(StatusCode, Json<Envelope<StoredAttendance>>), ApiError> {
    let now = Utc::now();
    let record = StoredAttendance::check_in(
        caller.user_id.clone(),
        now.date_naive(),
        now.time(),
        &state.workday,
        request.note,
    );

    let repo = AttendanceRepository::new(&state.datastore);
    repo.create(&record).map_err(|e| match e {
        StorageError::AlreadyExists(_) => ApiError::conflict("already checked in today"),
        other => other.into(),
    })?;

    audit_log!(
        &state.datastore,
        AuditEventType::AttendanceCheckIn,
        &caller,
        "attendance",
        &record.record_id
    );

    Ok((StatusCode::CREATED, Json(Envelope::new(record))))
}

#[utoipa::path(
    post,
    path = "/v1/attendance/check-out",
    tag = "Attendance",
    responses(
        (status = 200, body = StoredAttendance),
        (status = 404, description = "No check-in today"),
        (status = 409, description = "Already checked out")
    )
)]
pub async fn check_out(
    Auth(caller): Auth,
    State(state): State<AppState>,
) -> Result<Json<Envelope<StoredAttendance>>, ApiError> {
    let now = Utc::now();
    let repo = AttendanceRepository::new(&state.datastore);

    let mut record = repo
        .get(&caller.user_id, now.date_naive())
        .map_err(|_| ApiError::not_found("no check-in today"))?;

    if record.check_out.is_some() {
        return Err(ApiError::conflict("already checked out today"));
    }

    record.apply_check_out(now.time(), &state.workday);
    repo.update(&record)?;

    audit_log!(
        &state.datastore,
        AuditEventType::AttendanceCheckOut,
        &caller,
        "attendance",
        &record.record_id
    );

    Ok(Json(Envelope::new(record)))
}

#[utoipa::path(
    get,
    path = "/v1/attendance",
    params(AttendanceQuery),
    tag = "Attendance",
    responses((status = 200, body = [StoredAttendance]), (status = 403))
)]
pub async fn list_attendance(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Query(params): Query<AttendanceQuery>,
) -> Result<Json<Envelope<Vec<StoredAttendance>>>, ApiError> {
    let now = Utc::now();
    let user_id = params.user_id.unwrap_or_else(|| caller.user_id.clone());

    // Only admins and HR may read someone else's attendance
    if user_id != caller.user_id && !matches!(caller.role, Role::Admin | Role::Hr) {
        return Err(ApiError::new(
            axum::http::StatusCode::FORBIDDEN,
            "cannot list another user's attendance",
        ));
    }

    let year = params.year.unwrap_or_else(|| now.year());
    let month = params.month.unwrap_or_else(|| now.month());
    if !(1..=12).contains(&month) {
        return Err(ApiError::bad_request("month must be 1-12"));
    }

    let repo = AttendanceRepository::new(&state.datastore);
    let records = repo.list_by_user_month(&user_id, year, month)?;
    Ok(Json(Envelope::new(records)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedUser;
    use crate::state::test_support::test_state;

    fn staff(user_id: &str) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: user_id.to_string(),
            username: user_id.to_string(),
            role: Role::Staff,
            expires_at: 0,
        }
    }

    fn hr() -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: "hr-1".to_string(),
            username: "hr".to_string(),
            role: Role::Hr,
            expires_at: 0,
        }
    }

    #[tokio::test]
    async fn check_in_once_per_day() {
        let (state, _tmp) = test_state();

        let (status, Json(envelope)) = check_in(
            Auth(staff("u-1")),
            State(state.clone()),
            Json(CheckInRequest::default()),
        )
        .await
        .expect("first check-in succeeds");
        assert_eq!(status, StatusCode::CREATED);
        assert!(envelope.data.check_out.is_none());

        let result = check_in(
            Auth(staff("u-1")),
            State(state),
            Json(CheckInRequest::default()),
        )
        .await;
        let err = result.err().expect("second check-in fails");
        assert_eq!(err.status, axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn check_out_requires_check_in() {
        let (state, _tmp) = test_state();

        let result = check_out(Auth(staff("u-1")), State(state.clone())).await;
        assert!(result.is_err());

        check_in(
            Auth(staff("u-1")),
            State(state.clone()),
            Json(CheckInRequest::default()),
        )
        .await
        .unwrap();

        let Json(envelope) = check_out(Auth(staff("u-1")), State(state.clone()))
            .await
            .expect("check-out succeeds");
        assert!(envelope.data.check_out.is_some());

        // Second check-out conflicts
        let result = check_out(Auth(staff("u-1")), State(state)).await;
        let err = result.err().expect("second check-out fails");
        assert_eq!(err.status, axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn staff_cannot_list_other_users() {
        let (state, _tmp) = test_state();

        let result = list_attendance(
            Auth(staff("u-1")),
            State(state.clone()),
            Query(AttendanceQuery {
                user_id: Some("u-2".to_string()),
                year: None,
                month: None,
            }),
        )
        .await;
        let err = result.err().expect("listing another user fails");
        assert_eq!(err.status, axum::http::StatusCode::FORBIDDEN);

        // HR can
        let result = list_attendance(
            Auth(hr()),
            State(state),
            Query(AttendanceQuery {
                user_id: Some("u-2".to_string()),
                year: None,
                month: None,
            }),
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn listing_defaults_to_caller_and_current_month() {
        let (state, _tmp) = test_state();
        check_in(
            Auth(staff("u-1")),
            State(state.clone()),
            Json(CheckInRequest {
                note: Some("field work".to_string()),
            }),
        )
        .await
        .unwrap();

        let Json(envelope) = list_attendance(
            Auth(staff("u-1")),
            State(state),
            Query(AttendanceQuery {
                user_id: None,
                year: None,
                month: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(envelope.data.len(), 1);
        assert_eq!(envelope.data[0].note.as_deref(), Some("field work"));
    }
}
