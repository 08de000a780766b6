// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Project endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    audit_log,
    auth::Auth,
    error::{ApiError, Envelope},
    state::AppState,
    storage::{AuditEventType, ProjectRepository, ProjectStatus, StoredProject},
};

/// Request body for creating a project.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    /// Project name
    pub name: String,
    /// Client the project is for
    pub client: String,
    /// Planned start date; defaults to today
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request body for updating a project. Absent fields stay unchanged.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateProjectRequest {
    /// New name
    #[serde(default)]
    pub name: Option<String>,
    /// New client
    #[serde(default)]
    pub client: Option<String>,
    /// New status name (active, on_hold, done)
    #[serde(default)]
    pub status: Option<String>,
    /// New end date
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// New notes
    #[serde(default)]
    pub notes: Option<String>,
}

fn parse_status(raw: &str) -> Result<ProjectStatus, ApiError> {
    match raw {
        "active" => Ok(ProjectStatus::Active),
        "on_hold" => Ok(ProjectStatus::OnHold),
        "done" => Ok(ProjectStatus::Done),
        other => Err(ApiError::bad_request(format!("unknown status: {other}"))),
    }
}

#[utoipa::path(
    get,
    path = "/v1/projects",
    tag = "Projects",
    responses((status = 200, body = [StoredProject]))
)]
pub async fn list_projects(
    Auth(_caller): Auth,
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<StoredProject>>>, ApiError> {
    let projects = ProjectRepository::new(&state.datastore).list_all()?;
    Ok(Json(Envelope::new(projects)))
}

#[utoipa::path(
    get,
    path = "/v1/projects/{project_id}",
    params(("project_id" = String, Path, description = "Project to fetch")),
    tag = "Projects",
    responses((status = 200, body = StoredProject), (status = 404))
)]
pub async fn get_project(
    Auth(_caller): Auth,
    Path(project_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Envelope<StoredProject>>, ApiError> {
    let project = ProjectRepository::new(&state.datastore).get(&project_id)?;
    Ok(Json(Envelope::new(project)))
}

#[utoipa::path(
    post,
    path = "/v1/projects",
    request_body = CreateProjectRequest,
    tag = "Projects",
    responses((status = 201, body = StoredProject))
)]
pub async fn create_project(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Envelope<StoredProject>>), ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }

    let mut project = StoredProject::new(
        request.name.trim().to_string(),
        request.client,
        request.start_date.unwrap_or_else(|| Utc::now().date_naive()),
    );
    project.notes = request.notes;

    ProjectRepository::new(&state.datastore).create(&project)?;
    audit_log!(
        &state.datastore,
        AuditEventType::ProjectCreated,
        &caller,
        "project",
        &project.project_id
    );

    Ok((StatusCode::CREATED, Json(Envelope::new(project))))
}

#[utoipa::path(
    put,
    path = "/v1/projects/{project_id}",
    params(("project_id" = String, Path, description = "Project to update")),
    request_body = UpdateProjectRequest,
    tag = "Projects",
    responses((status = 200, body = StoredProject), (status = 404))
)]
pub async fn update_project(
    Auth(caller): Auth,
    Path(project_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<UpdateProjectRequest>,
) -> Result<Json<Envelope<StoredProject>>, ApiError> {
    let repo = ProjectRepository::new(&state.datastore);
    let mut project = repo.get(&project_id)?;

    if let Some(name) = request.name {
        project.name = name;
    }
    if let Some(client) = request.client {
        project.client = client;
    }
    if let Some(status) = request.status {
        project.status = parse_status(&status)?;
    }
    if let Some(end_date) = request.end_date {
        project.end_date = Some(end_date);
    }
    if let Some(notes) = request.notes {
        project.notes = Some(notes);
    }
    project.updated_at = Utc::now();

    repo.update(&project)?;
    audit_log!(
        &state.datastore,
        AuditEventType::ProjectUpdated,
        &caller,
        "project",
        &project_id
    );

    Ok(Json(Envelope::new(project)))
}

#[utoipa::path(
    delete,
    path = "/v1/projects/{project_id}",
    params(("project_id" = String, Path, description = "Project to delete")),
    tag = "Projects",
    responses((status = 204), (status = 404))
)]
pub async fn delete_project(
    Auth(caller): Auth,
    Path(project_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    ProjectRepository::new(&state.datastore).delete(&project_id)?;
    audit_log!(
        &state.datastore,
        AuditEventType::ProjectDeleted,
        &caller,
        "project",
        &project_id
    );
    Ok(StatusCode::NO_CONTENT)
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

    #[tokio::test]
    async fn crud_round_trip() {
        let (state, _tmp) = test_state();

        let (status, Json(created)) = create_project(
            Auth(manager()),
            State(state.clone()),
            Json(CreateProjectRequest {
                name: "Warehouse rollout".to_string(),
                client: "PT Example".to_string(),
                start_date: NaiveDate::from_ymd_opt(2026, 8, 1),
                notes: None,
            }),
        )
        .await
        .expect("creation succeeds");
        assert_eq!(status, StatusCode::CREATED);
        let project_id = created.data.project_id.clone();

        let Json(updated) = update_project(
            Auth(manager()),
            Path(project_id.clone()),
            State(state.clone()),
            Json(UpdateProjectRequest {
                name: None,
                client: None,
                status: Some("done".to_string()),
                end_date: NaiveDate::from_ymd_opt(2026, 9, 1),
                notes: Some("delivered".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.data.status, ProjectStatus::Done);
        assert!(updated.data.end_date.is_some());

        let Json(listed) = list_projects(Auth(manager()), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(listed.data.len(), 1);

        let status = delete_project(Auth(manager()), Path(project_id.clone()), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let result = get_project(Auth(manager()), Path(project_id), State(state)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn update_rejects_unknown_status() {
        let (state, _tmp) = test_state();
        let (_, Json(created)) = create_project(
            Auth(manager()),
            State(state.clone()),
            Json(CreateProjectRequest {
                name: "A".to_string(),
                client: "B".to_string(),
                start_date: None,
                notes: None,
            }),
        )
        .await
        .unwrap();

        let result = update_project(
            Auth(manager()),
            Path(created.data.project_id),
            State(state),
            Json(UpdateProjectRequest {
                name: None,
                client: None,
                status: Some("paused".to_string()),
                end_date: None,
                notes: None,
            }),
        )
        .await;
        assert!(result.is_err());
    }
}
