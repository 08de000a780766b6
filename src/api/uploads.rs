// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! File endpoints: multipart upload and path-guarded download.
//!
//! Uploads land in the configured upload directory under a generated name
//! (`{uuid}_{original}`); downloads refuse anything that could escape that
//! directory.

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    audit_log,
    auth::Auth,
    error::{ApiError, Envelope},
    state::AppState,
    storage::AuditEventType,
};

/// Upload size cap (10 MiB).
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Response for a stored upload.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    /// Name to request the file back under
    pub file_name: String,
    /// Stored size in bytes
    pub size: usize,
}

/// Reject names that could address anything outside the upload directory.
///
/// Route matching already keeps `/` out of the segment; this also refuses
/// backslashes, parent references and hidden/empty names.
fn guard_file_name(name: &str) -> Result<(), ApiError> {
    let suspicious = name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.starts_with('.');
    if suspicious {
        return Err(ApiError::bad_request("invalid file name"));
    }
    Ok(())
}

/// Strip any client-supplied path components from an original file name.
fn sanitize_original_name(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("upload")
        .trim_start_matches('.');
    if base.is_empty() {
        "upload".to_string()
    } else {
        base.to_string()
    }
}

#[utoipa::path(
    post,
    path = "/v1/files",
    tag = "Files",
    responses(
        (status = 201, body = UploadResponse),
        (status = 400, description = "No file field or file too large")
    )
)]
pub async fn upload_file(
    Auth(caller): Auth,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Envelope<UploadResponse>>), ApiError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))?
        .ok_or_else(|| ApiError::bad_request("missing file field"))?;

    let original = sanitize_original_name(field.file_name().unwrap_or("upload"));
    let data = field
        .bytes()
        .await
        .map_err(|e| ApiError::bad_request(format!("failed to read upload: {e}")))?;

    if data.is_empty() {
        return Err(ApiError::bad_request("uploaded file is empty"));
    }
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::bad_request("uploaded file is too large"));
    }

    let file_name = format!("{}_{original}", uuid::Uuid::new_v4());
    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(|e| ApiError::internal(format!("upload dir unavailable: {e}")))?;
    tokio::fs::write(state.upload_dir.join(&file_name), &data)
        .await
        .map_err(|e| ApiError::internal(format!("failed to store upload: {e}")))?;

    audit_log!(
        &state.datastore,
        AuditEventType::FileUploaded,
        &caller,
        "file",
        &file_name
    );

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(UploadResponse {
            file_name,
            size: data.len(),
        })),
    ))
}

#[utoipa::path(
    get,
    path = "/v1/files/{name}",
    params(("name" = String, Path, description = "Stored file name")),
    tag = "Files",
    responses(
        (status = 200, description = "The file bytes"),
        (status = 400, description = "Invalid file name"),
        (status = 404)
    )
)]
pub async fn download_file(
    Auth(_caller): Auth,
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    guard_file_name(&name)?;

    let path = state.upload_dir.join(&name);
    // Serve regular files only; anything else in the directory is not ours
    if !path.is_file() {
        return Err(ApiError::not_found(format!("file {name}")));
    }

    let data = tokio::fs::read(&path)
        .await
        .map_err(|e| ApiError::internal(format!("failed to read file: {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/octet-stream"),
    );
    if let Ok(value) =
        header::HeaderValue::from_str(&format!("attachment; filename=\"{name}\""))
    {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok((headers, Body::from(data)))
}
