// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Document endpoints: invoices, letters, assignment letters, certificates.
//!
//! Creating a pushable document also mirrors it to the administration
//! backend when that is configured; a failed push is logged and the document
//! stays local (`remote_ref` absent).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::warn;
use utoipa::{IntoParams, ToSchema};

use crate::{
    audit_log,
    auth::Auth,
    error::{ApiError, Envelope},
    state::AppState,
    storage::{AuditEventType, DocumentKind, DocumentRepository, StoredDocument},
};

/// Request body for creating a document.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateDocumentRequest {
    /// Document kind name (invoice, letter, assignment_letter, certificate)
    pub kind: String,
    /// Human-assigned document number
    pub number: String,
    /// Subject line
    pub subject: String,
    /// Recipient (customer, employee, agency)
    pub recipient: String,
    /// Kind-specific body fields
    #[serde(default)]
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
    /// The date printed on the document; defaults to today
    #[serde(default)]
    pub issued_on: Option<NaiveDate>,
}

/// Query params for document listing.
#[derive(Debug, Deserialize, IntoParams)]
pub struct DocumentsQuery {
    /// Filter by kind name
    pub kind: Option<String>,
}

fn parse_kind(raw: &str) -> Result<DocumentKind, ApiError> {
    match raw {
        "invoice" => Ok(DocumentKind::Invoice),
        "letter" => Ok(DocumentKind::Letter),
        "assignment_letter" => Ok(DocumentKind::AssignmentLetter),
        "certificate" => Ok(DocumentKind::Certificate),
        other => Err(ApiError::bad_request(format!("unknown document kind: {other}"))),
    }
}

#[utoipa::path(
    post,
    path = "/v1/documents",
    request_body = CreateDocumentRequest,
    tag = "Documents",
    responses((status = 201, body = StoredDocument))
)]
pub async fn create_document(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<Envelope<StoredDocument>>), ApiError> {
    let kind = parse_kind(&request.kind)?;
    if request.number.trim().is_empty() {
        return Err(ApiError::bad_request("number must not be empty"));
    }

    let mut document = StoredDocument::new(
        kind,
        request.number.trim().to_string(),
        request.subject,
        request.recipient,
        request.payload,
        request.issued_on.unwrap_or_else(|| Utc::now().date_naive()),
        caller.user_id.clone(),
    );

    let repo = DocumentRepository::new(&state.datastore);
    repo.save(&document)?;
    audit_log!(
        &state.datastore,
        AuditEventType::DocumentCreated,
        &caller,
        "document",
        &document.document_id
    );

    // Mirror to the administration backend; failures are logged, never fatal
    if kind.pushes_to_administration() {
        if let Some(ref administration) = state.administration {
            match administration.push_document(&document).await {
                Ok(remote_ref) => {
                    document.remote_ref = Some(remote_ref);
                    repo.save(&document)?;
                    audit_log!(
                        &state.datastore,
                        AuditEventType::DocumentPushed,
                        &caller,
                        "document",
                        &document.document_id
                    );
                }
                Err(e) => {
                    warn!(
                        document_id = %document.document_id,
                        error = %e,
                        "Administration push failed; document kept local"
                    );
                }
            }
        }
    }

    Ok((StatusCode::CREATED, Json(Envelope::new(document))))
}

#[utoipa::path(
    get,
    path = "/v1/documents",
    params(DocumentsQuery),
    tag = "Documents",
    responses((status = 200, body = [StoredDocument]))
)]
pub async fn list_documents(
    Auth(_caller): Auth,
    State(state): State<AppState>,
    Query(params): Query<DocumentsQuery>,
) -> Result<Json<Envelope<Vec<StoredDocument>>>, ApiError> {
    let repo = DocumentRepository::new(&state.datastore);
    let documents = match params.kind {
        Some(ref raw) => repo.list_by_kind(parse_kind(raw)?)?,
        None => repo.list_all()?,
    };
    Ok(Json(Envelope::new(documents)))
}

#[utoipa::path(
    get,
    path = "/v1/documents/{document_id}",
    params(("document_id" = String, Path, description = "Document to fetch")),
    tag = "Documents",
    responses((status = 200, body = StoredDocument), (status = 404))
)]
pub async fn get_document(
    Auth(_caller): Auth,
    Path(document_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Envelope<StoredDocument>>, ApiError> {
    let document = DocumentRepository::new(&state.datastore).get(&document_id)?;
    Ok(Json(Envelope::new(document)))
}
