// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::storage::{OpsDbError, StorageError};

/// Error returned from API handlers.
///
/// Renders as `{"success": false, "error": "..."}` with the carried status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

/// Success envelope wrapping handler response data.
///
/// All internal endpoints respond with `{"success": true, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            success: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(entity) => Self::not_found(format!("Not found: {entity}")),
            StorageError::AlreadyExists(entity) => {
                Self::conflict(format!("Already exists: {entity}"))
            }
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<OpsDbError> for ApiError {
    fn from(e: OpsDbError) -> Self {
        match e {
            OpsDbError::NotFound(entity) => Self::not_found(format!("Not found: {entity}")),
            OpsDbError::DuplicateSku(sku) => Self::conflict(format!("SKU already in use: {sku}")),
            OpsDbError::InsufficientStock {
                product_id,
                available,
                requested,
            } => Self::unprocessable(format!(
                "Insufficient stock for product {product_id}: {available} available, {requested} requested"
            )),
            other => Self::internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.message, "bad");

        let unp = ApiError::unprocessable("oops");
        assert_eq!(unp.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(unp.message, "oops");

        let conflict = ApiError::conflict("dup");
        assert_eq!(conflict.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn into_response_returns_envelope_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"success":false,"error":"bad data"}"#);
    }

    #[test]
    fn envelope_wraps_data() {
        let envelope = Envelope::new(vec![1, 2, 3]);
        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(json, r#"{"success":true,"data":[1,2,3]}"#);
    }

    #[test]
    fn storage_not_found_maps_to_404() {
        let err: ApiError = StorageError::NotFound("user u-1".to_string()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn insufficient_stock_maps_to_422() {
        let err: ApiError = OpsDbError::InsufficientStock {
            product_id: "p-1".to_string(),
            available: 2,
            requested: 5,
        }
        .into();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.message.contains("p-1"));
    }
}
