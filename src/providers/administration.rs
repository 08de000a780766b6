// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Administration backend client.
//!
//! Invoices, letters and assignment letters are mirrored to a separate
//! administration service. Requests authenticate with an `x-api-key` header
//! and carry the document as JSON; the backend answers with the id it
//! assigned.

use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};

use super::{env_optional, required_env_present};
use crate::config::{ADMIN_API_BASE_URL_ENV, ADMIN_API_KEY_ENV};
use crate::storage::{DocumentKind, StoredDocument};

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, thiserror::Error)]
pub enum AdministrationError {
    #[error("administration configuration missing: {0}")]
    MissingConfig(String),

    #[error("administration request failed: {0}")]
    Request(String),

    #[error("administration response was invalid: {0}")]
    InvalidResponse(String),

    #[error("document kind {0} is not pushed to administration")]
    UnsupportedKind(String),
}

/// Administration backend REST client.
#[derive(Debug, Clone)]
pub struct AdministrationClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl AdministrationClient {
    /// Whether the environment carries a complete backend configuration.
    pub fn is_configured() -> bool {
        required_env_present(ADMIN_API_BASE_URL_ENV) && required_env_present(ADMIN_API_KEY_ENV)
    }

    /// Build a client from the environment.
    pub fn from_env() -> Result<Self, AdministrationError> {
        let base_url = env_optional(ADMIN_API_BASE_URL_ENV)
            .ok_or_else(|| AdministrationError::MissingConfig(ADMIN_API_BASE_URL_ENV.to_string()))?;
        let api_key = env_optional(ADMIN_API_KEY_ENV)
            .ok_or_else(|| AdministrationError::MissingConfig(ADMIN_API_KEY_ENV.to_string()))?;
        Self::new(base_url, api_key)
    }

    /// Build a client from explicit configuration.
    pub fn new(base_url: String, api_key: String) -> Result<Self, AdministrationError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| AdministrationError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            http,
        })
    }

    /// Push a document to the backend and return the id it assigned.
    pub async fn push_document(
        &self,
        document: &StoredDocument,
    ) -> Result<String, AdministrationError> {
        let path = kind_path(document.kind)?;
        let url = format!("{}/api/{path}", self.base_url);

        let payload = json!({
            "number": document.number,
            "subject": document.subject,
            "recipient": document.recipient,
            "issued_on": document.issued_on,
            "payload": document.payload,
            "source": "ichibot",
            "source_id": document.document_id,
        });

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AdministrationError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdministrationError::Request(format!(
                "backend returned {status}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AdministrationError::InvalidResponse(e.to_string()))?;

        body.get("id")
            .and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| {
                AdministrationError::InvalidResponse("missing id in response".to_string())
            })
    }
}

/// The backend collection for a document kind.
fn kind_path(kind: DocumentKind) -> Result<&'static str, AdministrationError> {
    match kind {
        DocumentKind::Invoice => Ok("invoices"),
        DocumentKind::Letter => Ok("letters"),
        DocumentKind::AssignmentLetter => Ok("assignment-letters"),
        DocumentKind::Certificate => {
            Err(AdministrationError::UnsupportedKind(kind.to_string()))
        }
    }
}
