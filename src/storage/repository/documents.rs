// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Document repository: invoices, letters, assignment letters, certificates.
//!
//! Invoices, letters and assignment letters are also pushed to the external
//! administration backend when it is configured; `remote_ref` holds the id
//! the backend returned.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{Datastore, StorageError, StorageResult};

/// Kinds of managed documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Customer invoice
    Invoice,
    /// Official letter
    Letter,
    /// Assignment letter for field work
    AssignmentLetter,
    /// Employee or training certificate (local only)
    Certificate,
}

impl DocumentKind {
    /// Whether this kind is mirrored to the administration backend.
    pub fn pushes_to_administration(&self) -> bool {
        !matches!(self, DocumentKind::Certificate)
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Invoice => write!(f, "invoice"),
            DocumentKind::Letter => write!(f, "letter"),
            DocumentKind::AssignmentLetter => write!(f, "assignment_letter"),
            DocumentKind::Certificate => write!(f, "certificate"),
        }
    }
}

/// Document record persisted in the datastore.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredDocument {
    /// Unique document identifier (UUID)
    pub document_id: String,
    /// Document kind
    pub kind: DocumentKind,
    /// Human-assigned document number
    pub number: String,
    /// Subject line
    pub subject: String,
    /// Recipient (customer, employee, agency)
    pub recipient: String,
    /// Kind-specific body fields
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
    /// The date printed on the document
    pub issued_on: NaiveDate,
    /// User who created the document
    pub created_by: String,
    /// ID assigned by the administration backend, when pushed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_ref: Option<String>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
}

impl StoredDocument {
    /// Create a new document record.
    pub fn new(
        kind: DocumentKind,
        number: String,
        subject: String,
        recipient: String,
        payload: serde_json::Value,
        issued_on: NaiveDate,
        created_by: String,
    ) -> Self {
        Self {
            document_id: uuid::Uuid::new_v4().to_string(),
            kind,
            number,
            subject,
            recipient,
            payload,
            issued_on,
            created_by,
            remote_ref: None,
            created_at: Utc::now(),
        }
    }
}

/// Repository for document records.
pub struct DocumentRepository<'a> {
    datastore: &'a Datastore,
}

impl<'a> DocumentRepository<'a> {
    /// Create a new DocumentRepository.
    pub fn new(datastore: &'a Datastore) -> Self {
        Self { datastore }
    }

    /// Get a document by ID.
    pub fn get(&self, document_id: &str) -> StorageResult<StoredDocument> {
        let path = self.datastore.paths().document(document_id);
        if !self.datastore.exists(&path) {
            return Err(StorageError::NotFound(format!("Document {document_id}")));
        }
        self.datastore.read_json(path)
    }

    /// Persist a document (create or update, e.g. to set `remote_ref`).
    pub fn save(&self, document: &StoredDocument) -> StorageResult<()> {
        self.datastore.write_json(
            self.datastore.paths().document(&document.document_id),
            document,
        )
    }

    /// List all documents, newest issued first.
    pub fn list_all(&self) -> StorageResult<Vec<StoredDocument>> {
        let ids = self
            .datastore
            .list_files(self.datastore.paths().documents_dir(), "json")?;

        let mut documents = Vec::new();
        for id in &ids {
            if let Ok(document) = self.get(id) {
                documents.push(document);
            }
        }
        documents.sort_by(|a, b| b.issued_on.cmp(&a.issued_on));
        Ok(documents)
    }

    /// List documents of one kind.
    pub fn list_by_kind(&self, kind: DocumentKind) -> StorageResult<Vec<StoredDocument>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|d| d.kind == kind)
            .collect())
    }
}
