// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Audit logging for security-sensitive operations.
//!
//! Logins, user management, stock movements, payroll actions and
//! administrative changes are logged to daily JSONL files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Datastore, StorageResult};

/// Types of auditable events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    // Auth events
    LoginSuccess,
    LoginFailure,
    PermissionDenied,

    // User events
    UserCreated,
    UserUpdated,
    UserDeleted,

    // Inventory events
    ProductCreated,
    ProductUpdated,
    StockAdjusted,

    // Point-of-sale events
    SaleRecorded,

    // HR events
    AttendanceCheckIn,
    AttendanceCheckOut,
    PayslipGenerated,
    PayslipFinalized,

    // Finance events
    ExpenseCreated,
    ExpenseDeleted,

    // Document events
    DocumentCreated,
    DocumentPushed,

    // Project events
    ProjectCreated,
    ProjectUpdated,
    ProjectDeleted,

    // Storefront sync events
    StoreSyncStarted,
    StoreSyncCompleted,

    // File events
    FileUploaded,

    // Admin events
    RouteAccessChanged,
    AdminAccess,
}

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Type of event.
    pub event_type: AuditEventType,
    /// User who triggered the event (if known).
    pub user_id: Option<String>,
    /// Resource affected (product_id, payslip_id, etc.).
    pub resource_id: Option<String>,
    /// Resource type (product, payslip, etc.).
    pub resource_type: Option<String>,
    /// Additional details as JSON.
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error message if operation failed.
    pub error: Option<String>,
}

impl AuditEvent {
    /// Create a new audit event.
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            user_id: None,
            resource_id: None,
            resource_type: None,
            details: None,
            success: true,
            error: None,
        }
    }

    /// Set the user ID.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the resource.
    pub fn with_resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Add details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Mark as failed with error message.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }
}

/// Repository for audit events.
pub struct AuditRepository<'a> {
    datastore: &'a Datastore,
}

impl<'a> AuditRepository<'a> {
    /// Create a new audit repository.
    pub fn new(datastore: &'a Datastore) -> Self {
        Self { datastore }
    }

    /// Log an audit event.
    ///
    /// Events are appended to a daily log file in JSONL format.
    pub fn log(&self, event: &AuditEvent) -> StorageResult<()> {
        let date = event.timestamp.format("%Y-%m-%d").to_string();
        let path = self.datastore.paths().audit_events_file(&date);

        let mut content = self.datastore.read_raw(&path).unwrap_or_default();

        let event_json = serde_json::to_string(event).map_err(|e| {
            super::StorageError::SerializationError(format!(
                "Failed to serialize audit event: {e}"
            ))
        })?;

        if !content.is_empty() && !content.ends_with(b"\n") {
            content.push(b'\n');
        }
        content.extend_from_slice(event_json.as_bytes());
        content.push(b'\n');

        self.datastore.write_raw(&path, &content)
    }

    /// Read audit events for a specific date.
    pub fn read_events(&self, date: &str) -> StorageResult<Vec<AuditEvent>> {
        let path = self.datastore.paths().audit_events_file(date);
        let content = self.datastore.read_raw(&path)?;

        let content_str = String::from_utf8(content).map_err(|e| {
            super::StorageError::SerializationError(format!("Invalid UTF-8 in audit log: {e}"))
        })?;

        let mut events = Vec::new();
        for line in content_str.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let event: AuditEvent = serde_json::from_str(line).map_err(|e| {
                super::StorageError::SerializationError(format!(
                    "Failed to deserialize audit event: {e}"
                ))
            })?;
            events.push(event);
        }

        Ok(events)
    }

    /// Read events for a date range (inclusive).
    pub fn read_events_range(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> StorageResult<Vec<AuditEvent>> {
        use chrono::NaiveDate;

        let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").map_err(|e| {
            super::StorageError::SerializationError(format!("Invalid start date: {e}"))
        })?;

        let end = NaiveDate::parse_from_str(end_date, "%Y-%m-%d").map_err(|e| {
            super::StorageError::SerializationError(format!("Invalid end date: {e}"))
        })?;

        let mut all_events = Vec::new();
        let mut current = start;

        while current <= end {
            let date_str = current.format("%Y-%m-%d").to_string();
            if let Ok(events) = self.read_events(&date_str) {
                all_events.extend(events);
            }
            current = current.succ_opt().ok_or_else(|| {
                super::StorageError::SerializationError("Date overflow".to_string())
            })?;
        }

        Ok(all_events)
    }
}

/// Helper macro for logging audit events.
#[macro_export]
macro_rules! audit_log {
    ($datastore:expr, $event_type:expr, $user:expr) => {{
        let repo = $crate::storage::AuditRepository::new($datastore);
        let event = $crate::storage::AuditEvent::new($event_type).with_user(&$user.user_id);
        let _ = repo.log(&event);
    }};
    ($datastore:expr, $event_type:expr, $user:expr, $resource_type:expr, $resource_id:expr) => {{
        let repo = $crate::storage::AuditRepository::new($datastore);
        let event = $crate::storage::AuditEvent::new($event_type)
            .with_user(&$user.user_id)
            .with_resource($resource_type, $resource_id);
        let _ = repo.log(&event);
    }};
}
