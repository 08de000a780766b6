// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! # Storage Module
//!
//! Two persistence layers share the data directory:
//!
//! - The [`Datastore`]: one JSON file per record for the soft entities
//!   (users, attendance, payroll, expenses, documents, projects, config
//!   blobs, audit logs), written atomically.
//! - The [`OpsDatabase`]: embedded redb tables for everything that needs
//!   multi-statement transactions (products, stock ledger, orders, the
//!   storefront mirror, sync checkpoints).
//!
//! ## Storage Layout
//!
//! ```text
//! data/
//!   users/{user_id}.json
//!   attendance/{user_id}_{date}.json
//!   payroll/{payslip_id}.json
//!   expenses/{expense_id}.json
//!   documents/{document_id}.json
//!   projects/{project_id}.json
//!   config/route_access.enc     # Encrypted RBAC override blob
//!   audit/{date}.jsonl          # Daily audit logs
//!   ops.redb                    # Embedded operations database
//! ```

pub mod audit;
pub mod catalog;
pub mod datastore;
pub mod mirror_cache;
pub mod ops_db;
pub mod paths;
pub mod repository;

pub use audit::{AuditEvent, AuditEventType, AuditRepository};
pub use catalog::{
    OrderLine, StockEntry, StockReason, StoredOrder, StoredProduct, StoredStoreProduct,
};
pub use datastore::{Datastore, StorageError, StorageResult};
pub use mirror_cache::MirrorCache;
pub use ops_db::{OpsDatabase, OpsDbError, OpsDbResult};
pub use paths::StoragePaths;
pub use repository::{
    compute_pay, parse_period, scheduled_work_days, AttendanceRepository, DocumentKind,
    DocumentRepository, ExpenseRepository, ExpenseSummary, PayBreakdown, PayrollRepository,
    PayslipStatus, ProjectRepository, ProjectStatus, StoredAttendance, StoredDocument,
    StoredExpense, StoredPayslip, StoredProject, StoredUser, UserRepository, UserResponse,
    UserStatus, Workday,
};
