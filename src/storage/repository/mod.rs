// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Repository layer providing typed access to the datastore.
//!
//! Each repository provides CRUD operations for a specific entity type,
//! using the Datastore for all file operations.

pub mod attendance;
pub mod documents;
pub mod expenses;
pub mod payroll;
pub mod projects;
pub mod users;

pub use attendance::{AttendanceRepository, StoredAttendance, Workday};
pub use documents::{DocumentKind, DocumentRepository, StoredDocument};
pub use expenses::{ExpenseRepository, ExpenseSummary, StoredExpense};
pub use payroll::{
    compute_pay, parse_period, scheduled_work_days, PayBreakdown, PayrollRepository,
    PayslipStatus, StoredPayslip,
};
pub use projects::{ProjectRepository, ProjectStatus, StoredProject};
pub use users::{StoredUser, UserRepository, UserResponse, UserStatus};
