// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Path constants and utilities for the datastore layout.

use std::path::{Path, PathBuf};

/// Default base directory for persistent storage.
pub const DATA_ROOT: &str = "data";

/// Storage path utilities for the data directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all persistent data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== User Paths ==========

    /// Directory containing all user records.
    pub fn users_dir(&self) -> PathBuf {
        self.root.join("users")
    }

    /// Path to a specific user record.
    pub fn user(&self, user_id: &str) -> PathBuf {
        self.users_dir().join(format!("{user_id}.json"))
    }

    // ========== Attendance Paths ==========

    /// Directory containing all attendance records.
    pub fn attendance_dir(&self) -> PathBuf {
        self.root.join("attendance")
    }

    /// Path to the attendance record of a user on a date (YYYY-MM-DD).
    pub fn attendance_record(&self, user_id: &str, date: &str) -> PathBuf {
        self.attendance_dir().join(format!("{user_id}_{date}.json"))
    }

    // ========== Payroll Paths ==========

    /// Directory containing all payslips.
    pub fn payroll_dir(&self) -> PathBuf {
        self.root.join("payroll")
    }

    /// Path to a specific payslip.
    pub fn payslip(&self, payslip_id: &str) -> PathBuf {
        self.payroll_dir().join(format!("{payslip_id}.json"))
    }

    // ========== Expense Paths ==========

    /// Directory containing all expense records.
    pub fn expenses_dir(&self) -> PathBuf {
        self.root.join("expenses")
    }

    /// Path to a specific expense record.
    pub fn expense(&self, expense_id: &str) -> PathBuf {
        self.expenses_dir().join(format!("{expense_id}.json"))
    }

    // ========== Document Paths ==========

    /// Directory containing all managed documents.
    pub fn documents_dir(&self) -> PathBuf {
        self.root.join("documents")
    }

    /// Path to a specific document record.
    pub fn document(&self, document_id: &str) -> PathBuf {
        self.documents_dir().join(format!("{document_id}.json"))
    }

    // ========== Project Paths ==========

    /// Directory containing all project records.
    pub fn projects_dir(&self) -> PathBuf {
        self.root.join("projects")
    }

    /// Path to a specific project record.
    pub fn project(&self, project_id: &str) -> PathBuf {
        self.projects_dir().join(format!("{project_id}.json"))
    }

    // ========== Config Paths ==========

    /// Directory for runtime configuration blobs.
    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    /// Path to the encrypted route-access override blob.
    pub fn route_access_file(&self) -> PathBuf {
        self.config_dir().join("route_access.enc")
    }

    // ========== Operations Database ==========

    /// Path to the embedded operations database file.
    pub fn ops_db_file(&self) -> PathBuf {
        self.root.join("ops.redb")
    }

    // ========== Audit Log Paths ==========

    /// Directory containing audit logs.
    pub fn audit_dir(&self) -> PathBuf {
        self.root.join("audit")
    }

    /// Path to a specific date's audit events file (JSONL).
    pub fn audit_events_file(&self, date: &str) -> PathBuf {
        self.audit_dir().join(format!("{date}.jsonl"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_rooted() {
        let paths = StoragePaths::new("/tmp/ichibot-test");
        assert_eq!(paths.users_dir(), Path::new("/tmp/ichibot-test/users"));
        assert_eq!(
            paths.user("u-1"),
            Path::new("/tmp/ichibot-test/users/u-1.json")
        );
        assert_eq!(
            paths.attendance_record("u-1", "2026-08-05"),
            Path::new("/tmp/ichibot-test/attendance/u-1_2026-08-05.json")
        );
        assert_eq!(
            paths.audit_events_file("2026-08-05"),
            Path::new("/tmp/ichibot-test/audit/2026-08-05.jsonl")
        );
        assert_eq!(
            paths.ops_db_file(),
            Path::new("/tmp/ichibot-test/ops.redb")
        );
    }
}
