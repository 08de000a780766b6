// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Attendance repository and workday time arithmetic.
//!
//! One record per user per day, keyed by `{user_id}_{date}`. Late minutes
//! are measured against the configured workday start; work and overtime
//! minutes come from the check-in/check-out pair.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use super::super::{Datastore, StorageError, StorageResult};
use crate::config::{
    DEFAULT_WORKDAY_MINUTES, DEFAULT_WORKDAY_START, WORKDAY_MINUTES_ENV, WORKDAY_START_ENV,
};

/// Configured workday used for late/overtime arithmetic.
#[derive(Debug, Clone, Copy)]
pub struct Workday {
    /// Scheduled start of the workday
    pub start: NaiveTime,
    /// Scheduled minutes per workday
    pub scheduled_minutes: u32,
}

impl Default for Workday {
    fn default() -> Self {
        Self {
            start: NaiveTime::parse_from_str(DEFAULT_WORKDAY_START, "%H:%M")
                .expect("default workday start parses"),
            scheduled_minutes: DEFAULT_WORKDAY_MINUTES,
        }
    }
}

impl Workday {
    /// Load from `WORKDAY_START` / `WORKDAY_MINUTES`, falling back to the
    /// defaults on missing or malformed values.
    pub fn from_env() -> Self {
        let mut workday = Self::default();

        if let Ok(raw) = std::env::var(WORKDAY_START_ENV) {
            match NaiveTime::parse_from_str(&raw, "%H:%M") {
                Ok(start) => workday.start = start,
                Err(_) => warn!(value = %raw, "Ignoring malformed WORKDAY_START"),
            }
        }
        if let Ok(raw) = std::env::var(WORKDAY_MINUTES_ENV) {
            match raw.parse::<u32>() {
                Ok(minutes) if minutes > 0 => workday.scheduled_minutes = minutes,
                _ => warn!(value = %raw, "Ignoring malformed WORKDAY_MINUTES"),
            }
        }
        workday
    }
}

/// Minutes a check-in is past the workday start (zero when on time).
pub fn late_minutes(check_in: NaiveTime, workday_start: NaiveTime) -> u32 {
    if check_in <= workday_start {
        return 0;
    }
    (check_in - workday_start).num_minutes().max(0) as u32
}

/// Minutes between check-in and check-out (zero when out before in).
pub fn work_minutes(check_in: NaiveTime, check_out: NaiveTime) -> u32 {
    if check_out <= check_in {
        return 0;
    }
    (check_out - check_in).num_minutes().max(0) as u32
}

/// Minutes worked beyond the scheduled workday.
pub fn overtime_minutes(worked: u32, scheduled: u32) -> u32 {
    worked.saturating_sub(scheduled)
}

/// Attendance record persisted in the datastore.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredAttendance {
    /// Unique record identifier (UUID)
    pub record_id: String,
    /// User the record belongs to
    pub user_id: String,
    /// The day this record covers
    pub date: NaiveDate,
    /// Check-in time
    pub check_in: NaiveTime,
    /// Check-out time, absent until the user clocks out
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_out: Option<NaiveTime>,
    /// Minutes late past the workday start
    pub late_minutes: u32,
    /// Minutes worked (set at check-out)
    pub work_minutes: u32,
    /// Minutes beyond the scheduled workday (set at check-out)
    pub overtime_minutes: u32,
    /// Free-form note
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
}

impl StoredAttendance {
    /// Create a check-in record for a user.
    pub fn check_in(
        user_id: String,
        date: NaiveDate,
        check_in: NaiveTime,
        workday: &Workday,
        note: Option<String>,
    ) -> Self {
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            user_id,
            date,
            check_in,
            check_out: None,
            late_minutes: late_minutes(check_in, workday.start),
            work_minutes: 0,
            overtime_minutes: 0,
            note,
            created_at: Utc::now(),
        }
    }

    /// Apply a check-out, computing work and overtime minutes.
    pub fn apply_check_out(&mut self, check_out: NaiveTime, workday: &Workday) {
        let worked = work_minutes(self.check_in, check_out);
        self.check_out = Some(check_out);
        self.work_minutes = worked;
        self.overtime_minutes = overtime_minutes(worked, workday.scheduled_minutes);
    }
}

/// Repository for attendance records.
pub struct AttendanceRepository<'a> {
    datastore: &'a Datastore,
}

impl<'a> AttendanceRepository<'a> {
    /// Create a new AttendanceRepository.
    pub fn new(datastore: &'a Datastore) -> Self {
        Self { datastore }
    }

    fn record_path(&self, user_id: &str, date: NaiveDate) -> std::path::PathBuf {
        self.datastore
            .paths()
            .attendance_record(user_id, &date.format("%Y-%m-%d").to_string())
    }

    /// Get a user's record for a date.
    pub fn get(&self, user_id: &str, date: NaiveDate) -> StorageResult<StoredAttendance> {
        let path = self.record_path(user_id, date);
        if !self.datastore.exists(&path) {
            return Err(StorageError::NotFound(format!(
                "Attendance for {user_id} on {date}"
            )));
        }
        self.datastore.read_json(path)
    }

    /// Create a check-in record; one per user per day.
    pub fn create(&self, record: &StoredAttendance) -> StorageResult<()> {
        let path = self.record_path(&record.user_id, record.date);
        if self.datastore.exists(&path) {
            return Err(StorageError::AlreadyExists(format!(
                "Attendance for {} on {}",
                record.user_id, record.date
            )));
        }
        self.datastore.write_json(path, record)
    }

    /// Update an existing record (check-out, note edits).
    pub fn update(&self, record: &StoredAttendance) -> StorageResult<()> {
        let path = self.record_path(&record.user_id, record.date);
        if !self.datastore.exists(&path) {
            return Err(StorageError::NotFound(format!(
                "Attendance for {} on {}",
                record.user_id, record.date
            )));
        }
        self.datastore.write_json(path, record)
    }

    /// List a user's records for a month, ordered by date.
    pub fn list_by_user_month(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
    ) -> StorageResult<Vec<StoredAttendance>> {
        let stems = self
            .datastore
            .list_files(self.datastore.paths().attendance_dir(), "json")?;

        let prefix = format!("{user_id}_{year:04}-{month:02}-");
        let mut records = Vec::new();
        for stem in stems {
            if !stem.starts_with(&prefix) {
                continue;
            }
            let path = self
                .datastore
                .paths()
                .attendance_dir()
                .join(format!("{stem}.json"));
            if let Ok(record) = self.datastore.read_json::<StoredAttendance>(&path) {
                records.push(record);
            }
        }
        records.sort_by_key(|r| r.date);
        Ok(records)
    }
}
