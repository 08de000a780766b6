// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Payslip repository and monthly payroll arithmetic.
//!
//! A payslip composes the month's attendance into pay: the base salary is
//! prorated over scheduled work days (weekdays minus public holidays), late
//! minutes deduct at the per-minute rate and overtime pays at 1.5x. Salary
//! and net pay persist encrypted.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{Datastore, StorageError, StorageResult};
use super::attendance::StoredAttendance;
use crate::crypto::FieldCipher;
use crate::money::format_minor;

/// Overtime multiplier: pay is per-minute rate times 3/2.
const OVERTIME_NUM: u64 = 3;
const OVERTIME_DEN: u64 = 2;

/// Payslip lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PayslipStatus {
    /// Generated, still editable/regenerable
    Draft,
    /// Finalized for payment
    Final,
}

/// Computed pay breakdown for one period, all amounts in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PayBreakdown {
    /// Days with a check-in this period
    pub work_days: u32,
    /// Scheduled work days in the period (weekdays minus holidays)
    pub scheduled_days: u32,
    /// Total minutes late across the period
    pub late_minutes: u32,
    /// Total overtime minutes across the period
    pub overtime_minutes: u32,
    /// Base salary prorated per scheduled day
    pub daily_rate_minor: u64,
    /// Pay for days actually worked
    pub prorated_minor: u64,
    /// Deduction for late minutes
    pub late_deduction_minor: u64,
    /// Overtime pay at 1.5x the per-minute rate
    pub overtime_pay_minor: u64,
    /// Fixed allowance added to the period
    pub allowance_minor: u64,
    /// Net pay
    pub net_minor: u64,
}

/// Scheduled work days in a month: weekdays that are not public holidays.
pub fn scheduled_work_days(year: i32, month: u32, holidays: &HashSet<NaiveDate>) -> u32 {
    let mut days = 0;
    let mut current = match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(d) => d,
        None => return 0,
    };

    while current.month() == month {
        let weekday = current.weekday();
        if weekday != Weekday::Sat && weekday != Weekday::Sun && !holidays.contains(&current) {
            days += 1;
        }
        current = match current.succ_opt() {
            Some(d) => d,
            None => break,
        };
    }
    days
}

/// Compose the month's attendance into a pay breakdown.
///
/// `scheduled_minutes` is the configured workday length used for the
/// per-minute rate.
pub fn compute_pay(
    base_salary_minor: u64,
    records: &[StoredAttendance],
    scheduled_days: u32,
    scheduled_minutes: u32,
    allowance_minor: u64,
) -> PayBreakdown {
    let work_days = records.iter().filter(|r| r.check_out.is_some()).count() as u32;
    let late_total: u32 = records.iter().map(|r| r.late_minutes).sum();
    let overtime_total: u32 = records.iter().map(|r| r.overtime_minutes).sum();

    let daily_rate = if scheduled_days > 0 {
        base_salary_minor / scheduled_days as u64
    } else {
        0
    };
    let per_minute = if scheduled_minutes > 0 {
        daily_rate / scheduled_minutes as u64
    } else {
        0
    };

    let prorated = daily_rate * work_days as u64;
    let late_deduction = per_minute * late_total as u64;
    let overtime_pay = per_minute * overtime_total as u64 * OVERTIME_NUM / OVERTIME_DEN;

    let net = prorated.saturating_sub(late_deduction) + overtime_pay + allowance_minor;

    PayBreakdown {
        work_days,
        scheduled_days,
        late_minutes: late_total,
        overtime_minutes: overtime_total,
        daily_rate_minor: daily_rate,
        prorated_minor: prorated,
        late_deduction_minor: late_deduction,
        overtime_pay_minor: overtime_pay,
        allowance_minor,
        net_minor: net,
    }
}

/// Payslip record persisted in the datastore.
///
/// Salary and net pay are sensitive and persist encrypted; the rest of the
/// breakdown is plain so period reports stay cheap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPayslip {
    /// Unique payslip identifier (UUID)
    pub payslip_id: String,
    /// Employee this payslip belongs to
    pub user_id: String,
    /// Pay period, `YYYY-MM`
    pub period: String,
    /// Encrypted base salary (decimal string)
    pub base_salary_enc: String,
    /// Encrypted net pay (decimal string)
    pub net_pay_enc: String,
    /// Non-sensitive pay breakdown
    pub breakdown: PayBreakdown,
    /// Lifecycle status
    pub status: PayslipStatus,
    /// When the payslip was generated
    pub created_at: DateTime<Utc>,
}

impl StoredPayslip {
    /// Build a draft payslip from a computed breakdown.
    pub fn draft(
        user_id: String,
        period: String,
        base_salary_minor: u64,
        breakdown: PayBreakdown,
        cipher: &FieldCipher,
    ) -> Self {
        Self {
            payslip_id: uuid::Uuid::new_v4().to_string(),
            user_id,
            period,
            base_salary_enc: cipher.encrypt(&format_minor(base_salary_minor)),
            net_pay_enc: cipher.encrypt(&format_minor(breakdown.net_minor)),
            breakdown,
            status: PayslipStatus::Draft,
            created_at: Utc::now(),
        }
    }
}

/// Parse a `YYYY-MM` period string.
pub fn parse_period(period: &str) -> Option<(i32, u32)> {
    let (year_raw, month_raw) = period.split_once('-')?;
    if year_raw.len() != 4 || month_raw.len() != 2 {
        return None;
    }
    let year = year_raw.parse::<i32>().ok()?;
    let month = month_raw.parse::<u32>().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some((year, month))
}

/// Repository for payslips.
pub struct PayrollRepository<'a> {
    datastore: &'a Datastore,
}

impl<'a> PayrollRepository<'a> {
    /// Create a new PayrollRepository.
    pub fn new(datastore: &'a Datastore) -> Self {
        Self { datastore }
    }

    /// Get a payslip by ID.
    pub fn get(&self, payslip_id: &str) -> StorageResult<StoredPayslip> {
        let path = self.datastore.paths().payslip(payslip_id);
        if !self.datastore.exists(&path) {
            return Err(StorageError::NotFound(format!("Payslip {payslip_id}")));
        }
        self.datastore.read_json(path)
    }

    /// Persist a payslip (create or replace a draft).
    pub fn save(&self, payslip: &StoredPayslip) -> StorageResult<()> {
        self.datastore
            .write_json(self.datastore.paths().payslip(&payslip.payslip_id), payslip)
    }

    /// List all payslips, newest first.
    pub fn list_all(&self) -> StorageResult<Vec<StoredPayslip>> {
        let ids = self
            .datastore
            .list_files(self.datastore.paths().payroll_dir(), "json")?;

        let mut payslips = Vec::new();
        for id in &ids {
            if let Ok(payslip) = self.get(id) {
                payslips.push(payslip);
            }
        }
        payslips.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payslips)
    }

    /// Find the existing payslip for a user and period, if any.
    pub fn find_for_period(
        &self,
        user_id: &str,
        period: &str,
    ) -> StorageResult<Option<StoredPayslip>> {
        Ok(self
            .list_all()?
            .into_iter()
            .find(|p| p.user_id == user_id && p.period == period))
    }

    /// List payslips for a period.
    pub fn list_by_period(&self, period: &str) -> StorageResult<Vec<StoredPayslip>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|p| p.period == period)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::repository::attendance::Workday;
    use crate::storage::StoragePaths;
    use chrono::NaiveTime;
    use tempfile::TempDir;

    fn test_datastore() -> (Datastore, TempDir) {
        let tmp = TempDir::new().unwrap();
        let mut ds = Datastore::new(StoragePaths::new(tmp.path()));
        ds.initialize().expect("Failed to initialize");
        (ds, tmp)
    }

    fn record(day: u32, late: u32, overtime: u32) -> StoredAttendance {
        let workday = Workday::default();
        let check_in = NaiveTime::from_hms_opt(9, 0, 0).unwrap() + chrono::Duration::minutes(late as i64);
        let mut r = StoredAttendance::check_in(
            "u-1".to_string(),
            NaiveDate::from_ymd_opt(2026, 8, day).unwrap(),
            check_in,
            &workday,
            None,
        );
        let out = check_in + chrono::Duration::minutes((480 + overtime) as i64);
        r.apply_check_out(out, &workday);
        r
    }

    #[test]
    fn scheduled_days_skip_weekends_and_holidays() {
        // August 2026 has 21 weekdays
        assert_eq!(scheduled_work_days(2026, 8, &HashSet::new()), 21);

        // A holiday on a weekday reduces the count; one on a weekend does not
        let mut holidays = HashSet::new();
        holidays.insert(NaiveDate::from_ymd_opt(2026, 8, 17).unwrap()); // Monday
        holidays.insert(NaiveDate::from_ymd_opt(2026, 8, 16).unwrap()); // Sunday
        assert_eq!(scheduled_work_days(2026, 8, &holidays), 20);
    }

    #[test]
    fn compute_pay_full_month_no_penalties() {
        // 4200.00 over 21 scheduled days → 2.00/day
        let records: Vec<_> = (1..=21).map(|d| record(d, 0, 0)).collect();
        let pay = compute_pay(420_000, &records, 21, 480, 0);

        assert_eq!(pay.work_days, 21);
        assert_eq!(pay.daily_rate_minor, 20_000);
        assert_eq!(pay.prorated_minor, 420_000);
        assert_eq!(pay.late_deduction_minor, 0);
        assert_eq!(pay.overtime_pay_minor, 0);
        assert_eq!(pay.net_minor, 420_000);
    }

    #[test]
    fn compute_pay_applies_late_and_overtime() {
        // daily 48000 minor / 480 min → 100 per minute
        let records = vec![record(3, 30, 0), record(4, 0, 60)];
        let pay = compute_pay(1_008_000, &records, 21, 480, 50_000);

        assert_eq!(pay.daily_rate_minor, 48_000);
        assert_eq!(pay.work_days, 2);
        assert_eq!(pay.late_minutes, 30);
        assert_eq!(pay.overtime_minutes, 60);
        assert_eq!(pay.late_deduction_minor, 3_000);
        assert_eq!(pay.overtime_pay_minor, 9_000); // 60 * 100 * 1.5
        assert_eq!(
            pay.net_minor,
            2 * 48_000 - 3_000 + 9_000 + 50_000
        );
    }

    #[test]
    fn compute_pay_ignores_open_records() {
        let workday = Workday::default();
        let open = StoredAttendance::check_in(
            "u-1".to_string(),
            NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            &workday,
            None,
        );
        let pay = compute_pay(420_000, &[record(5, 0, 0), open], 21, 480, 0);
        assert_eq!(pay.work_days, 1);
    }

    #[test]
    fn compute_pay_zero_scheduled_days_is_safe() {
        let pay = compute_pay(420_000, &[], 0, 480, 0);
        assert_eq!(pay.daily_rate_minor, 0);
        assert_eq!(pay.net_minor, 0);
    }

    #[test]
    fn parse_period_validates() {
        assert_eq!(parse_period("2026-08"), Some((2026, 8)));
        assert_eq!(parse_period("2026-13"), None);
        assert_eq!(parse_period("26-08"), None);
        assert_eq!(parse_period("garbage"), None);
    }

    #[test]
    fn draft_encrypts_salary_and_net() {
        let cipher = FieldCipher::new("payroll-test");
        let breakdown = compute_pay(420_000, &[record(1, 0, 0)], 21, 480, 0);
        let slip = StoredPayslip::draft(
            "u-1".to_string(),
            "2026-08".to_string(),
            420_000,
            breakdown,
            &cipher,
        );

        assert_ne!(slip.base_salary_enc, "4200.00");
        assert_eq!(cipher.decrypt(&slip.base_salary_enc), "4200.00");
        assert_eq!(cipher.decrypt(&slip.net_pay_enc), "200.00");
        assert_eq!(slip.status, PayslipStatus::Draft);
    }

    #[test]
    fn save_find_and_list_by_period() {
        let (ds, _tmp) = test_datastore();
        let cipher = FieldCipher::new("payroll-test");
        let repo = PayrollRepository::new(&ds);

        let breakdown = compute_pay(420_000, &[record(1, 0, 0)], 21, 480, 0);
        let slip = StoredPayslip::draft(
            "u-1".to_string(),
            "2026-08".to_string(),
            420_000,
            breakdown.clone(),
            &cipher,
        );
        repo.save(&slip).unwrap();

        let found = repo.find_for_period("u-1", "2026-08").unwrap();
        assert_eq!(found.unwrap().payslip_id, slip.payslip_id);
        assert!(repo.find_for_period("u-1", "2026-07").unwrap().is_none());

        let by_period = repo.list_by_period("2026-08").unwrap();
        assert_eq!(by_period.len(), 1);
    }
}
