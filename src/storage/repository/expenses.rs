// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Expense repository with monthly category summaries.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{Datastore, StorageError, StorageResult};

/// Expense record persisted in the datastore.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredExpense {
    /// Unique expense identifier (UUID)
    pub expense_id: String,
    /// Reporting category ("utilities", "logistics", ...)
    pub category: String,
    /// Amount in minor units
    pub amount_minor: u64,
    /// ISO currency code
    pub currency: String,
    /// What the expense was for
    pub description: String,
    /// The day the expense was incurred
    pub incurred_on: NaiveDate,
    /// User who recorded the expense
    pub created_by: String,
    /// When the record was created
    pub created_at: DateTime<Utc>,
}

impl StoredExpense {
    /// Create a new expense record.
    pub fn new(
        category: String,
        amount_minor: u64,
        currency: String,
        description: String,
        incurred_on: NaiveDate,
        created_by: String,
    ) -> Self {
        Self {
            expense_id: uuid::Uuid::new_v4().to_string(),
            category,
            amount_minor,
            currency,
            description,
            incurred_on,
            created_by,
            created_at: Utc::now(),
        }
    }
}

/// Per-category totals for a month, in minor units.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExpenseSummary {
    /// Summarized year
    pub year: i32,
    /// Summarized month
    pub month: u32,
    /// Category → total amount (minor units)
    pub by_category: BTreeMap<String, u64>,
    /// Total across all categories
    pub total_minor: u64,
    /// Number of expenses in the month
    pub count: usize,
}

/// Repository for expense records.
pub struct ExpenseRepository<'a> {
    datastore: &'a Datastore,
}

impl<'a> ExpenseRepository<'a> {
    /// Create a new ExpenseRepository.
    pub fn new(datastore: &'a Datastore) -> Self {
        Self { datastore }
    }

    /// Get an expense by ID.
    pub fn get(&self, expense_id: &str) -> StorageResult<StoredExpense> {
        let path = self.datastore.paths().expense(expense_id);
        if !self.datastore.exists(&path) {
            return Err(StorageError::NotFound(format!("Expense {expense_id}")));
        }
        self.datastore.read_json(path)
    }

    /// Persist a new expense.
    pub fn create(&self, expense: &StoredExpense) -> StorageResult<()> {
        let path = self.datastore.paths().expense(&expense.expense_id);
        if self.datastore.exists(&path) {
            return Err(StorageError::AlreadyExists(format!(
                "Expense {}",
                expense.expense_id
            )));
        }
        self.datastore.write_json(path, expense)
    }

    /// Delete an expense.
    pub fn delete(&self, expense_id: &str) -> StorageResult<()> {
        let path = self.datastore.paths().expense(expense_id);
        if !self.datastore.exists(&path) {
            return Err(StorageError::NotFound(format!("Expense {expense_id}")));
        }
        self.datastore.delete(path)
    }

    /// List all expenses, newest incurred first.
    pub fn list_all(&self) -> StorageResult<Vec<StoredExpense>> {
        let ids = self
            .datastore
            .list_files(self.datastore.paths().expenses_dir(), "json")?;

        let mut expenses = Vec::new();
        for id in &ids {
            if let Ok(expense) = self.get(id) {
                expenses.push(expense);
            }
        }
        expenses.sort_by(|a, b| b.incurred_on.cmp(&a.incurred_on));
        Ok(expenses)
    }

    /// Per-category totals for a month.
    pub fn monthly_summary(&self, year: i32, month: u32) -> StorageResult<ExpenseSummary> {
        let mut by_category: BTreeMap<String, u64> = BTreeMap::new();
        let mut total = 0u64;
        let mut count = 0usize;

        for expense in self.list_all()? {
            if expense.incurred_on.year() != year || expense.incurred_on.month() != month {
                continue;
            }
            *by_category.entry(expense.category.clone()).or_default() += expense.amount_minor;
            total += expense.amount_minor;
            count += 1;
        }

        Ok(ExpenseSummary {
            year,
            month,
            by_category,
            total_minor: total,
            count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use tempfile::TempDir;

    fn test_datastore() -> (Datastore, TempDir) {
        let tmp = TempDir::new().unwrap();
        let mut ds = Datastore::new(StoragePaths::new(tmp.path()));
        ds.initialize().expect("Failed to initialize");
        (ds, tmp)
    }

    fn expense(category: &str, amount: u64, y: i32, m: u32, d: u32) -> StoredExpense {
        StoredExpense::new(
            category.to_string(),
            amount,
            "IDR".to_string(),
            format!("{category} bill"),
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            "u-finance".to_string(),
        )
    }

    #[test]
    fn create_get_delete() {
        let (ds, _tmp) = test_datastore();
        let repo = ExpenseRepository::new(&ds);

        let e = expense("utilities", 150_000, 2026, 8, 3);
        repo.create(&e).unwrap();

        let loaded = repo.get(&e.expense_id).unwrap();
        assert_eq!(loaded.category, "utilities");

        repo.delete(&e.expense_id).unwrap();
        assert!(matches!(
            repo.get(&e.expense_id),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn monthly_summary_groups_by_category() {
        let (ds, _tmp) = test_datastore();
        let repo = ExpenseRepository::new(&ds);

        repo.create(&expense("utilities", 100_000, 2026, 8, 1)).unwrap();
        repo.create(&expense("utilities", 50_000, 2026, 8, 15)).unwrap();
        repo.create(&expense("logistics", 75_000, 2026, 8, 20)).unwrap();
        // Different month must not count
        repo.create(&expense("utilities", 999_999, 2026, 7, 30)).unwrap();

        let summary = repo.monthly_summary(2026, 8).unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.total_minor, 225_000);
        assert_eq!(summary.by_category["utilities"], 150_000);
        assert_eq!(summary.by_category["logistics"], 75_000);
    }

    #[test]
    fn list_all_sorts_newest_first() {
        let (ds, _tmp) = test_datastore();
        let repo = ExpenseRepository::new(&ds);

        repo.create(&expense("a", 1, 2026, 8, 1)).unwrap();
        repo.create(&expense("b", 1, 2026, 8, 20)).unwrap();

        let all = repo.list_all().unwrap();
        assert_eq!(all[0].category, "b");
    }
}
