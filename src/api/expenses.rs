// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Finance endpoints: expense tracking and monthly summaries.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    audit_log,
    auth::Auth,
    error::{ApiError, Envelope},
    money::{format_minor, parse_decimal_to_minor},
    state::AppState,
    storage::{AuditEventType, ExpenseRepository, ExpenseSummary, StoredExpense},
};

/// Request body for recording an expense.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateExpenseRequest {
    /// Reporting category
    pub category: String,
    /// Amount, decimal string
    pub amount: String,
    /// ISO currency code
    #[serde(default = "default_currency")]
    pub currency: String,
    /// What the expense was for
    pub description: String,
    /// The day the expense was incurred (YYYY-MM-DD); defaults to today
    #[serde(default)]
    pub incurred_on: Option<NaiveDate>,
}

fn default_currency() -> String {
    "IDR".to_string()
}

/// Expense view returned to API clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExpenseResponse {
    /// The stored expense
    #[serde(flatten)]
    pub expense: StoredExpense,
    /// Amount as a decimal string
    pub amount: String,
}

impl From<StoredExpense> for ExpenseResponse {
    fn from(expense: StoredExpense) -> Self {
        let amount = format_minor(expense.amount_minor);
        Self { expense, amount }
    }
}

/// Query params for the monthly summary.
#[derive(Debug, Deserialize, IntoParams)]
pub struct SummaryQuery {
    /// Year (defaults to the current year)
    pub year: Option<i32>,
    /// Month 1-12 (defaults to the current month)
    pub month: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/v1/expenses",
    tag = "Finance",
    responses((status = 200, body = [ExpenseResponse]))
)]
pub async fn list_expenses(
    Auth(_caller): Auth,
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<ExpenseResponse>>>, ApiError> {
    let expenses = ExpenseRepository::new(&state.datastore).list_all()?;
    Ok(Json(Envelope::new(
        expenses.into_iter().map(ExpenseResponse::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/v1/expenses",
    request_body = CreateExpenseRequest,
    tag = "Finance",
    responses((status = 201, body = ExpenseResponse))
)]
pub async fn create_expense(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<Envelope<ExpenseResponse>>), ApiError> {
    if request.category.trim().is_empty() {
        return Err(ApiError::bad_request("category must not be empty"));
    }
    let amount_minor = parse_decimal_to_minor(&request.amount).map_err(ApiError::bad_request)?;

    let expense = StoredExpense::new(
        request.category.trim().to_string(),
        amount_minor,
        request.currency.to_uppercase(),
        request.description,
        request.incurred_on.unwrap_or_else(|| Utc::now().date_naive()),
        caller.user_id.clone(),
    );

    ExpenseRepository::new(&state.datastore).create(&expense)?;
    audit_log!(
        &state.datastore,
        AuditEventType::ExpenseCreated,
        &caller,
        "expense",
        &expense.expense_id
    );

    Ok((StatusCode::CREATED, Json(Envelope::new(expense.into()))))
}

#[utoipa::path(
    delete,
    path = "/v1/expenses/{expense_id}",
    params(("expense_id" = String, Path, description = "Expense to delete")),
    tag = "Finance",
    responses((status = 204), (status = 404))
)]
pub async fn delete_expense(
    Auth(caller): Auth,
    Path(expense_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    ExpenseRepository::new(&state.datastore).delete(&expense_id)?;
    audit_log!(
        &state.datastore,
        AuditEventType::ExpenseDeleted,
        &caller,
        "expense",
        &expense_id
    );
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/expenses/summary",
    params(SummaryQuery),
    tag = "Finance",
    responses((status = 200, body = ExpenseSummary))
)]
pub async fn expense_summary(
    Auth(_caller): Auth,
    State(state): State<AppState>,
    Query(params): Query<SummaryQuery>,
) -> Result<Json<Envelope<ExpenseSummary>>, ApiError> {
    let now = Utc::now();
    let year = params.year.unwrap_or_else(|| now.year());
    let month = params.month.unwrap_or_else(|| now.month());
    if !(1..=12).contains(&month) {
        return Err(ApiError::bad_request("month must be 1-12"));
    }

    let summary = ExpenseRepository::new(&state.datastore).monthly_summary(year, month)?;
    Ok(Json(Envelope::new(summary)))
}
