// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Payroll endpoints: payslip generation, lookup and finalization.
//!
//! Generation pulls the month's attendance, subtracts public holidays from
//! the scheduled work days (the holiday API failing degrades to "no
//! holidays", logged) and composes the pay breakdown. An FX-converted view
//! of the net pay is display-only and degrades to absent on FX failures.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::{IntoParams, ToSchema};

use crate::{
    audit_log,
    auth::Auth,
    error::{ApiError, Envelope},
    money::parse_decimal_to_minor,
    state::AppState,
    storage::{
        compute_pay, parse_period, scheduled_work_days, AttendanceRepository, AuditEventType,
        PayBreakdown, PayrollRepository, PayslipStatus, StoredPayslip, UserRepository,
    },
};

/// Base currency payslips are denominated in.
const PAYROLL_CURRENCY: &str = "IDR";

/// Request body for generating a payslip.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GeneratePayslipRequest {
    /// Employee to pay
    pub user_id: String,
    /// Pay period, `YYYY-MM`
    pub period: String,
    /// Fixed allowance for the period, decimal string
    #[serde(default)]
    pub allowance: Option<String>,
}

/// Display-only FX conversion of the net pay.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConvertedPay {
    /// Quote currency code
    pub currency: String,
    /// Converted net pay
    pub amount: f64,
}

/// Payslip view returned to API clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PayslipResponse {
    /// Unique payslip identifier
    pub payslip_id: String,
    /// Employee this payslip belongs to
    pub user_id: String,
    /// Pay period, `YYYY-MM`
    pub period: String,
    /// Decrypted base salary, decimal string
    pub base_salary: String,
    /// Decrypted net pay, decimal string
    pub net_pay: String,
    /// Pay breakdown in minor units
    pub breakdown: PayBreakdown,
    /// Lifecycle status
    pub status: PayslipStatus,
    /// When the payslip was generated
    pub created_at: DateTime<Utc>,
    /// FX-converted net pay, when requested and available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted: Option<ConvertedPay>,
}

impl PayslipResponse {
    fn from_stored(slip: StoredPayslip, state: &AppState) -> Self {
        Self {
            base_salary: state.cipher.decrypt(&slip.base_salary_enc),
            net_pay: state.cipher.decrypt(&slip.net_pay_enc),
            payslip_id: slip.payslip_id,
            user_id: slip.user_id,
            period: slip.period,
            breakdown: slip.breakdown,
            status: slip.status,
            created_at: slip.created_at,
            converted: None,
        }
    }
}

/// Query params for payslip listing.
#[derive(Debug, Deserialize, IntoParams)]
pub struct PayrollListQuery {
    /// Filter by period `YYYY-MM`
    pub period: Option<String>,
    /// Filter by employee
    pub user_id: Option<String>,
}

/// Query params for payslip lookup.
#[derive(Debug, Deserialize, IntoParams)]
pub struct PayslipQuery {
    /// Quote currency for a display-only net-pay conversion
    pub currency: Option<String>,
}

#[utoipa::path(
    post,
    path = "/v1/payroll/generate",
    request_body = GeneratePayslipRequest,
    tag = "Payroll",
    responses(
        (status = 200, body = PayslipResponse),
        (status = 409, description = "Period already finalized")
    )
)]
pub async fn generate_payslip(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Json(request): Json<GeneratePayslipRequest>,
) -> Result<Json<Envelope<PayslipResponse>>, ApiError> {
    let (year, month) = parse_period(&request.period)
        .ok_or_else(|| ApiError::bad_request("period must be YYYY-MM"))?;

    let allowance_minor = match request.allowance.as_deref() {
        Some(raw) => parse_decimal_to_minor(raw).map_err(ApiError::bad_request)?,
        None => 0,
    };

    let users = UserRepository::new(&state.datastore);
    let user = users.get(&request.user_id)?;
    let base_salary_minor = parse_decimal_to_minor(&state.cipher.decrypt(&user.base_salary_enc))
        .map_err(|e| ApiError::internal(format!("stored salary did not parse: {e}")))?;

    let payroll = PayrollRepository::new(&state.datastore);
    if let Some(existing) = payroll.find_for_period(&request.user_id, &request.period)? {
        if existing.status == PayslipStatus::Final {
            return Err(ApiError::conflict(format!(
                "payslip for {} {} is already final",
                request.user_id, request.period
            )));
        }
    }

    // Holiday API failures degrade to an empty holiday set
    let holidays = match state.holidays.national_dates(year, month).await {
        Ok(dates) => dates,
        Err(e) => {
            warn!(error = %e, "Holiday lookup failed; scheduling without holidays");
            Default::default()
        }
    };

    let attendance = AttendanceRepository::new(&state.datastore)
        .list_by_user_month(&request.user_id, year, month)?;

    let scheduled_days = scheduled_work_days(year, month, &holidays);
    let breakdown = compute_pay(
        base_salary_minor,
        &attendance,
        scheduled_days,
        state.workday.scheduled_minutes,
        allowance_minor,
    );

    // Replace any existing draft for the period
    let mut slip = StoredPayslip::draft(
        request.user_id.clone(),
        request.period.clone(),
        base_salary_minor,
        breakdown,
        &state.cipher,
    );
    if let Some(existing) = payroll.find_for_period(&request.user_id, &request.period)? {
        slip.payslip_id = existing.payslip_id;
    }
    payroll.save(&slip)?;

    audit_log!(
        &state.datastore,
        AuditEventType::PayslipGenerated,
        &caller,
        "payslip",
        &slip.payslip_id
    );

    Ok(Json(Envelope::new(PayslipResponse::from_stored(
        slip, &state,
    ))))
}

#[utoipa::path(
    get,
    path = "/v1/payroll",
    params(PayrollListQuery),
    tag = "Payroll",
    responses((status = 200, body = [PayslipResponse]))
)]
pub async fn list_payslips(
    Auth(_caller): Auth,
    State(state): State<AppState>,
    Query(params): Query<PayrollListQuery>,
) -> Result<Json<Envelope<Vec<PayslipResponse>>>, ApiError> {
    let payroll = PayrollRepository::new(&state.datastore);

    let slips = match params.period {
        Some(ref period) => payroll.list_by_period(period)?,
        None => payroll.list_all()?,
    };

    let responses = slips
        .into_iter()
        .filter(|s| {
            params
                .user_id
                .as_deref()
                .map(|u| s.user_id == u)
                .unwrap_or(true)
        })
        .map(|s| PayslipResponse::from_stored(s, &state))
        .collect();
    Ok(Json(Envelope::new(responses)))
}

#[utoipa::path(
    get,
    path = "/v1/payroll/{payslip_id}",
    params(
        ("payslip_id" = String, Path, description = "Payslip to fetch"),
        PayslipQuery
    ),
    tag = "Payroll",
    responses((status = 200, body = PayslipResponse), (status = 404))
)]
pub async fn get_payslip(
    Auth(_caller): Auth,
    Path(payslip_id): Path<String>,
    State(state): State<AppState>,
    Query(params): Query<PayslipQuery>,
) -> Result<Json<Envelope<PayslipResponse>>, ApiError> {
    let payroll = PayrollRepository::new(&state.datastore);
    let slip = payroll.get(&payslip_id)?;
    let net_minor = slip.breakdown.net_minor;
    let mut response = PayslipResponse::from_stored(slip, &state);

    // FX conversion is display-only; failures degrade to an absent field
    if let Some(currency) = params.currency {
        match state.fx.latest(PAYROLL_CURRENCY).await {
            Ok(rates) => {
                if let Some(rate) = rates.rate(&currency) {
                    response.converted = Some(ConvertedPay {
                        currency: currency.to_uppercase(),
                        amount: (net_minor as f64 / 100.0) * rate,
                    });
                }
            }
            Err(e) => warn!(error = %e, "FX lookup failed; omitting conversion"),
        }
    }

    Ok(Json(Envelope::new(response)))
}

#[utoipa::path(
    post,
    path = "/v1/payroll/{payslip_id}/finalize",
    params(("payslip_id" = String, Path, description = "Payslip to finalize")),
    tag = "Payroll",
    responses((status = 200, body = PayslipResponse), (status = 404))
)]
pub async fn finalize_payslip(
    Auth(caller): Auth,
    Path(payslip_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Envelope<PayslipResponse>>, ApiError> {
    let payroll = PayrollRepository::new(&state.datastore);
    let mut slip = payroll.get(&payslip_id)?;

    slip.status = PayslipStatus::Final;
    payroll.save(&slip)?;

    audit_log!(
        &state.datastore,
        AuditEventType::PayslipFinalized,
        &caller,
        "payslip",
        &payslip_id
    );

    Ok(Json(Envelope::new(PayslipResponse::from_stored(
        slip, &state,
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, Role};
    use crate::money::format_minor;
    use crate::state::test_support::test_state;
    use crate::storage::{StoredAttendance, StoredUser, UserStatus, Workday};
    use chrono::{NaiveDate, NaiveTime};

    fn hr() -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: "hr-1".to_string(),
            username: "hr".to_string(),
            role: Role::Hr,
            expires_at: 0,
        }
    }

    fn seed_user(state: &AppState, salary: &str) -> StoredUser {
        let sealed = state.cipher.seal("Budi Santoso");
        let now = Utc::now();
        let user = StoredUser {
            user_id: "u-1".to_string(),
            username: "budi".to_string(),
            full_name_enc: sealed.enc,
            full_name_hash: sealed.hash,
            password_hash: "$argon2id$fake".to_string(),
            role: Role::Staff,
            position: "Technician".to_string(),
            base_salary_enc: state.cipher.encrypt(salary),
            birth_date_enc: None,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        };
        UserRepository::new(&state.datastore).create(&user).unwrap();
        user
    }

    fn seed_attendance(state: &AppState, day: u32, late: u32, overtime: u32) {
        let workday = Workday::default();
        let check_in =
            NaiveTime::from_hms_opt(9, 0, 0).unwrap() + chrono::Duration::minutes(late as i64);
        let mut record = StoredAttendance::check_in(
            "u-1".to_string(),
            NaiveDate::from_ymd_opt(2026, 8, day).unwrap(),
            check_in,
            &workday,
            None,
        );
        record.apply_check_out(
            check_in + chrono::Duration::minutes((480 + overtime) as i64),
            &workday,
        );
        AttendanceRepository::new(&state.datastore)
            .create(&record)
            .unwrap();
    }

    #[tokio::test]
    async fn generate_composes_attendance_into_pay() {
        let (state, _tmp) = test_state();
        seed_user(&state, "10080.00");
        seed_attendance(&state, 3, 30, 0);
        seed_attendance(&state, 4, 0, 60);

        let Json(envelope) = generate_payslip(
            Auth(hr()),
            State(state.clone()),
            Json(GeneratePayslipRequest {
                user_id: "u-1".to_string(),
                period: "2026-08".to_string(),
                allowance: Some("500.00".to_string()),
            }),
        )
        .await
        .expect("generation succeeds");

        let slip = envelope.data;
        // August 2026 has 21 weekdays; holiday API is unreachable in tests
        // and degrades to no holidays
        assert_eq!(slip.breakdown.scheduled_days, 21);
        assert_eq!(slip.breakdown.work_days, 2);
        assert_eq!(slip.breakdown.daily_rate_minor, 48_000);
        assert_eq!(slip.breakdown.late_deduction_minor, 3_000);
        assert_eq!(slip.breakdown.overtime_pay_minor, 9_000);
        assert_eq!(slip.base_salary, "10080.00");
        assert_eq!(slip.status, PayslipStatus::Draft);

        let expected_net = 2 * 48_000 - 3_000 + 9_000 + 50_000;
        assert_eq!(slip.breakdown.net_minor, expected_net);
        assert_eq!(slip.net_pay, format_minor(expected_net));
    }

    #[tokio::test]
    async fn regenerate_replaces_draft_finalize_locks() {
        let (state, _tmp) = test_state();
        seed_user(&state, "4200.00");
        seed_attendance(&state, 3, 0, 0);

        let request = GeneratePayslipRequest {
            user_id: "u-1".to_string(),
            period: "2026-08".to_string(),
            allowance: None,
        };

        let Json(first) = generate_payslip(
            Auth(hr()),
            State(state.clone()),
            Json(request.clone()),
        )
        .await
        .unwrap();

        // Regeneration reuses the payslip id
        let Json(second) = generate_payslip(
            Auth(hr()),
            State(state.clone()),
            Json(request.clone()),
        )
        .await
        .unwrap();
        assert_eq!(first.data.payslip_id, second.data.payslip_id);

        let Json(finalized) = finalize_payslip(
            Auth(hr()),
            Path(first.data.payslip_id.clone()),
            State(state.clone()),
        )
        .await
        .unwrap();
        assert_eq!(finalized.data.status, PayslipStatus::Final);

        // A finalized period cannot be regenerated
        let result = generate_payslip(Auth(hr()), State(state), Json(request)).await;
        let err = result.err().expect("regeneration must fail");
        assert_eq!(err.status, axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn get_payslip_omits_conversion_when_fx_unreachable() {
        let (state, _tmp) = test_state();
        seed_user(&state, "4200.00");
        seed_attendance(&state, 3, 0, 0);

        let Json(generated) = generate_payslip(
            Auth(hr()),
            State(state.clone()),
            Json(GeneratePayslipRequest {
                user_id: "u-1".to_string(),
                period: "2026-08".to_string(),
                allowance: None,
            }),
        )
        .await
        .unwrap();

        let Json(envelope) = get_payslip(
            Auth(hr()),
            Path(generated.data.payslip_id),
            State(state),
            Query(PayslipQuery {
                currency: Some("USD".to_string()),
            }),
        )
        .await
        .expect("lookup succeeds despite FX failure");
        assert!(envelope.data.converted.is_none());
    }

    #[tokio::test]
    async fn list_filters_by_period_and_user() {
        let (state, _tmp) = test_state();
        seed_user(&state, "4200.00");
        seed_attendance(&state, 3, 0, 0);

        generate_payslip(
            Auth(hr()),
            State(state.clone()),
            Json(GeneratePayslipRequest {
                user_id: "u-1".to_string(),
                period: "2026-08".to_string(),
                allowance: None,
            }),
        )
        .await
        .unwrap();

        let Json(envelope) = list_payslips(
            Auth(hr()),
            State(state.clone()),
            Query(PayrollListQuery {
                period: Some("2026-08".to_string()),
                user_id: Some("u-1".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(envelope.data.len(), 1);

        let Json(envelope) = list_payslips(
            Auth(hr()),
            State(state),
            Query(PayrollListQuery {
                period: Some("2026-07".to_string()),
                user_id: None,
            }),
        )
        .await
        .unwrap();
        assert!(envelope.data.is_empty());
    }

    #[tokio::test]
    async fn generate_rejects_bad_period() {
        let (state, _tmp) = test_state();
        seed_user(&state, "4200.00");

        let result = generate_payslip(
            Auth(hr()),
            State(state),
            Json(GeneratePayslipRequest {
                user_id: "u-1".to_string(),
                period: "August".to_string(),
                allowance: None,
            }),
        )
        .await;
        assert!(result.is_err());
    }
}
