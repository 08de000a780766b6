// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Public-holiday calendar client.
//!
//! Unauthenticated GET returning the month's holidays as a JSON array. The
//! feed serves dates without zero padding ("2026-1-1"), so parsing is
//! tolerant of that.

use std::collections::HashSet;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;

use super::env_or_default;
use crate::config::{DEFAULT_HOLIDAY_API_BASE_URL, HOLIDAY_API_BASE_URL_ENV};

#[derive(Debug, thiserror::Error)]
pub enum HolidayError {
    #[error("holiday request failed: {0}")]
    Request(String),

    #[error("holiday response was invalid: {0}")]
    InvalidResponse(String),
}

/// One holiday as served by the calendar API.
#[derive(Debug, Clone, Deserialize)]
pub struct PublicHoliday {
    /// Holiday date, possibly without zero padding
    pub holiday_date: String,
    /// Holiday name
    #[serde(default)]
    pub holiday_name: String,
    /// National holidays count against scheduled work days
    #[serde(default)]
    pub is_national_holiday: bool,
}

impl PublicHoliday {
    /// Parse the served date, tolerating missing zero padding.
    pub fn date(&self) -> Option<NaiveDate> {
        let mut parts = self.holiday_date.split('-');
        let year = parts.next()?.parse::<i32>().ok()?;
        let month = parts.next()?.parse::<u32>().ok()?;
        let day = parts.next()?.parse::<u32>().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

/// Public-holiday calendar REST client.
#[derive(Debug, Clone)]
pub struct HolidayClient {
    base_url: String,
    http: Client,
}

impl HolidayClient {
    /// Build a client from the environment (the API has a public default).
    pub fn from_env() -> Self {
        Self::new(env_or_default(
            HOLIDAY_API_BASE_URL_ENV,
            DEFAULT_HOLIDAY_API_BASE_URL,
        ))
    }

    /// Build a client for an explicit base URL.
    pub fn new(base_url: String) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Fetch the holidays of one month.
    pub async fn monthly(&self, year: i32, month: u32) -> Result<Vec<PublicHoliday>, HolidayError> {
        let url = format!("{}/api", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("year", year.to_string()), ("month", month.to_string())])
            .send()
            .await
            .map_err(|e| HolidayError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HolidayError::Request(format!(
                "holiday API returned {status}"
            )));
        }

        response
            .json::<Vec<PublicHoliday>>()
            .await
            .map_err(|e| HolidayError::InvalidResponse(e.to_string()))
    }

    /// National-holiday dates of one month, for payroll scheduling.
    pub async fn national_dates(
        &self,
        year: i32,
        month: u32,
    ) -> Result<HashSet<NaiveDate>, HolidayError> {
        let holidays = self.monthly(year, month).await?;
        Ok(holidays
            .iter()
            .filter(|h| h.is_national_holiday)
            .filter_map(PublicHoliday::date)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unpadded_dates() {
        let holiday = PublicHoliday {
            holiday_date: "2026-1-1".to_string(),
            holiday_name: "Tahun Baru".to_string(),
            is_national_holiday: true,
        };
        assert_eq!(holiday.date(), NaiveDate::from_ymd_opt(2026, 1, 1));
    }

    #[test]
    fn parses_padded_dates() {
        let holiday = PublicHoliday {
            holiday_date: "2026-08-17".to_string(),
            holiday_name: "Hari Kemerdekaan".to_string(),
            is_national_holiday: true,
        };
        assert_eq!(holiday.date(), NaiveDate::from_ymd_opt(2026, 8, 17));
    }

    #[test]
    fn malformed_dates_are_none() {
        let holiday = PublicHoliday {
            holiday_date: "not-a-date".to_string(),
            holiday_name: String::new(),
            is_national_holiday: false,
        };
        assert!(holiday.date().is_none());
    }

    #[test]
    fn feed_entries_deserialize() {
        let json = r#"[
            {"holiday_date": "2026-8-17", "holiday_name": "Hari Kemerdekaan", "is_national_holiday": true},
            {"holiday_date": "2026-8-18", "holiday_name": "Cuti Bersama", "is_national_holiday": false}
        ]"#;
        let holidays: Vec<PublicHoliday> = serde_json::from_str(json).unwrap();
        assert_eq!(holidays.len(), 2);
        assert!(holidays[0].is_national_holiday);
        assert!(!holidays[1].is_national_holiday);
    }
}
