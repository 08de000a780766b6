// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! FX-rate client.
//!
//! Unauthenticated GET returning the latest quote rates for a base currency.
//! Used for display-only conversion on payroll views; failures degrade to
//! omitting the converted figure.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use super::env_or_default;
use crate::config::{DEFAULT_FX_API_BASE_URL, FX_API_BASE_URL_ENV};

#[derive(Debug, thiserror::Error)]
pub enum FxError {
    #[error("FX request failed: {0}")]
    Request(String),

    #[error("FX response was invalid: {0}")]
    InvalidResponse(String),
}

/// Latest rates for one base currency.
#[derive(Debug, Clone, Deserialize)]
pub struct FxRates {
    /// Base currency code
    #[serde(rename = "base_code")]
    pub base: String,
    /// Quote currency → rate
    pub rates: HashMap<String, f64>,
}

impl FxRates {
    /// The rate for a quote currency, if served.
    pub fn rate(&self, quote: &str) -> Option<f64> {
        self.rates.get(&quote.to_uppercase()).copied()
    }
}

/// FX-rate REST client.
#[derive(Debug, Clone)]
pub struct FxClient {
    base_url: String,
    http: Client,
}

impl FxClient {
    /// Build a client from the environment (the API has a public default).
    pub fn from_env() -> Self {
        Self::new(env_or_default(FX_API_BASE_URL_ENV, DEFAULT_FX_API_BASE_URL))
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

    /// Fetch the latest rates for a base currency.
    pub async fn latest(&self, base: &str) -> Result<FxRates, FxError> {
        let url = format!("{}/{}", self.base_url, base.to_uppercase());

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FxError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FxError::Request(format!("FX API returned {status}")));
        }

        let rates: FxRates = response
            .json()
            .await
            .map_err(|e| FxError::InvalidResponse(e.to_string()))?;

        if rates.rates.is_empty() {
            return Err(FxError::InvalidResponse("empty rates table".to_string()));
        }
        Ok(rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_deserialize_and_look_up() {
        let json = r#"{"result": "success", "base_code": "USD",
                       "rates": {"IDR": 16250.5, "EUR": 0.92}}"#;
        let rates: FxRates = serde_json::from_str(json).unwrap();

        assert_eq!(rates.base, "USD");
        assert_eq!(rates.rate("idr"), Some(16250.5));
        assert_eq!(rates.rate("EUR"), Some(0.92));
        assert_eq!(rates.rate("XYZ"), None);
    }
}
