// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! WooCommerce REST client for the storefront mirror sync.
//!
//! Fetches `/wp-json/wc/v3/products` pages with Basic Auth (consumer
//! key/secret). Rejected credentials surface as a distinct error so the sync
//! can report them as an HTTP error string instead of looping.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use super::{env_optional, required_env_present};
use crate::config::{WOO_BASE_URL_ENV, WOO_CONSUMER_KEY_ENV, WOO_CONSUMER_SECRET_ENV};

const PRODUCTS_PATH: &str = "/wp-json/wc/v3/products";

#[derive(Debug, thiserror::Error)]
pub enum WooError {
    #[error("store configuration missing: {0}")]
    MissingConfig(String),

    #[error("store credentials rejected: {0}")]
    Unauthorized(String),

    #[error("store request failed: {0}")]
    Request(String),

    #[error("store response was invalid: {0}")]
    InvalidResponse(String),
}

/// A product as served by the remote store.
///
/// Only the fields the mirror keeps are deserialized; everything else in the
/// feed is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteProduct {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub permalink: String,
}

/// WooCommerce REST client.
#[derive(Debug, Clone)]
pub struct WooClient {
    base_url: String,
    consumer_key: String,
    consumer_secret: String,
    http: Client,
}

impl WooClient {
    /// Whether the environment carries a complete store configuration.
    pub fn is_configured() -> bool {
        required_env_present(WOO_BASE_URL_ENV)
            && required_env_present(WOO_CONSUMER_KEY_ENV)
            && required_env_present(WOO_CONSUMER_SECRET_ENV)
    }

    /// Build a client from the environment.
    pub fn from_env() -> Result<Self, WooError> {
        let base_url = env_required(WOO_BASE_URL_ENV)?;
        let consumer_key = env_required(WOO_CONSUMER_KEY_ENV)?;
        let consumer_secret = env_required(WOO_CONSUMER_SECRET_ENV)?;
        Self::new(base_url, consumer_key, consumer_secret)
    }

    /// Build a client from explicit credentials.
    pub fn new(
        base_url: String,
        consumer_key: String,
        consumer_secret: String,
    ) -> Result<Self, WooError> {
        Url::parse(&base_url)
            .map_err(|e| WooError::MissingConfig(format!("WOO_BASE_URL is not a URL: {e}")))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| WooError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            consumer_key,
            consumer_secret,
            http,
        })
    }

    /// Fetch one page of products.
    ///
    /// An empty page means the feed is exhausted.
    pub async fn fetch_products_page(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RemoteProduct>, WooError> {
        let url = format!("{}{}", self.base_url, PRODUCTS_PATH);

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.consumer_key, Some(&self.consumer_secret))
            .query(&[("page", page), ("per_page", per_page)])
            .send()
            .await
            .map_err(|e| WooError::Request(format!("page {page}: {e}")))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let status = response.status();
                return Err(WooError::Unauthorized(format!(
                    "{status} from store; consumer key/secret may be obsolete"
                )));
            }
            status if !status.is_success() => {
                return Err(WooError::Request(format!(
                    "page {page}: store returned {status}"
                )));
            }
            _ => {}
        }

        response
            .json::<Vec<RemoteProduct>>()
            .await
            .map_err(|e| WooError::InvalidResponse(format!("page {page}: {e}")))
    }
}

fn env_required(name: &str) -> Result<String, WooError> {
    env_optional(name).ok_or_else(|| WooError::MissingConfig(name.to_string()))
}
