// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Outbound REST integrations.
//!
//! - [`woocommerce`]: the remote storefront (Basic Auth, paginated products)
//! - [`administration`]: the separate administration backend (API-key header)
//! - [`holidays`]: public-holiday calendar API (unauthenticated)
//! - [`fx`]: FX-rate API (unauthenticated)

pub mod administration;
pub mod fx;
pub mod holidays;
pub mod woocommerce;

pub use administration::{AdministrationClient, AdministrationError};
pub use fx::{FxClient, FxError, FxRates};
pub use holidays::{HolidayClient, HolidayError, PublicHoliday};
pub use woocommerce::{RemoteProduct, WooClient, WooError};

/// Whether a non-empty value is present for an environment variable.
pub(crate) fn required_env_present(name: &str) -> bool {
    env_optional(name).is_some()
}

pub(crate) fn env_optional(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) => {
            let trimmed = value.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        Err(_) => None,
    }
}

pub(crate) fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
