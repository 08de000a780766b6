// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! # Runtime Configuration Constants
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for persistent storage | `data` |
//! | `UPLOAD_DIR` | Directory for uploaded files | `data/uploads` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `SESSION_SECRET` | HS256 key for session tokens | Dev fallback (warns) |
//! | `FIELD_SECRET` | Secret for at-rest field encryption | Dev fallback (warns) |
//! | `WOO_BASE_URL` | WooCommerce store base URL | Sync disabled if unset |
//! | `WOO_CONSUMER_KEY` | WooCommerce REST consumer key | Sync disabled if unset |
//! | `WOO_CONSUMER_SECRET` | WooCommerce REST consumer secret | Sync disabled if unset |
//! | `ADMIN_API_BASE_URL` | Administration backend base URL | Push disabled if unset |
//! | `ADMIN_API_KEY` | Administration backend API key | Push disabled if unset |
//! | `HOLIDAY_API_BASE_URL` | Public-holiday API base URL | `https://api-harilibur.vercel.app` |
//! | `FX_API_BASE_URL` | FX-rate API base URL | `https://open.er-api.com/v6/latest` |
//! | `WORKDAY_START` | Workday start time (HH:MM) | `09:00` |
//! | `WORKDAY_MINUTES` | Scheduled minutes per workday | `480` |
//! | `SYNC_INTERVAL_SECS` | Background store-sync interval (0 disables) | `900` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

/// Environment variable name for the persistent data directory path.
///
/// All entity records, the embedded operations database, audit logs and the
/// encrypted route-access override live under this directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Default data directory when `DATA_DIR` is unset.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Environment variable name for the upload directory path.
pub const UPLOAD_DIR_ENV: &str = "UPLOAD_DIR";

/// Default upload directory when `UPLOAD_DIR` is unset.
pub const DEFAULT_UPLOAD_DIR: &str = "data/uploads";

/// Environment variable name for the session-token signing secret.
pub const SESSION_SECRET_ENV: &str = "SESSION_SECRET";

/// Environment variable name for the field-encryption secret.
pub const FIELD_SECRET_ENV: &str = "FIELD_SECRET";

/// WooCommerce store configuration.
pub const WOO_BASE_URL_ENV: &str = "WOO_BASE_URL";
pub const WOO_CONSUMER_KEY_ENV: &str = "WOO_CONSUMER_KEY";
pub const WOO_CONSUMER_SECRET_ENV: &str = "WOO_CONSUMER_SECRET";

/// Administration backend configuration.
pub const ADMIN_API_BASE_URL_ENV: &str = "ADMIN_API_BASE_URL";
pub const ADMIN_API_KEY_ENV: &str = "ADMIN_API_KEY";

/// Public-holiday API configuration.
pub const HOLIDAY_API_BASE_URL_ENV: &str = "HOLIDAY_API_BASE_URL";
pub const DEFAULT_HOLIDAY_API_BASE_URL: &str = "https://api-harilibur.vercel.app";

/// FX-rate API configuration.
pub const FX_API_BASE_URL_ENV: &str = "FX_API_BASE_URL";
pub const DEFAULT_FX_API_BASE_URL: &str = "https://open.er-api.com/v6/latest";

/// Attendance workday configuration.
pub const WORKDAY_START_ENV: &str = "WORKDAY_START";
pub const DEFAULT_WORKDAY_START: &str = "09:00";
pub const WORKDAY_MINUTES_ENV: &str = "WORKDAY_MINUTES";
pub const DEFAULT_WORKDAY_MINUTES: u32 = 480;

/// Background store-sync interval in seconds. Zero disables the poller.
pub const SYNC_INTERVAL_ENV: &str = "SYNC_INTERVAL_SECS";
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 900;
