// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! # Authentication & Authorization Module
//!
//! Session-token authentication plus per-route role gating.
//!
//! ## Auth Flow
//!
//! 1. Client logs in at `/v1/session/login` with username + password
//! 2. Server verifies the argon2 hash and issues an HS256 session token
//! 3. Client sends `Authorization: Bearer <token>` on every request
//! 4. The gate middleware:
//!    - Verifies signature, expiry, structure
//!    - Extracts the user id, username and role
//!    - Consults the route allow-list (ADMIN always passes)
//!
//! ## Security
//!
//! - All non-public endpoints require authentication
//! - Clock skew tolerance is 60 seconds
//! - The route allow-list override persists encrypted at rest

pub mod claims;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod passwords;
pub mod roles;
pub mod tokens;

pub use claims::AuthenticatedUser;
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use gate::RouteAccess;
pub use roles::Role;
pub use tokens::TokenService;
