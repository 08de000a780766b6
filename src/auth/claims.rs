// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Session token claims and authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;

/// Claims carried in a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID) - the canonical user identifier
    pub sub: String,

    /// Login username
    pub username: String,

    /// User's role at token-issue time
    pub role: Role,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,
}

/// Authenticated user information extracted from a session token.
///
/// This is the primary type used throughout the application to represent
/// the authenticated user making a request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Canonical user ID (token `sub` claim)
    pub user_id: String,

    /// Login username
    pub username: String,

    /// User's role
    pub role: Role,

    /// Token expiration (Unix timestamp, used for validation, not serialized)
    #[serde(skip)]
    pub expires_at: i64,
}

impl AuthenticatedUser {
    /// Create from verified session claims.
    pub fn from_claims(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
            expires_at: claims.exp,
        }
    }

    /// Check if this user is an admin.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> SessionClaims {
        SessionClaims {
            sub: "user-123".to_string(),
            username: "budi".to_string(),
            role: Role::Hr,
            iat: 1700000000,
            exp: 1700003600,
        }
    }

    #[test]
    fn from_claims_extracts_fields() {
        let user = AuthenticatedUser::from_claims(sample_claims());
        assert_eq!(user.user_id, "user-123");
        assert_eq!(user.username, "budi");
        assert_eq!(user.role, Role::Hr);
        assert_eq!(user.expires_at, 1700003600);
    }

    #[test]
    fn is_admin_checks_role() {
        let mut claims = sample_claims();
        claims.role = Role::Admin;
        assert!(AuthenticatedUser::from_claims(claims).is_admin());
        assert!(!AuthenticatedUser::from_claims(sample_claims()).is_admin());
    }
}
