// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Session token issuance and verification (HS256).

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::warn;

use super::claims::SessionClaims;
use super::error::AuthError;
use super::roles::Role;
use crate::config::SESSION_SECRET_ENV;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Session lifetime in seconds (12 hours).
const SESSION_TTL_SECS: i64 = 12 * 60 * 60;

/// Development fallback secret used when `SESSION_SECRET` is unset.
const DEV_SESSION_SECRET: &str = "ichibot-dev-session-secret";

/// Issues and verifies HS256 session tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl TokenService {
    /// Create a token service from a raw signing secret.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: SESSION_TTL_SECS,
        }
    }

    /// Create from `SESSION_SECRET`, warning on the dev fallback.
    pub fn from_env() -> Self {
        match std::env::var(SESSION_SECRET_ENV) {
            Ok(secret) if !secret.is_empty() => Self::new(&secret),
            _ => {
                warn!("SESSION_SECRET is not set; using development fallback key");
                Self::new(DEV_SESSION_SECRET)
            }
        }
    }

    /// Issue a session token for the given user.
    pub fn issue(&self, user_id: &str, username: &str, role: Role) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role,
            iat: now,
            exp: now + self.ttl_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::InternalError(format!("failed to sign session token: {e}")))
    }

    /// Verify a session token and return its claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_aud = false;

        let data = decode::<SessionClaims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                jsonwebtoken::errors::ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
                _ => AuthError::MalformedToken,
            }
        })?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_and_verify_round_trips() {
        let service = TokenService::new("test-secret");
        let token = service.issue("user-1", "budi", Role::Cashier).unwrap();

        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.username, "budi");
        assert_eq!(claims.role, Role::Cashier);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = TokenService::new("secret-a")
            .issue("user-1", "budi", Role::Staff)
            .unwrap();

        let result = TokenService::new("secret-b").verify(&token);
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn garbage_token_is_malformed() {
        let service = TokenService::new("test-secret");
        assert!(matches!(
            service.verify("not.a.token"),
            Err(AuthError::MalformedToken)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut service = TokenService::new("test-secret");
        // Issue a token that expired well past the leeway window
        service.ttl_secs = -10_000;
        let token = service.issue("user-1", "budi", Role::Staff).unwrap();

        assert!(matches!(
            service.verify(&token),
            Err(AuthError::TokenExpired)
        ));
    }
}
