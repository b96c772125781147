/**
 * Session Tokens
 *
 * This module handles JWT token generation and validation. Tokens are issued
 * by the account service that shares the secret; the realtime server only
 * validates them, but `create_token` is kept here for tooling and tests.
 */

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{AuthError, PrincipalResolver};
use crate::shared::{Principal, UserId};

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Email (optional for service-issued tokens)
    #[serde(default)]
    pub email: Option<String>,
    /// Display name
    #[serde(default)]
    pub username: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

impl Claims {
    /// Claims for `user_id` valid for `ttl` from now
    pub fn new(user_id: &UserId, display_name: &str, ttl: Duration) -> Self {
        let now = unix_now();
        Self {
            sub: user_id.to_string(),
            email: None,
            username: Some(display_name.to_string()),
            exp: now + ttl.as_secs(),
            iat: now,
        }
    }

    fn display_name(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.sub.clone())
    }
}

fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Sign arbitrary claims
pub fn encode_claims(secret: &str, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes()))
}

/// Create a JWT token for a user
///
/// # Arguments
/// * `secret` - Shared HS256 secret
/// * `user_id` - Subject of the token
/// * `display_name` - Stored in the `username` claim
/// * `ttl` - Lifetime of the token
pub fn create_token(
    secret: &str,
    user_id: &UserId,
    display_name: &str,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    encode_claims(secret, &Claims::new(user_id, display_name, ttl))
}

/// `PrincipalResolver` backed by HS256 JWTs
pub struct JwtPrincipalResolver {
    key: DecodingKey,
    validation: Validation,
}

impl JwtPrincipalResolver {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify and decode a JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid(e.to_string()),
            })
    }
}

impl PrincipalResolver for JwtPrincipalResolver {
    fn validate(&self, token: &str) -> Result<Principal, AuthError> {
        let claims = self.verify_token(token)?;
        let user_id = UserId::parse(claims.sub.clone())
            .map_err(|e| AuthError::InvalidSubject(e.to_string()))?;
        Ok(Principal::new(user_id, claims.display_name()))
    }
}
