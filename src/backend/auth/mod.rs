//! Authentication Module
//!
//! This module turns a bearer token into a `Principal`. The realtime core
//! only sees the `PrincipalResolver` trait; the JWT implementation lives in
//! `sessions`.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - AuthError and the PrincipalResolver trait
//! └── sessions.rs     - JWT claims, token creation and validation
//! ```
//!
//! # Security
//!
//! - Tokens are HS256 JWTs signed with the configured secret
//! - `exp` is mandatory; expired tokens are rejected with `AuthError::Expired`
//! - The token subject must be a valid `UserId`

use thiserror::Error;

use crate::shared::Principal;

/// JWT token generation and validation
pub mod sessions;

pub use sessions::{create_token, Claims, JwtPrincipalResolver};

/// Reasons a credential is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Signature, format or claims are invalid
    #[error("invalid token: {0}")]
    Invalid(String),
    /// The token is past its `exp`
    #[error("token expired")]
    Expired,
    /// The token subject is not a valid user id
    #[error("invalid token subject: {0}")]
    InvalidSubject(String),
}

/// Credential service consumed by the handshake
///
/// `validate` is synchronous: resolving a principal must not require I/O on
/// the upgrade path.
pub trait PrincipalResolver: Send + Sync {
    fn validate(&self, token: &str) -> Result<Principal, AuthError>;
}
