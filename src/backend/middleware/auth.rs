/**
 * Authentication Extractor
 *
 * This module protects the REST endpoints. `AuthUser` runs the same
 * authenticator as the WebSocket handshake, restricted to the
 * `Authorization: Bearer` header, and rejects with a 401 `BackendError`.
 */

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::backend::error::BackendError;
use crate::backend::realtime::handshake::{authenticate, CredentialSource, HEADER_ONLY};
use crate::backend::server::state::AppState;
use crate::shared::Principal;

/// Axum extractor for the authenticated caller
///
/// ```rust,ignore
/// async fn handler(AuthUser(principal): AuthUser) -> String {
///     principal.user_id.to_string()
/// }
/// ```
#[derive(Clone, Debug)]
pub struct AuthUser(pub Principal);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let source = CredentialSource::from_headers(&parts.headers);
        let authenticated = authenticate(HEADER_ONLY, &source, state.resolver.as_ref()).map_err(|e| {
            tracing::warn!("[Auth] Rejected request to {}: {}", parts.uri.path(), e);
            BackendError::from(e)
        })?;
        Ok(AuthUser(authenticated.principal))
    }
}
