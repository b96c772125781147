/**
 * Upgrade Handshake Authentication
 *
 * This module resolves the principal of an upgrade request before any socket
 * exists. Browsers cannot set headers on a WebSocket request, so a token may
 * arrive through one of three carriers, tried in order:
 *
 * 1. `Authorization: Bearer <token>`
 * 2. `Sec-WebSocket-Protocol: jwt, <token>`
 * 3. `?token=<token>`
 *
 * The first carrier whose token the resolver accepts wins and later carriers
 * are never consulted. A carrier that yields an invalid token does not stop
 * the search, so a stale header does not shadow a fresh query token.
 */

use axum::extract::Query;
use axum::http::{header, HeaderMap, Uri};
use serde::Deserialize;
use thiserror::Error;

use crate::backend::auth::{AuthError, PrincipalResolver};
use crate::shared::Principal;

/// Subprotocol name that introduces a token in `Sec-WebSocket-Protocol`
pub const JWT_SUBPROTOCOL: &str = "jwt";

/// A place a credential can be carried in an upgrade request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialCarrier {
    AuthorizationHeader,
    Subprotocol,
    QueryParameter,
}

/// Carriers accepted on `/ws`, in precedence order
pub const DEFAULT_CARRIERS: &[CredentialCarrier] = &[
    CredentialCarrier::AuthorizationHeader,
    CredentialCarrier::Subprotocol,
    CredentialCarrier::QueryParameter,
];

/// Carriers accepted on the REST endpoints
pub const HEADER_ONLY: &[CredentialCarrier] = &[CredentialCarrier::AuthorizationHeader];

/// Handshake failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandshakeError {
    #[error("missing credentials")]
    NoCredentials,
    #[error("credentials rejected: {0}")]
    Rejected(AuthError),
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Credential-bearing parts of an upgrade request
pub struct CredentialSource<'a> {
    headers: &'a HeaderMap,
    query_token: Option<String>,
}

impl<'a> CredentialSource<'a> {
    pub fn new(headers: &'a HeaderMap, uri: &Uri) -> Self {
        let query_token = Query::<TokenQuery>::try_from_uri(uri)
            .ok()
            .and_then(|Query(query)| query.token);
        Self { headers, query_token }
    }

    /// Source for requests that carry no query string
    pub fn from_headers(headers: &'a HeaderMap) -> Self {
        Self {
            headers,
            query_token: None,
        }
    }

    fn bearer(&self) -> Option<&str> {
        let value = self.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        let (scheme, token) = value.split_once(' ')?;
        scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
    }

    fn subprotocol(&self) -> Option<&str> {
        // Values may be split across header lines
        let mut protocols = self
            .headers
            .get_all(header::SEC_WEBSOCKET_PROTOCOL)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|protocol| !protocol.is_empty());

        match (protocols.next(), protocols.next()) {
            (Some(JWT_SUBPROTOCOL), Some(token)) => Some(token),
            _ => None,
        }
    }

    fn query(&self) -> Option<&str> {
        self.query_token.as_deref()
    }
}

impl CredentialCarrier {
    /// Extract this carrier's token, if present and non-empty
    pub fn extract<'s>(&self, source: &'s CredentialSource<'_>) -> Option<&'s str> {
        let token = match self {
            Self::AuthorizationHeader => source.bearer(),
            Self::Subprotocol => source.subprotocol(),
            Self::QueryParameter => source.query(),
        }?;
        (!token.is_empty()).then_some(token)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AuthorizationHeader => "authorization header",
            Self::Subprotocol => "subprotocol",
            Self::QueryParameter => "query parameter",
        }
    }
}

/// Successful handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub principal: Principal,
    /// The carrier that produced the accepted token
    pub carrier: CredentialCarrier,
}

/// Try `carriers` in order until the resolver accepts a token
///
/// # Returns
///
/// The principal and the winning carrier, or `HandshakeError` carrying the
/// last resolver error (or `NoCredentials` when no carrier had a token).
pub fn authenticate(
    carriers: &[CredentialCarrier],
    source: &CredentialSource<'_>,
    resolver: &dyn PrincipalResolver,
) -> Result<Authenticated, HandshakeError> {
    let mut last_error = None;

    for carrier in carriers {
        let Some(token) = carrier.extract(source) else {
            continue;
        };
        match resolver.validate(token) {
            Ok(principal) => {
                tracing::debug!(
                    "[Handshake] {} authenticated via {}",
                    principal.user_id,
                    carrier.name()
                );
                return Ok(Authenticated {
                    principal,
                    carrier: *carrier,
                });
            }
            Err(e) => {
                tracing::debug!("[Handshake] Token from {} rejected: {}", carrier.name(), e);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.map_or(HandshakeError::NoCredentials, HandshakeError::Rejected))
}
