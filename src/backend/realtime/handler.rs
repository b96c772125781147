/**
 * Realtime HTTP Handlers
 *
 * - `GET /ws` - authenticated WebSocket upgrade
 * - `GET /api/presence/{user_id}` - whether a user has a live connection
 * - `GET /health` - liveness and connection count
 *
 * # Upgrade Order
 *
 * The handshake runs before the upgrade is validated, so a request without
 * valid credentials gets a 401 whether or not it is a proper upgrade, and no
 * socket or mailbox is ever allocated for it.
 */

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocketUpgrade},
        Path, State,
    },
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::handshake::{authenticate, CredentialCarrier, CredentialSource, JWT_SUBPROTOCOL};
use super::registry::ConnectionRegistry;
use super::session::run_session;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::UserId;

/// Upgrade to a realtime connection
pub async fn ws_upgrade(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let source = CredentialSource::new(&headers, &uri);
    let authenticated = match authenticate(&state.carriers, &source, state.resolver.as_ref()) {
        Ok(authenticated) => authenticated,
        Err(e) => {
            tracing::warn!("[Handshake] Upgrade rejected: {}", e);
            return BackendError::from(e).into_response();
        }
    };

    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => return rejection.into_response(),
    };

    let limit = state.realtime.transport_limit();
    let mut upgrade = upgrade.max_message_size(limit).max_frame_size(limit);
    if authenticated.carrier == CredentialCarrier::Subprotocol {
        upgrade = upgrade.protocols([JWT_SUBPROTOCOL]);
    }

    let principal = authenticated.principal;
    upgrade
        .on_failed_upgrade(|e| tracing::warn!("[Handshake] Upgrade failed: {}", e))
        .on_upgrade(move |socket| run_session(socket, principal, state))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PresenceResponse {
    pub user_id: UserId,
    pub online: bool,
}

/// `GET /api/presence/{user_id}`
pub async fn get_presence(
    State(registry): State<Arc<ConnectionRegistry>>,
    AuthUser(_caller): AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<PresenceResponse>, BackendError> {
    let user_id = UserId::parse(user_id)
        .map_err(|e| BackendError::handler(StatusCode::BAD_REQUEST, e.to_string()))?;
    let online = registry.is_online(&user_id);
    Ok(Json(PresenceResponse { user_id, online }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub connections: usize,
}

/// `GET /health`
pub async fn health(State(registry): State<Arc<ConnectionRegistry>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        connections: registry.connected_count(),
    })
}
