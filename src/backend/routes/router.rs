/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Routes
 *
 * - `GET /ws` - WebSocket upgrade, authenticated by the handshake
 * - `GET /health` - liveness, no authentication
 * - `/api/...` - REST endpoints, see `api_routes`
 *
 * Every request is traced by `TraceLayer`.
 */

use axum::{http::StatusCode, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::backend::error::BackendError;
use crate::backend::realtime::{health, ws_upgrade};
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// # Arguments
///
/// * `app_state` - Application state shared by every handler
///
/// # Returns
///
/// Configured Axum Router ready to serve requests
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new()
        .route("/ws", get(ws_upgrade))
        .route("/health", get(health));

    let router = configure_api_routes(router);

    // Fallback handler for 404
    let router = router.fallback(|| async { BackendError::handler(StatusCode::NOT_FOUND, "not found") });

    router
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state)
}
