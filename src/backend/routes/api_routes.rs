/**
 * API Route Handlers
 *
 * This module wires the REST endpoints. All of them require an
 * `Authorization: Bearer <token>` header, checked by the `AuthUser`
 * extractor in each handler.
 *
 * # Routes
 *
 * ## Messages
 * - `GET /api/messages/{peer_id}?limit=&before=` - Conversation history
 * - `PATCH /api/messages/{message_id}/read` - Mark a message read
 *
 * ## Presence
 * - `GET /api/presence/{user_id}` - Whether a user is connected
 */

use axum::{
    routing::{get, patch},
    Router,
};

use crate::backend::messaging::handlers::{get_history, mark_message_read};
use crate::backend::realtime::get_presence;
use crate::backend::server::state::AppState;

/// Configure API routes
///
/// # Arguments
///
/// * `router` - The router to add routes to
///
/// # Returns
///
/// Router with API routes configured
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        // `{id}` is the peer for history and the message for read state
        .route("/api/messages/{id}", get(get_history))
        .route("/api/messages/{id}/read", patch(mark_message_read))
        // Presence
        .route("/api/presence/{user_id}", get(get_presence))
}
