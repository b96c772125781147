/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server,
 * including store selection, state creation, and route configuration.
 *
 * # Initialization Process
 *
 * 1. Open the database pool if `database_url` is configured
 * 2. Pick the message store: PostgreSQL, or in-memory without a database
 * 3. Build the JWT principal resolver from `jwt_secret`
 * 4. Create the application state and the router
 */

use axum::Router;
use std::sync::Arc;

use crate::backend::auth::JwtPrincipalResolver;
use crate::backend::messaging::{InMemoryMessageStore, MessageStore, PgMessageStore};
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, ServerConfig};
use crate::backend::server::state::AppState;

/// Create and configure the Axum application
///
/// # Error Handling
///
/// The function is designed to be resilient:
/// - Missing or unreachable database: messages are kept in memory
/// - Migration failures: logged but don't prevent startup
pub async fn create_app(config: &ServerConfig) -> Router<()> {
    tracing::info!("[Server] Initializing xfchat realtime server");

    let store: Arc<dyn MessageStore> = match load_database(config.database_url.as_deref()).await {
        Some(pool) => {
            tracing::info!("[Server] Using PostgreSQL message store");
            Arc::new(PgMessageStore::new(pool))
        }
        None => {
            tracing::info!("[Server] Using in-memory message store");
            Arc::new(InMemoryMessageStore::new())
        }
    };

    let resolver = Arc::new(JwtPrincipalResolver::new(&config.jwt_secret));
    let app_state = AppState::new(resolver, store, config.realtime.clone());

    tracing::debug!("[Server] Realtime settings: {:?}", config.realtime);
    create_router(app_state)
}
