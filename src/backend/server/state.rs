/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct serves as the central state container for the
 * application, holding:
 * - The connection registry shared by every socket
 * - The principal resolver used by the handshake and `AuthUser`
 * - The message store (PostgreSQL or in-memory)
 * - The realtime tunables and the accepted credential carriers
 *
 * Everything is behind `Arc`, so cloning the state per request is cheap.
 *
 * # Example
 *
 * ```rust
 * use axum::extract::State;
 * use std::sync::Arc;
 * use xfchat::backend::realtime::ConnectionRegistry;
 *
 * async fn handler(State(registry): State<Arc<ConnectionRegistry>>) -> String {
 *     registry.connected_count().to_string()
 * }
 * ```
 */

use axum::extract::FromRef;
use std::sync::Arc;

use crate::backend::auth::PrincipalResolver;
use crate::backend::messaging::MessageStore;
use crate::backend::realtime::handshake::{CredentialCarrier, DEFAULT_CARRIERS};
use crate::backend::realtime::ConnectionRegistry;
use crate::backend::server::config::RealtimeConfig;

/// Application state shared by all handlers
///
/// # Fields
///
/// * `registry` - Live connections keyed by user id
/// * `resolver` - Token to principal resolution
/// * `store` - Message persistence
/// * `realtime` - Mailbox, timeout and rate-limit settings
/// * `carriers` - Credential carriers accepted on `/ws`, in precedence order
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConnectionRegistry>,
    pub resolver: Arc<dyn PrincipalResolver>,
    pub store: Arc<dyn MessageStore>,
    pub realtime: Arc<RealtimeConfig>,
    pub carriers: Arc<[CredentialCarrier]>,
}

impl AppState {
    pub fn new(
        resolver: Arc<dyn PrincipalResolver>,
        store: Arc<dyn MessageStore>,
        realtime: RealtimeConfig,
    ) -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
            resolver,
            store,
            realtime: Arc::new(realtime),
            carriers: Arc::from(DEFAULT_CARRIERS),
        }
    }

    /// Replace the accepted credential carriers
    pub fn with_carriers(mut self, carriers: &[CredentialCarrier]) -> Self {
        self.carriers = Arc::from(carriers);
        self
    }
}

/// Implement FromRef for the connection registry
///
/// This allows handlers that only route or inspect presence to extract
/// `State<Arc<ConnectionRegistry>>` directly.
impl FromRef<AppState> for Arc<ConnectionRegistry> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.registry.clone()
    }
}

/// Implement FromRef for the message store
impl FromRef<AppState> for Arc<dyn MessageStore> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.store.clone()
    }
}

/// Implement FromRef for the realtime configuration
impl FromRef<AppState> for Arc<RealtimeConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.realtime.clone()
    }
}
