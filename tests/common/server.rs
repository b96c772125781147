//! Test server helpers
//!
//! Starts the real router on `127.0.0.1:0` with an in-memory message store.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use xfchat::backend::auth::JwtPrincipalResolver;
use uuid::Uuid;
use xfchat::backend::messaging::{InMemoryMessageStore, MessageRecord};
use xfchat::backend::routes::create_router;
use xfchat::backend::server::{AppState, RealtimeConfig};
use xfchat::shared::UserId;

use super::auth_helpers::TEST_SECRET;

/// A running server and handles to its state
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    pub store: Arc<InMemoryMessageStore>,
}

impl TestServer {
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Wait until `user_id` has (or no longer has) a registered connection
    pub async fn wait_online(&self, user_id: &UserId, online: bool) {
        let registry = self.state.registry.clone();
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            while registry.is_online(user_id) != online {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(waited.is_ok(), "{} never became online={}", user_id, online);
    }

    /// Wait for the store worker to persist `message_id`
    pub async fn wait_stored(&self, message_id: Uuid) -> MessageRecord {
        let store = self.store.clone();
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(record) = store.get(message_id) {
                    return record;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        waited.unwrap_or_else(|_| panic!("message {} was never persisted", message_id))
    }

    /// Wait until the store holds exactly `count` messages
    pub async fn wait_store_len(&self, count: usize) {
        let store = self.store.clone();
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            while store.len() != count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(waited.is_ok(), "store never reached {} messages", count);
    }
}

/// State wired the way `create_app` does, minus the database
pub fn test_state(config: RealtimeConfig) -> (AppState, Arc<InMemoryMessageStore>) {
    let store = Arc::new(InMemoryMessageStore::new());
    let state = AppState::new(
        Arc::new(JwtPrincipalResolver::new(TEST_SECRET)),
        store.clone(),
        config,
    );
    (state, store)
}

/// Router over a fresh in-memory state, for `oneshot` tests
pub fn test_router() -> (Router, AppState, Arc<InMemoryMessageStore>) {
    let (state, store) = test_state(RealtimeConfig::default());
    (create_router(state.clone()), state, store)
}

/// Bind an ephemeral port and serve the router in the background
pub async fn spawn_server(config: RealtimeConfig) -> TestServer {
    let (state, store) = test_state(config);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer { addr, state, store }
}
