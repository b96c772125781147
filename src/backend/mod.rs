//! Backend Module
//!
//! This module contains all server-side code of xfchat: the Axum server, the
//! realtime connection core and its collaborators.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! The backend is organized into focused submodules:
//!
//! - **`server`** - Configuration, application state, initialization
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`realtime`** - Connection registry, handshake, inbound and outbound pumps
//! - **`auth`** - `PrincipalResolver` and the JWT implementation
//! - **`messaging`** - `MessageStore`, PostgreSQL and in-memory stores, REST handlers
//! - **`middleware`** - `AuthUser` extractor for REST routes
//! - **`error`** - `BackendError` and its HTTP conversion
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── realtime/       - Live connections and routing
//! ├── auth/           - Token validation
//! ├── messaging/      - Message persistence
//! ├── middleware/     - Request extractors
//! └── error/          - Error types
//! ```
//!
//! # State Management
//!
//! `AppState` holds the registry, the resolver, the store and the realtime
//! settings, each behind an `Arc`. Handlers take `State<AppState>` or one of
//! its `FromRef` parts.
//!
//! # Error Handling
//!
//! - `BackendError` for HTTP responses (`{"error", "status"}` JSON)
//! - In-band `error` envelopes for frames a connection sends
//! - Store failures on the realtime path are logged, never returned

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Real-time connection core
pub mod realtime;

/// Backend error types
pub mod error;

/// Token validation
pub mod auth;

/// Request extractors
pub mod middleware;

/// Message persistence
pub mod messaging;

/// Re-export commonly used types
pub use error::BackendError;
pub use realtime::ConnectionRegistry;
pub use server::{create_app, AppState};
