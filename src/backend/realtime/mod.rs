//! Real-time Messaging Module
//!
//! This module is the core of the server: it admits authenticated WebSocket
//! connections, keeps one live connection per user and routes envelopes
//! between them.
//!
//! # Architecture
//!
//! The realtime module is organized into focused submodules:
//!
//! - **`connection`** - Connection handle, mailbox items, close reasons
//! - **`registry`** - User id to connection map, `send_to_user`
//! - **`handshake`** - Credential carriers and the authenticator
//! - **`rate_limit`** - Per-connection sliding window
//! - **`inbound`** - Read loop: decode, throttle, dispatch
//! - **`persist`** - Per-connection store worker
//! - **`outbound`** - Write loop: coalesce, keepalive, close
//! - **`session`** - Wires the pumps together for one socket
//! - **`handler`** - `/ws`, presence and health endpoints
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── connection.rs   - Connection, Outbound, CloseReason, ActivityClock
//! ├── registry.rs     - ConnectionRegistry and Delivery
//! ├── handshake.rs    - CredentialCarrier and authenticate
//! ├── rate_limit.rs   - SlidingWindow
//! ├── inbound.rs      - InboundPump
//! ├── persist.rs      - StoreQueue and StoreJob
//! ├── outbound.rs     - OutboundPump
//! ├── session.rs      - run_session
//! └── handler.rs      - HTTP handlers
//! ```
//!
//! # Task Model
//!
//! Each connection has three tasks. The inbound pump runs in the upgrade
//! task; the outbound pump is spawned and is the only writer to the socket;
//! the store worker runs the connection's database calls. The registry holds
//! the only sender of each mailbox, so unregistering a connection is what
//! stops its writer.
//!
//! # Delivery Guarantees
//!
//! Delivery is best-effort and at most once. Envelopes from one sender to one
//! receiver arrive in the order the sender's pump processed them. Offline
//! receivers get nothing live; messages are still persisted, in send order,
//! and can be fetched from the history endpoint.

/// Connection handle and mailbox types
pub mod connection;

/// Connection registry
pub mod registry;

/// Upgrade authentication
pub mod handshake;

/// Sliding-window rate limiter
pub mod rate_limit;

/// Inbound pump
pub mod inbound;

/// Outbound pump
pub mod outbound;

/// Per-connection store worker
pub mod persist;

/// Per-socket session
pub mod session;

/// HTTP handlers
pub mod handler;

// Re-export commonly used types and functions
pub use connection::{ActivityClock, CloseReason, Connection, ConnectionId, Mailbox, Outbound};
pub use persist::{StoreJob, StoreQueue};
pub use registry::{ConnectionRegistry, Delivery};
pub use handshake::{authenticate, CredentialCarrier, CredentialSource, HandshakeError, DEFAULT_CARRIERS};
pub use handler::{get_presence, health, ws_upgrade};
