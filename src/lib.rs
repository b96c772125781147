//! XFChat - Main Library
//!
//! XFChat delivers direct text messages between authenticated users in real
//! time. The heart of the crate is the connection registry and routing
//! protocol: it holds live WebSocket connections, authenticates them during
//! the upgrade handshake, routes chat messages, typing indicators and read
//! receipts to the right recipient, and keeps connections healthy when peers
//! stall or disappear.
//!
//! # Module Structure
//!
//! - **`shared`** - Wire types that both the server and clients speak
//!   - `Envelope` frames, user identities, protocol errors
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum upgrade endpoint and REST history routes
//!   - Connection registry, inbound and outbound pumps
//!   - JWT principal resolution, PostgreSQL message store
//!
//! # Feature Flags
//!
//! - **`ssr`** - Server build (enabled by default). Pulls in Axum, sqlx and
//!   jsonwebtoken. Without it only the `shared` wire types are compiled, which
//!   is what a client needs.
//!
//! # Usage
//!
//! ```rust,no_run
//! use xfchat::backend::server::{config::ServerConfig, init::create_app};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::load()?;
//! let app = create_app(&config).await;
//! let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! - The registry is a single `std::sync::Mutex` around a `HashMap`, never held
//!   across an `.await`
//! - Every connection has one writer task; nothing else touches its socket
//! - Collaborators (`PrincipalResolver`, `MessageStore`) are `Send + Sync`
//!   trait objects shared through `Arc`

/// Wire types shared between server and clients
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
