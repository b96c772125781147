//! Realtime integration tests
//!
//! WebSocket clients (tokio-tungstenite) against a live server

mod backpressure_test;
mod handshake_test;
