//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - Token helpers
//! - A server bound to an ephemeral port
//! - A WebSocket client with frame helpers

#![allow(dead_code)]

pub mod auth_helpers;
pub mod server;
pub mod ws_client;

// Re-export commonly used utilities
pub use auth_helpers::*;
pub use server::*;
pub use ws_client::*;
