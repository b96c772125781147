//! Shared Module
//!
//! This module contains the types that travel over the persistent
//! connection. They are platform-agnostic and only depend on serde, so a
//! client can build against this crate without the `ssr` feature.
//!
//! # Overview
//!
//! - **`identity`** - `UserId` and `Principal`
//! - **`envelope`** - inbound frame decoding and outbound `Envelope` frames
//! - **`error`** - `ProtocolError`, the reasons a frame can be refused

/// User identity types
pub mod identity;

/// Wire envelope types
pub mod envelope;

/// Protocol error types
pub mod error;

/// Re-export commonly used types for convenience
pub use identity::{Principal, UserId};
pub use envelope::{Command, Envelope, EnvelopeType, InboundFrame};
pub use error::ProtocolError;
