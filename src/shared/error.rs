//! Protocol Error Types
//!
//! This module defines the reasons an inbound frame can be refused. Every
//! variant is recoverable: the inbound pump answers with an `error` envelope
//! whose `content` is the `Display` text of the variant, and keeps reading.
//!
//! # Error Categories
//!
//! - `Malformed` - the frame is not a JSON object of the expected shape
//! - `UnknownType` - the `type` field names no known frame kind
//! - `MissingField` - a field required by the frame kind is absent
//! - `InvalidReceiver` - `receiver_id` is not a valid user id
//! - `FrameTooLarge` - the frame is above the soft size limit
//! - `BinaryFrame` - the peer sent a binary frame; the protocol is JSON text
//!
//! # Usage
//!
//! ```rust
//! use xfchat::shared::error::ProtocolError;
//!
//! let error = ProtocolError::unknown_type("wave");
//! assert_eq!(error.to_string(), "unknown message type: wave");
//! ```
use thiserror::Error;

use crate::shared::identity::InvalidUserId;

/// Reasons an inbound frame is refused
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// JSON decoding failed
    #[error("malformed frame: {message}")]
    Malformed {
        /// Decoder message, including line and column
        message: String,
    },

    /// The `type` field is not one of the known frame kinds
    #[error("unknown message type: {kind}")]
    UnknownType {
        /// The value the client sent
        kind: String,
    },

    /// A field required by the frame kind is absent
    #[error("missing field '{field}' for {kind} frame")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    /// `receiver_id` failed identifier validation
    #[error("invalid receiver_id: {0}")]
    InvalidReceiver(#[from] InvalidUserId),

    /// Frame exceeds the configured soft limit
    #[error("frame of {size} bytes exceeds limit of {limit} bytes")]
    FrameTooLarge { size: usize, limit: usize },

    /// Binary frames are not part of the protocol
    #[error("binary frames are not supported")]
    BinaryFrame,
}

impl ProtocolError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    pub fn unknown_type(kind: impl Into<String>) -> Self {
        Self::UnknownType { kind: kind.into() }
    }

    pub fn missing(kind: &'static str, field: &'static str) -> Self {
        Self::MissingField { kind, field }
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(err.to_string())
    }
}
