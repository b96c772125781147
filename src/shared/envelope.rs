/**
 * Wire Envelope
 *
 * This module defines the JSON frames exchanged over the persistent
 * connection, one object per WebSocket text frame.
 *
 * # Inbound vs Outbound
 *
 * Client frames are decoded in two steps. `InboundFrame` is a permissive
 * shape where `type` is a plain string and every other field is optional, so
 * that an unknown `type` can be told apart from broken JSON. `into_command`
 * then validates the frame for its kind and produces a `Command`.
 *
 * Server frames are `Envelope` values. `sender_id` is only ever set by the
 * server from the authenticated connection; a `sender_id` sent by a client is
 * not even read.
 *
 * # Wire Format
 *
 * ```json
 * {
 *   "type": "message",
 *   "sender_id": "u1",
 *   "receiver_id": "u2",
 *   "content": "hi",
 *   "message_id": "1b4e28ba-2fa1-11d2-883f-0016d3cca427",
 *   "timestamp": "2025-01-01T12:00:00+00:00"
 * }
 * ```
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::ProtocolError;
use crate::shared::identity::UserId;

/// Kind of envelope
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeType {
    /// Chat message
    Message,
    /// Typing indicator
    Typing,
    /// Read receipt
    Read,
    /// Server-side error report
    Error,
    /// Legacy in-band authentication frame
    Auth,
}

impl EnvelopeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Typing => "typing",
            Self::Read => "read",
            Self::Error => "error",
            Self::Auth => "auth",
        }
    }
}

/// A frame as a client sent it, before validation
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub receiver_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub is_typing: Option<bool>,
    #[serde(default)]
    pub message_id: Option<String>,
    /// Only present on legacy `auth` frames
    #[serde(default)]
    pub token: Option<String>,
}

/// A validated client request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Deliver `content` to `receiver_id` and persist it
    Message { receiver_id: UserId, content: String },
    /// Forward a typing indicator
    Typing { receiver_id: UserId, is_typing: bool },
    /// Mark `message_id` read and tell its sender
    Read { receiver_id: UserId, message_id: Uuid },
    /// Pre-handshake style authentication; the connection is already authenticated
    LegacyAuth,
}

impl InboundFrame {
    /// Decode a text frame into its permissive shape
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Validate the frame for its declared kind
    pub fn into_command(self) -> Result<Command, ProtocolError> {
        match self.kind.as_str() {
            "message" => {
                let receiver_id = required_receiver("message", self.receiver_id)?;
                let content = self
                    .content
                    .ok_or(ProtocolError::missing("message", "content"))?;
                Ok(Command::Message { receiver_id, content })
            }
            "typing" => {
                let receiver_id = required_receiver("typing", self.receiver_id)?;
                let is_typing = self
                    .is_typing
                    .ok_or(ProtocolError::missing("typing", "is_typing"))?;
                Ok(Command::Typing { receiver_id, is_typing })
            }
            "read" => {
                let receiver_id = required_receiver("read", self.receiver_id)?;
                let raw = self
                    .message_id
                    .ok_or(ProtocolError::missing("read", "message_id"))?;
                let message_id = Uuid::parse_str(&raw)
                    .map_err(|_| ProtocolError::malformed("message_id is not a UUID"))?;
                Ok(Command::Read { receiver_id, message_id })
            }
            "auth" => Ok(Command::LegacyAuth),
            other => Err(ProtocolError::unknown_type(other)),
        }
    }
}

fn required_receiver(kind: &'static str, raw: Option<String>) -> Result<UserId, ProtocolError> {
    let raw = raw.ok_or(ProtocolError::missing(kind, "receiver_id"))?;
    Ok(UserId::parse(raw)?)
}

/// Decode and validate a text frame in one step
pub fn parse_command(text: &str) -> Result<Command, ProtocolError> {
    InboundFrame::decode(text)?.into_command()
}

/// A frame sent by the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_typing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<Uuid>,
    pub timestamp: String,
}

impl Envelope {
    fn bare(kind: EnvelopeType) -> Self {
        Self {
            kind,
            sender_id: None,
            receiver_id: None,
            content: None,
            is_typing: None,
            message_id: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Chat message, stamped with the id and time it was persisted under
    pub fn message(
        sender_id: UserId,
        receiver_id: UserId,
        message_id: Uuid,
        content: String,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sender_id: Some(sender_id),
            receiver_id: Some(receiver_id),
            content: Some(content),
            message_id: Some(message_id),
            timestamp: sent_at.to_rfc3339(),
            ..Self::bare(EnvelopeType::Message)
        }
    }

    pub fn typing(sender_id: UserId, receiver_id: UserId, is_typing: bool) -> Self {
        Self {
            sender_id: Some(sender_id),
            receiver_id: Some(receiver_id),
            is_typing: Some(is_typing),
            ..Self::bare(EnvelopeType::Typing)
        }
    }

    /// Read receipt; `sender_id` is the reader, `receiver_id` the original author
    pub fn read_receipt(reader: UserId, author: UserId, message_id: Uuid) -> Self {
        Self {
            sender_id: Some(reader),
            receiver_id: Some(author),
            message_id: Some(message_id),
            ..Self::bare(EnvelopeType::Read)
        }
    }

    /// In-band error report; the description goes in `content`
    pub fn error(description: impl Into<String>) -> Self {
        Self {
            content: Some(description.into()),
            ..Self::bare(EnvelopeType::Error)
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<&ProtocolError> for Envelope {
    fn from(error: &ProtocolError) -> Self {
        Envelope::error(error.to_string())
    }
}
