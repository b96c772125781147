//! Message Store Interface
//!
//! The realtime core asks the store to persist a message only after it has
//! decided the message is valid, and never waits on it before live delivery.
//! Every store call from the core is wrapped in `with_timeout` so an
//! unresponsive database degrades to a logged `StoreError::Timeout`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::shared::UserId;

/// Default page size for history queries
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;
/// Upper bound for history page size
pub const MAX_HISTORY_LIMIT: u32 = 200;

/// Message store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("message store unavailable")]
    Unavailable,
    #[error("message {0} not found")]
    NotFound(Uuid),
    #[error("message store timed out after {0:?}")]
    Timeout(Duration),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A message the core has accepted for delivery
///
/// `id` and `sent_at` are assigned before delivery so the live envelope and
/// the stored row agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub id: Uuid,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl NewMessage {
    pub fn new(sender_id: UserId, receiver_id: UserId, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            content,
            sent_at: Utc::now(),
        }
    }
}

/// A persisted message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: Uuid,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl From<NewMessage> for MessageRecord {
    fn from(message: NewMessage) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            content: message.content,
            sent_at: message.sent_at,
            read_at: None,
        }
    }
}

/// Page selector for conversation history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryQuery {
    pub limit: u32,
    /// Only messages sent strictly before this instant
    pub before: Option<DateTime<Utc>>,
}

impl HistoryQuery {
    pub fn new(limit: Option<u32>, before: Option<DateTime<Utc>>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT),
            before,
        }
    }
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Durable persistence of messages and read state
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist an accepted message
    async fn persist_message(&self, message: NewMessage) -> Result<MessageRecord, StoreError>;

    /// Mark `message_id` read; only its receiver may do so
    async fn mark_read(&self, message_id: Uuid, reader: &UserId) -> Result<(), StoreError>;

    /// Messages exchanged between `user` and `peer`, newest first
    async fn history(
        &self,
        user: &UserId,
        peer: &UserId,
        query: HistoryQuery,
    ) -> Result<Vec<MessageRecord>, StoreError>;
}

/// Bound a store call by `limit`
pub async fn with_timeout<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}
