//! In-memory message store
//!
//! Used when no database is configured, and by the test suites. Contents are
//! lost on restart.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use super::store::{HistoryQuery, MessageRecord, MessageStore, NewMessage, StoreError};
use crate::shared::UserId;

#[derive(Default)]
pub struct InMemoryMessageStore {
    messages: Mutex<Vec<MessageRecord>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<MessageRecord>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored messages
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn get(&self, message_id: Uuid) -> Option<MessageRecord> {
        self.lock().iter().find(|m| m.id == message_id).cloned()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn persist_message(&self, message: NewMessage) -> Result<MessageRecord, StoreError> {
        let record = MessageRecord::from(message);
        self.lock().push(record.clone());
        Ok(record)
    }

    async fn mark_read(&self, message_id: Uuid, reader: &UserId) -> Result<(), StoreError> {
        let mut messages = self.lock();
        let record = messages
            .iter_mut()
            .find(|m| m.id == message_id && &m.receiver_id == reader)
            .ok_or(StoreError::NotFound(message_id))?;
        record.read_at.get_or_insert_with(Utc::now);
        Ok(())
    }

    async fn history(
        &self,
        user: &UserId,
        peer: &UserId,
        query: HistoryQuery,
    ) -> Result<Vec<MessageRecord>, StoreError> {
        let messages = self.lock();
        let mut page: Vec<MessageRecord> = messages
            .iter()
            .filter(|m| {
                (&m.sender_id == user && &m.receiver_id == peer)
                    || (&m.sender_id == peer && &m.receiver_id == user)
            })
            .filter(|m| query.before.map_or(true, |before| m.sent_at < before))
            .cloned()
            .collect();
        page.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        page.truncate(query.limit as usize);
        Ok(page)
    }
}
