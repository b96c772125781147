//! Database operations for messaging
//!
//! This module contains the PostgreSQL implementation of `MessageStore`,
//! backed by the `direct_messages` table.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::store::{HistoryQuery, MessageRecord, MessageStore, NewMessage, StoreError};
use crate::shared::UserId;

/// `MessageStore` over a PostgreSQL pool
#[derive(Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn user_column(row: &PgRow, column: &str) -> Result<UserId, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    UserId::parse(raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn record_from_row(row: &PgRow) -> Result<MessageRecord, sqlx::Error> {
    Ok(MessageRecord {
        id: row.try_get("id")?,
        sender_id: user_column(row, "sender_id")?,
        receiver_id: user_column(row, "receiver_id")?,
        content: row.try_get("content")?,
        sent_at: row.try_get("sent_at")?,
        read_at: row.try_get("read_at")?,
    })
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn persist_message(&self, message: NewMessage) -> Result<MessageRecord, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO direct_messages (id, sender_id, receiver_id, content, sent_at, read_at)
            VALUES ($1, $2, $3, $4, $5, NULL)
            "#,
        )
        .bind(message.id)
        .bind(message.sender_id.as_str())
        .bind(message.receiver_id.as_str())
        .bind(&message.content)
        .bind(message.sent_at)
        .execute(&self.pool)
        .await?;

        Ok(MessageRecord::from(message))
    }

    async fn mark_read(&self, message_id: Uuid, reader: &UserId) -> Result<(), StoreError> {
        // COALESCE keeps the first read time on repeated receipts
        let result = sqlx::query(
            r#"
            UPDATE direct_messages
            SET read_at = COALESCE(read_at, $3)
            WHERE id = $1 AND receiver_id = $2
            "#,
        )
        .bind(message_id)
        .bind(reader.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(message_id));
        }
        Ok(())
    }

    async fn history(
        &self,
        user: &UserId,
        peer: &UserId,
        query: HistoryQuery,
    ) -> Result<Vec<MessageRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, sender_id, receiver_id, content, sent_at, read_at
            FROM direct_messages
            WHERE ((sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1))
              AND ($3::timestamptz IS NULL OR sent_at < $3)
            ORDER BY sent_at DESC
            LIMIT $4
            "#,
        )
        .bind(user.as_str())
        .bind(peer.as_str())
        .bind(query.before)
        .bind(i64::from(query.limit))
        .fetch_all(&self.pool)
        .await?;

        let records = rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}
