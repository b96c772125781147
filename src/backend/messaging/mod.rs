//! Messaging Module
//!
//! This module handles message persistence: the `MessageStore` interface the
//! realtime core writes to, its PostgreSQL and in-memory implementations, and
//! the REST handlers for history and read state.

pub mod store;
pub mod db;
pub mod memory;
pub mod handlers;

pub use store::{
    with_timeout, HistoryQuery, MessageRecord, MessageStore, NewMessage, StoreError,
    DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT,
};
pub use db::PgMessageStore;
pub use memory::InMemoryMessageStore;
pub use handlers::{get_history, mark_message_read};
