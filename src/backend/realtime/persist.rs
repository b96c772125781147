/**
 * Store Queue
 *
 * Store calls made on behalf of one connection run in a worker task, so the
 * read loop never waits on the database. The worker handles one job at a
 * time in submission order, and each call is bounded by `store_timeout`.
 *
 * # Read Receipts
 *
 * A receipt is routed to the author only after its `mark_read` call has
 * returned. `NotFound` means the reader is not the receiver of that message,
 * or the message is unknown, and the receipt is dropped. Any other store
 * failure still forwards it.
 *
 * # Overflow
 *
 * `submit` never waits. A job that does not fit in the queue is dropped and
 * logged.
 *
 * # Shutdown
 *
 * The worker drains the queue and stops once every `StoreQueue` handle is
 * gone, so jobs accepted before a disconnect still complete.
 */

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::registry::ConnectionRegistry;
use crate::backend::messaging::{with_timeout, MessageStore, NewMessage, StoreError};
use crate::backend::server::config::RealtimeConfig;
use crate::shared::{Envelope, UserId};

/// One store call queued by an inbound pump
#[derive(Debug)]
pub enum StoreJob {
    Persist(NewMessage),
    /// Mark `message_id` read by `reader`, then send `author` a receipt
    MarkRead {
        message_id: Uuid,
        reader: UserId,
        author: UserId,
    },
}

impl fmt::Display for StoreJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Persist(message) => write!(f, "message {} from {}", message.id, message.sender_id),
            Self::MarkRead { message_id, reader, .. } => {
                write!(f, "read receipt for {} from {}", message_id, reader)
            }
        }
    }
}

/// Submitting side of a connection's store worker
#[derive(Debug, Clone)]
pub struct StoreQueue {
    jobs: mpsc::Sender<StoreJob>,
}

impl StoreQueue {
    /// Spawn the worker and return its queue and task handle
    pub fn spawn(
        registry: Arc<ConnectionRegistry>,
        store: Arc<dyn MessageStore>,
        config: &RealtimeConfig,
    ) -> (Self, JoinHandle<()>) {
        let (jobs, receiver) = mpsc::channel(config.store_queue_capacity.max(1));
        let worker = StoreWorker {
            registry,
            store,
            timeout: config.store_timeout(),
            jobs: receiver,
        };
        (Self { jobs }, tokio::spawn(worker.run()))
    }

    /// Queue a job without waiting; `false` if it was dropped
    pub fn submit(&self, job: StoreJob) -> bool {
        match self.jobs.try_send(job) {
            Ok(()) => true,
            Err(TrySendError::Full(job)) => {
                tracing::error!("[Store] Queue full, dropping {}", job);
                false
            }
            Err(TrySendError::Closed(job)) => {
                tracing::error!("[Store] Worker gone, dropping {}", job);
                false
            }
        }
    }
}

struct StoreWorker {
    registry: Arc<ConnectionRegistry>,
    store: Arc<dyn MessageStore>,
    timeout: Duration,
    jobs: mpsc::Receiver<StoreJob>,
}

impl StoreWorker {
    async fn run(mut self) {
        while let Some(job) = self.jobs.recv().await {
            self.handle(job).await;
        }
    }

    async fn handle(&self, job: StoreJob) {
        match job {
            StoreJob::Persist(message) => {
                let message_id = message.id;
                if let Err(e) = with_timeout(self.timeout, self.store.persist_message(message)).await {
                    tracing::error!("[Store] Failed to persist message {}: {}", message_id, e);
                }
            }
            StoreJob::MarkRead {
                message_id,
                reader,
                author,
            } => {
                match with_timeout(self.timeout, self.store.mark_read(message_id, &reader)).await {
                    Ok(()) => {}
                    Err(StoreError::NotFound(_)) => {
                        tracing::warn!(
                            "[Realtime] Dropping read receipt from {} for {}: not their message",
                            reader,
                            message_id
                        );
                        return;
                    }
                    Err(e) => tracing::error!(
                        "[Store] Failed to mark message {} read by {}: {}",
                        message_id,
                        reader,
                        e
                    ),
                }
                let receipt = Envelope::read_receipt(reader, author.clone(), message_id);
                self.registry.send_to_user(&author, receipt);
            }
        }
    }
}
