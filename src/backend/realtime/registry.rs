/**
 * Connection Registry
 *
 * The registry maps each online user to their single live connection. It is
 * the only place envelopes are routed through.
 *
 * # Locking
 *
 * One `std::sync::Mutex` guards the map. It is held for map operations and
 * `try_send` only, never across an `.await`, so the registry can be called
 * from any task without blocking the runtime.
 *
 * # Backpressure
 *
 * `send_to_user` never waits. When a receiver's mailbox is full the receiver
 * is evicted: its entry is removed and closed with `GoingAway`, and its
 * outbound pump tears the socket down without writing the backlog. The
 * sender is never told.
 */

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::error::TrySendError;

use super::connection::{CloseReason, Connection, ConnectionId, Outbound};
use crate::shared::{Envelope, UserId};

/// Outcome of routing one envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Enqueued on the receiver's mailbox
    Queued,
    /// The receiver has no live connection
    Offline,
    /// The receiver's mailbox was full; the receiver was disconnected
    Evicted,
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Queued => "queued",
            Self::Offline => "offline",
            Self::Evicted => "evicted",
        })
    }
}

/// Live connections keyed by user id
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<UserId, Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, Connection>> {
        self.connections.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a connection, superseding any previous one for the same user
    ///
    /// # Returns
    ///
    /// The id of the superseded connection, if there was one. That connection
    /// has been closed with `CloseReason::Superseded`.
    pub fn register(&self, connection: Connection) -> Option<ConnectionId> {
        let user_id = connection.user_id().clone();
        let previous = self.lock().insert(user_id.clone(), connection)?;

        let previous_id = previous.id();
        previous.close(CloseReason::Superseded);
        tracing::info!(
            "[Realtime] Connection {} for {} superseded",
            previous_id,
            user_id
        );
        Some(previous_id)
    }

    /// Remove the entry for `user_id` if it still belongs to `connection_id`
    ///
    /// Returns `false` when the connection was already superseded or evicted.
    pub fn unregister(&self, user_id: &UserId, connection_id: ConnectionId) -> bool {
        let removed = {
            let mut connections = self.lock();
            match connections.get(user_id) {
                Some(current) if current.id() == connection_id => connections.remove(user_id),
                _ => None,
            }
        };
        removed.is_some()
    }

    /// Route an envelope to `user_id` without waiting
    pub fn send_to_user(&self, user_id: &UserId, envelope: Envelope) -> Delivery {
        let mut connections = self.lock();
        let Some(connection) = connections.get(user_id) else {
            return Delivery::Offline;
        };

        match connection.mailbox.try_send(Outbound::Envelope(envelope)) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => {
                let evicted = connections.remove(user_id);
                drop(connections);
                if let Some(evicted) = evicted {
                    tracing::warn!(
                        "[Realtime] Mailbox full, evicting {} ({})",
                        user_id,
                        evicted.id()
                    );
                    evicted.close(CloseReason::GoingAway);
                }
                Delivery::Evicted
            }
            Err(TrySendError::Closed(_)) => {
                // Pump already gone; its own cleanup will find no entry
                connections.remove(user_id);
                Delivery::Offline
            }
        }
    }

    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.lock().contains_key(user_id)
    }

    pub fn connected_count(&self) -> usize {
        self.lock().len()
    }

    /// Online users, sorted
    pub fn online_users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.lock().keys().cloned().collect();
        users.sort();
        users
    }

    /// Current connection id for `user_id`
    pub fn connection_id(&self, user_id: &UserId) -> Option<ConnectionId> {
        self.lock().get(user_id).map(Connection::id)
    }
}
