/**
 * Connection Handle
 *
 * A `Connection` is what the registry stores for a live socket: the
 * authenticated principal, a process-unique id, the sending half of the
 * outbound mailbox and a one-shot close signal. The receiving halves, the
 * `Mailbox`, are owned by the outbound pump.
 *
 * # Mailbox Ownership
 *
 * The registry entry holds the only `Sender<Outbound>` of the mailbox.
 * Removing the entry therefore closes the mailbox, and the outbound pump
 * stops once it has drained what was already queued.
 *
 * # Close Signal
 *
 * `Connection::close` consumes the entry and fires the close signal. The
 * outbound pump watches that signal ahead of the mailbox, so a superseded or
 * evicted connection is closed at once instead of after its backlog.
 */

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::sync::oneshot;

use crate::shared::{Envelope, Principal, UserId};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique connection identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate the next id; ids are never reused within a process
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Why the server closes a socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Orderly shutdown
    Normal,
    /// Evicted, or the mailbox closed
    GoingAway,
    /// The peer sent too many undecodable frames
    ProtocolViolation,
    /// A newer connection for the same user took over
    Superseded,
}

impl CloseReason {
    /// WebSocket close code
    pub fn code(self) -> u16 {
        match self {
            Self::Normal => 1000,
            Self::GoingAway => 1001,
            Self::ProtocolViolation => 1008,
            Self::Superseded => 4000,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Self::Normal => "normal closure",
            Self::GoingAway => "going away",
            Self::ProtocolViolation => "too many malformed frames",
            Self::Superseded => "superseded",
        }
    }
}

/// Item carried by the mailbox and the reply channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Envelope(Envelope),
    Close(CloseReason),
}

/// Registry entry for one live socket
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    principal: Principal,
    pub(crate) mailbox: mpsc::Sender<Outbound>,
    close: oneshot::Sender<CloseReason>,
}

impl Connection {
    /// Create a connection and its mailbox of `capacity` slots
    pub fn open(principal: Principal, capacity: usize) -> (Self, Mailbox) {
        let (mailbox, items) = mpsc::channel(capacity);
        let (close, close_rx) = oneshot::channel();
        let connection = Self {
            id: ConnectionId::next(),
            principal,
            mailbox,
            close,
        };
        let mailbox = Mailbox {
            items,
            close: CloseSignal { receiver: Some(close_rx) },
        };
        (connection, mailbox)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn user_id(&self) -> &UserId {
        &self.principal.user_id
    }

    /// Ask the outbound pump to close with `reason`, skipping its backlog
    pub fn close(self, reason: CloseReason) {
        // The pump may already be gone
        let _ = self.close.send(reason);
    }
}

/// Receiving side of a connection: queued items plus the close signal
#[derive(Debug)]
pub struct Mailbox {
    items: mpsc::Receiver<Outbound>,
    close: CloseSignal,
}

impl Mailbox {
    pub async fn recv(&mut self) -> Option<Outbound> {
        self.items.recv().await
    }

    pub fn try_recv(&mut self) -> Result<Outbound, TryRecvError> {
        self.items.try_recv()
    }

    /// Close reason, if `Connection::close` has been called
    pub fn close_requested(&mut self) -> Option<CloseReason> {
        self.close.try_requested()
    }

    pub(crate) fn into_parts(self) -> (mpsc::Receiver<Outbound>, CloseSignal) {
        (self.items, self.close)
    }
}

/// One-shot close request from the registry
#[derive(Debug)]
pub struct CloseSignal {
    receiver: Option<oneshot::Receiver<CloseReason>>,
}

impl CloseSignal {
    /// Wait for a close request
    ///
    /// Never resolves when the connection was dropped without one. Cancel
    /// safe.
    pub async fn requested(&mut self) -> CloseReason {
        if let Some(receiver) = self.receiver.as_mut() {
            let outcome = receiver.await;
            self.receiver = None;
            if let Ok(reason) = outcome {
                return reason;
            }
        }
        std::future::pending().await
    }

    fn try_requested(&mut self) -> Option<CloseReason> {
        let reason = self.receiver.as_mut()?.try_recv().ok()?;
        self.receiver = None;
        Some(reason)
    }
}

/// Time of the last frame received from the peer
///
/// Shared between the inbound pump, which touches it, and the outbound pump,
/// which only pings an idle peer.
#[derive(Debug, Clone)]
pub struct ActivityClock {
    origin: Instant,
    last_seen_ms: Arc<AtomicU64>,
}

impl ActivityClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            last_seen_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Record activity from the peer
    pub fn touch(&self) {
        self.last_seen_ms.store(self.now_ms(), Ordering::Relaxed);
    }

    /// Time since the peer was last heard from
    pub fn idle(&self) -> Duration {
        let last = self.last_seen_ms.load(Ordering::Relaxed);
        Duration::from_millis(self.now_ms().saturating_sub(last))
    }
}

impl Default for ActivityClock {
    fn default() -> Self {
        Self::new()
    }
}
