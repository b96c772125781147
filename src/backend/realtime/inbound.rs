/**
 * Inbound Pump
 *
 * The inbound pump reads frames from the socket, classifies them and routes
 * the results through the registry. It runs in the upgrade task; the
 * outbound pump runs in its own task and the inbound pump watches it so that
 * a dead writer also ends the read loop.
 *
 * # Per-frame Pipeline
 *
 * 1. Read with `read_timeout`; any frame (pongs included) resets the deadline
 * 2. Enforce the soft frame size limit
 * 3. Apply the sliding-window rate limit, sleeping when the window is full
 * 4. Decode into a `Command`; failures get one `error` reply
 * 5. Dispatch: route live first, then queue the store call
 *
 * # Store Calls
 *
 * The pump never awaits the store. Persistence and read marks go to the
 * connection's `StoreQueue`; a slow or hung database delays those writes and
 * read receipts, never the frames behind them. Store failures are logged
 * and never reported to the sender.
 */

use axum::extract::ws::Message;
use futures_util::{Stream, StreamExt};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

use super::connection::{ActivityClock, CloseReason, Outbound};
use super::outbound::OutboundExit;
use super::persist::{StoreJob, StoreQueue};
use super::rate_limit::SlidingWindow;
use super::registry::ConnectionRegistry;
use crate::backend::messaging::NewMessage;
use crate::backend::server::config::RealtimeConfig;
use crate::shared::envelope::parse_command;
use crate::shared::{Command, Envelope, Principal, ProtocolError, UserId};

/// Why the inbound pump stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundExit {
    /// The peer sent a close frame
    PeerClosed,
    /// The stream ended without a close frame
    StreamEnded,
    /// Nothing was received within `read_timeout`
    ReadTimeout,
    ReadError(String),
    /// `max_decode_errors` consecutive frames could not be decoded
    TooManyDecodeErrors,
    /// The outbound pump stopped first
    WriterGone,
}

/// Result of handling one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct InboundPump {
    principal: Principal,
    registry: Arc<ConnectionRegistry>,
    store: StoreQueue,
    replies: mpsc::Sender<Outbound>,
    limiter: SlidingWindow,
    clock: ActivityClock,
    config: Arc<RealtimeConfig>,
    decode_errors: u32,
}

impl InboundPump {
    pub fn new(
        principal: Principal,
        registry: Arc<ConnectionRegistry>,
        store: StoreQueue,
        replies: mpsc::Sender<Outbound>,
        clock: ActivityClock,
        config: Arc<RealtimeConfig>,
    ) -> Self {
        let limiter = SlidingWindow::new(config.rate_limit_max, config.rate_limit_window());
        Self {
            principal,
            registry,
            store,
            replies,
            limiter,
            clock,
            config,
            decode_errors: 0,
        }
    }

    fn user_id(&self) -> &UserId {
        &self.principal.user_id
    }

    /// Read until the connection ends
    ///
    /// `writer` is the outbound pump's task. If it finishes first its result
    /// is returned alongside the exit reason; otherwise the caller still owns
    /// awaiting it.
    pub async fn run<St, E>(
        mut self,
        mut stream: St,
        writer: &mut JoinHandle<OutboundExit>,
    ) -> (InboundExit, Option<Result<OutboundExit, JoinError>>)
    where
        St: Stream<Item = Result<Message, E>> + Unpin,
        E: Display,
    {
        let read_timeout = self.config.read_timeout();

        loop {
            let next = tokio::select! {
                finished = &mut *writer => return (InboundExit::WriterGone, Some(finished)),
                next = tokio::time::timeout(read_timeout, stream.next()) => next,
            };

            let message = match next {
                Err(_) => return (InboundExit::ReadTimeout, None),
                Ok(None) => return (InboundExit::StreamEnded, None),
                Ok(Some(Err(e))) => return (InboundExit::ReadError(e.to_string()), None),
                Ok(Some(Ok(message))) => message,
            };

            self.clock.touch();
            if let Some(exit) = self.handle_message(message).await {
                return (exit, None);
            }
        }
    }

    async fn handle_message(&mut self, message: Message) -> Option<InboundExit> {
        let flow = match message {
            Message::Text(text) => self.handle_text(text.as_str()).await,
            Message::Binary(_) => {
                self.throttle().await;
                self.reject(ProtocolError::BinaryFrame).await
            }
            Message::Ping(_) | Message::Pong(_) => Flow::Continue,
            Message::Close(_) => return Some(InboundExit::PeerClosed),
        };
        match flow {
            Flow::Continue => None,
            Flow::Stop => Some(InboundExit::TooManyDecodeErrors),
        }
    }

    /// Size check, rate limit, decode and dispatch one text frame
    pub async fn handle_text(&mut self, text: &str) -> Flow {
        if text.len() > self.config.max_frame_bytes {
            return self
                .reject(ProtocolError::FrameTooLarge {
                    size: text.len(),
                    limit: self.config.max_frame_bytes,
                })
                .await;
        }

        self.throttle().await;

        match parse_command(text) {
            Ok(command) => {
                self.decode_errors = 0;
                self.dispatch(command);
                Flow::Continue
            }
            Err(e) => self.reject(e).await,
        }
    }

    async fn throttle(&mut self) {
        while let Err(wait) = self.limiter.try_acquire(Instant::now()) {
            tracing::debug!("[Realtime] Rate limit reached for {}, pausing {:?}", self.user_id(), wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Reply with an error envelope; stop once the decode threshold is hit
    async fn reject(&mut self, error: ProtocolError) -> Flow {
        self.decode_errors += 1;
        tracing::debug!(
            "[Realtime] Rejected frame from {} ({}/{}): {}",
            self.user_id(),
            self.decode_errors,
            self.config.max_decode_errors,
            error
        );
        self.reply(Outbound::Envelope(Envelope::from(&error))).await;

        if self.decode_errors >= self.config.max_decode_errors {
            tracing::warn!("[Realtime] Too many malformed frames from {}, closing", self.user_id());
            self.reply(Outbound::Close(CloseReason::ProtocolViolation)).await;
            return Flow::Stop;
        }
        Flow::Continue
    }

    async fn reply(&self, item: Outbound) {
        if self.replies.send(item).await.is_err() {
            tracing::debug!("[Realtime] Writer for {} is gone, reply dropped", self.user_id());
        }
    }

    /// Route a decoded command
    pub fn dispatch(&self, command: Command) {
        match command {
            Command::Message { receiver_id, content } => {
                if content.trim().is_empty() {
                    tracing::debug!("[Realtime] Dropping empty message from {}", self.user_id());
                    return;
                }
                let message = NewMessage::new(self.user_id().clone(), receiver_id, content);
                let envelope = Envelope::message(
                    message.sender_id.clone(),
                    message.receiver_id.clone(),
                    message.id,
                    message.content.clone(),
                    message.sent_at,
                );
                let delivery = self.registry.send_to_user(&message.receiver_id, envelope);
                tracing::debug!(
                    "[Realtime] Message {} from {} to {}: {}",
                    message.id,
                    message.sender_id,
                    message.receiver_id,
                    delivery
                );
                self.store.submit(StoreJob::Persist(message));
            }
            Command::Typing { receiver_id, is_typing } => {
                let envelope = Envelope::typing(self.user_id().clone(), receiver_id.clone(), is_typing);
                self.registry.send_to_user(&receiver_id, envelope);
            }
            Command::Read { receiver_id, message_id } => {
                // The worker forwards the receipt once the mark is checked
                self.store.submit(StoreJob::MarkRead {
                    message_id,
                    reader: self.user_id().clone(),
                    author: receiver_id,
                });
            }
            Command::LegacyAuth => {
                tracing::debug!("[Realtime] Ignoring in-band auth frame from {}", self.user_id());
            }
        }
    }
}
