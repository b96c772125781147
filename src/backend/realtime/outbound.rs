/**
 * Outbound Pump
 *
 * The outbound pump is the only writer to a socket. It watches, in priority
 * order:
 *
 * - the **close signal**, fired by the registry on supersede or eviction,
 * - the **reply channel**, fed by this connection's own inbound pump with
 *   error replies and close requests,
 * - the **mailbox**, fed by the registry with envelopes routed to this user.
 *
 * # Coalescing
 *
 * Whatever is queued when the pump wakes up is written as one batch: every
 * frame is fed to the sink and the sink is flushed once. A batch is bounded
 * by `coalesce_limit` frames and the whole write by `write_timeout`.
 *
 * # Keepalive
 *
 * A ping goes out every `ping_interval`, but only when the peer has been
 * silent for at least that long. A peer that keeps sending never sees pings.
 * Only inbound silence counts: frames we write do not defer a ping, so a
 * peer that only receives is still pinged every interval.
 *
 * # Exit
 *
 * The pump stops on a close signal, a close request, a closed mailbox, or a
 * write error or timeout. A close signal writes its close frame right away
 * and abandons whatever is still queued. On a closed mailbox the backlog is
 * written first, then a 1001 close frame.
 */

use axum::body::Bytes;
use axum::extract::ws::{CloseFrame, Message, Utf8Bytes};
use futures_util::{Sink, SinkExt};
use std::fmt::Display;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::connection::{ActivityClock, CloseReason, CloseSignal, Mailbox, Outbound};
use crate::backend::server::config::RealtimeConfig;
use crate::shared::UserId;

/// Why the outbound pump stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundExit {
    /// A close frame was written for this reason
    Closed(CloseReason),
    WriteError(String),
    WriteTimeout,
}

pub struct OutboundPump {
    user_id: UserId,
    mailbox: mpsc::Receiver<Outbound>,
    close: CloseSignal,
    replies: mpsc::Receiver<Outbound>,
    clock: ActivityClock,
    coalesce_limit: usize,
    ping_interval: Duration,
    write_timeout: Duration,
}

fn close_message(reason: CloseReason) -> Message {
    Message::Close(Some(CloseFrame {
        code: reason.code(),
        reason: Utf8Bytes::from_static(reason.reason()),
    }))
}

enum Batch {
    /// Frames to write; `Some` when the batch ends the connection
    Frames(Vec<Message>, Option<CloseReason>),
    Ping,
}

impl OutboundPump {
    pub fn new(
        user_id: UserId,
        mailbox: Mailbox,
        replies: mpsc::Receiver<Outbound>,
        clock: ActivityClock,
        config: &RealtimeConfig,
    ) -> Self {
        let (mailbox, close) = mailbox.into_parts();
        Self {
            user_id,
            mailbox,
            close,
            replies,
            clock,
            coalesce_limit: config.coalesce_limit.max(1),
            ping_interval: config.ping_interval(),
            write_timeout: config.write_timeout(),
        }
    }

    /// Turn queued items into frames, stopping at the first close request
    fn frames(&self, items: Vec<Outbound>) -> (Vec<Message>, Option<CloseReason>) {
        let mut frames = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Outbound::Envelope(envelope) => match envelope.to_json() {
                    Ok(json) => frames.push(Message::Text(json.into())),
                    Err(e) => tracing::error!(
                        "[Realtime] Failed to serialize envelope for {}: {}",
                        self.user_id,
                        e
                    ),
                },
                Outbound::Close(reason) => {
                    frames.push(close_message(reason));
                    return (frames, Some(reason));
                }
            }
        }
        (frames, None)
    }

    async fn write<S>(&self, sink: &mut S, frames: Vec<Message>) -> Result<(), OutboundExit>
    where
        S: Sink<Message> + Unpin,
        S::Error: Display,
    {
        let write = async {
            for frame in frames {
                sink.feed(frame).await?;
            }
            sink.flush().await
        };
        match tokio::time::timeout(self.write_timeout, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(OutboundExit::WriteError(e.to_string())),
            Err(_) => Err(OutboundExit::WriteTimeout),
        }
    }

    /// Drive `sink` until the connection ends
    pub async fn run<S>(mut self, mut sink: S) -> OutboundExit
    where
        S: Sink<Message> + Unpin,
        S::Error: Display,
    {
        let mut ping = interval_at(Instant::now() + self.ping_interval, self.ping_interval);
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut replies_open = true;
        let mut items = Vec::with_capacity(self.coalesce_limit);

        loop {
            // Close signal, then replies: a close request from our own reader
            // beats the mailbox closing behind it
            let batch = tokio::select! {
                biased;

                reason = self.close.requested() => {
                    tracing::debug!(
                        "[Realtime] Close signal for {} ({}), backlog dropped",
                        self.user_id,
                        reason.code()
                    );
                    Batch::Frames(vec![close_message(reason)], Some(reason))
                }

                reply = self.replies.recv(), if replies_open => match reply {
                    Some(item) => {
                        items.push(item);
                        while items.len() < self.coalesce_limit {
                            match self.replies.try_recv() {
                                Ok(item) => items.push(item),
                                Err(_) => break,
                            }
                        }
                        let (frames, close) = self.frames(std::mem::take(&mut items));
                        Batch::Frames(frames, close)
                    }
                    None => {
                        replies_open = false;
                        continue;
                    }
                },
                received = self.mailbox.recv_many(&mut items, self.coalesce_limit) => {
                    if received == 0 {
                        Batch::Frames(vec![close_message(CloseReason::GoingAway)], Some(CloseReason::GoingAway))
                    } else {
                        let (frames, close) = self.frames(std::mem::take(&mut items));
                        Batch::Frames(frames, close)
                    }
                }
                _ = ping.tick() => Batch::Ping,
            };

            match batch {
                Batch::Ping => {
                    if self.clock.idle() < self.ping_interval {
                        continue;
                    }
                    if let Err(exit) = self.write(&mut sink, vec![Message::Ping(Bytes::new())]).await {
                        tracing::debug!("[Realtime] Ping to {} failed: {:?}", self.user_id, exit);
                        return exit;
                    }
                }
                Batch::Frames(frames, close) => {
                    let written = self.write(&mut sink, frames).await;
                    if let Err(exit) = written {
                        tracing::debug!("[Realtime] Write to {} failed: {:?}", self.user_id, exit);
                        return exit;
                    }
                    if let Some(reason) = close {
                        tracing::debug!(
                            "[Realtime] Closed connection of {} ({})",
                            self.user_id,
                            reason.code()
                        );
                        return OutboundExit::Closed(reason);
                    }
                }
            }
        }
    }
}
