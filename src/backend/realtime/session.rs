/**
 * Connection Session
 *
 * `run_session` owns one upgraded socket from registration to cleanup:
 *
 * 1. Open the mailbox and register, superseding any previous connection
 * 2. Spawn the outbound pump on the write half
 * 3. Spawn the store worker
 * 4. Run the inbound pump on the read half in this task
 * 5. Unregister and wait for the writer
 *
 * Step 5 is the only cleanup path, whatever ended the connection. The store
 * worker is not awaited; it finishes the jobs already queued on its own.
 */

use axum::extract::ws::WebSocket;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::connection::{ActivityClock, Connection};
use super::inbound::InboundPump;
use super::outbound::{OutboundExit, OutboundPump};
use super::persist::StoreQueue;
use crate::backend::server::state::AppState;
use crate::shared::Principal;

/// Drive an authenticated socket until it closes
pub async fn run_session(socket: WebSocket, principal: Principal, state: AppState) {
    let config = Arc::clone(&state.realtime);
    let user_id = principal.user_id.clone();
    let (sink, stream) = socket.split();
    let clock = ActivityClock::new();

    let (connection, mailbox) = Connection::open(principal.clone(), config.mailbox_capacity);
    let connection_id = connection.id();
    let (reply_tx, reply_rx) = mpsc::channel(config.reply_capacity);

    state.registry.register(connection);
    tracing::info!(
        "[Realtime] {} connected ({}), {} online",
        user_id,
        connection_id,
        state.registry.connected_count()
    );

    let outbound = OutboundPump::new(user_id.clone(), mailbox, reply_rx, clock.clone(), &config);
    let mut writer = tokio::spawn(outbound.run(sink));

    let (store_queue, _store_worker) =
        StoreQueue::spawn(Arc::clone(&state.registry), Arc::clone(&state.store), &config);

    let inbound = InboundPump::new(
        principal,
        Arc::clone(&state.registry),
        store_queue,
        reply_tx,
        clock,
        Arc::clone(&config),
    );
    let (inbound_exit, writer_result) = inbound.run(stream, &mut writer).await;

    // Removing our entry drops the last mailbox sender, which stops the writer
    let unregistered = state.registry.unregister(&user_id, connection_id);
    let writer_result = match writer_result {
        Some(result) => result,
        None => writer.await,
    };
    let outbound_exit = writer_result.unwrap_or_else(|e| {
        tracing::error!("[Realtime] Writer task for {} failed: {}", user_id, e);
        OutboundExit::WriteError(e.to_string())
    });

    tracing::info!(
        "[Realtime] {} disconnected ({}): inbound {:?}, outbound {:?}, unregistered: {}",
        user_id,
        connection_id,
        inbound_exit,
        outbound_exit,
        unregistered
    );
}
