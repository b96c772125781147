//! Messaging HTTP Handlers
//!
//! This module contains the REST handlers over the message store. They are
//! how an offline recipient catches up and how read state is changed outside
//! a socket.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::store::{with_timeout, HistoryQuery, MessageRecord};
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::UserId;

/// Query parameters of the history endpoint
#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<u32>,
    /// RFC3339 timestamp; only older messages are returned
    pub before: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub peer_id: UserId,
    pub messages: Vec<MessageRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkReadResponse {
    pub message_id: Uuid,
    pub read: bool,
}

fn parse_user_id(raw: String) -> Result<UserId, BackendError> {
    UserId::parse(raw).map_err(|e| BackendError::handler(StatusCode::BAD_REQUEST, e.to_string()))
}

/// Conversation history between the caller and `peer_id`, newest first
///
/// `GET /api/messages/{peer_id}?limit=&before=`
pub async fn get_history(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(peer_id): Path<String>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<HistoryResponse>, BackendError> {
    let peer_id = parse_user_id(peer_id)?;
    let Query(params) =
        params.map_err(|e| BackendError::handler(StatusCode::BAD_REQUEST, e.body_text()))?;
    let query = HistoryQuery::new(params.limit, params.before);

    let messages = with_timeout(
        state.realtime.store_timeout(),
        state.store.history(&principal.user_id, &peer_id, query),
    )
    .await?;

    tracing::debug!(
        "[Store] {} fetched {} messages with {}",
        principal.user_id,
        messages.len(),
        peer_id
    );
    Ok(Json(HistoryResponse { peer_id, messages }))
}

/// Mark a message read on behalf of its receiver
///
/// `PATCH /api/messages/{message_id}/read`
pub async fn mark_message_read(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(message_id): Path<String>,
) -> Result<Json<MarkReadResponse>, BackendError> {
    let message_id = Uuid::parse_str(&message_id)
        .map_err(|_| BackendError::handler(StatusCode::BAD_REQUEST, "message_id is not a UUID"))?;

    with_timeout(
        state.realtime.store_timeout(),
        state.store.mark_read(message_id, &principal.user_id),
    )
    .await?;

    Ok(Json(MarkReadResponse {
        message_id,
        read: true,
    }))
}
