//! WebSocket client helpers
//!
//! Thin wrappers around tokio-tungstenite for sending commands and reading
//! envelopes with a deadline.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Response;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use xfchat::shared::Envelope;

use super::auth_helpers::{bearer, token_for};
use super::server::TestServer;

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Connect as `user_id` with an `Authorization` header and wait for registration
pub async fn connect_user(server: &TestServer, user_id: &str) -> Client {
    let mut request = server.ws_url().into_client_request().unwrap();
    request.headers_mut().insert(
        "Authorization",
        HeaderValue::from_str(&bearer(&token_for(user_id))).unwrap(),
    );
    let (client, _) = connect_async(request).await.unwrap();
    server.wait_online(&super::auth_helpers::user(user_id), true).await;
    client
}

/// Connect with a prepared request, returning the handshake response too
pub async fn connect_with(
    request: impl IntoClientRequest + Unpin,
) -> Result<(Client, Response), tokio_tungstenite::tungstenite::Error> {
    connect_async(request).await
}

pub async fn send_text(client: &mut Client, text: &str) {
    client.send(Message::text(text.to_string())).await.unwrap();
}

pub async fn send_json(client: &mut Client, value: Value) {
    send_text(client, &value.to_string()).await;
}

pub async fn send_message(client: &mut Client, to: &str, content: &str) {
    send_json(client, json!({"type": "message", "receiver_id": to, "content": content})).await;
}

/// Next non-control frame, or `None` on close or stream end
pub async fn next_frame(client: &mut Client) -> Option<Message> {
    loop {
        let frame = tokio::time::timeout(RECV_TIMEOUT, client.next())
            .await
            .expect("timed out waiting for a frame")?;
        match frame {
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Ok(message) => return Some(message),
            Err(_) => return None,
        }
    }
}

/// Next frame, which must be a text envelope
pub async fn recv_envelope(client: &mut Client) -> Envelope {
    match next_frame(client).await {
        Some(Message::Text(text)) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("expected an envelope, got {:?}", other),
    }
}

/// Read until the server closes, returning the close code if one was sent
pub async fn recv_close_code(client: &mut Client) -> Option<u16> {
    loop {
        match next_frame(client).await {
            Some(Message::Close(frame)) => return frame.map(|f| u16::from(f.code)),
            Some(_) => continue,
            None => return None,
        }
    }
}

/// Assert nothing but control frames arrives for `wait`
pub async fn assert_silent(client: &mut Client, wait: Duration) {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        match tokio::time::timeout_at(deadline, client.next()).await {
            Err(_) => return,
            Ok(Some(Ok(Message::Ping(_)))) | Ok(Some(Ok(Message::Pong(_)))) => continue,
            Ok(other) => panic!("expected silence, got {:?}", other),
        }
    }
}
