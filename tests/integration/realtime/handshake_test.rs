//! Handshake integration tests
//!
//! Credential carriers on `/ws`, and rejection before the upgrade.

#[cfg(feature = "ssr")]
mod tests {
    use crate::common::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;
    use tokio_tungstenite::tungstenite::http::HeaderValue;
    use tokio_tungstenite::tungstenite::Error as WsError;
    use tower::ServiceExt;
    use xfchat::backend::realtime::handshake::HEADER_ONLY;
    use xfchat::backend::routes::create_router;
    use xfchat::backend::server::RealtimeConfig;

    type Handshake = Result<(Client, tokio_tungstenite::tungstenite::handshake::client::Response), WsError>;

    fn rejected_status(result: Handshake) -> u16 {
        match result {
            Err(WsError::Http(response)) => response.status().as_u16(),
            other => panic!("expected an HTTP rejection, got {:?}", other.map(|(_, r)| r)),
        }
    }

    #[tokio::test]
    async fn test_authorization_header_carrier() {
        let server = spawn_server(RealtimeConfig::default()).await;
        let _client = connect_user(&server, "u1").await;
        assert!(server.state.registry.is_online(&user("u1")));
    }

    #[tokio::test]
    async fn test_subprotocol_carrier_echoes_jwt() {
        let server = spawn_server(RealtimeConfig::default()).await;
        let mut request = server.ws_url().into_client_request().unwrap();
        let protocols = format!("jwt, {}", token_for("u1"));
        request.headers_mut().insert(
            "sec-websocket-protocol",
            HeaderValue::from_str(&protocols).unwrap(),
        );

        let (_client, response) = connect_with(request).await.unwrap();
        assert_eq!(
            response
                .headers()
                .get("sec-websocket-protocol")
                .and_then(|v| v.to_str().ok()),
            Some("jwt")
        );
        server.wait_online(&user("u1"), true).await;
    }

    #[tokio::test]
    async fn test_query_carrier() {
        let server = spawn_server(RealtimeConfig::default()).await;
        let url = format!("{}?token={}", server.ws_url(), token_for("u1"));
        let (_client, _) = connect_with(url).await.unwrap();
        server.wait_online(&user("u1"), true).await;
    }

    #[tokio::test]
    async fn test_stale_header_falls_through_to_query() {
        let server = spawn_server(RealtimeConfig::default()).await;
        let url = format!("{}?token={}", server.ws_url(), token_for("u2"));
        let mut request = url.into_client_request().unwrap();
        request.headers_mut().insert(
            "Authorization",
            HeaderValue::from_str(&bearer(&expired_token_for("u1"))).unwrap(),
        );

        let (_client, _) = connect_with(request).await.unwrap();
        server.wait_online(&user("u2"), true).await;
        assert!(!server.state.registry.is_online(&user("u1")));
    }

    #[tokio::test]
    async fn test_missing_credentials_rejected_with_401() {
        let server = spawn_server(RealtimeConfig::default()).await;
        assert_eq!(rejected_status(connect_with(server.ws_url()).await), 401);
        assert_eq!(server.state.registry.connected_count(), 0);
    }

    #[tokio::test]
    async fn test_expired_and_foreign_tokens_rejected() {
        let server = spawn_server(RealtimeConfig::default()).await;

        let url = format!("{}?token={}", server.ws_url(), expired_token_for("u1"));
        assert_eq!(rejected_status(connect_with(url).await), 401);

        let url = format!("{}?token={}", server.ws_url(), foreign_token_for("u1"));
        assert_eq!(rejected_status(connect_with(url).await), 401);

        assert_eq!(server.state.registry.connected_count(), 0);
    }

    #[tokio::test]
    async fn test_rejection_happens_before_upgrade_validation() {
        let (app, _, _) = test_router();

        // Not an upgrade request at all; authentication still answers first
        let response = app
            .clone()
            .oneshot(Request::get("/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );

        // Authenticated but not an upgrade: the upgrade rejection, not 401
        let response = app
            .oneshot(
                Request::get("/ws")
                    .header(header::AUTHORIZATION, bearer(&token_for("u1")))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_client_error());
        assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_header_only_carriers_ignore_query() {
        let (state, _) = test_state(RealtimeConfig::default());
        let app = create_router(state.with_carriers(HEADER_ONLY));

        let uri = format!("/ws?token={}", token_for("u1"));
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
