//! Presence and health API tests

#[cfg(feature = "ssr")]
mod tests {
    use crate::common::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;
    use xfchat::backend::routes::create_router;
    use xfchat::backend::server::RealtimeConfig;

    #[tokio::test]
    async fn test_health_needs_no_auth() {
        let (app, _, _) = test_router();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["connections"], 0);
    }

    #[tokio::test]
    async fn test_presence_follows_live_connections() {
        let server = spawn_server(RealtimeConfig::default()).await;
        let app = create_router(server.state.clone());
        let presence = |target: &str| {
            Request::get(format!("/api/presence/{}", target))
                .header(header::AUTHORIZATION, bearer(&token_for("u9")))
                .body(Body::empty())
                .unwrap()
        };

        let response = app.clone().oneshot(presence("u1")).await.unwrap();
        let body: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
        assert_eq!(body["online"], false);

        let client = connect_user(&server, "u1").await;
        let response = app.clone().oneshot(presence("u1")).await.unwrap();
        let body: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
        assert_eq!(body["user_id"], "u1");
        assert_eq!(body["online"], true);

        drop(client);
        server.wait_online(&user("u1"), false).await;
        let response = app.oneshot(presence("u1")).await.unwrap();
        let body: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
        assert_eq!(body["online"], false);
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let (app, _, _) = test_router();
        let response = app
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
        assert_eq!(body["status"], 404);
    }
}
