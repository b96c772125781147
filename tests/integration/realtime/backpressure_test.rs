//! Backpressure integration tests
//!
//! A receiver that never reads must be evicted without slowing its sender
//! or anyone else.

#[cfg(feature = "ssr")]
mod tests {
    use crate::common::*;
    use std::time::Duration;
    use tokio::time::Instant;
    use xfchat::backend::server::RealtimeConfig;

    fn tight_config() -> RealtimeConfig {
        RealtimeConfig {
            mailbox_capacity: 8,
            write_timeout_ms: 200,
            max_frame_bytes: 128 * 1024,
            rate_limit_max: 100_000,
            ..RealtimeConfig::default()
        }
    }

    #[tokio::test]
    async fn test_stalled_receiver_is_evicted() {
        let server = spawn_server(tight_config()).await;
        let mut sender = connect_user(&server, "u1").await;
        // Not polled until it has been evicted
        let mut stalled = connect_user(&server, "u2").await;
        let mut bystander = connect_user(&server, "u3").await;

        let payload = "x".repeat(60 * 1024);
        let deadline = Instant::now() + Duration::from_secs(10);
        while server.state.registry.is_online(&user("u2")) {
            assert!(Instant::now() < deadline, "stalled receiver was never evicted");
            for _ in 0..20 {
                send_message(&mut sender, "u2", &payload).await;
            }

            // The sender's own loop keeps answering while u2 backs up
            let started = Instant::now();
            send_json(&mut sender, serde_json::json!({"type": "bogus"})).await;
            let error = recv_envelope(&mut sender).await;
            assert_eq!(error.kind, xfchat::shared::EnvelopeType::Error);
            assert!(started.elapsed() < Duration::from_secs(1), "sender stalled behind a slow receiver");
        }

        // The evicted socket is torn down: after whatever was buffered, the
        // client sees a close frame or the end of the stream
        let teardown = tokio::time::timeout(Duration::from_secs(5), recv_close_code(&mut stalled)).await;
        assert!(teardown.is_ok(), "evicted socket was left open");

        // The sender and everyone else are unaffected
        assert!(server.state.registry.is_online(&user("u1")));
        send_message(&mut sender, "u3", "still here").await;
        assert_eq!(
            recv_envelope(&mut bystander).await.content.as_deref(),
            Some("still here")
        );
    }

    #[tokio::test]
    async fn test_oversized_frame_is_rejected_in_band() {
        let config = RealtimeConfig {
            max_frame_bytes: 1024,
            ..RealtimeConfig::default()
        };
        let server = spawn_server(config).await;
        let mut sender = connect_user(&server, "u1").await;

        send_message(&mut sender, "u2", &"y".repeat(2048)).await;
        let error = recv_envelope(&mut sender).await;
        assert_eq!(error.kind, xfchat::shared::EnvelopeType::Error);
        assert!(server.store.is_empty());
        assert!(server.state.registry.is_online(&user("u1")));
    }
}
