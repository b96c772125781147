//! Authentication test helpers
//!
//! Provides utilities for generating valid, expired and foreign tokens.

use std::time::{Duration, SystemTime, UNIX_EPOCH};
use xfchat::backend::auth::sessions::{create_token, encode_claims, Claims};
use xfchat::shared::UserId;

/// Secret every test server is configured with
pub const TEST_SECRET: &str = "xfchat-test-secret";

pub fn user(raw: &str) -> UserId {
    UserId::parse(raw).unwrap()
}

/// Token for `user_id` valid for an hour
pub fn token_for(user_id: &str) -> String {
    create_token(TEST_SECRET, &user(user_id), user_id, Duration::from_secs(3600)).unwrap()
}

/// Token that expired well outside the validation leeway
pub fn expired_token_for(user_id: &str) -> String {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
    let claims = Claims {
        sub: user_id.to_string(),
        email: None,
        username: Some(user_id.to_string()),
        exp: now - 3600,
        iat: now - 7200,
    };
    encode_claims(TEST_SECRET, &claims).unwrap()
}

/// Token signed with a secret the server does not know
pub fn foreign_token_for(user_id: &str) -> String {
    create_token("some-other-secret", &user(user_id), user_id, Duration::from_secs(3600)).unwrap()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
