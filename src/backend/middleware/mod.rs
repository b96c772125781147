//! Middleware Module
//!
//! This module contains request processing that runs before handlers.
//!
//! # Architecture
//!
//! The middleware module currently provides:
//!
//! - **`auth`** - `AuthUser`, the bearer-token extractor for REST routes
//!
//! Request tracing is not here: it is a `tower_http::trace::TraceLayer`
//! applied in `routes::router`.

pub mod auth;

pub use auth::AuthUser;
