//! Integration tests
//!
//! Every test spins up a real router on an ephemeral port or drives it with
//! `tower::ServiceExt::oneshot`.

mod api;
mod realtime;
