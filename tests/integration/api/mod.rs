//! API integration tests
//!
//! Integration tests for the REST endpoints

mod presence_test;
