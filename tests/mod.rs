//! Test suite for XFChat
//!
//! This module organizes all tests

#[cfg(feature = "ssr")]
pub mod common;
#[cfg(feature = "ssr")]
pub mod integration;
pub mod property;
