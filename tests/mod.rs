//! Test suite for Portal Realtime
//!
//! This module organizes all tests

#[cfg(feature = "ssr")]
pub mod common;
pub mod integration;
pub mod property;
