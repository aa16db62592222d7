//! Abacus API library.
//!
//! JSON API for user accounts and their calculation records, exposed as a
//! library so the binary and the integration tests share one router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
