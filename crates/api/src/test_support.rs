//! In-memory application wiring for tests.
//!
//! Available to this crate's unit tests and, through the `test-support`
//! feature, to the integration test crate.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use axum::Router;
use chrono::TimeDelta;
use secrecy::SecretString;

use crate::config::{ApiConfig, JwtConfig};
use crate::db::MemoryStore;
use crate::state::AppState;

/// Signing secret used by [`test_config`].
pub const TEST_JWT_SECRET: &str = "k7Qe9vR2mXw4LpZ8tYb1NcH6sJd3FgA5";

/// Configuration suitable for tests: no rate limiting, 30 minute tokens.
#[must_use]
pub fn test_config() -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from("postgres://unused@localhost/abacus_test".to_string()),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        jwt: JwtConfig {
            secret: SecretString::from(TEST_JWT_SECRET.to_string()),
            issuer: "abacus-test".to_string(),
            token_ttl: TimeDelta::minutes(30),
        },
        rate_limit: false,
        trust_proxy: false,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Application state over a fresh [`MemoryStore`].
#[must_use]
pub fn memory_state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::with_stores(test_config(), store.clone(), store.clone());
    (state, store)
}

/// Full router over a fresh [`MemoryStore`].
#[must_use]
pub fn test_router() -> (Router, Arc<MemoryStore>) {
    let (state, store) = memory_state();
    (crate::routes::router(state), store)
}
