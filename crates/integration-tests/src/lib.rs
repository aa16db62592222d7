//! Integration tests for Abacus.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests against the in-memory store
//! cargo test -p abacus-integration-tests
//!
//! # Live-server tests (needs a running server and database)
//! ABACUS_BASE_URL=http://localhost:8000 cargo test -p abacus-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `accounts` - Registration, login, account deletion
//! - `calculations` - Calculation lifecycle and ownership
//! - `live_server` - The same flows over HTTP against a deployed server

use std::sync::Arc;

use abacus_api::db::MemoryStore;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Password used by [`TestApp::signup`].
pub const PASSWORD: &str = "correct horse battery";

/// The full API router over a fresh in-memory store.
pub struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let (router, store) = abacus_api::test_support::test_router();
        Self { router, store }
    }

    /// Number of calculations currently stored, across all owners.
    pub async fn calculation_count(&self) -> usize {
        self.store.calculation_count().await
    }

    /// Send one request and decode the JSON response body.
    ///
    /// Empty bodies decode to `Value::Null`, non-JSON bodies to a string.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("readable body")
            .to_bytes();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }

    /// Register an account and log in, returning the access token.
    ///
    /// # Panics
    ///
    /// Panics if registration or login fails.
    pub async fn signup(&self, email: &str) -> String {
        let credentials = json!({ "email": email, "password": PASSWORD });

        let (status, body) = self
            .request("POST", "/users/register", None, Some(credentials.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");

        let (status, body) = self
            .request("POST", "/users/login", None, Some(credentials))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");

        body["access_token"]
            .as_str()
            .expect("access_token in login response")
            .to_owned()
    }

    /// Create a calculation and return its JSON representation.
    ///
    /// # Panics
    ///
    /// Panics unless the server answers 201.
    pub async fn create_calculation(&self, token: &str, operation: &str, inputs: Value) -> Value {
        let (status, body) = self
            .request(
                "POST",
                "/calculations",
                Some(token),
                Some(json!({ "operation": operation, "inputs": inputs })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
        body
    }
}

/// Base URL of a running server for the live tests.
#[must_use]
pub fn live_base_url() -> String {
    std::env::var("ABACUS_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}
