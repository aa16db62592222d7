//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                 - Liveness check
//! GET    /health/ready           - Readiness check (database ping)
//!
//! # Accounts
//! POST   /users/register         - Create an account          (rate limited)
//! POST   /users/login            - Exchange credentials for a token (rate limited)
//! GET    /users/me               - Current account            (bearer)
//! DELETE /users/me               - Delete account and its calculations (bearer)
//!
//! # Calculations (bearer)
//! GET    /calculations           - List own calculations
//! POST   /calculations           - Create a calculation
//! GET    /calculations/{id}      - Fetch one
//! PUT    /calculations/{id}      - Replace inputs and recompute
//! DELETE /calculations/{id}      - Delete one
//! ```

pub mod calculations;
pub mod health;
pub mod users;

use std::time::Duration;

use axum::{
    Router,
    http::{Request, Response},
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::config::ApiConfig;
use crate::middleware::{auth_rate_limiter, request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Create the account routes router.
///
/// Register and login sit behind the per-IP rate limiter when
/// `config.rate_limit` is set.
pub fn user_routes(config: &ApiConfig) -> Router<AppState> {
    let credentials = Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login));

    let credentials = if config.rate_limit {
        credentials.layer(auth_rate_limiter(config.trust_proxy))
    } else {
        credentials
    };

    credentials.route("/me", get(users::me).delete(users::delete_me))
}

/// Create the calculation routes router.
pub fn calculation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(calculations::list).post(calculations::create),
        )
        .route(
            "/{id}",
            get(calculations::show)
                .put(calculations::update)
                .delete(calculations::delete),
        )
}

/// Build the complete application router, middleware included.
///
/// Sentry layers are left to the binary so tests do not need a client.
pub fn router(state: AppState) -> Router {
    let users = user_routes(state.config());

    Router::new()
        .merge(health::routes())
        .nest("/users", users)
        .nest("/calculations", calculation_routes())
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_helpers {
    //! Shared helpers for router tests.

    #![allow(clippy::unwrap_used)]

    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
        response::Response,
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    pub(crate) use crate::test_support::test_router;

    pub(crate) async fn send(
        app: &axum::Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = send_raw(app, method, uri, token, body).await;
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }

    pub(crate) async fn send_raw(
        app: &axum::Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(request).await.unwrap()
    }

    /// Register and log in, returning the bearer token.
    pub(crate) async fn signup(app: &axum::Router, email: &str) -> String {
        let credentials = serde_json::json!({ "email": email, "password": "correct horse" });
        let (status, _) = send(app, "POST", "/users/register", None, Some(credentials.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = send(app, "POST", "/users/login", None, Some(credentials)).await;
        assert_eq!(status, StatusCode::OK);
        body["access_token"].as_str().unwrap().to_owned()
    }
}
