//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added in `main`, capture errors and transactions)
//! 2. `TraceLayer` (request span with `request_id` and `user_id` fields)
//! 3. Request ID (reuse or generate `x-request-id`)
//! 4. Security headers
//! 5. Rate limiting (register/login only, governor)
//!
//! Bearer authentication is an extractor ([`RequireAuth`]) rather than a
//! layer, so public routes never touch the token service.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::RequireAuth;
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
