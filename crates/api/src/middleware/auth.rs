//! Bearer authentication extractor.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::Span;

use abacus_core::UserId;

use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// Resolves the `Authorization: Bearer <token>` header to the user the token
/// was issued to. Missing, malformed, forged and expired tokens are rejected
/// with 401 and `WWW-Authenticate: Bearer`.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user_id): RequireAuth) -> String {
///     format!("Hello, {user_id}!")
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireAuth(pub UserId);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let user_id = state.tokens().resolve_identity(token)?;

        Span::current().record("user_id", tracing::field::display(user_id));
        set_sentry_user(&user_id);

        Ok(Self(user_id))
    }
}

/// Pull the token out of an `Authorization: Bearer` header.
///
/// The scheme is matched case-insensitively.
fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Malformed authorization header".to_string()))?;

    value
        .trim()
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized("Authorization header must use the Bearer scheme".to_string())
        })
}
