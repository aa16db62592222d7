//! Account route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::services::AccessToken;
use crate::state::AppState;

/// Register and login request body.
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Create an account.
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>)> {
    let Json(body) = payload?;
    let user = state.auth().register(&body.email, &body.password).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Exchange email and password for an access token.
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<AccessToken>> {
    let Json(body) = payload?;
    let token = state.auth().login(&body.email, &body.password).await?;
    Ok(Json(token))
}

/// The authenticated user's account.
pub async fn me(
    RequireAuth(user_id): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<User>> {
    let user = state.auth().current_user(user_id).await?;
    Ok(Json(user))
}

/// Delete the authenticated user's account and every calculation they own.
pub async fn delete_me(
    RequireAuth(user_id): RequireAuth,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    state.auth().delete_account(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_helpers::{send, send_raw, signup, test_router};

    #[tokio::test]
    async fn test_register_returns_public_fields_only() {
        let (app, _) = test_router();
        let (status, body) = send(
            &app,
            "POST",
            "/users/register",
            None,
            Some(json!({ "email": " Ada@Example.com", "password": "analytical" })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["email"], "ada@example.com");
        assert!(body.get("id").is_some());
        assert!(body.get("createdAt").is_some());
        assert!(body.get("passwordHash").is_none());
        assert!(!body.to_string().contains("argon2"));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (app, _) = test_router();

        let (status, _) = send(
            &app,
            "POST",
            "/users/register",
            None,
            Some(json!({ "email": "not-an-email", "password": "analytical" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            "POST",
            "/users/register",
            None,
            Some(json!({ "email": "ada@example.com", "password": "short" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("at least 8"));
    }

    #[tokio::test]
    async fn test_register_duplicate_conflicts() {
        let (app, _) = test_router();
        signup(&app, "ada@example.com").await;

        let (status, _) = send(
            &app,
            "POST",
            "/users/register",
            None,
            Some(json!({ "email": "ADA@example.com", "password": "another-one" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_login_token_shape() {
        let (app, _) = test_router();
        signup(&app, "ada@example.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/users/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "correct horse" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "bearer");
        assert_eq!(body["expires_in"], 30 * 60);
        assert_eq!(body["access_token"].as_str().unwrap().split('.').count(), 3);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (app, _) = test_router();
        signup(&app, "ada@example.com").await;

        let response = send_raw(
            &app,
            "POST",
            "/users/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "incorrect" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()["www-authenticate"], "Bearer");
    }

    #[tokio::test]
    async fn test_me() {
        let (app, _) = test_router();
        let token = signup(&app, "ada@example.com").await;

        let (status, body) = send(&app, "GET", "/users/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "ada@example.com");

        let (status, _) = send(&app, "GET", "/users/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_delete_me_invalidates_token() {
        let (app, _) = test_router();
        let token = signup(&app, "ada@example.com").await;

        let (status, body) = send(&app, "DELETE", "/users/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, serde_json::Value::Null);

        let (status, _) = send(&app, "GET", "/users/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (app, _) = test_router();
        let (status, body) = send(
            &app,
            "POST",
            "/users/register",
            None,
            Some(json!({ "email": "ada@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].is_string());
    }
}
