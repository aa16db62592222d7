//! Calculation route handlers.
//!
//! Every handler requires a bearer token. Records owned by someone else are
//! answered exactly like records that do not exist.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use serde::Deserialize;

use abacus_core::{Calculation, CalculationId};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Create request body.
#[derive(Debug, Deserialize)]
pub struct CreateCalculation {
    /// Operation name, e.g. `addition` or `div`.
    pub operation: String,
    /// Ordered inputs.
    pub inputs: Vec<f64>,
}

/// Update request body. The operation of a record cannot change.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCalculation {
    /// Replacement inputs.
    pub inputs: Vec<f64>,
}

type PathId = std::result::Result<Path<CalculationId>, PathRejection>;

pub async fn list(
    RequireAuth(user_id): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Calculation>>> {
    let calculations = state.calculations().list_calculations(user_id).await?;
    Ok(Json(calculations))
}

pub async fn create(
    RequireAuth(user_id): RequireAuth,
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateCalculation>, JsonRejection>,
) -> Result<(StatusCode, Json<Calculation>)> {
    let Json(body) = payload?;
    let calculation = state
        .calculations()
        .create_calculation(user_id, &body.operation, body.inputs)
        .await?;
    Ok((StatusCode::CREATED, Json(calculation)))
}

pub async fn show(
    RequireAuth(user_id): RequireAuth,
    State(state): State<AppState>,
    id: PathId,
) -> Result<Json<Calculation>> {
    let Path(id) = id?;
    let calculation = state.calculations().get_calculation(user_id, id).await?;
    Ok(Json(calculation))
}

pub async fn update(
    RequireAuth(user_id): RequireAuth,
    State(state): State<AppState>,
    id: PathId,
    payload: std::result::Result<Json<UpdateCalculation>, JsonRejection>,
) -> Result<Json<Calculation>> {
    let Path(id) = id?;
    let Json(body) = payload?;
    let calculation = state
        .calculations()
        .update_calculation(user_id, id, body.inputs)
        .await?;
    Ok(Json(calculation))
}

pub async fn delete(
    RequireAuth(user_id): RequireAuth,
    State(state): State<AppState>,
    id: PathId,
) -> Result<StatusCode> {
    let Path(id) = id?;
    state.calculations().delete_calculation(user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::routes::test_helpers::{send, signup, test_router};

    async fn create(app: &axum::Router, token: &str, operation: &str, inputs: Value) -> Value {
        let (status, body) = send(
            app,
            "POST",
            "/calculations",
            Some(token),
            Some(json!({ "operation": operation, "inputs": inputs })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    #[tokio::test]
    async fn test_reference_results() {
        let (app, _) = test_router();
        let token = signup(&app, "ada@example.com").await;

        for (operation, inputs, expected) in [
            ("addition", json!([2, 3, 5]), 10.0),
            ("multiplication", json!([2, 3, 5]), 30.0),
            ("subtraction", json!([10, 3, 2]), 5.0),
            ("division", json!([100, 5, 2]), 10.0),
        ] {
            let body = create(&app, &token, operation, inputs).await;
            assert_eq!(body["result"].as_f64().unwrap(), expected, "{operation}");
            assert_eq!(body["operation"], operation);
        }
    }

    #[tokio::test]
    async fn test_create_then_fetch() {
        let (app, _) = test_router();
        let token = signup(&app, "ada@example.com").await;

        let created = create(&app, &token, "Multiply", json!([1.5, 4])).await;
        assert_eq!(created["operation"], "multiplication");

        let id = created["id"].as_str().unwrap();
        let (status, fetched) =
            send(&app, "GET", &format!("/calculations/{id}"), Some(&token), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
        assert_eq!(fetched["inputs"], json!([1.5, 4.0]));
        assert!(fetched.get("ownerId").is_some());
    }

    #[tokio::test]
    async fn test_invalid_calculations_are_bad_requests() {
        let (app, store) = test_router();
        let token = signup(&app, "ada@example.com").await;

        for (operation, inputs) in [
            ("division", json!([10, 0])),
            ("addition", json!([])),
            ("multiplication", json!([])),
            ("division", json!([4])),
            ("modulo", json!([10, 3])),
        ] {
            let (status, body) = send(
                &app,
                "POST",
                "/calculations",
                Some(&token),
                Some(json!({ "operation": operation, "inputs": inputs })),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{operation}");
            assert!(body["error"].is_string());
        }

        assert_eq!(store.calculation_count().await, 0);
    }

    #[tokio::test]
    async fn test_update_recomputes_and_advances_timestamp() {
        let (app, _) = test_router();
        let token = signup(&app, "ada@example.com").await;
        let created = create(&app, &token, "subtraction", json!([10, 3])).await;
        let uri = format!("/calculations/{}", created["id"].as_str().unwrap());

        let (status, updated) = send(
            &app,
            "PUT",
            &uri,
            Some(&token),
            Some(json!({ "inputs": [10, 3, 2] })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["result"].as_f64().unwrap(), 5.0);
        assert_eq!(updated["createdAt"], created["createdAt"]);
        let before: chrono::DateTime<chrono::Utc> =
            created["updatedAt"].as_str().unwrap().parse().unwrap();
        let after: chrono::DateTime<chrono::Utc> =
            updated["updatedAt"].as_str().unwrap().parse().unwrap();
        assert!(after > before);
    }

    #[tokio::test]
    async fn test_failed_update_leaves_record() {
        let (app, _) = test_router();
        let token = signup(&app, "ada@example.com").await;
        let created = create(&app, &token, "division", json!([9, 3])).await;
        let uri = format!("/calculations/{}", created["id"].as_str().unwrap());

        let (status, _) = send(
            &app,
            "PUT",
            &uri,
            Some(&token),
            Some(json!({ "inputs": [9, 0] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, fetched) = send(&app, "GET", &uri, Some(&token), None).await;
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_update_cannot_change_operation() {
        let (app, _) = test_router();
        let token = signup(&app, "ada@example.com").await;
        let created = create(&app, &token, "addition", json!([1, 2])).await;
        let uri = format!("/calculations/{}", created["id"].as_str().unwrap());

        let (status, _) = send(
            &app,
            "PUT",
            &uri,
            Some(&token),
            Some(json!({ "operation": "multiplication", "inputs": [1, 2] })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_foreign_record_looks_missing() {
        let (app, _) = test_router();
        let alice = signup(&app, "alice@example.com").await;
        let mallory = signup(&app, "mallory@example.com").await;

        let created = create(&app, &alice, "addition", json!([1, 2])).await;
        let foreign = format!("/calculations/{}", created["id"].as_str().unwrap());
        let missing = format!("/calculations/{}", uuid::Uuid::new_v4());

        for (method, body) in [
            ("GET", None),
            ("PUT", Some(json!({ "inputs": [7] }))),
            ("DELETE", None),
        ] {
            let foreign_response = send(&app, method, &foreign, Some(&mallory), body.clone()).await;
            let missing_response = send(&app, method, &missing, Some(&mallory), body).await;

            assert_eq!(foreign_response.0, StatusCode::NOT_FOUND, "{method}");
            assert_eq!(foreign_response, missing_response, "{method}");
            assert_eq!(
                foreign_response.1,
                json!({ "error": "calculation not found" })
            );
        }

        let (status, body) = send(&app, "GET", &foreign, Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, created);
    }

    #[tokio::test]
    async fn test_list_is_scoped() {
        let (app, _) = test_router();
        let alice = signup(&app, "alice@example.com").await;
        let bob = signup(&app, "bob@example.com").await;

        let (status, body) = send(&app, "GET", "/calculations", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        create(&app, &alice, "addition", json!([1])).await;
        create(&app, &alice, "addition", json!([2])).await;
        create(&app, &bob, "addition", json!([3])).await;

        let (_, body) = send(&app, "GET", "/calculations", Some(&alice), None).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete() {
        let (app, store) = test_router();
        let token = signup(&app, "ada@example.com").await;
        let created = create(&app, &token, "addition", json!([1])).await;
        let uri = format!("/calculations/{}", created["id"].as_str().unwrap());

        let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(store.calculation_count().await, 0);

        let (status, _) = send(&app, "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_requires_bearer() {
        let (app, _) = test_router();

        for (method, uri) in [("GET", "/calculations"), ("POST", "/calculations")] {
            let (status, _) = send(&app, method, uri, None, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }

        let (status, _) = send(&app, "GET", "/calculations", Some("not-a-token"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_id() {
        let (app, _) = test_router();
        let token = signup(&app, "ada@example.com").await;

        let (status, body) = send(&app, "GET", "/calculations/42", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }
}
