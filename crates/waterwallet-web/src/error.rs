//! HTTP error responses.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::error;
use waterwallet::store::StoreError;
use waterwallet::validation::ValidationError;

/// Failure of a request handler.
///
/// Renders as `{"status": "error", "message": ...}`, plus `"field"` when a
/// single input field is at fault.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Query(#[from] QueryRejection),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("record store task failed: {0}")]
    Task(#[from] JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(e) => {
                let mut body = json!({"status": "error", "message": e.to_string()});
                if let Some(field) = e.field() {
                    body["field"] = json!(field);
                }
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ApiError::Query(e) => (
                StatusCode::BAD_REQUEST,
                Json(json!({"status": "error", "message": e.body_text()})),
            )
                .into_response(),
            other @ (ApiError::Store(_) | ApiError::Task(_)) => {
                error!("Record store failure: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"status": "error", "message": other.to_string()})),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests() {
        let err = ApiError::from(ValidationError::InvalidField {
            field: "kitchen".into(),
            reason: "expected a number".into(),
        });
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn empty_input_is_a_bad_request() {
        let err = ApiError::from(ValidationError::EmptyInput);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_errors_are_server_errors() {
        let err = ApiError::from(StoreError::UnsupportedUrl("x://y".into()));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn failed_store_task_is_a_server_error() {
        let join_err = tokio::task::spawn_blocking(|| panic!("store worker died"))
            .await
            .unwrap_err();
        let err = ApiError::from(join_err);
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
