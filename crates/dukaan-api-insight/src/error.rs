//! HTTP error surface for the query endpoint.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::llm::LlmError;

/// Errors the query endpoint can return. SQL execution failures never
/// land here; the engine folds those into the answer body.
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("{0}")]
    Llm(#[from] LlmError),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for InsightError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            InsightError::Llm(e) => {
                tracing::error!("Chat model call failed: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "llm_unavailable",
                    "The language model could not be reached".to_string(),
                )
            }
        };
        let body = ErrorResponse {
            error: error_code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_failures_map_to_502() {
        let err = InsightError::Llm(LlmError::Transport("timed out".into()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
