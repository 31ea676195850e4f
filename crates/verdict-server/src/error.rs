//! Server error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use verdict_engine::EngineError;
use verdict_parser::{ParseError, ValidationError};
use verdict_repository::RepositoryError;

/// API error type, mapped onto HTTP status codes by `IntoResponse`.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed DMN XML
    Parse(ParseError),

    /// One or more validation findings
    Validation(Vec<ValidationError>),

    /// Definition or version does not exist
    NotFound(String),

    /// Malformed or incomplete request
    InvalidRequest(String),

    /// Evaluation failure
    Engine(EngineError),

    /// Storage failure
    Repository(RepositoryError),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Parse(err) => write!(f, "invalid DMN XML: {err}"),
            ApiError::Validation(errors) => {
                write!(f, "DMN validation failed ({} findings)", errors.len())
            }
            ApiError::NotFound(msg) => write!(f, "{msg}"),
            ApiError::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            ApiError::Engine(err) => write!(f, "evaluation failed: {err}"),
            ApiError::Repository(err) => write!(f, "storage error: {err}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Parse(err) => (
                StatusCode::BAD_REQUEST,
                json!({"error": format!("invalid DMN XML: {err}")}),
            ),
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({"error": "DMN validation failed", "details": errors}),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({"error": msg})),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, json!({"error": msg})),
            ApiError::Engine(err) => {
                let status = match &err {
                    EngineError::NotFound(_) => StatusCode::NOT_FOUND,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, json!({"error": format!("evaluation failed: {err}")}))
            }
            ApiError::Repository(err) => {
                if err.is_not_found() {
                    (StatusCode::NOT_FOUND, json!({"error": "definition not found"}))
                } else {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        json!({"error": format!("storage error: {err}")}),
                    )
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ParseError> for ApiError {
    fn from(err: ParseError) -> Self {
        ApiError::Parse(err)
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::Engine(err)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        ApiError::Repository(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats() {
        let err = ApiError::InvalidRequest("decisionKey is required".to_string());
        assert_eq!(err.to_string(), "invalid request: decisionKey is required");

        let err = ApiError::NotFound("definition not found".to_string());
        assert_eq!(err.to_string(), "definition not found");
    }

    #[test]
    fn test_validation_display_counts_findings() {
        let err = ApiError::Validation(vec![ValidationError {
            field: "definitions.id".to_string(),
            message: "definitions must have an id".to_string(),
        }]);
        assert!(err.to_string().contains("1 findings"));
    }

    #[test]
    fn test_status_mapping() {
        let res = ApiError::NotFound("gone".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = ApiError::InvalidRequest("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = ApiError::Engine(EngineError::NoDecisions).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let res = ApiError::Engine(EngineError::NotFound("missing".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
