//! Custom request extractors
//!
//! Provides a JSON extractor whose rejections match the API's error body
//! shape instead of axum's plain-text defaults.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde_json::json;

/// JSON extractor with `{"error": ...}` rejection bodies
pub struct JsonExtractor<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonExtractor<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(value) => Ok(Self(value.0)),
            Err(rejection) => {
                let error_message = match rejection {
                    JsonRejection::JsonDataError(err) => {
                        format!("invalid request body: {err}")
                    }
                    JsonRejection::JsonSyntaxError(err) => {
                        format!("invalid request body: {err}")
                    }
                    JsonRejection::MissingJsonContentType(_) => {
                        "missing 'Content-Type: application/json' header".to_string()
                    }
                    other => format!("invalid request body: {other}"),
                };

                Err((
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": error_message})),
                ))
            }
        }
    }
}
