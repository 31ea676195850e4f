//! Router creation and configuration
//!
//! Assembles the route table and the middleware stack: CORS, request
//! tracing, and X-Request-ID echo/generation.

use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::handlers::*;
use super::types::AppState;

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Create the REST API router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-tenant-id"),
            REQUEST_ID_HEADER,
        ]);

    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/api/v1/info", get(info))
        .route(
            "/api/v1/definitions",
            post(deploy_definition).get(list_definitions),
        )
        .route(
            "/api/v1/definitions/:key",
            get(get_definition).delete(delete_definition),
        )
        .route("/api/v1/definitions/:key/xml", get(get_definition_xml))
        .route("/api/v1/definitions/:key/parsed", get(get_definition_parsed))
        .route(
            "/api/v1/definitions/:key/versions",
            get(get_definition_versions),
        )
        .route("/api/v1/evaluate", post(evaluate))
        .with_state(state)
        .layer(middleware::from_fn(request_id))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Echo the caller's X-Request-ID, or generate a UUID, on every response.
async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let Ok(value) = HeaderValue::from_str(&id) else {
        return next.run(req).await;
    };

    req.headers_mut().insert(REQUEST_ID_HEADER.clone(), value.clone());
    let mut response = next.run(req).await;
    response.headers_mut().insert(REQUEST_ID_HEADER, value);
    response
}
