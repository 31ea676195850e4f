//! API endpoint handlers
//!
//! HTTP request handlers for definition management and evaluation.

use axum::{
    body::to_bytes,
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::{error, info};
use verdict_engine::EvaluateRequest;
use verdict_parser::{DmnParser, Validator};
use verdict_repository::{Definition, ListFilter, NewDefinition};

use super::conversions::convert_variables;
use super::extractors::JsonExtractor;
use super::types::*;
use crate::error::ApiError;

const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

fn header_value(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn tenant_from_headers(headers: &HeaderMap) -> String {
    header_value(headers, "x-tenant-id")
}

/// Health check endpoint
pub(super) async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

/// Readiness endpoint
pub(super) async fn ready() -> Json<serde_json::Value> {
    Json(json!({"status": "ready"}))
}

/// Service metadata and feature flags
pub(super) async fn info() -> Json<serde_json::Value> {
    Json(json!({
        "name": "Verdict",
        "version": env!("CARGO_PKG_VERSION"),
        "features": {
            "dmn_version": "1.3",
            "feel_support": "unary tests",
            "multi_tenancy": true,
            "hit_policies": ["UNIQUE", "FIRST", "ANY", "PRIORITY", "COLLECT", "RULE ORDER", "OUTPUT ORDER"],
            // PRIORITY and OUTPUT ORDER fall back to rule order until
            // declared output-value ordering is captured at parse time
            "priority_ordering": false,
        },
    }))
}

/// Deploy a definition: multipart (`file` + `name`), JSON
/// (`{"name", "xml"}`), or a raw XML body.
pub(super) async fn deploy_definition(
    State(state): State<AppState>,
    req: Request,
) -> Result<impl IntoResponse, ApiError> {
    let headers = req.headers().clone();
    let tenant_id = tenant_from_headers(&headers);
    let content_type = header_value(&headers, "content-type");

    let (xml_content, mut name) = read_deploy_body(req, &content_type).await?;

    if xml_content.is_empty() {
        return Err(ApiError::InvalidRequest("no DMN content provided".to_string()));
    }

    let parsed = DmnParser::new().parse_bytes(&xml_content)?;

    let validation_errors = Validator::new().validate(&parsed);
    if !validation_errors.is_empty() {
        return Err(ApiError::Validation(validation_errors));
    }

    // Key: the first decision's id, falling back to the definitions id
    let key = parsed
        .decisions
        .first()
        .map(|d| d.id.clone())
        .unwrap_or_else(|| parsed.id.clone());

    if name.as_deref().unwrap_or_default().is_empty() {
        name = Some(if parsed.name.is_empty() {
            key.clone()
        } else {
            parsed.name.clone()
        });
    }

    let source = String::from_utf8_lossy(&xml_content).into_owned();
    let deployed = state
        .repo
        .deploy(NewDefinition {
            key,
            name: name.unwrap_or_default(),
            source,
            parsed_model: parsed,
            tenant_id,
        })
        .await
        .map_err(|err| {
            error!("failed to deploy definition: {err}");
            ApiError::Repository(err)
        })?;

    info!(
        key = %deployed.key,
        version = deployed.version,
        tenant_id = %deployed.tenant_id,
        "definition deployed"
    );

    Ok((
        StatusCode::CREATED,
        Json(DefinitionResponse::from(&deployed)),
    ))
}

async fn read_deploy_body(
    req: Request,
    content_type: &str,
) -> Result<(Vec<u8>, Option<String>), ApiError> {
    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(req, &())
            .await
            .map_err(|err| ApiError::InvalidRequest(format!("invalid multipart body: {err}")))?;

        let mut xml = Vec::new();
        let mut name = None;
        let mut filename = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| ApiError::InvalidRequest(format!("invalid multipart body: {err}")))?
        {
            let field_name = field.name().map(str::to_string);
            match field_name.as_deref() {
                Some("file") => {
                    filename = field.file_name().map(str::to_string);
                    xml = field
                        .bytes()
                        .await
                        .map_err(|err| {
                            ApiError::InvalidRequest(format!("failed to read file field: {err}"))
                        })?
                        .to_vec();
                }
                Some("name") => {
                    name = Some(field.text().await.map_err(|err| {
                        ApiError::InvalidRequest(format!("failed to read name field: {err}"))
                    })?);
                }
                _ => {}
            }
        }

        return Ok((xml, name.or(filename)));
    }

    let body = to_bytes(req.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|err| ApiError::InvalidRequest(format!("failed to read request body: {err}")))?;

    if content_type.starts_with("application/json") {
        let deploy: DeployRequest = serde_json::from_slice(&body)
            .map_err(|err| ApiError::InvalidRequest(format!("invalid JSON body: {err}")))?;
        return Ok((deploy.xml.into_bytes(), deploy.name));
    }

    // Anything else is treated as raw XML
    Ok((body.to_vec(), None))
}

/// List the latest version of each deployed definition
pub(super) async fn list_definitions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<DefinitionResponse>>, ApiError> {
    let tenant = tenant_from_headers(&headers);

    let filter = ListFilter {
        key: query.key,
        tenant_id: if tenant.is_empty() { None } else { Some(tenant) },
        limit: query.limit.unwrap_or(100),
        offset: query.offset.unwrap_or(0),
    };

    let definitions = state.repo.list(&filter).await.map_err(|err| {
        error!("failed to list definitions: {err}");
        ApiError::Repository(err)
    })?;

    Ok(Json(
        definitions.iter().map(DefinitionResponse::from).collect(),
    ))
}

async fn load_definition(
    state: &AppState,
    key: &str,
    version: Option<i32>,
    tenant_id: &str,
) -> Result<Definition, ApiError> {
    let result = match version {
        Some(version) if version > 0 => {
            state
                .repo
                .get_by_key_and_version(key, version, tenant_id)
                .await
        }
        _ => state.repo.get_by_key(key, tenant_id).await,
    };

    result.map_err(|err| {
        if err.is_not_found() {
            ApiError::NotFound("definition not found".to_string())
        } else {
            ApiError::Repository(err)
        }
    })
}

/// Definition summary by key (latest, or `?version=`)
pub(super) async fn get_definition(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Query(query): Query<VersionQuery>,
) -> Result<Json<DefinitionResponse>, ApiError> {
    let def = load_definition(&state, &key, query.version, &tenant_from_headers(&headers)).await?;
    Ok(Json(DefinitionResponse::from(&def)))
}

/// The original XML source of a definition
pub(super) async fn get_definition_xml(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Query(query): Query<VersionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let def = load_definition(&state, &key, query.version, &tenant_from_headers(&headers)).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/xml".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}.dmn", def.key),
            ),
        ],
        def.source,
    ))
}

/// The parsed model of a definition as JSON
pub(super) async fn get_definition_parsed(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Query(query): Query<VersionQuery>,
) -> Result<Json<verdict_core::Definitions>, ApiError> {
    let def = load_definition(&state, &key, query.version, &tenant_from_headers(&headers)).await?;
    Ok(Json(def.parsed_model))
}

/// Every deployed version of a definition, newest first
pub(super) async fn get_definition_versions(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<Json<VersionsResponse>, ApiError> {
    let versions = state
        .repo
        .get_all_versions(&key, &tenant_from_headers(&headers))
        .await
        .map_err(|err| {
            if err.is_not_found() {
                ApiError::NotFound("definition not found".to_string())
            } else {
                ApiError::Repository(err)
            }
        })?;

    Ok(Json(VersionsResponse {
        key,
        versions: versions
            .iter()
            .map(|def| VersionInfo {
                version: def.version,
                created_at: def
                    .created_at
                    .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
                checksum: def.checksum.clone(),
            })
            .collect(),
    }))
}

/// Delete every version of a definition
pub(super) async fn delete_definition(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let tenant_id = tenant_from_headers(&headers);

    state.repo.delete(&key, &tenant_id).await.map_err(|err| {
        if err.is_not_found() {
            ApiError::NotFound("definition not found".to_string())
        } else {
            ApiError::Repository(err)
        }
    })?;

    info!(key = %key, tenant_id = %tenant_id, "definition deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Evaluate a decision
pub(super) async fn evaluate(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonExtractor(payload): JsonExtractor<EvaluatePayload>,
) -> Result<Json<verdict_engine::EvaluateResult>, ApiError> {
    if payload.decision_key.is_empty() {
        return Err(ApiError::InvalidRequest("decisionKey is required".to_string()));
    }

    // Body tenant wins over the header
    let tenant_id = payload
        .tenant_id
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| tenant_from_headers(&headers));

    let request = EvaluateRequest {
        decision_key: payload.decision_key,
        version: payload.version,
        variables: convert_variables(&payload.variables)?,
        tenant_id,
    };

    let result = state.engine.evaluate(&request).await.map_err(|err| {
        error!(decision_key = %request.decision_key, "evaluation failed: {err}");
        ApiError::Engine(err)
    })?;

    info!(
        decision_key = %result.decision_key,
        version = result.version,
        matched_rules = result.matched_rules.len(),
        duration_ms = result.duration_ns / 1_000_000,
        "decision evaluated"
    );

    Ok(Json(result))
}
