use axum::{extract::Request, http::StatusCode, response::Json};
use http_body_util::LengthLimitError;
use serde_json::{json, Map, Value};

use crate::api::errors::ApiError;
use crate::api::middleware::mongo_sanitize::DEFAULT_BODY_LIMIT;
use crate::api::middleware::{ManualSanitizer, SanitizedParams, SanitizedQuery};

/// GET|POST /echo
/// Returns the query and JSON body as the handler sees them. In manual mode
/// the attached sanitizer is invoked first.
pub async fn echo_handler(request: Request) -> Result<Json<Value>, ApiError> {
    let manual = request.extensions().get::<ManualSanitizer>().cloned();
    let request = match manual {
        Some(sanitizer) => sanitizer.sanitize(request).await,
        None => request,
    };

    let query = match request.extensions().get::<SanitizedQuery>() {
        Some(SanitizedQuery(value)) => value.clone(),
        None => query_json(request.uri().query().unwrap_or_default())?,
    };

    let bytes = axum::body::to_bytes(request.into_body(), DEFAULT_BODY_LIMIT)
        .await
        .map_err(body_read_error)?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))?
    };

    Ok(Json(json!({ "query": query, "body": body })))
}

/// GET /echo/{id}
/// Returns the route parameters after the parameter hook ran.
pub async fn echo_params_handler(params: SanitizedParams) -> Json<Value> {
    let params: Map<String, Value> = params
        .iter()
        .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
        .collect();

    Json(json!({ "params": params }))
}

/// Map a body read failure to a response. A size limit tripped anywhere
/// below (the outer limit layer or the read here) is a 413.
fn body_read_error(err: axum::Error) -> ApiError {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
        }
        source = e.source();
    }

    ApiError::bad_request(format!("Failed to read body: {}", err))
}

fn query_json(query: &str) -> Result<Value, ApiError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
        .map_err(|e| ApiError::bad_request(format!("Invalid query string: {}", e)))?;

    Ok(Value::Object(
        pairs
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect(),
    ))
}
