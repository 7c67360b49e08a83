use axum::{http::StatusCode, response::Json};
use serde_json::json;

/// GET /health
/// Liveness probe. Listed in the default skip routes of the demo server.
pub async fn health_handler() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "nosql_sanitize",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
