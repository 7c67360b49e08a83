//! API endpoint tests
//!
//! Drive the demo router end to end with the sanitization layer in front,
//! covering auto and manual mode, skipped routes and route parameters.

use axum::body::{Body, Bytes};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use tower_http::limit::RequestBodyLimitLayer;

use nosql_sanitize::{
    api::create_router, OptionResolver, ParamHandler, PartialOptions, SanitizeLayer,
    SanitizeMode,
};

/// Setup test router with the given options
fn setup_router(options: PartialOptions) -> Router {
    let options = OptionResolver::resolve(options).unwrap();
    create_router(SanitizeLayer::new(options.clone()), ParamHandler::new(options))
}

/// Helper to create JSON requests
fn json_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);

    if let Some(data) = body {
        let bytes = serde_json::to_vec(&data).unwrap();
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, bytes.len())
            .body(Body::from(bytes))
            .unwrap()
    } else {
        builder.body(Body::empty()).unwrap()
    }
}

/// Helper to read a JSON response body
async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_router(PartialOptions::new().with_skip_routes(["/health"]));

    let response = app
        .oneshot(json_request(Method::GET, "/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_echo_sanitizes_body_and_query() {
    let app = setup_router(PartialOptions::new());

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/echo?%24gt=1&name=a.b",
            Some(json!({ "$where": "1==1", "name": "Bob.Smith" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "query": { "gt": "1", "name": "ab" },
            "body": { "where": "1==1", "name": "BobSmith" }
        })
    );
}

#[tokio::test]
async fn test_echo_nested_operators() {
    let app = setup_router(PartialOptions::new());

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/echo",
            Some(json!({
                "user": { "$ne": null, "email": "bob@example.com" },
                "filters": [{ "$gt": "" }, "x.y"]
            })),
        ))
        .await
        .unwrap();

    assert_eq!(
        body_json(response).await["body"],
        json!({
            "user": { "ne": null, "email": "bob@example.com" },
            "filters": [{ "gt": "" }, "xy"]
        })
    );
}

#[tokio::test]
async fn test_echo_with_replacement_and_removal() {
    let app = setup_router(
        PartialOptions::new()
            .with_replace_with("_")
            .with_remove_matches(true)
            .with_denied_keys(["password"]),
    );

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/echo",
            Some(json!({
                "$where": "x",
                "name": "a.b",
                "password": "hunter2",
                "title": "plain"
            })),
        ))
        .await
        .unwrap();

    assert_eq!(body_json(response).await["body"], json!({ "title": "plain" }));
}

#[tokio::test]
async fn test_skipped_route_untouched() {
    let app = setup_router(PartialOptions::new().with_skip_routes(["/echo/"]));

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/echo?%24gt=1",
            Some(json!({ "$where": "1==1" })),
        ))
        .await
        .unwrap();

    assert_eq!(
        body_json(response).await,
        json!({ "query": { "$gt": "1" }, "body": { "$where": "1==1" } })
    );
}

#[tokio::test]
async fn test_manual_mode_sanitizes_in_handler() {
    let app = setup_router(PartialOptions::new().with_mode(SanitizeMode::Manual));

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/echo?%24gt=1",
            Some(json!({ "$where": "a.b" })),
        ))
        .await
        .unwrap();

    assert_eq!(
        body_json(response).await,
        json!({ "query": { "gt": "1" }, "body": { "where": "ab" } })
    );
}

#[tokio::test]
async fn test_route_param_hook() {
    let app = setup_router(PartialOptions::new());

    let response = app
        .oneshot(json_request(Method::GET, "/echo/$abc.d", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "params": { "id": "abcd" } }));
}

#[tokio::test]
async fn test_invalid_json_rejected_by_handler() {
    let app = setup_router(PartialOptions::new());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/echo")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_body_limit_enforced() {
    let app = setup_router(PartialOptions::new()).layer(RequestBodyLimitLayer::new(16));

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/echo",
            Some(json!({ "description": "far more than sixteen bytes" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_body_limit_enforced_for_chunked_body() {
    let app = setup_router(PartialOptions::new()).layer(RequestBodyLimitLayer::new(16));

    let body = r#"{"description":"far more than sixteen bytes!!!"}"#;
    assert_eq!(body.len(), 48);
    let chunks = vec![Ok::<_, std::io::Error>(Bytes::from_static(body.as_bytes()))];
    let request = Request::builder()
        .method(Method::POST)
        .uri("/echo")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from_stream(futures_util::stream::iter(chunks)))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_chunked_body_sanitized() {
    let app = setup_router(PartialOptions::new());

    let chunks = vec![
        Ok::<_, std::io::Error>(Bytes::from_static(br#"{"$where":"#)),
        Ok(Bytes::from_static(br#""Bob.Smith"}"#)),
    ];
    let request = Request::builder()
        .method(Method::POST)
        .uri("/echo")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from_stream(futures_util::stream::iter(chunks)))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["body"], json!({ "where": "BobSmith" }));
}
