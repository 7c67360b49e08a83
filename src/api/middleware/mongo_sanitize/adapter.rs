//! Request adapter: pulls the configured sections out of a request,
//! sanitizes them and writes the results back.
//!
//! Write-back is two-step. Sections the request owns (the JSON or form body, the
//! query string inside the URI) are rewritten in place. When that is not
//! possible (route parameters belong to the router, or the rebuilt URI is
//! rejected) the sanitized section is attached as a request extension.

use axum::{
    body::{Body, Bytes},
    extract::{FromRequestParts, RawPathParams, Request},
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE, TRANSFER_ENCODING},
        request::Parts,
        uri::PathAndQuery,
        HeaderMap, HeaderValue, Uri,
    },
};
use futures_util::{stream, StreamExt};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::sections::{SanitizedParams, SanitizedQuery};
use crate::application::sanitizer::Sanitizer;
use crate::domain::{DebugLevel, Diagnostics, RequestSection, SanitizeOptions};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Default cap on buffered JSON bodies (matches axum's default body limit).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Result of sanitizing one section snapshot.
struct SanitizedSection {
    value: Value,
    changed: bool,
}

/// Body encodings treated as the body section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFormat {
    Json,
    Form,
}

impl BodyFormat {
    fn of(headers: &HeaderMap) -> Option<Self> {
        let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        if essence == "application/json" || essence.ends_with("+json") {
            Some(Self::Json)
        } else if essence == "application/x-www-form-urlencoded" {
            Some(Self::Form)
        } else {
            None
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Form => "form data",
        }
    }
}

enum BufferedBody {
    Complete(Bytes),
    /// Over the limit; replays what was read, then the rest of the stream.
    Passthrough(Body),
    /// The stream failed; replays what was read, then the error.
    Failed(Body, String),
}

pub struct RequestAdapter {
    options: Arc<SanitizeOptions>,
    body_limit: usize,
    diagnostics: Diagnostics,
}

impl RequestAdapter {
    pub fn new(options: Arc<SanitizeOptions>, body_limit: usize) -> Self {
        let diagnostics = Diagnostics::new(options.debug());
        Self {
            options,
            body_limit,
            diagnostics,
        }
    }

    /// Sanitize every configured section of `request`.
    pub async fn sanitize_request(&self, request: Request) -> Request {
        if self.diagnostics.is_enabled_for(DebugLevel::Debug) {
            self.diagnostics.debug(
                "request",
                "Sanitizing request",
                Some(&json!({
                    "method": request.method().as_str(),
                    "uri": request.uri().to_string(),
                    "sections": self
                        .options
                        .sanitize_objects()
                        .iter()
                        .map(RequestSection::as_str)
                        .collect::<Vec<_>>(),
                })),
            );
        }

        let (mut parts, mut body) = request.into_parts();
        for section in self.options.sanitize_objects() {
            match section {
                RequestSection::Body => body = self.sanitize_body(&mut parts, body).await,
                RequestSection::Query => self.sanitize_query(&mut parts),
                RequestSection::Params => self.sanitize_params(&mut parts).await,
            }
        }

        Request::from_parts(parts, body)
    }

    /// Sanitize a snapshot of one section, through the custom sanitizer when
    /// one is configured. Returns `None` for empty sections.
    fn sanitize_section(&self, section: RequestSection, value: Value) -> Option<SanitizedSection> {
        if !is_populated(&value) {
            return None;
        }

        let snapshot = value.clone();
        let sanitized = match self.options.custom_sanitizer() {
            Some(custom) => custom.apply(value, &self.options),
            None => match Sanitizer::new(&self.options).sanitize(value) {
                Ok(sanitized) => sanitized,
                Err(e) => {
                    self.diagnostics.error(
                        section.as_str(),
                        &format!("Sanitization failed, section left as is: {e}"),
                        None,
                    );
                    return None;
                }
            },
        };

        let changed = sanitized != snapshot;
        if changed {
            self.diagnostics.debug(
                section.as_str(),
                "Section sanitized",
                Some(&json!({ "before": snapshot, "after": sanitized })),
            );
        }

        Some(SanitizedSection {
            value: sanitized,
            changed,
        })
    }

    async fn sanitize_body(&self, parts: &mut Parts, body: Body) -> Body {
        let Some(format) = BodyFormat::of(&parts.headers) else {
            return body;
        };

        if parse_content_length(&parts.headers).is_some_and(|len| len > self.body_limit as u64) {
            self.diagnostics.warn(
                "body",
                "Body exceeds the buffering limit, not sanitized",
                Some(&json!({ "limit": self.body_limit })),
            );
            return body;
        }

        let bytes = match self.buffer_body(body).await {
            BufferedBody::Complete(bytes) => bytes,
            BufferedBody::Passthrough(body) => {
                self.diagnostics.warn(
                    "body",
                    "Body exceeds the buffering limit, not sanitized",
                    Some(&json!({ "limit": self.body_limit })),
                );
                return body;
            }
            BufferedBody::Failed(body, message) => {
                self.diagnostics.error(
                    "body",
                    &format!("Failed to read request body: {message}"),
                    None,
                );
                return body;
            }
        };

        let value = match format {
            BodyFormat::Json => serde_json::from_slice::<Value>(&bytes).map_err(BoxError::from),
            BodyFormat::Form => serde_urlencoded::from_bytes::<Vec<(String, String)>>(&bytes)
                .map(query_to_value)
                .map_err(BoxError::from),
        };
        let value = match value {
            Ok(value) => value,
            Err(e) => {
                self.diagnostics.debug(
                    "body",
                    &format!("Body is not valid {}: {e}", format.name()),
                    None,
                );
                return Body::from(bytes);
            }
        };

        let Some(sanitized) = self.sanitize_section(RequestSection::Body, value) else {
            return Body::from(bytes);
        };
        if !sanitized.changed {
            return Body::from(bytes);
        }

        let encoded = match format {
            BodyFormat::Json => serde_json::to_vec(&sanitized.value).map_err(BoxError::from),
            BodyFormat::Form => encode_query(&sanitized.value).map(String::into_bytes),
        };
        match encoded {
            Ok(buf) => {
                parts.headers.remove(TRANSFER_ENCODING);
                parts
                    .headers
                    .insert(CONTENT_LENGTH, HeaderValue::from(buf.len()));
                Body::from(buf)
            }
            Err(e) => {
                self.diagnostics.error(
                    "body",
                    &format!("Failed to encode sanitized body: {e}"),
                    None,
                );
                Body::from(bytes)
            }
        }
    }

    /// Read the body into memory, up to the buffering limit. A body that
    /// does not fit is rebuilt from the chunks already read followed by the
    /// rest of the stream, so nothing downstream can tell it was touched.
    async fn buffer_body(&self, body: Body) -> BufferedBody {
        let mut chunks = body.into_data_stream();
        let mut read = Vec::new();

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(chunk) if read.len() + chunk.len() <= self.body_limit => {
                    read.extend_from_slice(&chunk)
                }
                Ok(chunk) => {
                    let head = stream::iter([Ok(Bytes::from(read)), Ok(chunk)]);
                    return BufferedBody::Passthrough(Body::from_stream(head.chain(chunks)));
                }
                Err(e) => {
                    // Replay the failure so the handler sees the same error
                    let message = e.to_string();
                    let replay = stream::iter([Ok(Bytes::from(read)), Err(e)]);
                    return BufferedBody::Failed(Body::from_stream(replay), message);
                }
            }
        }

        BufferedBody::Complete(Bytes::from(read))
    }

    fn sanitize_query(&self, parts: &mut Parts) {
        let Some(query) = parts.uri.query().filter(|q| !q.is_empty()) else {
            return;
        };

        let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(query) {
            Ok(pairs) => pairs,
            Err(e) => {
                self.diagnostics
                    .warn("query", &format!("Query string not parsable: {e}"), None);
                return;
            }
        };

        let Some(sanitized) = self.sanitize_section(RequestSection::Query, query_to_value(pairs))
        else {
            return;
        };
        if !sanitized.changed {
            return;
        }

        match rewrite_query(&parts.uri, &sanitized.value) {
            Ok(uri) => parts.uri = uri,
            Err(e) => {
                self.diagnostics.warn(
                    "query",
                    &format!("Query could not be written back, attached as extension: {e}"),
                    None,
                );
                parts.extensions.insert(SanitizedQuery(sanitized.value));
            }
        }
    }

    async fn sanitize_params(&self, parts: &mut Parts) {
        let raw = match RawPathParams::from_request_parts(parts, &()).await {
            Ok(raw) => raw,
            Err(_) => {
                self.diagnostics
                    .trace("params", "No route parameters on this request", None);
                return;
            }
        };

        let value = Value::Object(
            raw.iter()
                .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
                .collect(),
        );

        if let Some(sanitized) = self.sanitize_section(RequestSection::Params, value) {
            let mut params = parts
                .extensions
                .remove::<SanitizedParams>()
                .unwrap_or_default();
            params.extend(SanitizedParams::from_value(&sanitized.value));
            parts.extensions.insert(params);
        }
    }
}

/// Non-empty object or array. Everything else is left alone.
fn is_populated(value: &Value) -> bool {
    match value {
        Value::Object(fields) => !fields.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => false,
    }
}

fn parse_content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
}

/// Query pairs as an object. Repeated keys collect into an array.
fn query_to_value(pairs: Vec<(String, String)>) -> Value {
    let mut fields = Map::new();
    for (key, value) in pairs {
        match fields.get_mut(&key) {
            Some(Value::Array(items)) => items.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                fields.insert(key, Value::String(value));
            }
        }
    }
    Value::Object(fields)
}

fn query_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn encode_query(value: &Value) -> Result<String, BoxError> {
    let fields = value
        .as_object()
        .ok_or("sanitized query is not an object")?;

    let mut pairs: Vec<(&str, String)> = Vec::new();
    for (key, value) in fields {
        match value {
            Value::Array(items) => {
                pairs.extend(items.iter().filter_map(query_text).map(|t| (key.as_str(), t)))
            }
            other => pairs.extend(query_text(other).map(|t| (key.as_str(), t))),
        }
    }

    Ok(serde_urlencoded::to_string(pairs)?)
}

fn rewrite_query(uri: &Uri, value: &Value) -> Result<Uri, BoxError> {
    let query = encode_query(value)?;
    let path_and_query = if query.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), query)
    };

    let mut uri_parts = uri.clone().into_parts();
    uri_parts.path_and_query = Some(PathAndQuery::try_from(path_and_query)?);
    Ok(Uri::from_parts(uri_parts)?)
}
