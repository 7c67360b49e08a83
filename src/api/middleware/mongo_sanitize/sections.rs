//! Request-extension containers for sections the request itself cannot hold.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde_json::Value;
use std::collections::HashMap;
use std::convert::Infallible;

/// Sanitized route parameters.
///
/// Route parameters are owned by the router and read-only to middleware, so
/// sanitized copies are attached to the request instead. Extracting this in
/// a handler never fails; it is empty when nothing was sanitized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizedParams(HashMap<String, String>);

impl SanitizedParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn extend(&mut self, other: SanitizedParams) {
        self.0.extend(other.0);
    }

    /// Build from a sanitized params object. Non-string values are stored
    /// in their JSON text form.
    pub fn from_value(value: &Value) -> Self {
        let mut params = Self::default();
        if let Some(fields) = value.as_object() {
            for (name, value) in fields {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                params.insert(name.clone(), text);
            }
        }
        params
    }
}

impl<S> FromRequestParts<S> for SanitizedParams
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_default())
    }
}

/// Sanitized query section, attached only when the rewritten query could
/// not be written back into the request URI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SanitizedQuery(pub Value);
