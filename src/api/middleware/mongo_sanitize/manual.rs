use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
};
use serde_json::Value;
use std::sync::Arc;

use super::adapter::RequestAdapter;
use crate::api::errors::ApiError;
use crate::application::sanitizer::Sanitizer;
use crate::domain::{OptionResolver, PartialOptions, SanitizeError, SanitizeOptions};

/// Sanitizer attached to each request in manual mode.
///
/// Nothing is sanitized until a handler calls it. Handlers can take it from
/// the request extensions or extract it directly.
#[derive(Debug, Clone)]
pub struct ManualSanitizer {
    options: Arc<SanitizeOptions>,
    body_limit: usize,
}

impl ManualSanitizer {
    pub(crate) fn new(options: Arc<SanitizeOptions>, body_limit: usize) -> Self {
        Self {
            options,
            body_limit,
        }
    }

    pub fn options(&self) -> &SanitizeOptions {
        &self.options
    }

    /// Sanitize the request with the layer's options.
    pub async fn sanitize(&self, request: Request) -> Request {
        RequestAdapter::new(Arc::clone(&self.options), self.body_limit)
            .sanitize_request(request)
            .await
    }

    /// Sanitize the request with `overrides` merged over the layer's options.
    pub async fn sanitize_with(
        &self,
        request: Request,
        overrides: PartialOptions,
    ) -> Result<Request, SanitizeError> {
        let options = OptionResolver::merge(&self.options, overrides)?;
        Ok(RequestAdapter::new(Arc::new(options), self.body_limit)
            .sanitize_request(request)
            .await)
    }

    /// Sanitize an already extracted value, e.g. a deserialized body.
    pub fn sanitize_value(&self, value: Value) -> Result<Value, SanitizeError> {
        match self.options.custom_sanitizer() {
            Some(custom) => Ok(custom.apply(value, &self.options)),
            None => Sanitizer::new(&self.options).sanitize(value),
        }
    }
}

impl<S> FromRequestParts<S> for ManualSanitizer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| ApiError::internal_error("Manual sanitizer not attached to request"))
    }
}
