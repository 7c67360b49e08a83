use axum::{
    extract::{FromRequestParts, RawPathParams, Request, State},
    middleware::Next,
    response::Response,
};
use std::collections::HashSet;
use std::sync::Arc;

use super::sections::SanitizedParams;
use crate::application::sanitizer::Sanitizer;
use crate::domain::SanitizeOptions;

/// Per-parameter sanitizer for route parameter hooks.
///
/// Route parameters are always scalar strings, so each one goes through the
/// string sanitizer only; there is nothing to recurse into.
#[derive(Debug, Clone)]
pub struct ParamHandler {
    options: Arc<SanitizeOptions>,
    names: Option<HashSet<String>>,
}

impl ParamHandler {
    pub fn new(options: SanitizeOptions) -> Self {
        Self {
            options: Arc::new(options),
            names: None,
        }
    }

    /// Restrict the hook to the named parameters. By default every route
    /// parameter is handled.
    pub fn for_params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn applies_to(&self, name: &str) -> bool {
        self.names
            .as_ref()
            .map_or(true, |names| names.contains(name))
    }

    /// Sanitize one parameter value and store it under `name`.
    pub fn handle(&self, params: &mut SanitizedParams, name: &str, value: &str) {
        let sanitized = Sanitizer::new(&self.options).sanitize_string(value, true);
        params.insert(name, sanitized);
    }
}

/// Middleware form of [`ParamHandler`], for
/// `axum::middleware::from_fn_with_state`. Must run after routing
/// (`route_layer`) so the parameters are known.
pub async fn param_middleware(
    State(handler): State<ParamHandler>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    if let Ok(raw) = RawPathParams::from_request_parts(&mut parts, &()).await {
        let mut params = parts
            .extensions
            .remove::<SanitizedParams>()
            .unwrap_or_default();
        for (name, value) in raw.iter() {
            if handler.applies_to(name) {
                handler.handle(&mut params, name, value);
            }
        }
        parts.extensions.insert(params);
    }

    next.run(Request::from_parts(parts, body)).await
}
