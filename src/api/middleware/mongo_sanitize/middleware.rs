use axum::{extract::Request, response::Response};
use serde_json::json;
use std::sync::Arc;
use tower::Layer;

use super::adapter::{RequestAdapter, DEFAULT_BODY_LIMIT};
use super::manual::ManualSanitizer;
use crate::domain::{Diagnostics, SanitizeMode, SanitizeOptions};

/// Tower layer running the sanitizer in front of the wrapped service.
///
/// The options are resolved once, when the layer is built, and shared
/// read-only by every request.
#[derive(Debug, Clone)]
pub struct SanitizeLayer {
    options: Arc<SanitizeOptions>,
    body_limit: usize,
}

impl SanitizeLayer {
    pub fn new(options: SanitizeOptions) -> Self {
        Self {
            options: Arc::new(options),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Largest JSON or form body that will be buffered and sanitized. Larger bodies
    /// pass through untouched.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn options(&self) -> &SanitizeOptions {
        &self.options
    }
}

impl<S> Layer<S> for SanitizeLayer
where
    S: tower::Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Service = SanitizeService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SanitizeService {
            inner,
            options: Arc::clone(&self.options),
            body_limit: self.body_limit,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SanitizeService<S> {
    inner: S,
    options: Arc<SanitizeOptions>,
    body_limit: usize,
}

impl<S> tower::Service<Request> for SanitizeService<S>
where
    S: tower::Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let options = Arc::clone(&self.options);
        let body_limit = self.body_limit;

        Box::pin(async move {
            let diagnostics = Diagnostics::new(options.debug());
            let path = request.uri().path();

            if options.skip_routes().should_skip(path) {
                if options.debug().log_skipped_routes {
                    diagnostics.info("route", "Route skipped", Some(&json!({ "path": path })));
                }
                return inner.call(request).await;
            }

            let request = match options.mode() {
                SanitizeMode::Auto => {
                    RequestAdapter::new(options, body_limit)
                        .sanitize_request(request)
                        .await
                }
                SanitizeMode::Manual => {
                    let mut request = request;
                    request
                        .extensions_mut()
                        .insert(ManualSanitizer::new(options, body_limit));
                    request
                }
            };

            inner.call(request).await
        })
    }
}
