use axum::{middleware as axum_middleware, routing::get, Router};

use crate::api::handlers::{echo_handler, echo_params_handler, health_handler};
use crate::api::middleware::{param_middleware, ParamHandler, SanitizeLayer};

/// Create router with all routes and middleware
pub fn create_router(sanitize: SanitizeLayer, params: ParamHandler) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/echo", get(echo_handler).post(echo_handler))
        // Parameter hook runs after routing so the parameters are known
        .route(
            "/echo/{id}",
            get(echo_params_handler).route_layer(axum_middleware::from_fn_with_state(
                params,
                param_middleware,
            )),
        )
        .layer(sanitize)
}
