//! # nosql_sanitize - NoSQL Injection Sanitization Middleware
//!
//! Strips query-operator syntax (`$`, `.`, brace expressions, control
//! characters) from the keys and string values of incoming request data
//! before it reaches handlers that build database queries from it.
//!
//! ## Architecture Layers
//!
//! - **Domain**: Options, validation, patterns, route filter, diagnostics
//! - **Application**: The recursive value sanitizer
//! - **API**: Tower layer, manual sanitizer, parameter hook, demo handlers
//!
//! ## Example Usage
//!
//! ```no_run
//! use axum::{routing::post, Router};
//! use nosql_sanitize::{create_sanitize_middleware, PartialOptions};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let layer = create_sanitize_middleware(
//!     PartialOptions::new()
//!         .with_replace_with("_")
//!         .with_skip_routes(["/health"]),
//! )?;
//! let app: Router = Router::new()
//!     .route("/users", post(|| async { "ok" }))
//!     .layer(layer);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod application;
pub mod config;
pub mod domain;

// Re-export key types explicitly to avoid ambiguity
pub use api::middleware::{
    create_param_handler, create_sanitize_middleware, ManualSanitizer, ParamHandler,
    SanitizeLayer, SanitizedParams, SanitizedQuery,
};
pub use application::Sanitizer;
pub use config::{Config, ConfigError};
pub use domain::{
    OptionResolver, PartialOptions, RequestSection, SanitizeError, SanitizeMode, SanitizeOptions,
};
