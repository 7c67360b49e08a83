//! NoSQL-injection sanitization middleware
//!
//! Walks the JSON body, query string and (optionally) route parameters of
//! each request and strips operator-bearing characters and keys before any
//! handler sees them.
//!
//! The module is split into focused components:
//! - middleware.rs: tower layer/service, skip-route check and mode switch
//! - adapter.rs: section extraction, sanitization and write-back
//! - manual.rs: on-demand sanitizer for manual mode
//! - param_handler.rs: per-parameter hook for route parameters
//! - sections.rs: extension containers for read-only sections

pub mod adapter;
pub mod manual;
pub mod middleware;
pub mod param_handler;
pub mod sections;


pub use adapter::{RequestAdapter, DEFAULT_BODY_LIMIT};
pub use manual::ManualSanitizer;
pub use middleware::{SanitizeLayer, SanitizeService};
pub use param_handler::{param_middleware, ParamHandler};
pub use sections::{SanitizedParams, SanitizedQuery};

use crate::domain::{OptionResolver, PartialOptions, SanitizeError};

/// Build the sanitization layer. Invalid options fail here, at setup,
/// never per request.
pub fn create_sanitize_middleware(options: PartialOptions) -> Result<SanitizeLayer, SanitizeError> {
    Ok(SanitizeLayer::new(OptionResolver::resolve(options)?))
}

/// Build a route parameter hook with its own options.
pub fn create_param_handler(options: PartialOptions) -> Result<ParamHandler, SanitizeError> {
    Ok(ParamHandler::new(OptionResolver::resolve(options)?))
}
