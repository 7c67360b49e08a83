pub mod diagnostics;
pub mod errors;
pub mod options;
pub mod patterns;
pub mod routes;

pub use diagnostics::Diagnostics;
pub use errors::SanitizeError;
pub use options::{
    ArrayOptions, CustomSanitizer, DebugLevel, DebugOptions, OptionResolver, PartialDebugOptions,
    PartialOptions, RequestSection, SanitizeMode, SanitizeOptions, StringOptions,
};
pub use patterns::{PatternSet, DEFAULT_PATTERNS};
pub use routes::{normalize_path, RouteFilter};
