pub mod mongo_sanitize;

pub use mongo_sanitize::{
    create_param_handler, create_sanitize_middleware, param_middleware, ManualSanitizer,
    ParamHandler, SanitizeLayer, SanitizeService, SanitizedParams, SanitizedQuery,
};
