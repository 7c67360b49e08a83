pub mod sanitizer;

pub use sanitizer::{classify, is_email, is_truthy, Sanitizer, ValueKind};
