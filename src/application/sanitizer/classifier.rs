use serde_json::Value;
use validator::ValidateEmail;

/// Shape of a value as far as sanitization is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// `null`, booleans and numbers.
    Primitive,
    String,
    /// A string that parses as an email address. Exempt from substitution.
    Email,
    Array,
    Object,
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Primitive => "primitive",
            Self::String => "string",
            Self::Email => "email",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

pub fn classify(value: &Value) -> ValueKind {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) => ValueKind::Primitive,
        Value::String(s) if is_email(s) => ValueKind::Email,
        Value::String(_) => ValueKind::String,
        Value::Array(_) => ValueKind::Array,
        Value::Object(_) => ValueKind::Object,
    }
}

pub fn is_email(input: &str) -> bool {
    input.validate_email()
}

pub fn is_email_value(value: &Value) -> bool {
    value.as_str().is_some_and(is_email)
}

/// Truthiness as the request data's origin sees it: `null`, `false`, zero
/// and the empty string are falsy; every array and object is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
