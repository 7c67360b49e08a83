//! Recursive value sanitizer.
//!
//! [`Sanitizer::sanitize_value`] is the single dispatch point: it classifies
//! a value and hands it to the string, array or object sanitizer, which call
//! back into it for nested content. Every call returns a new value; the
//! input is consumed, never patched in place.

pub mod arrays;
pub mod classifier;
pub mod objects;
pub mod strings;


use serde_json::{json, Value};

use crate::domain::{Diagnostics, SanitizeError, SanitizeOptions};

pub use classifier::{classify, is_email, is_truthy, ValueKind};

/// Applies one set of options to JSON values.
#[derive(Debug, Clone, Copy)]
pub struct Sanitizer<'a> {
    options: &'a SanitizeOptions,
    diagnostics: Diagnostics,
}

impl<'a> Sanitizer<'a> {
    pub fn new(options: &'a SanitizeOptions) -> Self {
        Self {
            options,
            diagnostics: Diagnostics::new(options.debug()),
        }
    }

    pub fn options(&self) -> &'a SanitizeOptions {
        self.options
    }

    /// Sanitize a whole request section or document.
    pub fn sanitize(&self, value: Value) -> Result<Value, SanitizeError> {
        self.sanitize_value(value, false)
    }

    /// Route `value` to the sanitizer for its shape. Falsy values and
    /// primitives come back unchanged.
    pub fn sanitize_value(&self, value: Value, is_value: bool) -> Result<Value, SanitizeError> {
        self.sanitize_value_at(value, is_value, 0)
    }

    pub(crate) fn sanitize_value_at(
        &self,
        value: Value,
        is_value: bool,
        depth: usize,
    ) -> Result<Value, SanitizeError> {
        if !is_truthy(&value) {
            return Ok(value);
        }

        match classify(&value) {
            ValueKind::Primitive => Ok(value),
            ValueKind::String | ValueKind::Email => match value {
                Value::String(s) => Ok(Value::String(self.sanitize_string(&s, is_value))),
                other => Ok(other),
            },
            kind @ (ValueKind::Array | ValueKind::Object) => {
                if depth > 0 && !self.options.recursive() {
                    return Ok(value);
                }
                if depth > self.options.max_depth() {
                    self.diagnostics.warn(
                        "value",
                        "Maximum depth exceeded, value dropped",
                        Some(&json!({ "depth": depth, "maxDepth": self.options.max_depth() })),
                    );
                    return Ok(Value::Null);
                }
                if kind == ValueKind::Array {
                    self.sanitize_array_at(value, depth)
                } else {
                    self.sanitize_object_at(value, depth)
                }
            }
        }
    }
}
