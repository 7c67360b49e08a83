use serde_json::Value;
use std::collections::HashSet;

use super::classifier::{classify, is_truthy};
use super::Sanitizer;
use crate::domain::SanitizeError;

/// Identity used for de-duplication. Containers have none and are never
/// merged, even when structurally equal.
#[derive(Debug, PartialEq, Eq, Hash)]
enum DistinctKey {
    Null,
    Bool(bool),
    Number(u64),
    String(String),
}

impl DistinctKey {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => n.as_f64().map(|f| {
                // 0.0 and -0.0 are the same element
                let f = if f == 0.0 { 0.0 } else { f };
                Self::Number(f.to_bits())
            }),
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl Sanitizer<'_> {
    /// Sanitize every element, then apply the array options.
    ///
    /// Fails with a structural error when `value` is not an array.
    pub fn sanitize_array(&self, value: Value) -> Result<Value, SanitizeError> {
        self.sanitize_array_at(value, 0)
    }

    pub(super) fn sanitize_array_at(
        &self,
        value: Value,
        depth: usize,
    ) -> Result<Value, SanitizeError> {
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(SanitizeError::Structural {
                    sanitizer: "array sanitizer",
                    expected: "an array",
                    actual: classify(&other).name(),
                })
            }
        };

        let mut sanitized = items
            .into_iter()
            .map(|item| self.sanitize_value_at(item, true, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;

        let array_options = self.options.array_options();
        if array_options.filter_null {
            sanitized.retain(is_truthy);
        }

        if array_options.distinct {
            let mut seen = HashSet::new();
            sanitized.retain(|item| match DistinctKey::of(item) {
                Some(key) => seen.insert(key),
                None => true,
            });
        }

        Ok(Value::Array(sanitized))
    }
}
