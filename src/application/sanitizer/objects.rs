use serde_json::{json, Map, Value};

use super::classifier::{classify, is_email_value, is_truthy};
use super::Sanitizer;
use crate::domain::{DebugLevel, SanitizeError};

impl Sanitizer<'_> {
    /// Sanitize every key/value pair of an object under the key policy.
    ///
    /// Fails with a structural error when `value` is not an object.
    pub fn sanitize_object(&self, value: Value) -> Result<Value, SanitizeError> {
        self.sanitize_object_at(value, 0)
    }

    pub(super) fn sanitize_object_at(
        &self,
        value: Value,
        depth: usize,
    ) -> Result<Value, SanitizeError> {
        let fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(SanitizeError::Structural {
                    sanitizer: "object sanitizer",
                    expected: "a plain object",
                    actual: classify(&other).name(),
                })
            }
        };

        let options = self.options;
        let allowed = options.allowed_keys();
        let denied = options.denied_keys();
        let patterns = options.patterns();
        let mut sanitized = Map::with_capacity(fields.len());

        for (key, val) in fields {
            if !allowed.is_empty() && !allowed.contains(&key) {
                self.trace_key("Key not in allow-list, dropped", &key);
                continue;
            }

            // Denied keys only survive when they carry an email
            let denied_email = denied.contains(&key) && is_email_value(&val);
            if denied.contains(&key) && !denied_email {
                self.trace_key("Key in deny-list, dropped", &key);
                continue;
            }

            let clean_key = self.sanitize_string(&key, false);

            if options.remove_matches() && patterns.is_match(&key) {
                self.trace_key("Key matches a pattern, dropped", &key);
                continue;
            }

            if options.remove_empty() && clean_key.is_empty() {
                self.trace_key("Key empty after sanitizing, dropped", &key);
                continue;
            }

            if denied_email {
                sanitized.insert(clean_key, val);
                continue;
            }

            if options.remove_matches() && val.as_str().is_some_and(|s| patterns.is_match(s)) {
                self.trace_key("Value matches a pattern, dropped", &key);
                continue;
            }

            let clean_val = self.sanitize_value_at(val, true, depth + 1)?;
            if options.remove_empty() && !is_truthy(&clean_val) {
                self.trace_key("Value empty after sanitizing, dropped", &key);
                continue;
            }

            sanitized.insert(clean_key, clean_val);
        }

        Ok(Value::Object(sanitized))
    }

    fn trace_key(&self, message: &str, key: &str) {
        if self.diagnostics.is_enabled_for(DebugLevel::Trace) {
            self.diagnostics
                .trace("object", message, Some(&json!({ "key": key })));
        }
    }
}
