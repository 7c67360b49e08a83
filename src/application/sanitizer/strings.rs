use serde_json::json;

use super::classifier::is_email;
use super::Sanitizer;
use crate::domain::DebugLevel;

impl Sanitizer<'_> {
    /// Sanitize one string. `is_value` is false for object keys, which are
    /// never truncated.
    ///
    /// Emails are returned untouched. Everything else goes through a single
    /// substitution pass over all patterns, then trim, lowercase and
    /// truncation in that order.
    pub fn sanitize_string(&self, input: &str, is_value: bool) -> String {
        if is_email(input) {
            if self.diagnostics.is_enabled_for(DebugLevel::Trace) {
                self.diagnostics
                    .trace("string", "Email preserved", Some(&json!(input)));
            }
            return input.to_string();
        }

        let string_options = self.options.string_options();
        let mut result = self
            .options
            .patterns()
            .replace_all(input, self.options.replace_with())
            .into_owned();

        if string_options.trim {
            result = result.trim().to_string();
        }

        if string_options.lowercase {
            result = result.to_lowercase();
        }

        if is_value {
            if let Some(max) = string_options.max_length {
                if result.chars().count() > max {
                    result = result.chars().take(max).collect();
                }
            }
        }

        if result != input && self.diagnostics.is_enabled_for(DebugLevel::Debug) {
            self.diagnostics.debug(
                "string",
                "String sanitized",
                Some(&json!({ "original": input, "sanitized": result })),
            );
        }

        result
    }
}
