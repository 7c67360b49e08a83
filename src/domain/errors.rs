use thiserror::Error;

/// Errors raised by option resolution and by direct calls into the
/// shape-specific sanitizers.
#[derive(Debug, Error)]
pub enum SanitizeError {
    #[error("Invalid configuration: \"{field}\" with value {value}")]
    Configuration { field: String, value: String },

    #[error("Invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("{sanitizer} expects {expected}, got {actual}")]
    Structural {
        sanitizer: &'static str,
        expected: &'static str,
        actual: &'static str,
    },
}

impl SanitizeError {
    pub fn configuration(field: impl Into<String>, value: impl ToString) -> Self {
        Self::Configuration {
            field: field.into(),
            value: value.to_string(),
        }
    }

    /// Error kind reported to integrators. Every failure of this crate is a
    /// type mismatch of some sort.
    pub fn kind(&self) -> &'static str {
        "type_error"
    }

    /// True for errors raised while building options (setup time).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::InvalidPattern { .. }
        )
    }
}
