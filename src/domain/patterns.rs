//! Matching patterns for injection-bearing substrings.

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use std::borrow::Cow;

use super::errors::SanitizeError;

/// Built-in patterns, one per injection vector class:
/// operator prefix, path separator, regex/JS metacharacters, control
/// characters and brace-delimited template sequences.
pub const DEFAULT_PATTERNS: &[&str] = &[
    r"\$",
    r"\.",
    r"[\\/{}.(*+?|\[\]^)]",
    r"[\x00-\x1F\x7F-\x9F]",
    r"\{\s*\$|\$?\{(.|\r?\n)*\}",
];

static DEFAULT_PATTERN_SET: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::new(DEFAULT_PATTERNS.iter().copied()).expect("Invalid built-in sanitize patterns")
});

/// Ordered list of patterns compiled into a single alternation, so every
/// string is rewritten in one pass.
#[derive(Debug, Clone)]
pub struct PatternSet {
    sources: Vec<String>,
    combined: Regex,
}

impl PatternSet {
    pub fn new<I, S>(patterns: I) -> Result<Self, SanitizeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sources: Vec<String> = patterns.into_iter().map(Into::into).collect();
        if sources.is_empty() {
            return Err(SanitizeError::configuration("patterns", "[]"));
        }

        // Compile one by one first so the error names the offending pattern
        for pattern in &sources {
            Regex::new(pattern).map_err(|source| SanitizeError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
        }

        let alternation = sources
            .iter()
            .map(|p| format!("(?:{p})"))
            .collect::<Vec<_>>()
            .join("|");
        let combined = Regex::new(&alternation).map_err(|source| SanitizeError::InvalidPattern {
            pattern: alternation.clone(),
            source,
        })?;

        Ok(Self { sources, combined })
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn is_match(&self, input: &str) -> bool {
        self.combined.is_match(input)
    }

    /// Replace every match with `replacement`, taken literally (`$` in the
    /// replacement is not a group reference).
    pub fn replace_all<'a>(&self, input: &'a str, replacement: &str) -> Cow<'a, str> {
        self.combined.replace_all(input, NoExpand(replacement))
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        DEFAULT_PATTERN_SET.clone()
    }
}

impl PartialEq for PatternSet {
    fn eq(&self, other: &Self) -> bool {
        self.sources == other.sources
    }
}
