//! Sanitizer options and the resolver that validates and merges them.
//!
//! Options reach the resolver either as a typed [`PartialOptions`] (builder
//! style, or deserialized by the caller) or as a raw JSON document loaded
//! from a configuration file. Raw documents are checked against a fixed
//! table of field predicates so the first offending field is the one named
//! in the error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::errors::SanitizeError;
use super::patterns::PatternSet;
use super::routes::RouteFilter;

/// Default nesting limit for containers.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Named request container the middleware can sanitize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestSection {
    Body,
    Query,
    Params,
}

impl RequestSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Query => "query",
            Self::Params => "params",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "body" => Some(Self::Body),
            "query" => Some(Self::Query),
            "params" => Some(Self::Params),
            _ => None,
        }
    }
}

impl fmt::Display for RequestSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SanitizeMode {
    /// Sanitize every request that is not skipped.
    #[default]
    Auto,
    /// Only attach a [`ManualSanitizer`](crate::api::middleware::ManualSanitizer)
    /// to the request; handlers decide when to run it.
    Manual,
}

impl SanitizeMode {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "auto" => Some(Self::Auto),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

/// Diagnostics verbosity, from quietest to noisiest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DebugLevel {
    Silent,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl DebugLevel {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "silent" => Some(Self::Silent),
            "error" => Some(Self::Error),
            "warn" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }
}

/// String shaping applied after pattern substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StringOptions {
    pub trim: bool,
    pub lowercase: bool,
    /// Truncation length in characters. Applies to values, never to keys.
    pub max_length: Option<usize>,
}

/// Array shaping applied after elements are sanitized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArrayOptions {
    /// Drop falsy elements: `null`, `false`, `0` and `""`.
    pub filter_null: bool,
    /// Drop repeated scalars, keeping the first occurrence.
    pub distinct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DebugOptions {
    pub enabled: bool,
    pub level: DebugLevel,
    pub log_skipped_routes: bool,
}

/// Key-by-key override of [`DebugOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialDebugOptions {
    pub enabled: Option<bool>,
    pub level: Option<DebugLevel>,
    pub log_skipped_routes: Option<bool>,
}

type CustomSanitizerFn = dyn Fn(Value, &SanitizeOptions) -> Value + Send + Sync;

/// Caller-supplied replacement for the built-in value sanitizer. It receives
/// a snapshot of the request section and the full options.
#[derive(Clone)]
pub struct CustomSanitizer(Arc<CustomSanitizerFn>);

impl CustomSanitizer {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value, &SanitizeOptions) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn apply(&self, value: Value, options: &SanitizeOptions) -> Value {
        (self.0)(value, options)
    }
}

impl fmt::Debug for CustomSanitizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomSanitizer(..)")
    }
}

/// Fully resolved, validated sanitizer options.
///
/// Built only through [`OptionResolver`], so list-like options are already
/// normalized into sets and the pattern list is compiled and non-empty.
/// Shared read-only across requests behind an `Arc`.
#[derive(Debug, Clone)]
pub struct SanitizeOptions {
    replace_with: String,
    remove_matches: bool,
    sanitize_objects: Vec<RequestSection>,
    mode: SanitizeMode,
    skip_routes: RouteFilter,
    custom_sanitizer: Option<CustomSanitizer>,
    recursive: bool,
    remove_empty: bool,
    patterns: PatternSet,
    allowed_keys: HashSet<String>,
    denied_keys: HashSet<String>,
    string_options: StringOptions,
    array_options: ArrayOptions,
    debug: DebugOptions,
    max_depth: usize,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            replace_with: String::new(),
            remove_matches: false,
            sanitize_objects: vec![RequestSection::Body, RequestSection::Query],
            mode: SanitizeMode::Auto,
            skip_routes: RouteFilter::default(),
            custom_sanitizer: None,
            recursive: true,
            remove_empty: false,
            patterns: PatternSet::default(),
            allowed_keys: HashSet::new(),
            denied_keys: HashSet::new(),
            string_options: StringOptions::default(),
            array_options: ArrayOptions::default(),
            debug: DebugOptions::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl SanitizeOptions {
    pub fn replace_with(&self) -> &str {
        &self.replace_with
    }

    pub fn remove_matches(&self) -> bool {
        self.remove_matches
    }

    pub fn sanitize_objects(&self) -> &[RequestSection] {
        &self.sanitize_objects
    }

    pub fn mode(&self) -> SanitizeMode {
        self.mode
    }

    pub fn skip_routes(&self) -> &RouteFilter {
        &self.skip_routes
    }

    pub fn custom_sanitizer(&self) -> Option<&CustomSanitizer> {
        self.custom_sanitizer.as_ref()
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }

    pub fn remove_empty(&self) -> bool {
        self.remove_empty
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    pub fn allowed_keys(&self) -> &HashSet<String> {
        &self.allowed_keys
    }

    pub fn denied_keys(&self) -> &HashSet<String> {
        &self.denied_keys
    }

    pub fn string_options(&self) -> &StringOptions {
        &self.string_options
    }

    pub fn array_options(&self) -> &ArrayOptions {
        &self.array_options
    }

    pub fn debug(&self) -> &DebugOptions {
        &self.debug
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

/// User-supplied options. Every field is optional; unset fields keep the
/// value of whatever options they are merged onto.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialOptions {
    pub replace_with: Option<String>,
    pub remove_matches: Option<bool>,
    pub sanitize_objects: Option<Vec<RequestSection>>,
    pub mode: Option<SanitizeMode>,
    pub skip_routes: Option<Vec<String>>,
    #[serde(skip)]
    pub custom_sanitizer: Option<CustomSanitizer>,
    pub recursive: Option<bool>,
    pub remove_empty: Option<bool>,
    pub patterns: Option<Vec<String>>,
    pub allowed_keys: Option<Vec<String>>,
    pub denied_keys: Option<Vec<String>>,
    pub string_options: Option<StringOptions>,
    pub array_options: Option<ArrayOptions>,
    pub debug: Option<PartialDebugOptions>,
    pub max_depth: Option<usize>,
}

impl PartialOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replace_with(mut self, replacement: impl Into<String>) -> Self {
        self.replace_with = Some(replacement.into());
        self
    }

    pub fn with_remove_matches(mut self, enabled: bool) -> Self {
        self.remove_matches = Some(enabled);
        self
    }

    pub fn with_sanitize_objects(mut self, sections: Vec<RequestSection>) -> Self {
        self.sanitize_objects = Some(sections);
        self
    }

    pub fn with_mode(mut self, mode: SanitizeMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_skip_routes<I, S>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_routes = Some(routes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_custom_sanitizer(mut self, sanitizer: CustomSanitizer) -> Self {
        self.custom_sanitizer = Some(sanitizer);
        self
    }

    pub fn with_recursive(mut self, enabled: bool) -> Self {
        self.recursive = Some(enabled);
        self
    }

    pub fn with_remove_empty(mut self, enabled: bool) -> Self {
        self.remove_empty = Some(enabled);
        self
    }

    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_allowed_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_denied_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denied_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_string_options(mut self, options: StringOptions) -> Self {
        self.string_options = Some(options);
        self
    }

    pub fn with_array_options(mut self, options: ArrayOptions) -> Self {
        self.array_options = Some(options);
        self
    }

    pub fn with_debug(mut self, options: PartialDebugOptions) -> Self {
        self.debug = Some(options);
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

type Predicate = fn(&Value) -> bool;

/// Top-level fields, checked in this order.
const FIELD_PREDICATES: &[(&str, Predicate)] = &[
    ("replaceWith", Value::is_string),
    ("removeMatches", Value::is_boolean),
    ("sanitizeObjects", is_section_list),
    ("mode", is_mode),
    ("skipRoutes", is_string_list),
    ("customSanitizer", Value::is_null),
    ("recursive", Value::is_boolean),
    ("removeEmpty", Value::is_boolean),
    ("patterns", is_pattern_list),
    ("allowedKeys", is_optional_string_list),
    ("deniedKeys", is_optional_string_list),
    ("stringOptions", Value::is_object),
    ("arrayOptions", Value::is_object),
    ("debug", Value::is_object),
    ("maxDepth", is_positive_integer),
];

const STRING_OPTION_PREDICATES: &[(&str, Predicate)] = &[
    ("trim", Value::is_boolean),
    ("lowercase", Value::is_boolean),
    ("maxLength", is_optional_length),
];

const ARRAY_OPTION_PREDICATES: &[(&str, Predicate)] = &[
    ("filterNull", Value::is_boolean),
    ("distinct", Value::is_boolean),
];

const DEBUG_OPTION_PREDICATES: &[(&str, Predicate)] = &[
    ("enabled", Value::is_boolean),
    ("level", is_debug_level),
    ("logSkippedRoutes", Value::is_boolean),
];

const NESTED_PREDICATES: &[(&str, &[(&str, Predicate)])] = &[
    ("stringOptions", STRING_OPTION_PREDICATES),
    ("arrayOptions", ARRAY_OPTION_PREDICATES),
    ("debug", DEBUG_OPTION_PREDICATES),
];

fn is_string_list(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|items| items.iter().all(Value::is_string))
}

fn is_pattern_list(value: &Value) -> bool {
    is_string_list(value) && value.as_array().is_some_and(|items| !items.is_empty())
}

fn is_optional_string_list(value: &Value) -> bool {
    value.is_null() || is_string_list(value)
}

fn is_section_list(value: &Value) -> bool {
    value.as_array().is_some_and(|items| {
        items
            .iter()
            .all(|item| item.as_str().and_then(RequestSection::parse).is_some())
    })
}

fn is_mode(value: &Value) -> bool {
    value.as_str().and_then(SanitizeMode::parse).is_some()
}

fn is_debug_level(value: &Value) -> bool {
    value.as_str().and_then(DebugLevel::parse).is_some()
}

fn is_positive_integer(value: &Value) -> bool {
    value.as_u64().is_some_and(|n| n > 0)
}

fn is_optional_length(value: &Value) -> bool {
    value.is_null() || value.as_u64().is_some()
}

/// Merges user options with defaults and validates the result.
pub struct OptionResolver;

impl OptionResolver {
    /// Resolve user options against the built-in defaults.
    pub fn resolve(partial: PartialOptions) -> Result<SanitizeOptions, SanitizeError> {
        Self::merge(&SanitizeOptions::default(), partial)
    }

    /// Resolve a raw JSON options document (e.g. loaded from a file).
    /// `null` resolves to the defaults.
    pub fn resolve_json(raw: &Value) -> Result<SanitizeOptions, SanitizeError> {
        if raw.is_null() {
            return Ok(SanitizeOptions::default());
        }
        Self::validate_json(raw)?;
        let partial: PartialOptions = serde_json::from_value(raw.clone())
            .map_err(|e| SanitizeError::configuration("options", e))?;
        Self::resolve(partial)
    }

    /// Overlay `partial` on already resolved options. Nested string and
    /// array options are replaced wholesale; debug options merge key by key.
    pub fn merge(
        base: &SanitizeOptions,
        partial: PartialOptions,
    ) -> Result<SanitizeOptions, SanitizeError> {
        let patterns = match partial.patterns {
            Some(patterns) => PatternSet::new(patterns)?,
            None => base.patterns.clone(),
        };

        let max_depth = partial.max_depth.unwrap_or(base.max_depth);
        if max_depth == 0 {
            return Err(SanitizeError::configuration("maxDepth", max_depth));
        }

        let skip_routes = match partial.skip_routes {
            Some(routes) => RouteFilter::new(routes),
            None => base.skip_routes.clone(),
        };

        let debug = match partial.debug {
            Some(overrides) => DebugOptions {
                enabled: overrides.enabled.unwrap_or(base.debug.enabled),
                level: overrides.level.unwrap_or(base.debug.level),
                log_skipped_routes: overrides
                    .log_skipped_routes
                    .unwrap_or(base.debug.log_skipped_routes),
            },
            None => base.debug,
        };

        Ok(SanitizeOptions {
            replace_with: partial
                .replace_with
                .unwrap_or_else(|| base.replace_with.clone()),
            remove_matches: partial.remove_matches.unwrap_or(base.remove_matches),
            sanitize_objects: partial
                .sanitize_objects
                .unwrap_or_else(|| base.sanitize_objects.clone()),
            mode: partial.mode.unwrap_or(base.mode),
            skip_routes,
            custom_sanitizer: partial
                .custom_sanitizer
                .or_else(|| base.custom_sanitizer.clone()),
            recursive: partial.recursive.unwrap_or(base.recursive),
            remove_empty: partial.remove_empty.unwrap_or(base.remove_empty),
            patterns,
            allowed_keys: partial
                .allowed_keys
                .map(|keys| keys.into_iter().collect())
                .unwrap_or_else(|| base.allowed_keys.clone()),
            denied_keys: partial
                .denied_keys
                .map(|keys| keys.into_iter().collect())
                .unwrap_or_else(|| base.denied_keys.clone()),
            string_options: partial.string_options.unwrap_or(base.string_options),
            array_options: partial.array_options.unwrap_or(base.array_options),
            debug,
            max_depth,
        })
    }

    /// Check a raw options document against the predicate tables. The
    /// first failing field is reported.
    pub fn validate_json(raw: &Value) -> Result<(), SanitizeError> {
        let Some(fields) = raw.as_object() else {
            return Err(SanitizeError::configuration("options", raw));
        };

        for (field, predicate) in FIELD_PREDICATES {
            if let Some(value) = fields.get(*field) {
                if !predicate(value) {
                    return Err(SanitizeError::configuration(*field, value));
                }
            }
        }

        for (parent, predicates) in NESTED_PREDICATES {
            let Some(nested) = fields.get(*parent).and_then(Value::as_object) else {
                continue;
            };
            for (field, predicate) in *predicates {
                if let Some(value) = nested.get(*field) {
                    if !predicate(value) {
                        return Err(SanitizeError::configuration(
                            format!("{parent}.{field}"),
                            value,
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}
