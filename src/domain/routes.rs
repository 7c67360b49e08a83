//! Path canonicalization for the skip-route check.

use std::collections::HashSet;

/// Canonical form of a request path: query and fragment removed, no
/// trailing slash, exactly one leading slash. Empty paths become `/`.
pub fn normalize_path(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = path[..end].trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Exact-match lookup of canonical paths. No prefix or wildcard matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteFilter {
    skip: HashSet<String>,
}

impl RouteFilter {
    pub fn new<I, S>(routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            skip: routes
                .into_iter()
                .map(|route| normalize_path(route.as_ref()))
                .collect(),
        }
    }

    pub fn should_skip(&self, path: &str) -> bool {
        !self.skip.is_empty() && self.skip.contains(&normalize_path(path))
    }

    pub fn routes(&self) -> &HashSet<String> {
        &self.skip
    }
}
