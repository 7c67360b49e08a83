use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::api::middleware::mongo_sanitize::DEFAULT_BODY_LIMIT;
use crate::domain::{OptionResolver, PartialOptions, SanitizeError, SanitizeOptions};

/// Errors raised while loading sanitizer options from disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported options file format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error(transparent)]
    Options(#[from] SanitizeError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    /// Optional options file (.json, .toml, .yaml, .yml)
    pub sanitize_config: Option<PathBuf>,
    pub log_level: String,
    pub body_limit_bytes: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            sanitize_config: std::env::var("SANITIZE_CONFIG")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            body_limit_bytes: std::env::var("BODY_LIMIT_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_BODY_LIMIT),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.is_empty() {
            return Err("LISTEN_ADDR cannot be empty".to_string());
        }

        if self.body_limit_bytes == 0 {
            return Err("BODY_LIMIT_BYTES must be greater than 0".to_string());
        }

        if let Some(path) = &self.sanitize_config {
            if OptionsFormat::from_path(path).is_none() {
                return Err(format!(
                    "SANITIZE_CONFIG must be a .json, .toml, .yaml or .yml file, got {}",
                    path.display()
                ));
            }
        }

        Ok(())
    }

    /// Resolve the sanitizer options for the server. Without an options
    /// file the defaults apply, with `/health` skipped.
    pub fn load_options(&self) -> Result<SanitizeOptions, ConfigError> {
        match &self.sanitize_config {
            Some(path) => load_options_file(path),
            None => Ok(OptionResolver::resolve(
                PartialOptions::new().with_skip_routes(["/health"]),
            )?),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionsFormat {
    Json,
    Toml,
    Yaml,
}

impl OptionsFormat {
    fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Read an options document into its JSON form without validating it.
pub fn read_options_document(path: &Path) -> Result<Value, ConfigError> {
    let format = OptionsFormat::from_path(path)
        .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;

    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let parse_error = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    match format {
        OptionsFormat::Json => serde_json::from_str(&text).map_err(|e| parse_error(e.to_string())),
        OptionsFormat::Toml => toml::from_str(&text).map_err(|e| parse_error(e.to_string())),
        OptionsFormat::Yaml => serde_yaml::from_str(&text).map_err(|e| parse_error(e.to_string())),
    }
}

/// Load, validate and resolve an options file.
pub fn load_options_file(path: &Path) -> Result<SanitizeOptions, ConfigError> {
    let raw = read_options_document(path)?;
    let options = OptionResolver::resolve_json(&raw)?;
    tracing::debug!(path = %path.display(), "Sanitizer options loaded");
    Ok(options)
}
