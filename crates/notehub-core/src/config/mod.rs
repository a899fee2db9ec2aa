//! Client configuration.
//!
//! `ClientConfig` carries the note service endpoint and the tunables of the
//! sync core. It can be loaded from a JSON file, from environment variables,
//! or built directly.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_AUTOSAVE_QUIET_MS: u64 = 500;

pub const ENV_API_BASE_URL: &str = "NOTEHUB_API_BASE_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "NOTEHUB_REQUEST_TIMEOUT_SECS";
pub const ENV_AUTOSAVE_QUIET_MS: &str = "NOTEHUB_AUTOSAVE_QUIET_MS";
pub const ENV_AUTH_HEADER: &str = "NOTEHUB_AUTH_HEADER";

/// How the credential is placed in the `Authorization` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthHeaderStyle {
    /// `Authorization: Bearer <token>`
    Bearer,
    /// `Authorization: <token>`, as the note service's JWT authorizer expects
    #[default]
    Raw,
}

impl std::str::FromStr for AuthHeaderStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bearer" => Ok(Self::Bearer),
            "raw" => Ok(Self::Raw),
            other => Err(Error::Config(format!(
                "auth header style must be 'bearer' or 'raw', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_autosave_quiet_ms")]
    pub autosave_quiet_ms: u64,
    #[serde(default)]
    pub auth_header: AuthHeaderStyle,
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

const fn default_autosave_quiet_ms() -> u64 {
    DEFAULT_AUTOSAVE_QUIET_MS
}

impl ClientConfig {
    /// Config for the given base URL with default tunables.
    pub fn new(api_base_url: impl Into<String>) -> Result<Self> {
        let config = Self {
            api_base_url: api_base_url.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            autosave_quiet_ms: DEFAULT_AUTOSAVE_QUIET_MS,
            auth_header: AuthHeaderStyle::default(),
        };
        config.validated()
    }

    /// Reads a JSON config file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|error| {
            Error::Config(format!(
                "Failed to read config at {}: {}",
                path.display(),
                error
            ))
        })?;
        Self::parse(&raw)
    }

    /// Parses a JSON payload.
    pub fn parse(payload: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(payload)
            .map_err(|error| Error::Config(format!("invalid config JSON: {error}")))?;
        config.validated()
    }

    /// Builds a config from `NOTEHUB_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let base_url = normalize_text_option(std::env::var(ENV_API_BASE_URL).ok())
            .ok_or_else(|| Error::Config(format!("{ENV_API_BASE_URL} is not set")))?;
        let mut config = Self::new(base_url)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Overrides tunables with any `NOTEHUB_*` variables that are set.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| normalize_text_option(std::env::var(key).ok()))
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_API_BASE_URL) {
            self.api_base_url = url;
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            self.request_timeout_secs = parse_number(&raw, ENV_REQUEST_TIMEOUT_SECS)?;
        }
        if let Some(raw) = lookup(ENV_AUTOSAVE_QUIET_MS) {
            self.autosave_quiet_ms = parse_number(&raw, ENV_AUTOSAVE_QUIET_MS)?;
        }
        if let Some(raw) = lookup(ENV_AUTH_HEADER) {
            self.auth_header = raw.parse()?;
        }
        *self = self.clone().validated()?;
        Ok(())
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub const fn autosave_quiet_window(&self) -> Duration {
        Duration::from_millis(self.autosave_quiet_ms)
    }

    fn validated(mut self) -> Result<Self> {
        self.api_base_url = normalize_base_url(&self.api_base_url)?;
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }
}

pub fn normalize_base_url(raw: &str) -> Result<String> {
    let base = raw.trim().trim_end_matches('/').to_string();
    if base.is_empty() {
        return Err(Error::Config("API base URL must not be empty".to_string()));
    }
    if !is_http_url(&base) {
        return Err(Error::Config(
            "API base URL must include http:// or https://".to_string(),
        ));
    }
    Ok(base)
}

fn parse_number(raw: &str, field: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|error| Error::Config(format!("{field} must be a whole number: {error}")))
}
