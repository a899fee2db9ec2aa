//! Client config and session resolution for one CLI invocation.
//!
//! Precedence, lowest first: config file, `NOTEHUB_*` environment, flags.

use std::path::{Path, PathBuf};

use notehub_core::config::{normalize_base_url, ENV_API_BASE_URL};
use notehub_core::util::normalize_text_option;
use notehub_core::{ClientConfig, SessionContext};

use crate::error::CliError;

const CONFIG_FILE_NAME: &str = "config.json";

pub const ENV_EMAIL: &str = "NOTEHUB_EMAIL";
pub const ENV_ID_TOKEN: &str = "NOTEHUB_ID_TOKEN";

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("notehub").join(CONFIG_FILE_NAME))
}

pub fn resolve_client_config(
    explicit_path: Option<&Path>,
    api_url: Option<&str>,
) -> Result<ClientConfig, CliError> {
    let config_path = explicit_path
        .map(Path::to_path_buf)
        .or_else(default_config_path);
    let api_url = normalize_text_option(api_url.map(str::to_string));

    let from_file = match (&config_path, explicit_path) {
        (Some(path), Some(_)) => Some(ClientConfig::load_from_path(path)?),
        (Some(path), None) if path.exists() => Some(ClientConfig::load_from_path(path)?),
        _ => None,
    };

    let mut config = match (from_file, &api_url) {
        (Some(config), _) => config,
        (None, Some(url)) => ClientConfig::new(url.as_str())?,
        (None, None) => ClientConfig::from_env().map_err(|_| {
            let hint = config_path.as_ref().map_or_else(String::new, |path| {
                format!(", or create {}", path.display())
            });
            CliError::Config(format!(
                "No API base URL configured. Pass --api-url, set {ENV_API_BASE_URL}{hint}"
            ))
        })?,
    };
    config.apply_env_overrides()?;

    if let Some(url) = api_url {
        config.api_base_url = normalize_base_url(&url)?;
    }
    tracing::debug!("Using note service at {}", config.api_base_url);
    Ok(config)
}

pub fn resolve_session(
    email: Option<String>,
    token: Option<String>,
) -> Result<SessionContext, CliError> {
    resolve_session_with(email, token, |key| std::env::var(key).ok())
}

pub fn resolve_session_with(
    email: Option<String>,
    token: Option<String>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SessionContext, CliError> {
    let email = normalize_text_option(email).or_else(|| normalize_text_option(lookup(ENV_EMAIL)));
    let token =
        normalize_text_option(token).or_else(|| normalize_text_option(lookup(ENV_ID_TOKEN)));

    match (email, token) {
        (Some(email), Some(token)) => {
            let session = SessionContext::from_id_token(email, token);
            if session.is_expired() {
                tracing::warn!("Id token has expired; requests will be rejected");
            }
            Ok(session)
        }
        _ => Err(CliError::MissingSession),
    }
}
