/// `load_config` module: resolves the server URL and API key the client needs.
///
/// Values come from a `KEY=VALUE` file (default `$HOME/.rspace`) and from the
/// environment; an environment variable always wins over the file.
///
/// # Keys
/// - `RSPACE_URL`: API base URL, e.g. `https://myrspace.example.com/api/v1`
/// - `RSPACE_API_KEY`: the user's API key
///
/// # Errors
/// A config file passed explicitly must exist. The default file may be
/// absent as long as both keys are in the environment. Missing keys are an
/// error naming the key and the file that was consulted.
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const URL_KEY: &str = "RSPACE_URL";
pub const API_KEY_KEY: &str = "RSPACE_API_KEY";
pub const DEFAULT_CONFIG_FILE: &str = ".rspace";

/// Connection settings for [`crate::client::RsWebClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
}

/// `$HOME/.rspace`, or `None` when the home directory is unknown.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DEFAULT_CONFIG_FILE))
}

fn read_config_file(path: &Path) -> Result<HashMap<String, String>> {
    let iter = dotenvy::from_path_iter(path).map_err(|e| {
        error!(error = %e, config_path = ?path, "Failed to read config file");
        anyhow!("Failed to read config file {}: {e}", path.display())
    })?;
    let mut values = HashMap::new();
    for item in iter {
        let (key, value) =
            item.with_context(|| format!("Failed to parse config file {}", path.display()))?;
        values.insert(key, value);
    }
    info!(config_path = ?path, keys = values.len(), "Config file read successfully");
    Ok(values)
}

fn lookup(key: &str, file: &HashMap<String, String>) -> Option<String> {
    std::env::var(key)
        .ok()
        .or_else(|| file.get(key).cloned())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Loads the client configuration from `path` (or the default file) and the
/// environment.
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig> {
    let (path, explicit) = match path {
        Some(p) => (Some(p.to_path_buf()), true),
        None => (default_config_path(), false),
    };
    info!(config_path = ?path, explicit, "Loading configuration");

    let file_values = match &path {
        Some(p) if p.exists() => read_config_file(p)?,
        Some(p) if explicit => {
            error!(config_path = ?p, "Config file does not exist");
            return Err(anyhow!("Config file {} does not exist", p.display()));
        }
        _ => HashMap::new(),
    };

    let source = path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "the environment".to_string());
    let base_url = lookup(URL_KEY, &file_values)
        .ok_or_else(|| anyhow!("{URL_KEY} is not set in {source} or the environment"))?;
    let api_key = lookup(API_KEY_KEY, &file_values)
        .ok_or_else(|| anyhow!("{API_KEY_KEY} is not set in {source} or the environment"))?;

    info!(base_url = %base_url, "Configuration loaded");
    Ok(ClientConfig { base_url, api_key })
}
