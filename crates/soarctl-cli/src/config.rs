use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ProfileConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
}

pub type ConfigFile = HashMap<String, ProfileConfig>;

fn config_dir() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".soarctl");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn load_all() -> Result<ConfigFile> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(&path)?;
    let cfg: ConfigFile = toml::from_str(&content)?;
    Ok(cfg)
}

pub fn load_profile(profile: &str) -> Result<ProfileConfig> {
    let all = load_all()?;
    Ok(all
        .into_iter()
        .find(|(k, _)| k == profile)
        .map(|(_, v)| v)
        .unwrap_or_default())
}

pub fn save_profile(profile: &str, config: &ProfileConfig) -> Result<()> {
    let mut all = load_all()?;
    all.insert(
        profile.to_string(),
        ProfileConfig {
            url: config.url.clone(),
            api_key: config.api_key.clone(),
        },
    );
    let content = toml::to_string_pretty(&all)?;
    fs::write(config_path()?, content)?;
    Ok(())
}

/// Resolved connection settings: flags and env first, then the manifest's
/// connection section, then the profile.
pub struct Connection {
    pub url: String,
    pub api_key: String,
}

pub fn resolve_connection(
    cli_url: &Option<String>,
    cli_api_key: &Option<String>,
    manifest_url: Option<&str>,
    manifest_api_key: Option<&str>,
    profile: &str,
) -> Result<Connection> {
    let cfg = load_profile(profile)?;

    let url = cli_url
        .clone()
        .or_else(|| manifest_url.map(str::to_string))
        .or(cfg.url);
    let Some(url) = url else {
        anyhow::bail!(
            "No server URL configured. Use --url, set SOARCTL_URL, or run: soarctl config set url <url>"
        );
    };

    let api_key = cli_api_key
        .clone()
        .or_else(|| manifest_api_key.map(str::to_string))
        .or(cfg.api_key);
    let Some(api_key) = api_key else {
        anyhow::bail!(
            "No API key configured. Use --api-key, set SOARCTL_API_KEY, or run: soarctl config set api_key <key>"
        );
    };

    Ok(Connection { url, api_key })
}
