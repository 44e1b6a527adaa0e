//! Configuration file management for DealScout.
//!
//! Endpoints live in `~/.config/dealscout/config.toml`, API keys in
//! `~/.config/dealscout/secret.json`. Every value falls back to an
//! environment variable when the files do not provide it.

use std::env;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use dealscout_core::error::{Result, ScoutError};

const ENV_IDENTITY_URL: &str = "DEALSCOUT_IDENTITY_URL";
const ENV_IDENTITY_ANON_KEY: &str = "DEALSCOUT_IDENTITY_ANON_KEY";
const ENV_GENERATIVE_URL: &str = "DEALSCOUT_GENERATIVE_URL";
const ENV_GENERATIVE_API_KEY: &str = "DEALSCOUT_GENERATIVE_API_KEY";

/// Locations of the DealScout configuration files.
#[derive(Debug, Clone)]
pub struct ScoutPaths {
    base: PathBuf,
}

impl ScoutPaths {
    /// Uses `base_override` when given, `~/.config/dealscout` otherwise.
    pub fn new(base_override: Option<PathBuf>) -> Result<Self> {
        let base = match base_override {
            Some(base) => base,
            None => dirs::home_dir()
                .ok_or_else(|| ScoutError::config("could not determine home directory"))?
                .join(".config")
                .join("dealscout"),
        };
        Ok(Self { base })
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join("config.toml")
    }

    pub fn secret_file(&self) -> PathBuf {
        self.base.join("secret.json")
    }
}

/// Root structure for config.toml
#[derive(Debug, Clone, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    endpoints: Endpoints,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct Endpoints {
    #[serde(default)]
    identity_url: Option<String>,
    #[serde(default)]
    generative_url: Option<String>,
}

/// Root structure for secret.json
#[derive(Debug, Clone, Deserialize, Default)]
struct SecretConfig {
    #[serde(default)]
    identity: Option<IdentitySecret>,
    #[serde(default)]
    generative: Option<GenerativeSecret>,
}

#[derive(Debug, Clone, Deserialize)]
struct IdentitySecret {
    anon_key: String,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerativeSecret {
    api_key: String,
}

/// Resolved identity-provider settings.
#[derive(Debug, Clone)]
pub struct IdentitySettings {
    pub url: String,
    pub anon_key: String,
}

/// Resolved generative-service settings.
#[derive(Debug, Clone)]
pub struct GenerativeSettings {
    pub url: String,
    pub api_key: String,
}

/// Everything the HTTP clients need.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub identity: IdentitySettings,
    pub generative: GenerativeSettings,
}

/// Loads client settings from the config files, falling back to
/// environment variables per value.
pub fn load_settings(paths: &ScoutPaths) -> Result<ClientSettings> {
    let file_config = load_file_config(paths)?;
    let secret_config = load_secret_config(paths)?;

    let identity_url = resolve(
        file_config.endpoints.identity_url.clone(),
        ENV_IDENTITY_URL,
        "identity endpoint",
    )?;
    let anon_key = resolve(
        secret_config.identity.as_ref().map(|s| s.anon_key.clone()),
        ENV_IDENTITY_ANON_KEY,
        "identity anon key",
    )?;
    let generative_url = resolve(
        file_config.endpoints.generative_url.clone(),
        ENV_GENERATIVE_URL,
        "generative endpoint",
    )?;
    let api_key = resolve(
        secret_config.generative.as_ref().map(|s| s.api_key.clone()),
        ENV_GENERATIVE_API_KEY,
        "generative API key",
    )?;

    Ok(ClientSettings {
        identity: IdentitySettings {
            url: identity_url,
            anon_key,
        },
        generative: GenerativeSettings {
            url: generative_url,
            api_key,
        },
    })
}

fn resolve(from_file: Option<String>, env_var: &str, what: &str) -> Result<String> {
    if let Some(value) = from_file.filter(|v| !v.is_empty()) {
        return Ok(value);
    }
    env::var(env_var).map_err(|_| {
        ScoutError::config(format!(
            "{what} not found in configuration files or {env_var}"
        ))
    })
}

fn load_file_config(paths: &ScoutPaths) -> Result<FileConfig> {
    let path = paths.config_file();
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let content = fs::read_to_string(&path)?;
    Ok(toml::from_str(&content)?)
}

fn load_secret_config(paths: &ScoutPaths) -> Result<SecretConfig> {
    let path = paths.secret_file();
    if !path.exists() {
        return Ok(SecretConfig::default());
    }
    let content = fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&content)?)
}
