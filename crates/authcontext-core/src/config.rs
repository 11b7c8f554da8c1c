//! Application configuration management.
//!
//! This module handles loading and saving the configuration, which includes
//! the API base URL, post-login route, restore failure policy, token storage
//! backend and the last email used to sign in.
//!
//! Configuration is stored at `~/.config/authcontext/config.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{FileCookieJar, KeyringTokenStore, RestoreFailurePolicy, SessionOptions, TokenStore};
use crate::navigation::DEFAULT_POST_LOGIN_ROUTE;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "authcontext";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "AUTHCONTEXT_API_URL";

/// Backend used when neither config nor environment name one
pub const DEFAULT_API_URL: &str = "http://localhost:3333";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not find {0} directory")]
    MissingDirectory(&'static str),

    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where session tokens are kept between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenBackend {
    /// `cookies.json` in the cache directory
    #[default]
    File,
    /// OS keychain
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub post_login_route: Option<String>,
    pub restore_failure_policy: RestoreFailurePolicy,
    pub token_backend: TokenBackend,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::MissingDirectory("config"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf, ConfigError> {
        let cache_dir = dirs::cache_dir().ok_or(ConfigError::MissingDirectory("cache"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Base URL of the auth API: environment, then config, then default
    pub fn api_base_url(&self) -> String {
        std::env::var(API_URL_ENV)
            .ok()
            .filter(|url| !url.is_empty())
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            post_login_route: self
                .post_login_route
                .clone()
                .unwrap_or_else(|| DEFAULT_POST_LOGIN_ROUTE.to_string()),
            restore_failure_policy: self.restore_failure_policy,
            ..SessionOptions::default()
        }
    }

    /// Open the configured token storage backend
    pub fn token_store(&self) -> Result<Arc<dyn TokenStore>, ConfigError> {
        Ok(match self.token_backend {
            TokenBackend::File => Arc::new(FileCookieJar::new(self.cache_dir()?)),
            TokenBackend::Keyring => Arc::new(KeyringTokenStore::new()),
        })
    }
}
