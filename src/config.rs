use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::git::GitCacheConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub git: GitCacheConfig,
    #[serde(default)]
    pub assets: AssetConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Longest a single request may run before it is answered with 408.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Verbose logging and per-request tracing.
    #[serde(default)]
    pub development: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory whose child directories are the hosted repositories.
    #[serde(default = "default_repos_root")]
    pub repos_root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Resource guard rules appended after the stock web-asset rules.
    #[serde(default = "default_extra_patterns")]
    pub extra_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Let visitors without a login use the repository and picker APIs.
    #[serde(default)]
    pub allow_anonymous: bool,
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,
    #[serde(default)]
    pub accounts: Vec<Account>,
}

/// A login. `password_hash` holds an argon2 PHC string and takes precedence
/// over a plain `password`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_request_timeout_secs() -> u64 {
    600
}

fn default_repos_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_extra_patterns() -> Vec<String> {
    ["+*.woff", "+*.eot", "+*.svg", "+*.ttf"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_session_timeout_secs() -> u64 {
    30 * 60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
            development: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            repos_root: default_repos_root(),
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            extra_patterns: default_extra_patterns(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            allow_anonymous: false,
            session_timeout_secs: default_session_timeout_secs(),
            accounts: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl AuthConfig {
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }
}

impl Config {
    /// Load from a TOML file; without a path every setting takes its default.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}
