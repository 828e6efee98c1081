use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {0}: {1}")]
    Read(String, std::io::Error),
    #[error("Failed to parse config {0}: {1}")]
    Parse(String, toml::de::Error),
    #[error("Failed to write config {0}: {1}")]
    Write(String, String),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub hashing: HashingConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub rpc: RpcConfig,
}

/// Document store location. `path` plays the role of the backend address,
/// `namespace` separates collections sharing one store.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_flush_every_ms")]
    pub flush_every_ms: Option<u64>,
}

/// Argon2id cost parameters
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct HashingConfig {
    pub memory_cost_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AuthConfig {
    /// Report unknown accounts on login paths as `Unauthorized`
    #[serde(default)]
    pub opaque_login_failures: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RpcConfig {
    #[serde(default = "default_bind_host")]
    pub bind_host: String,
    #[serde(default = "default_rpc_port")]
    pub port: u16,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_store_path() -> String {
    "./data/users".to_string()
}

fn default_namespace() -> String {
    "users".to_string()
}

fn default_flush_every_ms() -> Option<u64> {
    Some(500)
}

fn default_bind_host() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    9100
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            store: StoreConfig::default(),
            hashing: HashingConfig::default(),
            auth: AuthConfig::default(),
            rpc: RpcConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            namespace: default_namespace(),
            flush_every_ms: default_flush_every_ms(),
        }
    }
}

impl Default for HashingConfig {
    fn default() -> Self {
        // argon2 crate defaults (OWASP minimum for Argon2id)
        Self {
            memory_cost_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            bind_host: default_bind_host(),
            port: default_rpc_port(),
        }
    }
}

impl RpcConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

impl ServiceConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_string(), e))?;
        toml::from_str(&s).map_err(|e| ConfigError::Parse(path.to_string(), e))
    }

    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let s = toml::to_string_pretty(self).map_err(|e| ConfigError::Write(path.to_string(), e.to_string()))?;
        std::fs::write(path, s).map_err(|e| ConfigError::Write(path.to_string(), e.to_string()))
    }

    /// Turn an earlier `load` result into the config to run with. A file
    /// that exists but does not parse is an error; only a missing file falls
    /// back to (and writes) the defaults.
    pub fn resolve(loaded: Result<Self, ConfigError>, path: &str) -> Result<Self, ConfigError> {
        match loaded {
            Ok(config) => Ok(config),
            Err(e @ ConfigError::Parse(..)) => Err(e),
            Err(_) => Ok(Self::load_or_default(path)),
        }
    }

    pub fn load_or_default(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            match Self::load(path) {
                Ok(c) => {
                    info!("Config loaded from {}", path);
                    c
                }
                Err(e) => {
                    warn!("{}. Using defaults.", e);
                    Self::default()
                }
            }
        } else {
            info!("Config file not found at '{}'. Creating default.", path);
            let config = Self::default();
            if let Err(e) = config.save(path) {
                warn!("{}", e);
            }
            config
        }
    }
}
