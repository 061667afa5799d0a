//! Application configuration management.
//!
//! Configuration comes from the environment (optionally seeded from a `.env`
//! file by the binary) with a default for every value, so a fresh install
//! runs against the development backend without any setup.
//!
//! Durable storage lives at `<data dir>/racha/` unless `RACHA_DATA_DIR`
//! points elsewhere.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tracing::warn;

/// Application name used for data directory paths
const APP_NAME: &str = "racha";

/// Backend origin used when `RACHA_BACKEND_URL` is unset.
pub const DEFAULT_BACKEND_URL: &str = "http://10.0.0.111:8080";

/// Storage key for the bearer token.
pub const DEFAULT_TOKEN_KEY: &str = "racha_access_token";

/// Storage key for the token expiry marker (epoch milliseconds).
pub const DEFAULT_EXPIRES_AT_KEY: &str = "racha_access_token_expires_at";

/// Storage key for the last group the user opened.
pub const LAST_GROUP_KEY: &str = "lastSessionGroupId";

/// How often the session checks whether its token has expired.
const DEFAULT_EXPIRY_CHECK_SECS: u64 = 60;

const ENV_BACKEND_URL: &str = "RACHA_BACKEND_URL";
const ENV_TOKEN_KEY: &str = "RACHA_JWT_NAME";
const ENV_EXPIRES_AT_KEY: &str = "RACHA_JWT_EXPIRES_AT_NAME";
const ENV_EXPIRY_CHECK_SECS: &str = "RACHA_EXPIRY_CHECK_SECS";
const ENV_STORAGE: &str = "RACHA_STORAGE";
const ENV_DATA_DIR: &str = "RACHA_DATA_DIR";

/// Which durable storage backend holds the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// JSON file in the data directory
    #[default]
    File,
    /// OS keychain
    Keyring,
    /// In-process only; nothing survives a restart
    Memory,
}

impl StorageBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Some(StorageBackend::File),
            "keyring" | "keychain" => Some(StorageBackend::Keyring),
            "memory" => Some(StorageBackend::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: String,
    pub token_key: String,
    pub expires_at_key: String,
    pub last_group_key: String,
    pub expiry_check_interval: Duration,
    pub storage_backend: StorageBackend,
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            expires_at_key: DEFAULT_EXPIRES_AT_KEY.to_string(),
            last_group_key: LAST_GROUP_KEY.to_string(),
            expiry_check_interval: Duration::from_secs(DEFAULT_EXPIRY_CHECK_SECS),
            storage_backend: StorageBackend::default(),
            data_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let expiry_check_interval = match get(ENV_EXPIRY_CHECK_SECS) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    warn!(value = %raw, "Invalid {}, using default", ENV_EXPIRY_CHECK_SECS);
                    defaults.expiry_check_interval
                }
            },
            None => defaults.expiry_check_interval,
        };

        let storage_backend = match get(ENV_STORAGE) {
            Some(raw) => StorageBackend::parse(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "Unknown {}, using file storage", ENV_STORAGE);
                StorageBackend::File
            }),
            None => defaults.storage_backend,
        };

        Self {
            backend_url: get(ENV_BACKEND_URL).unwrap_or(defaults.backend_url),
            token_key: get(ENV_TOKEN_KEY).unwrap_or(defaults.token_key),
            expires_at_key: get(ENV_EXPIRES_AT_KEY).unwrap_or(defaults.expires_at_key),
            last_group_key: defaults.last_group_key,
            expiry_check_interval,
            storage_backend,
            data_dir: get(ENV_DATA_DIR).map(PathBuf::from),
        }
    }

    /// Directory holding durable storage and logs
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.token_key, "racha_access_token");
        assert_eq!(config.expires_at_key, "racha_access_token_expires_at");
        assert_eq!(config.last_group_key, "lastSessionGroupId");
        assert_eq!(config.expiry_check_interval, Duration::from_secs(60));
        assert_eq!(config.storage_backend, StorageBackend::File);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_environment_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("RACHA_BACKEND_URL", "https://api.racha.app"),
            ("RACHA_JWT_NAME", "tok"),
            ("RACHA_JWT_EXPIRES_AT_NAME", "tok_exp"),
            ("RACHA_EXPIRY_CHECK_SECS", "5"),
            ("RACHA_STORAGE", "Keyring"),
            ("RACHA_DATA_DIR", "/tmp/racha-test"),
        ]));
        assert_eq!(config.backend_url, "https://api.racha.app");
        assert_eq!(config.token_key, "tok");
        assert_eq!(config.expires_at_key, "tok_exp");
        assert_eq!(config.expiry_check_interval, Duration::from_secs(5));
        assert_eq!(config.storage_backend, StorageBackend::Keyring);
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/racha-test"));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = Config::from_lookup(lookup(&[
            ("RACHA_EXPIRY_CHECK_SECS", "soon"),
            ("RACHA_STORAGE", "floppy"),
            ("RACHA_BACKEND_URL", "   "),
        ]));
        assert_eq!(config.expiry_check_interval, Duration::from_secs(60));
        assert_eq!(config.storage_backend, StorageBackend::File);
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = Config::from_lookup(lookup(&[("RACHA_EXPIRY_CHECK_SECS", "0")]));
        assert_eq!(config.expiry_check_interval, Duration::from_secs(60));
    }
}
