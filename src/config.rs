//! Environment configuration.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use credential_store::credential_path;
use taskdeck_api::{ApiConfig, DEFAULT_API_BASE_URL};

use crate::error::ConfigError;
use crate::logging::DEFAULT_LOG_FILTER;

pub const API_URL_KEY: &str = "TASKDECK_API_URL";
pub const TIMEOUT_SECS_KEY: &str = "TASKDECK_TIMEOUT_SECS";
pub const CREDENTIAL_PATH_KEY: &str = "TASKDECK_CREDENTIAL_PATH";
pub const LOG_FILTER_KEY: &str = "TASKDECK_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive string.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_owned(),
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            filter: env_string_opt(LOG_FILTER_KEY).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub credential_path: PathBuf,
    pub logging: LoggingConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            credential_path: default_credential_path(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Blank variables count as unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut api = ApiConfig::new(
            env_string_opt(API_URL_KEY).unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned()),
        );
        if let Some(timeout) = env_timeout(TIMEOUT_SECS_KEY)? {
            api = api.with_timeout(timeout);
        }

        Ok(Self {
            api,
            credential_path: env_string_opt(CREDENTIAL_PATH_KEY)
                .map(PathBuf::from)
                .unwrap_or_else(default_credential_path),
            logging: LoggingConfig::from_env(),
        })
    }

    pub fn with_credential_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credential_path = path.into();
        self
    }

    pub fn with_api(mut self, api: ApiConfig) -> Self {
        self.api = api;
        self
    }
}

/// `<platform data dir>/taskdeck/credentials.json`, or relative to the working
/// directory when the platform reports no data dir.
pub fn default_credential_path() -> PathBuf {
    match dirs::data_dir() {
        Some(root) => credential_path(&root),
        None => credential_path(Path::new(".")),
    }
}

fn env_timeout(key: &'static str) -> Result<Option<Duration>, ConfigError> {
    let Some(raw) = env_string_opt(key) else {
        return Ok(None);
    };
    let seconds = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidTimeout {
            key,
            value: raw.clone(),
        })?;
    if seconds == 0 {
        return Err(ConfigError::InvalidTimeout { key, value: raw });
    }
    Ok(Some(Duration::from_secs(seconds)))
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{
        default_credential_path, ClientConfig, LoggingConfig, API_URL_KEY, CREDENTIAL_PATH_KEY,
        LOG_FILTER_KEY, TIMEOUT_SECS_KEY,
    };
    use crate::error::ConfigError;
    use std::env;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;
    use taskdeck_api::DEFAULT_API_BASE_URL;

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    #[test]
    fn env_defaults_apply_when_unset() {
        let _lock = env_lock();
        let _g1 = set_env_guard(API_URL_KEY, None);
        let _g2 = set_env_guard(TIMEOUT_SECS_KEY, None);
        let _g3 = set_env_guard(CREDENTIAL_PATH_KEY, None);
        let _g4 = set_env_guard(LOG_FILTER_KEY, None);

        let config = ClientConfig::from_env().expect("config");
        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.api.timeout, None);
        assert_eq!(config.credential_path, default_credential_path());
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn env_values_override_defaults() {
        let _lock = env_lock();
        let _g1 = set_env_guard(API_URL_KEY, Some("https://tasks.example.com/api/v1"));
        let _g2 = set_env_guard(TIMEOUT_SECS_KEY, Some("30"));
        let _g3 = set_env_guard(CREDENTIAL_PATH_KEY, Some("/tmp/taskdeck/creds.json"));
        let _g4 = set_env_guard(LOG_FILTER_KEY, Some("taskdeck=debug"));

        let config = ClientConfig::from_env().expect("config");
        assert_eq!(config.api.base_url, "https://tasks.example.com/api/v1");
        assert_eq!(config.api.timeout, Some(Duration::from_secs(30)));
        assert_eq!(
            config.credential_path,
            PathBuf::from("/tmp/taskdeck/creds.json")
        );
        assert_eq!(config.logging.filter, "taskdeck=debug");
    }

    #[test]
    fn blank_values_are_ignored() {
        let _lock = env_lock();
        let _g1 = set_env_guard(API_URL_KEY, Some("  "));
        let _g2 = set_env_guard(TIMEOUT_SECS_KEY, Some(""));
        let _g3 = set_env_guard(CREDENTIAL_PATH_KEY, Some(""));
        let _g4 = set_env_guard(LOG_FILTER_KEY, Some(" "));

        let config = ClientConfig::from_env().expect("config");
        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.api.timeout, None);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn malformed_timeout_is_rejected() {
        let _lock = env_lock();
        let _g1 = set_env_guard(TIMEOUT_SECS_KEY, Some("soon"));

        let error = ClientConfig::from_env().expect_err("bad timeout");
        assert_eq!(
            error,
            ConfigError::InvalidTimeout {
                key: TIMEOUT_SECS_KEY,
                value: "soon".to_owned(),
            }
        );

        let _g2 = set_env_guard(TIMEOUT_SECS_KEY, Some("0"));
        assert!(ClientConfig::from_env().is_err());
    }

    #[test]
    fn default_credential_path_ends_in_taskdeck_dir() {
        let path = default_credential_path();
        assert!(path.ends_with("taskdeck/credentials.json"));
    }
}
