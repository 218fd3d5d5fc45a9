//! Runtime configuration loaded from `eventpilot.toml`.
//!
//! [`Config`] holds every tunable. Keys missing from the file use defaults.
//! Environment variables (after `.env` is loaded) take precedence over the
//! file: `COMPOSIO_API_KEY` for the key and `EVENTPILOT_*` for everything else.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::backoff::RetryPolicy;
use crate::error::EventPilotError;
use crate::gateway::client::DEFAULT_BASE_URL;

pub const CONFIG_FILE: &str = "eventpilot.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Gateway API key.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Concurrent social posts.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Per-call timeout at the gateway boundary, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: f64,

    /// Client-level retries for transient gateway failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay: f64,

    #[serde(default = "default_retry_max_delay")]
    pub retry_max_delay: f64,

    #[serde(default = "default_retry_jitter")]
    pub retry_jitter: f64,

    /// Fallback tracing filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Mask secrets in logged action parameters.
    #[serde(default = "default_redact")]
    pub redact_sensitive: bool,

    /// Where checkpoints are written; defaults to `~/.eventpilot/checkpoints`.
    #[serde(default)]
    pub checkpoint_dir: Option<PathBuf>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_max_workers() -> usize {
    5
}

fn default_timeout_secs() -> f64 {
    60.0
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay() -> f64 {
    1.0
}

fn default_retry_max_delay() -> f64 {
    30.0
}

fn default_retry_jitter() -> f64 {
    0.1
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_redact() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            max_workers: default_max_workers(),
            default_timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay: default_retry_base_delay(),
            retry_max_delay: default_retry_max_delay(),
            retry_jitter: default_retry_jitter(),
            log_level: default_log_level(),
            redact_sensitive: default_redact(),
            checkpoint_dir: None,
        }
    }
}

impl Config {
    /// Load `eventpilot.toml` from the current directory, then apply the
    /// process environment. Uses defaults if the file does not exist.
    pub fn load() -> Result<Self, EventPilotError> {
        dotenvy::dotenv().ok();
        let mut config = Self::load_file(Path::new(CONFIG_FILE))?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a config file, or return defaults when it is absent.
    pub fn load_file(path: &Path) -> Result<Self, EventPilotError> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str::<Config>(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Override fields from an environment lookup. Empty values are ignored.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), EventPilotError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("COMPOSIO_API_KEY") {
            self.api_key = key;
        }
        if let Some(url) = get("EVENTPILOT_BASE_URL") {
            self.base_url = url;
        }
        if let Some(v) = get("EVENTPILOT_MAX_WORKERS") {
            self.max_workers = parse_env("EVENTPILOT_MAX_WORKERS", &v)?;
        }
        if let Some(v) = get("EVENTPILOT_TIMEOUT_SECS") {
            self.default_timeout_secs = parse_env("EVENTPILOT_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("EVENTPILOT_MAX_RETRIES") {
            self.max_retries = parse_env("EVENTPILOT_MAX_RETRIES", &v)?;
        }
        if let Some(v) = get("EVENTPILOT_RETRY_BASE_DELAY") {
            self.retry_base_delay = parse_env("EVENTPILOT_RETRY_BASE_DELAY", &v)?;
        }
        if let Some(v) = get("EVENTPILOT_RETRY_MAX_DELAY") {
            self.retry_max_delay = parse_env("EVENTPILOT_RETRY_MAX_DELAY", &v)?;
        }
        if let Some(v) = get("EVENTPILOT_RETRY_JITTER") {
            self.retry_jitter = parse_env("EVENTPILOT_RETRY_JITTER", &v)?;
        }
        if let Some(v) = get("EVENTPILOT_LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = get("EVENTPILOT_REDACT_SENSITIVE") {
            self.redact_sensitive = v.eq_ignore_ascii_case("true");
        }
        if let Some(v) = get("EVENTPILOT_CHECKPOINT_DIR") {
            self.checkpoint_dir = Some(PathBuf::from(v));
        }
        Ok(())
    }

    /// Fails when no API key is configured.
    pub fn validate(&self) -> Result<(), EventPilotError> {
        if self.api_key.is_empty() {
            return Err(EventPilotError::Config(
                "COMPOSIO_API_KEY not found. Set it as an environment variable or in eventpilot.toml"
                    .to_string(),
            ));
        }
        if self.max_workers == 0 {
            return Err(EventPilotError::Config("max_workers must be at least 1".to_string()));
        }
        if !(self.default_timeout_secs.is_finite() && self.default_timeout_secs > 0.0) {
            return Err(EventPilotError::Config(format!(
                "default_timeout_secs must be a positive number, got {}",
                self.default_timeout_secs
            )));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: self.retry_base_delay,
            max_delay: self.retry_max_delay,
            jitter: self.retry_jitter,
        }
    }

    pub fn checkpoint_dir(&self) -> PathBuf {
        self.checkpoint_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".eventpilot")
                .join("checkpoints")
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, EventPilotError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| EventPilotError::Config(format!("{key} has an invalid value: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_workers, 5);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_jitter, 0.1);
        assert!(config.redact_sensitive);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            api_key = "key-123"
            max_workers = 2
            checkpoint_dir = "/tmp/cp"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api_key, "key-123");
        assert_eq!(config.max_workers, 2);
        assert_eq!(config.checkpoint_dir(), PathBuf::from("/tmp/cp"));
        assert_eq!(config.retry_max_delay, 30.0);
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config {
            api_key: "from-file".into(),
            ..Default::default()
        };
        config
            .apply_env(env(&[
                ("COMPOSIO_API_KEY", "from-env"),
                ("EVENTPILOT_MAX_WORKERS", "8"),
                ("EVENTPILOT_RETRY_JITTER", "0.25"),
                ("EVENTPILOT_REDACT_SENSITIVE", "false"),
            ]))
            .unwrap();
        assert_eq!(config.api_key, "from-env");
        assert_eq!(config.max_workers, 8);
        assert_eq!(config.retry_jitter, 0.25);
        assert!(!config.redact_sensitive);
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = Config {
            api_key: "from-file".into(),
            ..Default::default()
        };
        config.apply_env(env(&[("COMPOSIO_API_KEY", "")])).unwrap();
        assert_eq!(config.api_key, "from-file");
    }

    #[test]
    fn invalid_numeric_override_is_an_error() {
        let mut config = Config::default();
        let err = config
            .apply_env(env(&[("EVENTPILOT_MAX_RETRIES", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("EVENTPILOT_MAX_RETRIES"));
    }

    #[test]
    fn validate_requires_api_key() {
        assert!(Config::default().validate().is_err());
        let config = Config {
            api_key: "k".into(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_timeout() {
        for timeout in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = Config {
                api_key: "k".into(),
                default_timeout_secs: timeout,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "timeout {timeout} accepted");
        }
    }

    #[test]
    fn retry_policy_mirrors_config() {
        let policy = Config::default().retry_policy();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, 1.0);
        assert_eq!(policy.max_delay, 30.0);
    }

    #[test]
    fn load_file_falls_back_to_defaults() {
        let config = Config::load_file(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(config.max_retries, 3);
    }
}
