use crate::retry::{BackoffSchedule, RetryPredicate};
use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Extra retry rules appended to the default predicates (optional section).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Additional HTTP codes to retry, e.g. `[504]`.
    pub status_codes: Vec<u16>,
    /// Additional service error reasons to retry, e.g. `["quotaExceeded"]`.
    pub reasons: Vec<String>,
}

/// Settings for the curl transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    pub follow_redirects: bool,
    pub max_redirects: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            follow_redirects: true,
            max_redirects: 10,
            user_agent: None,
        }
    }
}

/// Global configuration loaded from `~/.config/retrans/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Overall deadline for one logical request when the caller sets none.
    pub default_timeout_secs: u64,
    /// First backoff wait in milliseconds.
    pub initial_backoff_ms: u64,
    /// Optional cap on a single backoff wait (unset = unbounded).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_backoff_ms: Option<u64>,
    pub retry: RetryConfig,
    pub http: HttpConfig,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: 90,
            initial_backoff_ms: 500,
            max_backoff_ms: None,
            retry: RetryConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("max_backoff_ms ({max}) is smaller than initial_backoff_ms ({initial})")]
    CapBelowInitial { max: u64, initial: u64 },
}

impl TransportConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    pub fn backoff_schedule(&self) -> BackoffSchedule {
        BackoffSchedule {
            initial: Duration::from_millis(self.initial_backoff_ms),
            max: self.max_backoff_ms.map(Duration::from_millis),
        }
    }

    /// Predicates for the `[retry]` section, in the order they are checked.
    pub fn extra_predicates(&self) -> Vec<RetryPredicate> {
        let mut predicates = Vec::new();
        if !self.retry.status_codes.is_empty() {
            predicates.push(RetryPredicate::status_codes(
                "configured_status_codes",
                self.retry.status_codes.clone(),
            ));
        }
        if !self.retry.reasons.is_empty() {
            predicates.push(RetryPredicate::reasons(
                "configured_reasons",
                self.retry.reasons.clone(),
            ));
        }
        predicates
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_timeout_secs == 0 {
            return Err(ConfigError::Zero("default_timeout_secs"));
        }
        if self.initial_backoff_ms == 0 {
            return Err(ConfigError::Zero("initial_backoff_ms"));
        }
        if self.http.connect_timeout_secs == 0 {
            return Err(ConfigError::Zero("http.connect_timeout_secs"));
        }
        if let Some(max) = self.max_backoff_ms {
            if max < self.initial_backoff_ms {
                return Err(ConfigError::CapBelowInitial {
                    max,
                    initial: self.initial_backoff_ms,
                });
            }
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("retrans")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Parse and validate a TOML document.
pub fn from_toml(data: &str) -> Result<TransportConfig> {
    let cfg: TransportConfig = toml::from_str(data)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load configuration from an explicit path.
pub fn load_from_path(path: &Path) -> Result<TransportConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    from_toml(&data).with_context(|| format!("invalid config {}", path.display()))
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<TransportConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = TransportConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}
