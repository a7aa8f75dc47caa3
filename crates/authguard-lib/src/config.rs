// ============================
// authguard-lib/src/config.rs
// ============================
//! Configuration management.
use std::path::Path;

use chrono::Duration;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::auth::policy::{self, LockoutPolicy};
use crate::error::AppError;

/// Config file read by [`Settings::load`]
pub const DEFAULT_CONFIG_FILE: &str = "authguard.toml";

/// Prefix for environment overrides; `__` separates nested keys
pub const ENV_PREFIX: &str = "AUTHGUARD_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Log level
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
    /// Lockout policy and sweeping
    pub lockout: LockoutSettings,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Lockout settings, in whole seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockoutSettings {
    pub threshold: u32,
    pub window_secs: u64,
    pub base_lock_secs: u64,
    pub max_lock_secs: u64,
    pub retention_secs: u64,
    /// Evict stale records inline after every recorded failure
    pub sweep_on_write: bool,
    /// Background sweep period; 0 disables the background sweeper
    pub sweep_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            lockout: LockoutSettings::default(),
        }
    }
}

impl Default for LockoutSettings {
    fn default() -> Self {
        Self {
            threshold: policy::DEFAULT_THRESHOLD,
            window_secs: policy::DEFAULT_WINDOW.num_seconds() as u64,
            base_lock_secs: policy::DEFAULT_BASE_LOCK.num_seconds() as u64,
            max_lock_secs: policy::DEFAULT_MAX_LOCK.num_seconds() as u64,
            retention_secs: policy::DEFAULT_RETENTION.num_seconds() as u64,
            sweep_on_write: true,
            sweep_interval_secs: 60,
        }
    }
}

impl LockoutSettings {
    /// The lockout policy these settings describe
    pub fn policy(&self) -> LockoutPolicy {
        LockoutPolicy {
            threshold: self.threshold,
            window: seconds(self.window_secs),
            base_lock: seconds(self.base_lock_secs),
            max_lock: seconds(self.max_lock_secs),
            retention: seconds(self.retention_secs),
        }
    }

    /// Background sweep period, if enabled
    pub fn sweep_interval(&self) -> Option<std::time::Duration> {
        (self.sweep_interval_secs > 0)
            .then(|| std::time::Duration::from_secs(self.sweep_interval_secs))
    }
}

/// Saturates; policy validation rejects anything that large
fn seconds(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

impl Settings {
    /// Load settings from `authguard.toml` and the environment
    pub fn load() -> Result<Self, AppError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load settings from a specific file, with environment overrides.
    ///
    /// A missing file is not an error; defaults fill every absent key.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let settings: Settings = Self::figment(path.as_ref()).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Check settings for values the engine cannot honour
    pub fn validate(&self) -> Result<(), AppError> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(AppError::InvalidSetting(format!(
                "unknown log level '{}'",
                self.log_level
            )));
        }

        self.lockout.policy().validate()?;

        if !self.lockout.sweep_on_write && self.lockout.sweep_interval_secs == 0 {
            return Err(AppError::InvalidSetting(
                "stale records would never be evicted: enable sweep_on_write or set sweep_interval_secs"
                    .to_string(),
            ));
        }

        Ok(())
    }
}
