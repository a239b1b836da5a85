use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid poll interval: {0}ms. Must be positive")]
    InvalidInterval(u64),

    #[error("Invalid {name} timeout: {secs}s. Must be positive")]
    InvalidTimeout { name: &'static str, secs: u64 },

    #[error("Poll interval ({interval_ms}ms) must not exceed the {name} ({window_ms}ms)")]
    IntervalExceedsWindow {
        name: &'static str,
        interval_ms: u64,
        window_ms: u64,
    },

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .convergent/config.yaml (project config)
    /// 3. .convergent/local.yaml (local overrides, optional)
    /// 4. Environment variables (CONVERGENT_* prefix, `__` separates nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".convergent/config.yaml"))
            .merge(Yaml::file(".convergent/local.yaml"))
            .merge(Env::prefixed("CONVERGENT_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let poll = &config.poll;

        if poll.interval_ms == 0 {
            return Err(ConfigError::InvalidInterval(poll.interval_ms));
        }

        let timeouts = [
            ("poll", poll.timeout_secs),
            ("invariant window", poll.invariant_window_secs),
            ("supervisor", config.supervisor.timeout_secs),
            ("stability", config.stability.timeout_secs),
        ];
        for (name, secs) in timeouts {
            if secs == 0 {
                return Err(ConfigError::InvalidTimeout { name, secs });
            }
        }

        let interval = poll.interval();
        for (name, window) in [
            ("poll timeout", poll.timeout()),
            ("invariant window", poll.invariant_window()),
        ] {
            if interval > window {
                return Err(ConfigError::IntervalExceedsWindow {
                    name,
                    interval_ms: poll.interval_ms,
                    window_ms: u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
                });
            }
        }

        if config.stability.interval_secs == 0 {
            return Err(ConfigError::InvalidTimeout {
                name: "stability interval",
                secs: 0,
            });
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}
