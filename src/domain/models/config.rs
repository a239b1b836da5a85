use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for convergence verification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Poller cadence and default windows
    #[serde(default)]
    pub poll: PollConfig,

    /// Shared deadline for concurrent verification groups
    #[serde(default)]
    pub supervisor: SupervisorConfig,

    /// Waiting for the managed system to settle
    #[serde(default)]
    pub stability: StabilityConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LogConfig,
}

/// Poller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PollConfig {
    /// Delay between predicate evaluations in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Default until-true timeout in seconds
    #[serde(default = "default_poll_timeout_secs")]
    pub timeout_secs: u64,

    /// Default invariant window in seconds
    #[serde(default = "default_invariant_window_secs")]
    pub invariant_window_secs: u64,
}

const fn default_interval_ms() -> u64 {
    1000
}

const fn default_poll_timeout_secs() -> u64 {
    60
}

const fn default_invariant_window_secs() -> u64 {
    60
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            timeout_secs: default_poll_timeout_secs(),
            invariant_window_secs: default_invariant_window_secs(),
        }
    }
}

impl PollConfig {
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub const fn invariant_window(&self) -> Duration {
        Duration::from_secs(self.invariant_window_secs)
    }
}

/// Supervisor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SupervisorConfig {
    /// Shared deadline for one group of tasks, in seconds
    #[serde(default = "default_supervisor_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_supervisor_timeout_secs() -> u64 {
    30 * 60
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_supervisor_timeout_secs(),
        }
    }
}

impl SupervisorConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Stability wait configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StabilityConfig {
    #[serde(default = "default_stability_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_stability_interval_secs")]
    pub interval_secs: u64,
}

const fn default_stability_timeout_secs() -> u64 {
    20 * 60
}

const fn default_stability_interval_secs() -> u64 {
    20
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_stability_timeout_secs(),
            interval_secs: default_stability_interval_secs(),
        }
    }
}

impl StabilityConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LogConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stdout only when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Log rotation policy for file output
    #[serde(default)]
    pub rotation: RotationPolicy,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: RotationPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}
