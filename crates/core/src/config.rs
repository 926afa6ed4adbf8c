// SPDX-License-Identifier: MIT

//! TOML-backed runtime configuration (spec.md §6.5), with environment
//! variable overrides for every key.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, #[source] source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse { path: String, #[source] source: toml::de::Error },
    #[error("invalid duration for {key}: {reason}")]
    InvalidDuration { key: String, reason: String },
    #[error("invalid environment override {key}={value}: {reason}")]
    InvalidOverride { key: String, value: String, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub handler_timeout: String,
    pub cancel_deadline: String,
    pub stuck_threshold: String,
    pub archive_retention: String,
    pub max_concurrent_items_default: u32,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            handler_timeout: "2h".to_string(),
            cancel_deadline: "30s".to_string(),
            stuck_threshold: "10m".to_string(),
            archive_retention: "30d".to_string(),
            max_concurrent_items_default: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub queue_name: String,
    pub event_ring_size: u32,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self { queue_name: "spindle-tasks".to_string(), event_ring_size: 1024 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub concurrency: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub root: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self { root: ".".to_string() }
    }
}

/// Root configuration record, loaded from a TOML file at startup and
/// overridden per-key by `${SCREAMING_SNAKE}` environment variables (e.g.
/// `SPINDLE_TASK_HANDLER_TIMEOUT`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub task: TaskConfig,
    pub bus: BusConfig,
    pub worker: WorkerConfig,
    pub project: ProjectConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
        let mut config: Config = toml::from_str(&raw)
            .map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        macro_rules! override_string {
            ($env_key:literal, $field:expr) => {
                if let Ok(value) = std::env::var($env_key) {
                    $field = value;
                }
            };
        }
        macro_rules! override_u32 {
            ($env_key:literal, $field:expr) => {
                if let Ok(value) = std::env::var($env_key) {
                    $field = value.parse().map_err(|_| ConfigError::InvalidOverride {
                        key: $env_key.to_string(),
                        value: value.clone(),
                        reason: "expected an integer".to_string(),
                    })?;
                }
            };
        }

        override_string!("SPINDLE_TASK_HANDLER_TIMEOUT", self.task.handler_timeout);
        override_string!("SPINDLE_TASK_CANCEL_DEADLINE", self.task.cancel_deadline);
        override_string!("SPINDLE_TASK_STUCK_THRESHOLD", self.task.stuck_threshold);
        override_string!("SPINDLE_TASK_ARCHIVE_RETENTION", self.task.archive_retention);
        override_u32!("SPINDLE_TASK_MAX_CONCURRENT_ITEMS_DEFAULT", self.task.max_concurrent_items_default);
        override_string!("SPINDLE_BUS_QUEUE_NAME", self.bus.queue_name);
        override_u32!("SPINDLE_BUS_EVENT_RING_SIZE", self.bus.event_ring_size);
        override_u32!("SPINDLE_WORKER_CONCURRENCY", self.worker.concurrency);
        override_string!("SPINDLE_PROJECT_ROOT", self.project.root);
        Ok(())
    }

    pub fn handler_timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.task.handler_timeout)
            .map_err(|reason| ConfigError::InvalidDuration { key: "task.handler_timeout".to_string(), reason })
    }

    pub fn cancel_deadline(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.task.cancel_deadline)
            .map_err(|reason| ConfigError::InvalidDuration { key: "task.cancel_deadline".to_string(), reason })
    }

    pub fn stuck_threshold(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.task.stuck_threshold)
            .map_err(|reason| ConfigError::InvalidDuration { key: "task.stuck_threshold".to_string(), reason })
    }

    pub fn archive_retention(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.task.archive_retention)
            .map_err(|reason| ConfigError::InvalidDuration { key: "task.archive_retention".to_string(), reason })
    }
}

/// Parse a duration string like `"30s"`, `"5m"`, `"1h"` into a [`Duration`].
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let (num_str, suffix) = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| (&s[..i], &s[i..]))
        .unwrap_or((s, ""));

    let num: u64 = num_str.parse().map_err(|_| format!("invalid number in duration: {}", s))?;

    let multiplier = match suffix.trim() {
        "ms" | "millis" | "millisecond" | "milliseconds" => return Ok(Duration::from_millis(num)),
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600,
        "d" | "day" | "days" => 86400,
        other => return Err(format!("unknown duration suffix: {}", other)),
    };

    Ok(Duration::from_secs(num * multiplier))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
