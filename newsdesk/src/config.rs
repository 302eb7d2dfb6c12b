//! Typed settings with documented defaults.
//!
//! The clustering threshold, time window, retry policy and concurrency limit
//! are deliberately configuration, not hard-coded values. Settings layer an
//! optional `config/base.yaml` under `NEWSDESK_`-prefixed environment
//! variables (e.g. `NEWSDESK_ORCHESTRATOR__MAX_CONCURRENCY=8`).

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub orchestrator: OrchestratorSettings,
    #[serde(default)]
    pub cluster: ClusterSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorSettings {
    /// Maximum in-flight per-location calls. Bounds upstream rate pressure.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Retries per failed call after the initial attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Fixed backoff between attempts, in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Individual timeout per backend call, in seconds.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

fn default_max_concurrency() -> usize {
    4
}
fn default_max_retries() -> u32 {
    2
}
fn default_retry_backoff_ms() -> u64 {
    500
}
fn default_call_timeout_secs() -> u64 {
    30
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

impl OrchestratorSettings {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterSettings {
    /// Normalized-title similarity above which two articles are considered
    /// the same story (0.0..=1.0).
    #[serde(default = "default_similarity_threshold")]
    pub title_similarity_threshold: f64,
    /// Two articles can only share a cluster when published within this many
    /// hours of each other.
    #[serde(default = "default_time_window_hours")]
    pub time_window_hours: i64,
}

fn default_similarity_threshold() -> f64 {
    0.72
}
fn default_time_window_hours() -> i64 {
    48
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            title_similarity_threshold: default_similarity_threshold(),
            time_window_hours: default_time_window_hours(),
        }
    }
}

impl ClusterSettings {
    pub fn time_window(&self) -> time::Duration {
        time::Duration::hours(self.time_window_hours)
    }
}

/// Reads settings from `config/base.yaml` (optional) and the environment.
pub fn read_config() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/base").required(false))
        .add_source(
            config::Environment::with_prefix("NEWSDESK")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
