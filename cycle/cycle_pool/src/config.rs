//! Pool configuration.
//!
//! A configuration is plain data: it can be built in code, or read from TOML
//! such as
//!
//! ```toml
//! initial_size = 8
//! growable = true
//! update_interval_ms = 5
//! updater_thread_name = "sprite-updater"
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

/// Shortest pause the updater takes between two passes over the active set
pub const MIN_UPDATE_INTERVAL: Duration = Duration::from_millis(1);

/// Longest pause the updater takes between two passes over the active set
pub const MAX_UPDATE_INTERVAL: Duration = Duration::from_secs(3600);

/// Configuration for a resource pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of resources created when the pool is constructed
    pub initial_size: usize,

    /// Whether `acquire` creates a resource instead of waiting when none is free
    pub growable: bool,

    /// Pause between updater passes; the pool lock is free during the pause
    #[serde(
        rename = "update_interval_ms",
        serialize_with = "serialize_millis",
        deserialize_with = "deserialize_millis"
    )]
    pub update_interval: Duration,

    /// Name given to the updater thread
    pub updater_thread_name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_size: 4,
            growable: false,
            update_interval: Duration::from_millis(10),
            updater_thread_name: "cycle-updater".to_string(),
        }
    }
}

impl PoolConfig {
    /// A fixed-size pool: `acquire` waits when every resource is checked out
    pub fn fixed(initial_size: usize) -> Self {
        Self {
            initial_size,
            growable: false,
            ..Default::default()
        }
    }

    /// A growable pool: `acquire` creates a resource when none is free
    pub fn growable(initial_size: usize) -> Self {
        Self {
            initial_size,
            growable: true,
            ..Default::default()
        }
    }

    /// Set the pause between updater passes
    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    /// Set the updater thread name
    pub fn with_updater_thread_name(mut self, name: impl Into<String>) -> Self {
        self.updater_thread_name = name.into();
        self
    }

    /// The interval the updater actually uses, clamped to
    /// [`MIN_UPDATE_INTERVAL`]..=[`MAX_UPDATE_INTERVAL`]
    pub fn effective_update_interval(&self) -> Duration {
        self.update_interval.clamp(MIN_UPDATE_INTERVAL, MAX_UPDATE_INTERVAL)
    }

    /// Parse a configuration from TOML; missing keys take their default values
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Render this configuration as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }
}

fn serialize_millis<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
}

fn deserialize_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}
