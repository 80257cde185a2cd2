//! Engine configuration
//!
//! Every field has a default, so a config file only needs the values it
//! overrides:
//!
//! ```json
//! { "buffers": { "renderCapacity": 20000 }, "measureTimeoutMs": 5000 }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use treescope_common::{
    CONSOLE_CAPACITY, DEFAULT_CONSOLE_LIMIT, DEFAULT_NETWORK_LIMIT, DEFAULT_RENDER_LIMIT,
    DEFAULT_STATE_CHANGE_LIMIT, NETWORK_CAPACITY, RENDER_CAPACITY, STATE_CHANGE_CAPACITY,
};

use crate::domain::ConfigError;

/// Maximum tree depth any traversal will descend to
pub const MAX_TRAVERSAL_DEPTH: usize = 512;

/// How long an asynchronous measurement may stay pending
pub const MEASURE_TIMEOUT_MS: u64 = 10_000;

/// Capacities and default query limits of the four event buffers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BufferConfig {
    pub console_capacity: usize,
    pub network_capacity: usize,
    pub state_change_capacity: usize,
    pub render_capacity: usize,
    pub console_limit: usize,
    pub network_limit: usize,
    pub state_change_limit: usize,
    pub render_limit: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            console_capacity: CONSOLE_CAPACITY,
            network_capacity: NETWORK_CAPACITY,
            state_change_capacity: STATE_CHANGE_CAPACITY,
            render_capacity: RENDER_CAPACITY,
            console_limit: DEFAULT_CONSOLE_LIMIT,
            network_limit: DEFAULT_NETWORK_LIMIT,
            state_change_limit: DEFAULT_STATE_CHANGE_LIMIT,
            render_limit: DEFAULT_RENDER_LIMIT,
        }
    }
}

/// Bounds applied when copying host values into diff payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptureLimits {
    /// Nesting level at which compounds are replaced by a marker
    pub max_depth: usize,
    pub max_keys: usize,
    pub max_items: usize,
}

impl Default for CaptureLimits {
    fn default() -> Self {
        Self { max_depth: 4, max_keys: 50, max_items: 50 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub buffers: BufferConfig,
    pub capture: CaptureLimits,
    pub measure_timeout_ms: u64,
    pub max_traversal_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffers: BufferConfig::default(),
            capture: CaptureLimits::default(),
            measure_timeout_ms: MEASURE_TIMEOUT_MS,
            max_traversal_depth: MAX_TRAVERSAL_DEPTH,
        }
    }
}

impl EngineConfig {
    /// Load a JSON config file; missing fields keep their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid config JSON
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    #[must_use]
    pub fn measure_timeout(&self) -> Duration {
        Duration::from_millis(self.measure_timeout_ms)
    }
}
