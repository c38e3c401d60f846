//! Tool configuration
//!
//! Everything tunable lives in one JSON document. Every field has a
//! default, so a partial file (or none at all) is fine.

use gradewatch_core::StabilizerConfig;
use gradewatch_cv::{PreviewKind, TemplateConfig};
use gradewatch_live::LiveConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_VERSION: u32 = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write config {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Detection loop pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Sleep between iterations while the gate is closed
    pub idle_sleep_ms: u64,
    /// Sleep between active iterations
    pub frame_sleep_ms: u64,
    /// Consumer drain period
    pub consumer_tick_ms: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            idle_sleep_ms: 50,
            frame_sleep_ms: 20,
            consumer_tick_ms: 16,
        }
    }
}

impl LoopConfig {
    pub fn idle_sleep(&self) -> Duration {
        Duration::from_millis(self.idle_sleep_ms)
    }

    pub fn frame_sleep(&self) -> Duration {
        Duration::from_millis(self.frame_sleep_ms)
    }

    pub fn consumer_tick(&self) -> Duration {
        Duration::from_millis(self.consumer_tick_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub version: u32,
    /// Index into the anchor registry; clamped when applied
    pub anchor_index: usize,
    pub debug_preview: bool,
    pub preview: PreviewKind,
    pub templates: TemplateConfig,
    pub stabilizer: StabilizerConfig,
    pub live: LiveConfig,
    pub runtime: LoopConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            anchor_index: 0,
            debug_preview: true,
            preview: PreviewKind::default(),
            templates: TemplateConfig::default(),
            stabilizer: StabilizerConfig::default(),
            live: LiveConfig::default(),
            runtime: LoopConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| write_error(std::io::Error::other(e)))?;
        fs::write(path, json).map_err(write_error)
    }
}
