//! Live client settings

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Full game-state endpoint
    pub url: String,
    /// Per-request timeout
    pub timeout_ms: u64,
    /// Minimum time between gate polls
    pub gate_poll_interval_sec: f64,
    /// Minimum time between event-log polls (0 = every active iteration)
    pub event_poll_interval_sec: f64,
    /// Display names that count as the target champion
    pub target_champions: Vec<String>,
    /// Substring of the internal champion name that counts as a match
    pub target_raw_contains: String,
    /// Kill streak length of the one-shot event
    pub multikill_streak: u32,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            url: "https://127.0.0.1:2999/liveclientdata/allgamedata".to_string(),
            timeout_ms: 200,
            gate_poll_interval_sec: 0.35,
            event_poll_interval_sec: 0.0,
            target_champions: vec!["Samira".to_string(), "사미라".to_string()],
            target_raw_contains: "Samira".to_string(),
            multikill_streak: 5,
        }
    }
}

impl LiveConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn gate_poll_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.gate_poll_interval_sec).unwrap_or(Duration::ZERO)
    }

    pub fn event_poll_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.event_poll_interval_sec).unwrap_or(Duration::ZERO)
    }
}
