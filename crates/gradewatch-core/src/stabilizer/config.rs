//! Stabilizer tuning

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Debounce and timing thresholds for [`Stabilizer`](super::Stabilizer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    /// Identical raw frames needed before a value counts as a proposal
    pub confirm_frames: u32,
    /// Extra identical frames needed to leave `None`
    pub none_exit_extra_confirm: u32,
    /// Minimum time between two ramp steps
    pub step_interval_sec: f64,
    /// Confirmed proposals needed before a drop of two or more grades
    pub drop_confirm_frames: u32,
    /// A ramp target not seen again within this window is abandoned
    pub ramp_hold_sec: f64,
    /// `S` cannot fall to `None` within this long of entering `S`
    pub s_to_none_guard_sec: f64,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            confirm_frames: 3,
            none_exit_extra_confirm: 6,
            step_interval_sec: 0.05,
            drop_confirm_frames: 10,
            ramp_hold_sec: 0.1,
            s_to_none_guard_sec: 6.0,
        }
    }
}

impl StabilizerConfig {
    /// Frames of the same non-`None` raw grade needed to leave `None`
    pub fn none_exit_frames(&self) -> u32 {
        self.confirm_frames + self.none_exit_extra_confirm
    }

    pub fn step_interval(&self) -> Duration {
        secs(self.step_interval_sec)
    }

    pub fn ramp_hold(&self) -> Duration {
        secs(self.ramp_hold_sec)
    }

    pub fn s_to_none_guard(&self) -> Duration {
        secs(self.s_to_none_guard_sec)
    }
}

// Negative or NaN values read from a config file collapse to zero
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: StabilizerConfig =
            serde_json::from_str(r#"{ "drop_confirm_frames": 4 }"#).unwrap();
        assert_eq!(config.drop_confirm_frames, 4);
        assert_eq!(config.confirm_frames, 3);
        assert_eq!(config.none_exit_frames(), 9);
    }

    #[test]
    fn test_bad_durations_clamp_to_zero() {
        let config = StabilizerConfig {
            step_interval_sec: -1.0,
            ramp_hold_sec: f64::NAN,
            ..Default::default()
        };
        assert_eq!(config.step_interval(), Duration::ZERO);
        assert_eq!(config.ramp_hold(), Duration::ZERO);
        assert_eq!(config.s_to_none_guard(), Duration::from_secs(6));
    }
}
