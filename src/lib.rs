//! Gradewatch
//!
//! Watches a small screen region for the style-grade indicator, smooths the
//! per-frame classification into a stable grade, and reports grade changes
//! and the local player's pentakill as events.

pub mod config;
pub mod consumer;
pub mod detector;

pub use config::{AppConfig, ConfigError, LoopConfig};
pub use consumer::{EventConsumer, Reaction};
pub use detector::{Detector, IterationOutcome};
