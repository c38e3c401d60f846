//! Gradewatch live client library
//!
//! Polls the game's local live-client endpoint to decide whether detection
//! should run at all and to spot the local player's pentakill. Every
//! network or parse failure reads as "no data this cycle".

pub mod client;
pub mod config;
pub mod gate;
pub mod killstreak;
pub mod schema;

// Re-export commonly used types
pub use client::{GameStateSource, LiveClient, LiveError};
pub use config::LiveConfig;
pub use gate::{ChampionGate, GatePoller};
pub use killstreak::KillstreakWatcher;
pub use schema::AllGameData;

// Error handling
pub type Result<T> = anyhow::Result<T>;
