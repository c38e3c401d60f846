//! Champion gate: detection only runs while the local player is the target

use crate::client::GameStateSource;
use crate::config::LiveConfig;
use crate::schema::AllGameData;
use log::debug;
use std::time::{Duration, Instant};

/// Consecutive failed polls after which an active gate closes
pub const GATE_MISS_LIMIT: u32 = 3;

/// Decides from one payload whether the local player is the target champion
#[derive(Debug, Clone)]
pub struct ChampionGate {
    names: Vec<String>,
    raw_contains: String,
}

impl ChampionGate {
    pub fn new(names: Vec<String>, raw_contains: String) -> Self {
        Self { names, raw_contains }
    }

    pub fn from_config(config: &LiveConfig) -> Self {
        Self::new(config.target_champions.clone(), config.target_raw_contains.clone())
    }

    /// True if the active player's roster entry names the target champion
    pub fn matches(&self, data: &AllGameData) -> bool {
        let Some(player) = data.active_player_info() else {
            return false;
        };
        let raw_hit = !self.raw_contains.is_empty()
            && player
                .raw_champion_name
                .as_deref()
                .is_some_and(|raw| raw.contains(&self.raw_contains));
        raw_hit
            || player
                .champion_name
                .as_deref()
                .is_some_and(|name| self.names.iter().any(|n| n == name))
    }
}

/// Rate-limited gate state
#[derive(Debug, Clone)]
pub struct GatePoller {
    gate: ChampionGate,
    interval: Duration,
    last_poll: Option<Instant>,
    active: bool,
    misses: u32,
}

impl GatePoller {
    pub fn new(gate: ChampionGate, interval: Duration) -> Self {
        Self {
            gate,
            interval,
            last_poll: None,
            active: false,
            misses: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Poll if the interval has elapsed. Returns the new state on a flip.
    ///
    /// A failed poll changes nothing, except that [`GATE_MISS_LIMIT`]
    /// failures in a row close an open gate: the endpoint only answers
    /// while a game is running.
    pub fn poll<S: GameStateSource + ?Sized>(&mut self, source: &S, now: Instant) -> Option<bool> {
        let due = self
            .last_poll
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval);
        if !due {
            return None;
        }
        self.last_poll = Some(now);

        let active = match source.fetch() {
            Some(data) => {
                self.misses = 0;
                self.gate.matches(&data)
            }
            None => {
                self.misses = self.misses.saturating_add(1);
                if self.misses < GATE_MISS_LIMIT {
                    return None;
                }
                false
            }
        };

        if active == self.active {
            return None;
        }
        debug!("gate {} -> {}", self.active, active);
        self.active = active;
        Some(active)
    }
}
