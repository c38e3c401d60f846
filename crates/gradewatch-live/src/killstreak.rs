//! One-shot pentakill detection from the event log

use crate::client::GameStateSource;
use crate::config::LiveConfig;
use crate::schema::AllGameData;
use log::{debug, info};
use std::time::{Duration, Instant};

const MULTIKILL_EVENT: &str = "Multikill";

/// Watches the event log for the local player's qualifying multikill.
///
/// Fires at most once until [`reset`](Self::reset). Events are consumed by
/// id: only ids above the highest one seen so far are examined.
#[derive(Debug, Clone)]
pub struct KillstreakWatcher {
    streak: i64,
    interval: Duration,
    last_poll: Option<Instant>,
    last_event_id: i64,
    fired: bool,
}

impl KillstreakWatcher {
    pub fn new(streak: u32, interval: Duration) -> Self {
        Self {
            streak: streak as i64,
            interval,
            last_poll: None,
            last_event_id: -1,
            fired: false,
        }
    }

    pub fn from_config(config: &LiveConfig) -> Self {
        Self::new(config.multikill_streak, config.event_poll_interval())
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    pub fn last_event_id(&self) -> i64 {
        self.last_event_id
    }

    /// Re-arm for a new session. The id high-water mark is kept so events
    /// already seen in this game are not replayed.
    pub fn reset(&mut self) {
        self.fired = false;
        self.last_poll = None;
    }

    /// Poll if armed and due. True exactly once per session.
    pub fn poll<S: GameStateSource + ?Sized>(&mut self, source: &S, now: Instant) -> bool {
        if self.fired {
            return false;
        }
        let due = self
            .last_poll
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval);
        if !due {
            return false;
        }
        self.last_poll = Some(now);

        match source.fetch() {
            Some(data) => self.scan(&data),
            None => false,
        }
    }

    /// Examine unseen events in one payload
    pub fn scan(&mut self, data: &AllGameData) -> bool {
        if self.fired {
            return false;
        }
        let Some(active) = data.active_name() else {
            return false;
        };

        // A fresh game restarts ids from zero
        let newest = data.events().iter().filter_map(|e| e.event_id).max();
        if newest.is_some_and(|id| id < self.last_event_id) {
            debug!("event ids restarted below {}, new game", self.last_event_id);
            self.last_event_id = -1;
        }

        let mut hit = false;
        for event in data.events() {
            let Some(id) = event.event_id else {
                continue;
            };
            if id <= self.last_event_id {
                continue;
            }
            self.last_event_id = id;

            let qualifies = event.event_name.as_deref() == Some(MULTIKILL_EVENT)
                && event.kill_streak == Some(self.streak)
                && event.actor() == Some(active);
            if qualifies && !hit {
                info!("multikill x{} by {} (event {})", self.streak, active, id);
                hit = true;
            }
        }

        self.fired = hit;
        hit
    }
}
