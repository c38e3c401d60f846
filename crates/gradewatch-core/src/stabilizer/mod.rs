//! Grade stabilizer
//!
//! Turns the noisy per-frame classification into a stable grade:
//!
//! 1. A raw grade becomes a *proposal* after `confirm_frames` identical frames.
//! 2. Leaving `None` takes `confirm_frames + none_exit_extra_confirm` frames
//!    and always lands on `E`.
//! 3. Proposals above the stable grade set a ramp target; the stable grade
//!    climbs toward it one step per `step_interval`.
//! 4. Proposals below it cancel the ramp. A one-grade drop applies at once;
//!    larger drops wait for `drop_confirm_frames` confirmed proposals and
//!    then jump. `S` is shielded from `None` for `s_to_none_guard` after
//!    it was entered.
//! 5. An equal proposal only clears drop tracking.
//!
//! Only settled grades other than `None` are reported, and never the same
//! grade twice in a row.

mod config;

pub use config::StabilizerConfig;

use crate::grade::Grade;
use log::debug;
use std::time::{Duration, Instant};

/// What the last observed frame did to the state machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepAction {
    /// Raw grade not yet repeated `confirm_frames` times
    Confirming,
    /// Waiting out the longer confirmation needed to leave `None`
    NoneExitPending { needed: u32 },
    /// Climbing toward `target`; `stepped` is true if this frame moved
    Ramp { target: Grade, stepped: bool },
    /// Large drop waiting for confirmation
    DropPending { candidate: Grade, count: u32, distance: usize },
    /// `S -> None` suppressed by the entry guard
    SGuard { remaining: Duration },
    /// Drop applied this frame
    Dropped { to: Grade },
    /// Proposal equals the stable grade
    Steady,
}

/// Read-only view of the working memory, for overlays and logs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilizerStatus {
    pub stable: Grade,
    pub candidate: Option<Grade>,
    pub candidate_count: u32,
    pub ramp_target: Option<Grade>,
    pub drop_candidate: Option<Grade>,
    pub drop_count: u32,
    pub last_emitted: Option<Grade>,
    pub last_action: StepAction,
}

#[derive(Debug, Clone)]
struct StabilizerState {
    stable: Grade,
    last_step: Option<Instant>,
    candidate: Option<Grade>,
    candidate_count: u32,
    ramp_target: Option<Grade>,
    ramp_last_seen: Option<Instant>,
    drop_candidate: Option<Grade>,
    drop_count: u32,
    s_entered: Option<Instant>,
    last_emitted: Option<Grade>,
    last_action: StepAction,
}

impl Default for StabilizerState {
    fn default() -> Self {
        Self {
            stable: Grade::None,
            last_step: None,
            candidate: None,
            candidate_count: 0,
            ramp_target: None,
            ramp_last_seen: None,
            drop_candidate: None,
            drop_count: 0,
            s_entered: None,
            last_emitted: None,
            last_action: StepAction::Confirming,
        }
    }
}

/// Hysteresis state machine over [`Grade`]
#[derive(Debug, Clone)]
pub struct Stabilizer {
    config: StabilizerConfig,
    state: StabilizerState,
}

impl Stabilizer {
    /// Create a stabilizer in the initial (`None`) state
    pub fn new(config: StabilizerConfig) -> Self {
        Self {
            config,
            state: StabilizerState::default(),
        }
    }

    pub fn config(&self) -> &StabilizerConfig {
        &self.config
    }

    /// Current stable grade
    pub fn stable(&self) -> Grade {
        self.state.stable
    }

    /// Drop every counter and return to `None`
    pub fn reset(&mut self) {
        self.state = StabilizerState::default();
    }

    pub fn status(&self) -> StabilizerStatus {
        let s = &self.state;
        StabilizerStatus {
            stable: s.stable,
            candidate: s.candidate,
            candidate_count: s.candidate_count,
            ramp_target: s.ramp_target,
            drop_candidate: s.drop_candidate,
            drop_count: s.drop_count,
            last_emitted: s.last_emitted,
            last_action: s.last_action,
        }
    }

    /// Fold one raw classification observed at `now` into the state.
    ///
    /// Returns the grade to announce if the stable grade settled on a new,
    /// not yet announced, non-`None` value.
    pub fn observe(&mut self, raw: Grade, now: Instant) -> Option<Grade> {
        if self.state.candidate == Some(raw) {
            self.state.candidate_count += 1;
        } else {
            self.state.candidate = Some(raw);
            self.state.candidate_count = 1;
        }

        if self.state.candidate_count < self.config.confirm_frames {
            self.state.last_action = StepAction::Confirming;
            return None;
        }

        let mut proposed = raw;
        if self.state.stable == Grade::None && proposed != Grade::None {
            let needed = self.config.none_exit_frames();
            if self.state.candidate_count < needed {
                self.state.last_action = StepAction::NoneExitPending { needed };
                proposed = Grade::None;
            } else {
                proposed = Grade::E;
            }
        }

        if proposed > self.state.stable {
            self.ramp_up(proposed, now)
        } else if proposed < self.state.stable {
            self.drop_down(proposed, now)
        } else {
            self.clear_drop();
            if !matches!(self.state.last_action, StepAction::NoneExitPending { .. }) {
                self.state.last_action = StepAction::Steady;
            }
            None
        }
    }

    fn ramp_up(&mut self, proposed: Grade, now: Instant) -> Option<Grade> {
        let hold = self.config.ramp_hold();
        let interval = self.config.step_interval();
        let state = &mut self.state;

        if let (Some(_), Some(seen)) = (state.ramp_target, state.ramp_last_seen) {
            if now.saturating_duration_since(seen) > hold {
                state.ramp_target = None;
            }
        }
        let target = match state.ramp_target {
            Some(target) if target >= proposed => target,
            _ => proposed,
        };
        state.ramp_target = Some(target);
        state.ramp_last_seen = Some(now);

        let step_due = state
            .last_step
            .is_none_or(|last| now.saturating_duration_since(last) >= interval);
        let mut emitted = None;
        let mut stepped = false;

        if step_due {
            let prev = state.stable;
            let next = prev.next_up().min(target);
            if next != prev {
                debug!("ramp step {prev} -> {next} (target {target})");
                state.stable = next;
                state.last_step = Some(now);
                stepped = true;
                emitted = self.announce(next);
                if next == Grade::S && prev != Grade::S {
                    self.state.s_entered = Some(now);
                }
            }
        }

        self.state.last_action = StepAction::Ramp { target, stepped };
        emitted
    }

    fn drop_down(&mut self, proposed: Grade, now: Instant) -> Option<Grade> {
        let guard = self.config.s_to_none_guard();
        self.state.ramp_target = None;
        self.state.ramp_last_seen = None;

        if self.state.stable == Grade::S && proposed == Grade::None {
            let entered = *self.state.s_entered.get_or_insert(now);
            let elapsed = now.saturating_duration_since(entered);
            if elapsed < guard {
                self.clear_drop();
                self.state.last_action = StepAction::SGuard {
                    remaining: guard - elapsed,
                };
                return None;
            }
        }

        let distance = self.state.stable.index() - proposed.index();
        if distance < 2 {
            return self.land_drop(proposed, now);
        }

        if self.state.drop_candidate == Some(proposed) {
            self.state.drop_count += 1;
        } else {
            self.state.drop_candidate = Some(proposed);
            self.state.drop_count = 1;
        }

        if self.state.drop_count >= self.config.drop_confirm_frames {
            return self.land_drop(proposed, now);
        }

        self.state.last_action = StepAction::DropPending {
            candidate: proposed,
            count: self.state.drop_count,
            distance,
        };
        None
    }

    fn land_drop(&mut self, to: Grade, now: Instant) -> Option<Grade> {
        debug!("drop {} -> {to}", self.state.stable);
        self.state.stable = to;
        self.state.last_step = Some(now);
        self.clear_drop();
        if to != Grade::S {
            self.state.s_entered = None;
        }
        self.state.last_action = StepAction::Dropped { to };
        self.announce(to)
    }

    fn clear_drop(&mut self) {
        self.state.drop_candidate = None;
        self.state.drop_count = 0;
    }

    fn announce(&mut self, grade: Grade) -> Option<Grade> {
        if grade == Grade::None || self.state.last_emitted == Some(grade) {
            return None;
        }
        self.state.last_emitted = Some(grade);
        Some(grade)
    }
}

impl Default for Stabilizer {
    fn default() -> Self {
        Self::new(StabilizerConfig::default())
    }
}

#[cfg(test)]
mod tests;
