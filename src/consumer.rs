//! Reference consumer of the event channel
//!
//! Tracks what an audio layer would do with each event and logs it. The
//! real audio side lives outside this crate and only needs the same three
//! events.

use gradewatch_core::{DetectionEvent, EventReceiver, Grade};
use log::info;

/// What the audio side should do in response to an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// Start the track for this grade
    PlayGrade(Grade),
    /// Stop the grade track
    StopGrade,
    /// Fire the one-shot sound
    PlaySpecial,
}

#[derive(Debug, Default)]
pub struct EventConsumer {
    gate_active: bool,
    playing: Option<Grade>,
}

impl EventConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gate_active(&self) -> bool {
        self.gate_active
    }

    /// Grade whose track is currently playing
    pub fn playing(&self) -> Option<Grade> {
        self.playing
    }

    /// Drain the channel once and react to everything that was queued
    pub fn tick(&mut self, events: &EventReceiver) -> Vec<Reaction> {
        events
            .drain()
            .into_iter()
            .filter_map(|event| self.handle(event))
            .collect()
    }

    pub fn handle(&mut self, event: DetectionEvent) -> Option<Reaction> {
        match event {
            DetectionEvent::GateChanged(active) => {
                info!("[GATE] active={}", active);
                self.gate_active = active;
                if active {
                    return None;
                }
                self.playing.take().map(|_| Reaction::StopGrade)
            }
            DetectionEvent::GradeChanged(grade) => {
                info!("[GRADE EVENT] {} playing={:?} gate={}", grade, self.playing, self.gate_active);
                // `None` keeps whatever is already playing
                if !self.gate_active || grade == Grade::None || self.playing == Some(grade) {
                    return None;
                }
                self.playing = Some(grade);
                Some(Reaction::PlayGrade(grade))
            }
            DetectionEvent::SpecialKillstreak => {
                info!("[SPECIAL EVENT] gate={}", self.gate_active);
                self.gate_active.then_some(Reaction::PlaySpecial)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradewatch_core::event_channel;

    #[test]
    fn test_grade_events_need_open_gate() {
        let mut consumer = EventConsumer::new();
        assert_eq!(consumer.handle(DetectionEvent::GradeChanged(Grade::E)), None);
        assert_eq!(consumer.handle(DetectionEvent::SpecialKillstreak), None);

        consumer.handle(DetectionEvent::GateChanged(true));
        assert_eq!(
            consumer.handle(DetectionEvent::GradeChanged(Grade::E)),
            Some(Reaction::PlayGrade(Grade::E))
        );
        assert_eq!(
            consumer.handle(DetectionEvent::SpecialKillstreak),
            Some(Reaction::PlaySpecial)
        );
    }

    #[test]
    fn test_gate_close_stops_track() {
        let mut consumer = EventConsumer::new();
        consumer.handle(DetectionEvent::GateChanged(true));
        consumer.handle(DetectionEvent::GradeChanged(Grade::B));
        assert_eq!(
            consumer.handle(DetectionEvent::GateChanged(false)),
            Some(Reaction::StopGrade)
        );
        assert_eq!(consumer.playing(), None);
        assert_eq!(consumer.handle(DetectionEvent::GateChanged(false)), None);
    }

    #[test]
    fn test_tick_drains_in_order() {
        let (tx, rx) = event_channel();
        tx.send(DetectionEvent::GateChanged(true));
        tx.send(DetectionEvent::GradeChanged(Grade::E));
        tx.send(DetectionEvent::GradeChanged(Grade::D));
        tx.send(DetectionEvent::SpecialKillstreak);

        let mut consumer = EventConsumer::new();
        assert_eq!(
            consumer.tick(&rx),
            vec![
                Reaction::PlayGrade(Grade::E),
                Reaction::PlayGrade(Grade::D),
                Reaction::PlaySpecial,
            ]
        );
        assert!(consumer.tick(&rx).is_empty());
        assert_eq!(consumer.playing(), Some(Grade::D));
    }
}
