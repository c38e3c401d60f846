//! Events flowing from the detection loop to its consumer
//!
//! The channel is an unbounded `std::sync::mpsc` queue. Events are rare
//! compared to the frame rate (a handful per minute), so no bound or drop
//! policy is applied: every event pushed is eventually observed, in order.

use crate::grade::Grade;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// Typed event produced by the detection loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DetectionEvent {
    /// The live-state gate flipped
    GateChanged(bool),
    /// The stable grade settled on a new value. Never carries `Grade::None`.
    GradeChanged(Grade),
    /// The local player completed a qualifying kill streak
    SpecialKillstreak,
}

/// Create a connected sender/receiver pair
pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel();
    let rx = EventReceiver {
        rx,
        held: RefCell::new(VecDeque::new()),
    };
    (EventSender { tx }, rx)
}

/// Producer half, owned by the detection loop
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<DetectionEvent>,
}

impl EventSender {
    /// Push an event without blocking.
    ///
    /// Returns `false` once the receiver is gone; the loop keeps running
    /// regardless, there is simply nobody left to hear it.
    pub fn send(&self, event: DetectionEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Consumer half
#[derive(Debug)]
pub struct EventReceiver {
    rx: Receiver<DetectionEvent>,
    // Taken off the queue by `is_closed`, handed out by the next `drain`
    held: RefCell<VecDeque<DetectionEvent>>,
}

impl EventReceiver {
    /// Take everything queued right now, oldest first. Never blocks.
    pub fn drain(&self) -> Vec<DetectionEvent> {
        let mut events: Vec<_> = self.held.borrow_mut().drain(..).collect();
        loop {
            match self.rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }

    /// True once every sender has been dropped and the queue is empty
    pub fn is_closed(&self) -> bool {
        if !self.held.borrow().is_empty() {
            return false;
        }
        match self.rx.try_recv() {
            Ok(event) => {
                self.held.borrow_mut().push_back(event);
                false
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_drain_is_fifo_and_empties_queue() {
        let (tx, rx) = event_channel();
        tx.send(DetectionEvent::GateChanged(true));
        tx.send(DetectionEvent::GradeChanged(Grade::E));
        tx.send(DetectionEvent::SpecialKillstreak);

        assert_eq!(
            rx.drain(),
            vec![
                DetectionEvent::GateChanged(true),
                DetectionEvent::GradeChanged(Grade::E),
                DetectionEvent::SpecialKillstreak,
            ]
        );
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn test_drain_on_empty_does_not_block() {
        let (_tx, rx) = event_channel();
        assert!(rx.drain().is_empty());
        assert!(!rx.is_closed());
    }

    #[test]
    fn test_cross_thread_order() {
        let (tx, rx) = event_channel();
        let producer = thread::spawn(move || {
            for grade in [Grade::E, Grade::D, Grade::C] {
                tx.send(DetectionEvent::GradeChanged(grade));
            }
        });
        producer.join().unwrap();

        assert_eq!(
            rx.drain(),
            vec![
                DetectionEvent::GradeChanged(Grade::E),
                DetectionEvent::GradeChanged(Grade::D),
                DetectionEvent::GradeChanged(Grade::C),
            ]
        );
        assert!(rx.is_closed());
    }

    #[test]
    fn test_closed_check_keeps_pending_events() {
        let (tx, rx) = event_channel();
        tx.send(DetectionEvent::GateChanged(true));
        drop(tx);

        assert!(!rx.is_closed());
        assert_eq!(rx.drain(), vec![DetectionEvent::GateChanged(true)]);
        assert!(rx.is_closed());
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (tx, rx) = event_channel();
        drop(rx);
        assert!(!tx.send(DetectionEvent::SpecialKillstreak));
    }
}
