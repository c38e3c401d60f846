//! Gradewatch core library
//!
//! Grade model, event channel, grade stabilizer and the shared detection
//! context. Nothing in here touches the screen or the network.

pub mod anchor;
pub mod context;
pub mod event;
pub mod grade;
pub mod stabilizer;

// Re-export commonly used types
pub use anchor::{AnchorPreset, AnchorRegistry, CaptureRegion};
pub use context::{ContextSnapshot, DetectionContext};
pub use event::{event_channel, DetectionEvent, EventReceiver, EventSender};
pub use grade::Grade;
pub use stabilizer::{Stabilizer, StabilizerConfig, StabilizerStatus};
