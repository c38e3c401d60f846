//! Shared state between the detection loop and its controller
//!
//! The controller (UI, CLI) writes through the methods here; the loop reads
//! a copied [`ContextSnapshot`] once per iteration. The lock is only ever
//! held for the copy or the update, never across a capture or a match.

use crate::anchor::{AnchorRegistry, Calibration, CaptureRegion};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Copy of the shared state taken at the top of a loop iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextSnapshot {
    pub running: bool,
    pub debug_preview: bool,
    pub anchor_index: usize,
    pub scale: f64,
    pub region: CaptureRegion,
}

#[derive(Debug)]
struct ContextState {
    running: bool,
    debug_preview: bool,
    calibration: Calibration,
    reset_requested: bool,
}

/// Lock-guarded detection settings plus the anchor registry they index into
#[derive(Debug)]
pub struct DetectionContext {
    registry: AnchorRegistry,
    state: Mutex<ContextState>,
}

impl DetectionContext {
    /// Create a running context calibrated to `anchor_index` (clamped).
    ///
    /// Returns `None` if the registry has no presets.
    pub fn new(registry: AnchorRegistry, anchor_index: usize, debug_preview: bool) -> Option<Self> {
        let calibration = registry.calibrate(anchor_index)?;
        Some(Self {
            registry,
            state: Mutex::new(ContextState {
                running: true,
                debug_preview,
                calibration,
                reset_requested: false,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, ContextState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn registry(&self) -> &AnchorRegistry {
        &self.registry
    }

    pub fn snapshot(&self) -> ContextSnapshot {
        let state = self.lock();
        ContextSnapshot {
            running: state.running,
            debug_preview: state.debug_preview,
            anchor_index: state.calibration.index,
            scale: state.calibration.scale,
            region: state.calibration.region,
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// Ask the loop to exit after its current iteration
    pub fn stop(&self) {
        self.lock().running = false;
    }

    /// Re-arm the running flag before spawning a fresh loop
    pub fn start(&self) {
        self.lock().running = true;
    }

    pub fn set_debug_preview(&self, enabled: bool) {
        self.lock().debug_preview = enabled;
    }

    /// Flip the preview flag and return the new value
    pub fn toggle_debug_preview(&self) -> bool {
        let mut state = self.lock();
        state.debug_preview = !state.debug_preview;
        state.debug_preview
    }

    /// Select a preset. Out-of-range indices clamp to the last preset.
    ///
    /// The loop notices the new index on its next snapshot and rebuilds its
    /// template bank on its own thread.
    pub fn set_anchor_index(&self, index: usize) -> Calibration {
        // `new` refused an empty registry, so calibrate always succeeds here
        let mut state = self.lock();
        if let Some(calibration) = self.registry.calibrate(index) {
            state.calibration = calibration;
        }
        state.calibration
    }

    pub fn calibration(&self) -> Calibration {
        self.lock().calibration
    }

    /// Request the same reset a gate-off transition performs
    pub fn request_reset(&self) {
        self.lock().reset_requested = true;
    }

    /// Consume a pending reset request
    pub fn take_reset_request(&self) -> bool {
        std::mem::take(&mut self.lock().reset_requested)
    }
}
