//! Background detection loop
//!
//! One iteration: snapshot the context, poll the gate, and while it is open
//! grab a frame, classify it, fold it into the stabilizer and poll the event
//! log. Everything it learns goes out through the event channel.

use crate::config::AppConfig;
use gradewatch_core::stabilizer::StepAction;
use gradewatch_core::{
    ContextSnapshot, DetectionContext, DetectionEvent, EventSender, Stabilizer, StabilizerStatus,
};
use gradewatch_cv::traits::{FrameSource, PreviewSurface};
use gradewatch_cv::{open_preview, Classification, PreviewKind, TemplateBank, TemplateMatcher};
use gradewatch_live::{ChampionGate, GameStateSource, GatePoller, KillstreakWatcher};
use image::GrayImage;
use log::{debug, info, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// What one call to [`Detector::run_iteration`] did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IterationOutcome {
    /// Running flag cleared; the loop should exit
    Stopped,
    /// Gate closed, nothing captured
    Idle,
    /// Frame grab or matching failed; skipped this cycle
    CaptureFailed,
    /// A frame was classified
    Classified(Classification),
}

pub struct Detector<F, S> {
    context: Arc<DetectionContext>,
    events: EventSender,
    frames: F,
    live: S,
    bank: TemplateBank,
    bank_anchor: Option<usize>,
    matcher: TemplateMatcher,
    stabilizer: Stabilizer,
    gate: GatePoller,
    killstreak: KillstreakWatcher,
    preview_kind: PreviewKind,
    preview: Option<Box<dyn PreviewSurface>>,
    preview_failed: bool,
    idle_sleep: Duration,
    frame_sleep: Duration,
}

impl<F, S> Detector<F, S>
where
    F: FrameSource,
    S: GameStateSource,
{
    pub fn new(
        context: Arc<DetectionContext>,
        events: EventSender,
        frames: F,
        live: S,
        bank: TemplateBank,
        config: &AppConfig,
    ) -> Self {
        Self {
            context,
            events,
            frames,
            live,
            bank,
            bank_anchor: None,
            matcher: TemplateMatcher::new(config.templates.score_threshold),
            stabilizer: Stabilizer::new(config.stabilizer.clone()),
            gate: GatePoller::new(
                ChampionGate::from_config(&config.live),
                config.live.gate_poll_interval(),
            ),
            killstreak: KillstreakWatcher::from_config(&config.live),
            preview_kind: config.preview,
            preview: None,
            preview_failed: false,
            idle_sleep: config.runtime.idle_sleep(),
            frame_sleep: config.runtime.frame_sleep(),
        }
    }

    pub fn stabilizer(&self) -> &Stabilizer {
        &self.stabilizer
    }

    pub fn bank(&self) -> &TemplateBank {
        &self.bank
    }

    pub fn gate_active(&self) -> bool {
        self.gate.is_active()
    }

    /// Run until the context's running flag is cleared
    pub fn run(mut self) {
        info!("Detection loop started");
        loop {
            match self.run_iteration(Instant::now()) {
                IterationOutcome::Stopped => break,
                IterationOutcome::Idle => thread::sleep(self.idle_sleep),
                IterationOutcome::CaptureFailed | IterationOutcome::Classified(_) => {
                    thread::sleep(self.frame_sleep)
                }
            }
        }
        self.close_preview();
        info!("Detection loop stopped");
    }

    /// One pass of the loop at time `now`
    pub fn run_iteration(&mut self, now: Instant) -> IterationOutcome {
        let snapshot = self.context.snapshot();
        if !snapshot.running {
            self.close_preview();
            return IterationOutcome::Stopped;
        }

        if self.context.take_reset_request() {
            info!("Detection state reset on request");
            self.reset_session();
        }

        if let Some(active) = self.gate.poll(&self.live, now) {
            if !active {
                self.reset_session();
            }
            self.events.send(DetectionEvent::GateChanged(active));
        }

        if !self.gate.is_active() {
            let lines = [
                "WAITING: target champion not active".to_string(),
                "Detection paused (no screen grab)".to_string(),
            ];
            self.update_preview(snapshot.debug_preview, None, &lines);
            return IterationOutcome::Idle;
        }

        self.sync_bank(&snapshot);

        // Independent of whether the grab succeeds
        if self.killstreak.poll(&self.live, now) {
            self.events.send(DetectionEvent::SpecialKillstreak);
        }

        let frame = match self.frames.capture(&snapshot.region) {
            Ok(frame) => frame,
            Err(err) => {
                debug!("capture skipped: {err:#}");
                return IterationOutcome::CaptureFailed;
            }
        };

        let result = match self.matcher.classify(&frame, self.bank.active()) {
            Ok(result) => result,
            Err(err) => {
                debug!("classification skipped: {err:#}");
                return IterationOutcome::CaptureFailed;
            }
        };
        if let Some(grade) = self.stabilizer.observe(result.grade, now) {
            info!("stable grade -> {grade} (score {:.3})", result.score);
            self.events.send(DetectionEvent::GradeChanged(grade));
        }

        let lines = overlay_lines(&result, &self.stabilizer.status(), self.stabilizer.config());
        self.update_preview(snapshot.debug_preview, Some(&frame), &lines);
        IterationOutcome::Classified(result)
    }

    fn reset_session(&mut self) {
        self.stabilizer.reset();
        self.killstreak.reset();
    }

    // Rebuilds run here, on the thread that classifies
    fn sync_bank(&mut self, snapshot: &ContextSnapshot) {
        if self.bank_anchor == Some(snapshot.anchor_index) {
            return;
        }
        self.bank_anchor = Some(snapshot.anchor_index);
        if let Err(err) = self.bank.rebuild(snapshot.scale) {
            warn!(
                "Keeping scale {:.3} templates, rebuild failed: {err:#}",
                self.bank.active().scale()
            );
            return;
        }
        info!(
            "Calibrated for anchor #{} (scale {:.3}, region {}x{} at {},{})",
            snapshot.anchor_index,
            snapshot.scale,
            snapshot.region.width,
            snapshot.region.height,
            snapshot.region.left,
            snapshot.region.top
        );
    }

    fn update_preview(&mut self, enabled: bool, frame: Option<&GrayImage>, lines: &[String]) {
        if !enabled {
            self.close_preview();
            self.preview_failed = false;
            return;
        }
        if self.preview.is_none() && !self.preview_failed {
            match open_preview(self.preview_kind) {
                Ok(surface) => self.preview = Some(surface),
                Err(err) => {
                    warn!("debug preview unavailable: {err:#}");
                    self.preview_failed = true;
                }
            }
        }
        if let Some(surface) = self.preview.as_mut() {
            if let Err(err) = surface.show(frame, lines) {
                debug!("preview update failed: {err:#}");
            }
        }
    }

    fn close_preview(&mut self) {
        if let Some(mut surface) = self.preview.take() {
            surface.close();
        }
    }
}

impl<F, S> Detector<F, S>
where
    F: FrameSource + Send + 'static,
    S: GameStateSource + Send + 'static,
{
    /// Move the loop onto its own thread
    pub fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("detector".to_string())
            .spawn(move || self.run())
    }
}

/// Status text for the debug preview
fn overlay_lines(
    result: &Classification,
    status: &StabilizerStatus,
    config: &gradewatch_core::StabilizerConfig,
) -> Vec<String> {
    let candidate = status
        .candidate
        .map_or_else(|| "-".to_string(), |g| g.to_string());
    let mut lines = vec![
        "gate=ACTIVE".to_string(),
        format!("raw={} score={:.3}", result.grade, result.score),
        format!(
            "cand={} ({}/{})",
            candidate, status.candidate_count, config.confirm_frames
        ),
        format!("stable={}", status.stable),
    ];
    match status.last_action {
        StepAction::NoneExitPending { needed } => {
            lines.push(format!("NoneExit: need {needed} frames"));
        }
        StepAction::Ramp { target, .. } => {
            lines.push(format!("RAMP target={target} -> stable={}", status.stable));
        }
        StepAction::DropPending {
            candidate,
            count,
            distance,
        } => {
            lines.push(format!(
                "DROP? {candidate} ({count}/{}) dist={distance}",
                config.drop_confirm_frames
            ));
        }
        StepAction::SGuard { remaining } => {
            lines.push(format!("S->None blocked ({:.1}s left)", remaining.as_secs_f64()));
        }
        StepAction::Confirming | StepAction::Dropped { .. } | StepAction::Steady => {}
    }
    lines
}
