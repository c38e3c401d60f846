use super::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FRAME: Duration = Duration::from_millis(20);

struct Feed {
    stabilizer: Stabilizer,
    now: Instant,
}

impl Feed {
    fn new() -> Self {
        Self::with_config(StabilizerConfig::default())
    }

    fn with_config(config: StabilizerConfig) -> Self {
        Self {
            stabilizer: Stabilizer::new(config),
            now: Instant::now(),
        }
    }

    fn frame(&mut self, raw: Grade) -> Option<Grade> {
        self.now += FRAME;
        self.stabilizer.observe(raw, self.now)
    }

    /// Feed `raw` for `frames` frames and collect announcements
    fn run(&mut self, raw: Grade, frames: usize) -> Vec<Grade> {
        (0..frames).filter_map(|_| self.frame(raw)).collect()
    }

    /// Feed `grade` until it is the stable grade
    fn settle(&mut self, grade: Grade) -> Vec<Grade> {
        let mut emitted = Vec::new();
        for _ in 0..500 {
            if self.stabilizer.stable() == grade && self.stabilizer.state.candidate == Some(grade) {
                break;
            }
            emitted.extend(self.frame(grade));
        }
        assert_eq!(self.stabilizer.stable(), grade, "never settled on {grade}");
        emitted
    }

    fn stable(&self) -> Grade {
        self.stabilizer.stable()
    }
}

#[test]
fn test_none_exit_needs_extended_confirmation() {
    let mut feed = Feed::new();
    assert!(feed.run(Grade::None, 5).is_empty());

    for _ in 0..8 {
        assert_eq!(feed.frame(Grade::E), None);
        assert_eq!(feed.stable(), Grade::None);
    }
    assert_eq!(feed.frame(Grade::E), Some(Grade::E));
    assert_eq!(feed.stable(), Grade::E);
}

#[test]
fn test_none_exit_status_while_pending() {
    let mut feed = Feed::new();
    feed.run(Grade::B, 4);
    assert_eq!(
        feed.stabilizer.status().last_action,
        StepAction::NoneExitPending { needed: 9 }
    );
}

#[test]
fn test_none_exit_always_lands_on_e() {
    let mut feed = Feed::new();
    let emitted = feed.run(Grade::A, 9);
    assert_eq!(emitted, vec![Grade::E]);
    assert_eq!(feed.stable(), Grade::E);
}

#[test]
fn test_interrupted_none_exit_starts_over() {
    let mut feed = Feed::new();
    feed.run(Grade::C, 8);
    feed.frame(Grade::None);
    assert!(feed.run(Grade::C, 8).is_empty());
    assert_eq!(feed.stable(), Grade::None);
    assert_eq!(feed.frame(Grade::C), Some(Grade::E));
}

#[test]
fn test_ramp_climbs_one_grade_at_a_time() {
    let mut feed = Feed::new();
    let emitted = feed.run(Grade::A, 40);
    assert_eq!(emitted, vec![Grade::E, Grade::D, Grade::C, Grade::B, Grade::A]);
    assert_eq!(feed.stable(), Grade::A);
}

#[test]
fn test_ramp_respects_step_interval() {
    let mut feed = Feed::new();
    feed.run(Grade::S, 9);
    assert_eq!(feed.stable(), Grade::E);

    // 20 ms frames against a 50 ms interval: steps land every third frame
    assert_eq!(feed.frame(Grade::S), None);
    assert_eq!(feed.frame(Grade::S), None);
    assert_eq!(feed.frame(Grade::S), Some(Grade::D));
    assert_eq!(feed.frame(Grade::S), None);
    assert_eq!(feed.frame(Grade::S), None);
    assert_eq!(feed.frame(Grade::S), Some(Grade::C));
}

#[test]
fn test_ramp_stops_at_proposal() {
    let mut feed = Feed::new();
    feed.settle(Grade::C);
    assert!(feed.run(Grade::C, 50).is_empty());
    assert_eq!(feed.stable(), Grade::C);
}

#[test]
fn test_small_drop_is_immediate() {
    let mut feed = Feed::new();
    feed.settle(Grade::B);

    feed.frame(Grade::C);
    feed.frame(Grade::C);
    assert_eq!(feed.stable(), Grade::B);
    assert_eq!(feed.frame(Grade::C), Some(Grade::C));
    assert_eq!(feed.stable(), Grade::C);
}

#[test]
fn test_large_drop_waits_then_jumps() {
    let mut feed = Feed::new();
    feed.settle(Grade::B);

    // 2 unconfirmed frames + 9 confirmed proposals
    for _ in 0..11 {
        assert_eq!(feed.frame(Grade::E), None);
        assert_eq!(feed.stable(), Grade::B);
    }
    assert_eq!(feed.frame(Grade::E), Some(Grade::E));
    assert_eq!(feed.stable(), Grade::E);
}

#[test]
fn test_large_drop_candidate_resets_on_change() {
    let mut feed = Feed::new();
    feed.settle(Grade::A);

    feed.run(Grade::D, 10);
    assert_eq!(feed.stabilizer.status().drop_count, 8);

    feed.run(Grade::E, 3);
    let status = feed.stabilizer.status();
    assert_eq!(status.drop_candidate, Some(Grade::E));
    assert_eq!(status.drop_count, 1);
    assert_eq!(feed.stable(), Grade::A);
}

#[test]
fn test_equal_proposal_clears_drop_tracking() {
    let mut feed = Feed::new();
    feed.settle(Grade::A);
    feed.run(Grade::D, 6);
    assert!(feed.stabilizer.status().drop_count > 0);

    feed.run(Grade::A, 3);
    assert_eq!(feed.stabilizer.status().drop_count, 0);
    assert_eq!(feed.stabilizer.status().last_action, StepAction::Steady);
}

#[test]
fn test_drop_cancels_ramp() {
    let mut feed = Feed::new();
    feed.settle(Grade::C);
    feed.run(Grade::S, 3);
    assert_eq!(feed.stabilizer.status().ramp_target, Some(Grade::S));

    let stable = feed.stable();
    feed.run(Grade::from_index(stable.index() - 1), 3);
    assert_eq!(feed.stabilizer.status().ramp_target, None);
}

#[test]
fn test_s_guard_blocks_none_then_releases() {
    let mut feed = Feed::new();
    let emitted = feed.settle(Grade::S);
    assert_eq!(emitted.last(), Some(&Grade::S));
    let entered = feed.now;

    // 5.8 s of continuous None
    feed.run(Grade::None, 290);
    assert_eq!(feed.stable(), Grade::S);
    assert!(matches!(
        feed.stabilizer.status().last_action,
        StepAction::SGuard { .. }
    ));

    let mut released = false;
    for _ in 0..100 {
        assert_eq!(feed.frame(Grade::None), None);
        if feed.stable() == Grade::None {
            released = true;
            break;
        }
    }
    assert!(released);
    assert!(feed.now.duration_since(entered) >= Duration::from_secs(6));
}

#[test]
fn test_s_guard_does_not_block_small_drop() {
    let mut feed = Feed::new();
    feed.settle(Grade::S);
    feed.frame(Grade::A);
    feed.frame(Grade::A);
    assert_eq!(feed.frame(Grade::A), Some(Grade::A));
}

#[test]
fn test_s_guard_restarts_after_leaving_s() {
    let mut feed = Feed::new();
    feed.settle(Grade::S);
    feed.run(Grade::None, 400);
    assert_eq!(feed.stable(), Grade::None);

    feed.settle(Grade::S);
    feed.run(Grade::None, 100);
    assert_eq!(feed.stable(), Grade::S);
}

#[test]
fn test_none_never_announced() {
    let mut feed = Feed::new();
    feed.settle(Grade::E);
    assert!(feed.run(Grade::None, 20).is_empty());
    assert_eq!(feed.stable(), Grade::None);
}

#[test]
fn test_reentering_last_announced_grade_is_silent() {
    let mut feed = Feed::new();
    assert_eq!(feed.settle(Grade::E), vec![Grade::E]);
    feed.settle(Grade::None);
    assert!(feed.settle(Grade::E).is_empty());
    assert_eq!(feed.settle(Grade::D), vec![Grade::D]);
}

#[test]
fn test_reset_returns_to_initial_state() {
    let mut feed = Feed::new();
    feed.settle(Grade::B);
    feed.stabilizer.reset();

    let status = feed.stabilizer.status();
    assert_eq!(status.stable, Grade::None);
    assert_eq!(status.candidate, None);
    assert_eq!(status.candidate_count, 0);
    assert_eq!(status.ramp_target, None);
    assert_eq!(status.last_emitted, None);

    // Full None exit is required again, and E is announced again
    assert!(feed.run(Grade::B, 8).is_empty());
    assert_eq!(feed.frame(Grade::B), Some(Grade::E));
}

#[test]
fn test_stale_ramp_target_is_abandoned() {
    let mut feed = Feed::new();
    feed.settle(Grade::C);

    // Confirm S once: target S, one step to B
    feed.run(Grade::S, 3);
    assert_eq!(feed.stabilizer.status().ramp_target, Some(Grade::S));
    let stable = feed.stable();

    // Sit at the stable grade well past the hold window
    feed.run(stable, 20);
    assert_eq!(feed.stabilizer.status().ramp_target, Some(Grade::S));

    let above = stable.next_up();
    feed.run(above, 3);
    assert_eq!(feed.stabilizer.status().ramp_target, Some(above));
}

#[test]
fn test_random_streams_keep_invariants() {
    for seed in 1..=20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut feed = Feed::new();
        let mut last_announced: Option<Grade> = None;

        for _ in 0..400 {
            let raw = Grade::from_index(rng.gen_range(0..7));
            let run = rng.gen_range(1..=15);
            for _ in 0..run {
                let before = feed.stable();
                let emitted = feed.frame(raw);
                let after = feed.stable();

                if after > before {
                    assert_eq!(after.index(), before.index() + 1, "ramp skipped a grade");
                }
                if before == Grade::None && after != Grade::None {
                    assert_eq!(after, Grade::E);
                }
                if let Some(grade) = emitted {
                    assert_ne!(grade, Grade::None);
                    assert_ne!(Some(grade), last_announced, "duplicate announcement");
                    assert_eq!(grade, after);
                    last_announced = Some(grade);
                }
            }
        }
    }
}
