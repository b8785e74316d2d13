//! End-to-end frame loop scenarios driven by a synthetic signal source

use mic_bounce::consts::{MAX_BURSTS, RESTART_DELAY_MS};
use mic_bounce::platform::SyntheticSource;
use mic_bounce::renderer::RecordingSurface;
use mic_bounce::sim::{Lane, Phase};
use mic_bounce::{FrameLoop, SharedThreshold};

const STEP_MS: f64 = 16.0;

fn started(source: SyntheticSource, threshold: SharedThreshold) -> FrameLoop<SyntheticSource> {
    let mut frame_loop = FrameLoop::new(threshold, 42);
    frame_loop.attach_source(source);
    frame_loop.start(0.0);
    frame_loop
}

/// Drive silent frames until the run ends; returns the game-over timestamp
fn run_to_game_over(
    frame_loop: &mut FrameLoop<SyntheticSource>,
    surface: &mut RecordingSurface,
    mut now: f64,
    step: f64,
) -> f64 {
    for _ in 0..10_000 {
        now += step;
        if frame_loop.frame(now, surface).game_over {
            return now;
        }
    }
    panic!("ball never reached the floor");
}

#[test]
fn loud_frame_while_falling_bounces_and_spawns_one_burst() {
    let mut surface = RecordingSurface::default();
    let mut frame_loop = started(SyntheticSource::silence(), SharedThreshold::default());

    // Leave the rest position so the ball is falling
    frame_loop.frame(16.0, &mut surface);
    frame_loop.frame(32.0, &mut surface);
    assert!(frame_loop.state().ball.is_falling());

    frame_loop.attach_source(SyntheticSource::constant(0.2));
    let snapshot = *frame_loop.frame(48.0, &mut surface);

    assert!(snapshot.bounced);
    assert_eq!(snapshot.bounces, 1);
    assert_eq!(snapshot.bursts, 1);
    assert_eq!(frame_loop.fireworks().len(), 1);
    // Near the top the impulse carries the ball into the ceiling
    assert_eq!(frame_loop.state().ball.y, 0.0);
    assert!(!surface.circles.is_empty());
}

#[test]
fn loud_moment_is_latched_for_a_short_window() {
    let mut surface = RecordingSurface::default();
    let mut frame_loop = started(SyntheticSource::constant(0.2), SharedThreshold::default());

    // At rest: loud but not falling, so nothing fires yet
    assert!(!frame_loop.frame(10.0, &mut surface).bounced);

    frame_loop.attach_source(SyntheticSource::silence());
    let snapshot = *frame_loop.frame(60.0, &mut surface);
    assert!(snapshot.bounced, "loud moment 50 ms ago should still count");
}

#[test]
fn loud_moment_expires_after_the_window() {
    let mut surface = RecordingSurface::default();
    let mut frame_loop = started(SyntheticSource::constant(0.2), SharedThreshold::default());

    assert!(!frame_loop.frame(10.0, &mut surface).bounced);

    frame_loop.attach_source(SyntheticSource::silence());
    assert!(!frame_loop.frame(100.0, &mut surface).bounced);
    assert_eq!(frame_loop.state().bounces, 0);
}

#[test]
fn silence_ends_the_run_and_restart_fires_after_delay() {
    let mut surface = RecordingSurface::default();
    let mut frame_loop = started(SyntheticSource::silence(), SharedThreshold::default());
    frame_loop.set_lane(Lane::new(800.0, 500.0));

    let over_at = run_to_game_over(&mut frame_loop, &mut surface, 0.0, STEP_MS);
    assert_eq!(frame_loop.state().phase, Phase::GameOver);
    assert!(frame_loop.state().ball.y > 448.0);
    assert_eq!(
        frame_loop.restart_timer().deadline(),
        Some(over_at + RESTART_DELAY_MS)
    );

    let frozen_y = frame_loop.state().ball.y;
    let snapshot = *frame_loop.frame(over_at + RESTART_DELAY_MS - 1.0, &mut surface);
    assert_eq!(snapshot.phase, Phase::GameOver);
    assert_eq!(snapshot.y, frozen_y);

    let snapshot = *frame_loop.frame(over_at + RESTART_DELAY_MS, &mut surface);
    assert_eq!(snapshot.phase, Phase::Playing);
    assert_eq!(snapshot.bounces, 0);
    // Restarted at the top, then one gravity step
    assert!(snapshot.y < 0.1);
    assert!(!frame_loop.restart_timer().is_pending());
}

#[test]
fn threshold_change_applies_on_the_next_frame() {
    let threshold = SharedThreshold::new(0.3);
    let mut surface = RecordingSurface::default();
    let mut frame_loop = started(SyntheticSource::constant(0.2), threshold.clone());

    frame_loop.frame(16.0, &mut surface);
    let snapshot = *frame_loop.frame(32.0, &mut surface);
    assert!(frame_loop.state().ball.is_falling());
    assert!(!snapshot.bounced, "0.2 is under a 0.3 threshold");

    let stored = threshold.set(0.15);
    assert!((stored - 0.15).abs() < 1e-6);
    let snapshot = *frame_loop.frame(48.0, &mut surface);
    assert_eq!(snapshot.threshold, stored);
    assert!(snapshot.bounced);
}

#[test]
fn fireworks_keep_decaying_after_game_over() {
    let mut surface = RecordingSurface::default();
    let mut frame_loop = started(SyntheticSource::constant(0.2), SharedThreshold::default());
    // Short lane and 1 ms frames so the run ends while sparks are young
    frame_loop.set_lane(Lane::new(800.0, 100.0));

    frame_loop.frame(1.0, &mut surface);
    assert!(frame_loop.frame(2.0, &mut surface).bounced);

    frame_loop.attach_source(SyntheticSource::silence());
    let over_at = run_to_game_over(&mut frame_loop, &mut surface, 2.0, 1.0);
    let bursts_at_game_over = frame_loop.fireworks().len();
    assert!(bursts_at_game_over > 0);
    assert!(bursts_at_game_over <= MAX_BURSTS);

    let mut now = over_at;
    for _ in 0..80 {
        now += STEP_MS;
        frame_loop.frame(now, &mut surface);
    }
    assert_eq!(frame_loop.state().phase, Phase::GameOver);
    assert!(frame_loop.fireworks().is_empty());
    assert!(surface.circles.is_empty());
}

#[test]
fn fireworks_toggle_suppresses_bursts_but_not_bounces() {
    let mut surface = RecordingSurface::default();
    let mut frame_loop = started(SyntheticSource::constant(0.2), SharedThreshold::default());
    frame_loop.set_fireworks_enabled(false);

    frame_loop.frame(16.0, &mut surface);
    let snapshot = *frame_loop.frame(32.0, &mut surface);
    assert!(snapshot.bounced);
    assert_eq!(snapshot.bursts, 0);
}

#[test]
fn byte_only_source_still_drives_bounces() {
    let mut surface = RecordingSurface::default();
    let mut frame_loop = started(
        SyntheticSource::constant(0.2).without_float_path(),
        SharedThreshold::default(),
    );

    frame_loop.frame(16.0, &mut surface);
    let snapshot = *frame_loop.frame(32.0, &mut surface);
    assert!((snapshot.level.rms - 0.2).abs() < 0.01);
    assert!(snapshot.level.db.is_finite());
    assert!(snapshot.bounced);
}

#[test]
fn long_gaps_are_clamped() {
    let mut surface = RecordingSurface::default();
    let mut frame_loop = started(SyntheticSource::silence(), SharedThreshold::default());

    assert_eq!(frame_loop.frame(5_000.0, &mut surface).dt_ms, 48.0);
    assert_eq!(frame_loop.frame(5_010.0, &mut surface).dt_ms, 10.0);
}

#[test]
fn teardown_releases_source_and_cancels_restart() {
    let mut surface = RecordingSurface::default();
    let mut frame_loop = started(SyntheticSource::silence(), SharedThreshold::default());

    let over_at = run_to_game_over(&mut frame_loop, &mut surface, 0.0, STEP_MS);
    assert!(frame_loop.restart_timer().is_pending());

    let source = frame_loop.teardown();
    assert!(source.is_some_and(|s| s.frames_read() > 0));
    assert!(!frame_loop.restart_timer().is_pending());
    assert!(!frame_loop.is_running());
    assert_eq!(frame_loop.state().phase, Phase::Idle);

    // A second teardown is harmless and the restart never fires
    assert!(frame_loop.teardown().is_none());
    frame_loop.frame(over_at + RESTART_DELAY_MS + 1.0, &mut surface);
    assert_eq!(frame_loop.state().phase, Phase::Idle);
}
