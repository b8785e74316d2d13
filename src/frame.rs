//! Per-frame driver
//!
//! Called once per display refresh with a monotonic timestamp. Each call
//! samples the meter, steps the ball, advances the fireworks and publishes a
//! snapshot for the display layer. Everything runs to completion inside the
//! call; nothing blocks.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::*;
use crate::meter::{LevelMeter, LoudnessSample, SignalSource};
use crate::renderer::DrawSurface;
use crate::settings::SharedThreshold;
use crate::sim::{Fireworks, GameState, Lane, Phase, TickInput, tick};
use crate::{db_to_unit, rms_to_db};

/// Pending automatic restart. Cancelling is idempotent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RestartTimer {
    deadline_ms: Option<f64>,
}

impl RestartTimer {
    /// Schedule a restart [`RESTART_DELAY_MS`] after `now_ms`, replacing any
    /// pending one
    pub fn schedule(&mut self, now_ms: f64) {
        self.deadline_ms = Some(now_ms + RESTART_DELAY_MS);
    }

    pub fn cancel(&mut self) {
        self.deadline_ms = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline_ms.is_some()
    }

    pub fn deadline(&self) -> Option<f64> {
        self.deadline_ms
    }

    /// Fire (and clear) the timer if its deadline has been reached
    pub fn poll(&mut self, now_ms: f64) -> bool {
        match self.deadline_ms {
            Some(deadline) if now_ms >= deadline => {
                self.deadline_ms = None;
                true
            }
            _ => false,
        }
    }
}

/// Rolling FPS over the last 60 frames
#[derive(Debug, Clone)]
pub struct FpsCounter {
    frame_times: [f64; 60],
    frame_index: usize,
    fps: u32,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self {
            frame_times: [0.0; 60],
            frame_index: 0,
            fps: 0,
        }
    }
}

impl FpsCounter {
    pub fn record(&mut self, time: f64) -> u32 {
        self.frame_times[self.frame_index] = time;
        self.frame_index = (self.frame_index + 1) % 60;

        // Oldest slot is the one we'll overwrite next
        let oldest_time = self.frame_times[self.frame_index];
        if oldest_time > 0.0 {
            let elapsed = time - oldest_time;
            if elapsed > 0.0 {
                self.fps = (59_000.0 / elapsed).round() as u32;
            }
        }
        self.fps
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }
}

/// Read-only view of one frame, for the display layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSnapshot {
    pub phase: Phase,
    /// Ball distance from the lane top (CSS pixels)
    pub y: f32,
    pub bounces: u32,
    pub level: LoudnessSample,
    /// Level bar fill, 0..1
    pub level_unit: f32,
    pub threshold: f32,
    pub threshold_db: f32,
    /// Threshold marker position, 0..1
    pub threshold_unit: f32,
    /// A bounce (and firework) happened this frame
    pub bounced: bool,
    /// The run ended this frame
    pub game_over: bool,
    /// Clamped frame time used for this frame (ms)
    pub dt_ms: f64,
    pub bursts: usize,
    pub fps: u32,
}

impl Default for FrameSnapshot {
    fn default() -> Self {
        Self::idle(DEFAULT_THRESHOLD)
    }
}

impl FrameSnapshot {
    /// Snapshot before any frame has run, showing `threshold`
    pub fn idle(threshold: f32) -> Self {
        let level = LoudnessSample::silent();
        let mut snapshot = Self {
            phase: Phase::Idle,
            y: 0.0,
            bounces: 0,
            level,
            level_unit: db_to_unit(level.db),
            threshold: 0.0,
            threshold_db: 0.0,
            threshold_unit: 0.0,
            bounced: false,
            game_over: false,
            dt_ms: 0.0,
            bursts: 0,
            fps: 0,
        };
        snapshot.set_threshold(threshold);
        snapshot
    }

    fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold;
        self.threshold_db = rms_to_db(threshold);
        self.threshold_unit = db_to_unit(self.threshold_db);
    }
}

/// The frame driver
pub struct FrameLoop<S> {
    meter: LevelMeter<S>,
    state: GameState,
    fireworks: Fireworks,
    threshold: SharedThreshold,
    restart: RestartTimer,
    fps: FpsCounter,
    lane: Lane,
    fireworks_enabled: bool,
    rng: Pcg32,
    last_ts: Option<f64>,
    snapshot: FrameSnapshot,
}

impl<S: SignalSource> FrameLoop<S> {
    /// `threshold` is shared with whoever edits it; `seed` drives the sparks
    pub fn new(threshold: SharedThreshold, seed: u64) -> Self {
        let snapshot = FrameSnapshot::idle(threshold.get());
        Self {
            meter: LevelMeter::new(),
            state: GameState::new(),
            fireworks: Fireworks::new(),
            threshold,
            restart: RestartTimer::default(),
            fps: FpsCounter::default(),
            lane: Lane::default(),
            fireworks_enabled: true,
            rng: Pcg32::seed_from_u64(seed),
            last_ts: None,
            snapshot,
        }
    }

    pub fn attach_source(&mut self, source: S) -> Option<S> {
        self.meter.attach(source)
    }

    pub fn source_mut(&mut self) -> Option<&mut S> {
        self.meter.source_mut()
    }

    pub fn set_lane(&mut self, lane: Lane) {
        self.lane = lane;
    }

    pub fn lane(&self) -> Lane {
        self.lane
    }

    pub fn set_fireworks_enabled(&mut self, enabled: bool) {
        self.fireworks_enabled = enabled;
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn fireworks(&self) -> &Fireworks {
        &self.fireworks
    }

    pub fn restart_timer(&self) -> &RestartTimer {
        &self.restart
    }

    pub fn snapshot(&self) -> &FrameSnapshot {
        &self.snapshot
    }

    /// Republish the threshold marker from the shared cell without running a
    /// frame, for edits made while idle
    pub fn refresh_threshold(&mut self) -> &FrameSnapshot {
        self.snapshot.set_threshold(self.threshold.get());
        &self.snapshot
    }

    /// Whether the loop has been started and not torn down since
    pub fn is_running(&self) -> bool {
        self.last_ts.is_some()
    }

    /// Start action: fresh ball, playing
    pub fn start(&mut self, now_ms: f64) {
        self.restart.cancel();
        self.state.start();
        if self.last_ts.is_none() {
            self.last_ts = Some(now_ms);
        }
        self.snapshot.phase = self.state.phase;
        self.snapshot.y = self.state.ball.y;
        log::info!("Started (threshold {:.3})", self.threshold.get());
    }

    /// Run one frame at timestamp `now_ms`, drawing fireworks to `surface`
    pub fn frame<D: DrawSurface + ?Sized>(&mut self, now_ms: f64, surface: &mut D) -> &FrameSnapshot {
        // Frames outside a start/teardown span do not advance the clock
        let dt_ms = match self.last_ts {
            Some(last) => {
                self.last_ts = Some(now_ms);
                (now_ms - last).clamp(0.0, MAX_FRAME_DT_MS)
            }
            None => 0.0,
        };

        if self.restart.poll(now_ms) {
            self.state.restart();
            log::info!("Restarted after game over");
        }

        let level = self.meter.sample();
        let threshold = self.threshold.get();

        let outcome = tick(
            &mut self.state,
            &TickInput {
                now_ms,
                rms: level.rms,
                threshold,
                floor: self.lane.floor(),
            },
        );

        if outcome.bounced && self.fireworks_enabled {
            let origin = Vec2::new(
                self.rng.random::<f32>() * self.lane.width,
                FX_HEIGHT - 6.0,
            );
            self.fireworks.spawn(origin, &mut self.rng);
        }
        if outcome.game_over {
            self.restart.schedule(now_ms);
        }

        // Sparks keep decaying in every phase
        self.fireworks.advance(dt_ms as f32, surface);

        let threshold_db = rms_to_db(threshold);
        self.snapshot = FrameSnapshot {
            phase: self.state.phase,
            y: self.state.ball.y,
            bounces: self.state.bounces,
            level,
            level_unit: db_to_unit(level.db),
            threshold,
            threshold_db,
            threshold_unit: db_to_unit(threshold_db),
            bounced: outcome.bounced,
            game_over: outcome.game_over,
            dt_ms,
            bursts: self.fireworks.len(),
            fps: self.fps.record(now_ms),
        };
        &self.snapshot
    }

    /// Halt: cancel the pending restart, go idle and hand back the source so
    /// the caller can release it
    pub fn teardown(&mut self) -> Option<S> {
        self.restart.cancel();
        self.last_ts = None;
        self.state.phase = Phase::Idle;
        self.snapshot.phase = Phase::Idle;
        log::info!("Frame loop torn down");
        self.meter.detach()
    }
}
