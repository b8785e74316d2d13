//! Synthetic signal source
//!
//! Produces square-wave frames on a fixed schedule so the meter and the frame
//! loop can run without a microphone (native demo, tests).

use crate::meter::SignalSource;

/// Samples per half period of the square wave
const HALF_PERIOD: usize = 16;

/// Square-wave source with an on/off "clap" schedule measured in frames
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    amplitude: f32,
    /// Schedule length in frames (0 = always on)
    period: u32,
    /// Loud frames at the start of each period
    on_frames: u32,
    /// Frames read so far
    frame: u32,
    /// When false the float path yields zeros, like a backend that only fills
    /// the byte path
    float_path: bool,
    /// Level of the most recent frame, reused by the byte path
    current: f32,
}

impl SyntheticSource {
    pub fn silence() -> Self {
        Self::constant(0.0)
    }

    /// Always on at `amplitude` (RMS equals `amplitude`)
    pub fn constant(amplitude: f32) -> Self {
        Self {
            amplitude: amplitude.clamp(0.0, 1.0),
            period: 0,
            on_frames: 0,
            frame: 0,
            float_path: true,
            current: 0.0,
        }
    }

    /// Loud for `on_frames` frames out of every `period` frames
    pub fn claps(amplitude: f32, period: u32, on_frames: u32) -> Self {
        Self {
            period,
            on_frames: on_frames.min(period),
            ..Self::constant(amplitude)
        }
    }

    /// Leave the float path empty so readers must use the byte path
    pub fn without_float_path(mut self) -> Self {
        self.float_path = false;
        self
    }

    /// Frames read so far
    pub fn frames_read(&self) -> u32 {
        self.frame
    }

    fn level_for(&self, frame: u32) -> f32 {
        if self.period == 0 || frame % self.period < self.on_frames {
            self.amplitude
        } else {
            0.0
        }
    }

    fn sample(level: f32, i: usize) -> f32 {
        if (i / HALF_PERIOD) % 2 == 0 { level } else { -level }
    }
}

impl SignalSource for SyntheticSource {
    fn read_float(&mut self, out: &mut [f32]) {
        self.current = self.level_for(self.frame);
        self.frame = self.frame.wrapping_add(1);

        if !self.float_path {
            out.fill(0.0);
            return;
        }
        for (i, s) in out.iter_mut().enumerate() {
            *s = Self::sample(self.current, i);
        }
    }

    fn read_bytes(&mut self, out: &mut [u8]) {
        for (i, b) in out.iter_mut().enumerate() {
            let v = Self::sample(self.current, i);
            *b = (128.0 + v * 128.0).round().clamp(0.0, 255.0) as u8;
        }
    }
}
