//! Audio level meter
//!
//! Turns one frame of time-domain samples into a loudness reading. Holds no
//! smoothing state of its own; any attack/release smoothing is done by the
//! source (the Web Audio analyser runs with a 0.2 smoothing constant).

use crate::consts::FRAME_SIZE;
use crate::rms_to_db;

/// Where audio frames come from.
///
/// Both reads are non-blocking polls of the most recent buffered samples.
pub trait SignalSource {
    /// Fill `out` with amplitudes in [-1, 1]
    fn read_float(&mut self, out: &mut [f32]);
    /// Fill `out` with unsigned 8-bit samples centered at 128
    fn read_bytes(&mut self, out: &mut [u8]);
}

/// Scratch buffers for one frame of audio, overwritten on every read
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub floats: Vec<f32>,
    pub bytes: Vec<u8>,
}

impl Default for AudioFrame {
    fn default() -> Self {
        Self::with_size(FRAME_SIZE)
    }
}

impl AudioFrame {
    pub fn with_size(size: usize) -> Self {
        Self {
            floats: vec![0.0; size],
            bytes: vec![128; size],
        }
    }

    pub fn len(&self) -> usize {
        self.floats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.floats.is_empty()
    }
}

/// One loudness reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoudnessSample {
    /// Root-mean-square amplitude, >= 0
    pub rms: f32,
    /// `rms` in decibels, always finite
    pub db: f32,
}

impl LoudnessSample {
    pub fn from_rms(rms: f32) -> Self {
        Self {
            rms,
            db: rms_to_db(rms),
        }
    }

    /// Reading reported when nothing is attached
    pub fn silent() -> Self {
        Self::from_rms(0.0)
    }
}

/// RMS of float samples. May be zero or non-finite for degenerate input.
pub fn float_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

/// RMS of unsigned 8-bit samples centered at 128, rescaled to [-1, 1]
pub fn byte_rms(samples: &[u8]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples
        .iter()
        .map(|&b| {
            let v = (b as f32 - 128.0) / 128.0;
            v * v
        })
        .sum();
    (sum / samples.len() as f32).sqrt()
}

/// Read one frame from `source` and compute its RMS.
///
/// Some backends leave the float path empty while still filling the byte
/// path, so a zero or non-finite float result falls back to the bytes.
pub fn frame_rms<S: SignalSource + ?Sized>(frame: &mut AudioFrame, source: &mut S) -> f32 {
    source.read_float(&mut frame.floats);
    let rms = float_rms(&frame.floats);
    if rms.is_finite() && rms != 0.0 {
        return rms;
    }

    source.read_bytes(&mut frame.bytes);
    byte_rms(&frame.bytes)
}

/// Level meter over an optional signal source
pub struct LevelMeter<S> {
    source: Option<S>,
    frame: AudioFrame,
}

impl<S> Default for LevelMeter<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> LevelMeter<S> {
    pub fn new() -> Self {
        Self {
            source: None,
            frame: AudioFrame::default(),
        }
    }

    /// Attach a source, returning the previous one (if any)
    pub fn attach(&mut self, source: S) -> Option<S> {
        self.source.replace(source)
    }

    pub fn detach(&mut self) -> Option<S> {
        self.source.take()
    }

    pub fn is_attached(&self) -> bool {
        self.source.is_some()
    }

    pub fn source_mut(&mut self) -> Option<&mut S> {
        self.source.as_mut()
    }
}

impl<S: SignalSource> LevelMeter<S> {
    /// Take a loudness reading of the current frame. Zero when detached.
    pub fn sample(&mut self) -> LoudnessSample {
        match self.source.as_mut() {
            Some(source) => LoudnessSample::from_rms(frame_rms(&mut self.frame, source)),
            None => LoudnessSample::silent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Source whose float path is broken but whose byte path works
    struct BrokenFloats {
        float_value: f32,
        byte_value: u8,
        byte_reads: u32,
    }

    impl SignalSource for BrokenFloats {
        fn read_float(&mut self, out: &mut [f32]) {
            out.fill(self.float_value);
        }

        fn read_bytes(&mut self, out: &mut [u8]) {
            self.byte_reads += 1;
            out.fill(self.byte_value);
        }
    }

    #[test]
    fn test_float_rms_constant_signal() {
        assert!((float_rms(&[0.5; 64]) - 0.5).abs() < 1e-6);
        assert!((float_rms(&[-0.25; 64]) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_byte_rms_centered_is_silent() {
        assert_eq!(byte_rms(&[128; 32]), 0.0);
        assert!((byte_rms(&[192; 32]) - 0.5).abs() < 1e-6);
        assert!((byte_rms(&[0; 32]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_buffers_are_zero() {
        assert_eq!(float_rms(&[]), 0.0);
        assert_eq!(byte_rms(&[]), 0.0);
    }

    #[test]
    fn test_zero_floats_fall_back_to_bytes() {
        let mut source = BrokenFloats {
            float_value: 0.0,
            byte_value: 160,
            byte_reads: 0,
        };
        let mut frame = AudioFrame::with_size(16);
        let rms = frame_rms(&mut frame, &mut source);
        assert_eq!(source.byte_reads, 1);
        assert!((rms - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_nan_floats_fall_back_to_bytes() {
        let mut source = BrokenFloats {
            float_value: f32::NAN,
            byte_value: 128,
            byte_reads: 0,
        };
        let mut frame = AudioFrame::with_size(16);
        let rms = frame_rms(&mut frame, &mut source);
        assert_eq!(source.byte_reads, 1);
        assert_eq!(rms, 0.0);
    }

    #[test]
    fn test_healthy_floats_skip_bytes() {
        let mut source = BrokenFloats {
            float_value: 0.3,
            byte_value: 0,
            byte_reads: 0,
        };
        let mut frame = AudioFrame::with_size(16);
        let rms = frame_rms(&mut frame, &mut source);
        assert_eq!(source.byte_reads, 0);
        assert!((rms - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_detached_meter_reports_silence() {
        let mut meter: LevelMeter<BrokenFloats> = LevelMeter::new();
        assert!(!meter.is_attached());
        let sample = meter.sample();
        assert_eq!(sample.rms, 0.0);
        assert!(sample.db.is_finite());
    }

    #[test]
    fn test_attached_meter_samples_source() {
        let mut meter = LevelMeter::new();
        meter.attach(BrokenFloats {
            float_value: 0.1,
            byte_value: 128,
            byte_reads: 0,
        });
        let sample = meter.sample();
        assert!((sample.rms - 0.1).abs() < 1e-6);
        assert!((sample.db + 20.0).abs() < 1e-3);
    }

    proptest! {
        #[test]
        fn prop_byte_fallback_never_negative(bytes in proptest::collection::vec(any::<u8>(), 1..256)) {
            let rms = byte_rms(&bytes);
            prop_assert!(rms.is_finite());
            prop_assert!(rms >= 0.0);
        }
    }
}
