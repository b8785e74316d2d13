//! Microphone input using the Web Audio API
//!
//! Wires `getUserMedia` into an `AnalyserNode` and exposes its time-domain
//! buffers as a [`SignalSource`].

use js_sys::{Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AnalyserNode, AudioContext, MediaStream, MediaStreamConstraints, MediaStreamTrack};

use crate::consts::{ANALYSER_SMOOTHING, FRAME_SIZE};
use crate::meter::SignalSource;

/// Message shown when setup fails
pub const PERMISSION_MESSAGE: &str = "Microphone access is required. Please allow it and reload.";

/// Microphone setup failures
#[derive(Debug, thiserror::Error)]
pub enum MicError {
    #[error("microphone capture is not supported here")]
    Unsupported,
    #[error("microphone permission denied: {0}")]
    PermissionDenied(String),
    #[error("audio graph setup failed: {0}")]
    AudioGraph(String),
}

fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

fn graph_err(value: JsValue) -> MicError {
    MicError::AudioGraph(describe(&value))
}

/// Live microphone feeding an analyser
pub struct MicInput {
    ctx: AudioContext,
    analyser: AnalyserNode,
    stream: MediaStream,
    closed: bool,
}

impl MicInput {
    /// Ask for the microphone and build `stream -> analyser`.
    ///
    /// Echo cancellation stays on; noise suppression and auto gain are off so
    /// the level reflects what the room actually sounds like.
    pub async fn open() -> Result<Self, MicError> {
        let window = web_sys::window().ok_or(MicError::Unsupported)?;
        let devices = window
            .navigator()
            .media_devices()
            .map_err(|_| MicError::Unsupported)?;

        let audio = Object::new();
        for (key, value) in [
            ("echoCancellation", true),
            ("noiseSuppression", false),
            ("autoGainControl", false),
        ] {
            Reflect::set(&audio, &JsValue::from_str(key), &JsValue::from_bool(value))
                .map_err(graph_err)?;
        }
        let constraints = MediaStreamConstraints::new();
        constraints.set_audio(&audio);

        let promise = devices
            .get_user_media_with_constraints(&constraints)
            .map_err(|e| MicError::PermissionDenied(describe(&e)))?;
        let stream: MediaStream = JsFuture::from(promise)
            .await
            .map_err(|e| MicError::PermissionDenied(describe(&e)))?
            .dyn_into()
            .map_err(graph_err)?;

        let ctx = AudioContext::new().map_err(graph_err)?;
        if let Ok(resume) = ctx.resume() {
            // Browsers start suspended until a user gesture; we are inside one
            let _ = JsFuture::from(resume).await;
        }

        let source = ctx.create_media_stream_source(&stream).map_err(graph_err)?;
        let analyser = ctx.create_analyser().map_err(graph_err)?;
        analyser.set_fft_size(FRAME_SIZE as u32);
        analyser.set_smoothing_time_constant(ANALYSER_SMOOTHING);
        source
            .connect_with_audio_node(&analyser)
            .map_err(graph_err)?;

        log::info!(
            "Microphone open ({} Hz, {} sample frames)",
            ctx.sample_rate(),
            analyser.fft_size()
        );

        Ok(Self {
            ctx,
            analyser,
            stream,
            closed: false,
        })
    }

    /// Stop every track and close the audio context. Safe to call twice.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        for track in self.stream.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.stop();
            }
        }
        if let Ok(promise) = self.ctx.close() {
            // Fire and forget; a rejected close is not actionable
            wasm_bindgen_futures::spawn_local(async move {
                let _ = JsFuture::from(promise).await;
            });
        }
        log::info!("Microphone closed");
    }
}

impl Drop for MicInput {
    fn drop(&mut self) {
        self.close();
    }
}

impl SignalSource for MicInput {
    fn read_float(&mut self, out: &mut [f32]) {
        self.analyser.get_float_time_domain_data(out);
    }

    fn read_bytes(&mut self, out: &mut [u8]) {
        self.analyser.get_byte_time_domain_data(out);
    }
}
