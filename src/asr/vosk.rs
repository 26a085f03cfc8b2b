//! Vosk-based transcriber fed by the cpal microphone capture

use super::{ListenError, Transcriber};
use crate::audio::capture::{self, SAMPLE_RATE};
use crate::config::Config;
use crate::error::{VoiceError, VoiceResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use vosk::{DecodingState, Model, Recognizer};

/// How long one wait on the capture channel may block
const CHUNK_WAIT: Duration = Duration::from_millis(100);

/// Vosk-based ASR engine
pub struct VoskTranscriber {
    recognizer: Recognizer,
    audio_rx: Receiver<Vec<i16>>,
    cancel: Arc<AtomicBool>,
}

impl VoskTranscriber {
    /// Load the model and attach to an audio capture channel
    pub fn new(
        config: &Config,
        audio_rx: Receiver<Vec<i16>>,
        cancel: Arc<AtomicBool>,
    ) -> VoiceResult<Self> {
        let model_path = std::path::PathBuf::from(&config.vosk_model_path);

        if !model_path.exists() {
            return Err(VoiceError::Asr(format!(
                "Vosk model not found at {}",
                model_path.display()
            )));
        }

        info!("Loading Vosk model from: {}", model_path.display());

        let model_str = model_path.to_str().ok_or_else(|| {
            VoiceError::Asr(format!(
                "Vosk model path is not valid UTF-8: {}",
                model_path.display()
            ))
        })?;

        let model = Model::new(model_str)
            .ok_or_else(|| VoiceError::Asr("Failed to load Vosk model".to_string()))?;
        let recognizer = Recognizer::new(&model, SAMPLE_RATE as f32)
            .ok_or_else(|| VoiceError::Asr("Failed to create Vosk recognizer".to_string()))?;

        Ok(Self {
            recognizer,
            audio_rx,
            cancel,
        })
    }

    fn final_text(&mut self) -> Option<String> {
        let result = self.recognizer.final_result();
        result.single().and_then(|single| extract_text(single.text))
    }
}

impl Transcriber for VoskTranscriber {
    fn transcribe(
        &mut self,
        timeout: Option<Duration>,
        phrase_limit: Duration,
    ) -> Result<String, ListenError> {
        // Whatever was captured while we were speaking is not a command
        let stale = capture::drain(&self.audio_rx);
        if stale > 0 {
            debug!("Discarded {} stale audio chunks", stale);
        }
        self.recognizer.reset();

        let started = Instant::now();
        let mut speech_started: Option<Instant> = None;

        loop {
            if self.cancel.load(Ordering::Relaxed) {
                return Err(ListenError::Timeout);
            }

            match speech_started {
                None if timeout.is_some_and(|t| started.elapsed() >= t) => {
                    return Err(ListenError::Timeout);
                }
                Some(at) if at.elapsed() >= phrase_limit => {
                    return self.final_text().ok_or(ListenError::Unintelligible);
                }
                _ => {}
            }

            let samples = match self.audio_rx.recv_timeout(CHUNK_WAIT) {
                Ok(samples) => samples,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(ListenError::Hard("audio capture disconnected".to_string()));
                }
            };

            match self.recognizer.accept_waveform(&samples) {
                DecodingState::Finalized => {
                    if let Some(text) = self.final_text() {
                        return Ok(text);
                    }
                    if speech_started.is_some() {
                        return Err(ListenError::Unintelligible);
                    }
                }
                DecodingState::Running => {
                    let partial = self.recognizer.partial_result().partial;
                    if speech_started.is_none() && !partial.trim().is_empty() {
                        debug!("Speech started: {}", partial);
                        speech_started = Some(Instant::now());
                    }
                }
                DecodingState::Failed => {
                    debug!("Decoding failed for this chunk");
                }
            }
        }
    }
}

/// Extract text from Vosk result, filtering empty results
fn extract_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
