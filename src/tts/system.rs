//! System fallback TTS engine (espeak-ng writing a WAV file)

use super::{artifact_path, tts_error, Artifact, Synthesizer};
use crate::error::VoiceResult;
use crate::session::Settings;
use std::process::{Command, Stdio};
use tracing::debug;

/// espeak-ng's default speaking rate in words per minute
const BASE_WORDS_PER_MINUTE: f32 = 175.0;

#[derive(Debug)]
pub struct SystemEngine;

impl Default for SystemEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemEngine {
    pub fn new() -> Self {
        Self
    }
}

fn words_per_minute(speech_rate: f32) -> u32 {
    (BASE_WORDS_PER_MINUTE * speech_rate).round().max(80.0) as u32
}

impl Synthesizer for SystemEngine {
    fn synthesize(&self, text: &str, settings: &Settings) -> VoiceResult<Artifact> {
        let wav_path = artifact_path("espeak");
        debug!("System synthesizing into {:?}: {}", wav_path, text);

        let status = Command::new("espeak-ng")
            .arg("-s")
            .arg(words_per_minute(settings.speech_rate).to_string())
            .arg("-w")
            .arg(&wav_path)
            .arg(text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| tts_error("espeak-ng", format!("not available: {}", e)))?;

        if !status.success() || !wav_path.exists() {
            let _ = std::fs::remove_file(&wav_path);
            return Err(tts_error("espeak-ng", format!("exited with status {}", status)));
        }

        Ok(Artifact::new(wav_path))
    }

    fn name(&self) -> &str {
        "system"
    }
}
