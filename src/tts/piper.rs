//! Piper TTS backend calling a local binary

use super::{artifact_path, tts_error, Artifact, Synthesizer};
use crate::config::Config;
use crate::error::VoiceResult;
use crate::session::Settings;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, error, warn};

#[derive(Debug)]
pub struct PiperEngine {
    model_path: PathBuf,
}

impl PiperEngine {
    pub fn new(config: &Config) -> VoiceResult<Self> {
        let data_dir = dirs::data_dir().unwrap_or_default().join("voiceverse/voices");
        let model_path = data_dir.join(format!("{}.onnx", config.piper_voice));

        if !model_path.exists() {
            warn!("⚠️ Piper model not found at {}", model_path.display());
        }

        Ok(Self { model_path })
    }
}

/// Piper slows speech down as the length scale grows
fn length_scale(speech_rate: f32) -> f32 {
    1.0 / speech_rate.max(0.1)
}

impl Synthesizer for PiperEngine {
    fn synthesize(&self, text: &str, settings: &Settings) -> VoiceResult<Artifact> {
        if !self.model_path.exists() {
            return Err(tts_error(
                "piper",
                format!("model file missing: {}", self.model_path.display()),
            ));
        }

        let wav_path = artifact_path("piper");
        debug!("📢 Piper synthesizing into {:?}: '{}'", wav_path, text);

        let mut child = Command::new("piper-tts")
            .arg("-m")
            .arg(&self.model_path)
            .arg("-f")
            .arg(&wav_path)
            .arg("--length_scale")
            .arg(format!("{:.2}", length_scale(settings.speech_rate)))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                error!("❌ Failed to spawn piper-tts: {}", e);
                tts_error("piper", format!("failed to spawn piper-tts: {}", e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
            stdin.flush()?;
        }

        let status = child.wait()?;
        if !status.success() {
            let _ = std::fs::remove_file(&wav_path);
            return Err(tts_error("piper", format!("exited with status {}", status)));
        }

        if !wav_path.exists() {
            return Err(tts_error("piper", "output file not created"));
        }

        Ok(Artifact::new(wav_path))
    }

    fn name(&self) -> &str {
        "piper"
    }
}
