//! Mock TTS Engine for Testing
//!
//! Counts created and released artifacts and records what was synthesized.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use voiceverse::error::{VoiceError, VoiceResult};
use voiceverse::session::Settings;
use voiceverse::tts::{Artifact, ArtifactId, Synthesizer};

#[derive(Debug, Clone)]
pub struct Synthesized {
    pub id: ArtifactId,
    pub text: String,
    pub settings: Settings,
}

/// Mock TTS engine that records synthesized text and releases
#[derive(Debug, Default)]
pub struct MockTts {
    synthesized: Mutex<Vec<Synthesized>>,
    released: Mutex<Vec<ArtifactId>>,
    release_attempts: AtomicUsize,
    /// Fail every synthesis while set
    pub should_fail: AtomicBool,
    /// Number of upcoming release calls that fail
    pub failing_releases: AtomicUsize,
}

impl MockTts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    pub fn fail_releases(&self, count: usize) {
        self.failing_releases.store(count, Ordering::SeqCst);
    }

    pub fn synthesized(&self) -> Vec<Synthesized> {
        self.synthesized.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.synthesized().into_iter().map(|s| s.text).collect()
    }

    pub fn created_ids(&self) -> Vec<ArtifactId> {
        self.synthesized().into_iter().map(|s| s.id).collect()
    }

    /// Artifact id of the first utterance containing `text`
    pub fn id_of(&self, text: &str) -> Option<ArtifactId> {
        self.synthesized()
            .into_iter()
            .find(|s| s.text.contains(text))
            .map(|s| s.id)
    }

    pub fn was_spoken(&self, text: &str) -> bool {
        self.id_of(text).is_some()
    }

    pub fn last(&self) -> Option<Synthesized> {
        self.synthesized().last().cloned()
    }

    pub fn released(&self) -> Vec<ArtifactId> {
        self.released.lock().unwrap().clone()
    }

    pub fn is_released(&self, id: ArtifactId) -> bool {
        self.released().contains(&id)
    }

    pub fn release_attempts(&self) -> usize {
        self.release_attempts.load(Ordering::SeqCst)
    }
}

impl Synthesizer for MockTts {
    fn synthesize(&self, text: &str, settings: &Settings) -> VoiceResult<Artifact> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(VoiceError::Tts("Mock TTS failure".to_string()));
        }
        let artifact = Artifact::new(format!("/nonexistent/mock_{}.wav", text.len()));
        self.synthesized.lock().unwrap().push(Synthesized {
            id: artifact.id(),
            text: text.to_string(),
            settings: *settings,
        });
        Ok(artifact)
    }

    fn release(&self, artifact: &Artifact) -> VoiceResult<()> {
        self.release_attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing_releases.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_releases.store(failing - 1, Ordering::SeqCst);
            return Err(VoiceError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "mock release failure",
            )));
        }
        self.released.lock().unwrap().push(artifact.id());
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
