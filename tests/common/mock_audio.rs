//! Mock audio output for testing
//!
//! Every artifact "plays" for a fixed duration of wall-clock time. Pausing
//! freezes the position the way a real sink does.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use voiceverse::audio::AudioOutput;
use voiceverse::error::{VoiceError, VoiceResult};
use voiceverse::tts::{Artifact, ArtifactId};

#[derive(Debug)]
struct Playing {
    id: ArtifactId,
    elapsed: Duration,
    since: Option<Instant>,
}

#[derive(Debug, Default)]
struct OutputState {
    current: Option<Playing>,
    played: Vec<ArtifactId>,
    paused: bool,
    stops: usize,
    volumes: Vec<f32>,
}

#[derive(Debug)]
pub struct MockOutput {
    duration: Duration,
    state: Mutex<OutputState>,
    failing_plays: AtomicUsize,
}

impl MockOutput {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            state: Mutex::new(OutputState::default()),
            failing_plays: AtomicUsize::new(0),
        }
    }

    /// Make the next `count` play calls fail
    pub fn fail_plays(&self, count: usize) {
        self.failing_plays.store(count, Ordering::SeqCst);
    }

    /// Every artifact started, in order (replays included)
    pub fn played(&self) -> Vec<ArtifactId> {
        self.state.lock().unwrap().played.clone()
    }

    pub fn play_count(&self, id: ArtifactId) -> usize {
        self.played().iter().filter(|p| **p == id).count()
    }

    pub fn current(&self) -> Option<ArtifactId> {
        self.state.lock().unwrap().current.as_ref().map(|p| p.id)
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }

    pub fn stops(&self) -> usize {
        self.state.lock().unwrap().stops
    }

    pub fn last_volume(&self) -> Option<f32> {
        self.state.lock().unwrap().volumes.last().copied()
    }
}

impl AudioOutput for MockOutput {
    fn play(&self, artifact: &Artifact) -> VoiceResult<()> {
        let failing = self.failing_plays.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_plays.store(failing - 1, Ordering::SeqCst);
            return Err(VoiceError::Audio("mock decode failure".to_string()));
        }

        let mut state = self.state.lock().unwrap();
        let since = if state.paused {
            None
        } else {
            Some(Instant::now())
        };
        state.current = Some(Playing {
            id: artifact.id(),
            elapsed: Duration::ZERO,
            since,
        });
        state.played.push(artifact.id());
        Ok(())
    }

    fn is_busy(&self) -> bool {
        let state = self.state.lock().unwrap();
        match &state.current {
            None => false,
            Some(playing) => match playing.since {
                None => true,
                Some(since) => playing.elapsed + since.elapsed() < self.duration,
            },
        }
    }

    fn stop(&self) {
        let mut state = self.state.lock().unwrap();
        state.current = None;
        state.stops += 1;
    }

    fn pause(&self) {
        let mut state = self.state.lock().unwrap();
        state.paused = true;
        if let Some(playing) = state.current.as_mut() {
            if let Some(since) = playing.since.take() {
                playing.elapsed += since.elapsed();
            }
        }
    }

    fn resume(&self) {
        let mut state = self.state.lock().unwrap();
        state.paused = false;
        if let Some(playing) = state.current.as_mut() {
            if playing.since.is_none() {
                playing.since = Some(Instant::now());
            }
        }
    }

    fn set_volume(&self, volume: f32) {
        self.state.lock().unwrap().volumes.push(volume);
    }
}
