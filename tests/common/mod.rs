#![allow(dead_code)]

pub mod mock_asr;
pub mod mock_audio;
pub mod mock_tts;

use mock_audio::MockOutput;
use mock_tts::MockTts;
use std::sync::Arc;
use std::time::{Duration, Instant};
use voiceverse::audio::AudioOutput;
use voiceverse::config::Config;
use voiceverse::library::{ContentLookup, VerseLibrary};
use voiceverse::playback::PlaybackQueue;
use voiceverse::session::Session;
use voiceverse::tts::Synthesizer;

/// Long enough that nothing finishes on its own during a test
pub const LONG: Duration = Duration::from_secs(30);

/// Poll `cond` until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}

pub fn wait(cond: impl FnMut() -> bool) -> bool {
    wait_until(Duration::from_secs(5), cond)
}

pub struct TestContext {
    pub tts: Arc<MockTts>,
    pub output: Arc<MockOutput>,
}

impl TestContext {
    /// Mocks whose artifacts each play for `duration`
    pub fn new(duration: Duration) -> Self {
        Self {
            tts: Arc::new(MockTts::new()),
            output: Arc::new(MockOutput::new(duration)),
        }
    }

    pub fn queue(&self) -> PlaybackQueue {
        let synthesizer: Arc<dyn Synthesizer> = self.tts.clone();
        let output: Arc<dyn AudioOutput> = self.output.clone();
        PlaybackQueue::new(synthesizer, output).expect("Failed to start playback queue")
    }

    pub fn session(&self) -> Session {
        self.session_with(&Config::default())
    }

    pub fn session_with(&self, config: &Config) -> Session {
        let library: Arc<dyn ContentLookup> = Arc::new(VerseLibrary::with_samples());
        Session::new(self.queue(), library, config)
    }
}
