//! Listen Loop Driver
//!
//! Runs one capture/transcribe cycle per iteration with the timeouts of the
//! current mode, classifies the outcome into an [`Event`] and hands it to the
//! [`Session`].

use crate::asr::{ListenError, Transcriber};
use crate::config::{Config, ListenProfile};
use crate::core::{match_intent, TextNormalizer};
use crate::session::{Event, Mode, Session};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Listen timeouts for each mode
#[derive(Debug, Clone, Copy)]
pub struct ListenProfiles {
    pub sleeping: ListenProfile,
    pub active: ListenProfile,
    pub paused: ListenProfile,
}

impl ListenProfiles {
    pub fn from_config(config: &Config) -> Self {
        Self {
            sleeping: config.sleeping_listen,
            active: config.active_listen,
            paused: config.paused_listen,
        }
    }

    pub fn for_mode(&self, mode: Mode) -> ListenProfile {
        match mode {
            Mode::Sleeping => self.sleeping,
            Mode::Active => self.active,
            Mode::Paused => self.paused,
        }
    }
}

/// Turn a normalized transcript into a state machine event.
///
/// Outside of Active mode the wake word is all that matters; the intent is
/// still classified so Paused can react to "resume".
pub fn classify(mode: Mode, text: &str, wake_word: &str) -> Event {
    let wake = format!(" {} ", wake_word);
    if mode != Mode::Active && format!(" {} ", text).contains(&wake) {
        return Event::WakeWord;
    }
    Event::Intent(match_intent(text))
}

pub struct Listener<T: Transcriber> {
    transcriber: T,
    session: Session,
    normalizer: TextNormalizer,
    /// The wake word as it looks after normalization
    wake_word: String,
    profiles: ListenProfiles,
    error_backoff: Duration,
}

impl<T: Transcriber> Listener<T> {
    pub fn new(transcriber: T, session: Session, config: &Config) -> Self {
        let normalizer = TextNormalizer::new(config.voice_corrections.clone());
        let wake_word = match normalizer.normalize(&config.wake_word) {
            normalized if normalized.is_empty() => config.wake_word.clone(),
            normalized => normalized,
        };
        if wake_word != config.wake_word {
            debug!("Wake word '{}' is heard as '{}'", config.wake_word, wake_word);
        }

        Self {
            transcriber,
            session,
            normalizer,
            wake_word,
            profiles: ListenProfiles::from_config(config),
            error_backoff: Duration::from_millis(config.error_backoff_ms),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// One listen cycle. Returns the mode after the event was handled.
    pub fn run_once(&mut self) -> Mode {
        let outcome = self.listen();
        self.dispatch(outcome)
    }

    /// Loop until `stop` is set, then tear the session down
    pub fn run(&mut self, stop: &AtomicBool) {
        info!("✅ Listening - say '{}' to activate", self.session.wake_word());
        while !stop.load(Ordering::Relaxed) {
            let outcome = self.listen();
            if stop.load(Ordering::Relaxed) {
                debug!("Discarding listen outcome after stop: {:?}", outcome);
                break;
            }
            self.dispatch(outcome);
        }
        info!("👋 Listen loop stopped");
        self.session.shutdown();
    }

    fn listen(&mut self) -> Result<String, ListenError> {
        let mode = self.session.mode();
        let profile = self.profiles.for_mode(mode);

        match mode {
            Mode::Sleeping => debug!("💤 Sleeping - say '{}' to activate", self.session.wake_word()),
            Mode::Active => debug!("👂 Ready for commands"),
            Mode::Paused => debug!("⏸️ Paused - say '{}' or 'resume'", self.session.wake_word()),
        }

        self.transcriber
            .transcribe(profile.timeout(), profile.phrase_limit())
    }

    fn dispatch(&mut self, outcome: Result<String, ListenError>) -> Mode {
        let event = match outcome {
            Ok(raw) => {
                let text = self.normalizer.normalize(&raw);
                info!("📝 Heard: '{}'", text);
                classify(self.session.mode(), &text, &self.wake_word)
            }
            Err(ListenError::Timeout) => Event::ListenTimeout,
            Err(ListenError::Unintelligible) => Event::Unintelligible,
            Err(ListenError::Hard(reason)) => {
                warn!("⚠️ Recognizer failure: {}", reason);
                Event::HardFailure(reason)
            }
        };

        let next = self.session.handle(event);
        if let Some(reason) = self.session.take_failure() {
            debug!("Backing off {:?} after failure: {}", self.error_backoff, reason);
            std::thread::sleep(self.error_backoff);
        }
        next
    }
}
