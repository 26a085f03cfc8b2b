//! Session State Machine
//!
//! Holds the current [`Mode`] and speech [`Settings`], consumes [`Event`]s
//! from the listen loop and turns them into mode transitions plus requests to
//! the [`PlaybackQueue`]. Every spoken side effect goes through the queue.
//!
//! Mode and settings are owned by the listen loop's thread. The playback
//! worker only ever sees settings copied into each request.

use crate::config::Config;
use crate::core::{Intent, SpeedChange, VolumeChange};
use crate::library::ContentLookup;
use crate::playback::{PlaybackQueue, Priority, RequestId};
use std::sync::Arc;
use tracing::{debug, error, info};

const GREETING: &str = "How can I help you?";
const PLAYBACK_STOPPED: &str = "Playback stopped";
const PAUSING: &str = "Pausing playback";
const RESUMING: &str = "Resuming playback";
const RETURNING_TO_SLEEP: &str = "Returning to sleep";
const PLEASE_REPEAT: &str = "Please repeat that";
const NOT_UNDERSTOOD: &str = "Command not understood";
const NOT_FOUND: &str = "Verse not found";
const NOTHING_TO_REPEAT: &str = "Nothing to repeat yet";
const HELP: &str = "You can say read followed by a verse, stop, pause, faster, slower, \
                    louder, softer, loop, shuffle, again, or stop listening.";

/// Reference that asks for any verse
const RANDOM_REFERENCE: &str = "random";

const VOLUME_STEP: f32 = 0.1;
const MIN_VOLUME: f32 = 0.0;
const MAX_VOLUME: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Dormant, listening only for the wake word
    #[default]
    Sleeping,
    /// Taking commands
    Active,
    /// Playback frozen, waiting for the wake word or "resume"
    Paused,
}

/// Speech settings, copied into every playback request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub speech_rate: f32,
    pub volume: f32,
    pub loop_enabled: bool,
    pub shuffle_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speech_rate: 1.0,
            volume: 1.0,
            loop_enabled: false,
            shuffle_enabled: false,
        }
    }
}

/// Allowed speech rate range and step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimits {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            min: 0.5,
            max: 2.0,
            step: 0.25,
        }
    }
}

impl Settings {
    /// Apply a speed change, clamped to `limits`. Returns whether the rate moved.
    pub fn adjust_speed(&mut self, change: SpeedChange, limits: &RateLimits) -> bool {
        let before = self.speech_rate;
        let next = match change {
            SpeedChange::Faster => before + limits.step,
            SpeedChange::Slower => before - limits.step,
            SpeedChange::Reset => 1.0,
        };
        self.speech_rate = next.clamp(limits.min, limits.max);
        (self.speech_rate - before).abs() > f32::EPSILON
    }

    /// Apply a volume change in steps of 10%. Returns whether the volume moved.
    pub fn adjust_volume(&mut self, change: VolumeChange) -> bool {
        let before = self.volume;
        let next = match change {
            VolumeChange::Louder => before + VOLUME_STEP,
            VolumeChange::Softer => before - VOLUME_STEP,
        };
        self.volume = ((next * 100.0).round() / 100.0).clamp(MIN_VOLUME, MAX_VOLUME);
        (self.volume - before).abs() > f32::EPSILON
    }
}

/// One input to the state machine, produced by the listen loop
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The wake word was heard outside of Active mode
    WakeWord,
    /// A recognized command
    Intent(Intent),
    /// Nobody spoke before the listen timeout
    ListenTimeout,
    /// Speech was heard but could not be transcribed
    Unintelligible,
    /// A collaborator failed outright
    HardFailure(String),
}

/// The single owner of mode, settings and the playback queue
pub struct Session {
    mode: Mode,
    settings: Settings,
    limits: RateLimits,
    wake_word: String,
    queue: PlaybackQueue,
    library: Arc<dyn ContentLookup>,
    last_reference: Option<String>,
    /// "Pausing playback" waits behind the pause gate; dropped on resume
    pause_ack: Option<RequestId>,
    /// Set when the last event ended in a hard failure
    failure: Option<String>,
}

impl Session {
    pub fn new(queue: PlaybackQueue, library: Arc<dyn ContentLookup>, config: &Config) -> Self {
        let limits = RateLimits {
            min: config.min_speech_rate,
            max: config.max_speech_rate,
            step: config.speech_rate_step,
        };
        let settings = Settings {
            volume: config.default_volume,
            speech_rate: 1.0_f32.clamp(limits.min, limits.max),
            ..Settings::default()
        };

        Self {
            mode: Mode::Sleeping,
            settings,
            limits,
            wake_word: config.wake_word.clone(),
            queue,
            library,
            last_reference: None,
            pause_ack: None,
            failure: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn wake_word(&self) -> &str {
        &self.wake_word
    }

    pub fn queue(&self) -> &PlaybackQueue {
        &self.queue
    }

    /// Speak a message outside of any transition, e.g. at startup
    pub fn announce(&mut self, text: &str) {
        self.speak(text, Priority::Normal);
    }

    /// Why the last handled event fell back to Sleeping, if it failed.
    /// Cleared by the call.
    pub fn take_failure(&mut self) -> Option<String> {
        self.failure.take()
    }

    /// Feed one event to the machine and return the resulting mode
    pub fn handle(&mut self, event: Event) -> Mode {
        let from = self.mode;
        self.failure = None;
        debug!("Event {:?} in {:?}", event, from);

        match from {
            Mode::Sleeping => self.handle_sleeping(event),
            Mode::Active => self.handle_active(event),
            Mode::Paused => self.handle_paused(event),
        }

        if self.mode != from {
            info!("🔀 {:?} -> {:?}", from, self.mode);
        }
        self.mode
    }

    /// Stop the worker and release every unplayed artifact
    pub fn shutdown(&mut self) {
        self.queue.shutdown();
    }

    fn handle_sleeping(&mut self, event: Event) {
        match event {
            Event::WakeWord => {
                self.mode = Mode::Active;
                self.speak(GREETING, Priority::Normal);
            }
            Event::HardFailure(reason) => self.fail(&reason),
            Event::Intent(_) | Event::ListenTimeout | Event::Unintelligible => {}
        }
    }

    fn handle_paused(&mut self, event: Event) {
        match event {
            Event::WakeWord | Event::Intent(Intent::Resume) => {
                self.mode = Mode::Active;
                self.resume_playback();
            }
            Event::HardFailure(reason) => self.fail(&reason),
            // Silent retry: only the wake word or "resume" leaves Paused
            Event::Intent(_) | Event::ListenTimeout | Event::Unintelligible => {}
        }
    }

    fn handle_active(&mut self, event: Event) {
        match event {
            Event::Intent(intent) => self.apply(intent),
            Event::ListenTimeout => {
                self.mode = Mode::Sleeping;
                self.speak(RETURNING_TO_SLEEP, Priority::Normal);
            }
            Event::Unintelligible => {
                self.speak(PLEASE_REPEAT, Priority::Normal);
            }
            Event::HardFailure(reason) => self.fail(&reason),
            Event::WakeWord => debug!("Wake word while already active"),
        }
    }

    fn apply(&mut self, intent: Intent) {
        match intent {
            Intent::Stop => {
                self.queue.stop_all();
                self.speak(PLAYBACK_STOPPED, Priority::Normal);
            }
            Intent::Pause => {
                self.mode = Mode::Paused;
                self.queue.pause();
                self.pause_ack = self.speak(PAUSING, Priority::Normal);
            }
            Intent::Resume => self.resume_playback(),
            Intent::Sleep => {
                self.mode = Mode::Sleeping;
                let message = format!("Going to sleep. Say {} to wake me.", self.wake_word);
                self.speak(&message, Priority::Normal);
            }
            Intent::SetSpeed(change) => {
                let moved = self.settings.adjust_speed(change, &self.limits);
                let message = match (change, moved) {
                    (SpeedChange::Reset, _) => "Normal speed set",
                    (SpeedChange::Faster, true) => "Faster speed set",
                    (SpeedChange::Faster, false) => "Already at maximum speed",
                    (SpeedChange::Slower, true) => "Slower speed set",
                    (SpeedChange::Slower, false) => "Already at minimum speed",
                };
                self.speak(message, Priority::Normal);
            }
            Intent::SetVolume(change) => {
                let message = if self.settings.adjust_volume(change) {
                    format!("Volume {} percent", (self.settings.volume * 100.0).round())
                } else if change == VolumeChange::Louder {
                    "Already at full volume".to_string()
                } else {
                    "Already at minimum volume".to_string()
                };
                self.speak(&message, Priority::Normal);
            }
            Intent::ToggleLoop => {
                self.settings.loop_enabled = !self.settings.loop_enabled;
                let message = format!("Loop mode turned {}", on_off(self.settings.loop_enabled));
                self.speak(&message, Priority::Normal);
            }
            Intent::ToggleShuffle => {
                self.settings.shuffle_enabled = !self.settings.shuffle_enabled;
                let message = format!("Shuffle turned {}", on_off(self.settings.shuffle_enabled));
                self.speak(&message, Priority::Normal);
            }
            Intent::Repeat => {
                let reference = if self.settings.shuffle_enabled {
                    self.library.random_reference()
                } else {
                    self.last_reference.clone()
                };
                match reference {
                    Some(reference) => self.read(&reference),
                    None => {
                        self.speak(NOTHING_TO_REPEAT, Priority::Normal);
                    }
                }
            }
            Intent::Help => {
                self.speak(HELP, Priority::Normal);
            }
            Intent::Lookup(reference) if reference == RANDOM_REFERENCE => {
                match self.library.random_reference() {
                    Some(reference) => self.read(&reference),
                    None => {
                        self.speak(NOT_FOUND, Priority::Normal);
                    }
                }
            }
            Intent::Lookup(reference) => self.read(&reference),
            Intent::Unrecognized => {
                self.speak(NOT_UNDERSTOOD, Priority::Normal);
            }
        }
    }

    fn read(&mut self, reference: &str) {
        match self.library.lookup(reference) {
            Some(text) => {
                info!("📖 Reading {}", reference);
                self.last_reference = Some(reference.to_string());
                let message = format!("Reading {}. {}", spoken_reference(reference), text);
                self.speak(&message, Priority::Interrupt);
            }
            None => {
                let message = match self.library.suggest(reference) {
                    Some(close) => format!("{}. Did you mean {}?", NOT_FOUND, spoken_reference(&close)),
                    None => NOT_FOUND.to_string(),
                };
                self.speak(&message, Priority::Normal);
            }
        }
    }

    fn resume_playback(&mut self) {
        if let Some(ack) = self.pause_ack.take() {
            self.queue.cancel(ack);
        }
        self.queue.resume();
        self.speak(RESUMING, Priority::Normal);
    }

    fn speak(&mut self, text: &str, priority: Priority) -> Option<RequestId> {
        match self.queue.enqueue(text, &self.settings, priority) {
            Ok(id) => Some(id),
            Err(e) => {
                self.fail(&format!("could not speak '{}': {}", text, e));
                None
            }
        }
    }

    /// Hard collaborator failure: log and fall back to Sleeping
    fn fail(&mut self, reason: &str) {
        error!("❌ {}", reason);
        if self.mode == Mode::Paused {
            // Nothing would ever lift the pause gate from Sleeping
            self.queue.stop_all();
            self.queue.resume();
        }
        self.pause_ack = None;
        self.mode = Mode::Sleeping;
        self.failure = Some(reason.to_string());
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

/// "john3:16" -> "john 3:16"
fn spoken_reference(reference: &str) -> String {
    let mut out = String::with_capacity(reference.len() + 1);
    let mut prev_alpha = false;
    for c in reference.chars() {
        if prev_alpha && c.is_ascii_digit() {
            out.push(' ');
        }
        prev_alpha = c.is_alphabetic();
        out.push(c);
    }
    out
}
