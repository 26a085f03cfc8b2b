//! Mock transcriber for testing
//!
//! Replays a script of listen outcomes and records the timeouts it was given.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use voiceverse::asr::{ListenError, Transcriber};

pub type ListenCall = (Option<Duration>, Duration);

pub struct MockAsr {
    script: VecDeque<Result<String, ListenError>>,
    /// Every (timeout, phrase_limit) the loop asked for
    pub calls: Arc<Mutex<Vec<ListenCall>>>,
    /// Set once the script runs out
    stop_when_done: Option<Arc<AtomicBool>>,
}

impl MockAsr {
    pub fn new(script: Vec<Result<String, ListenError>>) -> Self {
        Self {
            script: script.into(),
            calls: Arc::new(Mutex::new(Vec::new())),
            stop_when_done: None,
        }
    }

    /// Raise `flag` when the last scripted outcome has been returned
    pub fn stopping(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_when_done = Some(flag);
        self
    }

    pub fn heard(text: &str) -> Result<String, ListenError> {
        Ok(text.to_string())
    }
}

impl Transcriber for MockAsr {
    fn transcribe(
        &mut self,
        timeout: Option<Duration>,
        phrase_limit: Duration,
    ) -> Result<String, ListenError> {
        self.calls.lock().unwrap().push((timeout, phrase_limit));
        let outcome = self.script.pop_front().unwrap_or(Err(ListenError::Timeout));
        if self.script.is_empty() {
            if let Some(flag) = &self.stop_when_done {
                flag.store(true, Ordering::SeqCst);
            }
        }
        outcome
    }
}
