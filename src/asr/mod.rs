//! ASR (Automatic Speech Recognition) Module
//!
//! A [`Transcriber`] performs one blocking capture-and-transcribe cycle.

pub mod vosk;

use std::time::Duration;
use thiserror::Error;

pub use vosk::VoskTranscriber;

/// Why a listen cycle produced no text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListenError {
    /// Nobody started speaking before the timeout
    #[error("listen timed out")]
    Timeout,

    /// Speech was captured but could not be recognized
    #[error("speech unintelligible")]
    Unintelligible,

    /// The recognizer or capture device failed
    #[error("recognizer failure: {0}")]
    Hard(String),
}

/// Trait for ASR engines
pub trait Transcriber: Send {
    /// Capture one utterance and transcribe it.
    ///
    /// `timeout` bounds the wait for speech to begin (`None` waits until
    /// speech or cancellation); `phrase_limit` bounds the utterance itself.
    fn transcribe(
        &mut self,
        timeout: Option<Duration>,
        phrase_limit: Duration,
    ) -> Result<String, ListenError>;
}
