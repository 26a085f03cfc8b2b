//! VoiceVerse Error Types
//!
//! Centralized error handling for the collaborators and the core.

use thiserror::Error;

/// Central error type for VoiceVerse
#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("ASR engine error: {0}")]
    Asr(String),

    #[error("TTS engine error: {0}")]
    Tts(String),

    #[error("Audio output error: {0}")]
    Audio(String),

    #[error("Verse library error: {0}")]
    Library(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for VoiceVerse operations
pub type VoiceResult<T> = Result<T, VoiceError>;

