//! Audio devices
//!
//! Microphone capture (cpal) and the single output stream the playback
//! worker drives (rodio).

pub mod capture;
pub mod engine;

use crate::error::VoiceResult;
use crate::tts::Artifact;

pub use capture::start_capture;
pub use engine::SoundEngine;

/// A single audio output stream.
///
/// Everything except `play` is fire-and-forget. `play` only starts playback;
/// callers poll `is_busy` to learn when the artifact has finished.
pub trait AudioOutput: Send + Sync {
    /// Start playing an artifact. Fails if it cannot be opened or decoded.
    fn play(&self, artifact: &Artifact) -> VoiceResult<()>;

    /// Whether an artifact is loaded and not yet finished (paused counts as busy)
    fn is_busy(&self) -> bool;

    /// Halt playback immediately and drop whatever was loaded
    fn stop(&self);

    /// Freeze the playback position
    fn pause(&self);

    /// Continue from the frozen position
    fn resume(&self);

    /// Volume in `[0, 1]`
    fn set_volume(&self, volume: f32);
}
