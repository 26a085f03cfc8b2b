//! Core processing modules
//!
//! Text normalization and intent matching. Both are pure functions over
//! fixed rules; the stateful parts live in `session` and `playback`.

pub mod intent;
pub mod text_normalizer;

pub use intent::{match_intent, Intent, SpeedChange, VolumeChange};
pub use text_normalizer::TextNormalizer;
