//! Intent Matching
//!
//! Maps a normalized transcript to a typed [`Intent`] using fixed keyword
//! rules evaluated in priority order. The first rule that fires wins.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

/// Direction of a speech rate change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedChange {
    Faster,
    Slower,
    Reset,
}

/// Direction of a volume change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeChange {
    Louder,
    Softer,
}

/// The classified meaning of a recognized utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Stop,
    Pause,
    Resume,
    Sleep,
    SetSpeed(SpeedChange),
    SetVolume(VolumeChange),
    ToggleLoop,
    ToggleShuffle,
    Repeat,
    Help,
    /// Canonical reference: lower-case, no whitespace (e.g. `john3:16`)
    Lookup(String),
    Unrecognized,
}

const STOP_KEYWORDS: &[&str] = &["stop", "cancel", "quiet", "silence"];
const STOP_LISTENING: &str = "stop listening";
const RESUME_KEYWORDS: &[&str] = &["resume", "continue"];
const SLEEP_KEYWORDS: &[&str] = &["sleep", STOP_LISTENING];
const FASTER_KEYWORDS: &[&str] = &["faster", "speed up"];
const SLOWER_KEYWORDS: &[&str] = &["slower", "slow down"];
const LOUDER_KEYWORDS: &[&str] = &["louder", "volume up"];
const SOFTER_KEYWORDS: &[&str] = &["softer", "quieter", "volume down"];
const REPEAT_KEYWORDS: &[&str] = &["again", "repeat"];
const HELP_KEYWORDS: &[&str] = &["help", "list commands", "what can i say"];

lazy_static! {
    static ref LOOKUP_PATTERN: Regex =
        Regex::new(r"\b(?:read|say|play)\s+([\w\s:]+)").expect("lookup pattern is valid");
}

/// Classify a normalized transcript
pub fn match_intent(text: &str) -> Intent {
    let intent = classify(text);
    debug!("Matched '{}' as {:?}", text, intent);
    intent
}

fn classify(text: &str) -> Intent {
    if is_stop(text) {
        return Intent::Stop;
    }

    if contains_phrase(text, "pause") {
        return Intent::Pause;
    }
    if contains_any(text, RESUME_KEYWORDS) {
        return Intent::Resume;
    }
    if contains_any(text, SLEEP_KEYWORDS) {
        return Intent::Sleep;
    }

    if contains_any(text, FASTER_KEYWORDS) {
        return Intent::SetSpeed(SpeedChange::Faster);
    }
    if contains_any(text, SLOWER_KEYWORDS) {
        return Intent::SetSpeed(SpeedChange::Slower);
    }
    if contains_phrase(text, "speed") {
        return Intent::SetSpeed(SpeedChange::Reset);
    }

    if contains_any(text, LOUDER_KEYWORDS) {
        return Intent::SetVolume(VolumeChange::Louder);
    }
    if contains_any(text, SOFTER_KEYWORDS) {
        return Intent::SetVolume(VolumeChange::Softer);
    }

    if contains_phrase(text, "loop") {
        return Intent::ToggleLoop;
    }
    if contains_phrase(text, "shuffle") {
        return Intent::ToggleShuffle;
    }
    if contains_any(text, REPEAT_KEYWORDS) {
        return Intent::Repeat;
    }
    if contains_any(text, HELP_KEYWORDS) {
        return Intent::Help;
    }

    if let Some(reference) = lookup_reference(text) {
        return Intent::Lookup(reference);
    }

    Intent::Unrecognized
}

/// Stop keywords win over everything, except that "stop listening" means sleep
fn is_stop(text: &str) -> bool {
    let padded = format!(" {} ", text).replace(&format!(" {} ", STOP_LISTENING), " ");
    contains_any(padded.trim(), STOP_KEYWORDS)
}

fn lookup_reference(text: &str) -> Option<String> {
    let captures = LOOKUP_PATTERN.captures(text)?;
    let reference: String = captures
        .get(1)?
        .as_str()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    if reference.is_empty() {
        None
    } else {
        Some(reference)
    }
}

/// Whole-word (or whole-phrase) containment
fn contains_phrase(text: &str, phrase: &str) -> bool {
    format!(" {} ", text).contains(&format!(" {} ", phrase))
}

fn contains_any(text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| contains_phrase(text, p))
}
