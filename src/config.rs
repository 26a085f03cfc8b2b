use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long a single capture may wait for speech, and how long a phrase may run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ListenProfile {
    /// Seconds to wait for speech to begin. `None` waits forever.
    pub timeout_secs: Option<u64>,
    /// Seconds a phrase may run once speech has started
    pub phrase_limit_secs: u64,
}

impl ListenProfile {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn phrase_limit(&self) -> Duration {
        Duration::from_secs(self.phrase_limit_secs)
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Speech
    pub wake_word: String,
    pub tts_engine: String,
    pub piper_voice: String,
    pub vosk_model_path: String,

    // Listening
    pub sleeping_listen: ListenProfile,
    pub active_listen: ListenProfile,
    pub paused_listen: ListenProfile,
    pub error_backoff_ms: u64,

    // Speech settings
    pub min_speech_rate: f32,
    pub max_speech_rate: f32,
    pub speech_rate_step: f32,
    pub default_volume: f32,

    // Content
    pub verses_path: Option<String>,

    // Meta
    pub log_level: String,

    // Data
    pub voice_corrections: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wake_word: "bible".to_string(),
            tts_engine: "piper".to_string(),
            piper_voice: "en_GB-cori-high".to_string(),
            vosk_model_path: dirs::data_dir()
                .unwrap_or_default()
                .join("voiceverse/models/vosk-model-small-en-us")
                .to_string_lossy()
                .to_string(),
            sleeping_listen: ListenProfile {
                timeout_secs: Some(3),
                phrase_limit_secs: 2,
            },
            active_listen: ListenProfile {
                timeout_secs: Some(5),
                phrase_limit_secs: 5,
            },
            paused_listen: ListenProfile {
                timeout_secs: None,
                phrase_limit_secs: 2,
            },
            error_backoff_ms: 1000,
            min_speech_rate: 0.5,
            max_speech_rate: 2.0,
            speech_rate_step: 0.25,
            default_volume: 1.0,
            verses_path: None,
            log_level: "info".to_string(),
            voice_corrections: HashMap::new(),
        }
    }
}

impl Config {
    /// Load config from the default location, or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load config from an explicit path.
    ///
    /// A missing file yields the defaults. A file that fails to parse is moved
    /// aside to `*.json.corrupt` and the defaults are used.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str::<Self>(&content) {
            Ok(config) => Ok(config.sanitized()),
            Err(e) => {
                tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                let backup_path = path.with_extension("json.corrupt");
                let _ = std::fs::rename(path, &backup_path);
                Ok(Self::default())
            }
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Repair values a hand-edited file may have broken
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.min_speech_rate <= 0.0 || self.min_speech_rate > self.max_speech_rate {
            tracing::warn!(
                "⚠️ Invalid speech rate range {}..{}, using defaults",
                self.min_speech_rate,
                self.max_speech_rate
            );
            self.min_speech_rate = defaults.min_speech_rate;
            self.max_speech_rate = defaults.max_speech_rate;
        }
        if self.speech_rate_step <= 0.0 {
            self.speech_rate_step = defaults.speech_rate_step;
        }
        self.default_volume = self.default_volume.clamp(0.0, 1.0);
        if self.wake_word.trim().is_empty() {
            self.wake_word = defaults.wake_word;
        }
        self.wake_word = self.wake_word.trim().to_lowercase();
        self
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("voiceverse")
        .join("config.json")
}
