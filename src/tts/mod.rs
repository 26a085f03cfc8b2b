//! TTS (Text-to-Speech) Module
//!
//! Synthesizers turn an utterance into an [`Artifact`]: a transient audio file
//! that is played once by the playback worker and then released.

use crate::config::Config;
use crate::error::{VoiceError, VoiceResult};
use crate::session::Settings;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub mod piper;
pub mod system;

static NEXT_ARTIFACT_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_FILE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of a synthesized artifact, unique for the process lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactId(pub u64);

/// A synthesized, playable unit of audio.
///
/// Not `Clone`: whoever owns the artifact is the only one who can release it.
#[derive(Debug, PartialEq, Eq)]
pub struct Artifact {
    id: ArtifactId,
    path: PathBuf,
}

impl Artifact {
    /// Wrap a freshly written audio file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            id: ArtifactId(NEXT_ARTIFACT_ID.fetch_add(1, Ordering::Relaxed)),
            path: path.into(),
        }
    }

    pub fn id(&self) -> ArtifactId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the backing file. A file that is already gone counts as released.
    pub fn remove_file(&self) -> VoiceResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Trait for TTS engines
pub trait Synthesizer: Send + Sync {
    /// Synthesize `text` with the given speech settings
    fn synthesize(&self, text: &str, settings: &Settings) -> VoiceResult<Artifact>;

    /// Release the storage behind an artifact
    fn release(&self, artifact: &Artifact) -> VoiceResult<()> {
        artifact.remove_file()
    }

    /// Get the engine name
    fn name(&self) -> &str;
}

/// Path for a new artifact in the temp directory
pub(crate) fn artifact_path(engine: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "voiceverse_{}_{}_{}.wav",
        engine,
        std::process::id(),
        NEXT_FILE_ID.fetch_add(1, Ordering::Relaxed)
    ))
}

/// Factory to create the configured TTS engine
pub fn create_engine(config: &Config) -> VoiceResult<Arc<dyn Synthesizer>> {
    info!("🛠️ Creating TTS engine: {}", config.tts_engine);
    let engine: Arc<dyn Synthesizer> = match config.tts_engine.as_str() {
        "piper" => {
            info!("  - Using Piper TTS (Voice: {})", config.piper_voice);
            Arc::new(piper::PiperEngine::new(config)?)
        }
        "system" | "espeak" => {
            info!("  - Using System TTS (espeak-ng)");
            Arc::new(system::SystemEngine::new())
        }
        other => {
            warn!("  - Unknown engine '{}', falling back to System", other);
            Arc::new(system::SystemEngine::new())
        }
    };
    info!("✅ TTS engine '{}' initialized", engine.name());
    Ok(engine)
}

/// Map a failed synthesis subprocess to a TTS error
pub(crate) fn tts_error(engine: &str, detail: impl std::fmt::Display) -> VoiceError {
    VoiceError::Tts(format!("{}: {}", engine, detail))
}
