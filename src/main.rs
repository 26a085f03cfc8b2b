//! VoiceVerse - Hands-free verse reader
//!
//! Listens for the wake word, takes spoken commands and reads verses aloud.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use voiceverse::asr::VoskTranscriber;
use voiceverse::audio::{self, AudioOutput, SoundEngine};
use voiceverse::config::Config;
use voiceverse::library::{ContentLookup, VerseLibrary};
use voiceverse::listener::Listener;
use voiceverse::playback::PlaybackQueue;
use voiceverse::session::Session;
use voiceverse::tts;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Audio input device index
    #[arg(short, long)]
    device: Option<usize>,

    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Setup logging
    let default_level = if args.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("📖 VoiceVerse v{} starting...", env!("CARGO_PKG_VERSION"));

    // Output is the one collaborator the process cannot run without
    let output: Arc<dyn AudioOutput> =
        Arc::new(SoundEngine::new().context("Cannot initialize audio output")?);
    let synthesizer = tts::create_engine(&config)?;
    let queue = PlaybackQueue::new(synthesizer, output)?;

    let library: Arc<dyn ContentLookup> =
        Arc::new(VerseLibrary::load(config.verses_path.as_deref().map(Path::new)));
    let mut session = Session::new(queue, library, &config);

    let cancel = Arc::new(AtomicBool::new(false));
    let audio_rx = audio::start_capture(args.device)?;
    info!("🎙️ Audio capture started");
    let transcriber = VoskTranscriber::new(&config, audio_rx, Arc::clone(&cancel))?;

    session.announce(&format!(
        "Verse reader ready. Say {} to activate.",
        config.wake_word
    ));

    let mut listener = Listener::new(transcriber, session, &config);
    let stop = Arc::clone(&cancel);
    let mut worker = tokio::task::spawn_blocking(move || listener.run(&stop));

    let interrupted = tokio::select! {
        _ = tokio::signal::ctrl_c() => true,
        result = &mut worker => {
            if let Err(e) = result {
                error!("❌ Listen loop ended abnormally: {}", e);
            }
            false
        }
    };

    if interrupted {
        info!("🛑 Shutting down...");
        cancel.store(true, Ordering::Relaxed);
        if let Err(e) = worker.await {
            error!("❌ Listen loop ended abnormally: {}", e);
        }
    }

    Ok(())
}
