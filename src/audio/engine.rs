//! Sound Engine for spoken output
//!
//! Uses a channel-based architecture to handle rodio's non-Send stream.
//! The engine spawns a dedicated audio thread that owns the playback infrastructure.

use super::AudioOutput;
use crate::error::{VoiceError, VoiceResult};
use crate::tts::Artifact;
use rodio::Decoder;
use std::fs::File;
use std::io::BufReader;
use std::sync::mpsc;
use std::thread;
use tracing::{debug, error, info, warn};

type Source = Decoder<BufReader<File>>;

/// Commands sent to the audio thread
enum AudioCommand {
    Play(Source),
    IsBusy(mpsc::Sender<bool>),
    Stop,
    Pause,
    Resume,
    SetVolume(f32),
}

/// Thread-safe handle to the sound engine
#[derive(Clone)]
pub struct SoundEngine {
    sender: mpsc::Sender<AudioCommand>,
}

impl std::fmt::Debug for SoundEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundEngine").finish()
    }
}

impl SoundEngine {
    /// Start the audio thread. Fails if no output device can be opened.
    pub fn new() -> VoiceResult<Self> {
        let (sender, receiver) = mpsc::channel::<AudioCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || {
                Self::audio_thread(receiver, ready_tx);
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self { sender }),
            Ok(Err(e)) => Err(VoiceError::Audio(e)),
            Err(_) => Err(VoiceError::Audio(
                "audio thread exited during startup".to_string(),
            )),
        }
    }

    fn audio_thread(receiver: mpsc::Receiver<AudioCommand>, ready: mpsc::Sender<Result<(), String>>) {
        use rodio::OutputStream;

        let (stream, stream_handle) = match OutputStream::try_default() {
            Ok(s) => s,
            Err(e) => {
                warn!("🔇 Failed to initialize audio output: {}", e);
                let _ = ready.send(Err(format!("failed to open output: {}", e)));
                return;
            }
        };

        // Keep stream alive
        let _stream = stream;
        let mut sink = match rodio::Sink::try_new(&stream_handle) {
            Ok(s) => s,
            Err(e) => {
                error!("❌ Failed to create audio sink: {}", e);
                let _ = ready.send(Err(format!("failed to create sink: {}", e)));
                return;
            }
        };
        let mut volume = 1.0;

        let _ = ready.send(Ok(()));
        info!("🔊 Audio thread started");

        while let Ok(cmd) = receiver.recv() {
            match cmd {
                AudioCommand::Play(source) => {
                    sink.append(source);
                }
                AudioCommand::IsBusy(resp) => {
                    let _ = resp.send(!sink.empty());
                }
                AudioCommand::Stop => {
                    debug!("🛑 Stopping playback");
                    sink.stop();
                    // A stopped sink cannot be reused
                    match rodio::Sink::try_new(&stream_handle) {
                        Ok(new_sink) => {
                            new_sink.set_volume(volume);
                            sink = new_sink;
                        }
                        Err(e) => error!("❌ Failed to recreate audio sink: {}", e),
                    }
                }
                AudioCommand::Pause => sink.pause(),
                AudioCommand::Resume => sink.play(),
                AudioCommand::SetVolume(v) => {
                    volume = v;
                    sink.set_volume(v);
                }
            }
        }

        info!("🔇 Audio thread stopped");
    }

    fn send(&self, cmd: AudioCommand) {
        if self.sender.send(cmd).is_err() {
            warn!("Audio thread disconnected");
        }
    }
}

impl AudioOutput for SoundEngine {
    fn play(&self, artifact: &Artifact) -> VoiceResult<()> {
        let path = artifact.path();
        let file = File::open(path)?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| VoiceError::Audio(format!("cannot decode {:?}: {}", path, e)))?;

        debug!("🔊 Playing: {:?}", path.file_name().unwrap_or_default());
        self.sender
            .send(AudioCommand::Play(source))
            .map_err(|e| VoiceError::Audio(format!("Audio thread disconnected: {}", e)))
    }

    fn is_busy(&self) -> bool {
        let (tx, rx) = mpsc::channel();
        if self.sender.send(AudioCommand::IsBusy(tx)).is_err() {
            return false;
        }
        rx.recv().unwrap_or(false)
    }

    fn stop(&self) {
        self.send(AudioCommand::Stop);
    }

    fn pause(&self) {
        self.send(AudioCommand::Pause);
    }

    fn resume(&self) {
        self.send(AudioCommand::Resume);
    }

    fn set_volume(&self, volume: f32) {
        self.send(AudioCommand::SetVolume(volume.clamp(0.0, 1.0)));
    }
}
