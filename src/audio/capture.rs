//! Audio capture module using cpal

use crate::error::{VoiceError, VoiceResult};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::{info, warn};

pub const SAMPLE_RATE: u32 = 16000;
const CHUNK_SIZE: usize = 1024;

fn audio_error(e: impl std::fmt::Display) -> VoiceError {
    VoiceError::Audio(e.to_string())
}

/// Start audio capture and return a receiver for audio chunks
pub fn start_capture(device_index: Option<usize>) -> VoiceResult<Receiver<Vec<i16>>> {
    let host = cpal::default_host();

    info!("Available audio input devices:");
    for (i, device) in host.input_devices().map_err(audio_error)?.enumerate() {
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let marker = if device_index == Some(i) { "*" } else { " " };
        info!("  {} [{}] {}", marker, i, name);
    }

    let device = if let Some(idx) = device_index {
        host.input_devices()
            .map_err(audio_error)?
            .nth(idx)
            .ok_or_else(|| VoiceError::Audio(format!("Device index {} out of range", idx)))?
    } else {
        host.default_input_device()
            .ok_or_else(|| VoiceError::Audio("No default input device".to_string()))?
    };

    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    info!("🎙️ Using audio device: {}", device_name);

    let config = cpal::StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(SAMPLE_RATE),
        buffer_size: cpal::BufferSize::Fixed(CHUNK_SIZE as u32),
    };

    let (tx, rx): (Sender<Vec<i16>>, Receiver<Vec<i16>>) = mpsc::channel();

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                // The listener may be gone during shutdown
                let _ = tx.send(data.to_vec());
            },
            |err| {
                warn!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(audio_error)?;

    stream.play().map_err(audio_error)?;

    // The stream must outlive every listen cycle and cpal streams are not Send,
    // so it is leaked for the process lifetime.
    std::mem::forget(stream);

    Ok(rx)
}

/// Drop every chunk captured so far, e.g. our own voice from the speakers
pub fn drain(rx: &Receiver<Vec<i16>>) -> usize {
    rx.try_iter().count()
}
