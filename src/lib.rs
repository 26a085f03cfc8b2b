//! VoiceVerse Library
//!
//! Core modules for the VoiceVerse hands-free verse reader.

pub mod asr;
pub mod audio;
pub mod config;
pub mod core;
pub mod error;
pub mod library;
pub mod listener;
pub mod playback;
pub mod session;
pub mod tts;
