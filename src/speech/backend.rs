//! Speech synthesis and audio playback abstractions.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from speech synthesis or playback.
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("{0} not found")]
    ToolNotFound(String),

    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns text into an audio file.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Check if this synthesizer can run (binary installed).
    fn is_available(&self) -> bool;

    /// Write speech for `text` in `language` (speech engine code) to `output`.
    async fn synthesize(&self, text: &str, language: &str, output: &Path)
        -> Result<(), SpeechError>;
}

/// Starts playback of audio files.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Check if this player can run (binary installed).
    fn is_available(&self) -> bool;

    /// Begin playing `path`. Returns immediately with a handle to the playback.
    async fn play(&self, path: &Path) -> Result<Box<dyn Playback>, SpeechError>;
}

/// A playback in progress.
#[async_trait]
pub trait Playback: Send {
    /// `true` while audio is still playing.
    /// Returns an error if playback ended unsuccessfully.
    fn is_busy(&mut self) -> Result<bool, SpeechError>;

    /// Stop playback and release the output device.
    async fn stop(&mut self) -> Result<(), SpeechError>;
}
