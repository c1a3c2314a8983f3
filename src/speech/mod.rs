//! Text-to-speech read-back of extraction results.
//!
//! - eSpeak NG synthesizes a WAV file per job
//! - a command-line player (default `aplay`) plays it
//! - a single background worker serializes playback and cleans up audio files

mod backend;
mod espeak;
mod notifier;
mod player;

pub use backend::{AudioPlayer, Playback, SpeechError, SpeechSynthesizer};
pub use espeak::EspeakSynthesizer;
pub use notifier::{SpeechJob, SpeechNotifier, SpeechWorker, WorkerOptions};
pub use player::CommandPlayer;
