//! Background read-back of extracted text.
//!
//! Requests hand text to a [`SpeechNotifier`], which enqueues it without
//! waiting. A single [`SpeechWorker`] task drains the bounded queue, so at
//! most one clip plays at a time and overflow is dropped instead of piling up
//! concurrent players.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use super::backend::{AudioPlayer, SpeechError, SpeechSynthesizer};
use super::espeak::EspeakSynthesizer;
use super::player::CommandPlayer;
use crate::config::SpeechSettings;
use crate::language::LanguageMap;

/// One piece of text to read aloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechJob {
    pub text: String,
    /// Speech engine language code (`en`, `hi`, ...).
    pub language: String,
}

/// Queue and playback tuning.
#[derive(Debug, Clone, Copy)]
pub struct WorkerOptions {
    pub queue_capacity: usize,
    pub poll_interval: Duration,
    pub playback_timeout: Duration,
}

impl From<&SpeechSettings> for WorkerOptions {
    fn from(settings: &SpeechSettings) -> Self {
        Self {
            queue_capacity: settings.queue_capacity.max(1),
            // tokio's interval panics on a zero period
            poll_interval: settings.poll_interval.max(Duration::from_millis(1)),
            playback_timeout: settings.playback_timeout,
        }
    }
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self::from(&SpeechSettings::default())
    }
}

/// Cheap, cloneable handle used by request handlers to queue speech.
#[derive(Clone)]
pub struct SpeechNotifier {
    sender: Option<mpsc::Sender<SpeechJob>>,
    languages: LanguageMap,
}

impl SpeechNotifier {
    /// Start a worker and return the handle that feeds it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        player: Arc<dyn AudioPlayer>,
        languages: LanguageMap,
        options: WorkerOptions,
    ) -> (Self, SpeechWorker) {
        let (sender, receiver) = mpsc::channel(options.queue_capacity.max(1));
        let handle = tokio::spawn(run_worker(receiver, synthesizer, player, options));

        let notifier = Self {
            sender: Some(sender),
            languages,
        };
        (notifier, SpeechWorker { handle })
    }

    /// A notifier that never speaks.
    pub fn disabled(languages: LanguageMap) -> Self {
        Self {
            sender: None,
            languages,
        }
    }

    /// eSpeak NG and the configured player, or a disabled notifier.
    pub fn from_settings(
        settings: &SpeechSettings,
        languages: LanguageMap,
    ) -> (Self, Option<SpeechWorker>) {
        if !settings.enabled {
            tracing::info!("Speech read-back disabled");
            return (Self::disabled(languages), None);
        }

        let synthesizer = EspeakSynthesizer::new(&settings.espeak_cmd);
        let player = CommandPlayer::new(&settings.player_cmd, settings.player_args.clone());
        if !synthesizer.is_available() {
            tracing::warn!(
                "{} not found; speech requests will fail",
                settings.espeak_cmd.display()
            );
        }
        if !player.is_available() {
            tracing::warn!(
                "{} not found; speech requests will fail",
                settings.player_cmd.display()
            );
        }

        let (notifier, worker) = Self::spawn(
            Arc::new(synthesizer),
            Arc::new(player),
            languages,
            WorkerOptions::from(settings),
        );
        (notifier, Some(worker))
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Queue `text` for read-back without waiting.
    ///
    /// `language` may be a client or an OCR engine code; it is normalized to
    /// the speech engine's code space. Returns whether the job was accepted.
    pub fn notify(&self, text: &str, language: &str) -> bool {
        let Some(ref sender) = self.sender else {
            tracing::debug!("Speech disabled, not reading back {} chars", text.len());
            return false;
        };

        let job = SpeechJob {
            text: text.to_string(),
            language: self.languages.speech_code(language),
        };

        match sender.try_send(job) {
            Ok(()) => true,
            Err(TrySendError::Full(job)) => {
                tracing::warn!(
                    "Speech queue full, dropping {} chars of {} text",
                    job.text.len(),
                    job.language
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!("Speech worker has stopped, dropping read-back");
                false
            }
        }
    }
}

/// The background task that plays queued speech.
pub struct SpeechWorker {
    handle: JoinHandle<()>,
}

impl SpeechWorker {
    /// Wait for the worker to drain its queue.
    /// Returns once every [`SpeechNotifier`] clone has been dropped.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            if !e.is_cancelled() {
                tracing::error!("Speech worker panicked: {}", e);
            }
        }
    }

    /// Stop immediately, killing any player in progress.
    pub async fn abort(self) {
        self.handle.abort();
        self.join().await;
    }
}

async fn run_worker(
    mut receiver: mpsc::Receiver<SpeechJob>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    player: Arc<dyn AudioPlayer>,
    options: WorkerOptions,
) {
    tracing::debug!(
        "Speech worker started ({} via {})",
        synthesizer.name(),
        player.name()
    );

    while let Some(job) = receiver.recv().await {
        if let Err(e) = speak(&job, synthesizer.as_ref(), player.as_ref(), &options).await {
            tracing::error!("TTS error: {}", e);
        }
    }

    tracing::debug!("Speech worker stopped");
}

/// Synthesize and play one job; the audio file is removed whatever happens.
async fn speak(
    job: &SpeechJob,
    synthesizer: &dyn SpeechSynthesizer,
    player: &dyn AudioPlayer,
    options: &WorkerOptions,
) -> Result<(), SpeechError> {
    let audio = tempfile::Builder::new()
        .prefix("readaloud-")
        .suffix(".wav")
        .tempfile()?
        .into_temp_path();

    let result = synthesize_and_play(job, &audio, synthesizer, player, options).await;

    let path = audio.to_path_buf();
    if let Err(e) = audio.close() {
        tracing::warn!("Failed to remove {}: {}", path.display(), e);
    }
    result
}

async fn synthesize_and_play(
    job: &SpeechJob,
    audio: &Path,
    synthesizer: &dyn SpeechSynthesizer,
    player: &dyn AudioPlayer,
    options: &WorkerOptions,
) -> Result<(), SpeechError> {
    synthesizer.synthesize(&job.text, &job.language, audio).await?;

    let mut playback = player.play(audio).await?;
    let started = Instant::now();
    let mut ticker = tokio::time::interval(options.poll_interval);

    loop {
        ticker.tick().await;
        if !playback.is_busy()? {
            break;
        }
        if started.elapsed() >= options.playback_timeout {
            tracing::warn!(
                "Playback still running after {}s, stopping",
                options.playback_timeout.as_secs()
            );
            playback.stop().await?;
            break;
        }
    }

    tracing::debug!(
        "Read back {} chars ({}) in {}ms",
        job.text.len(),
        job.language,
        started.elapsed().as_millis()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::backend::Playback;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Semaphore;

    #[derive(Default)]
    struct FakeSynth {
        calls: Mutex<Vec<SpeechJob>>,
        outputs: Mutex<Vec<PathBuf>>,
        fail: bool,
        /// When set, each synthesis waits for a permit.
        gate: Option<Arc<Semaphore>>,
        started: AtomicUsize,
    }

    #[async_trait]
    impl SpeechSynthesizer for FakeSynth {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn synthesize(
            &self,
            text: &str,
            language: &str,
            output: &Path,
        ) -> Result<(), SpeechError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            if let Some(ref gate) = self.gate {
                gate.acquire().await.unwrap().forget();
            }
            self.calls.lock().unwrap().push(SpeechJob {
                text: text.to_string(),
                language: language.to_string(),
            });
            self.outputs.lock().unwrap().push(output.to_path_buf());
            if self.fail {
                // espeak can leave a partial file behind
                std::fs::write(output, b"partial")?;
                return Err(SpeechError::ToolFailed {
                    tool: "espeak-ng".to_string(),
                    message: "unknown voice".to_string(),
                });
            }
            std::fs::write(output, b"RIFF")?;
            Ok(())
        }
    }

    /// Plays for a fixed number of polls; `None` never finishes.
    struct FakePlayer {
        busy_polls: Option<usize>,
        played: Arc<Mutex<Vec<(PathBuf, bool)>>>,
        stopped: Arc<AtomicUsize>,
    }

    impl FakePlayer {
        fn new(busy_polls: Option<usize>) -> Self {
            Self {
                busy_polls,
                played: Arc::new(Mutex::new(Vec::new())),
                stopped: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    struct FakePlayback {
        remaining: Option<usize>,
        stopped: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Playback for FakePlayback {
        fn is_busy(&mut self) -> Result<bool, SpeechError> {
            match self.remaining {
                None => Ok(true),
                Some(0) => Ok(false),
                Some(ref mut n) => {
                    *n -= 1;
                    Ok(true)
                }
            }
        }

        async fn stop(&mut self) -> Result<(), SpeechError> {
            self.stopped.fetch_add(1, Ordering::SeqCst);
            self.remaining = Some(0);
            Ok(())
        }
    }

    #[async_trait]
    impl AudioPlayer for FakePlayer {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn play(&self, path: &Path) -> Result<Box<dyn Playback>, SpeechError> {
            self.played
                .lock()
                .unwrap()
                .push((path.to_path_buf(), path.exists()));
            Ok(Box::new(FakePlayback {
                remaining: self.busy_polls,
                stopped: self.stopped.clone(),
            }))
        }
    }

    fn fast_options() -> WorkerOptions {
        WorkerOptions {
            queue_capacity: 4,
            poll_interval: Duration::from_millis(1),
            playback_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_plays_and_removes_audio() {
        let synth = Arc::new(FakeSynth::default());
        let player = FakePlayer::new(Some(3));
        let played = player.played.clone();

        let (notifier, worker) = SpeechNotifier::spawn(
            synth.clone(),
            Arc::new(player),
            LanguageMap::default(),
            fast_options(),
        );
        assert!(notifier.notify("HELLO", "eng"));
        drop(notifier);
        worker.join().await;

        assert_eq!(
            *synth.calls.lock().unwrap(),
            vec![SpeechJob {
                text: "HELLO".to_string(),
                language: "en".to_string(),
            }]
        );
        let played = played.lock().unwrap();
        assert_eq!(played.len(), 1);
        let (path, existed) = &played[0];
        assert!(existed, "audio should exist while playing");
        assert!(!path.exists(), "audio should be removed afterwards");
    }

    #[tokio::test]
    async fn test_jobs_play_in_order() {
        let synth = Arc::new(FakeSynth::default());
        let (notifier, worker) = SpeechNotifier::spawn(
            synth.clone(),
            Arc::new(FakePlayer::new(Some(0))),
            LanguageMap::default(),
            fast_options(),
        );
        assert!(notifier.notify("one", "hin"));
        assert!(notifier.notify("two", "mar"));
        drop(notifier);
        worker.join().await;

        let calls = synth.calls.lock().unwrap();
        let spoken: Vec<_> = calls
            .iter()
            .map(|j| (j.text.as_str(), j.language.as_str()))
            .collect();
        assert_eq!(spoken, vec![("one", "hi"), ("two", "mr")]);
    }

    #[tokio::test]
    async fn test_synthesis_failure_skips_playback() {
        let synth = Arc::new(FakeSynth {
            fail: true,
            ..Default::default()
        });
        let player = FakePlayer::new(Some(0));
        let played = player.played.clone();

        let (notifier, worker) = SpeechNotifier::spawn(
            synth.clone(),
            Arc::new(player),
            LanguageMap::default(),
            fast_options(),
        );
        assert!(notifier.notify("text", "eng"));
        assert!(notifier.notify("more", "eng"));
        drop(notifier);
        worker.join().await;

        // Each job is attempted once and the worker keeps going
        assert_eq!(synth.calls.lock().unwrap().len(), 2);
        assert!(played.lock().unwrap().is_empty());

        let outputs = synth.outputs.lock().unwrap();
        assert_eq!(outputs.len(), 2);
        for path in outputs.iter() {
            assert!(!path.exists(), "{} left behind", path.display());
        }
    }

    #[tokio::test]
    async fn test_playback_timeout_stops_player() {
        let player = FakePlayer::new(None);
        let played = player.played.clone();
        let stopped = player.stopped.clone();

        let options = WorkerOptions {
            playback_timeout: Duration::from_millis(20),
            ..fast_options()
        };
        let (notifier, worker) = SpeechNotifier::spawn(
            Arc::new(FakeSynth::default()),
            Arc::new(player),
            LanguageMap::default(),
            options,
        );
        assert!(notifier.notify("stuck", "eng"));
        drop(notifier);
        worker.join().await;

        assert_eq!(stopped.load(Ordering::SeqCst), 1);
        let played = played.lock().unwrap();
        assert!(!played[0].0.exists());
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let gate = Arc::new(Semaphore::new(0));
        let synth = Arc::new(FakeSynth {
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let options = WorkerOptions {
            queue_capacity: 1,
            ..fast_options()
        };
        let (notifier, worker) = SpeechNotifier::spawn(
            synth.clone(),
            Arc::new(FakePlayer::new(Some(0))),
            LanguageMap::default(),
            options,
        );

        // First job is picked up by the worker and blocks in synthesis
        assert!(notifier.notify("first", "eng"));
        while synth.started.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(notifier.notify("second", "eng"));
        assert!(!notifier.notify("third", "eng"));

        gate.add_permits(2);
        drop(notifier);
        worker.join().await;

        let calls = synth.calls.lock().unwrap();
        let texts: Vec<_> = calls.iter().map(|j| j.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_worker_options_clamp_settings() {
        let settings = SpeechSettings {
            queue_capacity: 0,
            poll_interval: Duration::ZERO,
            ..Default::default()
        };
        let options = WorkerOptions::from(&settings);
        assert_eq!(options.queue_capacity, 1);
        assert_eq!(options.poll_interval, Duration::from_millis(1));
    }

    #[tokio::test]
    async fn test_zero_poll_interval_still_plays() {
        let synth = Arc::new(FakeSynth::default());
        let settings = SpeechSettings {
            poll_interval: Duration::ZERO,
            ..Default::default()
        };
        let (notifier, worker) = SpeechNotifier::spawn(
            synth.clone(),
            Arc::new(FakePlayer::new(Some(2))),
            LanguageMap::default(),
            WorkerOptions::from(&settings),
        );
        assert!(notifier.notify("one", "eng"));
        drop(notifier);
        worker.join().await;

        assert_eq!(synth.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_notifier() {
        let notifier = SpeechNotifier::disabled(LanguageMap::default());
        assert!(!notifier.is_enabled());
        assert!(!notifier.notify("HELLO", "eng"));
    }

    #[tokio::test]
    async fn test_notify_after_worker_stopped() {
        let (notifier, worker) = SpeechNotifier::spawn(
            Arc::new(FakeSynth::default()),
            Arc::new(FakePlayer::new(Some(0))),
            LanguageMap::default(),
            fast_options(),
        );
        worker.abort().await;
        assert!(!notifier.notify("late", "eng"));
    }
}
