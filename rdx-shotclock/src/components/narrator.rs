//! Text-to-speech narration with interruption and a keep-alive loop.
//!
//! The `Narrator` does not own an audio device. It drives a `SpeechEngine`
//! backend and adds the behavior the scheduler relies on: a new utterance
//! interrupts the current one, interruptions count as success, and while the
//! session is running a loop of silent utterances keeps the backend warm.

use crate::config::KeepAliveConfig;
use crate::error::{NarrationError, SpeechError};
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Which voice to use and how fast it speaks.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceProfile {
    /// `None` selects the backend's default voice.
    pub voice: Option<String>,
    pub rate: f32,
}

impl VoiceProfile {
    /// Builds a profile, mapping an empty id or `"default"` to `None`.
    pub fn new(voice: &str, rate: f32) -> Self {
        let voice = match voice.trim() {
            "" => None,
            v if v.eq_ignore_ascii_case("default") => None,
            v => Some(v.to_string()),
        };
        Self { voice, rate }
    }
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self {
            voice: None,
            rate: 1.0,
        }
    }
}

/// A single request to the speech backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub voice: VoiceProfile,
    /// 0.0 for keep-alive utterances, 1.0 otherwise.
    pub volume: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>, voice: VoiceProfile) -> Self {
        Self {
            text: text.into(),
            voice,
            volume: 1.0,
        }
    }

    /// The near-silent utterance used by the keep-alive loop.
    pub fn silent() -> Self {
        Self {
            text: " ".to_string(),
            voice: VoiceProfile::default(),
            volume: 0.0,
        }
    }

    pub fn is_silent(&self) -> bool {
        self.volume <= 0.0
    }
}

/// Future returned by a speech backend; resolves when playback ends.
pub type SpeechFuture = Pin<Box<dyn Future<Output = Result<(), SpeechError>> + Send>>;

/// A text-to-speech backend.
///
/// `speak` must not block; the returned future resolves when playback ends.
/// `cancel` stops everything currently playing, and the futures of the
/// cancelled utterances resolve with `SpeechError::Interrupted`. Utterances
/// started after `cancel` returns are unaffected.
pub trait SpeechEngine: Send + Sync + 'static {
    fn speak(&self, utterance: Utterance) -> SpeechFuture;
    fn cancel(&self);
}

#[derive(Default)]
struct NarratorState {
    /// Keep-alive should run: the session is running and not paused.
    armed: bool,
    /// Bumped for every audible utterance.
    ticket: u64,
    keep_alive: Option<JoinHandle<()>>,
}

struct NarratorInner {
    engine: Arc<dyn SpeechEngine>,
    keep_alive: KeepAliveConfig,
    state: Mutex<NarratorState>,
}

/// Cloneable handle to the narration subsystem.
#[derive(Clone)]
pub struct Narrator {
    inner: Arc<NarratorInner>,
}

impl Narrator {
    pub fn new(engine: Arc<dyn SpeechEngine>, keep_alive: KeepAliveConfig) -> Self {
        Self {
            inner: Arc::new(NarratorInner {
                engine,
                keep_alive,
                state: Mutex::new(NarratorState::default()),
            }),
        }
    }

    /// Speaks `text`, interrupting whatever is playing.
    ///
    /// Blank text resolves at once without touching the backend. An
    /// interrupted utterance resolves `Ok`.
    pub async fn speak(&self, text: String, voice: VoiceProfile) -> Result<(), NarrationError> {
        if text.trim().is_empty() {
            return Ok(());
        }
        let ticket = self.begin_utterance();
        debug!(%text, rate = voice.rate, "narrating");
        let result = self
            .inner
            .engine
            .speak(Utterance::new(text.clone(), voice))
            .await;
        self.finish_utterance(ticket);
        match result {
            Ok(()) | Err(SpeechError::Interrupted) => Ok(()),
            Err(source) => Err(NarrationError { text, source }),
        }
    }

    /// Cancels in-flight playback, audible or silent.
    pub fn interrupt(&self) {
        {
            let mut state = self.inner.state.lock();
            state.ticket = state.ticket.wrapping_add(1);
            if let Some(task) = state.keep_alive.take() {
                task.abort();
            }
        }
        self.inner.engine.cancel();
    }

    /// Arms the keep-alive loop and starts it if nothing is playing.
    pub fn start_keep_alive(&self) {
        if !self.inner.keep_alive.enabled {
            return;
        }
        let mut state = self.inner.state.lock();
        state.armed = true;
        if state.keep_alive.is_none() {
            state.keep_alive = Some(spawn_keep_alive(self.inner.clone()));
        }
    }

    /// Disarms the keep-alive loop. No silent utterance starts after this.
    pub fn stop_keep_alive(&self) {
        let mut state = self.inner.state.lock();
        state.armed = false;
        if let Some(task) = state.keep_alive.take() {
            task.abort();
        }
    }

    pub fn is_keeping_alive(&self) -> bool {
        let state = self.inner.state.lock();
        state.keep_alive.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn begin_utterance(&self) -> u64 {
        let ticket = {
            let mut state = self.inner.state.lock();
            state.ticket = state.ticket.wrapping_add(1);
            if let Some(task) = state.keep_alive.take() {
                task.abort();
            }
            state.ticket
        };
        self.inner.engine.cancel();
        ticket
    }

    /// Restarts keep-alive after an audible utterance, unless a newer
    /// utterance has started since or the session is paused.
    fn finish_utterance(&self, ticket: u64) {
        let mut state = self.inner.state.lock();
        if state.armed && state.ticket == ticket && state.keep_alive.is_none() {
            state.keep_alive = Some(spawn_keep_alive(self.inner.clone()));
        }
    }
}

fn spawn_keep_alive(inner: Arc<NarratorInner>) -> JoinHandle<()> {
    trace!("keep-alive loop started");
    tokio::spawn(async move {
        let gap = inner.keep_alive.gap();
        loop {
            match inner.engine.speak(Utterance::silent()).await {
                Ok(()) => {}
                Err(SpeechError::Interrupted) => break,
                Err(e) => warn!(error = %e, "keep-alive utterance failed"),
            }
            tokio::time::sleep(gap).await;
        }
        trace!("keep-alive loop ended");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::watch;

    /// Records utterances and plays each for a fixed time.
    struct FakeEngine {
        spoken: Mutex<Vec<Utterance>>,
        hold: Duration,
        cancels: watch::Sender<u64>,
        fail_on: Option<String>,
    }

    impl FakeEngine {
        fn new(hold: Duration) -> Arc<Self> {
            Self::failing_on(hold, None)
        }

        fn failing_on(hold: Duration, text: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                spoken: Mutex::new(Vec::new()),
                hold,
                cancels: watch::channel(0).0,
                fail_on: text.map(str::to_string),
            })
        }

        fn audible(&self) -> Vec<String> {
            self.spoken
                .lock()
                .iter()
                .filter(|u| !u.is_silent())
                .map(|u| u.text.clone())
                .collect()
        }

        fn silent_count(&self) -> usize {
            self.spoken.lock().iter().filter(|u| u.is_silent()).count()
        }
    }

    impl SpeechEngine for FakeEngine {
        fn speak(&self, utterance: Utterance) -> SpeechFuture {
            let fail = self.fail_on.as_deref() == Some(utterance.text.as_str());
            self.spoken.lock().push(utterance);
            let hold = self.hold;
            let mut cancels = self.cancels.subscribe();
            Box::pin(async move {
                if fail {
                    return Err(SpeechError::Engine("boom".into()));
                }
                tokio::select! {
                    _ = tokio::time::sleep(hold) => Ok(()),
                    _ = cancels.changed() => Err(SpeechError::Interrupted),
                }
            })
        }

        fn cancel(&self) {
            self.cancels.send_modify(|n| *n += 1);
        }
    }

    fn keep_alive() -> KeepAliveConfig {
        KeepAliveConfig {
            enabled: true,
            gap_ms: 100,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn blank_text_resolves_without_audio() {
        let engine = FakeEngine::new(Duration::from_secs(1));
        let narrator = Narrator::new(engine.clone(), keep_alive());
        narrator
            .speak("   ".into(), VoiceProfile::default())
            .await
            .unwrap();
        assert!(engine.audible().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn newer_utterance_interrupts_older_one() {
        let engine = FakeEngine::new(Duration::from_secs(2));
        let narrator = Narrator::new(engine.clone(), keep_alive());

        let first = tokio::spawn({
            let n = narrator.clone();
            async move { n.speak("Left".into(), VoiceProfile::default()).await }
        });
        tokio::time::sleep(Duration::from_millis(500)).await;
        let started = tokio::time::Instant::now();
        narrator
            .speak("Right".into(), VoiceProfile::default())
            .await
            .unwrap();

        assert_eq!(first.await.unwrap(), Ok(()));
        assert_eq!(started.elapsed(), Duration::from_secs(2));
        assert_eq!(engine.audible(), vec!["Left", "Right"]);
    }

    #[tokio::test(start_paused = true)]
    async fn engine_errors_are_surfaced() {
        let engine = FakeEngine::failing_on(Duration::ZERO, Some("Drop shot"));
        let narrator = Narrator::new(engine, keep_alive());
        let err = narrator
            .speak("Drop shot".into(), VoiceProfile::default())
            .await
            .unwrap_err();
        assert_eq!(err.source, SpeechError::Engine("boom".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn keep_alive_runs_until_stopped() {
        let engine = FakeEngine::new(Duration::from_millis(100));
        let narrator = Narrator::new(engine.clone(), keep_alive());
        narrator.start_keep_alive();
        tokio::time::sleep(Duration::from_secs(1)).await;
        let while_running = engine.silent_count();
        assert!(while_running >= 3);

        narrator.stop_keep_alive();
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(engine.silent_count(), while_running);
        assert!(!narrator.is_keeping_alive());
    }

    #[tokio::test(start_paused = true)]
    async fn keep_alive_restarts_after_audible_utterance() {
        let engine = FakeEngine::new(Duration::from_millis(100));
        let narrator = Narrator::new(engine.clone(), keep_alive());
        narrator.start_keep_alive();
        narrator
            .speak("Rest".into(), VoiceProfile::default())
            .await
            .unwrap();
        assert!(narrator.is_keeping_alive());

        narrator.stop_keep_alive();
        narrator
            .speak("Rest".into(), VoiceProfile::default())
            .await
            .unwrap();
        assert!(!narrator.is_keeping_alive());
    }

    #[test]
    fn default_voice_maps_to_none() {
        assert_eq!(VoiceProfile::new("default", 1.0).voice, None);
        assert_eq!(VoiceProfile::new("", 1.0).voice, None);
        assert_eq!(
            VoiceProfile::new("Samantha", 0.9).voice.as_deref(),
            Some("Samantha")
        );
    }
}
