//! Recording fakes and a harness for scenario tests on a paused clock.

#![allow(dead_code)]

use parking_lot::Mutex;
use shotclock::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Records every utterance with the time it started.
pub struct RecordingVoice {
    origin: Instant,
    hold: Duration,
    fail_on: Option<String>,
    audible: Mutex<Vec<(Duration, String)>>,
    silent: Mutex<usize>,
    cancels: watch::Sender<u64>,
}

impl RecordingVoice {
    pub fn new(origin: Instant, hold: Duration, fail_on: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            origin,
            hold,
            fail_on: fail_on.map(str::to_string),
            audible: Mutex::new(Vec::new()),
            silent: Mutex::new(0),
            cancels: watch::channel(0).0,
        })
    }

    pub fn spoken(&self) -> Vec<String> {
        self.audible.lock().iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn spoken_at(&self, text: &str) -> Vec<Duration> {
        self.audible
            .lock()
            .iter()
            .filter(|(_, t)| t == text)
            .map(|(at, _)| *at)
            .collect()
    }

    pub fn silent_count(&self) -> usize {
        *self.silent.lock()
    }
}

impl SpeechEngine for RecordingVoice {
    fn speak(&self, utterance: Utterance) -> SpeechFuture {
        let hold = if utterance.is_silent() {
            *self.silent.lock() += 1;
            Duration::from_millis(50)
        } else {
            self.audible
                .lock()
                .push((self.origin.elapsed(), utterance.text.clone()));
            self.hold
        };
        let fail = self.fail_on.as_deref() == Some(utterance.text.as_str());
        let mut cancels = self.cancels.subscribe();
        Box::pin(async move {
            if fail {
                return Err(SpeechError::VoiceUnavailable("test".into()));
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

/// Records every clip with the time it was queued.
pub struct RecordingSink {
    origin: Instant,
    clips: Mutex<Vec<(Duration, CueKind)>>,
}

impl RecordingSink {
    pub fn new(origin: Instant) -> Arc<Self> {
        Arc::new(Self {
            origin,
            clips: Mutex::new(Vec::new()),
        })
    }

    pub fn shot_cues(&self) -> Vec<Duration> {
        self.clips
            .lock()
            .iter()
            .filter(|(_, kind)| *kind == CueKind::Shot)
            .map(|(at, _)| *at)
            .collect()
    }

    pub fn power_ups(&self) -> Vec<(Duration, CueKind)> {
        self.clips
            .lock()
            .iter()
            .filter(|(_, kind)| matches!(kind, CueKind::PowerUp(_)))
            .copied()
            .collect()
    }
}

impl AudioSink for RecordingSink {
    fn play(&self, clip: Clip) {
        self.clips.lock().push((self.origin.elapsed(), clip.kind));
    }
}

pub struct Harness {
    pub engine: ShotclockEngine,
    pub voice: Arc<RecordingVoice>,
    pub audio: Arc<RecordingSink>,
    pub library: PatternLibrary,
    pub origin: Instant,
}

/// Test configuration: seeded, no debounce, no keep-alive.
pub fn config() -> ShotclockConfig {
    ShotclockConfig {
        toggle_debounce_ms: 0,
        seed: Some(42),
        keep_alive: shotclock::config::KeepAliveConfig {
            enabled: false,
            gap_ms: 100,
        },
        ..Default::default()
    }
}

pub fn settings(countdown: u32) -> WorkoutSettings {
    WorkoutSettings {
        countdown_seconds: countdown,
        ..Default::default()
    }
}

pub fn pattern(name: &str, shots: &[&str], interval: f64, limit: u32) -> Pattern {
    Pattern {
        name: name.to_string(),
        shot_list: shots.iter().map(|s| s.to_string()).collect(),
        shot_interval: interval,
        limit,
        ..Default::default()
    }
}

pub fn harness(settings: WorkoutSettings, patterns: Vec<Pattern>) -> Harness {
    harness_with(config(), settings, patterns, None)
}

pub fn harness_with(
    config: ShotclockConfig,
    settings: WorkoutSettings,
    patterns: Vec<Pattern>,
    fail_on: Option<&str>,
) -> Harness {
    let origin = Instant::now();
    let voice = RecordingVoice::new(origin, Duration::from_millis(200), fail_on);
    let audio = RecordingSink::new(origin);
    let library = PatternLibrary::new(settings, patterns);
    let engine = ShotclockEngine::spawn(
        config,
        Collaborators::from_library(library.clone(), voice.clone(), audio.clone()),
    );
    Harness {
        engine,
        voice,
        audio,
        library,
        origin,
    }
}

impl Harness {
    pub async fn run_to_completion(&self) -> StatusSnapshot {
        self.engine.start().unwrap();
        self.wait_completed().await
    }

    pub async fn wait_completed(&self) -> StatusSnapshot {
        self.engine
            .wait_for(|s| s.phase == PhaseKind::Completed)
            .await
            .unwrap()
    }

    /// Sleeps until `secs` after the harness was created.
    pub async fn at(&self, secs: f64) {
        tokio::time::sleep_until(self.origin + Duration::from_secs_f64(secs)).await;
    }

    pub fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

pub fn assert_near(actual: Duration, expected_secs: f64) {
    let diff = (actual.as_secs_f64() - expected_secs).abs();
    assert!(
        diff < 0.05,
        "expected ~{expected_secs}s, got {:.3}s",
        actual.as_secs_f64()
    );
}
