//! Synthesized audio cues: the two-tone shot cue and the power-up ramp.
//!
//! Cues are rendered to mono `f32` PCM and handed to an `AudioSink`, which
//! owns the output device. Rendering is cheap and happens on the caller; the
//! sink must queue playback and return immediately.

use crate::config::CueConfig;
use crate::pattern::SplitStepHint;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Number of rising steps in a power-up ramp.
pub const POWER_UP_STEPS: u32 = 8;
/// Frequency ratio between consecutive ramp steps.
pub const POWER_UP_STEP_RATIO: f32 = 1.15;
/// Ramp base frequency at pitch 1.0.
pub const POWER_UP_BASE_HZ: f32 = 440.0;

/// A concrete power-up speed, after `SplitStepHint::Random` is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerUpSpeed {
    Slow,
    Medium,
    Fast,
}

impl PowerUpSpeed {
    pub const ALL: [PowerUpSpeed; 3] = [
        PowerUpSpeed::Slow,
        PowerUpSpeed::Medium,
        PowerUpSpeed::Fast,
    ];

    /// Length of a single ramp step.
    pub fn step_duration(self) -> Duration {
        match self {
            PowerUpSpeed::Slow => Duration::from_millis(80),
            PowerUpSpeed::Medium => Duration::from_millis(60),
            PowerUpSpeed::Fast => Duration::from_millis(40),
        }
    }

    /// Length of the whole ramp; the cue starts this long before the shot cue.
    pub fn total_duration(self) -> Duration {
        self.step_duration() * POWER_UP_STEPS
    }
}

impl SplitStepHint {
    /// Picks the speed for one interval. `Random` chooses uniformly.
    pub fn resolve<R: Rng + ?Sized>(self, rng: &mut R) -> Option<PowerUpSpeed> {
        match self {
            SplitStepHint::None => None,
            SplitStepHint::Slow => Some(PowerUpSpeed::Slow),
            SplitStepHint::Medium => Some(PowerUpSpeed::Medium),
            SplitStepHint::Fast => Some(PowerUpSpeed::Fast),
            SplitStepHint::Random => {
                Some(PowerUpSpeed::ALL[rng.gen_range(0..PowerUpSpeed::ALL.len())])
            }
        }
    }
}

/// What a clip is, for sinks that want to label or skip cues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueKind {
    Shot,
    PowerUp(PowerUpSpeed),
}

/// Rendered mono PCM.
#[derive(Debug, Clone)]
pub struct Clip {
    pub kind: CueKind,
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl Clip {
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let nanos = self.samples.len() as u64 * 1_000_000_000 / u64::from(self.sample_rate);
        Duration::from_nanos(nanos)
    }
}

/// An audio output. `play` must not block.
pub trait AudioSink: Send + Sync + 'static {
    fn play(&self, clip: Clip);
}

/// Amplitude shape applied over one tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Envelope {
    /// Full level, fading linearly to silence over the last `release`
    /// fraction of the tone.
    Release { release: f32 },
    /// Linear rise over the first `attack` fraction, linear fall after.
    AttackDecay { attack: f32 },
}

impl Envelope {
    fn gain(self, position: f32) -> f32 {
        match self {
            Envelope::Release { release } => {
                let start = 1.0 - release.clamp(0.0, 1.0);
                if position <= start || release <= 0.0 {
                    1.0
                } else {
                    ((1.0 - position) / release).clamp(0.0, 1.0)
                }
            }
            Envelope::AttackDecay { attack } => {
                let attack = attack.clamp(f32::EPSILON, 1.0);
                if position < attack {
                    position / attack
                } else if attack >= 1.0 {
                    1.0
                } else {
                    ((1.0 - position) / (1.0 - attack)).clamp(0.0, 1.0)
                }
            }
        }
    }
}

/// Renders a sine tone with the given envelope.
pub fn render_tone(
    freq_hz: f32,
    duration: Duration,
    sample_rate: u32,
    volume: f32,
    envelope: Envelope,
) -> Vec<f32> {
    let sr = sample_rate as f32;
    let total = (duration.as_secs_f32() * sr).round() as usize;
    (0..total)
        .map(|n| {
            let t = n as f32 / sr;
            let position = n as f32 / total as f32;
            (TAU * freq_hz * t).sin() * envelope.gain(position) * volume
        })
        .collect()
}

/// Plays the drill's audio cues through an `AudioSink`.
#[derive(Clone)]
pub struct CuePlayer {
    sink: Arc<dyn AudioSink>,
    config: CueConfig,
    shot: Arc<Vec<f32>>,
}

impl CuePlayer {
    pub fn new(sink: Arc<dyn AudioSink>, config: CueConfig) -> Self {
        let shot = Arc::new(render_shot_cue(&config));
        Self { sink, config, shot }
    }

    /// Two tones back-to-back.
    pub fn play_shot_cue(&self) {
        trace!("shot cue");
        self.sink.play(Clip {
            kind: CueKind::Shot,
            sample_rate: self.config.sample_rate,
            samples: self.shot.as_ref().clone(),
        });
    }

    /// The split-step ramp. Callers resolve the pattern's hint first, with
    /// the session's random source, since the speed also places the cue.
    pub fn play_power_up(&self, speed: PowerUpSpeed) {
        trace!(?speed, "power-up cue");
        self.sink.play(Clip {
            kind: CueKind::PowerUp(speed),
            sample_rate: self.config.sample_rate,
            samples: render_power_up(&self.config, speed),
        });
    }
}

fn render_shot_cue(config: &CueConfig) -> Vec<f32> {
    let tone = Duration::from_millis(config.shot_tone_ms);
    config
        .shot_tones_hz
        .iter()
        .flat_map(|&hz| {
            render_tone(
                hz,
                tone,
                config.sample_rate,
                config.volume,
                Envelope::Release { release: 0.3 },
            )
        })
        .collect()
}

/// Step `k` plays at `base × 1.15^k`, each with its own attack/decay.
fn render_power_up(config: &CueConfig, speed: PowerUpSpeed) -> Vec<f32> {
    let base = POWER_UP_BASE_HZ * config.pitch;
    (0..POWER_UP_STEPS)
        .flat_map(|step| {
            let hz = base * POWER_UP_STEP_RATIO.powi(step as i32);
            render_tone(
                hz,
                speed.step_duration(),
                config.sample_rate,
                config.volume,
                Envelope::AttackDecay { attack: 0.2 },
            )
        })
        .collect()
}
