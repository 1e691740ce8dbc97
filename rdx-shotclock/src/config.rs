//! Defines all configuration structures for the Shotclock engine.
//!
//! These structs are designed to be deserialized from a configuration file
//! (a TOML file) using `serde` and the `config` crate. Every field has a
//! default, so an empty file, or no file at all, yields a working engine.
//! Environment variables prefixed `SHOTCLOCK__` override file values, e.g.
//! `SHOTCLOCK__TOGGLE_DEBOUNCE_MS=0` or `SHOTCLOCK__CUES__PITCH=1.2`.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// The top-level configuration for the `ShotclockEngine`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShotclockConfig {
    /// How often a running interval publishes progress and checks its end.
    pub resolution: TickResolution,

    /// Pause/resume toggles closer together than this are ignored.
    pub toggle_debounce_ms: u64,

    /// Hold between the countdown's "Go!" and the first interval.
    pub countdown_grace_ms: u64,

    /// Fixes every shuffle, random offset and random split-step choice.
    /// `None` seeds from entropy.
    pub seed: Option<u64>,

    pub keep_alive: KeepAliveConfig,

    pub cues: CueConfig,
}

/// Defines the tick period of a running interval.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickResolution {
    /// 50 ms between ticks.
    Fine,
    /// 100 ms between ticks.
    Standard,
    /// 250 ms between ticks. Progress bars look steppy.
    Coarse,
    /// A user-defined period in milliseconds.
    Custom { millis: u64 },
}

impl TickResolution {
    pub fn period(&self) -> Duration {
        match self {
            TickResolution::Fine => Duration::from_millis(50),
            TickResolution::Standard => Duration::from_millis(100),
            TickResolution::Coarse => Duration::from_millis(250),
            TickResolution::Custom { millis } => Duration::from_millis((*millis).max(1)),
        }
    }
}

/// Settings for the narrator's silent keep-alive loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeepAliveConfig {
    pub enabled: bool,
    /// Pause between two silent utterances.
    pub gap_ms: u64,
}

impl KeepAliveConfig {
    pub fn gap(&self) -> Duration {
        Duration::from_millis(self.gap_ms)
    }
}

/// Tone synthesis settings for the cue player.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CueConfig {
    pub sample_rate: u32,
    /// Output gain, 0.0 ..= 1.0.
    pub volume: f32,
    /// Multiplies the power-up ramp's base frequency.
    pub pitch: f32,
    /// The shot cue plays these two tones back-to-back.
    pub shot_tones_hz: [f32; 2],
    pub shot_tone_ms: u64,
}

// --- Default values ---

impl Default for ShotclockConfig {
    fn default() -> Self {
        Self {
            resolution: TickResolution::Standard,
            toggle_debounce_ms: 300,
            countdown_grace_ms: 1000,
            seed: None,
            keep_alive: KeepAliveConfig::default(),
            cues: CueConfig::default(),
        }
    }
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            gap_ms: 400,
        }
    }
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            volume: 0.6,
            pitch: 1.0,
            shot_tones_hz: [800.0, 1200.0],
            shot_tone_ms: 150,
        }
    }
}

impl ShotclockConfig {
    /// Loads the configuration from an optional TOML file, layered under
    /// `SHOTCLOCK__*` environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("SHOTCLOCK")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn tick_period(&self) -> Duration {
        self.resolution.period()
    }

    pub fn toggle_debounce(&self) -> Duration {
        Duration::from_millis(self.toggle_debounce_ms)
    }

    pub fn countdown_grace(&self) -> Duration {
        Duration::from_millis(self.countdown_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = ShotclockConfig::default();
        assert_eq!(cfg.tick_period(), Duration::from_millis(100));
        assert_eq!(cfg.toggle_debounce(), Duration::from_millis(300));
        assert_eq!(cfg.countdown_grace(), Duration::from_secs(1));
        assert_eq!(cfg.cues.shot_tones_hz, [800.0, 1200.0]);
        assert!(cfg.keep_alive.enabled);
    }

    #[test]
    fn custom_resolution_never_zero() {
        let res = TickResolution::Custom { millis: 0 };
        assert_eq!(res.period(), Duration::from_millis(1));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                "resolution = \"fine\"\nseed = 7\n[cues]\npitch = 1.5\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let cfg: ShotclockConfig = settings.try_deserialize().unwrap();
        assert_eq!(cfg.resolution, TickResolution::Fine);
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.cues.pitch, 1.5);
        assert_eq!(cfg.cues.shot_tone_ms, 150);
        assert_eq!(cfg.toggle_debounce_ms, 300);
    }
}
