//! The drill data model: patterns and the global workout settings.
//!
//! Field names and enum spellings follow the JSON documents produced by the
//! pattern editor (camelCase keys, kebab-case values, with the editor's
//! capitalized labels accepted as aliases).

use crate::components::narrator::VoiceProfile;
use crate::error::PatternError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Order in which a list is walked: the shots of a pattern, or the patterns
/// of a workout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeriesOrder {
    #[default]
    #[serde(alias = "In Order", alias = "inOrder", alias = "in_order")]
    InOrder,
    #[serde(alias = "Randomized", alias = "random", alias = "Random")]
    Randomized,
}

/// Selects the power-up cue played ahead of each shot cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplitStepHint {
    #[default]
    #[serde(alias = "None")]
    None,
    #[serde(alias = "Slow")]
    Slow,
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "Fast")]
    Fast,
    #[serde(alias = "Random")]
    Random,
}

/// How a pattern decides it is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LimitType {
    #[default]
    #[serde(alias = "Shot", alias = "shots", alias = "Shots")]
    Shot,
    #[serde(alias = "Time")]
    Time,
}

/// Workout-wide stopping condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GlobalLimitType {
    /// Run every pattern once.
    #[default]
    #[serde(alias = "All")]
    All,
    /// Stop at a total shot count, looping through the patterns as needed.
    #[serde(alias = "Shot", alias = "shots", alias = "Shots")]
    Shot,
    /// Stop at a total active time, looping through the patterns as needed.
    #[serde(alias = "Time")]
    Time,
}

/// One configured drill: a shot list plus its timing and limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pattern {
    pub name: String,
    pub shot_list: Vec<String>,
    pub series_order: SeriesOrder,
    /// Base seconds between shot cues.
    pub shot_interval: f64,
    /// Up to this many seconds are added to each interval, uniformly.
    pub random_offset: f64,
    pub announce_shots: bool,
    pub intro_message: String,
    pub outro_message: String,
    /// Seconds before the shot cue at which the shot is announced.
    pub next_shot_announcement_lead: f64,
    pub split_step_hint: SplitStepHint,
    pub limit_type: LimitType,
    /// Shot count or whole seconds, depending on `limit_type`.
    pub limit: u32,
    /// Whole seconds of rest after the pattern ends.
    pub post_rest: u32,
    pub speech_rate: f32,
    /// A voice identifier, or `"default"`.
    pub speech_voice: String,
}

impl Default for Pattern {
    fn default() -> Self {
        Self {
            name: String::new(),
            shot_list: Vec::new(),
            series_order: SeriesOrder::InOrder,
            shot_interval: 4.0,
            random_offset: 0.0,
            announce_shots: false,
            intro_message: String::new(),
            outro_message: String::new(),
            next_shot_announcement_lead: 0.0,
            split_step_hint: SplitStepHint::None,
            limit_type: LimitType::Shot,
            limit: 10,
            post_rest: 0,
            speech_rate: 1.0,
            speech_voice: "default".to_string(),
        }
    }
}

impl Pattern {
    /// A pattern with no shots is skipped by the scheduler.
    pub fn is_runnable(&self) -> bool {
        !self.shot_list.is_empty()
    }

    pub fn interval(&self) -> Duration {
        secs(self.shot_interval)
    }

    pub fn random_offset(&self) -> Duration {
        secs(self.random_offset)
    }

    pub fn announcement_lead(&self) -> Duration {
        secs(self.next_shot_announcement_lead)
    }

    /// The pattern's time limit; only meaningful for `LimitType::Time`.
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(u64::from(self.limit))
    }

    /// Rolls one effective interval: base plus `uniform(0, random_offset)`.
    pub fn roll_interval<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let offset = if self.random_offset > 0.0 && self.random_offset.is_finite() {
            rng.gen_range(0.0..=self.random_offset)
        } else {
            0.0
        };
        self.interval() + secs(offset)
    }

    /// Voice used for this pattern's intro, outro and shot announcements.
    pub fn voice(&self) -> VoiceProfile {
        VoiceProfile::new(&self.speech_voice, self.speech_rate)
    }

    /// Same voice, at normal speed. Rest countdown numbers use this.
    pub fn plain_voice(&self) -> VoiceProfile {
        VoiceProfile::new(&self.speech_voice, 1.0)
    }

    pub fn validate(&self) -> Result<(), PatternError> {
        let name = self.name.clone();
        if !(self.shot_interval.is_finite() && self.shot_interval > 0.0) {
            return Err(PatternError::NonPositiveInterval {
                name,
                value: self.shot_interval,
            });
        }
        for (field, value) in [
            ("randomOffset", self.random_offset),
            ("nextShotAnnouncementLead", self.next_shot_announcement_lead),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(PatternError::Negative { name, field, value });
            }
        }
        if !(self.speech_rate.is_finite() && self.speech_rate > 0.0) {
            return Err(PatternError::NonPositiveRate {
                name,
                value: self.speech_rate,
            });
        }
        Ok(())
    }
}

/// Global settings owned by the session for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkoutSettings {
    pub order_mode: SeriesOrder,
    pub countdown_seconds: u32,
    pub global_limit_type: GlobalLimitType,
    pub global_shot_limit: u32,
    /// Whole seconds of active time.
    pub global_time_limit: u32,
}

impl Default for WorkoutSettings {
    fn default() -> Self {
        Self {
            order_mode: SeriesOrder::InOrder,
            countdown_seconds: 5,
            global_limit_type: GlobalLimitType::All,
            global_shot_limit: 0,
            global_time_limit: 0,
        }
    }
}

impl WorkoutSettings {
    pub fn global_time_limit(&self) -> Duration {
        Duration::from_secs(u64::from(self.global_time_limit))
    }
}

/// Seconds as a `Duration`, treating negative and non-finite input as zero.
fn secs(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value)
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn parses_editor_json() {
        let json = r#"{
            "name": "Forehand corners",
            "shotList": ["Left", "Right"],
            "seriesOrder": "Randomized",
            "shotInterval": 6.0,
            "randomOffset": 1.5,
            "announceShots": true,
            "nextShotAnnouncementLead": 2.0,
            "splitStepHint": "Medium",
            "limitType": "time",
            "limit": 90,
            "postRest": 20
        }"#;
        let p: Pattern = serde_json::from_str(json).unwrap();
        assert_eq!(p.series_order, SeriesOrder::Randomized);
        assert_eq!(p.split_step_hint, SplitStepHint::Medium);
        assert_eq!(p.limit_type, LimitType::Time);
        assert_eq!(p.time_limit(), Duration::from_secs(90));
        assert_eq!(p.speech_rate, 1.0);
        assert_eq!(p.speech_voice, "default");
        assert!(p.validate().is_ok());
    }

    #[test]
    fn settings_accept_kebab_and_labels() {
        let s: WorkoutSettings = serde_json::from_str(
            r#"{"orderMode": "in-order", "globalLimitType": "Shot", "globalShotLimit": 40}"#,
        )
        .unwrap();
        assert_eq!(s.order_mode, SeriesOrder::InOrder);
        assert_eq!(s.global_limit_type, GlobalLimitType::Shot);
        assert_eq!(s.global_shot_limit, 40);
        assert_eq!(s.countdown_seconds, 5);
    }

    #[test]
    fn rolled_interval_stays_in_range() {
        let p = Pattern {
            shot_interval: 3.0,
            random_offset: 2.0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let d = p.roll_interval(&mut rng);
            assert!(d >= Duration::from_secs(3));
            assert!(d <= Duration::from_secs(5));
        }
    }

    #[test]
    fn zero_offset_is_exact() {
        let p = Pattern {
            shot_interval: 6.0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(p.roll_interval(&mut rng), Duration::from_secs(6));
    }

    #[test]
    fn validate_rejects_bad_timing() {
        let p = Pattern {
            shot_interval: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            p.validate(),
            Err(PatternError::NonPositiveInterval { .. })
        ));

        let p = Pattern {
            random_offset: -1.0,
            ..Default::default()
        };
        assert!(matches!(p.validate(), Err(PatternError::Negative { .. })));

        let p = Pattern {
            speech_rate: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            p.validate(),
            Err(PatternError::NonPositiveRate { .. })
        ));
    }

    #[test]
    fn empty_shot_list_is_valid_but_not_runnable() {
        let p = Pattern::default();
        assert!(p.validate().is_ok());
        assert!(!p.is_runnable());
    }
}
