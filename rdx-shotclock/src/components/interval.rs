//! Cue timing within one shot interval.
//!
//! Every interval has up to three cues, all placed relative to its midpoint
//! `m = effective / 2`: the power-up ramp ending at `m`, the shot cue at `m`,
//! and the next-shot announcement `lead` seconds before `m`. The plan is a
//! pure function of the pattern and the rolled interval, so a resumed
//! interval recomputes only the wall-clock delays.

use crate::components::cues::PowerUpSpeed;
use crate::pattern::Pattern;
use std::time::Duration;

/// One of the three cues of an interval, in the order they fire when due
/// together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntervalCue {
    PowerUp,
    Midpoint,
    Announce,
}

/// Which cues of the current interval have fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FiredCues {
    pub power_up: bool,
    pub midpoint: bool,
    pub announce: bool,
}

impl FiredCues {
    pub fn has(&self, cue: IntervalCue) -> bool {
        match cue {
            IntervalCue::PowerUp => self.power_up,
            IntervalCue::Midpoint => self.midpoint,
            IntervalCue::Announce => self.announce,
        }
    }

    pub fn mark(&mut self, cue: IntervalCue) {
        match cue {
            IntervalCue::PowerUp => self.power_up = true,
            IntervalCue::Midpoint => self.midpoint = true,
            IntervalCue::Announce => self.announce = true,
        }
    }
}

/// Offsets from the start of an interval at which its cues are due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalPlan {
    pub effective: Duration,
    pub midpoint: Duration,
    /// `None` when the split-step hint is `None`.
    pub power_up_at: Option<Duration>,
    /// `None` when shots are not announced or the shot text is blank.
    pub announce_at: Option<Duration>,
}

impl IntervalPlan {
    /// Plans an interval of length `effective`.
    ///
    /// The first shot of a whole run places its announcement from the
    /// pattern's base interval rather than the rolled one, so it is spoken
    /// at the same moment whatever the random offset.
    pub fn new(
        pattern: &Pattern,
        shot: &str,
        effective: Duration,
        speed: Option<PowerUpSpeed>,
        first_of_run: bool,
    ) -> Self {
        let midpoint = effective / 2;
        let power_up_at = speed.map(|s| midpoint.saturating_sub(s.total_duration()));
        let announce_at = (pattern.announce_shots && !shot.trim().is_empty()).then(|| {
            let reference = if first_of_run {
                pattern.interval() / 2
            } else {
                midpoint
            };
            reference
                .saturating_sub(pattern.announcement_lead())
                .min(midpoint)
        });
        Self {
            effective,
            midpoint,
            power_up_at,
            announce_at,
        }
    }

    fn at(&self, cue: IntervalCue) -> Option<Duration> {
        match cue {
            IntervalCue::PowerUp => self.power_up_at,
            IntervalCue::Midpoint => Some(self.midpoint),
            IntervalCue::Announce => self.announce_at,
        }
    }

    /// Cues that must fire now, at `elapsed` into the interval, in firing
    /// order.
    ///
    /// Once the midpoint has fired, an unfired power-up or announcement is
    /// dropped rather than played late.
    pub fn due(&self, elapsed: Duration, fired: FiredCues) -> Vec<IntervalCue> {
        [IntervalCue::PowerUp, IntervalCue::Midpoint, IntervalCue::Announce]
            .into_iter()
            .filter(|&cue| !fired.has(cue))
            .filter(|&cue| cue == IntervalCue::Midpoint || !fired.midpoint)
            .filter(|&cue| self.at(cue).is_some_and(|at| at <= elapsed))
            .collect()
    }

    /// Cues still in the future, with their delay from `elapsed`.
    pub fn pending(&self, elapsed: Duration, fired: FiredCues) -> Vec<(Duration, IntervalCue)> {
        [IntervalCue::PowerUp, IntervalCue::Midpoint, IntervalCue::Announce]
            .into_iter()
            .filter(|&cue| !fired.has(cue))
            .filter_map(|cue| {
                let at = self.at(cue)?;
                (at > elapsed).then(|| (at - elapsed, cue))
            })
            .collect()
    }

    /// Time left until the interval ends.
    pub fn remaining(&self, elapsed: Duration) -> Duration {
        self.effective.saturating_sub(elapsed)
    }
}
