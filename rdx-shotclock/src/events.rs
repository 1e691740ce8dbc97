//! Defines all public event types broadcast by the Shotclock engine.
//!
//! This module acts as the public API for the engine's event system. UI code
//! subscribes to these strongly-typed streams and never writes back; the
//! scheduler keeps the authoritative numbers and publishes copies.

use crate::common::PatternIndex;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// The phase the scheduler is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    #[default]
    Idle,
    Countdown,
    Shot,
    Rest,
    Paused,
    Completed,
}

/// Events related to the lifecycle of a whole workout run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum SessionEvent {
    /// Fired when `start` or `replay` begins a run.
    Started {
        at: DateTime<Utc>,
        /// Number of patterns in the run order.
        patterns: usize,
    },
    Paused { during: PhaseKind },
    Resumed { into: PhaseKind },
    /// Fired when the run order is exhausted and another pass begins.
    Looped { pass: u32 },
    /// Fired once when a run finishes by reaching its limits.
    Completed {
        at: DateTime<Utc>,
        shots: u32,
        elapsed: Duration,
        passes: u32,
    },
    /// Fired when a run is cancelled with `stop`.
    Stopped { at: DateTime<Utc> },
    /// Fired when `exit` returns a completed run to idle.
    Exited,
}

/// Fired on every phase entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseEvent {
    pub phase: PhaseKind,
    /// The active pattern, if the phase belongs to one.
    pub pattern: Option<PatternIndex>,
}

/// What the display should show. Every variant replaces the previous value
/// of the same kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayEvent {
    /// The large text: a countdown number, a shot, "Rest", "Paused", "Done".
    Text(String),
    /// Whole seconds left in a countdown or rest.
    Remaining(u32),
    /// Fraction of the current interval elapsed, `0.0..=1.0`.
    Progress(f32),
    /// A screen flash, paired with every shot cue.
    Flash,
    /// A new pattern has become active.
    PatternStarted { index: PatternIndex, name: String },
    /// Counters after each completed interval.
    Counters {
        pattern_shots: u32,
        global_shots: u32,
        global_elapsed: Duration,
    },
}

/// A point-in-time copy of the scheduler's state, published on a `watch`
/// channel after every change.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub phase: PhaseKind,
    /// The phase a pause suspended; `None` unless `phase` is `Paused`.
    pub suspended: Option<PhaseKind>,
    pub text: String,
    pub remaining: Option<u32>,
    pub progress: f32,
    pub pattern: Option<PatternIndex>,
    pub pattern_name: String,
    pub pattern_shots: u32,
    pub pattern_elapsed: Duration,
    pub global_shots: u32,
    pub global_elapsed: Duration,
    /// 1 during the first pass over the run order.
    pub pass: u32,
}

impl StatusSnapshot {
    /// True while a run is in progress, paused or not.
    pub fn is_active(&self) -> bool {
        matches!(
            self.phase,
            PhaseKind::Countdown | PhaseKind::Shot | PhaseKind::Rest | PhaseKind::Paused
        )
    }
}
