//! The building blocks the phase scheduler drives.
//!
//! - `narrator`: speech playback with interruption and keep-alive.
//! - `cues`: synthesized shot and power-up cues.
//! - `interval`: cue timing within one shot interval.
//! - `limits`: pattern and workout stopping rules.
//! - `deck`: the shot order within a pattern.

pub mod cues;
pub mod deck;
pub mod interval;
pub mod limits;
pub mod narrator;
