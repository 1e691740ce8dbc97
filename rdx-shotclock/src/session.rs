//! The workout session: run order, global counters and pattern dispatch.
//!
//! A `WorkoutSession` is owned by the scheduler's control task. It reads the
//! pattern list and the global settings from its providers when a run begins
//! and again whenever the run order is exhausted and another pass is due.

use crate::common::PatternIndex;
use crate::components::limits;
use crate::pattern::{Pattern, SeriesOrder, WorkoutSettings};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Supplies the pattern list. Consulted at start and at each loop decision.
pub trait PatternSource: Send + Sync + 'static {
    fn patterns(&self) -> Vec<Pattern>;
}

/// Supplies the global workout settings.
pub trait SettingsSource: Send + Sync + 'static {
    fn settings(&self) -> WorkoutSettings;
}

/// The outcome of asking the session for the next pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Pattern { index: PatternIndex, pattern: Pattern },
    Complete,
}

pub struct WorkoutSession {
    patterns: Arc<dyn PatternSource>,
    settings_source: Arc<dyn SettingsSource>,
    seed: Option<u64>,
    rng: StdRng,
    settings: WorkoutSettings,
    run_order: Vec<Pattern>,
    /// Index of the next pattern to dispatch.
    cursor: usize,
    /// Whether the current pass has dispatched at least one pattern.
    ran_this_pass: bool,
    pass: u32,
    global_shots: u32,
    global_elapsed: Duration,
}

impl WorkoutSession {
    pub fn new(
        patterns: Arc<dyn PatternSource>,
        settings_source: Arc<dyn SettingsSource>,
        seed: Option<u64>,
    ) -> Self {
        let settings = settings_source.settings();
        Self {
            patterns,
            settings_source,
            seed,
            rng: seeded(seed),
            settings,
            run_order: Vec::new(),
            cursor: 0,
            ran_this_pass: false,
            pass: 0,
            global_shots: 0,
            global_elapsed: Duration::ZERO,
        }
    }

    /// Resets every counter and derives a fresh run order.
    ///
    /// With a fixed seed, each run replays the same shuffles and offsets.
    /// Returns the number of patterns in the run order.
    pub fn begin(&mut self) -> usize {
        if self.seed.is_some() {
            self.rng = seeded(self.seed);
        }
        self.settings = self.settings_source.settings();
        self.global_shots = 0;
        self.global_elapsed = Duration::ZERO;
        self.pass = 1;
        self.derive_run_order();
        info!(
            patterns = self.run_order.len(),
            order = ?self.settings.order_mode,
            limit = ?self.settings.global_limit_type,
            "workout session begins"
        );
        self.run_order.len()
    }

    /// Picks the next runnable pattern, looping through the run order again
    /// while a global limit is configured and not yet reached.
    pub fn next_pattern(&mut self) -> Dispatch {
        loop {
            if let Some(pattern) = self.run_order.get(self.cursor) {
                let index = PatternIndex(self.cursor);
                self.cursor += 1;
                if !pattern.is_runnable() {
                    warn!(index = index.0, name = %pattern.name, "skipping pattern with no shots");
                    continue;
                }
                self.ran_this_pass = true;
                return Dispatch::Pattern {
                    index,
                    pattern: pattern.clone(),
                };
            }

            if !self.ran_this_pass {
                warn!("no runnable pattern in the run order");
                return Dispatch::Complete;
            }
            if !limits::wants_another_pass(&self.settings, self.global_shots, self.global_elapsed)
            {
                return Dispatch::Complete;
            }
            self.settings.order_mode = self.settings_source.settings().order_mode;
            self.pass += 1;
            self.derive_run_order();
            info!(pass = self.pass, "run order exhausted, starting another pass");
        }
    }

    pub fn record_shot(&mut self) {
        self.global_shots += 1;
    }

    pub fn add_elapsed(&mut self, delta: Duration) {
        self.global_elapsed += delta;
    }

    pub fn global_limit_reached(&self) -> bool {
        limits::global_limit_reached(&self.settings, self.global_shots, self.global_elapsed)
    }

    pub fn global_time_reached(&self) -> bool {
        limits::global_time_reached(&self.settings, self.global_elapsed)
    }

    pub fn settings(&self) -> &WorkoutSettings {
        &self.settings
    }

    pub fn global_shots(&self) -> u32 {
        self.global_shots
    }

    pub fn global_elapsed(&self) -> Duration {
        self.global_elapsed
    }

    pub fn pass(&self) -> u32 {
        self.pass
    }

    /// The session's random source: shuffles, offsets, split-step picks.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    fn derive_run_order(&mut self) {
        self.run_order = self.patterns.patterns();
        if self.settings.order_mode == SeriesOrder::Randomized {
            self.run_order.shuffle(&mut self.rng);
        }
        self.cursor = 0;
        self.ran_this_pass = false;
        debug!(
            order = ?self.run_order.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            "run order derived"
        );
    }
}

fn seeded(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
