//! # Shotclock
//!
//! A phase-based workout engine for announced drill shots.
//!
//! Shotclock runs a list of drill patterns back-to-back: a countdown, then
//! for each pattern a loop of timed shot intervals (a power-up cue, a shot
//! cue at the midpoint, a spoken announcement of the shot), then a rest.
//! A global limit on shots or active time can loop the list until reached.
//!
//! ## Core Concepts
//!
//! - **Timebase**: one-shot and recurring timers, each identified by a
//!   generational `TimerId` so cancellation is total.
//! - **Phase Scheduler**: a single control task that owns all run state and
//!   handles commands, timer fires and narration completions in order.
//! - **Collaborators**: speech, audio, the pattern list and the settings sit
//!   behind traits (`SpeechEngine`, `AudioSink`, `PatternSource`,
//!   `SettingsSource`), so device setup and persistence stay outside.
//! - **Event-Driven UI**: the scheduler publishes `SessionEvent`,
//!   `PhaseEvent` and `DisplayEvent` streams and a `StatusSnapshot`.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use shotclock::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let library = PatternLibrary::new(
//!         WorkoutSettings::default(),
//!         vec![Pattern {
//!             name: "Corners".into(),
//!             shot_list: vec!["Left".into(), "Right".into()],
//!             limit: 6,
//!             ..Default::default()
//!         }],
//!     );
//!     let engine = ShotclockEngine::spawn(
//!         ShotclockConfig::default(),
//!         Collaborators::from_library(library, Arc::new(ConsoleVoice::new()), Arc::new(TerminalBell)),
//!     );
//!
//!     let mut display = engine.subscribe_display_events();
//!     tokio::spawn(async move {
//!         while let Ok(event) = display.recv().await {
//!             println!("{event:?}");
//!         }
//!     });
//!
//!     engine.start()?;
//!     engine.wait_for(|s| s.phase == PhaseKind::Completed).await?;
//!     engine.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Shotclock Engine";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod common;
pub mod components;
pub mod config;
pub mod console;
pub mod engine;
pub mod error;
pub mod events;
pub mod library;
pub mod pattern;
mod scheduler;
pub mod session;
pub mod time;

/// A prelude module for easy importing of the most common Shotclock types.
pub mod prelude {
    pub use crate::components::cues::{AudioSink, Clip, CueKind, PowerUpSpeed};
    pub use crate::components::narrator::{SpeechEngine, SpeechFuture, Utterance, VoiceProfile};
    pub use crate::config::{ShotclockConfig, TickResolution};
    pub use crate::console::{ConsoleVoice, TerminalBell};
    pub use crate::engine::{Collaborators, ShotclockEngine};
    pub use crate::error::{EngineError, LibraryError, NarrationError, SpeechError};
    pub use crate::events::{DisplayEvent, PhaseEvent, PhaseKind, SessionEvent, StatusSnapshot};
    pub use crate::library::{PatternLibrary, WorkoutFile};
    pub use crate::pattern::{
        GlobalLimitType, LimitType, Pattern, SeriesOrder, SplitStepHint, WorkoutSettings,
    };
    pub use crate::session::{PatternSource, SettingsSource};
}
