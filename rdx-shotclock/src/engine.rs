//! The public handle that starts and controls the Shotclock engine.

use crate::components::cues::{AudioSink, CuePlayer};
use crate::components::narrator::{Narrator, SpeechEngine};
use crate::config::ShotclockConfig;
use crate::error::EngineError;
use crate::events::{DisplayEvent, PhaseEvent, SessionEvent, StatusSnapshot};
use crate::library::PatternLibrary;
use crate::scheduler::{Command, Outlets, PhaseScheduler};
use crate::session::{PatternSource, SettingsSource, WorkoutSession};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::info;

/// Everything the engine talks to outside itself.
#[derive(Clone)]
pub struct Collaborators {
    pub patterns: Arc<dyn PatternSource>,
    pub settings: Arc<dyn SettingsSource>,
    pub speech: Arc<dyn SpeechEngine>,
    pub audio: Arc<dyn AudioSink>,
}

impl Collaborators {
    /// Uses one `PatternLibrary` as both the pattern and the settings source.
    pub fn from_library(
        library: PatternLibrary,
        speech: Arc<dyn SpeechEngine>,
        audio: Arc<dyn AudioSink>,
    ) -> Self {
        let library = Arc::new(library);
        Self {
            patterns: library.clone(),
            settings: library,
            speech,
            audio,
        }
    }
}

/// The main Shotclock engine handle.
///
/// Cloning is cheap; every clone drives the same control task. Commands are
/// fire-and-forget: an invalid command (pausing while idle, starting while a
/// run is in progress) is logged and ignored by the scheduler. The only error
/// a command can return is `EngineError::Disconnected`, once the control task
/// has shut down.
#[derive(Clone)]
pub struct ShotclockEngine {
    config: Arc<ShotclockConfig>,
    command_sender: mpsc::UnboundedSender<Command>,
    session_event_sender: broadcast::Sender<SessionEvent>,
    phase_sender: broadcast::Sender<PhaseEvent>,
    display_sender: broadcast::Sender<DisplayEvent>,
    status: watch::Receiver<StatusSnapshot>,
}

impl ShotclockEngine {
    /// Spawns the control task on the current tokio runtime.
    pub fn spawn(config: ShotclockConfig, collaborators: Collaborators) -> Self {
        const CHANNEL_CAPACITY: usize = 256;
        let (session_event_sender, _) = broadcast::channel(64);
        let (phase_sender, _) = broadcast::channel(64);
        let (display_sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (status_sender, status) = watch::channel(StatusSnapshot::default());
        let (command_sender, commands) = mpsc::unbounded_channel();

        let config = Arc::new(config);
        let session = WorkoutSession::new(
            collaborators.patterns,
            collaborators.settings,
            config.seed,
        );
        let narrator = Narrator::new(collaborators.speech, config.keep_alive.clone());
        let cues = CuePlayer::new(collaborators.audio, config.cues.clone());
        let outlets = Outlets {
            session: session_event_sender.clone(),
            phase: phase_sender.clone(),
            display: display_sender.clone(),
            status: status_sender,
        };
        PhaseScheduler::spawn(config.clone(), session, narrator, cues, outlets, commands);
        info!(resolution = ?config.resolution, "ShotclockEngine started");

        Self {
            config,
            command_sender,
            session_event_sender,
            phase_sender,
            display_sender,
            status,
        }
    }

    fn command(&self, command: Command) -> Result<(), EngineError> {
        self.command_sender
            .send(command)
            .map_err(|_| EngineError::Disconnected)
    }

    pub fn config(&self) -> &ShotclockConfig {
        &self.config
    }
}

// Public control API.
impl ShotclockEngine {
    /// Begins a run from the countdown. Ignored while a run is in progress.
    pub fn start(&self) -> Result<(), EngineError> {
        self.command(Command::Start)
    }

    pub fn pause(&self) -> Result<(), EngineError> {
        self.command(Command::Pause)
    }

    pub fn resume(&self) -> Result<(), EngineError> {
        self.command(Command::Resume)
    }

    /// Pauses a running workout or resumes a paused one.
    pub fn toggle_pause(&self) -> Result<(), EngineError> {
        self.command(Command::TogglePause)
    }

    /// Cancels the run and returns to idle.
    pub fn stop(&self) -> Result<(), EngineError> {
        self.command(Command::Stop)
    }

    /// Restarts a completed workout from its first pattern.
    pub fn replay(&self) -> Result<(), EngineError> {
        self.command(Command::Replay)
    }

    /// Leaves the completed state for idle.
    pub fn exit(&self) -> Result<(), EngineError> {
        self.command(Command::Exit)
    }

    /// Stops the control task and waits for it to release its channels.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.command(Command::Shutdown)?;
        self.command_sender.closed().await;
        info!("ShotclockEngine has shut down.");
        Ok(())
    }
}

// Public observation API.
impl ShotclockEngine {
    /// The most recently published status.
    pub fn status(&self) -> StatusSnapshot {
        self.status.borrow().clone()
    }

    /// Waits until the status satisfies `predicate` and returns it.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&StatusSnapshot) -> bool,
    ) -> Result<StatusSnapshot, EngineError> {
        let mut status = self.status.clone();
        let snapshot = status
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| EngineError::Disconnected)?;
        Ok(snapshot.clone())
    }

    pub fn subscribe_status(&self) -> watch::Receiver<StatusSnapshot> {
        self.status.clone()
    }

    pub fn subscribe_session_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.session_event_sender.subscribe()
    }

    pub fn subscribe_phase_events(&self) -> broadcast::Receiver<PhaseEvent> {
        self.phase_sender.subscribe()
    }

    pub fn subscribe_display_events(&self) -> broadcast::Receiver<DisplayEvent> {
        self.display_sender.subscribe()
    }
}
