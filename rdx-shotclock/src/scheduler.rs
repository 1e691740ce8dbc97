//! The phase scheduler: the single control task that runs a workout.
//!
//! All phase logic runs serially in one tokio task, fed by three channels:
//! commands from the engine handle, timer fires from the `Timebase`, and
//! completions of awaited narration. Commands are polled first so a pause or
//! stop always wins a tie with a timer.
//!
//! Every phase entry cancels all outstanding timers and bumps the phase
//! epoch. A narration completion carries the epoch it was started under and
//! is dropped if the scheduler has moved on since.

use crate::common::{Epoch, PatternIndex, TimerId};
use crate::components::cues::{CuePlayer, PowerUpSpeed};
use crate::components::deck::ShotDeck;
use crate::components::interval::{FiredCues, IntervalCue, IntervalPlan};
use crate::components::limits;
use crate::components::narrator::{Narrator, VoiceProfile};
use crate::config::ShotclockConfig;
use crate::events::{DisplayEvent, PhaseEvent, PhaseKind, SessionEvent, StatusSnapshot};
use crate::pattern::Pattern;
use crate::session::{Dispatch, WorkoutSession};
use crate::time::Timebase;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

const SECOND: Duration = Duration::from_secs(1);
/// Rest seconds at or below this value get a cue, a flash and a number.
const REST_CUE_WINDOW: u32 = 10;
/// Countdown values at or below this value are always spoken.
const COUNTDOWN_SPOKEN_WINDOW: u32 = 10;

/// Requests from the engine handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    Start,
    Pause,
    Resume,
    TogglePause,
    Stop,
    Replay,
    Exit,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    CountdownTick,
    CountdownGrace,
    IntervalTick,
    IntervalEnd,
    Cue(IntervalCue),
    RestTick,
}

/// Narration the scheduler waits on before moving to the next phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpeechStep {
    Intro,
    Outro,
    RestCall,
}

#[derive(Debug)]
struct SpeechDone {
    epoch: Epoch,
    step: SpeechStep,
}

#[derive(Debug, Clone)]
struct IntervalState {
    shot: String,
    plan: IntervalPlan,
    speed: Option<PowerUpSpeed>,
    elapsed: Duration,
    /// The instant `elapsed` was last brought up to date.
    flushed_at: Instant,
    fired: FiredCues,
}

impl IntervalState {
    fn progress(&self) -> f32 {
        if self.plan.effective.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.plan.effective.as_secs_f32()).clamp(0.0, 1.0)
    }
}

/// Where a paused shot phase picks up again.
#[derive(Debug, Clone)]
enum ShotResume {
    /// Paused during the intro: go straight to the first interval.
    FirstInterval,
    Interval(IntervalState),
    /// Paused during the outro: go to rest or the next pattern.
    AfterPattern,
}

/// The resume snapshot of a paused phase.
#[derive(Debug, Clone)]
enum Suspended {
    Countdown { remaining: u32 },
    Shot(ShotResume),
    Rest { remaining: u32 },
}

impl Suspended {
    fn kind(&self) -> PhaseKind {
        match self {
            Suspended::Countdown { .. } => PhaseKind::Countdown,
            Suspended::Shot(_) => PhaseKind::Shot,
            Suspended::Rest { .. } => PhaseKind::Rest,
        }
    }
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Countdown { remaining: u32 },
    /// After "Go!", before the first pattern.
    Grace,
    Intro,
    Interval(IntervalState),
    Outro,
    /// Waiting on the spoken "Rest" before the rest countdown runs.
    RestCall { seconds: u32 },
    Rest { remaining: u32 },
    Paused(Suspended),
    Completed,
}

impl Phase {
    fn kind(&self) -> PhaseKind {
        match self {
            Phase::Idle => PhaseKind::Idle,
            Phase::Countdown { .. } | Phase::Grace => PhaseKind::Countdown,
            Phase::Intro | Phase::Interval(_) | Phase::Outro => PhaseKind::Shot,
            Phase::RestCall { .. } | Phase::Rest { .. } => PhaseKind::Rest,
            Phase::Paused(_) => PhaseKind::Paused,
            Phase::Completed => PhaseKind::Completed,
        }
    }

    fn is_pausable(&self) -> bool {
        matches!(
            self.kind(),
            PhaseKind::Countdown | PhaseKind::Shot | PhaseKind::Rest
        )
    }
}

/// The pattern currently being run, with its own counters.
struct ActivePattern {
    index: PatternIndex,
    pattern: Pattern,
    deck: ShotDeck,
    shots: u32,
    elapsed: Duration,
}

/// Where the scheduler publishes what it does.
pub(crate) struct Outlets {
    pub session: broadcast::Sender<SessionEvent>,
    pub phase: broadcast::Sender<PhaseEvent>,
    pub display: broadcast::Sender<DisplayEvent>,
    pub status: watch::Sender<StatusSnapshot>,
}

pub(crate) struct PhaseScheduler {
    config: Arc<ShotclockConfig>,
    session: WorkoutSession,
    narrator: Narrator,
    cues: CuePlayer,
    outlets: Outlets,
    timebase: Timebase<Wake>,
    speech_sender: mpsc::UnboundedSender<SpeechDone>,
    speech_tasks: Vec<AbortHandle>,
    phase: Phase,
    epoch: Epoch,
    active: Option<ActivePattern>,
    first_shot_pending: bool,
    last_toggle: Option<Instant>,
    text_before_pause: String,
    last_phase_event: Option<PhaseEvent>,
    status: StatusSnapshot,
}

impl PhaseScheduler {
    /// Spawns the control task. It runs until `Command::Shutdown` arrives or
    /// every command sender is dropped.
    pub(crate) fn spawn(
        config: Arc<ShotclockConfig>,
        session: WorkoutSession,
        narrator: Narrator,
        cues: CuePlayer,
        outlets: Outlets,
        commands: mpsc::UnboundedReceiver<Command>,
    ) -> JoinHandle<()> {
        let (fire_sender, fires) = mpsc::unbounded_channel();
        let (speech_sender, speech) = mpsc::unbounded_channel();
        let scheduler = Self {
            config,
            session,
            narrator,
            cues,
            outlets,
            timebase: Timebase::new(fire_sender),
            speech_sender,
            speech_tasks: Vec::new(),
            phase: Phase::Idle,
            epoch: Epoch::default(),
            active: None,
            first_shot_pending: false,
            last_toggle: None,
            text_before_pause: String::new(),
            last_phase_event: None,
            status: StatusSnapshot::default(),
        };
        tokio::spawn(scheduler.run(commands, fires, speech))
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut fires: mpsc::UnboundedReceiver<TimerId>,
        mut speech: mpsc::UnboundedReceiver<SpeechDone>,
    ) {
        info!("phase scheduler running");
        loop {
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.on_command(command),
                },
                Some(id) = fires.recv() => match self.timebase.claim(id) {
                    Some(wake) => self.on_wake(wake),
                    None => trace!(?id, "stale timer fire ignored"),
                },
                Some(done) = speech.recv() => self.on_speech_done(done),
            }
            self.publish_status();
        }
        self.halt();
        info!("phase scheduler stopped");
    }

    fn on_command(&mut self, command: Command) {
        debug!(?command, phase = ?self.phase.kind(), "command received");
        match command {
            Command::Start => self.start(),
            Command::Pause => self.pause(),
            Command::Resume => self.resume(),
            Command::TogglePause => {
                if matches!(self.phase, Phase::Paused(_)) {
                    self.resume()
                } else {
                    self.pause()
                }
            }
            Command::Stop => self.stop(),
            Command::Replay => self.replay(),
            Command::Exit => self.exit(),
            Command::Shutdown => {}
        }
    }

    fn on_wake(&mut self, wake: Wake) {
        trace!(?wake, "timer fired");
        match wake {
            Wake::CountdownTick => self.countdown_tick(),
            Wake::CountdownGrace => self.next_pattern(),
            Wake::IntervalTick => self.interval_tick(),
            Wake::IntervalEnd => self.finish_interval(),
            Wake::Cue(_) => self.fire_due_cues(),
            Wake::RestTick => self.rest_tick(),
        }
    }

    fn on_speech_done(&mut self, done: SpeechDone) {
        if done.epoch != self.epoch {
            trace!(?done, "stale narration completion ignored");
            return;
        }
        match (done.step, self.phase.clone()) {
            (SpeechStep::Intro, Phase::Intro) => self.start_interval(),
            (SpeechStep::Outro, Phase::Outro) => self.after_pattern(),
            (SpeechStep::RestCall, Phase::RestCall { seconds }) => self.enter_rest(seconds),
            (step, phase) => trace!(?step, phase = ?phase.kind(), "narration completion ignored"),
        }
    }
}

// Run lifecycle.
impl PhaseScheduler {
    fn start(&mut self) {
        if !matches!(self.phase, Phase::Idle | Phase::Completed) {
            debug!(phase = ?self.phase.kind(), "start ignored: a run is in progress");
            return;
        }
        self.begin_run();
    }

    fn replay(&mut self) {
        if !matches!(self.phase, Phase::Completed) {
            debug!(phase = ?self.phase.kind(), "replay ignored: the run has not completed");
            return;
        }
        self.begin_run();
    }

    fn begin_run(&mut self) {
        self.halt();
        let patterns = self.session.begin();
        self.active = None;
        self.first_shot_pending = true;
        self.last_toggle = None;
        self.status = StatusSnapshot::default();
        info!(patterns, "workout started");
        self.send(SessionEvent::Started {
            at: Utc::now(),
            patterns,
        });
        self.narrator.start_keep_alive();
        let countdown = self.session.settings().countdown_seconds;
        self.enter_countdown(countdown);
    }

    fn stop(&mut self) {
        if matches!(self.phase, Phase::Idle) {
            debug!("stop ignored: nothing is running");
            return;
        }
        self.halt();
        self.active = None;
        self.enter(Phase::Idle);
        self.show_text(String::new());
        self.show_remaining(None);
        self.show_progress(0.0);
        info!("workout stopped");
        self.send(SessionEvent::Stopped { at: Utc::now() });
    }

    fn exit(&mut self) {
        if !matches!(self.phase, Phase::Completed) {
            debug!(phase = ?self.phase.kind(), "exit ignored: the run has not completed");
            return;
        }
        self.active = None;
        self.enter(Phase::Idle);
        self.show_text(String::new());
        self.send(SessionEvent::Exited);
    }

    fn complete(&mut self) {
        self.flush_interval();
        self.halt();
        self.enter(Phase::Completed);
        self.show_remaining(None);
        self.show_text("Done");
        self.say("Workout complete".to_string(), VoiceProfile::default());
        let shots = self.session.global_shots();
        let elapsed = self.session.global_elapsed();
        let passes = self.session.pass();
        info!(shots, ?elapsed, passes, "workout complete");
        self.send(SessionEvent::Completed {
            at: Utc::now(),
            shots,
            elapsed,
            passes,
        });
    }

    /// Cancels timers, in-flight narration and keep-alive.
    fn halt(&mut self) {
        self.timebase.cancel_all();
        for task in self.speech_tasks.drain(..) {
            task.abort();
        }
        self.narrator.stop_keep_alive();
        self.narrator.interrupt();
    }
}

// Pause and resume.
impl PhaseScheduler {
    fn pause(&mut self) {
        if !self.phase.is_pausable() {
            debug!(phase = ?self.phase.kind(), "pause ignored: nothing to pause");
            return;
        }
        if !self.accept_toggle() {
            return;
        }
        self.flush_interval();
        let suspended = match &self.phase {
            Phase::Countdown { remaining } => Suspended::Countdown {
                remaining: *remaining,
            },
            Phase::Grace => Suspended::Countdown { remaining: 0 },
            Phase::Intro => Suspended::Shot(ShotResume::FirstInterval),
            Phase::Interval(state) => Suspended::Shot(ShotResume::Interval(state.clone())),
            Phase::Outro => Suspended::Shot(ShotResume::AfterPattern),
            Phase::RestCall { seconds } => Suspended::Rest {
                remaining: *seconds,
            },
            Phase::Rest { remaining } => Suspended::Rest {
                remaining: *remaining,
            },
            Phase::Idle | Phase::Paused(_) | Phase::Completed => return,
        };
        let during = suspended.kind();
        self.halt();
        self.enter(Phase::Paused(suspended));
        self.text_before_pause = self.status.text.clone();
        self.show_text("Paused");
        info!(?during, "paused");
        self.send(SessionEvent::Paused { during });
    }

    fn resume(&mut self) {
        let Phase::Paused(suspended) = &self.phase else {
            debug!(phase = ?self.phase.kind(), "resume ignored: not paused");
            return;
        };
        let suspended = suspended.clone();
        if !self.accept_toggle() {
            return;
        }
        let into = suspended.kind();
        info!(?into, "resumed");
        self.send(SessionEvent::Resumed { into });
        self.narrator.start_keep_alive();
        let text = std::mem::take(&mut self.text_before_pause);
        self.show_text(text);
        match suspended {
            Suspended::Countdown { remaining } => self.enter_countdown(remaining),
            Suspended::Shot(ShotResume::FirstInterval) => self.start_interval(),
            Suspended::Shot(ShotResume::Interval(state)) => self.run_interval(state),
            Suspended::Shot(ShotResume::AfterPattern) => self.after_pattern(),
            Suspended::Rest { remaining } => self.enter_rest(remaining),
        }
    }

    /// Applies the pause/resume debounce. Returns `false` to ignore a toggle.
    fn accept_toggle(&mut self) -> bool {
        let now = Instant::now();
        if let Some(last) = self.last_toggle {
            if now.saturating_duration_since(last) < self.config.toggle_debounce() {
                debug!("pause/resume toggle debounced");
                return false;
            }
        }
        self.last_toggle = Some(now);
        true
    }
}

// Countdown.
impl PhaseScheduler {
    fn enter_countdown(&mut self, seconds: u32) {
        if seconds == 0 {
            self.enter_grace();
            return;
        }
        self.enter(Phase::Countdown { remaining: seconds });
        self.show_remaining(Some(seconds));
        self.show_text(seconds.to_string());
        self.say(seconds.to_string(), VoiceProfile::default());
        self.timebase.every(SECOND, Wake::CountdownTick);
    }

    fn countdown_tick(&mut self) {
        let Phase::Countdown { remaining } = &mut self.phase else {
            return;
        };
        *remaining = remaining.saturating_sub(1);
        let remaining = *remaining;
        if remaining == 0 {
            self.enter_grace();
            return;
        }
        self.show_remaining(Some(remaining));
        self.show_text(remaining.to_string());
        if remaining <= COUNTDOWN_SPOKEN_WINDOW || remaining % 10 == 0 {
            self.say(remaining.to_string(), VoiceProfile::default());
        }
    }

    fn enter_grace(&mut self) {
        self.enter(Phase::Grace);
        self.show_remaining(Some(0));
        self.show_text("Go!");
        self.say("Go!".to_string(), VoiceProfile::default());
        self.timebase
            .after(self.config.countdown_grace(), Wake::CountdownGrace);
    }
}

// Pattern dispatch.
impl PhaseScheduler {
    fn next_pattern(&mut self) {
        let pass = self.session.pass();
        match self.session.next_pattern() {
            Dispatch::Complete => self.complete(),
            Dispatch::Pattern { index, pattern } => {
                if self.session.pass() != pass {
                    self.send(SessionEvent::Looped {
                        pass: self.session.pass(),
                    });
                }
                self.start_pattern(index, pattern);
            }
        }
    }

    fn start_pattern(&mut self, index: PatternIndex, pattern: Pattern) {
        info!(
            index = index.0,
            name = %pattern.name,
            shots = pattern.shot_list.len(),
            "pattern started"
        );
        let deck = ShotDeck::new(
            pattern.shot_list.len(),
            pattern.series_order,
            self.session.rng(),
        );
        let intro = pattern.intro_message.clone();
        let voice = pattern.voice();
        self.display(DisplayEvent::PatternStarted {
            index,
            name: pattern.name.clone(),
        });
        self.active = Some(ActivePattern {
            index,
            pattern,
            deck,
            shots: 0,
            elapsed: Duration::ZERO,
        });

        if intro.trim().is_empty() {
            self.start_interval();
        } else {
            self.enter(Phase::Intro);
            self.show_text(intro.clone());
            self.await_speech(SpeechStep::Intro, intro, voice);
        }
    }

    fn end_pattern(&mut self) {
        let Some(active) = &self.active else {
            self.next_pattern();
            return;
        };
        info!(name = %active.pattern.name, shots = active.shots, "pattern finished");
        let outro = active.pattern.outro_message.clone();
        let voice = active.pattern.voice();
        if outro.trim().is_empty() {
            self.after_pattern();
        } else {
            self.enter(Phase::Outro);
            self.show_text(outro.clone());
            self.await_speech(SpeechStep::Outro, outro, voice);
        }
    }

    /// Rest if the pattern asks for it, otherwise straight to the next one.
    fn after_pattern(&mut self) {
        let rest = self.active.as_ref().map_or(0, |a| a.pattern.post_rest);
        if rest == 0 {
            self.next_pattern();
            return;
        }
        self.enter(Phase::RestCall { seconds: rest });
        self.show_progress(0.0);
        self.show_remaining(Some(rest));
        self.show_text("Rest");
        let voice = self.plain_voice();
        self.await_speech(SpeechStep::RestCall, "Rest".to_string(), voice);
    }
}

// Shot intervals.
impl PhaseScheduler {
    /// Rolls and runs a fresh interval for the deck's current shot.
    fn start_interval(&mut self) {
        let Some(active) = self.active.as_mut() else {
            warn!("no active pattern to run an interval for");
            self.complete();
            return;
        };
        let shot = active
            .deck
            .current()
            .and_then(|i| active.pattern.shot_list.get(i))
            .cloned()
            .unwrap_or_default();
        let rng = self.session.rng();
        let effective = active.pattern.roll_interval(rng);
        let speed = active.pattern.split_step_hint.resolve(rng);
        let first_of_run = std::mem::take(&mut self.first_shot_pending);
        let plan = IntervalPlan::new(&active.pattern, &shot, effective, speed, first_of_run);
        debug!(%shot, ?effective, ?speed, first_of_run, "interval planned");
        self.run_interval(IntervalState {
            shot,
            plan,
            speed,
            elapsed: Duration::ZERO,
            flushed_at: Instant::now(),
            fired: FiredCues::default(),
        });
    }

    /// Enters `state` at its recorded elapsed time. Only the wall-clock
    /// delays are recomputed.
    fn run_interval(&mut self, mut state: IntervalState) {
        state.flushed_at = Instant::now();
        let remaining = state.plan.remaining(state.elapsed);
        let pending = state.plan.pending(state.elapsed, state.fired);
        let progress = state.progress();
        self.enter(Phase::Interval(state));
        self.status.remaining = None;
        self.timebase
            .every(self.config.tick_period(), Wake::IntervalTick);
        self.timebase.after(remaining, Wake::IntervalEnd);
        for (delay, cue) in pending {
            self.timebase.after(delay, Wake::Cue(cue));
        }
        self.show_progress(progress);
        self.fire_due_cues();
    }

    /// Brings the interval's elapsed time and every elapsed counter up to now.
    fn flush_interval(&mut self) {
        let Phase::Interval(state) = &mut self.phase else {
            return;
        };
        let now = Instant::now();
        let delta = now.saturating_duration_since(state.flushed_at);
        state.flushed_at = now;
        state.elapsed += delta;
        if let Some(active) = self.active.as_mut() {
            active.elapsed += delta;
        }
        self.session.add_elapsed(delta);
    }

    fn interval_tick(&mut self) {
        self.flush_interval();
        let Phase::Interval(state) = &self.phase else {
            return;
        };
        let progress = state.progress();
        trace!(elapsed = ?state.elapsed, progress, "interval tick");
        self.show_progress(progress);
        if self.session.global_time_reached() {
            info!(elapsed = ?self.session.global_elapsed(), "global time limit reached");
            self.complete();
        }
    }

    fn fire_due_cues(&mut self) {
        self.flush_interval();
        let Phase::Interval(state) = &mut self.phase else {
            return;
        };
        let due = state.plan.due(state.elapsed, state.fired);
        for cue in &due {
            state.fired.mark(*cue);
        }
        let shot = state.shot.clone();
        let speed = state.speed;
        let announcing = state.plan.announce_at.is_some();
        for cue in due {
            self.fire_cue(cue, &shot, speed, announcing);
        }
    }

    fn fire_cue(&mut self, cue: IntervalCue, shot: &str, speed: Option<PowerUpSpeed>, announcing: bool) {
        debug!(?cue, %shot, "cue");
        match cue {
            IntervalCue::PowerUp => {
                if let Some(speed) = speed {
                    self.cues.play_power_up(speed);
                }
            }
            IntervalCue::Midpoint => {
                self.cues.play_shot_cue();
                self.display(DisplayEvent::Flash);
                if !announcing {
                    self.show_text(shot);
                }
            }
            IntervalCue::Announce => {
                self.show_text(shot);
                let voice = self
                    .active
                    .as_ref()
                    .map(|a| a.pattern.voice())
                    .unwrap_or_default();
                self.say(shot.to_string(), voice);
            }
        }
    }

    fn finish_interval(&mut self) {
        self.flush_interval();
        let Some(active) = self.active.as_mut() else {
            return;
        };
        active.shots += 1;
        self.session.record_shot();
        let pattern_shots = active.shots;
        let ends = limits::should_end_pattern(
            &active.pattern,
            active.shots,
            active.elapsed,
            self.session.global_shots(),
            self.session.settings(),
        );
        self.show_progress(1.0);
        self.display(DisplayEvent::Counters {
            pattern_shots,
            global_shots: self.session.global_shots(),
            global_elapsed: self.session.global_elapsed(),
        });

        if self.session.global_limit_reached() {
            info!(
                shots = self.session.global_shots(),
                elapsed = ?self.session.global_elapsed(),
                "global limit reached"
            );
            self.complete();
        } else if ends {
            self.end_pattern();
        } else {
            if let Some(active) = self.active.as_mut() {
                active.deck.advance(self.session.rng());
            }
            self.start_interval();
        }
    }
}

// Rest.
impl PhaseScheduler {
    fn enter_rest(&mut self, seconds: u32) {
        self.enter(Phase::Rest { remaining: seconds });
        self.show_remaining(Some(seconds));
        self.show_text("Rest");
        self.timebase.every(SECOND, Wake::RestTick);
    }

    fn rest_tick(&mut self) {
        let Phase::Rest { remaining } = &mut self.phase else {
            return;
        };
        *remaining = remaining.saturating_sub(1);
        let remaining = *remaining;
        self.session.add_elapsed(SECOND);
        self.show_remaining(Some(remaining));
        if remaining <= REST_CUE_WINDOW {
            self.cues.play_shot_cue();
            self.display(DisplayEvent::Flash);
            if remaining > 0 {
                let voice = self.plain_voice();
                self.say(remaining.to_string(), voice);
            }
        }
        if self.session.global_time_reached() {
            info!(elapsed = ?self.session.global_elapsed(), "global time limit reached during rest");
            self.complete();
        } else if remaining == 0 {
            self.next_pattern();
        }
    }
}

// Phase entry, narration and publishing.
impl PhaseScheduler {
    fn enter(&mut self, phase: Phase) {
        self.timebase.cancel_all();
        self.epoch = self.epoch.next();
        self.phase = phase;
        let event = PhaseEvent {
            phase: self.phase.kind(),
            pattern: self.active.as_ref().map(|a| a.index),
        };
        if self.last_phase_event != Some(event) {
            debug!(phase = ?event.phase, pattern = ?event.pattern, "phase entered");
            self.outlets.phase.send(event).ok();
            self.last_phase_event = Some(event);
        }
    }

    /// Speaks without waiting. The task is aborted on pause and stop.
    fn say(&mut self, text: String, voice: VoiceProfile) {
        let narrator = self.narrator.clone();
        let task = tokio::spawn(async move {
            if let Err(e) = narrator.speak(text, voice).await {
                warn!(error = %e, "narration failed");
            }
        });
        self.track(task.abort_handle());
    }

    /// Speaks and reports back on the speech channel, tagged with the current
    /// epoch. Failures are logged and still reported.
    fn await_speech(&mut self, step: SpeechStep, text: String, voice: VoiceProfile) {
        let narrator = self.narrator.clone();
        let sender = self.speech_sender.clone();
        let epoch = self.epoch;
        let task = tokio::spawn(async move {
            if let Err(e) = narrator.speak(text, voice).await {
                warn!(error = %e, ?step, "narration failed");
            }
            sender.send(SpeechDone { epoch, step }).ok();
        });
        self.track(task.abort_handle());
    }

    fn track(&mut self, task: AbortHandle) {
        self.speech_tasks.retain(|t| !t.is_finished());
        self.speech_tasks.push(task);
    }

    fn plain_voice(&self) -> VoiceProfile {
        self.active
            .as_ref()
            .map(|a| a.pattern.plain_voice())
            .unwrap_or_default()
    }

    fn send(&self, event: SessionEvent) {
        self.outlets.session.send(event).ok();
    }

    fn display(&self, event: DisplayEvent) {
        self.outlets.display.send(event).ok();
    }

    fn show_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.status.text = text.clone();
        self.display(DisplayEvent::Text(text));
    }

    fn show_remaining(&mut self, remaining: Option<u32>) {
        self.status.remaining = remaining;
        if let Some(seconds) = remaining {
            self.display(DisplayEvent::Remaining(seconds));
        }
    }

    fn show_progress(&mut self, progress: f32) {
        self.status.progress = progress;
        self.display(DisplayEvent::Progress(progress));
    }

    fn publish_status(&mut self) {
        let (phase, suspended) = match &self.phase {
            Phase::Paused(s) => (PhaseKind::Paused, Some(s.kind())),
            other => (other.kind(), None),
        };
        let status = &mut self.status;
        status.phase = phase;
        status.suspended = suspended;
        match &self.active {
            Some(active) => {
                status.pattern = Some(active.index);
                if status.pattern_name != active.pattern.name {
                    status.pattern_name = active.pattern.name.clone();
                }
                status.pattern_shots = active.shots;
                status.pattern_elapsed = active.elapsed;
            }
            None => {
                status.pattern = None;
                status.pattern_name.clear();
                status.pattern_shots = 0;
                status.pattern_elapsed = Duration::ZERO;
            }
        }
        status.global_shots = self.session.global_shots();
        status.global_elapsed = self.session.global_elapsed();
        status.pass = self.session.pass();

        let snapshot = status.clone();
        self.outlets.status.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_phase_maps_to_one_kind() {
        assert_eq!(Phase::Grace.kind(), PhaseKind::Countdown);
        assert_eq!(Phase::Intro.kind(), PhaseKind::Shot);
        assert_eq!(Phase::Outro.kind(), PhaseKind::Shot);
        assert_eq!(Phase::RestCall { seconds: 5 }.kind(), PhaseKind::Rest);
        assert_eq!(
            Phase::Paused(Suspended::Rest { remaining: 3 }).kind(),
            PhaseKind::Paused
        );
    }

    #[test]
    fn only_running_phases_pause() {
        assert!(Phase::Countdown { remaining: 3 }.is_pausable());
        assert!(Phase::Rest { remaining: 3 }.is_pausable());
        assert!(Phase::Intro.is_pausable());
        assert!(!Phase::Idle.is_pausable());
        assert!(!Phase::Completed.is_pausable());
        assert!(!Phase::Paused(Suspended::Countdown { remaining: 1 }).is_pausable());
    }
}
