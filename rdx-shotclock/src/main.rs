use anyhow::Result;
use shotclock::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Runs one workout in the terminal.
///
/// Usage: `shotdev [workout.json] [shotclock.toml]`. Without a workout file a
/// short built-in drill is used.
#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    // 2. Load the configuration and the workout.
    let mut args = std::env::args().skip(1).map(PathBuf::from);
    let workout = args.next();
    let config_path = args.next();
    let config = ShotclockConfig::load(config_path.as_deref())?;
    let library = match workout {
        Some(path) => PatternLibrary::from_file(WorkoutFile::load(&path)?),
        None => demo_library(),
    };

    // 3. Create the engine with terminal backends.
    let engine = ShotclockEngine::spawn(
        config,
        Collaborators::from_library(library, Arc::new(ConsoleVoice::new()), Arc::new(TerminalBell)),
    );

    // 4. Spawn listeners for the event streams.
    spawn_event_listeners(&engine);

    // 5. Run until the workout completes or Ctrl+C.
    engine.start()?;
    tokio::select! {
        result = engine.wait_for(|s| s.phase == PhaseKind::Completed) => {
            let status = result?;
            info!(
                shots = status.global_shots,
                elapsed = ?status.global_elapsed,
                "Workout finished."
            );
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Stopping the workout...");
            engine.stop()?;
        }
    }
    engine.shutdown().await?;
    Ok(())
}

/// Spawns tasks, each subscribing to a different event stream from the engine.
fn spawn_event_listeners(engine: &ShotclockEngine) {
    let mut session_rx = engine.subscribe_session_events();
    tokio::spawn(async move {
        while let Ok(event) = session_rx.recv().await {
            info!("[SESSION] => {:?}", event);
        }
    });

    let mut phase_rx = engine.subscribe_phase_events();
    tokio::spawn(async move {
        while let Ok(event) = phase_rx.recv().await {
            info!("[PHASE] => {:?}", event);
        }
    });

    let mut display_rx = engine.subscribe_display_events();
    tokio::spawn(async move {
        while let Ok(event) = display_rx.recv().await {
            match event {
                DisplayEvent::Progress(_) | DisplayEvent::Flash => {}
                DisplayEvent::Text(text) if !text.is_empty() => info!("[DISPLAY] => {}", text),
                other => tracing::debug!("[DISPLAY] => {:?}", other),
            }
        }
    });
}

fn demo_library() -> PatternLibrary {
    let settings = WorkoutSettings {
        countdown_seconds: 3,
        ..Default::default()
    };
    let patterns = vec![
        Pattern {
            name: "Front corners".into(),
            shot_list: vec!["Forehand front".into(), "Backhand front".into()],
            shot_interval: 4.0,
            random_offset: 1.0,
            announce_shots: true,
            intro_message: "Front corners".into(),
            next_shot_announcement_lead: 1.0,
            split_step_hint: SplitStepHint::Medium,
            limit: 4,
            post_rest: 5,
            ..Default::default()
        },
        Pattern {
            name: "Six corners".into(),
            shot_list: vec![
                "One".into(),
                "Two".into(),
                "Three".into(),
                "Four".into(),
                "Five".into(),
                "Six".into(),
            ],
            series_order: SeriesOrder::Randomized,
            shot_interval: 5.0,
            announce_shots: true,
            next_shot_announcement_lead: 1.5,
            split_step_hint: SplitStepHint::Random,
            limit_type: LimitType::Time,
            limit: 30,
            outro_message: "Nice work".into(),
            ..Default::default()
        },
    ];
    PatternLibrary::new(settings, patterns)
}
