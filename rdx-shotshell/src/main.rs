use anyhow::Result;
use colored::Colorize;
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use shotclock::prelude::*;
use shotclock::{ENGINE_NAME, VERSION as LIB_VERSION};
use std::borrow::Cow;
use std::env;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A custom helper struct for rustyline that enables syntax highlighting.
#[derive(Completer, Helper, Hinter, Validator)]
struct ShellHighlighter;

impl Highlighter for ShellHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if let Some((command, rest)) = line.split_once(' ') {
            Cow::Owned(format!("{} {}", command.yellow().bold(), rest.yellow()))
        } else {
            Cow::Owned(line.yellow().bold().to_string())
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    const LOGO_TEXT: &str = include_str!("../logo.log");
    println!("{}", LOGO_TEXT.cyan());
    let rule = "-".repeat(72);
    println!("{}", rule.dimmed());
    println!(
        "          Shell   v{:<8} Library   v{:<8}",
        SHELL_VERSION, LIB_VERSION
    );
    println!(
        "{}",
        "\n    This software is provided 'as is', without warranty of any kind.\n"
            .dimmed()
    );
    println!("{}", rule.dimmed());
}

/// Prints what the display would show, and session milestones.
fn spawn_event_listeners(engine: &ShotclockEngine) {
    let mut session_rx = engine.subscribe_session_events();
    tokio::spawn(async move {
        while let Ok(event) = session_rx.recv().await {
            println!("\n<-- {} {:?}", "[SESSION]".green().bold(), event);
        }
    });

    let mut display_rx = engine.subscribe_display_events();
    tokio::spawn(async move {
        while let Ok(event) = display_rx.recv().await {
            match event {
                DisplayEvent::Text(text) if !text.is_empty() => {
                    println!("<-- {}", text.bold().white());
                }
                DisplayEvent::PatternStarted { index, name } => {
                    println!("<-- {} #{} {}", "[PATTERN]".magenta(), index.0, name);
                }
                DisplayEvent::Counters {
                    pattern_shots,
                    global_shots,
                    ..
                } => {
                    println!(
                        "{}",
                        format!("    shots: pattern {pattern_shots}, total {global_shots}").dimmed()
                    );
                }
                _ => {}
            }
        }
    });
}

fn print_status(status: &StatusSnapshot) {
    let phase = match status.suspended {
        Some(kind) => format!("{:?} ({:?})", status.phase, kind),
        None => format!("{:?}", status.phase),
    };
    println!("  phase      {}", phase.cyan());
    if let Some(index) = status.pattern {
        println!("  pattern    #{} {}", index.0, status.pattern_name);
        println!(
            "  in pattern {} shots, {:.1}s",
            status.pattern_shots,
            status.pattern_elapsed.as_secs_f32()
        );
    }
    println!(
        "  total      {} shots, {:.1}s, pass {}",
        status.global_shots,
        status.global_elapsed.as_secs_f32(),
        status.pass
    );
    if !status.text.is_empty() {
        println!("  display    {}", status.text.bold());
    }
}

fn list_patterns(library: &PatternLibrary) {
    let file = library.snapshot();
    let s = &file.settings;
    println!(
        "Settings: order {:?}, countdown {}s, limit {:?} (shots {}, time {}s)",
        s.order_mode, s.countdown_seconds, s.global_limit_type, s.global_shot_limit, s.global_time_limit
    );
    if file.patterns.is_empty() {
        println!("No patterns loaded. Use 'load <file>'.");
    }
    for (i, p) in file.patterns.iter().enumerate() {
        let limit = match p.limit_type {
            LimitType::Shot => format!("{} shots", p.limit),
            LimitType::Time => format!("{}s", p.limit),
        };
        println!(
            "  #{i} {:<20} {} shots, every {}s (+{}s), {limit}, rest {}s",
            p.name.bold(),
            p.shot_list.len(),
            p.shot_interval,
            p.random_offset,
            p.post_rest
        );
    }
}

/// Applies a `limit` command to the settings.
fn parse_limit(args: &[&str], settings: &mut WorkoutSettings) -> Result<(), String> {
    match args {
        ["all"] => settings.global_limit_type = GlobalLimitType::All,
        ["shots", n] => {
            settings.global_shot_limit = n.parse().map_err(|_| format!("'{n}' is not a count"))?;
            settings.global_limit_type = GlobalLimitType::Shot;
        }
        ["time", s] => {
            settings.global_time_limit =
                s.parse().map_err(|_| format!("'{s}' is not a number of seconds"))?;
            settings.global_limit_type = GlobalLimitType::Time;
        }
        _ => return Err("Usage: limit <all | shots N | time S>".to_string()),
    }
    Ok(())
}

fn print_help() {
    println!("Available commands:");
    println!("  load <file>              - Loads a workout JSON document.");
    println!("  list                     - Shows the settings and patterns.");
    println!("  start                    - Starts the workout.");
    println!("  pause | resume | p       - Pauses, resumes, or toggles.");
    println!("  stop                     - Cancels the workout.");
    println!("  replay                   - Runs a completed workout again.");
    println!("  exit                     - Leaves the completed screen.");
    println!("  status                   - Shows the current status.");
    println!("  order <in-order|randomized>");
    println!("  limit <all|shots N|time S>");
    println!("  countdown <N>            - Sets the countdown length.");
    println!("  quit                     - Quits the shell.");
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_target(false)
        .init();

    let config_path = env::args().nth(1);
    let config = ShotclockConfig::load(config_path.as_deref().map(Path::new))?;
    tracing::debug!(?config, "configuration loaded");
    let library = PatternLibrary::default();
    let engine = ShotclockEngine::spawn(
        config,
        Collaborators::from_library(
            library.clone(),
            Arc::new(ConsoleVoice::new()),
            Arc::new(TerminalBell),
        ),
    );
    spawn_event_listeners(&engine);

    let mut rl = Editor::new()?;
    rl.set_helper(Some(ShellHighlighter));

    println!(
        "{} is running. Type 'help' for commands or 'quit' to leave.",
        ENGINE_NAME.cyan()
    );

    loop {
        let prompt = format!("{}", ">> ".cyan().bold());
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(_) => break,
        };
        rl.add_history_entry(line.as_str())?;
        let args = line.split_whitespace().collect::<Vec<_>>();
        let Some((command, rest)) = args.split_first() else {
            continue;
        };

        let sent = match *command {
            "load" => {
                match rest.first() {
                    Some(path) => match library.load(path) {
                        Ok(count) => println!("--> Loaded {count} patterns."),
                        Err(e) => println!("Error: {e}"),
                    },
                    None => println!("Usage: load <file>"),
                }
                Ok(())
            }
            "list" => {
                list_patterns(&library);
                Ok(())
            }
            "start" => engine.start(),
            "pause" => engine.pause(),
            "resume" => engine.resume(),
            "p" => engine.toggle_pause(),
            "stop" => engine.stop(),
            "replay" => engine.replay(),
            "exit" => engine.exit(),
            "status" => {
                print_status(&engine.status());
                Ok(())
            }
            "order" => {
                let order = match rest.first().copied() {
                    Some("in-order") => Some(SeriesOrder::InOrder),
                    Some("randomized") => Some(SeriesOrder::Randomized),
                    _ => None,
                };
                match order {
                    Some(order) => {
                        library.update_settings(|s| s.order_mode = order);
                        println!("--> Order mode set to {order:?}.");
                    }
                    None => println!("Usage: order <in-order|randomized>"),
                }
                Ok(())
            }
            "limit" => {
                let mut settings = library.settings();
                match parse_limit(rest, &mut settings) {
                    Ok(()) => {
                        library.update_settings(|s| *s = settings);
                        println!("--> Global limit updated.");
                    }
                    Err(usage) => println!("{usage}"),
                }
                Ok(())
            }
            "countdown" => {
                match rest.first().and_then(|n| n.parse::<u32>().ok()) {
                    Some(n) => {
                        library.update_settings(|s| s.countdown_seconds = n);
                        println!("--> Countdown set to {n}s.");
                    }
                    None => println!("Usage: countdown <N>"),
                }
                Ok(())
            }
            "help" => {
                print_help();
                Ok(())
            }
            "quit" => break,
            _ => {
                println!("Unknown command: '{}'. Type 'help'.", line.trim());
                Ok(())
            }
        };
        if let Err(e) = sent {
            println!("Error: {e}");
            break;
        }
    }

    println!("Exiting shotshell...");
    engine.stop().ok();
    engine.shutdown().await.ok();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_command_sets_type_and_value() {
        let mut s = WorkoutSettings::default();
        parse_limit(&["shots", "40"], &mut s).unwrap();
        assert_eq!(s.global_limit_type, GlobalLimitType::Shot);
        assert_eq!(s.global_shot_limit, 40);

        parse_limit(&["time", "600"], &mut s).unwrap();
        assert_eq!(s.global_limit_type, GlobalLimitType::Time);
        assert_eq!(s.global_time_limit, 600);

        parse_limit(&["all"], &mut s).unwrap();
        assert_eq!(s.global_limit_type, GlobalLimitType::All);
    }

    #[test]
    fn bad_limit_command_is_rejected() {
        let mut s = WorkoutSettings::default();
        assert!(parse_limit(&["shots", "many"], &mut s).is_err());
        assert!(parse_limit(&["forever"], &mut s).is_err());
        assert_eq!(s, WorkoutSettings::default());
    }
}
