//! Terminal stand-ins for the speech and audio backends, used by the demo
//! binaries.

use crate::components::cues::{AudioSink, Clip, CueKind};
use crate::components::narrator::{SpeechEngine, SpeechFuture, Utterance};
use crate::error::SpeechError;
use colored::*;
use std::io::Write;
use std::time::Duration;
use tokio::sync::watch;

/// Prints utterances and holds for roughly as long as speaking them would.
pub struct ConsoleVoice {
    per_word_ms: u64,
    silent_hold: Duration,
    cancels: watch::Sender<u64>,
}

impl ConsoleVoice {
    pub fn new() -> Self {
        Self {
            per_word_ms: 350,
            silent_hold: Duration::from_millis(200),
            cancels: watch::channel(0).0,
        }
    }

    /// Estimated speaking time at the utterance's rate.
    pub fn estimate(&self, utterance: &Utterance) -> Duration {
        if utterance.is_silent() {
            return self.silent_hold;
        }
        let words = utterance.text.split_whitespace().count().max(1) as u64;
        let rate = if utterance.voice.rate > 0.0 {
            f64::from(utterance.voice.rate)
        } else {
            1.0
        };
        Duration::from_millis(((self.per_word_ms * words) as f64 / rate).round() as u64)
    }
}

impl Default for ConsoleVoice {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechEngine for ConsoleVoice {
    fn speak(&self, utterance: Utterance) -> SpeechFuture {
        let hold = self.estimate(&utterance);
        if !utterance.is_silent() {
            let voice = utterance.voice.voice.as_deref().unwrap_or("default");
            println!(
                "{} {} {}",
                "🗣".bright_blue(),
                utterance.text.bold(),
                format!("({voice}, x{:.1})", utterance.voice.rate).dimmed()
            );
        }
        let mut cancels = self.cancels.subscribe();
        Box::pin(async move {
            tokio::select! {
                _ = tokio::time::sleep(hold) => Ok(()),
                _ = cancels.changed() => Err(SpeechError::Interrupted),
            }
        })
    }

    fn cancel(&self) {
        self.cancels.send_modify(|n| *n = n.wrapping_add(1));
    }
}

/// Rings the terminal bell and prints a marker for each cue.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl AudioSink for TerminalBell {
    fn play(&self, clip: Clip) {
        let label = match clip.kind {
            CueKind::Shot => "● BEEP".bright_red().bold(),
            CueKind::PowerUp(speed) => format!("↗ power-up ({speed:?})").yellow(),
        };
        print!("\x07");
        println!("{label} {}", format!("{:?}", clip.duration()).dimmed());
        std::io::stdout().flush().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::narrator::VoiceProfile;

    #[test]
    fn estimate_scales_with_words_and_rate() {
        let voice = ConsoleVoice::new();
        let normal = Utterance::new("Forehand drop shot", VoiceProfile::default());
        assert_eq!(voice.estimate(&normal), Duration::from_millis(1_050));
        let fast = Utterance::new("Forehand drop shot", VoiceProfile::new("default", 2.0));
        assert_eq!(voice.estimate(&fast), Duration::from_millis(525));
        assert_eq!(voice.estimate(&Utterance::silent()), Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_playback() {
        let voice = std::sync::Arc::new(ConsoleVoice::new());
        let playing = voice.speak(Utterance::new("Rest", VoiceProfile::default()));
        voice.cancel();
        assert_eq!(playing.await, Err(SpeechError::Interrupted));
    }
}
