//! Error types surfaced by the library.
//!
//! The scheduler itself never fails: narration errors are logged and skipped,
//! empty patterns are skipped, and invalid commands are ignored. These types
//! are what the collaborators and the public handle report.

use thiserror::Error;

/// Failures reported by a `SpeechEngine` backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SpeechError {
    /// Playback was cut short by `cancel()` or by a newer utterance.
    #[error("utterance interrupted")]
    Interrupted,

    #[error("voice '{0}' is not available")]
    VoiceUnavailable(String),

    #[error("speech engine failure: {0}")]
    Engine(String),
}

/// A narration attempt that failed for a reason other than interruption.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("failed to narrate {text:?}: {source}")]
pub struct NarrationError {
    pub text: String,
    #[source]
    pub source: SpeechError,
}

/// A pattern whose timing parameters cannot be scheduled.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PatternError {
    #[error("pattern '{name}': shot interval must be positive, got {value}")]
    NonPositiveInterval { name: String, value: f64 },

    #[error("pattern '{name}': {field} must be zero or positive, got {value}")]
    Negative {
        name: String,
        field: &'static str,
        value: f64,
    },

    #[error("pattern '{name}': speech rate must be positive, got {value}")]
    NonPositiveRate { name: String, value: f32 },
}

/// Errors loading a workout document into a `PatternLibrary`.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("failed to read workout file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed workout document: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] PatternError),
}

/// Errors from the public engine handle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The control task has exited; the handle is no longer connected.
    #[error("the shotclock control task is no longer running")]
    Disconnected,
}
