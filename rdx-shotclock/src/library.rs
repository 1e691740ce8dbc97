//! An in-memory pattern list and settings store, loadable from a workout
//! JSON document.

use crate::error::LibraryError;
use crate::pattern::{Pattern, WorkoutSettings};
use crate::session::{PatternSource, SettingsSource};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// The on-disk shape: `{ "settings": {...}, "patterns": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkoutFile {
    pub settings: WorkoutSettings,
    pub patterns: Vec<Pattern>,
}

impl WorkoutFile {
    /// Parses and validates a workout document.
    pub fn from_json_str(json: &str) -> Result<Self, LibraryError> {
        let file: WorkoutFile = serde_json::from_str(json)?;
        for pattern in &file.patterns {
            pattern.validate()?;
        }
        Ok(file)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, LibraryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Shared pattern list and settings. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct PatternLibrary {
    inner: Arc<RwLock<WorkoutFile>>,
}

impl PatternLibrary {
    pub fn new(settings: WorkoutSettings, patterns: Vec<Pattern>) -> Self {
        Self::from_file(WorkoutFile { settings, patterns })
    }

    pub fn from_file(file: WorkoutFile) -> Self {
        Self {
            inner: Arc::new(RwLock::new(file)),
        }
    }

    /// Replaces the contents with a workout document read from `path`.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<usize, LibraryError> {
        let file = WorkoutFile::load(path.as_ref())?;
        let count = file.patterns.len();
        *self.inner.write() = file;
        info!(path = %path.as_ref().display(), patterns = count, "workout loaded");
        Ok(count)
    }

    pub fn snapshot(&self) -> WorkoutFile {
        self.inner.read().clone()
    }

    pub fn set_patterns(&self, patterns: Vec<Pattern>) {
        self.inner.write().patterns = patterns;
    }

    pub fn update_settings(&self, update: impl FnOnce(&mut WorkoutSettings)) {
        update(&mut self.inner.write().settings);
    }

    pub fn len(&self) -> usize {
        self.inner.read().patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().patterns.is_empty()
    }
}

impl PatternSource for PatternLibrary {
    fn patterns(&self) -> Vec<Pattern> {
        self.inner.read().patterns.clone()
    }
}

impl SettingsSource for PatternLibrary {
    fn settings(&self) -> WorkoutSettings {
        self.inner.read().settings.clone()
    }
}
