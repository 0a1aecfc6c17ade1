//! Window state.
//!
//! Tracks what the worker thread is doing, the setup options, and the
//! settings being edited next to the last saved copy so the window can tell
//! whether there are unsaved changes.

use anyhow::Result;
use std::path::PathBuf;
use std::time::Instant;

use super::task::TaskOutcome;
use crate::automation::stats::status_line;
use crate::automation::{load_settings, RunSummary, Settings, StopKey};
use crate::calibration::{GridLayout, SetupMode, SetupResult};

/// Automation and setup status for display in the window.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum AutomationStatus {
    /// Nothing running
    #[default]
    Idle,
    Running {
        sacrifices: u64,
        started: Instant,
    },
    /// Waiting for the worker to notice a stop or cancel request
    Stopping,
    SettingUp,
    Stopped(RunSummary),
    /// Setup finished and saved this many slots
    SetupSaved(usize),
    SetupCancelled,
    Error(String),
}

impl AutomationStatus {
    pub fn status_text(&self) -> String {
        match self {
            Self::Idle => "Ready".to_string(),
            Self::Running {
                sacrifices,
                started,
            } => format!("Running - {}", status_line(*sacrifices, started.elapsed())),
            Self::Stopping => "Stopping...".to_string(),
            Self::SettingUp => "Setup in progress. Click on the game window.".to_string(),
            Self::Stopped(summary) => format!(
                "Automation stopped. {} sacrifices in {:.1}s",
                summary.sacrifices,
                summary.elapsed.as_secs_f64()
            ),
            Self::SetupSaved(slots) => format!("Setup saved with {} zodiac slot(s).", slots),
            Self::SetupCancelled => "Setup cancelled.".to_string(),
            Self::Error(msg) => format!("Error: {}", msg),
        }
    }

    /// True while a worker thread is running.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::Running { .. } | Self::Stopping | Self::SettingUp
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Status after a worker has finished.
    pub fn from_outcome(outcome: &TaskOutcome) -> Self {
        match outcome {
            TaskOutcome::Automation(Ok(summary)) => Self::Stopped(*summary),
            TaskOutcome::Setup(Ok(SetupResult::Saved(config))) => {
                Self::SetupSaved(config.slot_count())
            }
            TaskOutcome::Setup(Ok(SetupResult::Cancelled)) => Self::SetupCancelled,
            TaskOutcome::Automation(Err(e)) | TaskOutcome::Setup(Err(e)) => {
                Self::Error(format!("{:#}", e))
            }
        }
    }
}

/// Options for the next setup session.
#[derive(Clone, Debug, PartialEq)]
pub struct SetupForm {
    pub mode: SetupMode,
    pub rows: usize,
    pub columns: usize,
    pub total: usize,
    /// Only accept clicks on the game window
    pub window_filter: bool,
}

impl SetupForm {
    pub fn new(window_filter: bool) -> Self {
        Self {
            mode: SetupMode::Manual,
            rows: 2,
            columns: 3,
            total: 6,
            window_filter,
        }
    }

    /// Grid shape in grid mode, `None` in manual mode.
    pub fn layout(&self) -> Result<Option<GridLayout>> {
        match self.mode {
            SetupMode::Manual => Ok(None),
            SetupMode::Grid => GridLayout::new(self.rows, self.columns, self.total).map(Some),
        }
    }
}

/// Result of the last editor action, shown at the bottom of the window.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum EditorStatus {
    #[default]
    Idle,
    /// Saved. Holds one warning per value that had to be replaced.
    Saved(Vec<String>),
    Reloaded,
    ResetToDefaults,
    Error(String),
}

impl EditorStatus {
    pub fn status_text(&self) -> String {
        match self {
            Self::Idle => String::new(),
            Self::Saved(warnings) if warnings.is_empty() => "Settings saved.".to_string(),
            Self::Saved(warnings) => format!(
                "Settings saved with corrections: {}",
                warnings.join("; ")
            ),
            Self::Reloaded => "Settings reloaded from disk.".to_string(),
            Self::ResetToDefaults => "Default values restored. Save to keep them.".to_string(),
            Self::Error(msg) => format!("Error: {}", msg),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

#[derive(Debug)]
pub struct EditorState {
    /// Values shown in the form.
    pub draft: Settings,
    /// Values last read from or written to disk.
    saved: Settings,
    path: PathBuf,
    pub status: EditorStatus,
}

impl EditorState {
    /// Loads the settings at `path`, creating the file if needed.
    pub fn load(path: PathBuf) -> Self {
        let saved = load_settings(&path);
        Self {
            draft: saved.clone(),
            saved,
            path,
            status: EditorStatus::Idle,
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn saved(&self) -> &Settings {
        &self.saved
    }

    pub fn is_dirty(&self) -> bool {
        self.draft != self.saved
    }

    /// True if the stop key field holds a key the listener understands.
    pub fn stop_key_valid(&self) -> bool {
        StopKey::parse(&self.draft.stop_key).is_some()
    }

    /// Sanitizes the draft and writes it to disk.
    pub fn save(&mut self) -> Result<()> {
        let mut settings = self.draft.clone();
        let warnings = settings.sanitize();
        if let Err(e) = settings.save(&self.path) {
            self.status = EditorStatus::Error(format!("{:#}", e));
            return Err(e);
        }
        crate::log(&format!("Settings saved to {}", self.path.display()));
        self.draft = settings.clone();
        self.saved = settings;
        self.status = EditorStatus::Saved(warnings);
        Ok(())
    }

    /// Discards edits and re-reads the file.
    pub fn reload(&mut self) {
        self.saved = load_settings(&self.path);
        self.draft = self.saved.clone();
        self.status = EditorStatus::Reloaded;
    }

    /// Puts the defaults in the form without saving them.
    pub fn reset_to_defaults(&mut self) {
        self.draft = Settings::default();
        self.status = EditorStatus::ResetToDefaults;
    }
}
