//! Automation and setup started from the window run on a worker thread.
//!
//! The window polls `is_finished` every frame and joins the thread once it is
//! done. Stop and cancel requests go through the same `RunControl` the stop
//! key raises.

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use crate::automation::{run_automation, RunControl, RunSummary, Settings, ZodiacConfig};
use crate::calibration::{run_setup_session, GridLayout, SetupResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    Automation,
    Setup,
}

/// What a finished worker returned.
#[derive(Debug)]
pub enum TaskOutcome {
    Automation(Result<RunSummary>),
    Setup(Result<SetupResult>),
}

pub struct BackgroundTask {
    kind: TaskKind,
    control: RunControl,
    handle: JoinHandle<TaskOutcome>,
}

impl BackgroundTask {
    /// Starts automation with its own copy of the settings and configuration.
    pub fn automation(settings: Settings, config: ZodiacConfig) -> Result<Self> {
        let control = RunControl::new();
        let worker = control.clone();
        let handle = thread::Builder::new()
            .name("automation".to_string())
            .spawn(move || TaskOutcome::Automation(run_automation(&settings, &config, &worker)))?;
        crate::log("GUI: Started automation");
        Ok(Self {
            kind: TaskKind::Automation,
            control,
            handle,
        })
    }

    /// Starts a setup session. `layout` selects grid setup.
    pub fn setup(
        settings: Settings,
        layout: Option<GridLayout>,
        window_filter: bool,
        config_path: PathBuf,
    ) -> Result<Self> {
        let control = RunControl::new();
        let cancel = control.stop_flag();
        let handle = thread::Builder::new().name("setup".to_string()).spawn(move || {
            TaskOutcome::Setup(run_setup_session(
                &settings,
                layout,
                window_filter,
                &config_path,
                cancel,
            ))
        })?;
        crate::log("GUI: Started setup");
        Ok(Self {
            kind: TaskKind::Setup,
            control,
            handle,
        })
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Stops automation or cancels setup at the next check.
    pub fn request_stop(&self) {
        self.control.request_stop();
    }

    pub fn stop_requested(&self) -> bool {
        self.control.stop_requested()
    }

    /// Sacrifices so far. Always 0 for setup.
    pub fn sacrifices(&self) -> u64 {
        self.control.sacrifices()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the worker. A panic becomes an error outcome.
    pub fn join(self) -> TaskOutcome {
        match self.handle.join() {
            Ok(outcome) => outcome,
            Err(_) => {
                let err = anyhow!("The {:?} thread panicked", self.kind);
                match self.kind {
                    TaskKind::Automation => TaskOutcome::Automation(Err(err)),
                    TaskKind::Setup => TaskOutcome::Setup(Err(err)),
                }
            }
        }
    }
}
