//! Window mode (`--gui`).
//!
//! Starts and stops automation, runs setup sessions and edits
//! user_settings.json with eframe/egui. Automation and setup run on a worker
//! thread so the window stays responsive.

pub mod render;
pub mod state;
pub mod task;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use eframe::egui::{self, Vec2};

use crate::automation::{load_zodiac_config, ZodiacConfig};
use crate::calibration::SetupResult;
use crate::help::help_text;
use state::{AutomationStatus, EditorState, SetupForm};
use task::{BackgroundTask, TaskKind, TaskOutcome};

/// Main window.
pub struct GuiApp {
    editor: EditorState,
    status: AutomationStatus,
    task: Option<BackgroundTask>,
    config: Option<ZodiacConfig>,
    config_path: PathBuf,
    setup_form: SetupForm,
    show_help: bool,
    /// Zoom factor currently applied to the window.
    applied_scale: Option<f32>,
}

fn load_config(path: &Path) -> Option<ZodiacConfig> {
    match load_zodiac_config(path) {
        Ok(config) => Some(config),
        Err(e) => {
            crate::log(&format!("GUI: {:#}", e));
            None
        }
    }
}

impl GuiApp {
    pub fn new(settings_path: PathBuf, config_path: PathBuf, window_filter: bool) -> Self {
        let editor = EditorState::load(settings_path);
        crate::apply_message_level(editor.saved());

        Self {
            editor,
            status: AutomationStatus::Idle,
            task: None,
            config: load_config(&config_path),
            config_path,
            setup_form: SetupForm::new(window_filter),
            show_help: false,
            applied_scale: None,
        }
    }

    /// Applies the saved `gui_scale`, not the one being edited, so dragging the
    /// slider does not resize the window under the cursor.
    fn apply_scale(&mut self, ctx: &egui::Context) {
        let scale = self.editor.saved().gui_scale;
        if self.applied_scale != Some(scale) {
            ctx.set_zoom_factor(scale);
            self.applied_scale = Some(scale);
        }
    }

    /// Joins a finished worker, otherwise refreshes the live counter.
    fn update_task_status(&mut self) {
        let Some(task) = &self.task else {
            return;
        };

        if task.is_finished() {
            if let Some(task) = self.task.take() {
                let outcome = task.join();
                if let TaskOutcome::Setup(Ok(SetupResult::Saved(config))) = &outcome {
                    self.config = Some(config.clone());
                }
                self.status = AutomationStatus::from_outcome(&outcome);
                crate::log(&format!("GUI: {}", self.status.status_text()));
            }
            return;
        }

        // The stop key raises the same flag as the Stop button
        if task.stop_requested() {
            self.status = AutomationStatus::Stopping;
        } else if task.kind() == TaskKind::Automation {
            let started = match self.status {
                AutomationStatus::Running { started, .. } => started,
                _ => Instant::now(),
            };
            self.status = AutomationStatus::Running {
                sacrifices: task.sacrifices(),
                started,
            };
        }
    }

    fn handle_start_automation(&mut self) {
        // Setup may have been run from the console since the window opened
        self.config = load_config(&self.config_path);
        let Some(config) = self.config.clone() else {
            self.status = AutomationStatus::Error(
                "Invalid or missing configuration. Please run setup first.".to_string(),
            );
            return;
        };
        if self.editor.is_dirty() {
            crate::log("GUI: Starting with the saved settings. Unsaved edits are not used.");
        }

        match BackgroundTask::automation(self.editor.saved().clone(), config) {
            Ok(task) => {
                self.task = Some(task);
                self.status = AutomationStatus::Running {
                    sacrifices: 0,
                    started: Instant::now(),
                };
            }
            Err(e) => self.status = AutomationStatus::Error(format!("{:#}", e)),
        }
    }

    fn handle_start_setup(&mut self) {
        let layout = match self.setup_form.layout() {
            Ok(layout) => layout,
            Err(e) => {
                self.status = AutomationStatus::Error(format!("{:#}", e));
                return;
            }
        };

        match BackgroundTask::setup(
            self.editor.saved().clone(),
            layout,
            self.setup_form.window_filter,
            self.config_path.clone(),
        ) {
            Ok(task) => {
                self.task = Some(task);
                self.status = AutomationStatus::SettingUp;
            }
            Err(e) => self.status = AutomationStatus::Error(format!("{:#}", e)),
        }
    }

    fn handle_stop(&mut self) {
        if let Some(task) = &self.task {
            task.request_stop();
            self.status = AutomationStatus::Stopping;
            crate::log("GUI: Requested stop");
        }
    }
}

impl eframe::App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_scale(ctx);
        self.update_task_status();

        if self.status.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Revolution Idle Sacrifice Automation");
            ui.add_space(8.0);

            egui::ScrollArea::vertical().show(ui, |ui| {
                let stop_key = self.editor.saved().stop_key();
                let controls = render::render_controls(
                    ui,
                    &self.status,
                    self.config.as_ref(),
                    &mut self.setup_form,
                    &stop_key.to_string(),
                );
                if controls.start_automation {
                    self.handle_start_automation();
                }
                if controls.start_setup {
                    self.handle_start_setup();
                }
                if controls.stop {
                    self.handle_stop();
                }
                if controls.help {
                    self.show_help = true;
                }

                ui.add_space(12.0);
                ui.separator();
                ui.label(egui::RichText::new("Settings").strong().size(18.0));

                render::render_settings(ui, &mut self.editor);
                let actions = render::render_actions(ui, &self.editor);

                if actions.save {
                    match self.editor.save() {
                        Ok(()) => crate::apply_message_level(self.editor.saved()),
                        Err(e) => crate::log(&format!("GUI: Failed to save settings: {:#}", e)),
                    }
                }
                if actions.reload {
                    self.editor.reload();
                    crate::apply_message_level(self.editor.saved());
                }
                if actions.reset {
                    self.editor.reset_to_defaults();
                }
            });
        });

        if self.show_help {
            let text = help_text(self.editor.saved());
            render::render_help(ctx, &mut self.show_help, &text);
        }
    }
}

impl Drop for GuiApp {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.request_stop();
            let _ = task.join();
        }
    }
}

/// Opens the main window. Blocks until it is closed.
pub fn run_gui(settings_path: PathBuf, config_path: PathBuf, window_filter: bool) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(Vec2::new(560.0, 760.0))
            .with_min_inner_size(Vec2::new(440.0, 420.0))
            .with_title("Revolution Idle Sacrifice Automation"),
        ..Default::default()
    };

    eframe::run_native(
        "Revolution Idle Sacrifice Automation",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(GuiApp::new(settings_path, config_path, window_filter)))
        }),
    )
}
