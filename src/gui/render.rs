//! Window layout.

use eframe::egui::{self, Color32, RichText};

use super::state::{AutomationStatus, EditorState, SetupForm};
use crate::automation::{MessageLevel, ZodiacConfig};
use crate::calibration::SetupMode;

const ERROR_COLOR: Color32 = Color32::from_rgb(200, 60, 60);

/// Control buttons pressed this frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct ControlActions {
    pub start_automation: bool,
    pub start_setup: bool,
    /// Stop automation or cancel setup
    pub stop: bool,
    pub help: bool,
}

/// Settings editor buttons pressed this frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct EditorActions {
    pub save: bool,
    pub reload: bool,
    pub reset: bool,
}

/// Renders the status line, automation and setup controls.
pub fn render_controls(
    ui: &mut egui::Ui,
    status: &AutomationStatus,
    config: Option<&ZodiacConfig>,
    form: &mut SetupForm,
    stop_key: &str,
) -> ControlActions {
    let mut actions = ControlActions::default();
    let busy = status.is_busy();

    ui.horizontal(|ui| {
        let color = if status.is_error() {
            ERROR_COLOR
        } else if busy {
            Color32::from_rgb(60, 170, 80)
        } else {
            ui.visuals().weak_text_color()
        };
        ui.label(RichText::new("●").color(color));
        ui.label(status.status_text());
    });

    ui.add_space(4.0);
    match config {
        Some(config) => ui.label(format!("Configured zodiac slots: {}", config.slot_count())),
        None => ui.label(RichText::new("No configuration yet. Run setup first.").italics()),
    };

    ui.add_space(8.0);
    ui.label(RichText::new("Automation").strong().size(16.0));
    ui.horizontal(|ui| {
        actions.start_automation = ui
            .add_enabled(!busy && config.is_some(), egui::Button::new("▶ Start Automation"))
            .clicked();
        let stop_label = if matches!(status, AutomationStatus::SettingUp) {
            "Cancel Setup"
        } else {
            "◼ Stop"
        };
        actions.stop = ui
            .add_enabled(
                matches!(status, AutomationStatus::Running { .. } | AutomationStatus::SettingUp),
                egui::Button::new(stop_label),
            )
            .clicked();
        actions.help = ui.button("Help").clicked();
    });
    ui.label(
        RichText::new(format!(
            "The '{}' key also stops automation and cancels setup.",
            stop_key
        ))
        .small(),
    );

    ui.add_space(8.0);
    ui.label(RichText::new("Setup").strong().size(16.0));
    ui.add_enabled_ui(!busy, |ui| {
        ui.horizontal(|ui| {
            ui.radio_value(&mut form.mode, SetupMode::Manual, "Click each slot");
            ui.radio_value(&mut form.mode, SetupMode::Grid, "Grid of slots");
        });
        if form.mode == SetupMode::Grid {
            ui.horizontal(|ui| {
                ui.label("Rows");
                ui.add(egui::DragValue::new(&mut form.rows).range(1..=20));
                ui.label("Columns");
                ui.add(egui::DragValue::new(&mut form.columns).range(1..=20));
                ui.label("Total boxes");
                ui.add(egui::DragValue::new(&mut form.total).range(1..=400));
            });
        }
        ui.checkbox(&mut form.window_filter, "Only accept clicks on the game window");
        actions.start_setup = ui.button("Start Setup").clicked();
    });

    actions
}

/// Help window, open while `open` is true.
pub fn render_help(ctx: &egui::Context, open: &mut bool, text: &str) {
    egui::Window::new("Help")
        .open(open)
        .default_size([560.0, 480.0])
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.label(RichText::new(text).monospace());
            });
        });
}

fn section(ui: &mut egui::Ui, title: &str, add_rows: impl FnOnce(&mut egui::Ui)) {
    ui.add_space(8.0);
    ui.label(RichText::new(title).strong().size(16.0));
    egui::Grid::new(title)
        .num_columns(2)
        .spacing([16.0, 6.0])
        .striped(true)
        .show(ui, add_rows);
}

fn delay_row(ui: &mut egui::Ui, label: &str, hint: &str, value: &mut f64) {
    ui.label(label).on_hover_text(hint);
    ui.add(
        egui::DragValue::new(value)
            .speed(0.005)
            .range(0.0..=5.0)
            .max_decimals(3)
            .suffix(" s"),
    );
    ui.end_row();
}

/// Renders every settings field, grouped by what it controls.
pub fn render_settings(ui: &mut egui::Ui, state: &mut EditorState) {
    let stop_key_valid = state.stop_key_valid();
    let settings = &mut state.draft;

    section(ui, "Automation Control", |ui| {
        ui.label("Stop key")
            .on_hover_text("Key that stops automation, e.g. q, p, esc, f1, space");
        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(&mut settings.stop_key).desired_width(80.0));
            if !stop_key_valid {
                ui.label(RichText::new("unknown key").color(ERROR_COLOR));
            }
        });
        ui.end_row();

        ui.label("Maximum zodiac slots")
            .on_hover_text("Most slots accepted during setup");
        ui.horizontal(|ui| {
            let mut unlimited = settings.max_zodiac_slots == -1;
            if ui.checkbox(&mut unlimited, "Unlimited").changed() {
                settings.max_zodiac_slots = if unlimited { -1 } else { 1 };
            }
            if !unlimited {
                ui.add(egui::DragValue::new(&mut settings.max_zodiac_slots).range(1..=200));
            }
        });
        ui.end_row();
    });

    section(ui, "Color Detection", |ui| {
        ui.label("Color tolerance")
            .on_hover_text("How close colors need to be to match (0 = exact match)");
        ui.add(egui::Slider::new(&mut settings.color_tolerance, 0..=255));
        ui.end_row();

        ui.label("Debug color matching")
            .on_hover_text("Log every slot comparison during automation");
        ui.checkbox(&mut settings.debug_color_matching, "");
        ui.end_row();
    });

    section(ui, "Timing", |ui| {
        delay_row(ui, "Before color check", "Sleep at the start of each loop", &mut settings.delay_before_check);
        delay_row(ui, "After mouse press", "Sleep after pressing on a slot", &mut settings.delay_after_press);
        delay_row(ui, "Drag duration", "Time on the drag box before release", &mut settings.delay_drag_duration);
        delay_row(ui, "After drag", "Sleep before checking the button", &mut settings.delay_after_drag);
        delay_row(ui, "After click", "Sleep after clicking the button", &mut settings.delay_after_click);
    });

    section(ui, "Logging", |ui| {
        ui.label("Message level");
        egui::ComboBox::from_id_salt("message_level")
            .selected_text(settings.message_level.as_str())
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut settings.message_level, MessageLevel::Info, "info");
                ui.selectable_value(&mut settings.message_level, MessageLevel::Debug, "debug");
            });
        ui.end_row();
    });

    section(ui, "Interface", |ui| {
        ui.label("Window scale")
            .on_hover_text("Applied when the settings are saved");
        ui.add(egui::Slider::new(&mut settings.gui_scale, 0.5..=3.0).step_by(0.05));
        ui.end_row();
    });
}

/// Renders the action buttons and the status line.
pub fn render_actions(ui: &mut egui::Ui, state: &EditorState) -> EditorActions {
    let mut actions = EditorActions::default();

    ui.add_space(12.0);
    ui.horizontal(|ui| {
        actions.save = ui
            .add_enabled(state.is_dirty(), egui::Button::new("Save"))
            .clicked();
        actions.reload = ui.button("Reload").clicked();
        actions.reset = ui.button("Reset to defaults").clicked();
        if state.is_dirty() {
            ui.label(RichText::new("Unsaved changes").italics());
        }
    });

    let text = state.status.status_text();
    if !text.is_empty() {
        let color = if state.status.is_error() {
            ERROR_COLOR
        } else {
            ui.visuals().text_color()
        };
        ui.add_space(4.0);
        ui.label(RichText::new(text).color(color));
    }

    ui.add_space(4.0);
    ui.label(RichText::new(state.path().display().to_string()).small().weak());

    actions
}
