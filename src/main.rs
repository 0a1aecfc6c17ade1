//! Revolution Idle Sacrifice Automation
//!
//! A console tool that watches zodiac slots in Revolution Idle and drags ready
//! zodiacs into the sacrifice box, then clicks the Sacrifice button. Positions
//! and colors are recorded once in setup mode.

mod automation;
mod calibration;
mod capture;
mod gui;
mod help;
mod menu;
mod paths;

use anyhow::{anyhow, Result};
use chrono::Local;
use clap::Parser;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use automation::settings::{MessageLevel, Settings};

/// Print debug lines to the console (`message_level: "debug"`).
static CONSOLE_DEBUG: AtomicBool = AtomicBool::new(false);
/// Write debug lines to the log file (`--debug`).
static FILE_DEBUG: AtomicBool = AtomicBool::new(false);

#[derive(Parser, Debug)]
#[command(author, version, about = "Revolution Idle zodiac sacrifice automation", long_about = None)]
struct Args {
    /// Run the console menu (default)
    #[arg(long, conflicts_with = "gui")]
    cli: bool,

    /// Open the window (automation, setup, help and settings)
    #[arg(long)]
    gui: bool,

    /// Write debug messages to the log file
    #[arg(long)]
    debug: bool,

    /// Accept setup clicks on any window, not only the game
    #[arg(long)]
    no_window_filter: bool,
}

impl Args {
    fn wants_gui(&self) -> bool {
        self.gui && !self.cli
    }
}

fn write_log_line(line: &str) {
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(paths::get_log_file())
    {
        let _ = file.write_all(line.as_bytes());
    }
}

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    write_log_line(&line);
}

/// Logs a debug message. Shown on the console when the message level is
/// debug, written to the log file when started with `--debug`.
pub fn debug(msg: &str) {
    let console = CONSOLE_DEBUG.load(Ordering::Relaxed);
    let file = FILE_DEBUG.load(Ordering::Relaxed);
    if !console && !file {
        return;
    }
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] [DEBUG] {}\n", timestamp, msg);
    if console {
        print!("{}", line);
    }
    if file {
        write_log_line(&line);
    }
}

/// Applies `message_level` to console output.
pub fn apply_message_level(settings: &Settings) {
    CONSOLE_DEBUG.store(
        settings.message_level == MessageLevel::Debug,
        Ordering::Relaxed,
    );
}

/// Screen coordinates from the mouse hook, GDI and SendInput must all be in
/// physical pixels.
#[cfg(windows)]
fn enable_dpi_awareness() {
    use windows::Win32::UI::HiDpi::{
        SetProcessDpiAwarenessContext, DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
    };

    if let Err(e) = unsafe { SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2) } {
        debug(&format!("Could not set DPI awareness: {}", e));
    }
}

#[cfg(not(windows))]
fn enable_dpi_awareness() {}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        let log_msg = format!("[PANIC]{} {}\n", location, msg);
        eprintln!("{}", log_msg);
        write_log_line(&log_msg);
    }));

    let args = Args::parse();

    paths::ensure_directories()?;
    FILE_DEBUG.store(args.debug, Ordering::Relaxed);
    enable_dpi_awareness();

    log(&format!(
        "Revolution Idle Sacrifice Automation v{}",
        env!("CARGO_PKG_VERSION")
    ));
    debug(&format!("Started with {:?}", args));

    if args.no_window_filter {
        log("Window filtering disabled: setup accepts clicks on any window.");
    }

    if args.wants_gui() {
        log("Opening window...");
        return gui::run_gui(
            paths::get_settings_file(),
            paths::get_zodiac_config_file(),
            !args.no_window_filter,
        )
        .map_err(|e| anyhow!("GUI error: {}", e));
    }

    menu::App::new(!args.no_window_filter).run()
}
