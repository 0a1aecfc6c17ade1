//! Setup wizard.
//!
//! Drives a setup session: prints the instructions, feeds clicks from the
//! mouse hook into `SetupState`, samples slot colors and saves the finished
//! configuration. The console asks for the mode on stdin, the settings window
//! passes it in directly.

use anyhow::{bail, Context, Result};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::automation::config::{MonitoredSlot, ZodiacConfig};
use crate::automation::detection::Rgb;
use crate::automation::settings::Settings;
use crate::automation::stop_key::StopListener;
use crate::calibration::grid::{calculate_grid_coordinates, GridLayout};
use crate::calibration::hook::{ClickEvent, MouseHook};
use crate::calibration::state::{MouseButton, SetupOutcome, SetupState};
use crate::capture::window::GAME_WINDOW_TITLE;
use crate::capture::{is_game_window_at, sample_colors, Point};
use crate::log;

/// How often the wizard wakes up to check the stop key.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How zodiac slots are captured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetupMode {
    /// Click every slot
    Manual,
    /// Click two slots of a regular grid, the rest are computed
    Grid,
}

impl SetupMode {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "" | "1" | "manual" => Some(Self::Manual),
            "2" | "grid" => Some(Self::Grid),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SetupResult {
    Saved(ZodiacConfig),
    Cancelled,
}

/// Parses a positive whole number.
pub fn parse_count(input: &str) -> Option<usize> {
    input.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

fn read_line(input: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line).context("Failed to read from console")? == 0 {
        bail!("Console input closed");
    }
    Ok(line)
}

fn prompt(input: &mut impl BufRead, text: &str) -> Result<String> {
    print!("{}", text);
    io::stdout().flush().ok();
    read_line(input)
}

fn prompt_count(input: &mut impl BufRead, label: &str) -> Result<usize> {
    loop {
        let line = prompt(input, &format!("{}: ", label))?;
        match parse_count(&line) {
            Some(n) => return Ok(n),
            None => log(&format!("'{}' is not a positive number.", line.trim())),
        }
    }
}

/// Asks for rows, columns and total boxes until they form a valid grid.
pub fn prompt_grid_layout(input: &mut impl BufRead) -> Result<GridLayout> {
    loop {
        let rows = prompt_count(input, "Number of rows")?;
        let columns = prompt_count(input, "Number of columns")?;
        let total = prompt_count(input, "Total zodiac boxes")?;
        match GridLayout::new(rows, columns, total) {
            Ok(layout) => return Ok(layout),
            Err(e) => log(&format!("{}. Try again.", e)),
        }
    }
}

fn prompt_setup_mode(input: &mut impl BufRead) -> Result<SetupMode> {
    loop {
        let line = prompt(
            input,
            "Setup mode: [1] click each zodiac slot, [2] grid of slots (default 1): ",
        )?;
        match SetupMode::parse(&line) {
            Some(mode) => return Ok(mode),
            None => log("Enter 1 or 2."),
        }
    }
}

fn print_instructions(settings: &Settings, mode: SetupMode, window_filter: bool) {
    log("");
    log("Entering Setup Mode for Revolution Idle.");
    match settings.slot_limit() {
        Some(limit) => log(&format!(
            "You can configure up to {} zodiac slots for sacrifice automation.",
            limit
        )),
        None => log("You can configure any number of zodiac slots for sacrifice automation."),
    }
    if window_filter {
        log(&format!(
            "IMPORTANT: Only clicks on the '{}' game window are registered during setup.",
            GAME_WINDOW_TITLE
        ));
        log("Clicks on this console or other applications are ignored. The Discord overlay is handled.");
    } else {
        log("Window filtering is off. Every click is registered.");
    }
    match mode {
        SetupMode::Manual => {
            log("1. Left-click each Zodiac Slot you want to monitor (at least 1 required).");
            log("2. Right-click when finished adding zodiac slots.");
        }
        SetupMode::Grid => {
            log("1. Left-click the first (top-left) zodiac box.");
            log("2. Left-click the box one column right and one row down from it.");
        }
    }
    log("3. Left-click the Sacrifice Drag Box (where zodiacs are dragged to).");
    log("4. Left-click the Sacrifice Button (its color is fixed).");
    log(&format!(
        "Press '{}' at any time to cancel setup.",
        settings.stop_key()
    ));
    log("");
}

/// Waits for the next click on the game window. `None` if setup was cancelled.
fn wait_for_click(hook: &MouseHook, stop: &AtomicBool, window_filter: bool) -> Option<ClickEvent> {
    loop {
        if stop.load(Ordering::SeqCst) {
            return None;
        }
        let Some(click) = hook.next_click(POLL_INTERVAL) else {
            continue;
        };
        if window_filter && !is_game_window_at(click.position) {
            continue;
        }
        return Some(click);
    }
}

fn wait_for_left_click(hook: &MouseHook, stop: &AtomicBool, window_filter: bool) -> Option<Point> {
    loop {
        let click = wait_for_click(hook, stop, window_filter)?;
        if click.button == MouseButton::Left {
            return Some(click.position);
        }
        log("Right-click ignored. Left-click the zodiac box.");
    }
}

fn sample_color(position: Point) -> Option<Rgb> {
    match sample_colors(&[position]) {
        Ok(colors) => colors.first().copied(),
        Err(e) => {
            log(&format!("Could not read color at {}: {:#}", position, e));
            None
        }
    }
}

/// Captures grid slots from two reference clicks. `None` if cancelled.
fn capture_grid_slots(
    hook: &MouseHook,
    stop: &AtomicBool,
    window_filter: bool,
    layout: &GridLayout,
) -> Result<Option<Vec<MonitoredSlot>>> {
    log("Left-click the first (top-left) zodiac box.");
    let Some(first) = wait_for_left_click(hook, stop, window_filter) else {
        return Ok(None);
    };
    log(&format!("First box: {}", first));

    let diagonal = if layout.needs_second_click() {
        log("Left-click the box one column right and one row down from the first.");
        let Some(second) = wait_for_left_click(hook, stop, window_filter) else {
            return Ok(None);
        };
        log(&format!("Reference box: {}", second));
        second
    } else {
        first
    };

    let positions = calculate_grid_coordinates(layout, first, diagonal);
    let colors = sample_colors(&positions).context("Failed to read the grid slot colors")?;
    let slots: Vec<MonitoredSlot> = positions
        .into_iter()
        .zip(colors)
        .map(|(position, color)| MonitoredSlot { position, color })
        .collect();

    for (i, slot) in slots.iter().enumerate() {
        log(&format!(
            "Zodiac Slot {} at {} with color {}",
            i + 1,
            slot.position,
            slot.color
        ));
    }
    log(&format!(
        "Grid captured: {} zodiac slots. Now left-click to set the Sacrifice Drag Box.",
        slots.len()
    ));
    Ok(Some(slots))
}

/// Asks for the setup mode on the console, then runs a session. The stop key
/// cancels it.
pub fn run_setup(settings: &Settings, window_filter: bool, config_path: &Path) -> Result<SetupResult> {
    let mut input = io::stdin().lock();
    let layout = match prompt_setup_mode(&mut input)? {
        SetupMode::Grid => Some(prompt_grid_layout(&mut input)?),
        SetupMode::Manual => None,
    };
    drop(input);

    run_setup_session(
        settings,
        layout,
        window_filter,
        config_path,
        Arc::new(AtomicBool::new(false)),
    )
}

/// Runs one setup session and saves the result to `config_path`.
///
/// `layout` selects grid setup. The session is cancelled when `cancel` is
/// raised, either by the caller or by the stop key.
pub fn run_setup_session(
    settings: &Settings,
    layout: Option<GridLayout>,
    window_filter: bool,
    config_path: &Path,
    cancel: Arc<AtomicBool>,
) -> Result<SetupResult> {
    let mode = if layout.is_some() {
        SetupMode::Grid
    } else {
        SetupMode::Manual
    };
    print_instructions(settings, mode, window_filter);

    // Setup still works without the stop key, it just cannot be cancelled with it
    let listener = match StopListener::start(&settings.stop_key(), cancel.clone()) {
        Ok(listener) => Some(listener),
        Err(e) => {
            log(&format!("Warning: {:#}. Setup cannot be cancelled with the stop key.", e));
            None
        }
    };

    let hook = MouseHook::install()?;
    hook.drain();

    let mut state = SetupState::new(settings.slot_limit());

    if let Some(layout) = layout {
        match capture_grid_slots(&hook, &cancel, window_filter, &layout)? {
            Some(slots) => state.set_slots(slots),
            None => {
                log("Setup cancelled by user.");
                return Ok(SetupResult::Cancelled);
            }
        }
    } else {
        log("Ready to capture Zodiac Slot 1. Left-click the first zodiac slot.");
    }

    while !state.is_complete() {
        let Some(click) = wait_for_click(&hook, &cancel, window_filter) else {
            log("Setup cancelled by user.");
            return Ok(SetupResult::Cancelled);
        };

        let color = if state.wants_color() && click.button == MouseButton::Left {
            sample_color(click.position)
        } else {
            None
        };

        let outcome = state.handle_click(click.button, click.position, color);
        log(&outcome.message());
        if let SetupOutcome::SlotCaptured { .. } = outcome {
            crate::debug(&format!("Captured {} slot(s) so far", state.slots().len()));
        }
        crate::debug(&format!("Setup step: {:?}", state.step()));
    }

    drop(hook);
    drop(listener);

    let config = state
        .to_config()
        .context("Setup finished without a complete configuration")?;
    log(&format!(
        "Setup complete! Configured {} zodiac slot(s).",
        config.slot_count()
    ));
    config.save(config_path)?;
    Ok(SetupResult::Saved(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_setup_mode_parse() {
        assert_eq!(SetupMode::parse("1"), Some(SetupMode::Manual));
        assert_eq!(SetupMode::parse("\n"), Some(SetupMode::Manual));
        assert_eq!(SetupMode::parse(" Grid "), Some(SetupMode::Grid));
        assert_eq!(SetupMode::parse("3"), None);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(" 4\n"), Some(4));
        assert_eq!(parse_count("0"), None);
        assert_eq!(parse_count("-2"), None);
        assert_eq!(parse_count("two"), None);
    }

    #[test]
    fn test_prompt_grid_layout_retries_until_valid() {
        // First attempt asks for more boxes than the grid holds
        let mut input = Cursor::new("2\n2\n5\nx\n2\n3\n5\n");
        let layout = prompt_grid_layout(&mut input).unwrap();
        assert_eq!(layout, GridLayout::new(2, 3, 5).unwrap());
    }

    #[test]
    fn test_prompt_fails_on_closed_input() {
        let mut input = Cursor::new("");
        assert!(prompt_grid_layout(&mut input).is_err());
    }
}
