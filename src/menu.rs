//! Console main menu.

use anyhow::Result;
use std::io::{self, BufRead, Write};

use crate::automation::{
    load_settings, load_zodiac_config, run_automation, RunControl, Settings, ZodiacConfig,
};
use crate::calibration::{run_setup, SetupResult};
use crate::help::help_text;
use crate::{log, paths};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuChoice {
    Setup,
    Automation,
    Help,
    ReloadSettings,
    Exit,
}

impl MenuChoice {
    /// Accepts the number or the name, case-insensitively.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "1" | "setup" => Some(Self::Setup),
            "2" | "automation" => Some(Self::Automation),
            "3" | "help" => Some(Self::Help),
            "4" | "settings" => Some(Self::ReloadSettings),
            "5" | "exit" => Some(Self::Exit),
            _ => None,
        }
    }
}

fn print_menu() {
    println!();
    println!("Select an option:");
    println!("1. Setup Mode (configure click points and colors)");
    println!("2. Automation Mode (run the automation)");
    println!("3. Help (how the tool and its settings work)");
    println!("4. Reload Settings (re-read {})", paths::SETTINGS_FILE_NAME);
    println!("5. Exit");
    print!("Enter your choice (1/setup, 2/automation, 3/help, 4/settings, 5/exit): ");
    io::stdout().flush().ok();
}

/// Console application state.
pub struct App {
    settings: Settings,
    config: Option<ZodiacConfig>,
    window_filter: bool,
}

impl App {
    /// Loads settings and, if present, the saved zodiac configuration.
    pub fn new(window_filter: bool) -> Self {
        let settings = load_settings(&paths::get_settings_file());
        crate::apply_message_level(&settings);

        let config = match load_zodiac_config(&paths::get_zodiac_config_file()) {
            Ok(config) => {
                log(&format!(
                    "Configuration loaded: {} zodiac slot(s)",
                    config.slot_count()
                ));
                Some(config)
            }
            Err(e) => {
                log(&format!("{:#}", e));
                None
            }
        };

        Self {
            settings,
            config,
            window_filter,
        }
    }

    /// Runs the menu until Exit is chosen or the console closes.
    pub fn run(&mut self) -> Result<()> {
        log("Welcome to the Revolution Idle Sacrifice Automation tool!");

        loop {
            print_menu();
            let mut line = String::new();
            if io::stdin().lock().read_line(&mut line)? == 0 {
                log("Console input closed. Exiting.");
                return Ok(());
            }

            match MenuChoice::parse(&line) {
                Some(MenuChoice::Setup) => self.setup(),
                Some(MenuChoice::Automation) => self.automation(),
                Some(MenuChoice::Help) => println!("{}", help_text(&self.settings)),
                Some(MenuChoice::ReloadSettings) => self.reload_settings(),
                Some(MenuChoice::Exit) => {
                    log("Exiting Revolution Idle Sacrifice Automation. Goodbye!");
                    return Ok(());
                }
                None => log(
                    "Invalid choice. Please enter '1', 'setup', '2', 'automation', \
                     '3', 'help', '4', 'settings', '5', or 'exit'.",
                ),
            }
        }
    }

    fn setup(&mut self) {
        match run_setup(
            &self.settings,
            self.window_filter,
            &paths::get_zodiac_config_file(),
        ) {
            Ok(SetupResult::Saved(config)) => {
                self.config = Some(config);
                log("Setup mode completed. Returning to main menu.");
            }
            Ok(SetupResult::Cancelled) => log("Setup mode was cancelled."),
            Err(e) => log(&format!("Setup failed: {:#}", e)),
        }
    }

    fn automation(&mut self) {
        let Some(config) = &self.config else {
            log("Cannot start automation: invalid or missing configuration. Please run setup mode first.");
            return;
        };
        if let Err(e) = run_automation(&self.settings, config, &RunControl::new()) {
            log(&format!("Automation error: {:#}", e));
        }
    }

    fn reload_settings(&mut self) {
        self.settings = load_settings(&paths::get_settings_file());
        crate::apply_message_level(&self.settings);
        log("Settings reloaded.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers_and_names() {
        assert_eq!(MenuChoice::parse("1"), Some(MenuChoice::Setup));
        assert_eq!(MenuChoice::parse("automation"), Some(MenuChoice::Automation));
        assert_eq!(MenuChoice::parse("3"), Some(MenuChoice::Help));
        assert_eq!(MenuChoice::parse("settings"), Some(MenuChoice::ReloadSettings));
        assert_eq!(MenuChoice::parse("5"), Some(MenuChoice::Exit));
    }

    #[test]
    fn test_parse_is_trimmed_and_case_insensitive() {
        assert_eq!(MenuChoice::parse("  SETUP \r\n"), Some(MenuChoice::Setup));
        assert_eq!(MenuChoice::parse("Exit"), Some(MenuChoice::Exit));
    }

    #[test]
    fn test_parse_rejects_other_input() {
        assert_eq!(MenuChoice::parse(""), None);
        assert_eq!(MenuChoice::parse("6"), None);
        assert_eq!(MenuChoice::parse("set up"), None);
    }
}
