//! Zodiac sacrifice automation.
//!
//! This module provides:
//! - User settings and the zodiac configuration file
//! - Tolerance-based color matching
//! - Mouse input simulation and the stop key listener
//! - The automation loop and its performance counter

pub mod config;
pub mod desktop;
pub mod detection;
pub mod input;
pub mod runner;
pub mod settings;
pub mod stats;
pub mod stop_key;

pub use config::{load_zodiac_config, ZodiacConfig};
pub use detection::SACRIFICE_BUTTON_COLOR;
pub use runner::{run_automation, RunControl, RunSummary};
pub use settings::{load_settings, MessageLevel, Settings};
pub use stop_key::StopKey;
