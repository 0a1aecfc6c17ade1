//! User settings loaded from user_settings.json.
//!
//! Keys are read one at a time: a missing key or a key with the wrong type
//! takes its default and the rest of the file is kept. A file that is not a
//! JSON object falls back to the full default set, and a missing file is
//! created with defaults so users have something to edit.

use anyhow::{Context, Result};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::automation::stop_key::StopKey;

/// Console verbosity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    #[default]
    Info,
    Debug,
}

impl MessageLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// Accepts any case, hand-edited files often say "DEBUG"
impl<'de> Deserialize<'de> for MessageLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        match name.trim().to_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            _ => Err(de::Error::custom(format!(
                "unknown message level \"{}\", expected \"info\" or \"debug\"",
                name
            ))),
        }
    }
}

/// All user-tunable settings.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Settings {
    /// Max per-channel difference for a color match (0 = exact)
    pub color_tolerance: u32,
    /// Seconds to wait before each color check
    pub delay_before_check: f64,
    /// Seconds to wait after pressing on a zodiac slot
    pub delay_after_press: f64,
    /// Seconds the cursor rests on the drag box before release
    pub delay_drag_duration: f64,
    /// Seconds to wait after a drag before checking the button
    pub delay_after_drag: f64,
    /// Seconds to wait after clicking the button
    pub delay_after_click: f64,
    /// Key that stops automation ("q", "esc", "f1", ...)
    pub stop_key: String,
    /// -1 = unlimited, otherwise the maximum number of slots captured in setup
    pub max_zodiac_slots: i32,
    /// Log every slot comparison at debug level
    pub debug_color_matching: bool,
    pub message_level: MessageLevel,
    /// Zoom factor for the --gui window
    pub gui_scale: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color_tolerance: 15,
            // Fastest timings that still stay consistent with the game
            delay_before_check: 0.02,
            delay_after_press: 0.02,
            delay_drag_duration: 0.02,
            delay_after_drag: 0.11,
            delay_after_click: 0.01,
            stop_key: "q".to_string(),
            max_zodiac_slots: -1,
            debug_color_matching: false,
            message_level: MessageLevel::Info,
            gui_scale: 1.0,
        }
    }
}

/// Converts a delay in seconds to a Duration, treating bad values as zero.
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

impl Settings {
    /// Tolerance as a channel value. Sanitized settings are always <= 255.
    pub fn tolerance(&self) -> u8 {
        u8::try_from(self.color_tolerance).unwrap_or(u8::MAX)
    }

    /// Maximum slots for setup, `None` when unlimited.
    pub fn slot_limit(&self) -> Option<usize> {
        if self.max_zodiac_slots > 0 {
            Some(self.max_zodiac_slots as usize)
        } else {
            None
        }
    }

    /// Parsed stop key. Falls back to the default key if the setting is invalid.
    pub fn stop_key(&self) -> StopKey {
        StopKey::parse(&self.stop_key).unwrap_or_default()
    }

    pub fn before_check(&self) -> Duration {
        seconds(self.delay_before_check)
    }

    pub fn after_press(&self) -> Duration {
        seconds(self.delay_after_press)
    }

    pub fn drag_duration(&self) -> Duration {
        seconds(self.delay_drag_duration)
    }

    pub fn after_drag(&self) -> Duration {
        seconds(self.delay_after_drag)
    }

    pub fn after_click(&self) -> Duration {
        seconds(self.delay_after_click)
    }

    /// Replaces out-of-range values with their defaults.
    ///
    /// Returns one warning per replaced value.
    pub fn sanitize(&mut self) -> Vec<String> {
        let defaults = Settings::default();
        let mut warnings = Vec::new();

        if self.color_tolerance > 255 {
            warnings.push(format!(
                "color_tolerance {} is above 255, using {}",
                self.color_tolerance, defaults.color_tolerance
            ));
            self.color_tolerance = defaults.color_tolerance;
        }

        let delays = [
            ("delay_before_check", &mut self.delay_before_check, defaults.delay_before_check),
            ("delay_after_press", &mut self.delay_after_press, defaults.delay_after_press),
            ("delay_drag_duration", &mut self.delay_drag_duration, defaults.delay_drag_duration),
            ("delay_after_drag", &mut self.delay_after_drag, defaults.delay_after_drag),
            ("delay_after_click", &mut self.delay_after_click, defaults.delay_after_click),
        ];
        for (name, value, default) in delays {
            if !value.is_finite() || *value < 0.0 {
                warnings.push(format!("{} {} is not a valid delay, using {}", name, value, default));
                *value = default;
            }
        }

        if StopKey::parse(&self.stop_key).is_none() {
            warnings.push(format!(
                "stop_key \"{}\" is not a known key, using \"{}\"",
                self.stop_key, defaults.stop_key
            ));
            self.stop_key = defaults.stop_key.clone();
        }

        if self.max_zodiac_slots == 0 || self.max_zodiac_slots < -1 {
            warnings.push(format!(
                "max_zodiac_slots {} must be -1 or positive, using {}",
                self.max_zodiac_slots, defaults.max_zodiac_slots
            ));
            self.max_zodiac_slots = defaults.max_zodiac_slots;
        }

        if !self.gui_scale.is_finite() || self.gui_scale <= 0.0 {
            warnings.push(format!(
                "gui_scale {} must be positive, using {}",
                self.gui_scale, defaults.gui_scale
            ));
            self.gui_scale = defaults.gui_scale;
        }

        warnings
    }

    /// Parses settings JSON key by key. Does not sanitize.
    ///
    /// Fails only if `contents` is not a JSON object. Keys with a value of the
    /// wrong type keep their default and produce a warning each.
    pub fn from_json(contents: &str) -> Result<(Self, Vec<String>)> {
        let map: Map<String, Value> =
            serde_json::from_str(contents).context("Failed to parse settings JSON")?;

        let mut settings = Settings::default();
        let mut warnings = Vec::new();
        for (key, value) in map {
            let w = &mut warnings;
            match key.as_str() {
                "color_tolerance" => read_key(&mut settings.color_tolerance, &key, value, w),
                "delay_before_check" => read_key(&mut settings.delay_before_check, &key, value, w),
                "delay_after_press" => read_key(&mut settings.delay_after_press, &key, value, w),
                "delay_drag_duration" => read_key(&mut settings.delay_drag_duration, &key, value, w),
                "delay_after_drag" => read_key(&mut settings.delay_after_drag, &key, value, w),
                "delay_after_click" => read_key(&mut settings.delay_after_click, &key, value, w),
                "stop_key" => read_key(&mut settings.stop_key, &key, value, w),
                "max_zodiac_slots" => read_key(&mut settings.max_zodiac_slots, &key, value, w),
                "debug_color_matching" => read_key(&mut settings.debug_color_matching, &key, value, w),
                "message_level" => read_key(&mut settings.message_level, &key, value, w),
                "gui_scale" => read_key(&mut settings.gui_scale, &key, value, w),
                _ => crate::debug(&format!("Ignoring unknown settings key \"{}\"", key)),
            }
        }
        Ok((settings, warnings))
    }

    /// Writes settings as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
        Ok(())
    }
}

/// Replaces `field` with `value` if it has the right type, otherwise keeps the
/// current value and records a warning.
fn read_key<T>(field: &mut T, key: &str, value: Value, warnings: &mut Vec<String>)
where
    T: DeserializeOwned + fmt::Debug,
{
    let shown = value.to_string();
    match serde_json::from_value::<T>(value) {
        Ok(parsed) => *field = parsed,
        Err(e) => warnings.push(format!(
            "{} {} is not valid ({}), using {:?}",
            key, shown, e, field
        )),
    }
}

/// Loads settings from `path`, or returns defaults.
///
/// Creates the file with defaults if it does not exist. A file that exists but
/// cannot be read or parsed is left untouched. Each bad value is replaced by
/// its default with a logged warning.
pub fn load_settings(path: &Path) -> Settings {
    crate::log(&format!("Looking for settings at: {}", path.display()));

    let mut warnings = Vec::new();
    let mut settings = if path.exists() {
        match fs::read_to_string(path) {
            Ok(contents) => match Settings::from_json(&contents) {
                Ok((settings, key_warnings)) => {
                    crate::log(&format!("Settings loaded from {}", path.display()));
                    warnings = key_warnings;
                    settings
                }
                Err(e) => {
                    crate::log(&format!("{:#}. Using default settings.", e));
                    Settings::default()
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read {}: {}. Using default settings.",
                    path.display(),
                    e
                ));
                Settings::default()
            }
        }
    } else {
        crate::log("Settings file not found. Creating it with default settings.");
        let settings = Settings::default();
        if let Err(e) = settings.save(path) {
            crate::log(&format!("Could not create settings file: {:#}", e));
        }
        settings
    };

    warnings.extend(settings.sanitize());
    for warning in warnings {
        crate::log(&format!("Warning: {}", warning));
    }

    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_documented_values() {
        let s = Settings::default();
        assert_eq!(s.color_tolerance, 15);
        assert_eq!(s.delay_after_drag, 0.11);
        assert_eq!(s.stop_key, "q");
        assert_eq!(s.max_zodiac_slots, -1);
        assert_eq!(s.slot_limit(), None);
        assert_eq!(s.message_level, MessageLevel::Info);
        assert!(!s.debug_color_matching);
    }

    #[test]
    fn test_roundtrip_through_json() {
        let settings = Settings {
            color_tolerance: 8,
            delay_before_check: 0.5,
            stop_key: "f9".to_string(),
            max_zodiac_slots: 4,
            debug_color_matching: true,
            message_level: MessageLevel::Debug,
            gui_scale: 1.25,
            ..Settings::default()
        };

        let json = serde_json::to_string_pretty(&settings).unwrap();
        let (back, warnings) = Settings::from_json(&json).unwrap();
        assert_eq!(back, settings);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_json_uses_documented_keys() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        for key in [
            "color_tolerance",
            "delay_before_check",
            "delay_after_press",
            "delay_drag_duration",
            "delay_after_drag",
            "delay_after_click",
            "stop_key",
            "max_zodiac_slots",
            "debug_color_matching",
            "message_level",
            "gui_scale",
        ] {
            assert!(json.get(key).is_some(), "missing key {}", key);
        }
        assert_eq!(json["message_level"], "info");
    }

    #[test]
    fn test_missing_keys_take_defaults() {
        let (settings, _) = Settings::from_json(r#"{"color_tolerance": 30}"#).unwrap();
        assert_eq!(settings.color_tolerance, 30);
        assert_eq!(settings.stop_key, "q");
        assert_eq!(settings.delay_after_drag, 0.11);
    }

    #[test]
    fn test_invalid_json_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("user_settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(load_settings(&path), Settings::default());
        // Broken file is left for the user to fix
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("user_settings.json");

        let settings = load_settings(&path);
        assert_eq!(settings, Settings::default());

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(Settings::from_json(&written).unwrap().0, Settings::default());
    }

    #[test]
    fn test_bad_key_keeps_other_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("user_settings.json");
        std::fs::write(
            &path,
            r#"{"color_tolerance": -5, "delay_after_drag": 0.3, "stop_key": "f9"}"#,
        )
        .unwrap();

        let settings = load_settings(&path);
        assert_eq!(settings.color_tolerance, 15);
        assert_eq!(settings.delay_after_drag, 0.3);
        assert_eq!(settings.stop_key, "f9");
    }

    #[test]
    fn test_wrong_type_is_reported_per_key() {
        let (settings, warnings) = Settings::from_json(
            r#"{"gui_scale": "big", "max_zodiac_slots": 4, "debug_color_matching": 1}"#,
        )
        .unwrap();
        assert_eq!(settings.gui_scale, 1.0);
        assert!(!settings.debug_color_matching);
        assert_eq!(settings.max_zodiac_slots, 4);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].starts_with("debug_color_matching") || warnings[0].starts_with("gui_scale"));
    }

    #[test]
    fn test_message_level_any_case() {
        let (settings, warnings) =
            Settings::from_json(r#"{"message_level": "DEBUG", "color_tolerance": 30}"#).unwrap();
        assert_eq!(settings.message_level, MessageLevel::Debug);
        assert_eq!(settings.color_tolerance, 30);
        assert!(warnings.is_empty());

        let (settings, warnings) = Settings::from_json(r#"{"message_level": "loud"}"#).unwrap();
        assert_eq!(settings.message_level, MessageLevel::Info);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_non_object_is_an_error() {
        assert!(Settings::from_json("[1, 2]").is_err());
        assert!(Settings::from_json("{ not json").is_err());
    }

    #[test]
    fn test_sanitize_replaces_bad_values() {
        let mut settings = Settings {
            color_tolerance: 300,
            delay_after_press: -1.0,
            stop_key: "not-a-key".to_string(),
            max_zodiac_slots: 0,
            gui_scale: 0.0,
            ..Settings::default()
        };

        let warnings = settings.sanitize();
        assert_eq!(warnings.len(), 5);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_sanitize_keeps_valid_values() {
        let mut settings = Settings {
            color_tolerance: 255,
            max_zodiac_slots: 3,
            stop_key: "ESC".to_string(),
            ..Settings::default()
        };
        assert!(settings.sanitize().is_empty());
        assert_eq!(settings.slot_limit(), Some(3));
        assert_eq!(settings.tolerance(), 255);
    }

    #[test]
    fn test_delay_conversion() {
        let settings = Settings::default();
        assert_eq!(settings.after_drag(), Duration::from_millis(110));
        assert_eq!(settings.after_click(), Duration::from_millis(10));
    }
}
