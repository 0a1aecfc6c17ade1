//! Zodiac configuration: the screen positions captured during setup and the
//! colors expected at them.
//!
//! Stored as revolution_idle_zodiac_automation_config.json next to the
//! executable. Older files that used `click1`/`click2`/`click3` and
//! `rgb1`/`rgb3` for a single slot are still accepted.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::automation::detection::Rgb;
use crate::capture::{Point, Region};

/// A monitored zodiac slot and the color that means an item is ready.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonitoredSlot {
    pub position: Point,
    pub color: Rgb,
}

/// Everything the automation loop needs to know about the game screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZodiacConfig {
    pub slots: Vec<MonitoredSlot>,
    /// Drag target for zodiac items
    pub sacrifice_box: Point,
    /// Confirmation button clicked after each drag
    pub sacrifice_button: Point,
    pub button_color: Rgb,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ClickCoords {
    #[serde(skip_serializing_if = "Option::is_none")]
    zodiac_slots: Option<Vec<Point>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sacrifice_box: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sacrifice_button: Option<Point>,
    // Legacy single-slot keys
    #[serde(skip_serializing)]
    click1: Option<Point>,
    #[serde(skip_serializing)]
    click2: Option<Point>,
    #[serde(skip_serializing)]
    click3: Option<Point>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct TargetRgbs {
    #[serde(skip_serializing_if = "Option::is_none")]
    zodiac_slots: Option<Vec<Rgb>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sacrifice_button: Option<Rgb>,
    #[serde(skip_serializing)]
    rgb1: Option<Rgb>,
    #[serde(skip_serializing)]
    rgb3: Option<Rgb>,
}

/// On-disk layout.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ConfigFile {
    click_coords: ClickCoords,
    target_rgbs: TargetRgbs,
}

impl ConfigFile {
    fn from_config(config: &ZodiacConfig) -> Self {
        Self {
            click_coords: ClickCoords {
                zodiac_slots: Some(config.slots.iter().map(|s| s.position).collect()),
                sacrifice_box: Some(config.sacrifice_box),
                sacrifice_button: Some(config.sacrifice_button),
                ..Default::default()
            },
            target_rgbs: TargetRgbs {
                zodiac_slots: Some(config.slots.iter().map(|s| s.color).collect()),
                sacrifice_button: Some(config.button_color),
                ..Default::default()
            },
        }
    }

    /// Resolves legacy keys and checks that every required value is present.
    fn into_config(self) -> Result<ZodiacConfig> {
        let ConfigFile {
            click_coords: coords,
            target_rgbs: rgbs,
        } = self;

        if coords.zodiac_slots.is_none() && coords.click1.is_some() {
            crate::log("Converted legacy single zodiac slot configuration to new format.");
        }

        let positions = coords
            .zodiac_slots
            .or_else(|| coords.click1.map(|p| vec![p]))
            .ok_or_else(|| anyhow!("Configuration has no zodiac slot coordinates"))?;
        let colors = rgbs
            .zodiac_slots
            .or_else(|| rgbs.rgb1.map(|c| vec![c]))
            .ok_or_else(|| anyhow!("Configuration has no zodiac slot colors"))?;
        let sacrifice_box = coords
            .sacrifice_box
            .or(coords.click2)
            .ok_or_else(|| anyhow!("Configuration has no sacrifice box coordinate"))?;
        let sacrifice_button = coords
            .sacrifice_button
            .or(coords.click3)
            .ok_or_else(|| anyhow!("Configuration has no sacrifice button coordinate"))?;
        let button_color = rgbs
            .sacrifice_button
            .or(rgbs.rgb3)
            .ok_or_else(|| anyhow!("Configuration has no sacrifice button color"))?;

        if positions.len() != colors.len() {
            bail!(
                "Configuration has {} zodiac slot coordinates but {} colors",
                positions.len(),
                colors.len()
            );
        }

        let config = ZodiacConfig {
            slots: positions
                .into_iter()
                .zip(colors)
                .map(|(position, color)| MonitoredSlot { position, color })
                .collect(),
            sacrifice_box,
            sacrifice_button,
            button_color,
        };
        config.validate()?;
        Ok(config)
    }
}

impl ZodiacConfig {
    /// Fails if no zodiac slot is configured.
    pub fn validate(&self) -> Result<()> {
        if self.slots.is_empty() {
            bail!("Configuration has no zodiac slots");
        }
        Ok(())
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Every point sampled per loop iteration: the slots in order, then the
    /// sacrifice button.
    pub fn sample_points(&self) -> Vec<Point> {
        self.slots
            .iter()
            .map(|s| s.position)
            .chain(std::iter::once(self.sacrifice_button))
            .collect()
    }

    /// Describes every configured point that lies outside `screen`.
    pub fn points_outside(&self, screen: &Region) -> Vec<String> {
        let mut problems = Vec::new();
        for (i, slot) in self.slots.iter().enumerate() {
            if !screen.contains(slot.position) {
                problems.push(format!("Zodiac slot {} at {}", i + 1, slot.position));
            }
        }
        if !screen.contains(self.sacrifice_box) {
            problems.push(format!("Sacrifice box at {}", self.sacrifice_box));
        }
        if !screen.contains(self.sacrifice_button) {
            problems.push(format!("Sacrifice button at {}", self.sacrifice_button));
        }
        problems
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&ConfigFile::from_config(self))
            .context("Failed to serialize zodiac configuration")
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let file: ConfigFile =
            serde_json::from_str(contents).context("Zodiac configuration is not valid JSON")?;
        file.into_config()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write configuration to {}", path.display()))?;
        crate::log(&format!("Configuration saved to {}", path.display()));
        Ok(())
    }
}

/// Loads and validates the zodiac configuration.
pub fn load_zodiac_config(path: &Path) -> Result<ZodiacConfig> {
    if !path.exists() {
        bail!(
            "Configuration file '{}' not found. Please run setup first.",
            path.display()
        );
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    ZodiacConfig::from_json(&contents)
        .with_context(|| format!("Invalid configuration in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_config() -> ZodiacConfig {
        ZodiacConfig {
            slots: vec![
                MonitoredSlot {
                    position: Point::new(100, 200),
                    color: Rgb::new(10, 20, 30),
                },
                MonitoredSlot {
                    position: Point::new(150, 200),
                    color: Rgb::new(11, 21, 31),
                },
            ],
            sacrifice_box: Point::new(400, 300),
            sacrifice_button: Point::new(420, 500),
            button_color: Rgb::new(219, 124, 0),
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = sample_config();

        config.save(&path).unwrap();
        assert_eq!(load_zodiac_config(&path).unwrap(), config);
    }

    #[test]
    fn test_file_layout() {
        let json: serde_json::Value =
            serde_json::from_str(&sample_config().to_json().unwrap()).unwrap();
        assert_eq!(
            json["click_coords"]["zodiac_slots"],
            serde_json::json!([[100, 200], [150, 200]])
        );
        assert_eq!(json["click_coords"]["sacrifice_box"], serde_json::json!([400, 300]));
        assert_eq!(json["target_rgbs"]["sacrifice_button"], serde_json::json!([219, 124, 0]));
        assert!(json["click_coords"].get("click1").is_none());
    }

    #[test]
    fn test_legacy_format() {
        let legacy = r#"{
            "click_coords": {"click1": [10, 20], "click2": [30, 40], "click3": [50, 60]},
            "target_rgbs": {"rgb1": [1, 2, 3], "rgb3": [219, 124, 0]}
        }"#;
        let config = ZodiacConfig::from_json(legacy).unwrap();
        assert_eq!(
            config.slots,
            vec![MonitoredSlot {
                position: Point::new(10, 20),
                color: Rgb::new(1, 2, 3),
            }]
        );
        assert_eq!(config.sacrifice_box, Point::new(30, 40));
        assert_eq!(config.sacrifice_button, Point::new(50, 60));
        assert_eq!(config.button_color, Rgb::new(219, 124, 0));
    }

    #[test]
    fn test_new_keys_win_over_legacy() {
        let mixed = r#"{
            "click_coords": {"zodiac_slots": [[1, 1]], "click1": [9, 9],
                             "sacrifice_box": [2, 2], "sacrifice_button": [3, 3]},
            "target_rgbs": {"zodiac_slots": [[4, 4, 4]], "sacrifice_button": [5, 5, 5]}
        }"#;
        let config = ZodiacConfig::from_json(mixed).unwrap();
        assert_eq!(config.slots[0].position, Point::new(1, 1));
    }

    #[test]
    fn test_rejects_incomplete_config() {
        let no_button = r#"{
            "click_coords": {"zodiac_slots": [[1, 1]], "sacrifice_box": [2, 2]},
            "target_rgbs": {"zodiac_slots": [[4, 4, 4]], "sacrifice_button": [5, 5, 5]}
        }"#;
        assert!(ZodiacConfig::from_json(no_button).is_err());

        let no_slots = r#"{
            "click_coords": {"zodiac_slots": [], "sacrifice_box": [2, 2], "sacrifice_button": [3, 3]},
            "target_rgbs": {"zodiac_slots": [], "sacrifice_button": [5, 5, 5]}
        }"#;
        assert!(ZodiacConfig::from_json(no_slots).is_err());

        assert!(ZodiacConfig::from_json("{}").is_err());
    }

    #[test]
    fn test_rejects_count_mismatch() {
        let mismatch = r#"{
            "click_coords": {"zodiac_slots": [[1, 1], [2, 1]], "sacrifice_box": [2, 2], "sacrifice_button": [3, 3]},
            "target_rgbs": {"zodiac_slots": [[4, 4, 4]], "sacrifice_button": [5, 5, 5]}
        }"#;
        let err = ZodiacConfig::from_json(mismatch).unwrap_err();
        assert!(err.to_string().contains("2 zodiac slot coordinates but 1 colors"));
    }

    #[test]
    fn test_missing_file_asks_for_setup() {
        let dir = tempdir().unwrap();
        let err = load_zodiac_config(&dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("run setup first"));
    }

    #[test]
    fn test_malformed_file_names_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ nope").unwrap();
        let err = load_zodiac_config(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.json"));
    }

    #[test]
    fn test_sample_points_end_with_button() {
        let points = sample_config().sample_points();
        assert_eq!(points.len(), 3);
        assert_eq!(points[2], Point::new(420, 500));
    }

    #[test]
    fn test_points_outside_screen() {
        let screen = Region {
            left: 0,
            top: 0,
            right: 410,
            bottom: 1080,
        };
        let problems = sample_config().points_outside(&screen);
        assert_eq!(problems, vec!["Sacrifice button at (420, 500)".to_string()]);
    }
}
