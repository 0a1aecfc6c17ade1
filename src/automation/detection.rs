//! Pixel color comparison.
//!
//! Colors sampled from the screen drift slightly with lighting, compression and
//! selection highlights, so matching is done per channel against a tolerance.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An RGB color. Serialized as `[r, g, b]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0[0], self.0[1], self.0[2])
    }
}

/// Target color of the Sacrifice button. Fixed rather than sampled, the
/// button looks the same on every setup.
pub const SACRIFICE_BUTTON_COLOR: Rgb = Rgb::new(219, 124, 0);

/// Absolute difference of each channel.
pub fn channel_diff(a: Rgb, b: Rgb) -> [u8; 3] {
    [
        a.0[0].abs_diff(b.0[0]),
        a.0[1].abs_diff(b.0[1]),
        a.0[2].abs_diff(b.0[2]),
    ]
}

/// Largest per-channel difference between two colors.
pub fn max_channel_diff(a: Rgb, b: Rgb) -> u8 {
    channel_diff(a, b).into_iter().max().unwrap_or(0)
}

/// Returns true if every channel differs by at most `tolerance`.
pub fn colors_match(a: Rgb, b: Rgb, tolerance: u8) -> bool {
    channel_diff(a, b).iter().all(|d| *d <= tolerance)
}

/// One slot's comparison, formatted for `debug_color_matching` output.
#[derive(Clone, Copy, Debug)]
pub struct ColorComparison {
    pub slot_index: usize,
    pub current: Rgb,
    pub target: Rgb,
    pub tolerance: u8,
}

impl ColorComparison {
    pub fn is_match(&self) -> bool {
        colors_match(self.current, self.target, self.tolerance)
    }
}

impl fmt::Display for ColorComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let diff = channel_diff(self.current, self.target);
        write!(
            f,
            "Slot {}: Current={}, Target={}, Diff={:?}, MaxDiff={}, Tolerance={}, Match={}",
            self.slot_index + 1,
            self.current,
            self.target,
            diff,
            max_channel_diff(self.current, self.target),
            self.tolerance,
            self.is_match()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_with_zero_tolerance() {
        let c = Rgb::new(115, 243, 189);
        assert!(colors_match(c, c, 0));
        assert!(!colors_match(c, Rgb::new(116, 243, 189), 0));
    }

    #[test]
    fn test_match_at_tolerance_boundary() {
        let target = Rgb::new(100, 100, 100);
        assert!(colors_match(Rgb::new(115, 85, 100), target, 15));
        assert!(!colors_match(Rgb::new(116, 100, 100), target, 15));
        assert!(!colors_match(Rgb::new(100, 100, 84), target, 15));
    }

    #[test]
    fn test_every_channel_must_be_within_tolerance() {
        let target = Rgb::new(10, 10, 10);
        // Two channels are fine, one is not
        assert!(!colors_match(Rgb::new(10, 10, 200), target, 15));
    }

    #[test]
    fn test_full_tolerance_matches_anything() {
        assert!(colors_match(Rgb::new(0, 0, 0), Rgb::new(255, 255, 255), 255));
    }

    #[test]
    fn test_channel_diff_is_symmetric() {
        let a = Rgb::new(0, 200, 50);
        let b = Rgb::new(255, 100, 60);
        assert_eq!(channel_diff(a, b), [255, 100, 10]);
        assert_eq!(channel_diff(a, b), channel_diff(b, a));
        assert_eq!(max_channel_diff(a, b), 255);
    }

    #[test]
    fn test_comparison_display() {
        let cmp = ColorComparison {
            slot_index: 0,
            current: Rgb::new(210, 120, 0),
            target: SACRIFICE_BUTTON_COLOR,
            tolerance: 15,
        };
        let line = cmp.to_string();
        assert!(line.starts_with("Slot 1:"));
        assert!(line.contains("Diff=[9, 4, 0]"));
        assert!(line.contains("MaxDiff=9"));
        assert!(line.ends_with("Match=true"));
    }

    #[test]
    fn test_rgb_serializes_as_array() {
        let json = serde_json::to_string(&Rgb::new(219, 124, 0)).unwrap();
        assert_eq!(json, "[219,124,0]");
        let back: Rgb = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SACRIFICE_BUTTON_COLOR);
    }
}
